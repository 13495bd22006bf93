/// Axis-aligned bounding boxes and the overlap test.
///
/// Boxes are half-open in spirit: touching edges do NOT overlap, so two
/// entities standing in neighbouring cells never collide.

use glam::Vec2;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box from a top-left corner and a size.
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Aabb { min: pos, max: pos + size }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// `a.left < b.right && a.right > b.left && a.top < b.bottom && a.bottom > b.top`
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Anything that occupies space in the world.
pub trait Bounds {
    fn bounds(&self) -> Aabb;
}

/// Pairwise overlap between any two bodies.
#[inline]
pub fn overlap<A: Bounds + ?Sized, B: Bounds + ?Sized>(a: &A, b: &B) -> bool {
    a.bounds().overlaps(&b.bounds())
}

impl Bounds for Aabb {
    fn bounds(&self) -> Aabb {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f32, y: f32, w: f32, h: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn overlapping_boxes() {
        let a = boxed(0.0, 0.0, 1.0, 1.0);
        let b = boxed(0.5, 0.5, 1.0, 1.0);
        assert!(overlap(&a, &b));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = boxed(0.0, 0.0, 1.0, 1.0);
        let right = boxed(1.0, 0.0, 1.0, 1.0);
        let below = boxed(0.0, 1.0, 1.0, 1.0);
        assert!(!overlap(&a, &right));
        assert!(!overlap(&a, &below));
    }

    #[test]
    fn contained_box_overlaps() {
        let outer = boxed(0.0, 0.0, 4.0, 4.0);
        let inner = boxed(1.0, 1.0, 0.2, 0.2);
        assert!(overlap(&outer, &inner));
    }

    #[test]
    fn overlap_is_symmetric() {
        let boxes = [
            boxed(0.0, 0.0, 1.0, 1.0),
            boxed(0.5, 0.9, 0.2, 0.2),
            boxed(1.0, 0.0, 0.75, 0.75),
            boxed(-0.5, -0.5, 0.6, 0.6),
            boxed(3.0, 3.0, 1.0, 1.0),
            boxed(0.25, 0.25, 0.5, 0.5),
        ];
        for a in &boxes {
            for b in &boxes {
                assert_eq!(overlap(a, b), overlap(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn center_of_box() {
        assert_eq!(boxed(1.0, 2.0, 2.0, 4.0).center(), Vec2::new(2.0, 4.0));
    }
}
