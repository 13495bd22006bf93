/// Timed power-up effects.
///
/// Each effect is a countdown in seconds. `activate` resets the timer to
/// the full duration (never adds to what is left). Modifiers are derived
/// from the timers, so an expired effect reverts to baseline on its own.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PowerUpKind {
    Speed,
    Shield,
    MultiFire,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [PowerUpKind::Speed, PowerUpKind::Shield, PowerUpKind::MultiFire];

    pub fn label(self) -> &'static str {
        match self {
            PowerUpKind::Speed => "Speed",
            PowerUpKind::Shield => "Shield",
            PowerUpKind::MultiFire => "Fire",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActiveEffects {
    speed: f32,
    shield: f32,
    multi_fire: f32,
}

impl ActiveEffects {
    /// Start (or restart) an effect at `duration` seconds.
    pub fn activate(&mut self, kind: PowerUpKind, duration: f32) {
        *self.slot_mut(kind) = duration.max(0.0);
    }

    /// Advance all timers by `dt`. Returns the effects that ran out during this call.
    pub fn decay(&mut self, dt: f32) -> Vec<PowerUpKind> {
        let mut expired = vec![];
        for kind in PowerUpKind::ALL {
            let t = self.slot_mut(kind);
            if *t > 0.0 {
                *t = (*t - dt).max(0.0);
                if *t == 0.0 {
                    expired.push(kind);
                }
            }
        }
        expired
    }

    pub fn remaining(&self, kind: PowerUpKind) -> f32 {
        match kind {
            PowerUpKind::Speed => self.speed,
            PowerUpKind::Shield => self.shield,
            PowerUpKind::MultiFire => self.multi_fire,
        }
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.remaining(kind) > 0.0
    }

    /// Active effects with their remaining seconds, in `PowerUpKind::ALL` order.
    pub fn active(&self) -> Vec<(PowerUpKind, f32)> {
        PowerUpKind::ALL
            .into_iter()
            .filter(|k| self.is_active(*k))
            .map(|k| (k, self.remaining(k)))
            .collect()
    }

    pub fn clear(&mut self) {
        *self = ActiveEffects::default();
    }

    // ── Modifiers ──

    pub fn speed_multiplier(&self, boost: f32) -> f32 {
        if self.is_active(PowerUpKind::Speed) { boost } else { 1.0 }
    }

    pub fn shielded(&self) -> bool {
        self.is_active(PowerUpKind::Shield)
    }

    pub fn multi_fire(&self) -> bool {
        self.is_active(PowerUpKind::MultiFire)
    }

    fn slot_mut(&mut self, kind: PowerUpKind) -> &mut f32 {
        match kind {
            PowerUpKind::Speed => &mut self.speed,
            PowerUpKind::Shield => &mut self.shield,
            PowerUpKind::MultiFire => &mut self.multi_fire,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_twice_does_not_stack() {
        let mut fx = ActiveEffects::default();
        fx.activate(PowerUpKind::Speed, 5.0);
        fx.activate(PowerUpKind::Speed, 5.0);
        assert_eq!(fx.remaining(PowerUpKind::Speed), 5.0);
    }

    #[test]
    fn reactivation_resets_partially_spent_timer() {
        let mut fx = ActiveEffects::default();
        fx.activate(PowerUpKind::Shield, 5.0);
        fx.decay(3.0);
        assert!((fx.remaining(PowerUpKind::Shield) - 2.0).abs() < 1e-6);
        fx.activate(PowerUpKind::Shield, 5.0);
        assert_eq!(fx.remaining(PowerUpKind::Shield), 5.0);
    }

    #[test]
    fn decay_expires_and_reverts_modifiers() {
        let mut fx = ActiveEffects::default();
        fx.activate(PowerUpKind::Speed, 1.0);
        fx.activate(PowerUpKind::MultiFire, 3.0);
        assert_eq!(fx.speed_multiplier(1.5), 1.5);

        let expired = fx.decay(1.5);
        assert_eq!(expired, vec![PowerUpKind::Speed]);
        assert_eq!(fx.speed_multiplier(1.5), 1.0);
        assert!(fx.multi_fire());
        assert!(!fx.shielded());

        // Already-expired timers do not report again.
        assert_eq!(fx.decay(2.0), vec![PowerUpKind::MultiFire]);
        assert!(fx.decay(1.0).is_empty());
    }

    #[test]
    fn active_lists_running_effects() {
        let mut fx = ActiveEffects::default();
        assert!(fx.active().is_empty());
        fx.activate(PowerUpKind::Shield, 2.0);
        assert_eq!(fx.active(), vec![(PowerUpKind::Shield, 2.0)]);
        fx.clear();
        assert!(fx.active().is_empty());
    }
}
