/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame from a `SimulationSnapshot` into `front`
///   2. Compare each cell with `back` (the previous frame)
///   3. Emit terminal commands only for changed cells, batched with `queue!`
///   4. Swap front/back
///
/// Every tile is two terminal columns wide so the map reads square.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use burrower::domain::collision::Bounds;
use burrower::domain::effects::PowerUpKind;
use burrower::domain::tile::{Cell as GridCell, Tile};
use burrower::sim::{Phase, SimulationSnapshot};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every empty terminal cell. Using the same
    /// RGB for `Clear` and cell backgrounds avoids gap lines on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never produced by composition, so it forces a repaint when diffed.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

// ── Frame buffer ──

struct FrameBuffer {
    cells: Vec<Cell>,
    width: usize,
    height: usize,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { cells: vec![Cell::BLANK; w * h], width: w, height: h }
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.width = w;
        self.height = h;
        self.cells = vec![Cell::BLANK; w * h];
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell { ch, fg, bg });
        }
    }
}

// ── Layout & palette ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const EFFECTS_ROW: usize = 1;
const MAP_ROW: usize = 3;

const DIRT_BG: Color = Color::Rgb { r: 96, g: 62, b: 34 };
const DIRT_FG: Color = Color::Rgb { r: 128, g: 86, b: 50 };
const TUNNEL_BG: Color = Color::Rgb { r: 12, g: 12, b: 18 };
const GOLD: Color = Color::Rgb { r: 240, g: 196, b: 40 };
const GEM: Color = Color::Rgb { r: 90, g: 220, b: 240 };
const DIM: Color = Color::Rgb { r: 120, g: 120, b: 140 };

pub struct Renderer {
    writer: BufWriter<Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    last_level: u32,
    /// Terminal reports key Release events.
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            last_level: 0,
            enhanced_keys: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }
        tracing::debug!(enhanced_keys = self.enhanced_keys, "terminal_init");

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    /// Whether key Release events can be trusted.
    pub fn enhanced_keys(&self) -> bool {
        self.enhanced_keys
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.enhanced_keys = false;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, snap: &SimulationSnapshot<'_>, paused: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Full repaint on phase change or when the terrain is regenerated.
        if self.last_phase != Some(snap.phase) || self.last_level != snap.level {
            self.back.cells.fill(Cell::INVALID);
            self.last_phase = Some(snap.phase);
            self.last_level = snap.level;
        }

        self.front.clear();
        self.compose_hud(snap);
        self.compose_map(snap);
        self.compose_help(snap);

        if snap.phase == Phase::GameOver {
            self.compose_banner(snap, "GAME OVER", &format!("Final score {}", snap.score), "[R] restart  [Q] quit");
        } else if paused {
            self.compose_banner(snap, "PAUSED", "", "[P] resume  [Q] quit");
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors, never ResetColor: the terminal default may
        // differ from BASE_BG.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Composition ──

    fn compose_hud(&mut self, snap: &SimulationSnapshot<'_>) {
        let hud = format!(
            " SCORE {:>6}   LIVES {}   LEVEL {}   GEMS {}",
            snap.score,
            snap.lives,
            snap.level,
            snap.gems_remaining(),
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, Cell::BASE_BG);

        let mut x = 1;
        for (kind, remaining) in snap.active_effects() {
            let label = format!("{} {:.1}s", kind.label(), remaining);
            self.front.put_str(x, EFFECTS_ROW, &label, power_up_color(kind), Cell::BASE_BG);
            x += label.len() + 3;
        }
    }

    fn compose_map(&mut self, snap: &SimulationSnapshot<'_>) {
        let grid = snap.grid;
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let cell = GridCell::new(row, col);
                match grid.tile_at(cell) {
                    Tile::Dirt => self.put_tile(cell, "░░", DIRT_FG, DIRT_BG),
                    Tile::Cleared => self.put_tile(cell, "  ", Color::White, TUNNEL_BG),
                }
            }
        }

        // Later layers draw over earlier ones.
        for gem in snap.collectibles.iter().filter(|c| !c.collected) {
            self.put_glyph(gem.cell, "<>", GEM);
        }
        for p in snap.power_ups.iter().filter(|p| !p.consumed) {
            let glyph = match p.kind {
                PowerUpKind::Speed => "S+",
                PowerUpKind::Shield => "H+",
                PowerUpKind::MultiFire => "F+",
            };
            self.put_glyph(p.cell, glyph, power_up_color(p.kind));
        }
        for bag in snap.bags {
            if let Some(cell) = grid.cell_at(bag.bounds().center()) {
                self.put_glyph(cell, "$$", GOLD);
            }
        }
        for bullet in snap.bullets {
            if let Some(cell) = grid.cell_at(bullet.center()) {
                self.put_glyph(cell, "••", Color::White);
            }
        }
        for enemy in snap.enemies {
            if let Some(cell) = grid.cell_at(enemy.center()) {
                self.put_glyph(cell, "MM", Color::Rgb { r: 230, g: 70, b: 70 });
            }
        }
        if snap.phase == Phase::Playing {
            if let Some(cell) = grid.cell_at(snap.player.center()) {
                let color = if snap.effects.shielded() { GEM } else { Color::Yellow };
                self.put_glyph(cell, player_glyph(snap.player.facing), color);
            }
        }
    }

    fn compose_help(&mut self, snap: &SimulationSnapshot<'_>) {
        let y = MAP_ROW + snap.grid.rows() + 1;
        self.front.put_str(
            1,
            y,
            "Arrows/WASD move   Space/F fire   P pause   R restart   Q quit",
            DIM,
            Cell::BASE_BG,
        );
    }

    fn compose_banner(&mut self, snap: &SimulationSnapshot<'_>, title: &str, line: &str, hint: &str) {
        let map_w = snap.grid.cols() * CELL_W;
        let width = [title.len(), line.len(), hint.len()]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 6;
        let x0 = map_w.saturating_sub(width) / 2;
        let y0 = MAP_ROW + snap.grid.rows().saturating_sub(5) / 2;

        for dy in 0..5 {
            self.front.put_str(x0, y0 + dy, &" ".repeat(width), Color::White, Color::Black);
        }
        let centered = |s: &str| x0 + (width - s.len()) / 2;
        self.front.put_str(centered(title), y0 + 1, title, Color::Yellow, Color::Black);
        self.front.put_str(centered(line), y0 + 2, line, Color::White, Color::Black);
        self.front.put_str(centered(hint), y0 + 3, hint, DIM, Color::Black);
    }

    fn put_tile(&mut self, cell: GridCell, glyph: &str, fg: Color, bg: Color) {
        let x = cell.col * CELL_W;
        let y = MAP_ROW + cell.row;
        for (i, ch) in glyph.chars().take(CELL_W).enumerate() {
            self.front.set(x + i, y, Cell { ch, fg, bg });
        }
    }

    /// Draw on top of whatever tile background is already there.
    fn put_glyph(&mut self, cell: GridCell, glyph: &str, fg: Color) {
        let x = cell.col * CELL_W;
        let y = MAP_ROW + cell.row;
        let bg = self.front.get(x, y).bg;
        for (i, ch) in glyph.chars().take(CELL_W).enumerate() {
            self.front.set(x + i, y, Cell { ch, fg, bg });
        }
    }
}

fn power_up_color(kind: PowerUpKind) -> Color {
    match kind {
        PowerUpKind::Speed => Color::Green,
        PowerUpKind::Shield => GEM,
        PowerUpKind::MultiFire => Color::Rgb { r: 255, g: 140, b: 40 },
    }
}

fn player_glyph(facing: glam::Vec2) -> &'static str {
    if facing.x.abs() >= facing.y.abs() {
        if facing.x < 0.0 { "<@" } else { "@>" }
    } else if facing.y < 0.0 {
        "^@"
    } else {
        "@v"
    }
}
