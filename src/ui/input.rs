/// Keyboard state tracker.
///
/// Movement keys are level-triggered (held), fire and the meta keys are
/// edge-triggered. With keyboard enhancement a key is held until its
/// Release event; other terminals fall back to a hold timeout.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use burrower::domain::entity::InputIntent;

/// After this long without a Press/Repeat the key counts as released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_FIRE: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Char('f'), KeyCode::Char('F')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of the last Press/Repeat per key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw events from the last drain, for modifier checks.
    raw_events: Vec<KeyEvent>,

    /// Fire pressed since the last simulation tick. Ticks run slower
    /// than the input poll, so a tap between ticks must not be lost.
    pending_fire: bool,

    /// Set once the terminal accepted event-type reporting; otherwise
    /// Release events are ignored and the hold timeout applies.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            pending_fire: false,
            honor_release: false,
        }
    }

    /// Drain pending terminal events without blocking. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            self.apply_key(key, Instant::now());
        }

        if self.any_pressed(KEYS_FIRE) {
            self.pending_fire = true;
        }

        if !self.honor_release {
            let now = Instant::now();
            self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        }
    }

    /// Build the intent for one simulation tick and consume the latched fire.
    pub fn take_intent(&mut self) -> InputIntent {
        let axis = |neg: &[KeyCode], pos: &[KeyCode]| -> i8 {
            let n = self.any_held(neg) as i8;
            let p = self.any_held(pos) as i8;
            p - n
        };
        let intent = InputIntent {
            move_x: axis(KEYS_LEFT, KEYS_RIGHT),
            move_y: axis(KEYS_UP, KEYS_DOWN),
            fire_requested: self.pending_fire,
        };
        self.pending_fire = false;
        intent
    }

    pub fn pause_pressed(&self) -> bool {
        self.any_pressed(KEYS_PAUSE)
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_pressed(KEYS_RESTART)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_pressed(KEYS_QUIT) || self.ctrl_c_pressed()
    }

    // ── Internal ──

    fn apply_key(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| self.honor_release || t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }
}
