/// Keyboard state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement / run while a key is held
///   - Edge-triggered commands (mute, respawn) that fire once per press
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.
///
/// Key map:
///   ←/A  →/D         move
///   ↑/W/Space/K      jump
///   Shift, X/Z       run (terminals rarely report a bare Shift)
///   M  mute   R  respawn   Esc/Q/Ctrl+C  quit

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::FrameInput;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT_KEYS: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const JUMP_KEYS: &[KeyCode] = &[
    KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'),
    KeyCode::Char(' '), KeyCode::Char('k'), KeyCode::Char('K'),
];
const RUN_KEYS: &[KeyCode] = &[
    KeyCode::Char('x'), KeyCode::Char('X'), KeyCode::Char('z'), KeyCode::Char('Z'),
];
const MUTE_KEYS: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M')];
const RESPAWN_KEYS: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const QUIT_KEYS: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Last Press/Repeat that carried the Shift modifier.
    shift_seen: Option<Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for modifier checks.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            shift_seen: None,
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before advancing the session.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key);
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent) {
        self.raw_events.push(key);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.shift_seen = None;
                }
            }
            KeyEventKind::Release => {
                // Enhancement not confirmed; rely on timeout-based expiry
            }
            _ => {
                let was_held = self.is_held(key.code);
                let now = Instant::now();
                self.last_active.insert(key.code, now);
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.shift_seen = Some(now);
                }
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Held-key snapshot for the simulation.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            left: self.any_held(LEFT_KEYS),
            right: self.any_held(RIGHT_KEYS),
            jump: self.any_held(JUMP_KEYS),
            run: self.any_held(RUN_KEYS) || self.shift_held(),
        }
    }

    pub fn mute_pressed(&self) -> bool {
        self.any_pressed(MUTE_KEYS)
    }

    pub fn respawn_pressed(&self) -> bool {
        self.any_pressed(RESPAWN_KEYS)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_pressed(QUIT_KEYS) || self.ctrl_c_pressed()
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    fn shift_held(&self) -> bool {
        self.shift_seen.map_or(false, |t| t.elapsed() < HOLD_TIMEOUT)
    }

    fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
