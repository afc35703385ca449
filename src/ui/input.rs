/// Keyboard input tracker.
///
/// Whacks are edge-triggered: a key counts once when it goes down, and
/// terminal auto-repeat while it stays down does not whack again.
///
/// Holes map to the digits in numpad layout, so `7 8 9` is the top row and
/// `1 2 3` the bottom row. Smaller gardens use the keys nearest the top-left.
///
/// When the terminal reports key event types (see `Renderer::init`), a
/// Release ends the hold and every Press whacks. Otherwise release is
/// inferred from `HOLD_TIMEOUT`, so two taps of one key closer together
/// than that count once.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// After this long without a Press/Repeat event, the key counts as released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Last Press/Repeat per key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went down during the latest `drain_events`.
    fresh_presses: Vec<KeyCode>,

    raw_events: Vec<KeyEvent>,

    /// Only true when keyboard enhancement is confirmed working.
    honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Trust Press/Repeat/Release kinds instead of the hold timeout.
    pub fn honor_release(&mut self, on: bool) {
        self.honor_release = on;
    }

    /// Drain pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Was any of these keys freshly pressed this frame?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Holes whacked this frame, in press order.
    pub fn tapped_holes(&self, rows: usize, cols: usize) -> Vec<usize> {
        self.fresh_presses
            .iter()
            .filter_map(|code| hole_for_key(*code, rows, cols))
            .collect()
    }

    // ── Internal ──

    fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            KeyEventKind::Press if self.honor_release => {
                self.last_active.insert(key.code, now);
                self.fresh_presses.push(key.code);
            }
            KeyEventKind::Repeat if self.honor_release => {
                self.last_active.insert(key.code, now);
            }
            _ => {
                let was_held = self
                    .last_active
                    .get(&key.code)
                    .map_or(false, |t| now.duration_since(*t) < HOLD_TIMEOUT);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }
}

/// Row-major hole index for a digit key, or None if the key is not a digit
/// or points outside a `rows` x `cols` garden.
pub fn hole_for_key(code: KeyCode, rows: usize, cols: usize) -> Option<usize> {
    let digit = match code {
        KeyCode::Char(c) => c.to_digit(10)? as usize,
        _ => return None,
    };
    if digit == 0 || rows == 0 {
        return None;
    }
    let col = (digit - 1) % 3;
    let from_bottom = (digit - 1) / 3;
    // top row is 7 8 9 whatever the garden height
    let row = 2usize.checked_sub(from_bottom)?;
    if row >= rows || col >= cols {
        return None;
    }
    Some(row * cols + col)
}
