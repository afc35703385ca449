/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Move the hole cursor
///   A / B / X / Y         →  Whack the hole under the cursor
///   Start                 →  Confirm
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    Up,
    Down,
    Left,
    Right,
}

/// Selected hole in a rows x cols garden. Moves clamp at the edges.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct HoleCursor {
    pub row: usize,
    pub col: usize,
}

impl HoleCursor {
    /// Starts on the middle hole.
    pub fn centered(rows: usize, cols: usize) -> Self {
        HoleCursor { row: rows / 2, col: cols / 2 }
    }

    pub fn step(&mut self, step: Step, rows: usize, cols: usize) {
        match step {
            Step::Up => self.row = self.row.saturating_sub(1),
            Step::Down => self.row = (self.row + 1).min(rows.saturating_sub(1)),
            Step::Left => self.col = self.col.saturating_sub(1),
            Step::Right => self.col = (self.col + 1).min(cols.saturating_sub(1)),
        }
    }

    pub fn index(&self, cols: usize) -> usize {
        self.row * cols + self.col
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
/// Only gilrs polling tracks `held`.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    #[cfg(feature = "gamepad")]
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    whack: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            whack: vec![Btn::A, Btn::B, Btn::X, Btn::Y],
            confirm: vec![Btn::Start],
            cancel: vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],

    // D-pad, then stick, in Step order
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn step_index(step: Step) -> usize {
    step as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unknown lists keep defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let wh = parse_list(&cfg.whack);
        if !wh.is_empty() { map.whack = wh; }
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { map.confirm = cf; }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() { map.cancel = ca; }
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => match axis {
                    Axis::LeftStickX => self.stick_x = value,
                    Axis::LeftStickY => self.stick_y = value,
                    _ => {}
                },
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // Stick as a digital d-pad
        let held = [
            self.stick_y > STICK_DEADZONE,
            self.stick_y < -STICK_DEADZONE,
            self.stick_x < -STICK_DEADZONE,
            self.stick_x > STICK_DEADZONE,
        ];
        for (state, now) in self.stick.iter_mut().zip(held) {
            if now && !state.held {
                state.just_pressed = true;
            }
            state.held = now;
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let dpad = match gilrs_btn {
            Button::DPadUp => Some(Step::Up),
            Button::DPadDown => Some(Step::Down),
            Button::DPadLeft => Some(Step::Left),
            Button::DPadRight => Some(Step::Right),
            _ => None,
        };
        let state = match (dpad, Btn::from_gilrs(gilrs_btn)) {
            (Some(step), _) => &mut self.dpad[step_index(step)],
            (None, Some(btn)) => &mut self.buttons[btn as usize],
            (None, None) => return,
        };
        state.held = held;
        if held {
            state.just_pressed = true;
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn whack_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.whack)
    }
    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }

    /// Cursor steps pressed this frame, d-pad or stick.
    pub fn steps(&self) -> Vec<Step> {
        [Step::Up, Step::Down, Step::Left, Step::Right]
            .into_iter()
            .filter(|&s| {
                self.dpad[step_index(s)].just_pressed || self.stick[step_index(s)].just_pressed
            })
            .collect()
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            b.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            *b = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_starts_centered_and_clamps() {
        let mut c = HoleCursor::centered(3, 3);
        assert_eq!(c.index(3), 4);
        c.step(Step::Up, 3, 3);
        c.step(Step::Up, 3, 3);
        assert_eq!(c.row, 0);
        c.step(Step::Right, 3, 3);
        c.step(Step::Right, 3, 3);
        assert_eq!(c.index(3), 2);
        for _ in 0..5 {
            c.step(Step::Down, 3, 3);
            c.step(Step::Left, 3, 3);
        }
        assert_eq!(c.index(3), 6);
    }

    #[test]
    fn button_names_parse() {
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_replaces_only_valid_lists() {
        let mut pad = GamepadState::new();
        let cfg = GamepadConfig {
            whack: vec!["R1".into()],
            confirm: vec!["nope".into()],
            cancel: vec![],
        };
        pad.load_button_config(&cfg);
        assert_eq!(pad.action_map.whack, vec![Btn::R1]);
        assert_eq!(pad.action_map.confirm, vec![Btn::Start]);
        assert_eq!(pad.action_map.cancel, vec![Btn::Select]);
    }

    #[test]
    fn pressed_buttons_map_to_actions() {
        let mut pad = GamepadState::new();
        pad.buttons[Btn::Y as usize].just_pressed = true;
        pad.dpad[step_index(Step::Left)].just_pressed = true;
        assert!(pad.whack_pressed());
        assert!(!pad.confirm_pressed());
        assert_eq!(pad.steps(), vec![Step::Left]);
        pad.clear_just_pressed();
        assert!(!pad.whack_pressed());
        assert!(pad.steps().is_empty());
    }
}
