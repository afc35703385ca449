/// Spawner: a repeating countdown that asks for a new character.
///
/// `total_time` wraps every `CYCLE_WIDTH_MS`; it only matters to pacing
/// strategies that vary the interval over the cycle.

use crate::config::{PacingKind, SpawnerConfig};
use crate::domain::character::Character;

use super::bus::EventBus;
use super::event::{CharacterSpawn, Event};

pub const CYCLE_WIDTH_MS: f64 = 15_000.0;
const SIN_HEIGHT_MS: f64 = 100.0;

/// Decides how long to wait before the next spawn.
pub trait SpawnPacing {
    fn next_interval(&self, total_time_ms: f64) -> f64;
}

/// Fixed interval between spawns.
pub struct ConstantPacing {
    pub interval_ms: f64,
}

impl SpawnPacing for ConstantPacing {
    fn next_interval(&self, _total_time_ms: f64) -> f64 {
        self.interval_ms
    }
}

/// Curve over the spawn cycle: a slowly rising log term plus a half sine
/// that peaks mid-cycle. Opt-in only (`pacing = "curve"`).
pub struct CurvePacing;

impl SpawnPacing for CurvePacing {
    fn next_interval(&self, total_time_ms: f64) -> f64 {
        let phase = (total_time_ms - CYCLE_WIDTH_MS) * std::f64::consts::PI / CYCLE_WIDTH_MS;
        (total_time_ms * 100.0 + 1000.0).ln() - phase.sin() * SIN_HEIGHT_MS
    }
}

pub struct Spawner {
    bus: EventBus,
    pacing: Box<dyn SpawnPacing>,
    character_duration_ms: f64,
    total_time_ms: f64,
    next_creation_ms: f64,
}

impl Spawner {
    pub fn new(bus: EventBus, pacing: Box<dyn SpawnPacing>, character_duration_ms: f64) -> Self {
        Spawner {
            bus,
            pacing,
            character_duration_ms,
            total_time_ms: 0.0,
            next_creation_ms: 0.0,
        }
    }

    pub fn from_config(bus: EventBus, cfg: &SpawnerConfig) -> Self {
        let pacing: Box<dyn SpawnPacing> = match cfg.pacing {
            PacingKind::Constant => Box::new(ConstantPacing { interval_ms: cfg.interval_ms }),
            PacingKind::Curve => Box::new(CurvePacing),
        };
        Spawner::new(bus, pacing, cfg.character_duration_ms)
    }

    /// Advance the timer. Returns whether a character was requested.
    pub fn update(&mut self, delta_ms: f64) -> bool {
        self.total_time_ms += delta_ms;
        if self.total_time_ms >= CYCLE_WIDTH_MS {
            self.total_time_ms -= CYCLE_WIDTH_MS;
        }

        self.next_creation_ms -= delta_ms;
        if self.next_creation_ms > 0.0 {
            return false;
        }

        self.next_creation_ms = self.pacing.next_interval(self.total_time_ms);
        let mole = Character::mole(self.bus.clone(), self.character_duration_ms);
        self.bus.publish(Event::CreateCharacter(CharacterSpawn::new(mole)));
        true
    }

    /// Restart the cycle; the next update spawns immediately.
    pub fn reset(&mut self) {
        self.total_time_ms = 0.0;
        self.next_creation_ms = 0.0;
    }

    #[cfg(test)]
    pub fn total_time_ms(&self) -> f64 {
        self.total_time_ms
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::event::EventKind;

    fn constant(bus: &EventBus) -> Spawner {
        Spawner::from_config(bus.clone(), &SpawnerConfig::default())
    }

    /// Collects the durations of every spawned character.
    fn spawn_log(bus: &EventBus) -> Rc<RefCell<Vec<f64>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        bus.subscribe(EventKind::CreateCharacter, move |e| {
            if let Event::CreateCharacter(spawn) = e {
                sink.borrow_mut().push(spawn.duration_ms().unwrap_or(-1.0));
            }
        });
        log
    }

    #[test]
    fn first_update_spawns_immediately() {
        let bus = EventBus::new();
        let log = spawn_log(&bus);
        let mut s = constant(&bus);
        assert!(s.update(16.0));
        assert_eq!(*log.borrow(), vec![2000.0]);
    }

    #[test]
    fn constant_pacing_spawns_once_per_crossing() {
        let bus = EventBus::new();
        let log = spawn_log(&bus);
        let mut s = constant(&bus);

        // 0 ms crossing, then every 2000 ms: 125 frames of 16 ms = 2000 ms
        let mut spawned_frames = vec![];
        for frame in 0..400 {
            if s.update(16.0) {
                spawned_frames.push(frame);
            }
        }
        assert_eq!(spawned_frames, vec![0, 125, 250, 375]);
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn large_delta_spawns_only_once() {
        let bus = EventBus::new();
        let log = spawn_log(&bus);
        let mut s = constant(&bus);
        s.update(16.0);
        assert!(s.update(10_000.0));
        assert!(!s.update(16.0));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn total_time_wraps_at_cycle_width() {
        let bus = EventBus::new();
        let mut s = constant(&bus);
        for _ in 0..16 {
            s.update(1000.0);
        }
        assert!((s.total_time_ms() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn reset_spawns_on_next_update() {
        let bus = EventBus::new();
        let mut s = constant(&bus);
        s.update(16.0);
        assert!(!s.update(16.0));
        s.reset();
        assert!(s.update(16.0));
    }

    #[test]
    fn curve_pacing_is_positive_over_the_cycle() {
        let curve = CurvePacing;
        let mut t = 0.0;
        while t < CYCLE_WIDTH_MS {
            let interval = curve.next_interval(t);
            assert!(interval > 0.0, "interval {interval} at {t}");
            t += 250.0;
        }
        // Mid-cycle is the slowest point of the curve
        assert!(curve.next_interval(CYCLE_WIDTH_MS / 2.0) > curve.next_interval(100.0));
    }

    #[test]
    fn curve_pacing_is_opt_in() {
        let bus = EventBus::new();
        let log = spawn_log(&bus);
        let cfg = SpawnerConfig { pacing: PacingKind::Curve, ..SpawnerConfig::default() };
        let mut s = Spawner::from_config(bus.clone(), &cfg);
        for _ in 0..100 {
            s.update(16.0);
        }
        // Curve intervals are far below the 2000 ms constant default
        assert!(log.borrow().len() > 1);
    }
}
