/// Life bar: eases the displayed life toward the latest score target.
///
/// Easing is per frame (not time-scaled): every `update` closes
/// `EASE_PACE` of the remaining gap. `LifeBarEmpty` is edge-triggered; it
/// fires once when the displayed value drops to `TOLERANCE` and re-arms only
/// after the value climbs back above it.

use std::cell::Cell;
use std::rc::Rc;

use super::bus::{EventBus, SubscriptionId};
use super::event::{Event, EventKind};

pub const EASE_PACE: f32 = 0.1;
pub const TOLERANCE: f32 = 0.009;

pub struct LifeBar {
    bus: EventBus,
    subscription: SubscriptionId,
    current: f32,
    target: Rc<Cell<f32>>,
    empty_fired: bool,
}

impl LifeBar {
    pub fn new(bus: EventBus) -> Self {
        let target = Rc::new(Cell::new(1.0));
        let sink = Rc::clone(&target);
        let subscription = bus.subscribe(EventKind::ScoreUpdate, move |e| {
            if let Event::ScoreUpdate(score) = e {
                sink.set(*score);
            }
        });
        LifeBar { bus, subscription, current: 1.0, target, empty_fired: false }
    }

    pub fn update(&mut self, _delta_ms: f64) {
        let pace = (self.target.get() - self.current) * EASE_PACE;
        self.current += pace;

        if self.current <= TOLERANCE {
            if !self.empty_fired {
                self.empty_fired = true;
                log::info!("life bar empty");
                self.bus.publish(Event::LifeBarEmpty);
            }
        } else {
            self.empty_fired = false;
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    #[cfg(test)]
    pub fn target(&self) -> f32 {
        self.target.get()
    }

    /// Fraction of the bar that is cropped away (0 = full, 1 = empty).
    pub fn crop(&self) -> f32 {
        (1.0 - self.current).clamp(0.0, 1.0)
    }

    /// Back to a full bar. The subscription stays live.
    pub fn destroy(&mut self) {
        self.current = 1.0;
        self.target.set(1.0);
        self.empty_fired = false;
    }
}

impl Drop for LifeBar {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
    }
}
