/// Specials: instantaneous game modifiers triggered by being created.

use crate::sim::bus::EventBus;
use crate::sim::event::Event;

pub trait Special {
    fn update(&mut self, delta_ms: f64);
    fn is_over(&self) -> bool;
    fn destroy(&mut self);
}

/// Time bonus. Publishes `IncreaseTime` on construction and is over at once.
pub struct TimeIncreaser;

impl TimeIncreaser {
    pub fn new(bus: &EventBus) -> Self {
        log::debug!("time bonus granted");
        bus.publish(Event::IncreaseTime);
        TimeIncreaser
    }
}

impl Special for TimeIncreaser {
    fn update(&mut self, _delta_ms: f64) {}

    fn is_over(&self) -> bool {
        true
    }

    fn destroy(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::bus::testing::Recorder;
    use crate::sim::event::EventKind;

    #[test]
    fn time_increaser_fires_on_creation_and_is_over() {
        let bus = EventBus::new();
        let rec = Recorder::all(&bus);
        let mut bonus = TimeIncreaser::new(&bus);
        assert_eq!(rec.kinds(), vec![EventKind::IncreaseTime]);
        assert!(bonus.is_over());
        bonus.update(1000.0);
        bonus.destroy();
        assert_eq!(rec.kinds().len(), 1);
    }
}
