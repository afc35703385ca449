/// Outcome marks: which holes just saw a hit or a miss.
///
/// A mark is set by `MoleHit` / `MoleMiss` and stays while the character plays
/// its outcome clip. When `HoleAvailable` frees the hole, the mark lingers for
/// `AFTERGLOW_MS` and then clears. A new outcome on the same hole replaces it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::bus::{EventBus, SubscriptionId};
use super::event::{Event, EventKind};

pub const AFTERGLOW_MS: f64 = 300.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Hit,
    Miss,
}

#[derive(Clone, Copy, Debug)]
struct Mark {
    outcome: Outcome,
    /// None while the hole is still occupied.
    fade_ms: Option<f64>,
}

type MarkTable = Rc<RefCell<HashMap<usize, Mark>>>;

pub struct OutcomeMarks {
    bus: EventBus,
    subscriptions: Vec<SubscriptionId>,
    marks: MarkTable,
}

impl OutcomeMarks {
    pub fn new(bus: EventBus) -> Self {
        let marks: MarkTable = Rc::new(RefCell::new(HashMap::new()));
        let mut subscriptions = Vec::with_capacity(3);

        for kind in [EventKind::MoleHit, EventKind::MoleMiss] {
            let table = Rc::clone(&marks);
            subscriptions.push(bus.subscribe(kind, move |e| {
                let (hole, outcome) = match e {
                    Event::MoleHit(hole) => (*hole, Outcome::Hit),
                    Event::MoleMiss(hole) => (*hole, Outcome::Miss),
                    _ => return,
                };
                table.borrow_mut().insert(hole, Mark { outcome, fade_ms: None });
            }));
        }

        let table = Rc::clone(&marks);
        subscriptions.push(bus.subscribe(EventKind::HoleAvailable, move |e| {
            if let Event::HoleAvailable(hole) = e {
                if let Some(mark) = table.borrow_mut().get_mut(hole) {
                    mark.fade_ms = Some(AFTERGLOW_MS);
                }
            }
        }));

        OutcomeMarks { bus, subscriptions, marks }
    }

    pub fn update(&mut self, delta_ms: f64) {
        self.marks.borrow_mut().retain(|_, mark| match mark.fade_ms.as_mut() {
            Some(left) => {
                *left -= delta_ms;
                *left > 0.0
            }
            None => true,
        });
    }

    pub fn get(&self, hole: usize) -> Option<Outcome> {
        self.marks.borrow().get(&hole).map(|m| m.outcome)
    }

    pub fn clear(&mut self) {
        self.marks.borrow_mut().clear();
    }
}

impl Drop for OutcomeMarks {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.bus.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_marks_its_hole_only() {
        let bus = EventBus::new();
        let marks = OutcomeMarks::new(bus.clone());
        bus.publish(Event::MoleHit(4));
        bus.publish(Event::MoleMiss(7));
        assert_eq!(marks.get(4), Some(Outcome::Hit));
        assert_eq!(marks.get(7), Some(Outcome::Miss));
        assert_eq!(marks.get(0), None);
    }

    #[test]
    fn mark_holds_while_occupied_then_fades() {
        let bus = EventBus::new();
        let mut marks = OutcomeMarks::new(bus.clone());
        bus.publish(Event::MoleHit(2));
        for _ in 0..100 {
            marks.update(16.0);
        }
        assert_eq!(marks.get(2), Some(Outcome::Hit));

        bus.publish(Event::HoleAvailable(2));
        marks.update(AFTERGLOW_MS - 1.0);
        assert_eq!(marks.get(2), Some(Outcome::Hit));
        marks.update(2.0);
        assert_eq!(marks.get(2), None);
    }

    #[test]
    fn new_outcome_replaces_a_fading_mark() {
        let bus = EventBus::new();
        let mut marks = OutcomeMarks::new(bus.clone());
        bus.publish(Event::MoleMiss(1));
        bus.publish(Event::HoleAvailable(1));
        marks.update(100.0);
        bus.publish(Event::MoleHit(1));
        marks.update(AFTERGLOW_MS * 2.0);
        assert_eq!(marks.get(1), Some(Outcome::Hit));
    }

    #[test]
    fn freeing_an_unmarked_hole_is_ignored() {
        let bus = EventBus::new();
        let mut marks = OutcomeMarks::new(bus.clone());
        bus.publish(Event::HoleAvailable(3));
        marks.update(16.0);
        assert_eq!(marks.get(3), None);
    }

    #[test]
    fn drop_unsubscribes() {
        let bus = EventBus::new();
        let marks = OutcomeMarks::new(bus.clone());
        drop(marks);
        assert_eq!(bus.subscriber_count(EventKind::MoleHit), 0);
        assert_eq!(bus.subscriber_count(EventKind::MoleMiss), 0);
        assert_eq!(bus.subscriber_count(EventKind::HoleAvailable), 0);
    }
}
