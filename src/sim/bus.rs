/// Synchronous publish/subscribe bus.
///
/// The bus is a cheap, cloneable handle. The game owns the first handle and
/// passes clones to every component that publishes or subscribes.
///
/// Dispatch is re-entrant: a callback may publish or subscribe while another
/// publish is in flight. Each publish works on a snapshot of the subscriber
/// list taken before the first callback runs, so nested publishes complete
/// depth-first and subscriptions made during dispatch only see later events.
///
/// Handles are `Rc`-based and therefore confined to the frame-loop thread.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::event::{Event, EventKind};

type Callback = Rc<dyn Fn(&Event)>;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: Cell<u64>,
    subscribers: RefCell<HashMap<EventKind, Vec<(SubscriptionId, Callback)>>>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `kind`. Callbacks run in registration order.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) + 'static,
    {
        let id = SubscriptionId(self.registry.next_id.get());
        self.registry.next_id.set(id.0 + 1);
        self.registry
            .subscribers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, Rc::new(callback)));
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.registry.subscribers.borrow_mut();
        for list in subs.values_mut() {
            if let Some(pos) = list.iter().position(|(sid, _)| *sid == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Deliver `event` to every subscriber of its kind.
    /// Returns whether at least one subscriber existed.
    pub fn publish(&self, event: Event) -> bool {
        let kind = event.kind();
        // Snapshot, then release the borrow before any callback runs.
        let snapshot: Vec<Callback> = match self.registry.subscribers.borrow().get(&kind) {
            Some(list) => list.iter().map(|(_, cb)| Rc::clone(cb)).collect(),
            None => Vec::new(),
        };
        log::trace!("publish {:?} to {} subscriber(s)", kind, snapshot.len());
        for callback in &snapshot {
            callback(&event);
        }
        !snapshot.is_empty()
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .subscribers
            .borrow()
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Handle for callbacks that publish. Capturing a strong handle inside
    /// a subscriber would keep the registry alive through itself.
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus { registry: Rc::downgrade(&self.registry) }
    }
}

#[derive(Clone)]
pub struct WeakEventBus {
    registry: Weak<Registry>,
}

impl WeakEventBus {
    /// Publish if the bus still exists; false otherwise.
    pub fn publish(&self, event: Event) -> bool {
        match self.registry.upgrade() {
            Some(registry) => EventBus { registry }.publish(event),
            None => false,
        }
    }

    pub fn upgrade(&self) -> Option<EventBus> {
        self.registry.upgrade().map(|registry| EventBus { registry })
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Records the kinds published on a bus, in dispatch order.
    pub struct Recorder {
        seen: Rc<RefCell<Vec<EventKind>>>,
    }

    impl Recorder {
        pub fn attach(bus: &EventBus, kinds: &[EventKind]) -> Self {
            let seen = Rc::new(RefCell::new(Vec::new()));
            for &kind in kinds {
                let sink = Rc::clone(&seen);
                bus.subscribe(kind, move |e| sink.borrow_mut().push(e.kind()));
            }
            Recorder { seen }
        }

        pub fn all(bus: &EventBus) -> Self {
            Self::attach(bus, &EventKind::ALL)
        }

        pub fn kinds(&self) -> Vec<EventKind> {
            self.seen.borrow().clone()
        }

        pub fn count(&self, kind: EventKind) -> usize {
            self.seen.borrow().iter().filter(|k| **k == kind).count()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        assert!(!bus.publish(Event::LifeBarEmpty));
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            bus.subscribe(EventKind::MoleHit, move |_| order.borrow_mut().push(tag));
        }
        assert!(bus.publish(Event::MoleHit(0)));
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn payload_reaches_subscriber() {
        let bus = EventBus::new();
        let got = Rc::new(Cell::new(0.0_f32));
        let sink = Rc::clone(&got);
        bus.subscribe(EventKind::ScoreUpdate, move |e| {
            if let Event::ScoreUpdate(v) = e {
                sink.set(*v);
            }
        });
        bus.publish(Event::ScoreUpdate(0.42));
        assert!((got.get() - 0.42).abs() < 1e-6);
    }

    #[test]
    fn only_matching_kind_is_delivered() {
        let bus = EventBus::new();
        let rec = testing::Recorder::attach(&bus, &[EventKind::MoleMiss]);
        bus.publish(Event::MoleHit(1));
        bus.publish(Event::MoleMiss(1));
        assert_eq!(rec.kinds(), vec![EventKind::MoleMiss]);
    }

    #[test]
    fn nested_publish_is_depth_first() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let inner_bus = bus.downgrade();
        let o = Rc::clone(&order);
        bus.subscribe(EventKind::MoleHit, move |_| {
            o.borrow_mut().push("hit:a");
            inner_bus.publish(Event::ScoreUpdate(0.5));
            o.borrow_mut().push("hit:a-done");
        });
        let o = Rc::clone(&order);
        bus.subscribe(EventKind::MoleHit, move |_| o.borrow_mut().push("hit:b"));
        let o = Rc::clone(&order);
        bus.subscribe(EventKind::ScoreUpdate, move |_| o.borrow_mut().push("score"));

        bus.publish(Event::MoleHit(4));
        assert_eq!(*order.borrow(), vec!["hit:a", "score", "hit:a-done", "hit:b"]);
    }

    #[test]
    fn subscribe_during_dispatch_waits_for_next_publish() {
        let bus = EventBus::new();
        let late_calls = Rc::new(Cell::new(0));

        let inner_bus = bus.downgrade();
        let calls = Rc::clone(&late_calls);
        bus.subscribe(EventKind::IncreaseTime, move |_| {
            let calls = Rc::clone(&calls);
            let Some(inner_bus) = inner_bus.upgrade() else { return };
            inner_bus.subscribe(EventKind::IncreaseTime, move |_| calls.set(calls.get() + 1));
        });

        bus.publish(Event::IncreaseTime);
        assert_eq!(late_calls.get(), 0);
        assert_eq!(bus.subscriber_count(EventKind::IncreaseTime), 2);

        bus.publish(Event::IncreaseTime);
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = bus.subscribe(EventKind::MoleHit, move |_| h.set(h.get() + 1));

        bus.publish(Event::MoleHit(0));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(!bus.publish(Event::MoleHit(0)));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unsubscribe_during_dispatch_keeps_in_flight_snapshot() {
        let bus = EventBus::new();
        let later_calls = Rc::new(Cell::new(0));
        let later_id = Rc::new(Cell::new(None));

        let inner_bus = bus.downgrade();
        let target = Rc::clone(&later_id);
        bus.subscribe(EventKind::MoleMiss, move |_| {
            let (Some(inner_bus), Some(id)) = (inner_bus.upgrade(), target.get()) else { return };
            inner_bus.unsubscribe(id);
        });
        let calls = Rc::clone(&later_calls);
        later_id.set(Some(bus.subscribe(EventKind::MoleMiss, move |_| calls.set(calls.get() + 1))));

        bus.publish(Event::MoleMiss(3));
        assert_eq!(later_calls.get(), 1);
        assert_eq!(bus.subscriber_count(EventKind::MoleMiss), 1);

        bus.publish(Event::MoleMiss(3));
        assert_eq!(later_calls.get(), 1);
    }

    #[test]
    fn weak_handle_outlives_bus_quietly() {
        let bus = EventBus::new();
        let weak = bus.downgrade();
        let rec = testing::Recorder::all(&bus);
        assert!(weak.publish(Event::IncreaseTime));
        assert_eq!(rec.count(EventKind::IncreaseTime), 1);
        drop(bus);
        assert!(!weak.publish(Event::IncreaseTime));
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn clones_share_subscribers() {
        let bus = EventBus::new();
        let other = bus.clone();
        let rec = testing::Recorder::all(&other);
        bus.publish(Event::LifeBarEmpty);
        assert_eq!(rec.count(EventKind::LifeBarEmpty), 1);
    }
}
