/// Score keeping and the round clock.
///
/// The keeper turns hit/miss outcomes into a life value in [0, 1] and
/// publishes it as `ScoreUpdate`; the life bar eases toward it. Every
/// `bonus_streak` consecutive hits grant a time bonus special.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::ScoreConfig;
use crate::domain::special::{Special, TimeIncreaser};

use super::bus::{EventBus, SubscriptionId};
use super::event::{Event, EventKind};

const POINTS_PER_HIT: u32 = 10;

/// Live specials, shared with whoever spawns them from a bus callback.
pub type SpecialList = Rc<RefCell<Vec<Box<dyn Special>>>>;

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreBoard {
    pub life: f32,
    pub points: u32,
    pub hits: u32,
    pub misses: u32,
    pub streak: u32,
    pub best_streak: u32,
}

impl Default for ScoreBoard {
    fn default() -> Self {
        ScoreBoard { life: 1.0, points: 0, hits: 0, misses: 0, streak: 0, best_streak: 0 }
    }
}

pub struct ScoreKeeper {
    bus: EventBus,
    board: Rc<RefCell<ScoreBoard>>,
    subscriptions: Vec<SubscriptionId>,
}

impl ScoreKeeper {
    pub fn new(bus: EventBus, cfg: &ScoreConfig, specials: SpecialList) -> Self {
        let board = Rc::new(RefCell::new(ScoreBoard::default()));

        let on_hit = {
            let board = Rc::clone(&board);
            let weak = bus.downgrade();
            let reward = cfg.hit_reward;
            let bonus_streak = cfg.bonus_streak;
            move |_: &Event| {
                let (life, bonus) = {
                    let mut b = board.borrow_mut();
                    let multiplier = 1 + b.streak / bonus_streak.max(1);
                    b.hits += 1;
                    b.points += POINTS_PER_HIT * multiplier;
                    b.streak += 1;
                    b.best_streak = b.best_streak.max(b.streak);
                    b.life = (b.life + reward).clamp(0.0, 1.0);
                    (b.life, bonus_streak > 0 && b.streak % bonus_streak == 0)
                };
                weak.publish(Event::ScoreUpdate(life));
                if bonus {
                    if let Some(bus) = weak.upgrade() {
                        let special = TimeIncreaser::new(&bus);
                        specials.borrow_mut().push(Box::new(special));
                    }
                }
            }
        };

        let on_miss = {
            let board = Rc::clone(&board);
            let weak = bus.downgrade();
            let penalty = cfg.miss_penalty;
            move |_: &Event| {
                let life = {
                    let mut b = board.borrow_mut();
                    b.misses += 1;
                    b.streak = 0;
                    b.life = (b.life - penalty).clamp(0.0, 1.0);
                    b.life
                };
                weak.publish(Event::ScoreUpdate(life));
            }
        };

        let subscriptions = vec![
            bus.subscribe(EventKind::MoleHit, on_hit),
            bus.subscribe(EventKind::MoleMiss, on_miss),
        ];
        ScoreKeeper { bus, board, subscriptions }
    }

    pub fn board(&self) -> ScoreBoard {
        self.board.borrow().clone()
    }

    pub fn reset(&self) {
        *self.board.borrow_mut() = ScoreBoard::default();
    }
}

impl Drop for ScoreKeeper {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.bus.unsubscribe(id);
        }
    }
}

/// Countdown for the round. `IncreaseTime` adds the configured bonus.
pub struct RoundClock {
    bus: EventBus,
    subscription: SubscriptionId,
    round_ms: f64,
    remaining_ms: Rc<Cell<f64>>,
}

impl RoundClock {
    pub fn new(bus: EventBus, cfg: &ScoreConfig) -> Self {
        let remaining_ms = Rc::new(Cell::new(cfg.round_ms));
        let sink = Rc::clone(&remaining_ms);
        let bonus = cfg.time_bonus_ms;
        let subscription = bus.subscribe(EventKind::IncreaseTime, move |_| {
            sink.set(sink.get() + bonus);
        });
        RoundClock { bus, subscription, round_ms: cfg.round_ms, remaining_ms }
    }

    pub fn update(&mut self, delta_ms: f64) {
        self.remaining_ms.set((self.remaining_ms.get() - delta_ms).max(0.0));
    }

    pub fn remaining_ms(&self) -> f64 {
        self.remaining_ms.get()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_ms.get() <= 0.0
    }

    pub fn reset(&self) {
        self.remaining_ms.set(self.round_ms);
    }
}

impl Drop for RoundClock {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
    }
}
