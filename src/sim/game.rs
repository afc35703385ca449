/// Game: owns the bus and every component, and drives them per frame.
///
/// Update order while playing: spawner, garden, life bar, specials, marks,
/// clock.
/// The round ends when the life bar empties or the clock runs out.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::GameConfig;
use crate::domain::assets::AssetMap;
use crate::error::GameResult;

use super::bus::{EventBus, SubscriptionId};
use super::event::EventKind;
use super::garden::{timed_visuals, Garden};
use super::life_bar::LifeBar;
use super::marks::OutcomeMarks;
use super::score::{RoundClock, ScoreBoard, ScoreKeeper, SpecialList};
use super::spawner::Spawner;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EndReason {
    LifeEmpty,
    TimeUp,
}

pub struct Game {
    bus: EventBus,
    subscription: SubscriptionId,
    phase: Phase,
    end_reason: Option<EndReason>,
    life_empty: Rc<Cell<bool>>,
    spawner: Spawner,
    garden: Garden,
    life_bar: LifeBar,
    marks: OutcomeMarks,
    keeper: ScoreKeeper,
    clock: RoundClock,
    specials: SpecialList,
}

impl Game {
    pub fn new(cfg: &GameConfig) -> Self {
        let bus = EventBus::new();
        let specials: SpecialList = Rc::new(RefCell::new(Vec::new()));

        let life_empty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&life_empty);
        let subscription = bus.subscribe(EventKind::LifeBarEmpty, move |_| flag.set(true));

        let garden = Garden::new(
            bus.clone(),
            &cfg.garden,
            AssetMap::from_config(&cfg.characters),
            cfg.general.seed,
            timed_visuals(),
        );

        Game {
            subscription,
            phase: Phase::Title,
            end_reason: None,
            life_empty,
            spawner: Spawner::from_config(bus.clone(), &cfg.spawner),
            garden,
            life_bar: LifeBar::new(bus.clone()),
            marks: OutcomeMarks::new(bus.clone()),
            keeper: ScoreKeeper::new(bus.clone(), &cfg.score, Rc::clone(&specials)),
            clock: RoundClock::new(bus.clone(), &cfg.score),
            specials,
            bus,
        }
    }

    /// Reset every component and start a round.
    pub fn start(&mut self) {
        self.spawner.reset();
        self.garden.clear();
        self.life_bar.destroy();
        self.marks.clear();
        self.keeper.reset();
        self.clock.reset();
        self.specials.borrow_mut().clear();
        self.life_empty.set(false);
        self.end_reason = None;
        self.phase = Phase::Playing;
        log::info!("round started");
    }

    pub fn update(&mut self, delta_ms: f64) -> GameResult<()> {
        if self.phase != Phase::Playing {
            return Ok(());
        }

        self.spawner.update(delta_ms);
        self.garden.update(delta_ms)?;
        self.life_bar.update(delta_ms);
        self.update_specials(delta_ms);
        self.marks.update(delta_ms);
        self.clock.update(delta_ms);

        if self.life_empty.get() {
            self.end_round(EndReason::LifeEmpty);
        } else if self.clock.is_expired() {
            self.end_round(EndReason::TimeUp);
        }
        Ok(())
    }

    /// Pointer-down on a hole. Ignored outside a round.
    pub fn tap(&mut self, hole_index: usize) -> GameResult<bool> {
        if self.phase != Phase::Playing {
            return Ok(false);
        }
        self.garden.tap(hole_index)
    }

    // ── Accessors ──

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn garden(&self) -> &Garden {
        &self.garden
    }

    pub fn life_bar(&self) -> &LifeBar {
        &self.life_bar
    }

    pub fn marks(&self) -> &OutcomeMarks {
        &self.marks
    }

    pub fn board(&self) -> ScoreBoard {
        self.keeper.board()
    }

    pub fn remaining_ms(&self) -> f64 {
        self.clock.remaining_ms()
    }

    // ── Internal ──

    /// Specials created while others update are kept for the next frame.
    fn update_specials(&mut self, delta_ms: f64) {
        let mut live = std::mem::take(&mut *self.specials.borrow_mut());
        for special in live.iter_mut() {
            special.update(delta_ms);
        }
        live.retain_mut(|special| {
            if special.is_over() {
                special.destroy();
                false
            } else {
                true
            }
        });
        let mut list = self.specials.borrow_mut();
        live.append(&mut list);
        *list = live;
    }

    fn end_round(&mut self, reason: EndReason) {
        let board = self.keeper.board();
        log::info!(
            "round over ({:?}): {} points, {} hits, {} misses",
            reason,
            board.points,
            board.hits,
            board.misses
        );
        self.end_reason = Some(reason);
        self.phase = Phase::GameOver;
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
    }
}
