/// Garden: the grid of holes and the characters living in them.
///
/// Spawned characters arrive through `CreateCharacter` and wait in a queue
/// until the next `update`, where each is bound to a free hole. A hole is
/// occupied from attach until its character leaves, so a hole never holds
/// two characters.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::config::GardenConfig;
use crate::domain::assets::{AssetMap, CharacterAssets};
use crate::domain::character::Character;
use crate::domain::hole::{Hole, Position};
use crate::domain::visual::{CharacterVisual, TimedVisual};
use crate::error::{GameError, GameResult};

use super::bus::{EventBus, SubscriptionId};
use super::event::{Event, EventKind};

/// Builds the visual counterpart for a character about to be attached.
pub type VisualFactory = Box<dyn Fn(&CharacterAssets) -> Box<dyn CharacterVisual>>;

/// Clock-driven visuals timed from the asset map.
pub fn timed_visuals() -> VisualFactory {
    Box::new(|assets: &CharacterAssets| -> Box<dyn CharacterVisual> {
        Box::new(TimedVisual::new(assets.clone()))
    })
}

// Screen layout of hole centers, in terminal cells.
const ORIGIN_X: u16 = 8;
const ORIGIN_Y: u16 = 5;
const SPACING_X: u16 = 14;
const SPACING_Y: u16 = 5;

pub struct Garden {
    bus: EventBus,
    subscription: SubscriptionId,
    assets: AssetMap,
    make_visual: VisualFactory,
    rows: usize,
    cols: usize,
    holes: Vec<Rc<Hole>>,
    characters: Vec<Character>,
    pending: Rc<RefCell<VecDeque<Character>>>,
    rng: u64,
}

impl Garden {
    pub fn new(
        bus: EventBus,
        cfg: &GardenConfig,
        assets: AssetMap,
        seed: u64,
        make_visual: VisualFactory,
    ) -> Self {
        let mut holes = Vec::with_capacity(cfg.rows * cfg.cols);
        for row in 0..cfg.rows {
            for col in 0..cfg.cols {
                let center = Position::new(
                    ORIGIN_X + col as u16 * SPACING_X,
                    ORIGIN_Y + row as u16 * SPACING_Y,
                );
                holes.push(Rc::new(Hole::new(holes.len(), center)));
            }
        }

        let pending = Rc::new(RefCell::new(VecDeque::new()));
        let queue = Rc::clone(&pending);
        let subscription = bus.subscribe(EventKind::CreateCharacter, move |e| {
            if let Event::CreateCharacter(spawn) = e {
                if let Some(character) = spawn.take() {
                    queue.borrow_mut().push_back(character);
                }
            }
        });

        Garden {
            bus,
            subscription,
            assets,
            make_visual,
            rows: cfg.rows,
            cols: cfg.cols,
            holes,
            characters: Vec::new(),
            pending,
            rng: seed,
        }
    }

    pub fn update(&mut self, delta_ms: f64) -> GameResult<()> {
        self.place_pending()?;
        for character in &mut self.characters {
            character.update(delta_ms)?;
        }
        self.characters.retain(|c| !c.is_removed());
        Ok(())
    }

    /// Pointer-down on hole `index`. Returns whether a character was hit.
    pub fn tap(&mut self, index: usize) -> GameResult<bool> {
        if index >= self.holes.len() {
            return Err(GameError::InvalidHole(index));
        }
        match self.characters.iter_mut().find(|c| c.hole_id() == Some(index)) {
            Some(character) => character.hit(),
            None => Ok(false),
        }
    }

    /// Drop every character and free all holes.
    pub fn clear(&mut self) {
        self.pending.borrow_mut().clear();
        self.characters.clear();
        for hole in &self.holes {
            hole.set_available();
        }
    }

    pub fn holes(&self) -> &[Rc<Hole>] {
        &self.holes
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    // ── Internal ──

    fn place_pending(&mut self) -> GameResult<()> {
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(mut character) = next else { break };

            let free: Vec<usize> = self
                .holes
                .iter()
                .filter(|h| h.is_available())
                .map(|h| h.id())
                .collect();
            if free.is_empty() {
                log::debug!("garden full, {} dropped", character.name());
                continue;
            }
            let index = free[self.next_random() % free.len()];
            let hole = Rc::clone(&self.holes[index]);

            character.create(&self.assets)?;
            let visual = match character.assets() {
                Some(assets) => (self.make_visual)(assets),
                None => {
                    return Err(GameError::MissingCollaborator(format!(
                        "assets for `{}`",
                        character.name()
                    )))
                }
            };
            let position = Position::new((index % self.cols) as u16, (index / self.cols) as u16);
            character.attach_to_hole(hole, position, visual)?;
            self.characters.push(character);
        }
        Ok(())
    }

    /// 64-bit LCG; upper bits are the usable ones.
    fn next_random(&mut self) -> usize {
        self.rng = self
            .rng
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.rng >> 33) as usize
    }
}

impl Drop for Garden {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscription);
    }
}
