/// Character lifecycle state machine.
///
/// ```text
///   Created ──attach──▶ Raising ──raise done──▶ Alive
///                          │                      │
///                          ├──── hit ─────────────┤──▶ Hit ──hit done──▶ Removed
///                          └── duration out ──────┴──▶ Missing ──miss done──▶ Removed
/// ```
///
/// The alive flag is set on attach and cleared by whichever of hit/miss
/// fires first, so exactly one outcome event is published per character.
/// Animation ends arrive as `animation_complete` signals, either from the
/// bound visual during `update` or from whoever drives the visual.

use std::fmt;
use std::rc::Rc;

use crate::error::{GameError, GameResult};
use crate::sim::bus::EventBus;
use crate::sim::event::Event;

use super::assets::{Animation, AssetMap, CharacterAssets};
use super::hole::{Hole, Position};
use super::visual::CharacterVisual;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CharacterState {
    Created,
    Raising,
    Alive,
    Missing,
    Hit,
    Removed,
}

/// Outcome events a character publishes, keyed by hole id.
#[derive(Clone, Copy)]
pub struct CharacterEvents {
    pub miss: fn(usize) -> Event,
    pub hit: fn(usize) -> Event,
}

#[derive(Clone)]
pub struct CharacterConfig {
    pub name: String,
    pub events: CharacterEvents,
}

pub struct Character {
    bus: EventBus,
    config: CharacterConfig,
    remaining_ms: f64,
    state: CharacterState,
    alive: bool,
    started_missing: bool,
    assets: Option<CharacterAssets>,
    hole: Option<Rc<Hole>>,
    position: Option<Position>,
    visual: Option<Box<dyn CharacterVisual>>,
}

impl Character {
    pub fn new(bus: EventBus, config: CharacterConfig, duration_ms: f64) -> Self {
        Character {
            bus,
            config,
            remaining_ms: duration_ms,
            state: CharacterState::Created,
            alive: false,
            started_missing: false,
            assets: None,
            hole: None,
            position: None,
            visual: None,
        }
    }

    pub fn mole(bus: EventBus, duration_ms: f64) -> Self {
        let config = CharacterConfig {
            name: "mole".to_string(),
            events: CharacterEvents { miss: Event::MoleMiss, hit: Event::MoleHit },
        };
        Character::new(bus, config, duration_ms)
    }

    // ── Accessors ──

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn state(&self) -> CharacterState {
        self.state
    }

    #[cfg(test)]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_removed(&self) -> bool {
        self.state == CharacterState::Removed
    }

    pub fn remaining_ms(&self) -> f64 {
        self.remaining_ms
    }

    pub fn hole_id(&self) -> Option<usize> {
        self.hole.as_ref().map(|h| h.id())
    }

    /// Grid cell (column, row) of the occupied hole.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Asset entry bound by `create`.
    pub fn assets(&self) -> Option<&CharacterAssets> {
        self.assets.as_ref()
    }

    // ── Lifecycle ──

    /// Bind the per-character asset entry.
    pub fn create(&mut self, assets: &AssetMap) -> GameResult<()> {
        let entry = assets.get(&self.config.name).ok_or_else(|| {
            GameError::MissingCollaborator(format!("assets for `{}`", self.config.name))
        })?;
        self.assets = Some(entry.clone());
        Ok(())
    }

    /// Bind to `hole` and start raising. The hole is marked occupied.
    pub fn attach_to_hole(
        &mut self,
        hole: Rc<Hole>,
        position_in_garden: Position,
        visual: Box<dyn CharacterVisual>,
    ) -> GameResult<()> {
        if self.state != CharacterState::Created {
            return Err(GameError::AlreadyAttached(self.hole_id().unwrap_or(hole.id())));
        }
        if self.assets.is_none() {
            return Err(GameError::MissingCollaborator(format!(
                "`{}` attached before create",
                self.config.name
            )));
        }
        log::debug!("{} raised in hole {}", self.config.name, hole.id());
        hole.occupy();
        self.hole = Some(hole);
        self.position = Some(position_in_garden);
        self.visual = Some(visual);
        self.alive = true;
        self.state = CharacterState::Raising;
        self.play(Animation::Raise)
    }

    /// Per-frame tick: collect finished clips, then count down.
    pub fn update(&mut self, delta_ms: f64) -> GameResult<()> {
        if let Some(done) = self.visual.as_mut().and_then(|v| v.advance(delta_ms)) {
            self.animation_complete(done)?;
        }

        self.remaining_ms -= delta_ms;
        if self.alive && self.remaining_ms <= 0.0 && !self.started_missing {
            self.started_missing = true;
            self.state = CharacterState::Missing;
            self.play(Animation::Miss)?;
        }
        Ok(())
    }

    /// Pointer-down on this character. Returns whether the hit registered;
    /// hits outside Raising/Alive are ignored.
    pub fn hit(&mut self) -> GameResult<bool> {
        let hittable = matches!(self.state, CharacterState::Raising | CharacterState::Alive);
        if !self.alive || !hittable {
            return Ok(false);
        }
        self.alive = false;
        self.state = CharacterState::Hit;
        if let Some(id) = self.hole_id() {
            self.bus.publish((self.config.events.hit)(id));
        }
        self.play(Animation::Hit)?;
        Ok(true)
    }

    /// Input signal: `anim` finished playing. Stale signals are ignored.
    pub fn animation_complete(&mut self, anim: Animation) -> GameResult<()> {
        match (self.state, anim) {
            (CharacterState::Raising, Animation::Raise) => {
                self.state = CharacterState::Alive;
                self.play(Animation::Alive)
            }
            (CharacterState::Missing, Animation::Miss) => {
                if self.alive {
                    self.alive = false;
                    if let Some(id) = self.hole_id() {
                        self.bus.publish((self.config.events.miss)(id));
                    }
                    self.release()?;
                }
                Ok(())
            }
            (CharacterState::Hit, Animation::Hit) => self.release(),
            _ => Ok(()),
        }
    }

    // ── Internal ──

    fn play(&mut self, anim: Animation) -> GameResult<()> {
        let visual = self.visual.as_mut().ok_or_else(|| {
            GameError::MissingCollaborator(format!("visual for `{}`", self.config.name))
        })?;
        visual.play(anim);
        Ok(())
    }

    /// Free the hole, drop the visual, and leave the garden.
    fn release(&mut self) -> GameResult<()> {
        let mut visual = self.visual.take().ok_or_else(|| {
            GameError::MissingCollaborator(format!("visual for `{}`", self.config.name))
        })?;
        visual.destroy();
        self.state = CharacterState::Removed;
        if let Some(hole) = &self.hole {
            hole.set_available();
            log::debug!("{} left hole {}", self.config.name, hole.id());
            self.bus.publish(Event::HoleAvailable(hole.id()));
        }
        Ok(())
    }
}

impl fmt::Debug for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Character")
            .field("name", &self.config.name)
            .field("state", &self.state)
            .field("alive", &self.alive)
            .field("remaining_ms", &self.remaining_ms)
            .field("hole", &self.hole_id())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{default_assets, ScriptedVisual};
    use super::*;
    use crate::domain::visual::TimedVisual;
    use crate::sim::bus::testing::Recorder;
    use crate::sim::event::EventKind;

    fn attached(bus: &EventBus, duration: f64) -> (Character, Rc<Hole>, ScriptedVisual) {
        let mut c = Character::mole(bus.clone(), duration);
        c.create(&default_assets()).unwrap();
        let hole = Rc::new(Hole::new(7, Position::new(4, 2)));
        let visual = ScriptedVisual::default();
        c.attach_to_hole(Rc::clone(&hole), Position::new(1, 0), Box::new(visual.clone()))
            .unwrap();
        (c, hole, visual)
    }

    #[test]
    fn attach_raises_and_occupies_hole() {
        let bus = EventBus::new();
        let (c, hole, visual) = attached(&bus, 2000.0);
        assert_eq!(c.state(), CharacterState::Raising);
        assert!(c.is_alive());
        assert!(!hole.is_available());
        assert_eq!(c.position(), Some(Position::new(1, 0)));
        assert_eq!(*visual.played.borrow(), vec![Animation::Raise]);
    }

    #[test]
    fn raise_completion_goes_alive() {
        let bus = EventBus::new();
        let (mut c, _hole, visual) = attached(&bus, 2000.0);
        c.animation_complete(Animation::Raise).unwrap();
        assert_eq!(c.state(), CharacterState::Alive);
        assert_eq!(*visual.played.borrow(), vec![Animation::Raise, Animation::Alive]);
    }

    #[test]
    fn unhit_character_misses_exactly_once() {
        let bus = EventBus::new();
        let rec = Recorder::all(&bus);
        let (mut c, hole, visual) = attached(&bus, 2000.0);
        c.animation_complete(Animation::Raise).unwrap();

        for _ in 0..200 {
            c.update(16.0).unwrap();
        }
        assert_eq!(c.state(), CharacterState::Missing);
        assert_eq!(rec.count(EventKind::MoleMiss), 0);
        assert_eq!(visual.played.borrow().last(), Some(&Animation::Miss));
        assert_eq!(visual.played.borrow().iter().filter(|a| **a == Animation::Miss).count(), 1);

        c.animation_complete(Animation::Miss).unwrap();
        c.animation_complete(Animation::Miss).unwrap();
        for _ in 0..10 {
            c.update(16.0).unwrap();
        }

        assert_eq!(rec.count(EventKind::MoleMiss), 1);
        assert_eq!(rec.count(EventKind::MoleHit), 0);
        assert_eq!(rec.kinds(), vec![EventKind::MoleMiss, EventKind::HoleAvailable]);
        assert!(hole.is_available());
        assert!(c.is_removed());
        assert!(*visual.destroyed.borrow());
    }

    #[test]
    fn hit_before_timeout_publishes_hit_only() {
        let bus = EventBus::new();
        let rec = Recorder::all(&bus);
        let (mut c, hole, visual) = attached(&bus, 2000.0);
        c.animation_complete(Animation::Raise).unwrap();
        c.update(500.0).unwrap();

        assert!(c.hit().unwrap());
        assert!(!c.hit().unwrap());
        assert_eq!(c.state(), CharacterState::Hit);
        assert!(!hole.is_available());

        for _ in 0..300 {
            c.update(16.0).unwrap();
        }
        c.animation_complete(Animation::Hit).unwrap();
        for _ in 0..10 {
            c.update(16.0).unwrap();
            assert!(!c.hit().unwrap());
        }

        assert_eq!(rec.count(EventKind::MoleHit), 1);
        assert_eq!(rec.count(EventKind::MoleMiss), 0);
        assert!(hole.is_available());
        assert!(c.is_removed());
        assert!(!visual.played.borrow().contains(&Animation::Miss));
    }

    #[test]
    fn hit_while_raising_counts() {
        let bus = EventBus::new();
        let rec = Recorder::all(&bus);
        let (mut c, _hole, _visual) = attached(&bus, 2000.0);
        assert!(c.hit().unwrap());
        assert_eq!(rec.kinds(), vec![EventKind::MoleHit]);
    }

    #[test]
    fn hit_while_missing_is_ignored() {
        let bus = EventBus::new();
        let rec = Recorder::all(&bus);
        let (mut c, _hole, visual) = attached(&bus, 100.0);
        c.animation_complete(Animation::Raise).unwrap();
        c.update(150.0).unwrap();
        assert_eq!(c.state(), CharacterState::Missing);

        let plays_before = visual.played.borrow().len();
        assert!(!c.hit().unwrap());
        assert_eq!(c.state(), CharacterState::Missing);
        assert_eq!(visual.played.borrow().len(), plays_before);
        assert!(rec.kinds().is_empty());
    }

    #[test]
    fn hit_after_removal_is_ignored() {
        let bus = EventBus::new();
        let (mut c, _hole, _visual) = attached(&bus, 10.0);
        c.update(20.0).unwrap();
        c.animation_complete(Animation::Miss).unwrap();
        assert!(c.is_removed());

        let rec = Recorder::all(&bus);
        assert!(!c.hit().unwrap());
        assert_eq!(c.state(), CharacterState::Removed);
        assert!(rec.kinds().is_empty());
    }

    #[test]
    fn stale_completion_is_ignored() {
        let bus = EventBus::new();
        let (mut c, _hole, _visual) = attached(&bus, 2000.0);
        c.animation_complete(Animation::Hit).unwrap();
        c.animation_complete(Animation::Miss).unwrap();
        assert_eq!(c.state(), CharacterState::Raising);
    }

    #[test]
    fn timeout_during_raise_starts_missing() {
        let bus = EventBus::new();
        let (mut c, _hole, _visual) = attached(&bus, 50.0);
        c.update(60.0).unwrap();
        assert_eq!(c.state(), CharacterState::Missing);
        // The raise clip was interrupted; its late signal changes nothing.
        c.animation_complete(Animation::Raise).unwrap();
        assert_eq!(c.state(), CharacterState::Missing);
    }

    #[test]
    fn unattached_character_does_nothing() {
        let bus = EventBus::new();
        let rec = Recorder::all(&bus);
        let mut c = Character::mole(bus.clone(), 10.0);
        c.update(100.0).unwrap();
        assert!(!c.hit().unwrap());
        assert_eq!(c.state(), CharacterState::Created);
        assert!(rec.kinds().is_empty());
    }

    #[test]
    fn attach_before_create_is_missing_collaborator() {
        let bus = EventBus::new();
        let mut c = Character::mole(bus, 10.0);
        let hole = Rc::new(Hole::new(0, Position::default()));
        let err = c
            .attach_to_hole(Rc::clone(&hole), Position::default(), Box::new(ScriptedVisual::default()))
            .unwrap_err();
        assert!(matches!(err, GameError::MissingCollaborator(_)));
        assert!(hole.is_available());
    }

    #[test]
    fn unknown_character_assets_fail_create() {
        let bus = EventBus::new();
        let config = CharacterConfig {
            name: "rabbit".into(),
            events: CharacterEvents { miss: Event::MoleMiss, hit: Event::MoleHit },
        };
        let mut c = Character::new(bus, config, 1000.0);
        assert!(matches!(c.create(&default_assets()), Err(GameError::MissingCollaborator(_))));
    }

    #[test]
    fn double_attach_is_rejected() {
        let bus = EventBus::new();
        let (mut c, _hole, _visual) = attached(&bus, 2000.0);
        let other = Rc::new(Hole::new(8, Position::default()));
        let err = c
            .attach_to_hole(Rc::clone(&other), Position::default(), Box::new(ScriptedVisual::default()))
            .unwrap_err();
        assert!(matches!(err, GameError::AlreadyAttached(7)));
        assert!(other.is_available());
    }

    #[test]
    fn timed_visual_drives_full_miss_lifecycle() {
        let bus = EventBus::new();
        let rec = Recorder::all(&bus);
        let assets = default_assets();
        let mut c = Character::mole(bus.clone(), 2000.0);
        c.create(&assets).unwrap();
        let hole = Rc::new(Hole::new(3, Position::new(0, 0)));
        let visual = TimedVisual::new(c.assets().unwrap().clone());
        c.attach_to_hole(Rc::clone(&hole), Position::new(0, 0), Box::new(visual)).unwrap();

        let mut frames = 0;
        while !c.is_removed() && frames < 1000 {
            c.update(16.0).unwrap();
            frames += 1;
        }
        assert!(c.is_removed());
        assert_eq!(rec.kinds(), vec![EventKind::MoleMiss, EventKind::HoleAvailable]);
        assert!(hole.is_available());
    }
}
