/// Events published on the game bus.
/// Every core component talks to the others only through these.

use std::cell::RefCell;
use std::fmt;

use crate::domain::character::Character;

/// Closed set of event kinds; subscriptions are keyed by these.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EventKind {
    CreateCharacter,
    HoleAvailable,
    MoleMiss,
    MoleHit,
    ScoreUpdate,
    LifeBarEmpty,
    IncreaseTime,
}

impl EventKind {
    #[cfg(test)]
    pub const ALL: [EventKind; 7] = [
        EventKind::CreateCharacter,
        EventKind::HoleAvailable,
        EventKind::MoleMiss,
        EventKind::MoleHit,
        EventKind::ScoreUpdate,
        EventKind::LifeBarEmpty,
        EventKind::IncreaseTime,
    ];
}

#[derive(Debug)]
pub enum Event {
    /// A freshly spawned character waiting for a hole.
    CreateCharacter(CharacterSpawn),
    HoleAvailable(usize),
    MoleMiss(usize),
    MoleHit(usize),
    /// New life target in [0, 1].
    ScoreUpdate(f32),
    LifeBarEmpty,
    IncreaseTime,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::CreateCharacter(_) => EventKind::CreateCharacter,
            Event::HoleAvailable(_) => EventKind::HoleAvailable,
            Event::MoleMiss(_) => EventKind::MoleMiss,
            Event::MoleHit(_) => EventKind::MoleHit,
            Event::ScoreUpdate(_) => EventKind::ScoreUpdate,
            Event::LifeBarEmpty => EventKind::LifeBarEmpty,
            Event::IncreaseTime => EventKind::IncreaseTime,
        }
    }
}

/// Carries a spawned character through the bus.
///
/// Subscribers only see `&Event`, so ownership is handed over by `take()`:
/// the first subscriber that claims the character gets it, later ones see
/// `None`.
pub struct CharacterSpawn(RefCell<Option<Character>>);

impl CharacterSpawn {
    pub fn new(character: Character) -> Self {
        CharacterSpawn(RefCell::new(Some(character)))
    }

    pub fn take(&self) -> Option<Character> {
        self.0.borrow_mut().take()
    }

    /// Visible duration of the carried character, if still unclaimed.
    #[cfg(test)]
    pub fn duration_ms(&self) -> Option<f64> {
        self.0.borrow().as_ref().map(|c| c.remaining_ms())
    }
}

impl fmt::Debug for CharacterSpawn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(slot) => match slot.as_ref() {
                Some(c) => write!(f, "CharacterSpawn({})", c.name()),
                None => write!(f, "CharacterSpawn(<claimed>)"),
            },
            Err(_) => write!(f, "CharacterSpawn(<busy>)"),
        }
    }
}
