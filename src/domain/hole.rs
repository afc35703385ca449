/// Hole: a fixed garden slot a character occupies while alive.
///
/// Holes are shared (`Rc<Hole>`) between the garden and the occupying
/// character, which frees the slot when it leaves. Availability is a `Cell`
/// so both sides can flip it without a mutable borrow.

use std::cell::Cell;

/// A point on the garden: terminal cells for hole centers, (col, row) for
/// a character's slot.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

impl Position {
    pub fn new(x: u16, y: u16) -> Self {
        Position { x, y }
    }
}

#[derive(Debug)]
pub struct Hole {
    id: usize,
    center: Position,
    available: Cell<bool>,
}

impl Hole {
    pub fn new(id: usize, center: Position) -> Self {
        Hole { id, center, available: Cell::new(true) }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn center(&self) -> Position {
        self.center
    }

    pub fn is_available(&self) -> bool {
        self.available.get()
    }

    pub fn occupy(&self) {
        self.available.set(false);
    }

    pub fn set_available(&self) {
        self.available.set(true);
    }
}
