/// Error taxonomy for the game core and the terminal front-end.
///
/// Repeated hit/miss transitions are not errors: the character guards them
/// with its alive flag and reports `false` instead.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    /// A transition needed its asset entry or visual and none was bound.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(String),

    #[error("character is already attached to hole {0}")]
    AlreadyAttached(usize),

    #[error("no hole with index {0}")]
    InvalidHole(usize),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type GameResult<T> = Result<T, GameError>;
