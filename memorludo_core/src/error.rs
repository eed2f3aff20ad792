use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid card id")]
    InvalidCard,
    #[error("Every face must appear on exactly two cards")]
    UnpairedFaces,
    #[error("Deck size does not match the selected difficulty")]
    DeckSizeMismatch,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

pub type Result<T> = core::result::Result<T, GameError>;
