use core::ops::Index;
use serde::{Deserialize, Serialize};

pub use card::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use leaderboard::*;
pub use types::*;

mod card;
mod engine;
mod error;
mod generator;
mod leaderboard;
mod types;

/// Number of distinct faces the deck generator can draw from.
pub const FACE_POOL_SIZE: FaceId = 36;

// the largest grid needs one distinct face per pair
const _: () = assert!(Difficulty::Hard.pair_count() as usize <= FACE_POOL_SIZE as usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub const fn grid_size(self) -> CardId {
        match self {
            Self::Easy => 16,
            Self::Medium => 36,
            Self::Hard => 64,
        }
    }

    pub const fn pair_count(self) -> PairCount {
        (self.grid_size() / 2) as PairCount
    }

    /// 0 means the session has no time limit.
    pub const fn time_limit_secs(self) -> Seconds {
        match self {
            Self::Easy => 0,
            Self::Medium => 90,
            Self::Hard => 60,
        }
    }

    pub const fn columns(self) -> CardId {
        match self {
            Self::Easy => 4,
            Self::Medium => 6,
            Self::Hard => 8,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Easy
    }
}

/// Shuffled card layout for one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Builds a deck from an already-shuffled face sequence, validating that
    /// every face appears on exactly two cards.
    pub fn from_faces(faces: Vec<FaceId>) -> Result<Self> {
        if faces.is_empty() || faces.len() % 2 != 0 {
            return Err(GameError::UnpairedFaces);
        }

        let mut copies = [0u16; 256];
        for &face in &faces {
            copies[face as usize] += 1;
        }
        if copies.iter().any(|&count| count != 0 && count != 2) {
            return Err(GameError::UnpairedFaces);
        }

        let cards = faces
            .into_iter()
            .enumerate()
            .map(|(id, face)| Card::new(id as CardId, face))
            .collect();
        Ok(Self { cards })
    }

    pub fn len(&self) -> CardId {
        self.cards.len() as CardId
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn pair_count(&self) -> PairCount {
        (self.cards.len() / 2) as PairCount
    }

    pub fn validate_id(&self, id: CardId) -> Result<CardId> {
        if (id as usize) < self.cards.len() {
            Ok(id)
        } else {
            Err(GameError::InvalidCard)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub(crate) fn set_state(&mut self, id: CardId, state: CardState) {
        self.cards[id as usize].state = state;
    }
}

impl Index<CardId> for Deck {
    type Output = Card;

    fn index(&self, id: CardId) -> &Self::Output {
        &self.cards[id as usize]
    }
}

/// Outcome of flipping a card.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FlipOutcome {
    NoChange,
    Revealed,
    Matched,
    /// Both cards stay face up until the deferred revert fires.
    Mismatched(Deferred),
    Won,
}

impl FlipOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Revealed => true,
            Self::Matched => true,
            Self::Mismatched(_) => true,
            Self::Won => true,
        }
    }
}

/// Outcome of consuming a hint.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HintOutcome {
    NoChange,
    /// A hint was consumed but fewer than two cards remained face down.
    Spent,
    Exposed(Deferred),
}

impl HintOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Spent => true,
            Self::Exposed(_) => true,
        }
    }
}

/// Outcome of advancing the session clock by one second.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TickOutcome {
    NoChange,
    Advanced,
    TimedOut,
}

impl TickOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Advanced => true,
            Self::TimedOut => true,
        }
    }
}

/// Outcome of applying a deferred revert.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevertOutcome {
    NoChange,
    Reverted,
}

impl RevertOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Reverted => true,
        }
    }
}
