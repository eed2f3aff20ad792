use serde::{Deserialize, Serialize};

use crate::types::{CardId, FaceId};

/// Resolution state of a single card.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CardState {
    FaceDown,
    Revealed,
    Matched,
}

impl CardState {
    /// Only face-down cards accept a flip.
    pub const fn is_face_down(self) -> bool {
        matches!(self, Self::FaceDown)
    }

    pub const fn is_matched(self) -> bool {
        matches!(self, Self::Matched)
    }
}

impl Default for CardState {
    fn default() -> Self {
        Self::FaceDown
    }
}

/// One card of the deck. The face never changes after the shuffle; the state
/// is mutated only by the engine.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub face: FaceId,
    pub(crate) state: CardState,
}

impl Card {
    pub(crate) fn new(id: CardId, face: FaceId) -> Self {
        Self {
            id,
            face,
            state: CardState::default(),
        }
    }

    pub const fn state(&self) -> CardState {
        self.state
    }
}
