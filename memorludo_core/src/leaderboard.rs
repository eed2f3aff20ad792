use serde::{Deserialize, Serialize};

use crate::{Difficulty, Seconds};

/// One row of the local top-ten table. Field names are the storage format.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: i32,
    pub time: Seconds,
    pub difficulty: Difficulty,
}

/// Local high-score table, best first. Ties keep their insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    pub const MAX_ENTRIES: usize = 10;

    pub fn record(&mut self, entry: ScoreEntry) {
        self.entries.push(entry);
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(Self::MAX_ENTRIES);
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
