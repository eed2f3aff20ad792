use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

const MATCH_POINTS: i32 = 10;
const MISMATCH_PENALTY: i32 = 5;
const HINTS_PER_SESSION: u8 = 3;

/// Valid transitions:
/// - Idle -> Running
/// - Running -> Won
/// - Running -> Lost
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionState {
    /// Deck built, clock not counting
    Idle,
    /// First flip happened
    Running,
    /// All pairs matched
    Won,
    /// Time limit reached
    Lost,
}

impl SessionState {
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Counters for the running session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub moves: u32,
    pub score: i32,
    pub matched_pairs: PairCount,
    pub hints_remaining: u8,
    pub elapsed_secs: Seconds,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            moves: 0,
            score: 0,
            matched_pairs: 0,
            hints_remaining: HINTS_PER_SESSION,
            elapsed_secs: 0,
        }
    }
}

/// Work the presentation layer schedules and hands back through
/// [`PlayEngine::apply_deferred`] once its delay elapses.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DeferredAction {
    RevertMismatch { first: CardId, second: CardId },
    RevertHintExposure { first: CardId, second: CardId },
}

/// A deferred action stamped with the session it belongs to. Applying it
/// against a later generation is a no-op, so restarts invalidate every
/// callback still sitting in a timer queue.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deferred {
    pub action: DeferredAction,
    pub generation: Generation,
}

/// Session state machine: flip selection, match resolution, scoring, hint
/// budget and the tick-driven countdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayEngine {
    deck: Deck,
    difficulty: Difficulty,
    selection: SmallVec<[CardId; 2]>,
    hint_exposed: Option<(CardId, CardId)>,
    stats: SessionStats,
    state: SessionState,
    generation: Generation,
}

impl PlayEngine {
    pub fn new(difficulty: Difficulty, deck: Deck) -> Result<Self> {
        if deck.len() != difficulty.grid_size() {
            return Err(GameError::DeckSizeMismatch);
        }
        Ok(Self {
            deck,
            difficulty,
            selection: SmallVec::new(),
            hint_exposed: None,
            stats: SessionStats::default(),
            state: SessionState::default(),
            generation: 0,
        })
    }

    /// Discards the running session and starts a fresh one on the given
    /// deck. Bumping the generation turns every still-scheduled deferred
    /// action into a no-op.
    pub fn reset(&mut self, difficulty: Difficulty, deck: Deck) -> Result<()> {
        if deck.len() != difficulty.grid_size() {
            return Err(GameError::DeckSizeMismatch);
        }
        self.deck = deck;
        self.difficulty = difficulty;
        self.selection.clear();
        self.hint_exposed = None;
        self.stats = SessionStats::default();
        self.state = SessionState::default();
        self.generation += 1;
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn score(&self) -> i32 {
        self.stats.score
    }

    pub fn moves(&self) -> u32 {
        self.stats.moves
    }

    pub fn matched_pairs(&self) -> PairCount {
        self.stats.matched_pairs
    }

    pub fn hints_remaining(&self) -> u8 {
        self.stats.hints_remaining
    }

    pub fn elapsed_secs(&self) -> Seconds {
        self.stats.elapsed_secs
    }

    pub fn pair_count(&self) -> PairCount {
        self.deck.pair_count()
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.deck.iter()
    }

    pub fn card_state(&self, card_id: CardId) -> Result<CardState> {
        Ok(self.deck[self.deck.validate_id(card_id)?].state())
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    pub fn flip(&mut self, card_id: CardId) -> Result<FlipOutcome> {
        let card_id = self.deck.validate_id(card_id)?;
        self.check_not_finished()?;
        // the clock starts on the very first flip attempt, even one that
        // ends up rejected
        self.mark_started();

        if self.selection.len() == 2 || !self.deck[card_id].state().is_face_down() {
            return Ok(FlipOutcome::NoChange);
        }

        self.deck.set_state(card_id, CardState::Revealed);
        self.selection.push(card_id);

        if self.selection.len() < 2 {
            return Ok(FlipOutcome::Revealed);
        }

        self.stats.moves += 1;
        let (first, second) = (self.selection[0], self.selection[1]);
        if self.deck[first].face == self.deck[second].face {
            Ok(self.resolve_match(first, second))
        } else {
            // the penalty lands immediately; the flip-back waits for the
            // deferred revert so the player can see both faces
            self.stats.score -= MISMATCH_PENALTY;
            Ok(FlipOutcome::Mismatched(
                self.deferred(DeferredAction::RevertMismatch { first, second }),
            ))
        }
    }

    fn resolve_match(&mut self, first: CardId, second: CardId) -> FlipOutcome {
        self.deck.set_state(first, CardState::Matched);
        self.deck.set_state(second, CardState::Matched);
        self.stats.matched_pairs += 1;
        self.stats.score += MATCH_POINTS;
        self.selection.clear();

        if self.stats.matched_pairs == self.deck.pair_count() {
            self.end_game(true);
            FlipOutcome::Won
        } else {
            FlipOutcome::Matched
        }
    }

    pub fn use_hint(&mut self) -> Result<HintOutcome> {
        self.check_not_finished()?;

        if self.stats.hints_remaining == 0 {
            return Ok(HintOutcome::NoChange);
        }
        self.stats.hints_remaining -= 1;

        let candidates: Vec<CardId> = self
            .deck
            .iter()
            .filter(|card| card.state().is_face_down())
            .map(|card| card.id)
            .collect();
        if candidates.len() < 2 {
            return Ok(HintOutcome::Spent);
        }

        let (first, second) = self.find_matching_pair(&candidates);
        self.deck.set_state(first, CardState::Revealed);
        self.deck.set_state(second, CardState::Revealed);
        self.hint_exposed = Some((first, second));

        Ok(HintOutcome::Exposed(
            self.deferred(DeferredAction::RevertHintExposure { first, second }),
        ))
    }

    /// First candidate pair sharing a face, scanning in index order. Faces
    /// always come in twos while their cards are face down, so the fallback
    /// pair is defensive only.
    fn find_matching_pair(&self, candidates: &[CardId]) -> (CardId, CardId) {
        for (offset, &first) in candidates.iter().enumerate() {
            for &second in &candidates[offset + 1..] {
                if self.deck[first].face == self.deck[second].face {
                    return (first, second);
                }
            }
        }
        (candidates[0], candidates[1])
    }

    /// Advances the session clock by one second. Only a running session
    /// counts time; the presentation layer calls this from its interval
    /// timer.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != SessionState::Running {
            return TickOutcome::NoChange;
        }

        self.stats.elapsed_secs += 1;
        let limit = self.difficulty.time_limit_secs();
        if limit > 0 && self.stats.elapsed_secs >= limit {
            self.end_game(false);
            TickOutcome::TimedOut
        } else {
            TickOutcome::Advanced
        }
    }

    pub fn apply_deferred(&mut self, deferred: Deferred) -> RevertOutcome {
        if deferred.generation != self.generation {
            log::debug!("ignoring deferred action from a stale session: {:?}", deferred);
            return RevertOutcome::NoChange;
        }

        match deferred.action {
            DeferredAction::RevertMismatch { first, second } => {
                let mut changed = false;
                for id in [first, second] {
                    if self.deck[id].state() == CardState::Revealed {
                        self.deck.set_state(id, CardState::FaceDown);
                        changed = true;
                    }
                }
                self.selection.clear();
                if changed {
                    RevertOutcome::Reverted
                } else {
                    RevertOutcome::NoChange
                }
            }
            DeferredAction::RevertHintExposure { first, second } => {
                let mut changed = false;
                for id in [first, second] {
                    if self.deck[id].state() == CardState::Revealed && !self.selection.contains(&id)
                    {
                        self.deck.set_state(id, CardState::FaceDown);
                        changed = true;
                    }
                }
                if self.hint_exposed == Some((first, second)) {
                    self.hint_exposed = None;
                }
                if changed {
                    RevertOutcome::Reverted
                } else {
                    RevertOutcome::NoChange
                }
            }
        }
    }

    /// Deferred actions that are logically outstanding. Used to reschedule
    /// timers after the session is restored from storage, so a reload
    /// mid-resolution cannot leave the board wedged.
    pub fn pending_deferred(&self) -> SmallVec<[Deferred; 2]> {
        let mut pending = SmallVec::new();
        if let [first, second] = self.selection[..] {
            pending.push(self.deferred(DeferredAction::RevertMismatch { first, second }));
        }
        if let Some((first, second)) = self.hint_exposed {
            pending.push(self.deferred(DeferredAction::RevertHintExposure { first, second }));
        }
        pending
    }

    fn deferred(&self, action: DeferredAction) -> Deferred {
        Deferred {
            action,
            generation: self.generation,
        }
    }

    fn mark_started(&mut self) {
        if self.state.is_idle() {
            self.state = SessionState::Running;
        }
    }

    fn end_game(&mut self, won: bool) {
        if self.state.is_finished() {
            return;
        }
        self.state = if won {
            SessionState::Won
        } else {
            SessionState::Lost
        };
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deck laid out as 0 0 1 1 2 2 ..: card 2n and 2n+1 share face n.
    fn sequential_deck(pairs: FaceId) -> Deck {
        let faces = (0..pairs).flat_map(|face| [face, face]).collect();
        Deck::from_faces(faces).unwrap()
    }

    fn easy_engine() -> PlayEngine {
        PlayEngine::new(Difficulty::Easy, sequential_deck(8)).unwrap()
    }

    fn hard_engine() -> PlayEngine {
        PlayEngine::new(Difficulty::Hard, sequential_deck(32)).unwrap()
    }

    #[test]
    fn deck_must_match_the_difficulty_grid() {
        assert_eq!(
            PlayEngine::new(Difficulty::Easy, sequential_deck(4)),
            Err(GameError::DeckSizeMismatch)
        );
    }

    #[test]
    fn first_flip_starts_the_session() {
        let mut engine = easy_engine();
        assert!(engine.state().is_idle());

        assert_eq!(engine.flip(0), Ok(FlipOutcome::Revealed));

        assert_eq!(engine.state(), SessionState::Running);
        assert_eq!(engine.card_state(0), Ok(CardState::Revealed));
        assert_eq!(engine.moves(), 0);
        assert_eq!(engine.selection_len(), 1);
    }

    #[test]
    fn matching_pair_scores_and_clears_the_selection() {
        let mut engine = easy_engine();

        engine.flip(0).unwrap();
        assert_eq!(engine.flip(1), Ok(FlipOutcome::Matched));

        assert_eq!(engine.card_state(0), Ok(CardState::Matched));
        assert_eq!(engine.card_state(1), Ok(CardState::Matched));
        assert_eq!(engine.score(), 10);
        assert_eq!(engine.moves(), 1);
        assert_eq!(engine.matched_pairs(), 1);
        assert_eq!(engine.selection_len(), 0);
    }

    #[test]
    fn mismatch_penalizes_and_blocks_flips_until_the_revert() {
        let mut engine = easy_engine();

        engine.flip(0).unwrap();
        let outcome = engine.flip(2).unwrap();
        let deferred = match outcome {
            FlipOutcome::Mismatched(deferred) => deferred,
            other => panic!("expected a mismatch, got {:?}", other),
        };

        assert_eq!(engine.score(), -5);
        assert_eq!(engine.moves(), 1);
        assert_eq!(engine.card_state(0), Ok(CardState::Revealed));
        assert_eq!(engine.card_state(2), Ok(CardState::Revealed));

        // third flips are rejected while both cards are still up
        assert_eq!(engine.flip(4), Ok(FlipOutcome::NoChange));
        assert_eq!(engine.card_state(4), Ok(CardState::FaceDown));
        assert_eq!(engine.moves(), 1);

        assert_eq!(engine.apply_deferred(deferred), RevertOutcome::Reverted);
        assert_eq!(engine.card_state(0), Ok(CardState::FaceDown));
        assert_eq!(engine.card_state(2), Ok(CardState::FaceDown));
        assert_eq!(engine.selection_len(), 0);

        // and the board accepts flips again
        assert_eq!(engine.flip(4), Ok(FlipOutcome::Revealed));
    }

    #[test]
    fn flips_on_revealed_and_matched_cards_change_nothing() {
        let mut engine = easy_engine();

        engine.flip(0).unwrap();
        assert_eq!(engine.flip(0), Ok(FlipOutcome::NoChange));
        assert_eq!(engine.selection_len(), 1);
        assert_eq!(engine.moves(), 0);

        engine.flip(1).unwrap();
        assert_eq!(engine.flip(0), Ok(FlipOutcome::NoChange));
        assert_eq!(engine.moves(), 1);
    }

    #[test]
    fn perfect_game_wins_with_ten_points_per_pair() {
        let mut engine = easy_engine();

        for pair in 0..7u16 {
            assert_eq!(engine.flip(pair * 2), Ok(FlipOutcome::Revealed));
            assert_eq!(engine.flip(pair * 2 + 1), Ok(FlipOutcome::Matched));
        }
        engine.flip(14).unwrap();
        assert_eq!(engine.flip(15), Ok(FlipOutcome::Won));

        assert_eq!(engine.state(), SessionState::Won);
        assert_eq!(engine.score(), 80);
        assert_eq!(engine.moves(), 8);

        // terminal: no further commands are accepted
        assert_eq!(engine.flip(0), Err(GameError::AlreadyEnded));
        assert_eq!(engine.use_hint(), Err(GameError::AlreadyEnded));
        assert_eq!(engine.tick(), TickOutcome::NoChange);
    }

    #[test]
    fn score_tracks_matches_and_mismatches_and_can_go_negative() {
        let mut engine = easy_engine();

        engine.flip(0).unwrap();
        let FlipOutcome::Mismatched(first_revert) = engine.flip(2).unwrap() else {
            panic!("expected a mismatch");
        };
        engine.apply_deferred(first_revert);

        engine.flip(4).unwrap();
        let FlipOutcome::Mismatched(second_revert) = engine.flip(6).unwrap() else {
            panic!("expected a mismatch");
        };
        engine.apply_deferred(second_revert);

        assert_eq!(engine.score(), -10);

        engine.flip(0).unwrap();
        engine.flip(1).unwrap();
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn tick_counts_only_while_running() {
        let mut engine = easy_engine();

        assert_eq!(engine.tick(), TickOutcome::NoChange);
        assert_eq!(engine.elapsed_secs(), 0);

        engine.flip(0).unwrap();
        assert_eq!(engine.tick(), TickOutcome::Advanced);
        assert_eq!(engine.elapsed_secs(), 1);
    }

    #[test]
    fn easy_mode_never_times_out() {
        let mut engine = easy_engine();
        engine.flip(0).unwrap();

        for _ in 0..600 {
            assert_eq!(engine.tick(), TickOutcome::Advanced);
        }
        assert_eq!(engine.state(), SessionState::Running);
    }

    #[test]
    fn reaching_the_time_limit_loses_the_session() {
        let mut engine = hard_engine();
        engine.flip(0).unwrap();

        for _ in 0..59 {
            assert_eq!(engine.tick(), TickOutcome::Advanced);
        }
        assert_eq!(engine.tick(), TickOutcome::TimedOut);

        assert_eq!(engine.state(), SessionState::Lost);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.elapsed_secs(), 60);

        // losing is terminal too, and only once
        assert_eq!(engine.tick(), TickOutcome::NoChange);
        assert_eq!(engine.elapsed_secs(), 60);
        assert_eq!(engine.flip(1), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn hint_exposes_a_real_pair_without_touching_the_selection() {
        let mut engine = easy_engine();

        let HintOutcome::Exposed(deferred) = engine.use_hint().unwrap() else {
            panic!("expected an exposed pair");
        };
        let Deferred {
            action: DeferredAction::RevertHintExposure { first, second },
            ..
        } = deferred
        else {
            panic!("expected a hint revert");
        };

        assert_eq!(engine.hints_remaining(), 2);
        assert_eq!(engine.deck[first].face, engine.deck[second].face);
        assert_eq!(engine.card_state(first), Ok(CardState::Revealed));
        assert_eq!(engine.card_state(second), Ok(CardState::Revealed));
        assert_eq!(engine.selection_len(), 0);
        assert_eq!(engine.moves(), 0);
        assert_eq!(engine.score(), 0);
        // exposure does not start the clock
        assert_eq!(engine.tick(), TickOutcome::NoChange);

        // exposed cards reject flips until the revert
        assert_eq!(engine.flip(first), Ok(FlipOutcome::NoChange));

        assert_eq!(engine.apply_deferred(deferred), RevertOutcome::Reverted);
        assert_eq!(engine.card_state(first), Ok(CardState::FaceDown));
        assert_eq!(engine.card_state(second), Ok(CardState::FaceDown));
    }

    #[test]
    fn hint_skips_cards_mid_resolution() {
        let mut engine = easy_engine();

        engine.flip(0).unwrap();
        engine.flip(2).unwrap();

        let HintOutcome::Exposed(deferred) = engine.use_hint().unwrap() else {
            panic!("expected an exposed pair");
        };
        let Deferred {
            action: DeferredAction::RevertHintExposure { first, second },
            ..
        } = deferred
        else {
            panic!("expected a hint revert");
        };

        assert!(first != 0 && first != 2);
        assert!(second != 0 && second != 2);
        assert_eq!(engine.deck[first].face, engine.deck[second].face);
    }

    #[test]
    fn hint_budget_runs_out_after_three_uses() {
        let mut engine = easy_engine();

        for expected_left in [2, 1, 0] {
            let outcome = engine.use_hint().unwrap();
            assert!(matches!(outcome, HintOutcome::Exposed(_)));
            assert_eq!(engine.hints_remaining(), expected_left);
            let HintOutcome::Exposed(deferred) = outcome else {
                unreachable!()
            };
            engine.apply_deferred(deferred);
        }

        assert_eq!(engine.use_hint(), Ok(HintOutcome::NoChange));
        assert_eq!(engine.hints_remaining(), 0);
    }

    #[test]
    fn hint_with_one_card_left_is_spent_without_exposure() {
        let mut engine = easy_engine();

        for pair in 0..7u16 {
            engine.flip(pair * 2).unwrap();
            engine.flip(pair * 2 + 1).unwrap();
        }
        engine.flip(14).unwrap();

        // one face-down card remains, nothing can be shown
        assert_eq!(engine.use_hint(), Ok(HintOutcome::Spent));
        assert_eq!(engine.hints_remaining(), 2);
        assert_eq!(engine.card_state(15), Ok(CardState::FaceDown));
    }

    #[test]
    fn hint_falls_back_to_the_first_two_candidates() {
        let mut engine = easy_engine();

        // match six pairs, then cross-flip the last two so the only
        // face-down cards are one half of each remaining pair
        for pair in 0..6u16 {
            engine.flip(pair * 2).unwrap();
            engine.flip(pair * 2 + 1).unwrap();
        }
        engine.flip(12).unwrap();
        engine.flip(14).unwrap();

        let HintOutcome::Exposed(deferred) = engine.use_hint().unwrap() else {
            panic!("expected an exposed pair");
        };
        let Deferred {
            action: DeferredAction::RevertHintExposure { first, second },
            ..
        } = deferred
        else {
            panic!("expected a hint revert");
        };
        assert_eq!((first, second), (13, 15));
    }

    #[test]
    fn reset_invalidates_stale_deferred_actions() {
        let mut engine = easy_engine();

        engine.flip(0).unwrap();
        let FlipOutcome::Mismatched(stale) = engine.flip(2).unwrap() else {
            panic!("expected a mismatch");
        };

        engine
            .reset(Difficulty::Easy, sequential_deck(8))
            .unwrap();
        assert!(engine.state().is_idle());
        assert_eq!(engine.stats(), &SessionStats::default());

        // flips from the new session, then the old revert fires late
        engine.flip(0).unwrap();
        assert_eq!(engine.apply_deferred(stale), RevertOutcome::NoChange);
        assert_eq!(engine.card_state(0), Ok(CardState::Revealed));
        assert_eq!(engine.selection_len(), 1);
    }

    #[test]
    fn pending_deferred_lists_outstanding_reverts() {
        let mut engine = easy_engine();
        assert!(engine.pending_deferred().is_empty());

        engine.flip(0).unwrap();
        engine.flip(2).unwrap();
        engine.use_hint().unwrap();

        let pending = engine.pending_deferred();
        assert_eq!(pending.len(), 2);
        assert!(matches!(
            pending[0].action,
            DeferredAction::RevertMismatch { first: 0, second: 2 }
        ));
        assert!(matches!(
            pending[1].action,
            DeferredAction::RevertHintExposure { .. }
        ));

        // applying them drains the list
        for deferred in pending {
            engine.apply_deferred(deferred);
        }
        assert!(engine.pending_deferred().is_empty());
    }

    #[test]
    fn session_round_trips_through_serde() {
        let mut engine = easy_engine();
        engine.flip(0).unwrap();
        engine.flip(2).unwrap();
        engine.use_hint().unwrap();
        engine.tick();

        let stored = serde_json::to_string(&engine).unwrap();
        let restored: PlayEngine = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored, engine);
    }

    #[test]
    fn out_of_range_card_id_is_an_error() {
        let mut engine = easy_engine();
        assert_eq!(engine.flip(16), Err(GameError::InvalidCard));
        assert!(engine.state().is_idle());
    }
}
