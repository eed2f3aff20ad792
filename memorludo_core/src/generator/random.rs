use super::*;

/// Seeded generator: draws distinct faces from the pool, pairs each one up
/// and applies a Fisher-Yates shuffle so every layout is equally likely.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RandomDeckGenerator {
    seed: u64,
}

impl RandomDeckGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl DeckGenerator for RandomDeckGenerator {
    fn generate(self, difficulty: Difficulty) -> Deck {
        use rand::prelude::*;

        let pair_count = difficulty.pair_count() as usize;
        let mut rng = SmallRng::seed_from_u64(self.seed);

        let mut pool: Vec<FaceId> = (0..FACE_POOL_SIZE).collect();
        pool.shuffle(&mut rng);
        pool.truncate(pair_count);

        let mut faces = Vec::with_capacity(pair_count * 2);
        faces.extend_from_slice(&pool);
        faces.extend_from_slice(&pool);
        faces.shuffle(&mut rng);

        Deck::from_faces(faces).expect("pool draws are always paired")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn every_grid_holds_each_face_exactly_twice() {
        for difficulty in Difficulty::ALL {
            let deck = RandomDeckGenerator::new(7).generate(difficulty);
            assert_eq!(deck.len(), difficulty.grid_size());

            let mut copies: HashMap<FaceId, u32> = HashMap::new();
            for card in deck.iter() {
                *copies.entry(card.face).or_default() += 1;
            }
            assert_eq!(copies.len(), difficulty.pair_count() as usize);
            assert!(copies.values().all(|&count| count == 2));
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_deck() {
        let first = RandomDeckGenerator::new(42).generate(Difficulty::Medium);
        let second = RandomDeckGenerator::new(42).generate(Difficulty::Medium);
        assert_eq!(first, second);
    }

    #[test]
    fn card_ids_follow_deck_positions() {
        let deck = RandomDeckGenerator::new(3).generate(Difficulty::Easy);
        for (index, card) in deck.iter().enumerate() {
            assert_eq!(card.id as usize, index);
            assert!(card.state().is_face_down());
        }
    }
}
