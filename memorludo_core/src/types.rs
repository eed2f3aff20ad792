/// Stable position of a card in the shuffled deck.
pub type CardId = u16;

/// Identifier of a face symbol within the fixed pool.
pub type FaceId = u8;

/// Count type used for matched and total pairs.
pub type PairCount = u16;

/// Whole seconds of session time.
pub type Seconds = u32;

/// Session token carried by deferred actions; bumped on every reset so
/// callbacks scheduled against an older session cannot touch the new one.
pub type Generation = u64;
