use memorludo_core::{FaceId, FACE_POOL_SIZE};

/// One glyph per face in the generator's pool. Entries are distinct so no
/// two pairs look alike, and there are enough for the 32 pairs the largest
/// grid needs.
pub(crate) const GLYPHS: [&str; FACE_POOL_SIZE as usize] = [
    "🎮", "🎲", "🎯", "🎪", "🎭", "🎨", "🎬", "🎤", "🎧", "🎵", "🎹", "🎸",
    "🎺", "🎻", "🎱", "🎳", "🎫", "🎟️", "🃏", "🀄", "🕹️", "🎰", "🧩", "🪀",
    "🪁", "🛹", "🏓", "🏆", "⚽", "🏀", "🏈", "⚾", "🎾", "🏐", "🥁", "🪕",
];

pub(crate) fn glyph(face: FaceId) -> &'static str {
    GLYPHS[face as usize]
}
