//!
//! src/seeds.rs  Andrew Belles  Oct 19th, 2026
//!
//! Genre seed catalog that drives the recommendation fetches
//!

use crate::errors::SeederError;

/// Default catalog, in fetch order. "trip-hop" and "trance" are valid
/// service seeds but left out
pub const GENRE_SEEDS: [&str; 17] = [
    "acoustic", "chill", "dance", "edm", "emo", "grunge", "happy", "hip-hop",
    "indie", "piano", "pop", "punk", "rock", "romance", "sad", "techno", "r-n-b"
];

pub fn default_catalog() -> Vec<String> {
    GENRE_SEEDS.iter().map(|s| s.to_string()).collect()
}

/// Parses a comma separated override (GENRE_SEEDS) keeping first occurrence order
pub fn parse_seed_list(raw: &str) -> Result<Vec<String>, SeederError> {
    let mut seeds: Vec<String> = Vec::new();
    for seed in raw.split(',') {
        let seed = seed.trim().to_ascii_lowercase();
        if seed.is_empty() || seeds.contains(&seed) {
            continue;
        }
        seeds.push(seed);
    }

    if seeds.is_empty() {
        return Err(SeederError::Config(
            format!("GENRE_SEEDS has no usable tags: {raw:?}")
        ));
    }
    Ok(seeds)
}
