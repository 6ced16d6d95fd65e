//!
//! src/lib.rs  Andrew Belles  Oct 19th, 2026
//!
//! Builds a labeled dataset of track audio features by asking the
//! music service for tracks representative of each genre seed.
//! Shared by the genre-seeder and top-playlists binaries
//!

pub mod config;
pub mod errors;
pub mod logging;

pub mod extract;
pub mod fetch;
pub mod merge;
pub mod persistent;
pub mod playlists;
pub mod record;
pub mod seeder;
pub mod seeds;
pub mod service;
pub mod sink;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::SeederError;
