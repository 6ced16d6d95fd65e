//!
//! src/service.rs  Andrew Belles  Oct 19th, 2026
//!
//! The queries the seeder and playlist tool issue against the
//! music metadata service. SpotifyClient is the production implementation
//!

use async_trait::async_trait;

use crate::errors::SeederError;
use crate::types::{ArtistMeta, AudioFeatures, Candidate, PlaylistSummary, TrackMeta};

#[async_trait]
pub trait MusicService: Send + Sync {
    /// Tracks recommended for a single genre seed, service decides the count
    async fn recommendations(&self, seed: &str) -> Result<Vec<Candidate>, SeederError>;

    async fn track(&self, track_id: &str) -> Result<TrackMeta, SeederError>;

    /// Ok(None) when the service has no analysis for the track
    async fn audio_features(&self, track_id: &str) ->
        Result<Option<AudioFeatures>, SeederError>;

    async fn artist(&self, artist_id: &str) -> Result<ArtistMeta, SeederError>;

    async fn user_playlists(&self, user_id: &str) ->
        Result<Vec<PlaylistSummary>, SeederError>;

    async fn playlist_followers(&self, playlist_id: &str) -> Result<u64, SeederError>;
}
