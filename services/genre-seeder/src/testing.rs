//!
//! src/testing.rs  Andrew Belles  Oct 19th, 2026
//!
//! In-memory MusicService and row fixtures shared by the unit tests
//!

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::errors::SeederError;
use crate::record::{GenreSet, Mode, PitchClass, TrackFeatureRecord};
use crate::service::MusicService;
use crate::types::{
    AlbumMeta, ArtistMeta, ArtistRef, AudioFeatures, Candidate, Followers, Image,
    PlaylistSummary, TrackCount, TrackMeta
};

pub(crate) fn track_meta(track_id: &str, artist_id: &str) -> TrackMeta {
    TrackMeta {
        id: track_id.to_string(),
        name: format!("song {track_id}"),
        album: AlbumMeta {
            name: format!("album {track_id}"),
            release_date: "2020-02-14".to_string(),
            artists: vec![ArtistRef {
                id: Some(artist_id.to_string()),
                name: format!("artist {artist_id}")
            }]
        },
        duration_ms: 215_000,
        popularity: 64
    }
}

pub(crate) fn audio_features(danceability: f64) -> AudioFeatures {
    AudioFeatures {
        acousticness: 0.125,
        danceability,
        energy: 0.75,
        instrumentalness: 0.0,
        liveness: 0.5,
        loudness: -5.5,
        speechiness: 0.0625,
        tempo: 120.0,
        valence: 0.375,
        key: 5,
        mode: 1,
        time_signature: 4
    }
}

pub(crate) fn artist_meta(artist_id: &str) -> ArtistMeta {
    ArtistMeta {
        id: artist_id.to_string(),
        popularity: 80,
        genres: vec!["dance pop".to_string(), "pop".to_string()],
        followers: Followers { total: 1_234_567 }
    }
}

/// A complete row, as the extractor would produce it
pub(crate) fn record(track_id: &str, genre: &str) -> TrackFeatureRecord {
    TrackFeatureRecord {
        name: format!("song {track_id}"),
        track_id: track_id.to_string(),
        album: format!("album {track_id}"),
        artist: "artist".to_string(),
        artist_id: "artist-id".to_string(),
        release_date: "2020-02-14".to_string(),
        length: 215_000,
        popularity: 64,
        artist_pop: 80,
        artist_genres: GenreSet::from(vec!["dance pop".to_string(), "pop".to_string()]),
        artist_followers: 1_234_567,
        acousticness: 0.125,
        danceability: 0.5,
        energy: 0.75,
        instrumentalness: 0.0,
        liveness: 0.5,
        loudness: -5.5,
        speechiness: 0.0625,
        tempo: 120.0,
        valence: 0.375,
        key: PitchClass::from_service(5),
        mode: Mode::Major,
        time_signature: 4,
        genre: genre.to_string()
    }
}

#[derive(Default)]
pub(crate) struct FakeService {
    recommendations: HashMap<String, Vec<Candidate>>,
    tracks: HashMap<String, TrackMeta>,
    features: HashMap<String, AudioFeatures>,
    artists: HashMap<String, ArtistMeta>,
    failing_seeds: HashSet<String>,
    panicking_seeds: HashSet<String>,
    failing_tracks: HashSet<String>,
    playlists: Vec<PlaylistSummary>,
    followers: HashMap<String, u64>,
    recommendation_calls: AtomicUsize,
    lookup_calls: AtomicUsize
}

impl FakeService {
    /// Adds track to seed's recommendations, with audio features only when
    /// has_features is set
    pub(crate) fn with_track(
        mut self,
        seed: &str,
        track_id: &str,
        artist_id: &str,
        has_features: bool
    ) -> Self {
        self.recommendations.entry(seed.to_string()).or_default().push(Candidate {
            track_id: track_id.to_string(),
            artist_id: artist_id.to_string()
        });
        self.tracks.insert(track_id.to_string(), track_meta(track_id, artist_id));
        self.artists.insert(artist_id.to_string(), artist_meta(artist_id));
        if has_features {
            self.features.insert(track_id.to_string(), audio_features(0.5));
        }
        self
    }

    pub(crate) fn with_empty_seed(mut self, seed: &str) -> Self {
        self.recommendations.entry(seed.to_string()).or_default();
        self
    }

    pub(crate) fn failing_seed(mut self, seed: &str) -> Self {
        self.failing_seeds.insert(seed.to_string());
        self
    }

    pub(crate) fn panicking_seed(mut self, seed: &str) -> Self {
        self.panicking_seeds.insert(seed.to_string());
        self
    }

    pub(crate) fn failing_track(mut self, track_id: &str) -> Self {
        self.failing_tracks.insert(track_id.to_string());
        self
    }

    pub(crate) fn with_playlist(mut self, id: &str, tracks: u32, followers: u64) -> Self {
        self.playlists.push(PlaylistSummary {
            id: id.to_string(),
            name: format!("playlist {id}"),
            description: Some(format!("about {id}")),
            images: Some(vec![Image { url: format!("https://i.scdn.co/{id}") }]),
            tracks: TrackCount { total: tracks }
        });
        self.followers.insert(id.to_string(), followers);
        self
    }

    pub(crate) fn recommendation_calls(&self) -> usize {
        self.recommendation_calls.load(Ordering::SeqCst)
    }

    /// Track, audio feature and artist lookups combined
    pub(crate) fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MusicService for FakeService {
    async fn recommendations(&self, seed: &str) -> Result<Vec<Candidate>, SeederError> {
        self.recommendation_calls.fetch_add(1, Ordering::SeqCst);
        if self.panicking_seeds.contains(seed) {
            panic!("recommendations for {seed} blew up");
        }
        if self.failing_seeds.contains(seed) {
            return Err(SeederError::Status { status: 503, url: format!("fake://recommendations/{seed}") });
        }
        self.recommendations.get(seed)
            .cloned()
            .ok_or_else(|| SeederError::NotFound(format!("no such seed {seed}")))
    }

    async fn track(&self, track_id: &str) -> Result<TrackMeta, SeederError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_tracks.contains(track_id) {
            return Err(SeederError::Http(format!("connection reset fetching {track_id}")));
        }
        self.tracks.get(track_id)
            .cloned()
            .ok_or_else(|| SeederError::NotFound(format!("track {track_id}")))
    }

    async fn audio_features(&self, track_id: &str) ->
        Result<Option<AudioFeatures>, SeederError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.features.get(track_id).cloned())
    }

    async fn artist(&self, artist_id: &str) -> Result<ArtistMeta, SeederError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.artists.get(artist_id)
            .cloned()
            .ok_or_else(|| SeederError::NotFound(format!("artist {artist_id}")))
    }

    async fn user_playlists(&self, _user_id: &str) ->
        Result<Vec<PlaylistSummary>, SeederError> {
        Ok(self.playlists.clone())
    }

    async fn playlist_followers(&self, playlist_id: &str) -> Result<u64, SeederError> {
        self.followers.get(playlist_id)
            .copied()
            .ok_or_else(|| SeederError::NotFound(format!("playlist {playlist_id}")))
    }
}
