use serde::{Deserialize, Serialize};

// Recommendation entry, only the ids are needed downstream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub track_id: String,
    pub artist_id: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: Option<String>,     // null for local files
    pub name: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumMeta {
    pub name: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>
}

/// GET /v1/tracks/{id}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMeta {
    pub id: String,
    pub name: String,
    pub album: AlbumMeta,
    pub duration_ms: u64,
    #[serde(default)]
    pub popularity: u32
}

/// GET /v1/audio-features, one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub valence: f64,
    pub key: i32,               // -1 when no key was detected
    pub mode: i32,
    pub time_signature: u8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Followers {
    #[serde(default)]
    pub total: u64
}

/// GET /v1/artists/{id}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistMeta {
    pub id: String,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub genres: Vec<String>,
    pub followers: Followers
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackCount {
    pub total: u32
}

/// Entry of GET /v1/users/{id}/playlists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
    pub tracks: TrackCount
}
