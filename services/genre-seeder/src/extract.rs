//!
//! src/extract.rs  Andrew Belles  Oct 19th, 2026
//!
//! Turns one recommended track into one dataset row
//!

use tracing::debug;

use crate::errors::SeederError;
use crate::record::{GenreSet, Mode, PitchClass, TrackFeatureRecord};
use crate::service::MusicService;
use crate::types::{ArtistMeta, AudioFeatures, Candidate, TrackMeta};

/// Issues the three lookups for candidate (track, audio features, artist, in
/// that order) and stamps the row with genre. Ok(None) when the service has
/// no audio features for the track
pub async fn extract_track(
    service: &dyn MusicService,
    candidate: &Candidate,
    genre: &str
) -> Result<Option<TrackFeatureRecord>, SeederError> {
    let meta     = service.track(&candidate.track_id).await?;
    let features = service.audio_features(&candidate.track_id).await?;
    let artist   = service.artist(&candidate.artist_id).await?;

    let Some(features) = features else {
        debug!(track = %candidate.track_id, genre, "track.absent");
        return Ok(None);
    };

    assemble(&meta, &features, &artist, genre).map(Some)
}

/// artist/artist_id come from the album's first credit, while the artist
/// aggregates come from the recommendation's first artist
pub fn assemble(
    meta: &TrackMeta,
    features: &AudioFeatures,
    artist: &ArtistMeta,
    genre: &str
) -> Result<TrackFeatureRecord, SeederError> {
    let credit = meta.album.artists.first()
        .ok_or_else(|| SeederError::Parse(format!("track {} has no album artist", meta.id)))?;

    Ok( TrackFeatureRecord {
        name: meta.name.clone(),
        track_id: meta.id.clone(),
        album: meta.album.name.clone(),
        artist: credit.name.clone(),
        artist_id: credit.id.clone().unwrap_or_default(),
        release_date: meta.album.release_date.clone(),
        length: meta.duration_ms,
        popularity: meta.popularity,
        artist_pop: artist.popularity,
        artist_genres: GenreSet::from(artist.genres.clone()),
        artist_followers: artist.followers.total,
        acousticness: features.acousticness,
        danceability: features.danceability,
        energy: features.energy,
        instrumentalness: features.instrumentalness,
        liveness: features.liveness,
        loudness: features.loudness,
        speechiness: features.speechiness,
        tempo: features.tempo,
        valence: features.valence,
        key: PitchClass::from_service(features.key),
        mode: Mode::from_service(features.mode)?,
        time_signature: features.time_signature,
        genre: genre.to_string()
    })
}
