//!
//! src/playlists.rs  Andrew Belles  Oct 19th, 2026
//!
//! Ranks a user's public playlists by follower count
//!

use serde::Serialize;
use tabled::Tabled;
use tracing::{debug, info};

use crate::errors::SeederError;
use crate::service::MusicService;
use crate::types::PlaylistSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct PlaylistRow {
    pub thumbnail: String,
    pub name: String,
    pub id: String,
    pub description: String,
    pub tracks: u32,
    pub followers: u64
}

impl PlaylistRow {
    fn from_summary(summary: PlaylistSummary, followers: u64) -> Self {
        let thumbnail = summary.images
            .and_then(|images| images.into_iter().next())
            .map(|image| image.url)
            .unwrap_or_default();

        Self {
            thumbnail,
            name: summary.name,
            id: summary.id,
            description: summary.description.unwrap_or_default(),
            tracks: summary.tracks.total,
            followers
        }
    }
}

/// Most followed first. Ties keep the order the service listed them in
pub fn rank(mut rows: Vec<PlaylistRow>, limit: usize) -> Vec<PlaylistRow> {
    rows.sort_by(|a, b| b.followers.cmp(&a.followers));
    rows.truncate(limit);
    rows
}

/// Lists user's playlists (first page), fetches each follower count and
/// keeps the top limit
pub async fn top_playlists(
    service: &dyn MusicService,
    user_id: &str,
    limit: usize
) -> Result<Vec<PlaylistRow>, SeederError> {
    let listed = service.user_playlists(user_id).await?;
    debug!(user = user_id, listed = listed.len(), "playlists.listed");

    let mut rows = Vec::with_capacity(listed.len());
    for summary in listed {
        let followers = service.playlist_followers(&summary.id).await?;
        rows.push(PlaylistRow::from_summary(summary, followers));
    }

    let ranked = rank(rows, limit);
    info!(user = user_id, returned = ranked.len(), "playlists.ranked");
    Ok(ranked)
}
