//!
//! src/bin/top_playlists.rs  Andrew Belles  Oct 19th, 2026
//!
//! Prints a user's most followed playlists as a table
//!

use genre_seeder::{
    SeederError, config, logging,
    fetch::SpotifyClient,
    playlists::top_playlists
};
use tabled::Table;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), SeederError> {
    let cfgs = config::load_config()?;
    let _guard = logging::init_logging(&cfgs.logging)?;

    let user = cfgs.playlists.user.clone()
        .ok_or_else(|| SeederError::Config("PLAYLIST_USER was not set".to_string()))?;

    info!(
        service = "top-playlists",
        version = %env!("CARGO_PKG_VERSION"),
        user = %user,
        limit = cfgs.playlists.limit,
        "starting"
    );

    let spotify = SpotifyClient::new(&cfgs.http, &cfgs.spotify)?;
    let rows = top_playlists(&spotify, &user, cfgs.playlists.limit).await?;

    println!("{}", Table::new(rows));
    Ok(())
}
