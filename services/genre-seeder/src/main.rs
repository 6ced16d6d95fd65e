//!
//! src/main.rs  Andrew Belles  Oct 19th, 2026
//!
//! Runs one pass of the genre seed dataset builder. Exits non-zero
//! whenever the dataset file could not be updated
//!

use std::sync::Arc;

use genre_seeder::{
    SeederError, config, logging,
    fetch::SpotifyClient,
    seeder::Seeder,
    sink::RawArchive
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), SeederError> {
    let cfgs = config::load_config()?;
    let _guard = logging::init_logging(&cfgs.logging)?;

    info!(
        service = "genre-seeder",
        version = %env!("CARGO_PKG_VERSION"),
        "starting"
    );

    let mut spotify = SpotifyClient::new(&cfgs.http, &cfgs.spotify)?
        .with_recommendation_limit(cfgs.dataset.recommendation_limit);
    if let Some(root) = cfgs.archive.root.as_ref() {
        info!(root = %root.display(), level = cfgs.archive.level, "archive.enabled");
        spotify = spotify.with_archive(RawArchive::new(root, cfgs.archive.level));
    }

    let seeder = Seeder::new(&cfgs, Arc::new(spotify));

    let shutdown = seeder.shutdown();
    let trigger = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(msg = "cancelling run, dataset left untouched", "seeder.signal");
            shutdown.cancel();
        }
    });

    let result = seeder.run().await;
    trigger.abort();

    match result {
        Ok(report) => {
            info!(rows = report.rows, failed_seeds = report.failed_seeds.len(), "exit");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "run.failed");
            Err(e)
        }
    }
}
