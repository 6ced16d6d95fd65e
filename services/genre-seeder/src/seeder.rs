//!
//! src/seeder.rs  Andrew Belles  Oct 19th, 2026
//!
//! Defines the seeder: fans every genre seed out to isolated tasks,
//! reduces their batches in catalog order, merges them into the prior
//! dataset and replaces the file once at the end
//!

use std::sync::Arc;

use tokio::{sync::{OwnedSemaphorePermit, Semaphore}, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::{AppConfig, ConcurrencyConfig};
use crate::errors::SeederError;
use crate::extract::extract_track;
use crate::merge::{MergeReport, merge};
use crate::persistent::DatasetStore;
use crate::record::TrackFeatureRecord;
use crate::service::MusicService;
use crate::types::Candidate;

/// Counters for one run, logged as run.done
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub seeds_attempted: usize,
    pub seeds_succeeded: usize,
    pub failed_seeds: Vec<String>,
    pub candidates: usize,
    pub extracted: usize,
    pub absent: usize,
    pub track_failures: usize,
    pub merge: MergeReport,
    pub rows: usize
}

enum TrackOutcome {
    Row(TrackFeatureRecord),
    Absent,
    Failed
}

/// Everything one seed produced. Built by a single task and never shared
struct SeedOutcome {
    seed: String,
    candidates: usize,
    records: Vec<TrackFeatureRecord>,
    absent: usize,
    failed_tracks: usize,
    error: Option<String>
}

impl SeedOutcome {
    fn failed(seed: &str, error: String) -> Self {
        Self {
            seed: seed.to_string(),
            candidates: 0,
            records: Vec::new(),
            absent: 0,
            failed_tracks: 0,
            error: Some(error)
        }
    }
}

/// The parts of the seeder a spawned task needs
#[derive(Clone)]
struct SeedWorker {
    service: Arc<dyn MusicService>,
    seed_gate: Arc<Semaphore>,
    track_gate: Arc<Semaphore>,
    shutdown: CancellationToken
}

async fn acquire(gate: &Arc<Semaphore>, shutdown: &CancellationToken) ->
    Result<OwnedSemaphorePermit, SeederError> {
    tokio::select! {
        _ = shutdown.cancelled() => Err(SeederError::Cancelled),
        permit = gate.clone().acquire_owned() => permit.map_err(|_| SeederError::Cancelled)
    }
}

impl SeedWorker {
    async fn process_seed(self, seed: String) -> SeedOutcome {
        let _permit = match acquire(&self.seed_gate, &self.shutdown).await {
            Ok(p) => p,
            Err(e) => return SeedOutcome::failed(&seed, e.to_string())
        };

        debug!(seed = %seed, "seed.start");
        let recommended = tokio::select! {
            _ = self.shutdown.cancelled() => Err(SeederError::Cancelled),
            r = self.service.recommendations(&seed) => r
        };
        let candidates = match recommended {
            Ok(c) => c,
            Err(e) => {
                warn!(seed = %seed, error = %e, "seed.failed");
                return SeedOutcome::failed(&seed, e.to_string());
            }
        };

        let mut tracks = JoinSet::new();
        for (index, candidate) in candidates.iter().cloned().enumerate() {
            let this = self.clone();
            let genre = seed.clone();
            tracks.spawn(
                async move { (index, this.process_track(candidate, genre).await) }.in_current_span()
            );
        }

        let mut results: Vec<(usize, TrackOutcome)> = Vec::with_capacity(candidates.len());
        while let Some(joined) = tracks.join_next().await {
            match joined {
                Ok(r) => results.push(r),
                Err(e) => {
                    error!(seed = %seed, error = ?e, "track task panicked");
                    results.push((usize::MAX, TrackOutcome::Failed));
                }
            }
        }
        results.sort_by_key(|(index, _)| *index);

        let mut outcome = SeedOutcome {
            seed: seed.clone(),
            candidates: candidates.len(),
            records: Vec::with_capacity(results.len()),
            absent: 0,
            failed_tracks: 0,
            error: None
        };
        for (_, result) in results {
            match result {
                TrackOutcome::Row(row) => outcome.records.push(row),
                TrackOutcome::Absent => outcome.absent += 1,
                TrackOutcome::Failed => outcome.failed_tracks += 1
            }
        }

        info!(
            seed = %seed,
            candidates = outcome.candidates,
            records = outcome.records.len(),
            absent = outcome.absent,
            failed = outcome.failed_tracks,
            "seed.done"
        );
        outcome
    }

    async fn process_track(self, candidate: Candidate, genre: String) -> TrackOutcome {
        let _permit = match acquire(&self.track_gate, &self.shutdown).await {
            Ok(p) => p,
            Err(_) => return TrackOutcome::Failed
        };

        let extracted = tokio::select! {
            _ = self.shutdown.cancelled() => Err(SeederError::Cancelled),
            r = extract_track(self.service.as_ref(), &candidate, &genre) => r
        };
        match extracted {
            Ok(Some(row)) => TrackOutcome::Row(row),
            Ok(None) => TrackOutcome::Absent,
            Err(e) => {
                warn!(track = %candidate.track_id, seed = %genre, error = %e, "track.failed");
                TrackOutcome::Failed
            }
        }
    }
}

/// Names what sank a strict run: failed seeds first, then failed tracks
fn strict_failure(report: &RunReport) -> String {
    let mut parts = Vec::new();
    if !report.failed_seeds.is_empty() {
        parts.push(report.failed_seeds.join(", "));
    }
    if report.track_failures > 0 {
        parts.push(format!("{} track lookups failed", report.track_failures));
    }
    parts.join("; ")
}

pub struct Seeder {
    service: Arc<dyn MusicService>,
    store: DatasetStore,
    seeds: Vec<String>,
    strict_seeds: bool,

    // concurrency handlers
    seed_gate: Arc<Semaphore>,
    track_gate: Arc<Semaphore>,

    // cancelled by ctrl-c
    shutdown: CancellationToken
}

impl Seeder {
    pub fn new(cfg: &AppConfig, service: Arc<dyn MusicService>) -> Self {
        Self::with_parts(
            service,
            DatasetStore::new(&cfg.dataset.path),
            cfg.dataset.seeds.clone(),
            cfg.dataset.strict_seeds,
            &cfg.concurrency
        )
    }

    pub fn with_parts(
        service: Arc<dyn MusicService>,
        store: DatasetStore,
        seeds: Vec<String>,
        strict_seeds: bool,
        concurrency: &ConcurrencyConfig
    ) -> Self {
        Self {
            service,
            store,
            seeds,
            strict_seeds,
            seed_gate: Arc::new(Semaphore::new(concurrency.seed_concurrency.max(1))),
            track_gate: Arc::new(Semaphore::new(concurrency.track_concurrency.max(1))),
            shutdown: CancellationToken::new()
        }
    }

    pub fn shutdown(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// One full pass: load, fetch every seed, merge, write. The dataset file
    /// is either replaced with the merged rows or left untouched
    pub async fn run(&self) -> Result<RunReport, SeederError> {
        let span = info_span!("run", run_id = %Uuid::new_v4());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&self) -> Result<RunReport, SeederError> {
        info!(
            seeds = self.seeds.len(),
            strict = self.strict_seeds,
            path = %self.store.path().display(),
            "run.start"
        );

        // malformed prior data must fail before any request is made
        let prior = self.store.load()?;

        let outcomes = self.fetch_all().await?;
        if self.shutdown.is_cancelled() {
            warn!("run.cancelled");
            return Err(SeederError::Cancelled);
        }

        let mut report = RunReport { seeds_attempted: outcomes.len(), ..RunReport::default() };
        let mut batch = Vec::new();
        for outcome in outcomes {
            report.candidates     += outcome.candidates;
            report.absent         += outcome.absent;
            report.track_failures += outcome.failed_tracks;
            match outcome.error {
                Some(_) => report.failed_seeds.push(outcome.seed),
                None => {
                    report.seeds_succeeded += 1;
                    report.extracted += outcome.records.len();
                    batch.extend(outcome.records);
                }
            }
        }

        if self.strict_seeds && (!report.failed_seeds.is_empty() || report.track_failures > 0) {
            error!(
                failed = ?report.failed_seeds,
                track_failures = report.track_failures,
                "run.strict.abort"
            );
            return Err(SeederError::StrictSeeds(strict_failure(&report)));
        }

        let (rows, merged) = merge(prior, batch);
        info!(
            kept = merged.kept,
            appended = merged.appended,
            duplicates = merged.duplicates,
            prior_duplicates = merged.prior_duplicates,
            "merge.done"
        );

        self.store.save(&rows)?;
        report.merge = merged;
        report.rows = rows.len();

        info!(
            seeds_attempted = report.seeds_attempted,
            seeds_succeeded = report.seeds_succeeded,
            failed_seeds = ?report.failed_seeds,
            candidates = report.candidates,
            extracted = report.extracted,
            absent = report.absent,
            track_failures = report.track_failures,
            rows = report.rows,
            "run.done"
        );
        Ok(report)
    }

    fn clone_for_task(&self) -> SeedWorker {
        SeedWorker {
            service: self.service.clone(),
            seed_gate: self.seed_gate.clone(),
            track_gate: self.track_gate.clone(),
            shutdown: self.shutdown.clone()
        }
    }

    /// Spawns one task per seed and returns their outcomes in catalog order,
    /// whatever order they finished in. A seed that panics is a failed seed
    async fn fetch_all(&self) -> Result<Vec<SeedOutcome>, SeederError> {
        let mut tasks = JoinSet::new();
        for (index, seed) in self.seeds.iter().cloned().enumerate() {
            let worker = self.clone_for_task();
            tasks.spawn(async move {
                let handle = tokio::spawn(worker.process_seed(seed.clone()).in_current_span());
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(seed = %seed, error = ?e, "seed task panicked");
                        SeedOutcome::failed(&seed, e.to_string())
                    }
                };
                (index, outcome)
            }.in_current_span());
        }

        let mut outcomes: Vec<(usize, SeedOutcome)> = Vec::with_capacity(self.seeds.len());
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined.map_err(|e| SeederError::Task(e.to_string()))?;
            outcomes.push((index, outcome));
        }
        outcomes.sort_by_key(|(index, _)| *index);
        Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::testing::{FakeService, record};

    fn seeder_for(
        service: Arc<FakeService>,
        path: &Path,
        seeds: &[&str],
        strict: bool,
        concurrency: usize
    ) -> Seeder {
        Seeder::with_parts(
            service,
            DatasetStore::new(path),
            seeds.iter().map(|s| s.to_string()).collect(),
            strict,
            &ConcurrencyConfig { seed_concurrency: concurrency, track_concurrency: concurrency }
        )
    }

    fn keys(rows: &[TrackFeatureRecord]) -> Vec<(String, String)> {
        rows.iter().map(TrackFeatureRecord::dedup_key).collect()
    }

    #[tokio::test]
    async fn known_and_absent_tracks_leave_prior_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let store = DatasetStore::new(&path);
        let prior = vec![record("A1", "pop"), record("B2", "rock")];
        store.save(&prior).unwrap();
        let before = fs::read(&path).unwrap();

        let service = Arc::new(FakeService::default()
            .with_track("pop", "A1", "a1", true)
            .with_track("pop", "C3", "a3", false));
        let report = seeder_for(service, &path, &["pop"], false, 1).run().await.unwrap();

        assert_eq!(store.load().unwrap(), prior);
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(report.absent, 1);
        assert_eq!(report.merge.duplicates, 1);
        assert_eq!(report.merge.appended, 0);
        assert_eq!(report.rows, 2);
    }

    #[tokio::test]
    async fn first_run_writes_fetched_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/genre_seeds.csv");

        let service = Arc::new(FakeService::default().with_track("pop", "X9", "a9", true));
        let report = seeder_for(service, &path, &["pop"], false, 1).run().await.unwrap();

        let rows = DatasetStore::new(&path).load().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].track_id, "X9");
        assert_eq!(rows[0].genre, "pop");
        assert_eq!(report.seeds_succeeded, 1);
        assert_eq!(report.extracted, 1);
    }

    #[tokio::test]
    async fn second_run_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let service = Arc::new(FakeService::default()
            .with_track("pop", "X9", "a9", true)
            .with_track("rock", "Y8", "a8", true)
            .with_track("rock", "X9", "a9", true));
        let seeder = seeder_for(service, &path, &["pop", "rock"], false, 1);

        seeder.run().await.unwrap();
        let once = fs::read(&path).unwrap();
        let report = seeder.run().await.unwrap();

        assert_eq!(fs::read(&path).unwrap(), once);
        assert_eq!(report.merge.appended, 0);
        assert_eq!(report.merge.kept, 3);
    }

    #[tokio::test]
    async fn rows_follow_catalog_then_recommendation_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let service = Arc::new(FakeService::default()
            .with_track("rock", "R1", "b1", true)
            .with_track("pop", "P1", "c1", true)
            .with_track("pop", "P2", "c2", true)
            .with_track("pop", "P1", "c1", true));

        seeder_for(service, &path, &["pop", "rock"], false, 1).run().await.unwrap();

        let rows = DatasetStore::new(&path).load().unwrap();
        assert_eq!(keys(&rows), vec![
            ("P1".to_string(), "pop".to_string()),
            ("P2".to_string(), "pop".to_string()),
            ("R1".to_string(), "rock".to_string())
        ]);
    }

    #[tokio::test]
    async fn failing_seed_is_skipped_when_not_strict() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let service = Arc::new(FakeService::default()
            .with_track("pop", "X9", "a9", true)
            .with_track("rock", "Y8", "a8", true)
            .failing_seed("rock"));

        let report = seeder_for(service, &path, &["pop", "rock"], false, 1).run().await.unwrap();

        let rows = DatasetStore::new(&path).load().unwrap();
        assert_eq!(keys(&rows), vec![("X9".to_string(), "pop".to_string())]);
        assert_eq!(report.failed_seeds, vec!["rock".to_string()]);
        assert_eq!(report.seeds_succeeded, 1);
    }

    #[tokio::test]
    async fn failing_seed_aborts_strict_run_before_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let service = Arc::new(FakeService::default()
            .with_track("pop", "X9", "a9", true)
            .failing_seed("rock"));

        let err = seeder_for(service, &path, &["pop", "rock"], true, 1).run().await.unwrap_err();

        assert!(matches!(err, SeederError::StrictSeeds(ref s) if s == "rock"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn malformed_header_aborts_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        fs::write(&path, "name,track_id,genre\nsong,A1,pop\n").unwrap();
        let before = fs::read(&path).unwrap();

        let service = Arc::new(FakeService::default().with_track("pop", "X9", "a9", true));
        let err = seeder_for(service.clone(), &path, &["pop"], false, 1).run().await.unwrap_err();

        assert!(matches!(err, SeederError::Schema { .. }));
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(service.recommendation_calls(), 0);
        assert_eq!(service.lookup_calls(), 0);
    }

    #[tokio::test]
    async fn every_candidate_costs_three_lookups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let service = Arc::new(FakeService::default()
            .with_track("pop", "X9", "a9", true)
            .with_track("pop", "Z0", "a0", false)
            .with_track("rock", "X9", "a9", true));

        let report = seeder_for(service.clone(), &path, &["pop", "rock"], false, 1)
            .run().await.unwrap();

        assert_eq!(report.candidates, 3);
        assert_eq!(service.recommendation_calls(), 2);
        assert_eq!(service.lookup_calls(), 9);
    }

    #[tokio::test]
    async fn absent_track_adds_nothing_for_any_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let service = Arc::new(FakeService::default()
            .with_track("pop", "Z0", "a0", false)
            .with_track("rock", "Z0", "a0", false)
            .with_track("sad", "Z0", "a0", false));

        let report = seeder_for(service, &path, &["pop", "rock", "sad"], false, 1)
            .run().await.unwrap();

        assert_eq!(report.absent, 3);
        assert_eq!(report.rows, 0);
        assert!(DatasetStore::new(&path).load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn track_failure_does_not_sink_its_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let service = Arc::new(FakeService::default()
            .with_track("pop", "T1", "a1", true)
            .with_track("pop", "T2", "a2", true)
            .failing_track("T1"));

        let report = seeder_for(service, &path, &["pop"], false, 1).run().await.unwrap();

        let rows = DatasetStore::new(&path).load().unwrap();
        assert_eq!(keys(&rows), vec![("T2".to_string(), "pop".to_string())]);
        assert_eq!(report.track_failures, 1);
        assert!(report.failed_seeds.is_empty());
    }

    #[tokio::test]
    async fn track_failure_aborts_strict_run_before_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let service = Arc::new(FakeService::default()
            .with_track("pop", "T1", "a1", true)
            .with_track("pop", "T2", "a2", true)
            .failing_track("T1"));

        let err = seeder_for(service, &path, &["pop"], true, 1).run().await.unwrap_err();

        assert!(matches!(err, SeederError::StrictSeeds(ref s) if s == "1 track lookups failed"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn panicking_seed_is_recorded_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let service = Arc::new(FakeService::default()
            .with_track("pop", "X9", "a9", true)
            .with_track("rock", "Y8", "a8", true)
            .panicking_seed("rock"));

        let report = seeder_for(service, &path, &["rock", "pop"], false, 2).run().await.unwrap();

        let rows = DatasetStore::new(&path).load().unwrap();
        assert_eq!(keys(&rows), vec![("X9".to_string(), "pop".to_string())]);
        assert_eq!(report.failed_seeds, vec!["rock".to_string()]);
        assert_eq!(report.seeds_attempted, 2);
    }

    #[tokio::test]
    async fn empty_recommendations_still_write_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let service = Arc::new(FakeService::default().with_empty_seed("emo"));

        let report = seeder_for(service, &path, &["emo"], false, 1).run().await.unwrap();

        assert_eq!(report.seeds_succeeded, 1);
        assert!(path.exists());
        assert!(DatasetStore::new(&path).load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrency_does_not_change_output() {
        let service = || Arc::new(FakeService::default()
            .with_track("pop", "P1", "c1", true)
            .with_track("pop", "P2", "c2", true)
            .with_track("pop", "P3", "c3", false)
            .with_track("rock", "R1", "b1", true)
            .with_track("rock", "P1", "c1", true)
            .with_track("edm", "E1", "d1", true)
            .with_track("edm", "R1", "b1", true));
        let seeds = ["pop", "rock", "edm"];

        let dir = tempfile::tempdir().unwrap();
        let serial = dir.path().join("serial.csv");
        let parallel = dir.path().join("parallel.csv");

        seeder_for(service(), &serial, &seeds, false, 1).run().await.unwrap();
        seeder_for(service(), &parallel, &seeds, false, 4).run().await.unwrap();

        assert_eq!(fs::read(&serial).unwrap(), fs::read(&parallel).unwrap());
    }

    #[tokio::test]
    async fn cancelled_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genre_seeds.csv");
        let service = Arc::new(FakeService::default().with_track("pop", "X9", "a9", true));
        let seeder = seeder_for(service, &path, &["pop"], false, 1);

        seeder.shutdown().cancel();
        let err = seeder.run().await.unwrap_err();

        assert!(matches!(err, SeederError::Cancelled));
        assert!(!path.exists());
    }
}
