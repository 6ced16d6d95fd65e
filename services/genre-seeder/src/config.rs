//!
//! src/config.rs  Andrew Belles  Oct 19th, 2026
//!
//! Loads every section of configuration from the environment (and .env)
//! once at program start
//!

use std::{fmt::Display, path::PathBuf, str::FromStr, time};
use url::Url;

use crate::errors::SeederError;
use crate::seeds;

/// Constants for HTTP Config
pub const HTTP_TIMEOUT: u64 = 8000;
pub const HTTP_CONNECT_TIMEOUT: u64 = 2000;
pub const HTTP_POOL_MAX_IDLE: usize = 16;
pub const HTTP_POOL_IDLE_TIMEOUT: u64 = 90000;
pub const HTTP_MAX_REDIRECTS: u8 = 4;

pub const RETRY_MAX_RETRIES: usize = 3;
pub const RETRY_BASE_BACKOFF: u64 = 500;

pub const DATASET_PATH: &str = "./data/genre_seeds.csv";
pub const RAW_ARCHIVE_LEVEL: i32 = 3;
pub const PLAYLIST_LIMIT: usize = 10;

/// Source of configuration values, std::env::var outside of tests
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_optional(env: EnvLookup, s: &str) -> Option<String> {
    env(s).filter(|v| !v.trim().is_empty())
}

/// Wrapper over env lookup to return an invalid enviroment var error
fn env_check(env: EnvLookup, s: &str) -> Result<String, SeederError> {
    env_optional(env, s).ok_or_else(|| SeederError::Config(format!("{s} was not set")))
}

fn env_number<T>(env: EnvLookup, s: &str, default: T) -> Result<T, SeederError>
where
    T: FromStr,
    T::Err: Display
{
    match env_optional(env, s) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| SeederError::Config(
            format!("{s} invalid ({raw}): {e}")
        ))
    }
}

fn env_positive<T>(env: EnvLookup, s: &str, default: T) -> Result<T, SeederError>
where
    T: FromStr + PartialOrd + From<u8>,
    T::Err: Display
{
    let v = env_number(env, s, default)?;
    if v < T::from(1) {
        return Err(SeederError::Config(format!("{s} must be at least 1")));
    }
    Ok(v)
}

fn env_flag(env: EnvLookup, s: &str) -> bool {
    env_optional(env, s)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Ensures that url is https
fn ensure_https(url: &Url) -> Result<(), String> {
    if url.scheme() == "https" {
        Ok(())
    } else {
        Err(format!("URL must be https: {url}"))
    }
}

fn ensure_host(url: &Url, expected_host: &str) -> Result<(), String> {
    match url.host_str() {
        Some(h) if h.eq_ignore_ascii_case(expected_host) => Ok(()),
        Some(h) => Err(
            format!("Unexpected host for {url} (got {h}, expected {expected_host})")
        ),
        None => Err(format!("URL missing host: {url}"))
    }
}

/// Url::join drops the last segment unless the base ends with a slash
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let mut path = url.path().to_string();
        path.push('/');
        url.set_path(&path);
    }
    url
}

/// Configuration that Spotify expects when hitting endpoints
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: Url,
    pub api_base: Url,
}

fn build_spotify(env: EnvLookup) -> Result<SpotifyConfig, SeederError> {
    let client_id     = env_check(env, "SPOTIFY_CLIENT_ID")?;
    let client_secret = env_check(env, "SPOTIFY_CLIENT_SECRET")?;

    // form urls
    let token_url = env_optional(env, "SPOTIFY_TOKEN_URL")
        .unwrap_or_else(|| "https://accounts.spotify.com/api/token".to_string());
    let api_base  = env_optional(env, "SPOTIFY_API_BASE")
        .unwrap_or_else(|| "https://api.spotify.com/v1/".to_string());

    let token_url = Url::parse(&token_url)
        .map_err(|e| SeederError::Config(format!("SPOTIFY_TOKEN_URL invalid {e}")))?;
    let api_base  = Url::parse(&api_base)
        .map_err(|e| SeederError::Config(format!("SPOTIFY_API_BASE invalid {e}")))?;

    // ensure valid https and hostname for both urls
    ensure_https(&token_url).map_err(SeederError::Config)?;
    ensure_https(&api_base).map_err(SeederError::Config)?;
    ensure_host(&token_url, "accounts.spotify.com").map_err(SeederError::Config)?;
    ensure_host(&api_base, "api.spotify.com").map_err(SeederError::Config)?;

    let api_base = with_trailing_slash(api_base);
    Ok( SpotifyConfig { client_id, client_secret, token_url, api_base })
}

///
/// Configuration for Http timeouts, retries, etc.
///
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub base_backoff: time::Duration
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: RETRY_MAX_RETRIES,
            base_backoff: time::Duration::from_millis(RETRY_BASE_BACKOFF)
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: time::Duration,
    pub connect_timeout: time::Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: time::Duration,
    pub max_redirects: u8,
    pub retry: RetryConfig
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: time::Duration::from_millis(HTTP_TIMEOUT),
            connect_timeout: time::Duration::from_millis(HTTP_CONNECT_TIMEOUT),
            pool_max_idle_per_host: HTTP_POOL_MAX_IDLE,
            pool_idle_timeout: time::Duration::from_millis(HTTP_POOL_IDLE_TIMEOUT),
            max_redirects: HTTP_MAX_REDIRECTS,
            retry: RetryConfig::default()
        }
    }
}

fn build_http(env: EnvLookup) -> Result<HttpConfig, SeederError> {
    let mut http = HttpConfig::default();
    http.timeout = time::Duration::from_millis(
        env_positive(env, "HTTP_TIMEOUT_MS", HTTP_TIMEOUT)?
    );
    http.retry.max_retries  = env_number(env, "HTTP_MAX_RETRY", RETRY_MAX_RETRIES)?;
    http.retry.base_backoff = time::Duration::from_millis(
        env_positive(env, "HTTP_BACKOFF_MS", RETRY_BASE_BACKOFF)?
    );
    Ok(http)
}

///
/// Configuration for the dataset being built
///
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub path: PathBuf,
    pub seeds: Vec<String>,
    pub recommendation_limit: Option<u32>,  // None leaves the service default
    pub strict_seeds: bool                  // any seed failure aborts the run
}

fn build_dataset(env: EnvLookup) -> Result<DatasetConfig, SeederError> {
    let path = env_optional(env, "DATASET_PATH")
        .unwrap_or_else(|| DATASET_PATH.to_string());

    let seeds = match env_optional(env, "GENRE_SEEDS") {
        Some(raw) => seeds::parse_seed_list(&raw)?,
        None => seeds::default_catalog()
    };

    let recommendation_limit = match env_optional(env, "RECOMMENDATION_LIMIT") {
        None => None,
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(limit) if (1..=100).contains(&limit) => Some(limit),
            _ => return Err(SeederError::Config(
                format!("RECOMMENDATION_LIMIT must be within 1..=100, got {raw}")
            ))
        }
    };

    Ok( DatasetConfig {
        path: PathBuf::from(path),
        seeds,
        recommendation_limit,
        strict_seeds: env_flag(env, "STRICT_SEEDS")
    })
}

///
/// Configuration for the optional raw response archive
///
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub root: Option<PathBuf>,  // None disables archiving
    pub level: i32
}

fn build_archive(env: EnvLookup) -> Result<ArchiveConfig, SeederError> {
    Ok( ArchiveConfig {
        root: env_optional(env, "RAW_ARCHIVE_ROOT").map(PathBuf::from),
        level: env_number(env, "RAW_ARCHIVE_LEVEL", RAW_ARCHIVE_LEVEL)?
    })
}

///
/// Configuration for how many seeds and tracks are in flight at once.
/// 1 and 1 reproduces the sequential schedule
///
#[derive(Debug, Clone)]
pub struct ConcurrencyConfig {
    pub seed_concurrency: usize,
    pub track_concurrency: usize
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self { seed_concurrency: 1, track_concurrency: 1 }
    }
}

fn build_concurrency(env: EnvLookup) -> Result<ConcurrencyConfig, SeederError> {
    Ok( ConcurrencyConfig {
        seed_concurrency: env_positive(env, "SEED_CONCURRENCY", 1)?,
        track_concurrency: env_positive(env, "TRACK_CONCURRENCY", 1)?
    })
}

///
/// Configuration for Logger
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub include_file_line: bool,
    pub include_target: bool
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter_directives: "info,genre_seeder=debug,reqwest=warn".to_string(),
            format: LogFormat::Json,
            with_ansi: true,
            include_file_line: true,
            include_target: true
        }
    }
}

fn build_logging(env: EnvLookup) -> Result<LoggingConfig, SeederError> {
    let mut logging = LoggingConfig::default();
    logging.format = match env_optional(env, "LOG_FORMAT")
        .map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("json") => LogFormat::Json,
        Some("pretty") => LogFormat::Pretty,
        Some(other) => return Err(SeederError::Config(
            format!("LOG_FORMAT must be json or pretty, got {other}")
        ))
    };
    Ok(logging)
}

///
/// Configuration for the playlist ranking tool
///
#[derive(Debug, Clone)]
pub struct PlaylistConfig {
    pub user: Option<String>,   // required only by top-playlists
    pub limit: usize
}

fn build_playlists(env: EnvLookup) -> Result<PlaylistConfig, SeederError> {
    Ok( PlaylistConfig {
        user: env_optional(env, "PLAYLIST_USER").map(|u| u.trim().to_string()),
        limit: env_positive(env, "PLAYLIST_LIMIT", PLAYLIST_LIMIT)?
    })
}

///
/// AppConfig which holds every section needed by both binaries
///
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub spotify: SpotifyConfig,
    pub http: HttpConfig,
    pub dataset: DatasetConfig,
    pub archive: ArchiveConfig,
    pub concurrency: ConcurrencyConfig,
    pub logging: LoggingConfig,
    pub playlists: PlaylistConfig
}

///
/// Return all environment variables to caller at program start.
///
pub fn load_config() -> Result<AppConfig, SeederError> {
    dotenvy::dotenv().ok();
    config_from(&process_env)
}

pub fn config_from(env: EnvLookup) -> Result<AppConfig, SeederError> {
    let spotify     = build_spotify(env)?;
    let http        = build_http(env)?;
    let dataset     = build_dataset(env)?;
    let archive     = build_archive(env)?;
    let concurrency = build_concurrency(env)?;
    let logging     = build_logging(env)?;
    let playlists   = build_playlists(env)?;

    Ok( AppConfig { spotify, http, dataset, archive, concurrency, logging, playlists } )
}
