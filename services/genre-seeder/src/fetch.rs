//!
//! src/fetch.rs  Andrew Belles  Oct 19th, 2026
//!
//! Defines methods for hitting Spotify endpoints, handling the
//! client credentials token and retries, and decoding responses
//!

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use reqwest::{Client, RequestBuilder, StatusCode, header, redirect};
use serde_json::Value;
use tokio::{sync::Mutex, time::{Instant, sleep}};
use tracing::{debug, warn};
use url::Url;

use crate::config::{HttpConfig, RetryConfig, SpotifyConfig};
use crate::errors::SeederError;
use crate::service::MusicService;
use crate::sink::{RawArchive, RawType};
use crate::types::{ArtistMeta, AudioFeatures, Candidate, PlaylistSummary, TrackMeta};

/// Token is refreshed this many seconds before the service expires it
const TOKEN_EXPIRY_MARGIN: u64 = 60;
const PLAYLIST_PAGE_LIMIT: u32 = 50;

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
}

pub fn base_client(http: &HttpConfig) -> Result<Client, SeederError> {
    let mut h = header::HeaderMap::new();
    h.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    client_helper(http)
        .default_headers(h)
        .build()
        .map_err(|e| SeederError::Http(format!("build client: {e}")))
}

/// Simple function to generate random wait for http_with_retry
fn generate_backoff(base: Duration, attempt: usize, rng: &mut SmallRng) -> Duration {
    let exp = (1_u64 << attempt.min(6)) * base.as_millis() as u64;
    let jitter = rng.gen_range(50..=200) as u64;
    Duration::from_millis(exp + jitter)
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response.headers()
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Sends request, retrying transport errors, 429 and any 5xx with exponential
/// backoff (or Retry-After when given). 404 is returned as NotFound without
/// retrying, every other status fails at once
pub async fn http_with_retry(
    request: RequestBuilder,
    retry: &RetryConfig
) -> Result<Value, SeederError> {
    let mut rng = SmallRng::from_entropy();
    let mut attempt = 0_usize;
    loop {
        let response = request.try_clone()
            .ok_or_else(|| SeederError::Http("non-cloneable request".to_string()))?
            .send()
            .await;
        match response {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    let v = resp.json::<Value>().await?;
                    return Ok(v);
                }
                let url = resp.url().to_string();
                if status == StatusCode::NOT_FOUND {
                    return Err(SeederError::NotFound(url));
                }
                let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                if !retryable || attempt >= retry.max_retries {
                    return Err(SeederError::Status { status: status.as_u16(), url });
                }
                let backoff = retry_after(&resp)
                    .unwrap_or_else(|| generate_backoff(retry.base_backoff, attempt, &mut rng));
                warn!(status = %status, attempt, backoff = ?backoff.as_millis(), "http.retry");
                sleep(backoff).await;
                attempt += 1;
            },
            Err(e) => {
                if attempt >= retry.max_retries {
                    return Err(e.into());
                }
                let backoff = generate_backoff(retry.base_backoff, attempt, &mut rng);
                warn!(error = %e, attempt, backoff = ?backoff.as_millis(), "http.retry.error");
                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

/// Pulls (track id, first artist id) out of a recommendations body
pub fn candidates_from(body: &Value) -> Vec<Candidate> {
    let tracks = body.get("tracks")
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    tracks.iter()
        .filter_map(|track| {
            let track_id = track.get("id").and_then(|v| v.as_str());
            let artist_id = track.pointer("/artists/0/id").and_then(|v| v.as_str());
            match (track_id, artist_id) {
                (Some(t), Some(a)) => Some(Candidate {
                    track_id: t.to_string(),
                    artist_id: a.to_string()
                }),
                _ => {
                    warn!(track = ?track_id, "recommendation.skip.missing_ids");
                    None
                }
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
struct BearerToken {
    value: String,
    expires_at: Instant
}

#[derive(Debug)]
pub struct SpotifyClient {
    http: Client,
    cfg: SpotifyConfig,
    retry: RetryConfig,
    recommendation_limit: Option<u32>,
    archive: Option<Arc<RawArchive>>,
    token: Mutex<Option<BearerToken>>
}

impl SpotifyClient {
    pub fn new(http_config: &HttpConfig, cfg: &SpotifyConfig) ->
        Result<Self, SeederError> {

        let http = base_client(http_config)?;
        Ok( Self {
            http,
            cfg: cfg.clone(),
            retry: http_config.retry.clone(),
            recommendation_limit: None,
            archive: None,
            token: Mutex::new(None)
        })
    }

    pub fn with_recommendation_limit(mut self, limit: Option<u32>) -> Self {
        self.recommendation_limit = limit;
        self
    }

    pub fn with_archive(mut self, archive: RawArchive) -> Self {
        self.archive = Some(Arc::new(archive));
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, SeederError> {
        self.cfg.api_base.join(path)
            .map_err(|e| SeederError::Config(format!("bad endpoint {path}: {e}")))
    }

    pub fn token_request(&self) -> RequestBuilder {
        self.http
            .post(self.cfg.token_url.clone())
            .basic_auth(&self.cfg.client_id, Some(&self.cfg.client_secret))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
    }

    /// GET /v1/recommendations?seed_genres=...&limit=
    pub fn recommendations_request(&self, seed: &str, bearer: &str) ->
        Result<RequestBuilder, SeederError> {
        let url = self.endpoint("recommendations")?;
        let mut rb = self.http.get(url).bearer_auth(bearer).query(&[("seed_genres", seed)]);
        if let Some(limit) = self.recommendation_limit {
            rb = rb.query(&[("limit", limit.to_string())]);
        }
        Ok(rb)
    }

    /// GET /v1/tracks/{id}
    pub fn track_request(&self, track_id: &str, bearer: &str) ->
        Result<RequestBuilder, SeederError> {
        let url = self.endpoint(&format!("tracks/{track_id}"))?;
        Ok(self.http.get(url).bearer_auth(bearer))
    }

    /// GET /v1/audio-features?ids=...
    pub fn audio_features_request(&self, ids_csv: &str, bearer: &str) ->
        Result<RequestBuilder, SeederError> {
        let url = self.endpoint("audio-features")?;
        Ok(self.http.get(url).bearer_auth(bearer).query(&[("ids", ids_csv)]))
    }

    /// GET /v1/artists/{id}
    pub fn artist_request(&self, artist_id: &str, bearer: &str) ->
        Result<RequestBuilder, SeederError> {
        let url = self.endpoint(&format!("artists/{artist_id}"))?;
        Ok(self.http.get(url).bearer_auth(bearer))
    }

    /// GET /v1/users/{id}/playlists?limit=
    pub fn user_playlists_request(&self, user_id: &str, bearer: &str) ->
        Result<RequestBuilder, SeederError> {
        let url = self.endpoint(&format!("users/{user_id}/playlists"))?;
        Ok(self.http.get(url).bearer_auth(bearer)
            .query(&[("limit", PLAYLIST_PAGE_LIMIT.to_string())]))
    }

    /// GET /v1/playlists/{id}?fields=followers.total
    pub fn playlist_request(&self, playlist_id: &str, bearer: &str) ->
        Result<RequestBuilder, SeederError> {
        let url = self.endpoint(&format!("playlists/{playlist_id}"))?;
        Ok(self.http.get(url).bearer_auth(bearer).query(&[("fields", "followers.total")]))
    }

    /// Cached client credentials token, refreshed shortly before expiry
    async fn bearer(&self) -> Result<String, SeederError> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let response = http_with_retry(self.token_request(), &self.retry).await?;
        let value = response["access_token"].as_str()
            .ok_or_else(|| SeederError::Parse("no access_token in token response".into()))?
            .to_string();
        let expires_in = response["expires_in"].as_u64().unwrap_or(3600);
        let expires_at = Instant::now()
            + Duration::from_secs(expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN));
        debug!(expires_in, "spotify.token.refreshed");

        *slot = Some(BearerToken { value: value.clone(), expires_at });
        Ok(value)
    }

    fn archive_raw(&self, kind: RawType, key: &str, body: &Value) {
        if let Some(archive) = &self.archive {
            if let Err(e) = archive.write_json(kind, key, body.clone()) {
                warn!(error = %e, kind = kind.as_str(), key, "archive.write.failed");
            }
        }
    }
}

#[async_trait]
impl MusicService for SpotifyClient {
    async fn recommendations(&self, seed: &str) -> Result<Vec<Candidate>, SeederError> {
        let bearer = self.bearer().await?;
        let body = http_with_retry(
            self.recommendations_request(seed, &bearer)?, &self.retry
        ).await?;

        let key = format!("{seed}-{}", Utc::now().format("%Y%m%d"));
        self.archive_raw(RawType::Recommendations, &key, &body);
        Ok(candidates_from(&body))
    }

    async fn track(&self, track_id: &str) -> Result<TrackMeta, SeederError> {
        let bearer = self.bearer().await?;
        let body = http_with_retry(self.track_request(track_id, &bearer)?, &self.retry).await?;
        self.archive_raw(RawType::Track, track_id, &body);
        Ok(serde_json::from_value(body)?)
    }

    async fn audio_features(&self, track_id: &str) ->
        Result<Option<AudioFeatures>, SeederError> {
        let bearer = self.bearer().await?;
        let body = match http_with_retry(
            self.audio_features_request(track_id, &bearer)?, &self.retry
        ).await {
            Ok(body) => body,
            Err(SeederError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e)
        };
        self.archive_raw(RawType::AudioFeatures, track_id, &body);

        match body.pointer("/audio_features/0") {
            None | Some(Value::Null) => Ok(None),
            Some(entry) => Ok(Some(serde_json::from_value(entry.clone())?))
        }
    }

    async fn artist(&self, artist_id: &str) -> Result<ArtistMeta, SeederError> {
        let bearer = self.bearer().await?;
        let body = http_with_retry(self.artist_request(artist_id, &bearer)?, &self.retry).await?;
        self.archive_raw(RawType::Artist, artist_id, &body);
        Ok(serde_json::from_value(body)?)
    }

    async fn user_playlists(&self, user_id: &str) ->
        Result<Vec<PlaylistSummary>, SeederError> {
        let bearer = self.bearer().await?;
        let body = http_with_retry(
            self.user_playlists_request(user_id, &bearer)?, &self.retry
        ).await?;
        let items = body.get("items").cloned().unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(items)?)
    }

    async fn playlist_followers(&self, playlist_id: &str) -> Result<u64, SeederError> {
        let bearer = self.bearer().await?;
        let body = http_with_retry(
            self.playlist_request(playlist_id, &bearer)?, &self.retry
        ).await?;
        body.pointer("/followers/total")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| SeederError::Parse(format!("playlist {playlist_id} has no follower count")))
    }
}
