//! Mirror-node REST client with rate limiting, retries, and response cache.

use crate::mirror::cache::{CacheError, ResponseCache};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

const DEFAULT_MIRROR_URL: &str = "https://mainnet-public.mirrornode.hedera.com/api/v1";
const RATE_LIMIT_MS: u64 = 100;
const MAX_RETRIES: u32 = 3;
const RETRY_BACKOFF_MS: u64 = 500;
const PAGE_LIMIT: u32 = 100;
const MAX_PAGES: u32 = 10;

#[derive(Clone, Debug)]
pub struct MirrorConfig {
    pub base_url: String,
    pub rate_limit_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub offline: bool,
    /// Cap on `links.next` pages followed per query.
    pub max_pages: u32,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MIRROR_URL.to_string(),
            rate_limit_ms: RATE_LIMIT_MS,
            max_retries: MAX_RETRIES,
            retry_backoff_ms: RETRY_BACKOFF_MS,
            offline: false,
            max_pages: MAX_PAGES,
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("cache: {0}")]
    Cache(#[from] CacheError),
    #[error("parse logs response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("api error: status {0} body {1}")]
    Api(u16, String),
    #[error("offline mode: no cached response for request")]
    OfflineMiss,
}

/// One contract log as served by the mirror node. Topics and data are hex
/// strings; the consensus timestamp is passed through unmodified.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawLogRecord {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Deserialize)]
struct LogsPage {
    #[serde(default)]
    logs: Vec<RawLogRecord>,
    #[serde(default)]
    links: Option<PageLinks>,
}

#[derive(Deserialize)]
struct PageLinks {
    next: Option<String>,
}

/// Parameters of one mirror log query.
#[derive(Clone, Debug, Default)]
pub struct LogQuery {
    /// Contract id (`shard.realm.num`) or EVM address.
    pub contract: String,
    /// Optional event signature hash filter.
    pub topic0: Option<String>,
    /// Inclusive consensus-timestamp lower bound.
    pub from: Option<String>,
    /// Inclusive consensus-timestamp upper bound.
    pub to: Option<String>,
}

impl LogQuery {
    pub fn for_contract(contract: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            ..Default::default()
        }
    }

    /// Request path for this query. Also the input to the response-cache
    /// key, so callers can seed or inspect cached pages for a query.
    pub fn path(&self) -> String {
        let mut path = format!(
            "/contracts/{}/results/logs?order=asc&limit={}",
            urlencoding::encode(&self.contract),
            PAGE_LIMIT
        );
        if let Some(t) = &self.topic0 {
            path.push_str(&format!("&topic0={}", urlencoding::encode(t)));
        }
        if let Some(f) = &self.from {
            path.push_str(&format!("&timestamp=gte:{}", urlencoding::encode(f)));
        }
        if let Some(t) = &self.to {
            path.push_str(&format!("&timestamp=lte:{}", urlencoding::encode(t)));
        }
        path
    }
}

/// Mirror client with rate limiting, bounded retries, and an optional
/// SQLite response cache. Offline mode serves the cache only.
pub struct MirrorClient {
    config: MirrorConfig,
    client: Option<reqwest::Client>,
    cache: Option<ResponseCache>,
    last_request: std::sync::Mutex<Option<OffsetDateTime>>,
    request_count: AtomicU64,
}

impl MirrorClient {
    pub fn new(config: MirrorConfig, cache: Option<ResponseCache>) -> Result<Self, FetchError> {
        let client = if config.offline {
            None
        } else {
            Some(
                reqwest::Client::builder()
                    .use_rustls_tls()
                    .timeout(Duration::from_secs(30))
                    .build()?,
            )
        };
        Ok(Self {
            config,
            client,
            cache,
            last_request: std::sync::Mutex::new(None),
            request_count: AtomicU64::new(0),
        })
    }

    async fn rate_limit(&self) {
        let sleep_ms = {
            let last = self.last_request.lock().unwrap();
            let prev = *last;
            drop(last);
            if let Some(prev) = prev {
                let elapsed = (OffsetDateTime::now_utc() - prev).whole_milliseconds();
                let need: i128 = self.config.rate_limit_ms as i128;
                if elapsed < need {
                    (need - elapsed).max(0) as u64
                } else {
                    0
                }
            } else {
                0
            }
        };
        if sleep_ms > 0 {
            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
        }
        *self.last_request.lock().unwrap() = Some(OffsetDateTime::now_utc());
    }

    async fn get_json(&self, path: &str) -> Result<String, FetchError> {
        let cache_key = ResponseCache::key_for(path);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&cache_key)? {
                debug!(key = %cache_key, "cache hit");
                return Ok(cached);
            }
            if self.config.offline {
                return Err(FetchError::OfflineMiss);
            }
        }

        let client = self.client.as_ref().ok_or(FetchError::OfflineMiss)?;
        self.rate_limit().await;

        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut last_err = None;
        for attempt in 0..=self.config.max_retries {
            match client.get(&url).send().await {
                Ok(r) => {
                    let status = r.status();
                    let body = r.text().await.unwrap_or_default();
                    if !status.is_success() {
                        last_err = Some(FetchError::Api(status.as_u16(), body));
                        if attempt < self.config.max_retries {
                            let ms = self.config.retry_backoff_ms * (1 << attempt);
                            tokio::time::sleep(Duration::from_millis(ms)).await;
                        }
                        continue;
                    }
                    self.request_count.fetch_add(1, Ordering::Relaxed);
                    if let Some(cache) = &self.cache {
                        let _ = cache.put(&cache_key, &body);
                    }
                    return Ok(body);
                }
                Err(e) => {
                    last_err = Some(FetchError::Request(e));
                    if attempt < self.config.max_retries {
                        let ms = self.config.retry_backoff_ms * (1 << attempt);
                        warn!(attempt, ms, "retry after error");
                        tokio::time::sleep(Duration::from_millis(ms)).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or(FetchError::Api(0, "unknown".to_string())))
    }

    /// Fetch all logs matching `query`, following `links.next` pagination up
    /// to the configured page cap.
    pub async fn contract_logs(&self, query: &LogQuery) -> Result<Vec<RawLogRecord>, FetchError> {
        let mut records = Vec::new();
        let mut path = query.path();
        for page in 0..self.config.max_pages {
            let body = self.get_json(&path).await?;
            let parsed: LogsPage = serde_json::from_str(&body)?;
            debug!(page, count = parsed.logs.len(), "mirror logs page");
            records.extend(parsed.logs);
            match parsed.links.and_then(|l| l.next) {
                Some(next) if !next.is_empty() => {
                    // `links.next` is an absolute API path; rebase onto ours.
                    path = next
                        .strip_prefix("/api/v1")
                        .unwrap_or(&next)
                        .to_string();
                }
                _ => break,
            }
        }
        info!(contract = %query.contract, count = records.len(), "contract_logs");
        Ok(records)
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}
