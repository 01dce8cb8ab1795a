//! Datafeed module for loading bar history from different sources.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use lru::LruCache;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::cache::TtlCache;
use super::constant::Timeframe;
use super::setting::Settings;
use super::utility::get_folder_path;
use crate::chart::Bar;

/// Errors raised by a datafeed query
#[derive(Debug, Error)]
pub enum DatafeedError {
    #[error("datafeed i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("datafeed returned malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("datafeed unavailable: {0}")]
    Unavailable(String),
    #[error("datafeed runtime error: {0}")]
    Runtime(String),
}

/// Bar history query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BarRequest {
    pub symbol: String,
    pub timeframe: Timeframe,
}

impl BarRequest {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
        }
    }
}

/// Abstract datafeed trait for connecting to different data sources
#[async_trait]
pub trait BaseDatafeed: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Initialize datafeed service connection
    async fn init(&self) -> Result<bool, DatafeedError> {
        Ok(true)
    }

    /// Query history bar data, ordered by timestamp
    async fn query_bar_history(&self, req: &BarRequest) -> Result<Vec<Bar>, DatafeedError>;
}

/// Query a datafeed, treating any failure as "no update this cycle".
pub async fn fetch_bars(feed: &dyn BaseDatafeed, req: &BarRequest) -> Vec<Bar> {
    match feed.query_bar_history(req).await {
        Ok(bars) => {
            tracing::info!(feed = feed.name(), symbol = %req.symbol, timeframe = %req.timeframe, count = bars.len(), "bars fetched");
            bars
        }
        Err(e) => {
            tracing::warn!(feed = feed.name(), symbol = %req.symbol, timeframe = %req.timeframe, error = %e, "bar query failed");
            Vec::new()
        }
    }
}

/// Build the datafeed named by the `datafeed.*` settings.
pub fn create_datafeed(settings: &Settings) -> Arc<dyn BaseDatafeed> {
    let name = settings.get_string("datafeed.name").unwrap_or_default();

    let feed: Box<dyn BaseDatafeed> = match name.trim().to_lowercase().as_str() {
        "synthetic" => Box::new(SyntheticDatafeed::default()),
        "json" => {
            let path = settings.get_string("datafeed.path").unwrap_or_default();
            let dir = if path.trim().is_empty() {
                get_folder_path("data")
            } else {
                PathBuf::from(path)
            };
            Box::new(JsonFileDatafeed::new(dir))
        }
        other => {
            tracing::warn!(name = other, "no datafeed configured, charts will stay empty");
            Box::new(EmptyDatafeed)
        }
    };

    Arc::new(CachedDatafeed::new(feed, Duration::minutes(1), DEFAULT_CACHE_CAPACITY))
}

/// Empty datafeed implementation for when no datafeed is configured
#[derive(Debug, Default)]
pub struct EmptyDatafeed;

#[async_trait]
impl BaseDatafeed for EmptyDatafeed {
    fn name(&self) -> &str {
        "empty"
    }

    async fn init(&self) -> Result<bool, DatafeedError> {
        Ok(false)
    }

    async fn query_bar_history(&self, _req: &BarRequest) -> Result<Vec<Bar>, DatafeedError> {
        Err(DatafeedError::Unavailable("no datafeed configured".to_string()))
    }
}

/// Seeded random walk, deterministic per (symbol, timeframe, end time).
#[derive(Debug, Clone)]
pub struct SyntheticDatafeed {
    seed: u64,
    count: usize,
    /// Timestamp of the newest bar; the current time when unset
    end: Option<DateTime<Utc>>,
}

impl Default for SyntheticDatafeed {
    fn default() -> Self {
        Self::new(42, 1000)
    }
}

impl SyntheticDatafeed {
    pub fn new(seed: u64, count: usize) -> Self {
        Self { seed, count, end: None }
    }

    /// Pin the newest bar so repeated queries return the same series
    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    fn generate(&self, req: &BarRequest, end: DateTime<Utc>) -> Vec<Bar> {
        let seed = req
            .symbol
            .bytes()
            .chain(req.timeframe.value().bytes())
            .fold(self.seed, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut rng = StdRng::seed_from_u64(seed);

        let step = req.timeframe.duration();
        let end = align_to(end, step);
        let first = end - step * (self.count.saturating_sub(1) as i32);

        let mut close: f64 = rng.random_range(50.0..250.0);
        (0..self.count)
            .map(|i| {
                let open = close;
                close = (open * (1.0 + rng.random_range(-0.01..0.01))).max(1.0);
                let high = open.max(close) * (1.0 + rng.random_range(0.0..0.005));
                let low = open.min(close) * (1.0 - rng.random_range(0.0..0.005));
                let volume = rng.random_range(1_000.0..50_000.0_f64).round();
                Bar::new(first + step * i as i32, open, high, low, close, volume)
            })
            .collect()
    }
}

/// Round a timestamp down to a multiple of `step` since the epoch.
fn align_to(timestamp: DateTime<Utc>, step: Duration) -> DateTime<Utc> {
    let step_secs = step.num_seconds().max(1);
    let secs = timestamp.timestamp().div_euclid(step_secs) * step_secs;
    Utc.timestamp_opt(secs, 0).single().unwrap_or(timestamp)
}

#[async_trait]
impl BaseDatafeed for SyntheticDatafeed {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn query_bar_history(&self, req: &BarRequest) -> Result<Vec<Bar>, DatafeedError> {
        Ok(self.generate(req, self.end.unwrap_or_else(Utc::now)))
    }
}

/// Reads `<dir>/<SYMBOL>_<TF>.json`, an array of bars.
#[derive(Debug, Clone)]
pub struct JsonFileDatafeed {
    dir: PathBuf,
}

impl JsonFileDatafeed {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_path(&self, req: &BarRequest) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", req.symbol.to_uppercase(), req.timeframe.value()))
    }
}

#[async_trait]
impl BaseDatafeed for JsonFileDatafeed {
    fn name(&self) -> &str {
        "json"
    }

    async fn init(&self) -> Result<bool, DatafeedError> {
        Ok(tokio::fs::metadata(&self.dir).await.map(|m| m.is_dir()).unwrap_or(false))
    }

    async fn query_bar_history(&self, req: &BarRequest) -> Result<Vec<Bar>, DatafeedError> {
        let path = self.file_path(req);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DatafeedError::Unavailable(format!("{} not found", path.display())));
            }
            Err(e) => return Err(e.into()),
        };

        let mut bars: Vec<Bar> = serde_json::from_str(&content)?;
        bars.sort_by_key(|bar| bar.timestamp);
        bars.dedup_by_key(|bar| bar.timestamp);
        Ok(bars)
    }
}

/// Default number of (symbol, timeframe) entries kept by [`CachedDatafeed`]
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

type CacheKey = (String, Timeframe);

/// Wraps a datafeed with per-request TTL caching.
pub struct CachedDatafeed {
    inner: Box<dyn BaseDatafeed>,
    ttl: Duration,
    entries: Mutex<LruCache<CacheKey, TtlCache<Vec<Bar>>>>,
}

impl CachedDatafeed {
    pub fn new(inner: Box<dyn BaseDatafeed>, ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn cached(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Vec<Bar>> {
        let mut entries = self.entries.lock().ok()?;
        entries.get(key).and_then(|entry| entry.get(now)).cloned()
    }

    fn remember(&self, key: CacheKey, bars: Vec<Bar>, now: DateTime<Utc>) {
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries
                .get_or_insert_mut(key, || TtlCache::new(ttl))
                .store(bars, now);
        }
    }
}

#[async_trait]
impl BaseDatafeed for CachedDatafeed {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn init(&self) -> Result<bool, DatafeedError> {
        self.inner.init().await
    }

    async fn query_bar_history(&self, req: &BarRequest) -> Result<Vec<Bar>, DatafeedError> {
        let key = (req.symbol.clone(), req.timeframe);
        if let Some(bars) = self.cached(&key, Utc::now()) {
            tracing::debug!(symbol = %req.symbol, timeframe = %req.timeframe, "bars served from cache");
            return Ok(bars);
        }

        let bars = self.inner.query_bar_history(req).await?;
        self.remember(key, bars.clone(), Utc::now());
        Ok(bars)
    }
}
