//! Engine tunables, loaded from environment variables with fixed defaults.

use crate::cache::CacheConfig;

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_PREFETCH_IDLE_MS: u64 = 750;
pub const DEFAULT_PREFETCH_INTERVAL_MS: u64 = 250;
pub const DEFAULT_FINISH_POLLS: u32 = 30;
pub const DEFAULT_CONTENT_CACHE_CAPACITY: usize = 512;
pub const DEFAULT_TILE_RETRY_MS: u64 = 5000;
pub const DEFAULT_RETAIN_MARGIN: i64 = 40;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Device pixels per CSS pixel.
    pub dpi_scale: f64,
    /// Quiet period after a view change before prefetching starts.
    pub prefetch_idle_ms: u64,
    /// Spacing between prefetch passes.
    pub prefetch_interval_ms: u64,
    /// Polls of the finishing zoom phase before giving up on target tiles.
    pub finish_polls: u32,
    /// Evicted bitmaps kept for revisits.
    pub content_cache_capacity: usize,
    /// Age after which an unanswered tile request is re-issued.
    pub tile_retry_ms: u64,
    /// Tiles around the viewport that stay current.
    pub retain_margin: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dpi_scale: 1.0,
            prefetch_idle_ms: DEFAULT_PREFETCH_IDLE_MS,
            prefetch_interval_ms: DEFAULT_PREFETCH_INTERVAL_MS,
            finish_polls: DEFAULT_FINISH_POLLS,
            content_cache_capacity: DEFAULT_CONTENT_CACHE_CAPACITY,
            tile_retry_ms: DEFAULT_TILE_RETRY_MS,
            retain_margin: DEFAULT_RETAIN_MARGIN,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            dpi_scale: 1.0,
            prefetch_idle_ms: env_parse("MOSAIC_PREFETCH_IDLE_MS", DEFAULT_PREFETCH_IDLE_MS),
            prefetch_interval_ms: env_parse("MOSAIC_PREFETCH_INTERVAL_MS", DEFAULT_PREFETCH_INTERVAL_MS),
            finish_polls: env_parse("MOSAIC_FINISH_POLLS", DEFAULT_FINISH_POLLS),
            content_cache_capacity: env_parse("MOSAIC_CONTENT_CACHE_CAPACITY", DEFAULT_CONTENT_CACHE_CAPACITY),
            tile_retry_ms: env_parse("MOSAIC_TILE_RETRY_MS", DEFAULT_TILE_RETRY_MS),
            retain_margin: DEFAULT_RETAIN_MARGIN,
        }
    }

    #[must_use]
    pub fn with_dpi_scale(mut self, dpi_scale: f64) -> Self {
        if dpi_scale > 0.0 {
            self.dpi_scale = dpi_scale;
        }
        self
    }

    #[must_use]
    pub fn cache(&self) -> CacheConfig {
        CacheConfig {
            retry_ms: self.tile_retry_ms,
            retain_margin: self.retain_margin,
            content_capacity: self.content_cache_capacity,
        }
    }
}

/// Parse `key` from the environment, falling back to `default` when unset or
/// malformed.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key).map_or(default, |value| value.trim().parse::<T>().unwrap_or(default))
}
