//! Bounded store of bitmaps for evicted tiles.
//!
//! When a part is revisited the entry seeds a fresh tile and its revision is
//! sent as `oldwid`, letting the kernel answer "unchanged" without pixels.
//! Eviction is least-recently-stored first; a tile re-evicted with new
//! content moves to the back.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::tile::{Bitmap, TileCoord};

#[cfg(test)]
#[path = "content_test.rs"]
mod content_test;

/// `None` when configured with zero capacity.
pub struct ContentCache {
    entries: Option<LruCache<TileCoord, (u64, Bitmap)>>,
}

impl ContentCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { entries: NonZeroUsize::new(capacity).map(LruCache::new) }
    }

    pub fn insert(&mut self, coord: TileCoord, wire_id: u64, bitmap: Bitmap) {
        if let Some(entries) = self.entries.as_mut() {
            entries.put(coord, (wire_id, bitmap));
        }
    }

    /// Remove and return the entry for `coord`.
    pub fn take(&mut self, coord: &TileCoord) -> Option<(u64, Bitmap)> {
        self.entries.as_mut()?.pop(coord)
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
