use super::*;

fn coord(col: i64) -> TileCoord {
    TileCoord::from_cell(col, 0, 10, 0)
}

fn bitmap(byte: u8) -> Bitmap {
    Bitmap::from(vec![byte])
}

#[test]
fn take_returns_revision_and_pixels_once() {
    let mut cache = ContentCache::new(4);
    cache.insert(coord(0), 9, bitmap(1));
    let (wid, pixels) = cache.take(&coord(0)).expect("entry");
    assert_eq!(wid, 9);
    assert_eq!(pixels.as_ref(), &[1u8][..]);
    assert!(cache.take(&coord(0)).is_none());
}

#[test]
fn oldest_entry_is_evicted_past_capacity() {
    let mut cache = ContentCache::new(2);
    cache.insert(coord(0), 1, bitmap(0));
    cache.insert(coord(1), 1, bitmap(1));
    cache.insert(coord(2), 1, bitmap(2));
    assert_eq!(cache.len(), 2);
    assert!(cache.take(&coord(0)).is_none());
    assert!(cache.take(&coord(2)).is_some());
}

#[test]
fn reinsert_refreshes_position() {
    let mut cache = ContentCache::new(2);
    cache.insert(coord(0), 1, bitmap(0));
    cache.insert(coord(1), 1, bitmap(1));
    cache.insert(coord(0), 2, bitmap(9));
    cache.insert(coord(2), 1, bitmap(2));
    assert!(cache.take(&coord(1)).is_none());
    assert_eq!(cache.take(&coord(0)).expect("kept").0, 2);
}

#[test]
fn zero_capacity_stores_nothing() {
    let mut cache = ContentCache::new(0);
    cache.insert(coord(0), 1, bitmap(0));
    assert!(cache.is_empty());
}

#[test]
fn clear_drops_every_entry() {
    let mut cache = ContentCache::new(3);
    cache.insert(coord(0), 1, bitmap(0));
    cache.insert(coord(1), 1, bitmap(1));
    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.take(&coord(1)).is_none());
}
