use super::*;

fn loaded_tile() -> Tile {
    let mut tile = Tile::new(TileCoord::new(0, 0, 10, 0));
    tile.bitmap = Some(Bitmap::from(vec![1, 2, 3]));
    tile.loaded = Some(5);
    tile.wire_id = 4;
    tile
}

#[test]
fn key_joins_fields_with_colons() {
    assert_eq!(TileCoord::new(256, 512, 10, 2).key(), "256:512:10:2");
}

#[test]
fn cell_and_pixel_forms_agree() {
    let coord = TileCoord::from_cell(3, 7, 10, 0);
    assert_eq!(coord.left, 768);
    assert_eq!(coord.top, 1792);
    assert_eq!(coord.col(), 3);
    assert_eq!(coord.row(), 7);
}

#[test]
fn from_twips_maps_tile_origin_to_cell() {
    let coord = TileCoord::from_twips(7680, 3840, 3840, 10, 1);
    assert_eq!(coord, TileCoord::new(512, 256, 10, 1));
}

#[test]
fn from_twips_saturates_at_the_far_edge() {
    let coord = TileCoord::from_twips(i64::MAX, 0, 3840, 10, 0);
    assert_eq!(coord.col(), i64::MAX / 3840);
    assert_eq!(coord.row(), 0);
}

#[test]
fn twips_rect_uses_zoom_tile_size() {
    assert_eq!(TileCoord::new(256, 0, 10, 0).twips_rect(), Rect::new(3840, 0, 3840, 3840));
    assert_eq!(TileCoord::new(256, 0, 11, 0).twips_rect(), Rect::new(3200, 0, 3200, 3200));
}

#[test]
fn new_tile_needs_fetch() {
    let tile = Tile::new(TileCoord::new(0, 0, 10, 0));
    assert!(!tile.is_ready());
    assert!(tile.needs_fetch(0, 5000));
}

#[test]
fn ready_tile_never_needs_fetch() {
    let tile = loaded_tile();
    assert!(tile.is_ready());
    assert!(!tile.needs_fetch(100_000, 5000));
}

#[test]
fn in_flight_request_suppresses_refetch_until_retry() {
    let mut tile = Tile::new(TileCoord::new(0, 0, 10, 0));
    tile.in_flight = Some(InFlight { requested_at: 1000, covers_invalid: 0 });
    assert!(!tile.needs_fetch(2000, 5000));
    assert!(tile.needs_fetch(6000, 5000));
}

#[test]
fn invalidation_after_request_needs_another_fetch() {
    let mut tile = loaded_tile();
    tile.invalid_count = 1;
    tile.in_flight = Some(InFlight { requested_at: 0, covers_invalid: 1 });
    assert!(!tile.needs_fetch(10, 5000));
    tile.invalid_count = 2;
    assert!(tile.needs_fetch(10, 5000));
}
