use super::*;

const IDLE: u64 = 750;
const INTERVAL: u64 = 250;

fn pane(range: TileRange) -> PrefetchPane {
    PrefetchPane { range, x_fixed: false, y_fixed: false }
}

fn view(panes: Vec<PrefetchPane>, limit: TileRange, view_tiles: i64, editing: bool) -> PrefetchView {
    PrefetchView { zoom: 10, part: 0, panes, editing, limit: Some(limit), view_tiles }
}

fn armed() -> Prefetcher {
    let mut prefetcher = Prefetcher::new(IDLE, INTERVAL);
    prefetcher.reset(0);
    prefetcher
}

fn cells(coords: &[TileCoord]) -> Vec<(i64, i64)> {
    coords.iter().map(|c| (c.col(), c.row())).collect()
}

// =============================================================================
// Timing
// =============================================================================

#[test]
fn waits_for_idle_debounce() {
    let mut prefetcher = armed();
    let v = view(vec![pane(TileRange::new(5, 5, 6, 6))], TileRange::new(0, 0, 19, 19), 4, false);
    assert!(prefetcher.tick(IDLE - 1, &v, |_| true, false).is_empty());
    assert_eq!(prefetcher.tick(IDLE, &v, |_| true, false).len(), 4);
}

#[test]
fn runs_at_most_once_per_interval() {
    let mut prefetcher = armed();
    let v = view(vec![pane(TileRange::new(5, 5, 6, 6))], TileRange::new(0, 0, 19, 19), 4, false);
    prefetcher.tick(IDLE, &v, |_| true, false);
    assert!(prefetcher.tick(IDLE + INTERVAL - 1, &v, |_| true, false).is_empty());
    assert!(!prefetcher.tick(IDLE + INTERVAL, &v, |_| true, false).is_empty());
}

#[test]
fn never_armed_prefetcher_is_dormant() {
    let mut prefetcher = Prefetcher::new(IDLE, INTERVAL);
    let v = view(vec![pane(TileRange::new(0, 0, 1, 1))], TileRange::new(0, 0, 9, 9), 4, false);
    assert!(prefetcher.is_dormant());
    assert!(prefetcher.tick(10_000, &v, |_| true, false).is_empty());
}

#[test]
fn foreground_work_defers_prefetch() {
    let mut prefetcher = armed();
    let v = view(vec![pane(TileRange::new(5, 5, 6, 6))], TileRange::new(0, 0, 19, 19), 4, false);
    assert!(prefetcher.tick(IDLE, &v, |_| true, true).is_empty());
    assert!(!prefetcher.is_dormant());
}

// =============================================================================
// Rings
// =============================================================================

#[test]
fn first_ring_surrounds_the_visible_range() {
    let mut prefetcher = armed();
    let visible = TileRange::new(5, 5, 6, 6);
    let v = view(vec![pane(visible)], TileRange::new(0, 0, 19, 19), 4, false);
    let ring = TileRange::new(4, 4, 7, 7);
    for (col, row) in cells(&prefetcher.tick(IDLE, &v, |_| true, false)) {
        assert!(ring.contains(col, row));
        assert!(!visible.contains(col, row));
    }
}

#[test]
fn editing_uses_smaller_budget() {
    let mut prefetcher = armed();
    let v = view(vec![pane(TileRange::new(5, 5, 6, 6))], TileRange::new(0, 0, 19, 19), 4, true);
    assert_eq!(prefetcher.tick(IDLE, &v, |_| true, false).len(), 1);
}

#[test]
fn already_fetched_tiles_are_skipped() {
    let mut prefetcher = armed();
    let v = view(vec![pane(TileRange::new(5, 5, 6, 6))], TileRange::new(0, 0, 19, 19), 4, false);
    let first = prefetcher.tick(IDLE, &v, |_| true, false);
    let second = prefetcher.tick(IDLE + INTERVAL, &v, |c| !first.contains(c), false);
    assert!(!second.is_empty());
    assert!(second.iter().all(|c| !first.contains(c)));
}

#[test]
fn fixed_axis_does_not_expand() {
    let mut prefetcher = armed();
    let fixed = PrefetchPane { range: TileRange::new(5, 0, 6, 1), x_fixed: false, y_fixed: true };
    let v = view(vec![fixed], TileRange::new(0, 0, 19, 19), 40, false);
    let coords = prefetcher.tick(IDLE, &v, |_| true, false);
    assert!(!coords.is_empty());
    assert!(coords.iter().all(|c| (0..=1).contains(&c.row())));
}

#[test]
fn fully_fixed_pane_is_skipped() {
    let mut prefetcher = armed();
    let frozen = PrefetchPane { range: TileRange::new(0, 0, 1, 1), x_fixed: true, y_fixed: true };
    let v = view(vec![frozen], TileRange::new(0, 0, 19, 19), 40, false);
    assert!(prefetcher.tick(IDLE, &v, |_| true, false).is_empty());
    assert!(prefetcher.is_dormant());
}

// =============================================================================
// Dormancy
// =============================================================================

#[test]
fn small_document_is_fetched_then_dormant() {
    let mut prefetcher = armed();
    let v = view(vec![pane(TileRange::new(1, 1, 2, 2))], TileRange::new(0, 0, 3, 3), 400, false);
    let coords = prefetcher.tick(IDLE, &v, |_| true, false);
    assert_eq!(coords.len(), 12);
    assert!(prefetcher.is_dormant());
}

#[test]
fn nothing_to_fetch_goes_dormant_until_reset() {
    let mut prefetcher = armed();
    let whole = TileRange::new(0, 0, 1, 1);
    let v = view(vec![pane(whole)], whole, 4, false);
    assert!(prefetcher.tick(IDLE, &v, |_| true, false).is_empty());
    assert!(prefetcher.is_dormant());
    assert!(prefetcher.tick(IDLE * 4, &v, |_| true, false).is_empty());

    prefetcher.reset(IDLE * 4);
    assert!(!prefetcher.is_dormant());
}

#[test]
fn unknown_document_size_disables_prefetch() {
    let mut prefetcher = armed();
    let mut v = view(vec![pane(TileRange::new(0, 0, 1, 1))], TileRange::new(0, 0, 9, 9), 4, false);
    v.limit = None;
    assert!(prefetcher.tick(IDLE, &v, |_| true, false).is_empty());
    assert!(prefetcher.is_dormant());
}
