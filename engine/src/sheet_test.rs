use super::*;

fn axis(spans: &[(i64, i64)]) -> DimensionData {
    DimensionData {
        sizes: Some(spans.iter().map(|&(size, last)| SizeSpan { size, last }).collect()),
        ..DimensionData::default()
    }
}

/// 1024 columns of 1280 twips, a million rows of 256.
fn uniform() -> SheetGeometry {
    let mut sheet = SheetGeometry::new(0);
    sheet.update(
        &SheetGeometryData {
            columns: Some(axis(&[(1280, 1023)])),
            rows: Some(axis(&[(256, 1_048_575)])),
            ..SheetGeometryData::default()
        },
        0,
    );
    sheet
}

#[test]
fn unknown_geometry_leaves_rectangles_alone() {
    let rect = Rect::new(1280, 256, 1279, 255);
    assert_eq!(SheetGeometry::new(0).area_to_tile(&rect, 10), rect);
    assert!(!SheetGeometry::new(0).is_complete());
}

#[test]
fn cell_snaps_to_whole_core_pixels() {
    let sheet = uniform();
    assert!(sheet.is_complete());
    // 1280 twips is 85 core pixels at 15 twips each; 256 twips is 17.
    assert_eq!(sheet.area_to_tile(&Rect::new(1280, 256, 1279, 255), 10), Rect::new(1275, 255, 1275, 255));
}

#[test]
fn projection_follows_zoom() {
    let sheet = uniform();
    // 12.5 twips per core pixel: 102 pixels a column, 20 a row.
    assert_eq!(sheet.area_to_tile(&Rect::new(1280, 256, 1279, 255), 11), Rect::new(1275, 250, 1275, 250));
}

#[test]
fn empty_range_is_one_core_pixel() {
    assert_eq!(uniform().area_to_tile(&Rect::new(1280, 256, 0, 0), 10), Rect::new(1275, 255, 15, 15));
}

#[test]
fn point_keeps_offset_inside_cell() {
    assert_eq!(uniform().point_to_tile(1300, 300, 10), (1295, 299));
}

#[test]
fn hidden_columns_take_no_space() {
    let mut sheet = SheetGeometry::new(0);
    let mut columns = axis(&[(1000, 0), (2000, 1), (1280, 1023)]);
    sheet.update(
        &SheetGeometryData { columns: Some(columns.clone()), rows: Some(axis(&[(256, 99)])), ..SheetGeometryData::default() },
        0,
    );
    let rect = Rect::new(1000, 0, 1279, 255);
    assert_eq!(sheet.area_to_tile(&rect, 10), Rect::new(990, 0, 1995, 255));

    columns.sizes = None;
    columns.hidden = Some(FlagSpans { start: false, ends: vec![0, 1, 1023] });
    sheet.update(&SheetGeometryData { columns: Some(columns), ..SheetGeometryData::default() }, 0);
    assert_eq!(sheet.area_to_tile(&rect, 10), Rect::new(990, 0, 1275, 255));
}

#[test]
fn positions_past_the_sheet_clamp_to_the_last_element() {
    let mut sheet = uniform();
    assert_eq!(sheet.area_to_tile(&Rect::new(5_000_000, 0, 10, 10), 10).x, 1023 * 1275);

    sheet.update(&SheetGeometryData { max_column: Some(99), ..SheetGeometryData::default() }, 0);
    assert_eq!(sheet.area_to_tile(&Rect::new(5_000_000, 0, 10, 10), 10).x, 99 * 1275);
}

#[test]
fn another_sheet_starts_from_scratch() {
    let mut sheet = uniform();
    sheet.update(&SheetGeometryData { rows: Some(axis(&[(256, 99)])), ..SheetGeometryData::default() }, 1);
    assert_eq!(sheet.part(), 1);
    assert!(!sheet.is_complete());
}
