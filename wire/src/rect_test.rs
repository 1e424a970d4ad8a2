use super::*;

#[test]
fn parse_reads_four_integers() {
    let rect = Rect::parse("1418, 1701, 12, 276").expect("rect");
    assert_eq!(rect, Rect::new(1418, 1701, 12, 276));
    assert_eq!(rect.right(), 1430);
    assert_eq!(rect.bottom(), 1977);
}

#[test]
fn parse_tolerates_missing_spaces() {
    assert_eq!(Rect::parse("1,2,3,4").expect("rect"), Rect::new(1, 2, 3, 4));
}

#[test]
fn parse_rejects_wrong_arity() {
    assert!(matches!(Rect::parse("1, 2, 3"), Err(ParseError::BadRectangle(_))));
    assert!(matches!(Rect::parse("1, 2, 3, 4, 5"), Err(ParseError::BadRectangle(_))));
}

#[test]
fn parse_rejects_non_numeric() {
    assert!(matches!(Rect::parse("a, b, c, d"), Err(ParseError::BadRectangle(_))));
}

#[test]
fn parse_list_splits_on_semicolon() {
    let rects = Rect::parse_list("0, 0, 100, 20; 0, 20, 50, 20").expect("list");
    assert_eq!(rects, vec![Rect::new(0, 0, 100, 20), Rect::new(0, 20, 50, 20)]);
}

#[test]
fn parse_list_empty_forms() {
    assert!(Rect::parse_list("").expect("list").is_empty());
    assert!(Rect::parse_list("EMPTY").expect("list").is_empty());
    assert!(Rect::parse_list("  ").expect("list").is_empty());
}

#[test]
fn parse_list_fails_on_one_bad_entry() {
    assert!(Rect::parse_list("0, 0, 1, 1; garbage").is_err());
}

#[test]
fn zero_rect_is_empty_but_caret_is_not() {
    assert!(Rect::new(0, 0, 0, 0).is_empty());
    assert!(!Rect::new(500, 500, 0, 276).is_empty());
}

#[test]
fn only_the_all_zero_rect_is_empty() {
    assert!(!Rect::new(0, 0, -5, -5).is_empty());
    assert!(!Rect::new(100, 200, 0, 0).is_empty());
}

#[test]
fn parse_rejects_coordinates_past_the_twips_bound() {
    assert!(Rect::parse("0, 0, 9223372036854775807, 10").is_err());
    assert!(Rect::parse("-9223372036854775808, 0, 1, 1").is_err());
    assert!(Rect::parse(&format!("{}, 0, 1, 1", MAX_TWIPS + 1)).is_err());
    assert!(Rect::parse(&format!("{MAX_TWIPS}, 0, {MAX_TWIPS}, 1")).is_ok());
}

#[test]
fn right_and_bottom_saturate() {
    let huge = Rect::new(10, i64::MAX - 1, i64::MAX, 100);
    assert_eq!(huge.right(), i64::MAX);
    assert_eq!(huge.bottom(), i64::MAX);
    assert!(huge.intersects(&Rect::new(20, i64::MAX - 1, 1, 1)));
}

#[test]
fn intersects_is_half_open() {
    let a = Rect::new(0, 0, 100, 100);
    assert!(a.intersects(&Rect::new(50, 50, 100, 100)));
    assert!(!a.intersects(&Rect::new(100, 0, 10, 10)));
    assert!(!a.intersects(&Rect::new(0, 100, 10, 10)));
}

#[test]
fn graphic_selection_with_angle_and_handles() {
    let sel = GraphicSelection::parse(r#"1000, 2000, 300, 400, 9000, {"id":"shape"}"#)
        .expect("parse")
        .expect("some");
    assert_eq!(sel.rect, Rect::new(1000, 2000, 300, 400));
    assert_eq!(sel.angle, Some(9000));
}

#[test]
fn graphic_selection_plain_rect() {
    let sel = GraphicSelection::parse("1, 2, 3, 4").expect("parse").expect("some");
    assert_eq!(sel.angle, None);
}

#[test]
fn graphic_selection_empty() {
    assert!(GraphicSelection::parse("EMPTY").expect("parse").is_none());
    assert!(GraphicSelection::parse("").expect("parse").is_none());
}

#[test]
fn point_needs_two_integers() {
    assert_eq!(parse_point("1280, 256").expect("point"), (1280, 256));
    assert!(parse_point("1, 2, 3").is_err());
}
