use super::*;

#[test]
fn parse_text_splits_kind_and_payload() {
    let msg = Inbound::parse_text("cursorvisible: true").expect("parse");
    assert_eq!(msg.kind, "cursorvisible");
    assert_eq!(msg.payload, "true");
    assert!(msg.attachment.is_none());
}

#[test]
fn parse_text_accepts_kind_without_colon() {
    let msg = Inbound::parse_text("tilecombine part=0 width=256").expect("parse");
    assert_eq!(msg.kind, "tilecombine");
    assert_eq!(msg.payload, "part=0 width=256");
}

#[test]
fn parse_text_keeps_json_body_intact() {
    let msg = Inbound::parse_text(r#"viewinfo: [{"id":1,"username":"Ada"}]"#).expect("parse");
    assert_eq!(msg.kind, "viewinfo");
    assert!(msg.is_json());
    let value: serde_json::Value = msg.json().expect("json");
    assert_eq!(value[0]["username"], "Ada");
}

#[test]
fn parse_text_with_empty_payload() {
    let msg = Inbound::parse_text("textselection:").expect("parse");
    assert_eq!(msg.kind, "textselection");
    assert_eq!(msg.payload, "");
    assert_eq!(msg.raw(), "textselection:");
}

#[test]
fn parse_text_rejects_blank_message() {
    let err = Inbound::parse_text("   ").expect_err("blank should fail");
    assert!(matches!(err, ParseError::MissingType));
}

#[test]
fn parse_binary_splits_header_and_attachment() {
    let mut frame = b"tile: part=0 tileposx=0 wid=3\n".to_vec();
    frame.extend_from_slice(&[0x89, b'P', b'N', b'G']);
    let msg = Inbound::parse_binary(&frame).expect("parse");
    assert_eq!(msg.kind, "tile");
    assert_eq!(msg.payload, "part=0 tileposx=0 wid=3");
    assert_eq!(msg.attachment.as_deref(), Some(&[0x89, b'P', b'N', b'G'][..]));
}

#[test]
fn parse_binary_without_body_has_no_attachment() {
    let msg = Inbound::parse_binary(b"tile: part=0 wid=3\n").expect("parse");
    assert!(msg.attachment.is_none());
    let msg = Inbound::parse_binary(b"tile: part=0 wid=3").expect("parse");
    assert!(msg.attachment.is_none());
}

#[test]
fn parse_binary_rejects_non_utf8_header() {
    let err = Inbound::parse_binary(&[0xff, 0xfe, b'\n', 1]).expect_err("bad header");
    assert!(matches!(err, ParseError::BadHeader));
}

#[test]
fn raw_reassembles_header_line() {
    let msg = Inbound::new("textselection", "0, 0, 10, 10");
    assert_eq!(msg.raw(), "textselection: 0, 0, 10, 10");
    let reparsed = Inbound::parse_text(&msg.raw()).expect("parse");
    assert_eq!(reparsed, msg);
}

#[test]
fn json_reports_malformed_body() {
    let msg = Inbound::new("invalidatecursor", "{not json");
    let err = msg.json::<serde_json::Value>().expect_err("should fail");
    assert!(matches!(err, ParseError::Json(_)));
}
