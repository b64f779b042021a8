//! Tests for transcode errors

use super::*;

#[test]
fn test_display() {
    let err = TranscodeError::unknown_field("sf.bogus");
    assert_eq!(err.to_string(), "unknown field path 'sf.bogus'");

    let err = TranscodeError::kind_mismatch("sf.ts", FieldKind::Int, FieldKind::Str);
    assert_eq!(err.to_string(), "field 'sf.ts' expects int value, got string");

    let err = TranscodeError::UnknownShape("xml".into());
    assert!(err.to_string().contains("flat, structured, ecs"));
}

#[test]
fn test_from_protocol_error() {
    let err: TranscodeError = ProtocolError::unknown_field("sf.x").into();
    assert!(matches!(err, TranscodeError::UnknownField(p) if p == "sf.x"));

    let err: TranscodeError =
        ProtocolError::kind_mismatch("sf.ret", FieldKind::Int, FieldKind::Bool).into();
    assert!(matches!(err, TranscodeError::KindMismatch { .. }));
}
