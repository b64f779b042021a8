//! Tests for records and context

use crate::{
    Context, EnrichmentTag, FieldKind, FieldValue, Hashes, ProtocolError, Record, Rule, field,
};

#[test]
fn test_missing_fields_read_as_zero() {
    let record = Record::new();
    assert_eq!(record.int(field::TS), 0);
    assert_eq!(record.str(field::NODE_ID), "");
    assert!(!record.bool("sf.container.privileged"));
    assert!(record.is_empty());
}

#[test]
fn test_builder_and_accessors() {
    let record = Record::new()
        .with(field::TYPE, "PE")
        .with(field::TS, 1_700_000_000_000i64)
        .with("sf.proc.tty", true);

    assert_eq!(record.len(), 3);
    assert_eq!(record.str(field::TYPE), "PE");
    assert_eq!(record.int(field::TS), 1_700_000_000_000);
    assert!(record.bool("sf.proc.tty"));
}

#[test]
fn test_set_unchecked_accepts_anything() {
    let mut record = Record::new();
    assert!(record.set("sf.proc.bogus", 1i64).is_none());
    assert_eq!(record.set("sf.proc.bogus", 2i64), Some(FieldValue::Int(1)));
}

#[test]
fn test_set_checked_rejects_unknown_path() {
    let mut record = Record::new();
    let err = record.set_checked("sf.proc.bogus", 1i64).unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownField(p) if p == "sf.proc.bogus"));
}

#[test]
fn test_set_checked_rejects_wrong_kind() {
    let mut record = Record::new();
    let err = record.set_checked(field::TS, "yesterday").unwrap_err();
    match err {
        ProtocolError::KindMismatch { path, expected, found } => {
            assert_eq!(path, field::TS);
            assert_eq!(expected, FieldKind::Int);
            assert_eq!(found, FieldKind::Str);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(record.is_empty());
}

#[test]
fn test_field_value_zero_and_json() {
    assert!(FieldValue::zero(FieldKind::Int).is_zero());
    assert!(FieldValue::zero(FieldKind::Str).is_zero());
    assert!(FieldValue::zero(FieldKind::Bool).is_zero());
    assert!(!FieldValue::from(7i64).is_zero());

    assert_eq!(FieldValue::from(7i64).to_json(), serde_json::json!(7));
    assert_eq!(FieldValue::from("x").to_json(), serde_json::json!("x"));
    assert_eq!(FieldValue::from(true).to_json(), serde_json::json!(true));
}

#[test]
fn test_context_deserialize() {
    let json = r#"{
        "hashes": {"md5": "abc"},
        "rules": [
            {"name": "r1", "desc": "suspicious exec", "priority": 2, "tags": ["mitre:T1059", ["a", "b"], 5]}
        ]
    }"#;
    let ctx: Context = serde_json::from_str(json).unwrap();
    assert_eq!(ctx.hashes().md5, "abc");
    assert!(!ctx.hashes().is_empty());
    assert_eq!(ctx.rules().len(), 1);
    assert_eq!(
        ctx.rules()[0].tags,
        vec![
            EnrichmentTag::Str("mitre:T1059".into()),
            EnrichmentTag::List(vec!["a".into(), "b".into()]),
            EnrichmentTag::Int(5),
        ]
    );
}

#[test]
fn test_context_mutation() {
    let mut record = Record::new();
    record.context_mut().add_rule(Rule::new("r").with_priority(1).with_tag("t"));
    record.context_mut().set_hashes(Hashes {
        sha256: "ff".into(),
        ..Hashes::default()
    });

    assert_eq!(record.context().rules()[0].name, "r");
    assert_eq!(record.context().hashes().sha256, "ff");
}

#[test]
fn test_hashes_serialize_skips_empty() {
    let hashes = Hashes {
        md5: "m".into(),
        ..Hashes::default()
    };
    assert_eq!(serde_json::to_string(&hashes).unwrap(), r#"{"md5":"m"}"#);
}
