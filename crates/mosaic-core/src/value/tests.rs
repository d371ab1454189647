use crate::value::{CoerceError, Value, ValueKind};
use serde_json::json;

#[test]
fn coerce_accepts_matching_kinds() {
    assert_eq!(
        ValueKind::Text.coerce(&json!("Hello")).unwrap(),
        Value::Text("Hello".into())
    );
    assert_eq!(ValueKind::Int.coerce(&json!(-3)).unwrap(), Value::Int(-3));
    assert_eq!(ValueKind::Uint.coerce(&json!(7)).unwrap(), Value::Uint(7));
    assert_eq!(
        ValueKind::Bool.coerce(&json!(true)).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        ValueKind::Float64.coerce(&json!(1.5)).unwrap(),
        Value::Float64(1.5)
    );
}

#[test]
fn coerce_rejects_kind_mismatch() {
    assert!(matches!(
        ValueKind::Int.coerce(&json!("three")),
        Err(CoerceError::KindMismatch { .. })
    ));
    assert!(matches!(
        ValueKind::Uint.coerce(&json!(-1)),
        Err(CoerceError::OutOfRange { .. })
    ));
}

#[test]
fn coerce_timestamp_from_epoch_and_rfc3339() {
    assert_eq!(
        ValueKind::Timestamp.coerce(&json!(1700000000)).unwrap(),
        Value::Timestamp(1_700_000_000)
    );

    let ts = ValueKind::Timestamp
        .coerce(&json!("2021-02-01T20:10:46Z"))
        .unwrap();
    assert_eq!(ts, Value::Timestamp(1_612_210_246));

    assert!(matches!(
        ValueKind::Timestamp.coerce(&json!("yesterday")),
        Err(CoerceError::BadTimestamp)
    ));
}

#[test]
fn value_kind_projection_is_stable() {
    assert_eq!(Value::Text(String::new()).kind(), ValueKind::Text);
    assert_eq!(Value::Timestamp(0).kind(), ValueKind::Timestamp);
}

#[test]
fn to_json_round_trips_scalars() {
    assert_eq!(Value::Int(-9).to_json(), json!(-9));
    assert_eq!(Value::Text("a".into()).to_json(), json!("a"));
    assert_eq!(Value::Bool(false).to_json(), json!(false));
}
