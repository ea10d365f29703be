use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use super::snapshot::{FieldValue, Snapshot};

/// Wire payloads carry `{"v": <version>, "data": {...}}`.
pub const SCHEMA_VERSION: u64 = 1;

/// Tolerance category assigned to a field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// Never smoothed away: any inequality is a real change.
    Critical,
    /// Standard numeric dead band.
    Regular,
    /// Noisy continuous scores (model output); wide dead band.
    HighTolerance,
}

/// Fields that must never be absorbed by a tolerance band.
const CRITICAL_FIELDS: &[&str] = &[
    "position_side",
    "position_size",
    "realized_pnl",
    "strategy_mode",
    "kill_switch",
];

/// Probabilistic model output; small oscillations are noise.
const HIGH_TOLERANCE_FIELDS: &[&str] = &[
    "model_confidence",
    "long_probability",
    "short_probability",
    "signal_strength",
];

pub fn class_of(field: &str) -> FieldClass {
    if CRITICAL_FIELDS.contains(&field) {
        FieldClass::Critical
    } else if HIGH_TOLERANCE_FIELDS.contains(&field) {
        FieldClass::HighTolerance
    } else {
        FieldClass::Regular
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("unsupported schema version {0}")]
    BadVersion(u64),

    #[error("payload has no data object")]
    MissingData,

    #[error("field `{field}` has unsupported type")]
    BadFieldType { field: String },

    #[error("numeric field `{field}` could not be parsed: {raw}")]
    BadNumber { field: String, raw: String },

    #[error("snapshot carried no fields")]
    Empty,
}

/// Ingress validation boundary. A payload either converts in full or is
/// rejected in full; the applied state is never touched by a bad payload.
pub fn validate(payload: &Value) -> Result<Snapshot, SnapshotError> {
    let obj = payload.as_object().ok_or(SnapshotError::NotAnObject)?;

    let version = obj
        .get("v")
        .and_then(Value::as_u64)
        .unwrap_or(SCHEMA_VERSION);
    if version != SCHEMA_VERSION {
        return Err(SnapshotError::BadVersion(version));
    }

    let data = obj
        .get("data")
        .and_then(Value::as_object)
        .ok_or(SnapshotError::MissingData)?;

    let mut snapshot = Snapshot::default();
    for (name, value) in data {
        let field = match value {
            Value::Number(n) => {
                // go through the decimal string form, not f64
                let raw = n.to_string();
                let parsed: Decimal =
                    raw.parse().map_err(|_| SnapshotError::BadNumber {
                        field: name.clone(),
                        raw,
                    })?;
                FieldValue::Number(parsed)
            }
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Bool(b) => FieldValue::Flag(*b),
            _ => {
                return Err(SnapshotError::BadFieldType {
                    field: name.clone(),
                })
            }
        };
        snapshot.fields.insert(name.clone(), field);
    }

    if snapshot.is_empty() {
        return Err(SnapshotError::Empty);
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn valid_payload_converts() {
        let payload = json!({
            "v": 1,
            "data": {
                "price": 104250.5,
                "position_side": "Long",
                "kill_switch": false,
            }
        });

        let snap = validate(&payload).unwrap();
        assert_eq!(
            snap.get("price"),
            Some(&FieldValue::Number(dec!(104250.5)))
        );
        assert_eq!(
            snap.get("position_side"),
            Some(&FieldValue::Text("Long".into()))
        );
        assert_eq!(snap.get("kill_switch"), Some(&FieldValue::Flag(false)));
    }

    #[test]
    fn missing_version_defaults_to_current() {
        let payload = json!({ "data": { "price": 1 } });
        assert!(validate(&payload).is_ok());
    }

    #[test]
    fn wrong_version_rejected() {
        let payload = json!({ "v": 7, "data": { "price": 1 } });
        assert!(matches!(
            validate(&payload),
            Err(SnapshotError::BadVersion(7))
        ));
    }

    #[test]
    fn nested_value_rejects_whole_payload() {
        let payload = json!({
            "v": 1,
            "data": {
                "price": 100,
                "book": { "bids": [] },
            }
        });
        assert!(matches!(
            validate(&payload),
            Err(SnapshotError::BadFieldType { .. })
        ));
    }

    #[test]
    fn empty_data_rejected() {
        let payload = json!({ "v": 1, "data": {} });
        assert!(matches!(validate(&payload), Err(SnapshotError::Empty)));
    }

    #[test]
    fn class_catalog() {
        assert_eq!(class_of("position_side"), FieldClass::Critical);
        assert_eq!(class_of("model_confidence"), FieldClass::HighTolerance);
        assert_eq!(class_of("price"), FieldClass::Regular);
    }
}
