use std::collections::BTreeMap;
use std::time::Instant;

use rust_decimal::Decimal;

/// One value pushed by the strategy engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(Decimal),
    Text(String),
    Flag(bool),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// A single validated state push from the engine. Fields may be a partial
/// update; the snapshot is immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub fields: BTreeMap<String, FieldValue>,
}

impl Snapshot {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The one snapshot currently presented to the rendering layer.
///
/// Replaced wholesale by the smoothing pipeline on commit, never
/// field-merged, so consumers cannot observe a mix of two update cycles.
#[derive(Debug, Clone, Default)]
pub struct AppliedState {
    pub snapshot: Snapshot,
    pub committed_at: Option<Instant>,
}

impl AppliedState {
    /// Atomic wholesale replacement.
    pub fn commit(&mut self, snapshot: Snapshot, now: Instant) {
        self.snapshot = snapshot;
        self.committed_at = Some(now);
    }
}
