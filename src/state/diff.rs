use tracing::debug;

use crate::config::Tolerances;

use super::schema::{class_of, FieldClass};
use super::snapshot::{FieldValue, Snapshot};

/// Decides whether an incoming snapshot differs meaningfully from the last
/// applied one. A snapshot that changes nothing significant is discarded in
/// full, never merged.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    tolerances: Tolerances,
}

impl ChangeDetector {
    pub fn new(tolerances: Tolerances) -> Self {
        Self { tolerances }
    }

    /// Evaluated per field present in `incoming`. Fields present only in
    /// `last_applied` are treated as unchanged; on commit the applied state
    /// is replaced wholesale, so they reset to unknown then.
    pub fn should_apply(&self, incoming: &Snapshot, last_applied: &Snapshot) -> bool {
        for (name, value) in &incoming.fields {
            let previous = last_applied.get(name);

            let triggered = match class_of(name) {
                // any inequality counts, including presence or type change
                FieldClass::Critical => previous != Some(value),
                FieldClass::Regular => {
                    self.exceeds(value, previous, self.tolerances.regular)
                }
                FieldClass::HighTolerance => {
                    self.exceeds(value, previous, self.tolerances.high)
                }
            };

            if triggered {
                debug!(field = %name, "snapshot accepted");
                return true;
            }
        }

        false
    }

    fn exceeds(
        &self,
        value: &FieldValue,
        previous: Option<&FieldValue>,
        tolerance: rust_decimal::Decimal,
    ) -> bool {
        match (value, previous) {
            (FieldValue::Number(new), Some(FieldValue::Number(old))) => {
                (*new - *old).abs() > tolerance
            }
            // non-numeric, or type changed underneath us: strict inequality
            (_, Some(old)) => value != old,
            // newly appearing field
            (_, None) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snap(fields: &[(&str, FieldValue)]) -> Snapshot {
        let mut s = Snapshot::default();
        for (name, value) in fields {
            s.fields.insert((*name).to_string(), value.clone());
        }
        s
    }

    fn detector() -> ChangeDetector {
        ChangeDetector::new(Tolerances::default())
    }

    #[test]
    fn regular_field_within_tolerance_is_noise() {
        let last = snap(&[("price", FieldValue::Number(dec!(100)))]);
        let next = snap(&[("price", FieldValue::Number(dec!(100.0005)))]);
        assert!(!detector().should_apply(&next, &last));
    }

    #[test]
    fn regular_field_past_tolerance_triggers() {
        let last = snap(&[("price", FieldValue::Number(dec!(100)))]);
        let next = snap(&[("price", FieldValue::Number(dec!(100.002)))]);
        assert!(detector().should_apply(&next, &last));
    }

    #[test]
    fn critical_field_any_delta_triggers() {
        let last = snap(&[("position_size", FieldValue::Number(dec!(1.0)))]);
        let next = snap(&[("position_size", FieldValue::Number(dec!(1.0000001)))]);
        assert!(detector().should_apply(&next, &last));
    }

    #[test]
    fn critical_type_change_triggers() {
        let last = snap(&[("position_side", FieldValue::Text("Flat".into()))]);
        let next = snap(&[("position_side", FieldValue::Flag(true))]);
        assert!(detector().should_apply(&next, &last));
    }

    #[test]
    fn high_tolerance_absorbs_oscillation() {
        let last = snap(&[("model_confidence", FieldValue::Number(dec!(0.61)))]);
        let next = snap(&[("model_confidence", FieldValue::Number(dec!(0.625)))]);
        assert!(!detector().should_apply(&next, &last));

        let jump = snap(&[("model_confidence", FieldValue::Number(dec!(0.64)))]);
        assert!(detector().should_apply(&jump, &last));
    }

    #[test]
    fn new_field_triggers() {
        let last = snap(&[("price", FieldValue::Number(dec!(100)))]);
        let next = snap(&[("unrealized_pnl", FieldValue::Number(dec!(0)))]);
        assert!(detector().should_apply(&next, &last));
    }

    #[test]
    fn absent_field_is_not_a_change() {
        let last = snap(&[
            ("price", FieldValue::Number(dec!(100))),
            ("unrealized_pnl", FieldValue::Number(dec!(3))),
        ]);
        let next = snap(&[("price", FieldValue::Number(dec!(100.0002)))]);
        assert!(!detector().should_apply(&next, &last));
    }

    #[test]
    fn non_numeric_regular_uses_strict_inequality() {
        let last = snap(&[("status_note", FieldValue::Text("ok".into()))]);
        let same = snap(&[("status_note", FieldValue::Text("ok".into()))]);
        let diff = snap(&[("status_note", FieldValue::Text("warming".into()))]);
        assert!(!detector().should_apply(&same, &last));
        assert!(detector().should_apply(&diff, &last));
    }
}
