//! Equality with domain tolerances

use chrono::Duration;

use crate::models::{Scalar, Value};

/// Decides whether two values are the same for audit purposes
#[derive(Debug, Clone, Copy)]
pub struct ValueComparator {
    timestamp_epsilon: Duration,
}

impl Default for ValueComparator {
    fn default() -> Self {
        Self::new(Duration::milliseconds(1))
    }
}

impl ValueComparator {
    pub fn new(timestamp_epsilon: Duration) -> Self {
        Self { timestamp_epsilon }
    }

    /// Scalar equality. Timestamps closer than the epsilon are equal, and
    /// identical ones always are, even with a zero epsilon. Every other kind
    /// compares exactly and differing kinds never match.
    pub fn scalars_equal(&self, a: &Scalar, b: &Scalar) -> bool {
        match (a, b) {
            (Scalar::Timestamp(x), Scalar::Timestamp(y)) => {
                if x == y {
                    return true;
                }
                let delta = x.signed_duration_since(*y);
                delta < self.timestamp_epsilon && -delta < self.timestamp_epsilon
            }
            // NaN == NaN, otherwise diff(x, x) would not be empty
            (Scalar::Float(x), Scalar::Float(y)) => x == y || (x.is_nan() && y.is_nan()),
            _ => a == b,
        }
    }

    /// Deep equality over two value trees
    pub fn equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Scalar(x), Value::Scalar(y)) => self.scalars_equal(x, y),
            (Value::List(x), Value::List(y)) | (Value::Set(x), Value::Set(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(l, r)| self.equal(l, r))
            }
            (Value::Map(x), Value::Map(y)) => {
                x.len() == y.len()
                    && x
                        .iter()
                        .all(|(k, l)| y.get(k).is_some_and(|r| self.equal(l, r)))
            }
            (Value::Record(x), Value::Record(y)) => {
                x.fields.len() == y.fields.len()
                    && x
                        .fields
                        .iter()
                        .all(|(k, l)| y.fields.get(k).is_some_and(|r| self.equal(l, r)))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use chrono::{TimeZone, Utc};

    fn ts(micros: i64) -> Scalar {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Scalar::Timestamp(base + Duration::microseconds(micros))
    }

    #[test]
    fn test_both_null_equal() {
        let cmp = ValueComparator::default();
        assert!(cmp.equal(&Value::Null, &Value::Null));
        assert!(!cmp.equal(&Value::Null, &Value::int(0)));
    }

    #[test]
    fn test_timestamp_epsilon() {
        let cmp = ValueComparator::default();
        assert!(cmp.scalars_equal(&ts(0), &ts(500)));
        assert!(cmp.scalars_equal(&ts(500), &ts(0)));
        assert!(cmp.scalars_equal(&ts(0), &ts(999)));
        assert!(!cmp.scalars_equal(&ts(0), &ts(1_000)));
        assert!(!cmp.scalars_equal(&ts(0), &ts(-1_500)));
    }

    #[test]
    fn test_zero_epsilon_keeps_identical_timestamps_equal() {
        let cmp = ValueComparator::new(Duration::zero());
        assert!(cmp.scalars_equal(&ts(0), &ts(0)));
        assert!(!cmp.scalars_equal(&ts(0), &ts(1)));
    }

    #[test]
    fn test_kind_mismatch_never_equal() {
        let cmp = ValueComparator::default();
        assert!(!cmp.scalars_equal(&Scalar::Integer(1), &Scalar::Float(1.0)));
        assert!(!cmp.scalars_equal(
            &Scalar::String("BS".into()),
            &Scalar::Enum("BS".into())
        ));
    }

    #[test]
    fn test_nan_equals_itself() {
        let cmp = ValueComparator::default();
        assert!(cmp.scalars_equal(&Scalar::Float(f64::NAN), &Scalar::Float(f64::NAN)));
    }

    #[test]
    fn test_deep_equality_uses_tolerance() {
        let cmp = ValueComparator::default();
        let a: Value = Record::untyped()
            .with_value("at", Value::Scalar(ts(0)))
            .with("name", "x")
            .into();
        let b: Value = Record::untyped()
            .with_value("at", Value::Scalar(ts(200)))
            .with("name", "x")
            .into();
        assert!(cmp.equal(&a, &b));
    }

    #[test]
    fn test_record_field_count_matters() {
        let cmp = ValueComparator::default();
        let a: Value = Record::untyped().with("name", "x").into();
        let b: Value = Record::untyped().with("name", "x").with("age", &3).into();
        assert!(!cmp.equal(&a, &b));
    }
}
