//! Compiler hints describe the behavior of a user function to the optimizer.
//!
//! No matter how these numbers are set, the optimizer always generates a valid plan. They are
//! only used to estimate intermediate result sizes, which rank otherwise valid candidates.
//! Every numeric hint is [`Estimate::Unknown`] until set, which is never treated as zero.

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display, Formatter};

use serde::Serialize;

use crate::error::{CompilerError, OptResult};
use crate::fields::FieldSet;

/// A statistic that is either known or explicitly unknown.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize)]
pub enum Estimate {
    #[default]
    Unknown,
    Known(f64),
}

impl Estimate {
    /// Creates a known estimate, rejecting negative and NaN values.
    pub fn checked(name: &'static str, value: f64) -> OptResult<Estimate> {
        if value.is_nan() || value < 0.0 {
            return Err(CompilerError::InvalidHint { name, value }.into());
        }
        Ok(Estimate::Known(value))
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Estimate::Known(_))
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Estimate::Known(v) => Some(*v),
            Estimate::Unknown => None,
        }
    }

    /// Value of this estimate, or `default` if unknown.
    pub fn or(&self, default: f64) -> f64 {
        self.value().unwrap_or(default)
    }

    /// Combines two estimates, unknown if either side is unknown.
    pub fn zip_with<F: FnOnce(f64, f64) -> f64>(self, other: Estimate, f: F) -> Estimate {
        match (self, other) {
            (Estimate::Known(a), Estimate::Known(b)) => Estimate::Known(f(a, b)),
            _ => Estimate::Unknown,
        }
    }

    /// Returns `self` if known, otherwise `other`.
    pub fn or_else(self, other: Estimate) -> Estimate {
        match self {
            Estimate::Known(_) => self,
            Estimate::Unknown => other,
        }
    }
}

impl Display for Estimate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Estimate::Known(v) => write!(f, "{:.2}", v),
            Estimate::Unknown => write!(f, "(unknown)"),
        }
    }
}

/// Statistics and selectivity of the function behind an operator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompilerHints {
    avg_records_emitted_per_call: Estimate,
    avg_bytes_per_record: Estimate,
    distinct_counts: HashMap<FieldSet, u64>,
    avg_records_per_distinct_fields: HashMap<FieldSet, f64>,
    unique_fields: HashSet<FieldSet>,
}

impl CompilerHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Average number of records emitted per function call.
    pub fn avg_records_emitted_per_call(&self) -> Estimate {
        self.avg_records_emitted_per_call
    }

    pub fn set_avg_records_emitted_per_call(&mut self, avg: f64) -> OptResult<()> {
        self.avg_records_emitted_per_call = Estimate::checked("avg_records_emitted_per_call", avg)?;
        Ok(())
    }

    pub fn avg_bytes_per_record(&self) -> Estimate {
        self.avg_bytes_per_record
    }

    pub fn set_avg_bytes_per_record(&mut self, avg_bytes: f64) -> OptResult<()> {
        self.avg_bytes_per_record = Estimate::checked("avg_bytes_per_record", avg_bytes)?;
        Ok(())
    }

    /// Number of distinct value combinations of `fields`.
    pub fn distinct_count(&self, fields: &FieldSet) -> Estimate {
        self.distinct_counts
            .get(fields)
            .map(|c| Estimate::Known(*c as f64))
            .unwrap_or_default()
    }

    pub fn set_distinct_count(&mut self, fields: FieldSet, count: u64) {
        self.distinct_counts.insert(fields, count);
    }

    pub fn distinct_counts(&self) -> &HashMap<FieldSet, u64> {
        &self.distinct_counts
    }

    /// Average number of records sharing one value combination of `fields`.
    pub fn avg_records_per_distinct_fields(&self, fields: &FieldSet) -> Estimate {
        self.avg_records_per_distinct_fields
            .get(fields)
            .map(|avg| Estimate::Known(*avg))
            .unwrap_or_default()
    }

    pub fn set_avg_records_per_distinct_fields(
        &mut self,
        fields: FieldSet,
        avg: f64,
    ) -> OptResult<()> {
        if let Estimate::Known(avg) = Estimate::checked("avg_records_per_distinct_fields", avg)? {
            self.avg_records_per_distinct_fields.insert(fields, avg);
        }
        Ok(())
    }

    pub fn avg_records_per_distinct_fields_map(&self) -> &HashMap<FieldSet, f64> {
        &self.avg_records_per_distinct_fields
    }

    /// Field combinations declared to hold unique values in the output.
    pub fn unique_fields(&self) -> &HashSet<FieldSet> {
        &self.unique_fields
    }

    pub fn add_unique_field_set(&mut self, fields: FieldSet) {
        self.unique_fields.insert(fields);
    }

    pub fn add_unique_field_sets<I: IntoIterator<Item = FieldSet>>(&mut self, fields: I) {
        self.unique_fields.extend(fields);
    }

    pub fn clear_unique_fields(&mut self) {
        self.unique_fields.clear();
    }

    /// Copies all hints of `source` into `self`, overwriting known values.
    pub fn copy_from(&mut self, source: &CompilerHints) {
        self.avg_records_emitted_per_call = source.avg_records_emitted_per_call;
        self.avg_bytes_per_record = source.avg_bytes_per_record;
        self.distinct_counts
            .extend(source.distinct_counts.iter().map(|(k, v)| (k.clone(), *v)));
        self.avg_records_per_distinct_fields.extend(
            source
                .avg_records_per_distinct_fields
                .iter()
                .map(|(k, v)| (k.clone(), *v)),
        );
        if !source.unique_fields.is_empty() {
            self.unique_fields = source.unique_fields.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use maplit::hashset;

    use crate::error::CompilerError;
    use crate::fields::FieldSet;
    use crate::hints::{CompilerHints, Estimate};

    #[test]
    fn test_defaults_are_unknown() {
        let hints = CompilerHints::new();

        assert_eq!(Estimate::Unknown, hints.avg_bytes_per_record());
        assert_eq!(Estimate::Unknown, hints.avg_records_emitted_per_call());
        assert_eq!(Estimate::Unknown, hints.distinct_count(&FieldSet::from([0])));
        assert_ne!(Estimate::Known(0.0), hints.avg_bytes_per_record());
    }

    #[test]
    fn test_reject_negative_hint() {
        let mut hints = CompilerHints::new();
        hints.set_avg_bytes_per_record(12.0).unwrap();

        let err = hints.set_avg_bytes_per_record(-1.0).unwrap_err();
        assert_eq!(
            Some(&CompilerError::InvalidHint {
                name: "avg_bytes_per_record",
                value: -1.0
            }),
            err.downcast_ref::<CompilerError>()
        );
        // The previous value is kept.
        assert_eq!(Estimate::Known(12.0), hints.avg_bytes_per_record());

        assert!(hints.set_avg_records_emitted_per_call(f64::NAN).is_err());
        assert!(hints
            .set_avg_records_per_distinct_fields(FieldSet::from([1]), -0.5)
            .is_err());
        assert!(hints.avg_records_per_distinct_fields_map().is_empty());
    }

    #[test]
    fn test_zero_is_a_known_value() {
        let mut hints = CompilerHints::new();
        hints.set_avg_records_emitted_per_call(0.0).unwrap();

        assert_eq!(Estimate::Known(0.0), hints.avg_records_emitted_per_call());
        assert!(hints.avg_records_emitted_per_call().is_known());
    }

    #[test]
    fn test_field_set_keys_compare_by_content() {
        let mut hints = CompilerHints::new();
        hints.set_distinct_count(FieldSet::from([2, 0]), 42);
        hints
            .set_avg_records_per_distinct_fields(FieldSet::from([1, 3]), 2.5)
            .unwrap();

        assert_eq!(Estimate::Known(42.0), hints.distinct_count(&FieldSet::from([0, 2])));
        assert_eq!(
            Estimate::Known(2.5),
            hints.avg_records_per_distinct_fields(&FieldSet::from([3, 1]))
        );
    }

    #[test]
    fn test_copy_from() {
        let mut source = CompilerHints::new();
        source.set_avg_bytes_per_record(8.0).unwrap();
        source.add_unique_field_set(FieldSet::from([0]));

        let mut target = CompilerHints::new();
        target.add_unique_field_set(FieldSet::from([1]));
        target.copy_from(&source);

        assert_eq!(Estimate::Known(8.0), target.avg_bytes_per_record());
        assert_eq!(&hashset! {FieldSet::from([0])}, target.unique_fields());
    }

    #[test]
    fn test_estimate_combination() {
        assert_eq!(
            Estimate::Known(6.0),
            Estimate::Known(2.0).zip_with(Estimate::Known(3.0), |a, b| a * b)
        );
        assert_eq!(
            Estimate::Unknown,
            Estimate::Known(2.0).zip_with(Estimate::Unknown, |a, b| a * b)
        );
        assert_eq!(100.0, Estimate::Unknown.or(100.0));
    }
}
