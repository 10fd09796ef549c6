//! Expected-vs-observed sequence comparison.

use serde::Serialize;
use std::fmt;

/// A failed comparison: the label plus both sides, exactly as compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MismatchReport<T> {
    label: String,
    expected: Vec<T>,
    observed: Vec<T>,
}

impl<T> MismatchReport<T> {
    pub fn new(label: impl Into<String>, expected: Vec<T>, observed: Vec<T>) -> Self {
        Self {
            label: label.into(),
            expected,
            observed,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn expected(&self) -> &[T] {
        &self.expected
    }

    pub fn observed(&self) -> &[T] {
        &self.observed
    }
}

impl<T: fmt::Debug> fmt::Display for MismatchReport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} mismatch:", self.label)?;
        writeln!(f, "  expected: {:?}", self.expected)?;
        write!(f, "  observed: {:?}", self.observed)
    }
}

/// Succeeds when both sequences are elementwise equal, length included.
pub fn check_sequence<T>(
    label: &str,
    expected: &[T],
    observed: &[T],
) -> Result<(), MismatchReport<T>>
where
    T: PartialEq + Clone,
{
    if expected == observed {
        return Ok(());
    }
    Err(MismatchReport::new(label, expected.to_vec(), observed.to_vec()))
}
