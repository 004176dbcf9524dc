//! Date-indexed value series.
//!
//! A [`TimeSeries`] is the unit every metric consumes: a name, a strictly
//! increasing date index and one value per date. For `f64` series any
//! non-finite value counts as a missing observation.

use crate::{Result, RiskError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Named, date-indexed sequence of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries<T = f64> {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<T>,
}

impl<T> TimeSeries<T> {
    /// Create a series, validating that the index is strictly increasing and
    /// matches the value count.
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<T>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(RiskError::InvalidInput(format!(
                "{} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(RiskError::InvalidInput(format!(
                "date index not strictly increasing at {}",
                pair[1]
            )));
        }
        Ok(Self {
            name: name.into(),
            dates,
            values,
        })
    }

    /// Create an empty series.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build a series from parts already known to be aligned and ordered.
    pub(crate) fn from_parts(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<T>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self {
            name: name.into(),
            dates,
            values,
        }
    }

    /// Series name.
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Rename the series.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Date index.
    pub const fn dates(&self) -> &[NaiveDate] {
        self.dates.as_slice()
    }

    /// Values, one per date.
    pub const fn values(&self) -> &[T] {
        self.values.as_slice()
    }

    /// Number of entries, including missing ones.
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no entries.
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &T)> + '_ {
        self.dates.iter().copied().zip(self.values.iter())
    }
}

impl TimeSeries<f64> {
    /// Finite values in index order; missing entries are skipped.
    pub fn observations(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| v.is_finite()).collect()
    }

    /// Copy of the series without missing entries.
    pub fn dropna(&self) -> Self {
        let (dates, values) = self
            .iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(d, v)| (d, *v))
            .unzip();
        Self::from_parts(self.name.clone(), dates, values)
    }

    /// Value at `date`, if present and finite.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|i| self.values[i])
            .filter(|v| v.is_finite())
    }

    /// Wealth index `∏(1 + r)` over the non-missing returns.
    pub fn cumulative_wealth(&self) -> Self {
        let clean = self.dropna();
        let values = clean
            .values
            .iter()
            .scan(1.0, |wealth, r| {
                *wealth *= 1.0 + r;
                Some(*wealth)
            })
            .collect();
        Self::from_parts(self.name.clone(), clean.dates, values)
    }

    /// Inner join on date, keeping only dates where both sides are finite.
    pub fn align(&self, other: &Self) -> (Self, Self) {
        let mut dates = Vec::new();
        let mut left = Vec::new();
        let mut right = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < self.len() && j < other.len() {
            match self.dates[i].cmp(&other.dates[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    let (a, b) = (self.values[i], other.values[j]);
                    if a.is_finite() && b.is_finite() {
                        dates.push(self.dates[i]);
                        left.push(a);
                        right.push(b);
                    }
                    i += 1;
                    j += 1;
                }
            }
        }

        (
            Self::from_parts(self.name.clone(), dates.clone(), left),
            Self::from_parts(other.name.clone(), dates, right),
        )
    }
}

impl TimeSeries<Option<f64>> {
    /// Keep only the defined entries.
    pub fn dropna(&self) -> TimeSeries<f64> {
        let (dates, values) = self
            .iter()
            .filter_map(|(d, v)| v.filter(|x| x.is_finite()).map(|x| (d, x)))
            .unzip();
        TimeSeries::from_parts(self.name.clone(), dates, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_rejects_unsorted_index() {
        let result = TimeSeries::new("x", vec![day(2), day(1)], vec![0.1, 0.2]);
        assert!(matches!(result, Err(RiskError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let result = TimeSeries::new("x", vec![day(1)], vec![0.1, 0.2]);
        assert!(result.is_err());
    }

    #[test]
    fn test_observations_skip_missing() {
        let s = TimeSeries::new("x", vec![day(1), day(2), day(3)], vec![0.1, f64::NAN, -0.2])
            .unwrap();
        assert_eq!(s.observations(), vec![0.1, -0.2]);
        assert_eq!(s.dropna().dates(), &[day(1), day(3)]);
        assert_eq!(s.get(day(2)), None);
    }

    #[test]
    fn test_cumulative_wealth() {
        let s = TimeSeries::new("x", vec![day(1), day(2)], vec![0.10, -0.10]).unwrap();
        let w = s.cumulative_wealth();
        assert_relative_eq!(w.values()[0], 1.10, epsilon = 1e-12);
        assert_relative_eq!(w.values()[1], 0.99, epsilon = 1e-12);
    }

    #[test]
    fn test_align_inner_join() {
        let a = TimeSeries::new("a", vec![day(1), day(2), day(4)], vec![1.0, 2.0, 4.0]).unwrap();
        let b = TimeSeries::new("b", vec![day(2), day(3), day(4)], vec![20.0, 30.0, f64::NAN])
            .unwrap();
        let (x, y) = a.align(&b);
        assert_eq!(x.dates(), &[day(2)]);
        assert_eq!(x.values(), &[2.0]);
        assert_eq!(y.values(), &[20.0]);
        assert_eq!(y.name(), "b");
    }

    #[test]
    fn test_optional_dropna() {
        let s = TimeSeries::new("beta", vec![day(1), day(2)], vec![None, Some(1.2)]).unwrap();
        let clean = s.dropna();
        assert_eq!(clean.dates(), &[day(2)]);
        assert_eq!(clean.values(), &[1.2]);
    }
}
