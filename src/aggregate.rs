//! Group-by reductions over a filtered listing subset.
//!
//! Every function here is pure: it borrows the filtered rows and returns a
//! fresh view. Groups come out in order of first appearance in the input and
//! all sorts are stable, so equal values keep that order.

use crate::data::{CategoryField, Listing, NumericField};
use serde::Serialize;
use std::collections::HashMap;

/// One output row: a group key and its reduced value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub value: f64,
}

/// A group-by + reduction table feeding one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationView {
    pub key_column: String,
    pub value_column: String,
    pub rows: Vec<AggregateRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl AggregationView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.value).collect()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.rows.iter().find(|r| r.key == key).map(|r| r.value)
    }

    /// Stable sort by value
    pub fn sort_by_value(mut self, order: SortOrder) -> Self {
        match order {
            SortOrder::Ascending => self.rows.sort_by(|a, b| a.value.total_cmp(&b.value)),
            SortOrder::Descending => self.rows.sort_by(|a, b| b.value.total_cmp(&a.value)),
        }
        self
    }

    /// The `n` highest-valued groups, descending
    pub fn top(self, n: usize) -> Self {
        let mut view = self.sort_by_value(SortOrder::Descending);
        view.rows.truncate(n);
        view
    }

    /// Drop the fractional part of every value (toward zero)
    pub fn truncated(mut self) -> Self {
        for row in &mut self.rows {
            row.value = row.value.trunc();
        }
        self
    }
}

/// Box statistics for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub key: String,
    pub count: usize,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Per-group distribution of a numeric column, for box charts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionView {
    pub key_column: String,
    pub value_column: String,
    pub groups: Vec<BoxStats>,
}

impl DistributionView {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Collect values per key, preserving first-appearance order of keys
fn group_values<T>(
    rows: &[&Listing],
    key: CategoryField,
    value: impl Fn(&Listing) -> T,
) -> Vec<(String, Vec<T>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<T>)> = Vec::new();

    for listing in rows {
        let k = key.value(*listing);
        let slot = *index.entry(k).or_insert_with(|| {
            groups.push((k.to_string(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(value(*listing));
    }

    groups
}

/// Group-by + row count
pub fn count_by(rows: &[&Listing], key: CategoryField, value_column: &str) -> AggregationView {
    let rows = group_values(rows, key, |_| ())
        .into_iter()
        .map(|(k, members)| AggregateRow {
            key: k,
            value: members.len() as f64,
        })
        .collect();

    AggregationView {
        key_column: key.column().to_string(),
        value_column: value_column.to_string(),
        rows,
    }
}

/// Group-by + count of non-empty values in another column
pub fn count_present_by(
    rows: &[&Listing],
    key: CategoryField,
    counted: CategoryField,
    value_column: &str,
) -> AggregationView {
    let rows = group_values(rows, key, |l| !counted.value(l).trim().is_empty())
        .into_iter()
        .map(|(k, present)| AggregateRow {
            key: k,
            value: present.into_iter().filter(|p| *p).count() as f64,
        })
        .collect();

    AggregationView {
        key_column: key.column().to_string(),
        value_column: value_column.to_string(),
        rows,
    }
}

/// Group-by + arithmetic mean. Missing values are skipped and a group with
/// no values at all is left out.
pub fn mean_by(rows: &[&Listing], key: CategoryField, value: NumericField) -> AggregationView {
    let rows = group_values(rows, key, |l| value.value(l))
        .into_iter()
        .filter_map(|(k, values)| {
            let present: Vec<f64> = values.into_iter().flatten().collect();
            if present.is_empty() {
                return None;
            }
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            Some(AggregateRow { key: k, value: mean })
        })
        .collect();

    AggregationView {
        key_column: key.column().to_string(),
        value_column: value.column().to_string(),
        rows,
    }
}

/// Group-by + Tukey box statistics (1.5 IQR whiskers)
pub fn distribution_by(rows: &[&Listing], key: CategoryField, value: NumericField) -> DistributionView {
    let groups = group_values(rows, key, |l| value.value(l))
        .into_iter()
        .filter_map(|(k, values)| {
            let mut ys: Vec<f64> = values.into_iter().flatten().collect();
            if ys.is_empty() {
                return None;
            }
            ys.sort_by(|a, b| a.total_cmp(b));
            Some(box_stats(k, &ys))
        })
        .collect();

    DistributionView {
        key_column: key.column().to_string(),
        value_column: value.column().to_string(),
        groups,
    }
}

fn box_stats(key: String, sorted: &[f64]) -> BoxStats {
    let q1 = percentile(sorted, 0.25);
    let median = percentile(sorted, 0.50);
    let q3 = percentile(sorted, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    // sorted input: first/last value inside the fences
    let lower_whisker = sorted.iter().copied().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper_whisker = sorted.iter().rev().copied().find(|&v| v <= upper_fence).unwrap_or(q3);

    let outliers = sorted
        .iter()
        .copied()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    BoxStats {
        key,
        count: sorted.len(),
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    }
}

/// Linear-interpolated percentile over sorted data
fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted_data[0];
    }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}
