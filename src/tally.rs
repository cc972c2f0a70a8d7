//! Aggregation over the vote ledger.
//!
//! Results are derived on every read, never stored. Counts include every
//! ballot option, zero or not, and all percentage math goes through one
//! rounding helper so every surface shows the same numbers.

use serde::{Deserialize, Serialize};

use crate::domain::BookTitle;

/// Per-option aggregate derived from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionCount {
    pub book: BookTitle,
    pub count: u64,
    pub percentage: f64,
}

/// Count votes per option, in option order, including zero-count entries.
///
/// Titles outside the option set are ignored; the stores reject them before
/// they reach the ledger, so in practice the counts sum to the ledger size.
pub fn compute_counts<'a, I>(options: &[BookTitle], votes: I) -> Vec<OptionCount>
where
    I: IntoIterator<Item = &'a BookTitle>,
{
    let mut counts = vec![0u64; options.len()];
    for book in votes {
        if let Some(i) = options.iter().position(|option| option == book) {
            counts[i] += 1;
        }
    }
    let total: u64 = counts.iter().sum();

    options
        .iter()
        .zip(counts)
        .map(|(option, count)| OptionCount {
            book: option.clone(),
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

/// Share of `total` as a percentage, rounded to two decimals.
///
/// A zero total yields 0 rather than a division error.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(count as f64 / total as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
