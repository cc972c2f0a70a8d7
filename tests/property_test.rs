//! Property-based tests using proptest.
//!
//! These verify the aggregation and status-merge invariants for any valid
//! input, not just the fixture scenarios.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use bookvote::domain::{ballot_titles, BookTitle, StatusUpdate, VotingStatus};
use bookvote::tally::{compute_counts, percentage};

// ============================================================================
// Custom Strategies
// ============================================================================

/// A title from the ballot.
fn arb_ballot_title() -> impl Strategy<Value = BookTitle> {
    prop_oneof![
        Just(BookTitle::from("1984")),
        Just(BookTitle::from("Brave New World")),
    ]
}

/// A ledger of 0..200 ballot votes.
fn arb_ledger() -> impl Strategy<Value = Vec<BookTitle>> {
    prop::collection::vec(arb_ballot_title(), 0..200)
}

fn arb_status() -> impl Strategy<Value = VotingStatus> {
    (any::<bool>(), any::<bool>(), 0i64..=2_000_000_000).prop_map(
        |(is_active, display_results, secs)| VotingStatus {
            is_active,
            display_results,
            last_updated: Utc.timestamp_opt(secs, 0).unwrap(),
        },
    )
}

fn arb_update() -> impl Strategy<Value = StatusUpdate> {
    (
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(is_active, display_results)| StatusUpdate {
            is_active,
            display_results,
        })
}

// ============================================================================
// Aggregation properties
// ============================================================================

proptest! {
    #[test]
    fn counts_sum_to_ledger_size(ledger in arb_ledger()) {
        let counts = compute_counts(&ballot_titles(), &ledger);
        let total: u64 = counts.iter().map(|c| c.count).sum();
        prop_assert_eq!(total as usize, ledger.len());
    }

    #[test]
    fn every_option_appears_exactly_once(ledger in arb_ledger()) {
        let options = ballot_titles();
        let counts = compute_counts(&options, &ledger);

        prop_assert_eq!(counts.len(), options.len());
        for (entry, option) in counts.iter().zip(&options) {
            prop_assert_eq!(&entry.book, option);
        }
    }

    #[test]
    fn percentages_are_bounded_and_sum_to_hundred(ledger in arb_ledger()) {
        let counts = compute_counts(&ballot_titles(), &ledger);

        for entry in &counts {
            prop_assert!(entry.percentage >= 0.0);
            prop_assert!(entry.percentage <= 100.0);
        }

        let sum: f64 = counts.iter().map(|c| c.percentage).sum();
        if ledger.is_empty() {
            prop_assert_eq!(sum, 0.0);
        } else {
            // Two-decimal rounding on each share keeps the sum within a
            // cent per option of 100.
            prop_assert!((sum - 100.0).abs() <= 0.01 * counts.len() as f64);
        }
    }

    #[test]
    fn percentage_rounds_to_two_decimals(count in 0u64..10_000, extra in 0u64..10_000) {
        let total = count + extra;
        let share = percentage(count, total);

        prop_assert!(share >= 0.0 && share <= 100.0);
        // Two-decimal values survive a scale-round-unscale round trip.
        prop_assert_eq!((share * 100.0).round() / 100.0, share);
    }

    #[test]
    fn zero_total_never_divides(count in 0u64..10_000) {
        prop_assert_eq!(percentage(count, 0), 0.0);
    }
}

// ============================================================================
// Status-merge properties
// ============================================================================

proptest! {
    #[test]
    fn unspecified_fields_are_preserved(status in arb_status(), update in arb_update()) {
        let now = Utc::now();
        let merged = update.apply(status, now);

        match update.is_active {
            Some(value) => prop_assert_eq!(merged.is_active, value),
            None => prop_assert_eq!(merged.is_active, status.is_active),
        }
        match update.display_results {
            Some(value) => prop_assert_eq!(merged.display_results, value),
            None => prop_assert_eq!(merged.display_results, status.display_results),
        }
    }

    #[test]
    fn empty_update_changes_nothing(status in arb_status()) {
        let merged = StatusUpdate::default().apply(status, Utc::now());
        prop_assert_eq!(merged, status);
    }

    #[test]
    fn non_empty_update_stamps_the_given_time(status in arb_status(), update in arb_update()) {
        prop_assume!(!update.is_empty());
        let now = Utc::now();
        let merged = update.apply(status, now);
        prop_assert_eq!(merged.last_updated, now);
    }

    #[test]
    fn merge_is_idempotent(status in arb_status(), update in arb_update()) {
        let now = Utc::now();
        let once = update.apply(status, now);
        let twice = update.apply(once, now);
        prop_assert_eq!(once, twice);
    }
}
