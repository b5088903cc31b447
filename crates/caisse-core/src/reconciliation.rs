//! # Reconciliation Math
//!
//! The Versement record and the pure variance arithmetic behind the
//! reconciliation engine.
//!
//! ## The Daily Cash Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Per-Staff Daily Reconciliation                        │
//! │                                                                         │
//! │  Ledger tickets (staff, day) ──► theoretical = Σ price                  │
//! │                                                                         │
//! │  Cash drawer handed in       ──► remitted (manual entry)                │
//! │                                                                         │
//! │          variance = remitted − theoretical                              │
//! │              > 0  surplus (more cash than sales)                        │
//! │              < 0  deficit (missing cash)                                │
//! │                                                                         │
//! │          |variance / theoretical| * 100 > threshold ──► alert           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The day boundary is UTC midnight everywhere; the ledger applies the
//! same boundary when summing tickets and when storing the versement, so
//! the two can never disagree by a day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Versement
// =============================================================================

/// Cash reconciliation record: one per (staff member, calendar day).
///
/// `theoretical` is frozen at save time; re-saving for the same day
/// recomputes it and overwrites the whole row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Versement {
    pub staff_id: String,
    pub site_id: String,
    /// Business day, UTC.
    pub date: NaiveDate,
    /// Sum of the staff member's ticket prices for `date`, at save time.
    pub theoretical_amount: Money,
    /// Cash actually handed in.
    pub remitted_amount: Money,
    /// `remitted_amount - theoretical_amount`; positive = surplus.
    pub variance: Money,
    /// Number of tickets behind `theoretical_amount`.
    pub ticket_count: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub validated_by: Option<String>,
}

// =============================================================================
// Variance Arithmetic
// =============================================================================

/// Signed variance: `remitted - theoretical`.
///
/// Positive means more cash than recorded sales (surplus), negative means
/// missing cash (deficit).
#[inline]
pub fn variance(remitted: Money, theoretical: Money) -> Money {
    remitted - theoretical
}

/// Variance as a percentage of the theoretical amount.
///
/// Returns `0.0` when theoretical is zero: "no sales, nothing remitted"
/// is a valid, unremarkable state, not a division error.
pub fn variance_pct(variance: Money, theoretical: Money) -> f64 {
    if theoretical.is_zero() {
        return 0.0;
    }
    variance.cents() as f64 / theoretical.cents() as f64 * 100.0
}

/// Whether a variance percentage breaches the alert threshold.
#[inline]
pub fn exceeds_threshold(pct: f64, threshold_pct: f64) -> bool {
    pct.abs() > threshold_pct
}

/// UTC day bounds for a business date: `[00:00, next day 00:00)`.
///
/// Shared by theoretical-revenue queries and versement storage so the
/// day boundary policy lives in exactly one place.
pub fn day_bounds_utc(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
    let end = start + chrono::Duration::days(1);
    (start.and_utc(), end.and_utc())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn surplus_is_positive() {
        // remitted 120, theoretical 100 => +20
        assert_eq!(variance(cents(12000), cents(10000)), cents(2000));
    }

    #[test]
    fn deficit_is_negative() {
        // remitted 80, theoretical 100 => -20
        assert_eq!(variance(cents(8000), cents(10000)), cents(-2000));
    }

    #[test]
    fn pct_of_zero_theoretical_is_zero() {
        assert_eq!(variance_pct(cents(500), Money::zero()), 0.0);
    }

    #[test]
    fn deficit_past_five_percent_alerts() {
        let v = variance(cents(8000), cents(10000));
        let pct = variance_pct(v, cents(10000));
        assert!((pct + 20.0).abs() < f64::EPSILON);
        assert!(exceeds_threshold(pct, 5.0));
    }

    #[test]
    fn small_variance_does_not_alert() {
        let v = variance(cents(10_300), cents(10_000));
        let pct = variance_pct(v, cents(10_000));
        assert!((pct - 3.0).abs() < f64::EPSILON);
        assert!(!exceeds_threshold(pct, 5.0));
    }

    #[test]
    fn threshold_is_exclusive() {
        // exactly 5% is not an alert at the default threshold
        assert!(!exceeds_threshold(5.0, 5.0));
        assert!(exceeds_threshold(5.01, 5.0));
        assert!(exceeds_threshold(-5.01, 5.0));
    }

    #[test]
    fn day_bounds_cover_exactly_one_utc_day() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let (start, end) = day_bounds_utc(date);
        assert_eq!(start.to_rfc3339(), "2025-06-15T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-06-16T00:00:00+00:00");
        assert_eq!(end - start, chrono::Duration::days(1));
    }
}
