//! Cash reconciliation: versement recording and the per-site summary.
//!
//! Saving a versement freezes the theoretical amount at save time, so
//! the stored variance always reflects the ledger as it was when the
//! drawer was counted. The summary recomputes theoretical live; a ticket
//! that syncs late shows up in the summary even if the day was already
//! reconciled.

use chrono::{NaiveDate, Utc};
use tracing::info;

use caisse_core::protocol::{SiteSummary, StaffSummaryRow, VersementRequest};
use caisse_core::reconciliation::{self, day_bounds_utc};
use caisse_core::Versement;

use crate::error::ApiError;
use crate::AppState;

/// Records (or re-records) the cash handed in by one staff member for
/// one business day. Upserts on (staff, day); saving twice replaces the
/// previous record.
pub async fn save_versement(
    state: &AppState,
    req: VersementRequest,
) -> Result<Versement, ApiError> {
    let site_id = state
        .db
        .staff_site(&req.staff_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("staff {}", req.staff_id)))?;

    if req.remitted_amount.is_negative() {
        return Err(ApiError::InvalidRequest(
            "remitted amount cannot be negative".to_string(),
        ));
    }

    let (theoretical, ticket_count) = state
        .db
        .theoretical_for_day(&req.staff_id, req.date)
        .await?;
    let variance = reconciliation::variance(req.remitted_amount, theoretical);

    let versement = Versement {
        staff_id: req.staff_id,
        site_id,
        date: req.date,
        theoretical_amount: theoretical,
        remitted_amount: req.remitted_amount,
        variance,
        ticket_count,
        comment: req.comment,
        created_at: Utc::now(),
        validated_by: None,
    };

    state.db.upsert_versement(&versement).await?;
    info!(
        staff = %versement.staff_id,
        date = %versement.date,
        variance = %versement.variance,
        "Recorded versement"
    );
    Ok(versement)
}

/// Builds the reconciliation summary for a site over an inclusive date
/// range: one row per staff member, including staff with no activity.
pub async fn site_summary(
    state: &AppState,
    site_id: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<SiteSummary, ApiError> {
    if date_from > date_to {
        return Err(ApiError::InvalidRequest(
            "dateFrom is after dateTo".to_string(),
        ));
    }

    if !state.db.site_exists(site_id).await? {
        return Err(ApiError::NotFound(format!("site {site_id}")));
    }
    let staff = state.db.staff_at_site(site_id).await?;

    let (range_start, _) = day_bounds_utc(date_from);
    let (_, range_end) = day_bounds_utc(date_to);
    let threshold = state.config.variance_alert_pct;

    let mut rows = Vec::with_capacity(staff.len());
    for (staff_id, staff_name) in staff {
        let (theoretical, ticket_count) = state
            .db
            .theoretical_revenue(&staff_id, range_start, range_end)
            .await?;
        let remitted = state
            .db
            .remitted_in_range(&staff_id, date_from, date_to)
            .await?;

        let variance = reconciliation::variance(remitted, theoretical);
        let variance_pct = reconciliation::variance_pct(variance, theoretical);
        let alert = reconciliation::exceeds_threshold(variance_pct, threshold);

        rows.push(StaffSummaryRow {
            staff_id,
            staff_name,
            ticket_count,
            theoretical_amount: theoretical,
            remitted_amount: remitted,
            variance,
            variance_pct,
            alert,
        });
    }

    Ok(SiteSummary {
        site_id: site_id.to_string(),
        date_from,
        date_to,
        rows,
    })
}
