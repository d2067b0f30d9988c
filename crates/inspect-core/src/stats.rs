//! Dashboard statistics

#![allow(clippy::cast_precision_loss)] // record counts stay far below 2^52

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::db::{CountFilter, InspectionRepository};
use crate::error::Result;
use crate::util::start_of_day;

/// How many non-conformance types the dashboard reports.
pub const TOP_NON_CONFORMANCE_TYPES: usize = 5;

/// Days covered by `recentCount`, counted back from today's midnight.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// One row of the non-conformance breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NonConformanceCount {
    #[serde(rename = "_id")]
    pub kind: String,
    pub count: usize,
}

/// Summary figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_inspections: usize,
    pub compliant_count: usize,
    pub non_compliant_count: usize,
    pub recent_count: usize,
    /// Percentage of compliant records, `0.0` when there are none.
    pub compliance_rate: f64,
    pub non_conformance_types: Vec<NonConformanceCount>,
}

/// Start of the recent window: midnight of `now`'s day minus seven days.
pub fn recent_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now) - TimeDelta::days(RECENT_WINDOW_DAYS)
}

/// `compliant / total * 100`, or `0.0` for an empty store.
pub fn compliance_rate(compliant: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    compliant as f64 / total as f64 * 100.0
}

/// Compute the dashboard figures over every stored record.
pub fn dashboard_stats(
    repo: &impl InspectionRepository,
    now: DateTime<Utc>,
) -> Result<DashboardStats> {
    let total_inspections = repo.count(CountFilter::all())?;
    let compliant_count = repo.count(CountFilter::non_conforming(false))?;
    let non_compliant_count = repo.count(CountFilter::non_conforming(true))?;
    let recent_count = repo.count(CountFilter::inspected_since(recent_window_start(now)))?;

    let non_conformance_types = repo
        .top_non_conformance_types(TOP_NON_CONFORMANCE_TYPES)?
        .into_iter()
        .map(|(kind, count)| NonConformanceCount { kind, count })
        .collect();

    Ok(DashboardStats {
        total_inspections,
        compliant_count,
        non_compliant_count,
        recent_count,
        compliance_rate: compliance_rate(compliant_count, total_inspections),
        non_conformance_types,
    })
}
