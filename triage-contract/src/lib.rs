//! Wire model of the postmortem backend's HTTP contract.
//!
//! Field names follow the backend's JSON (snake_case). Optional fields default
//! when the backend omits them so that older deployments still decode.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Status literal the backend uses for failed incidents.
pub const FAILED_STATUS: &str = "FAILED";

/// One row of the incident list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentSummary {
    pub order_id: String,
    pub status: String,
    #[serde(default)]
    pub failure_detail: Option<String>,
    #[serde(default)]
    pub event_count: u64,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl IncidentSummary {
    pub fn is_failed(&self) -> bool {
        self.status == FAILED_STATUS
    }
}

/// Summary fields plus the chronological message timeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentDetail {
    #[serde(flatten)]
    pub summary: IncidentSummary,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Body of `GET /incidents/{order_id}/postmortem`.
///
/// `cached` stays optional: a missing or null flag means the backend did not
/// report provenance, which is not the same as "freshly generated".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostmortemPayload {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub cached: Option<bool>,
    #[serde(default)]
    pub postmortem: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub total_incidents: u64,
    pub failed_incidents: u64,
    pub failure_rate: f64,
    #[serde(default)]
    pub top_failure_detail: Option<String>,
}

/// Body of `POST /refresh`. Only read for reporting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReceipt {
    #[serde(default)]
    pub refreshed: Option<u64>,
}

pub fn validate_incident_list(rows: &[IncidentSummary]) -> Result<(), String> {
    let mut seen = BTreeSet::new();
    for row in rows {
        if row.order_id.trim().is_empty() {
            return Err("order_id is required".into());
        }
        if !seen.insert(row.order_id.as_str()) {
            return Err(format!("duplicate order_id '{}'", row.order_id));
        }
        if let Some(duration) = row.duration_seconds {
            if !duration.is_finite() || duration < 0.0 {
                return Err(format!(
                    "invalid duration_seconds {duration} for '{}'",
                    row.order_id
                ));
            }
        }
    }
    Ok(())
}

pub fn validate_kpi_snapshot(kpis: &KpiSnapshot) -> Result<(), String> {
    if kpis.failed_incidents > kpis.total_incidents {
        return Err(format!(
            "failed_incidents {} exceeds total_incidents {}",
            kpis.failed_incidents, kpis.total_incidents
        ));
    }
    if !kpis.failure_rate.is_finite() || !(0.0..=1.0).contains(&kpis.failure_rate) {
        return Err(format!("failure_rate {} outside [0, 1]", kpis.failure_rate));
    }
    Ok(())
}
