//! Security report assembly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AnomalyKind, SecurityAnomaly};

/// Bundled output of one monitor pass: raw decision counts, the anomaly
/// list (severity-descending) and one recommendation per anomaly kind
/// present. Consumed by an external alerting/dashboard collaborator; this
/// core defines only the structure, not its transport or display.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,

    /// Total permission checks at scan time.
    pub total_checks: u64,

    /// Checks that were allowed.
    pub allowed: u64,

    /// Checks that were denied.
    pub denied: u64,

    /// Detected anomalies, ordered by descending severity.
    pub anomalies: Vec<SecurityAnomaly>,

    /// One recommendation string per anomaly kind present in `anomalies`.
    pub recommendations: BTreeMap<AnomalyKind, String>,
}

impl SecurityReport {
    pub(super) fn assemble(
        total_checks: u64,
        allowed: u64,
        denied: u64,
        anomalies: Vec<SecurityAnomaly>,
    ) -> Self {
        let recommendations = anomalies
            .iter()
            .map(|a| (a.kind, a.kind.recommendation().to_string()))
            .collect();

        Self {
            generated_at: Utc::now(),
            total_checks,
            allowed,
            denied,
            anomalies,
            recommendations,
        }
    }

    /// Whether the scan found nothing.
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}
