//! Behavioral anomaly detection over accumulated decisions.
//!
//! The monitor is a pure, repeatable analysis pass: every call re-derives
//! its findings from a single consistent snapshot of the audit trail,
//! metrics and quota usage ([`crate::PermissionManager::observe`]). Nothing
//! is cached or incrementally maintained, so results can never drift from
//! stale counters, and scans may run concurrently with live permission
//! checks.
//!
//! # Rules
//!
//! - **RepeatedViolations**: per-agent denial counts
//! - **QuotaPressure**: session quota consumption per agent
//! - **SystemWideDenialRate**: overall denied/total ratio
//! - **ToolTargeting**: denials concentrated on one tool across agents
//!
//! A failure inside one rule is logged and skipped; the remaining rules
//! still run.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use toolgate_core::{AnomalyMonitor, PermissionManager};
//!
//! let manager = Arc::new(PermissionManager::new());
//! let monitor = AnomalyMonitor::new(Arc::clone(&manager));
//!
//! let anomalies = monitor.detect_anomalies();
//! assert!(anomalies.is_empty());
//!
//! let report = monitor.generate_security_report();
//! assert!(report.is_clean());
//! ```

mod report;
mod rules;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::manager::{ObservationSnapshot, PermissionManager};

pub use report::SecurityReport;

/// How bad an anomaly is. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// Which rule produced an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    RepeatedViolations,
    QuotaPressure,
    SystemWideDenialRate,
    ToolTargeting,
}

impl AnomalyKind {
    /// Operator guidance for this kind of anomaly.
    pub fn recommendation(&self) -> &'static str {
        match self {
            AnomalyKind::RepeatedViolations => {
                "review the agent's recent denials; tighten its policy or suspend it if the pattern continues"
            }
            AnomalyKind::QuotaPressure => {
                "the agent is close to its session quota; reset the session if legitimate or investigate runaway loops"
            }
            AnomalyKind::SystemWideDenialRate => {
                "a large share of all calls is being denied; check for misconfigured policies or coordinated probing"
            }
            AnomalyKind::ToolTargeting => {
                "multiple denials converge on one tool; verify the tool's approval level and which agents are probing it"
            }
        }
    }
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnomalyKind::RepeatedViolations => "repeated_violations",
            AnomalyKind::QuotaPressure => "quota_pressure",
            AnomalyKind::SystemWideDenialRate => "system_wide_denial_rate",
            AnomalyKind::ToolTargeting => "tool_targeting",
        };
        write!(f, "{}", s)
    }
}

/// One derived behavioral signal. Always recomputed from the snapshot,
/// never persisted as authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityAnomaly {
    /// Which rule fired.
    pub kind: AnomalyKind,

    /// Agent the signal concerns, when attributable to one.
    pub agent_id: Option<String>,

    /// Tool the signal concerns, when attributable to one.
    pub tool_name: Option<String>,

    /// How bad it is.
    pub severity: Severity,

    /// Human-readable description of what was observed.
    pub description: String,

    /// Operator guidance for this anomaly kind.
    pub recommendation: String,

    /// When this scan detected it.
    pub detected_at: DateTime<Utc>,
}

impl SecurityAnomaly {
    pub(crate) fn new(kind: AnomalyKind, severity: Severity, description: String) -> Self {
        Self {
            kind,
            agent_id: None,
            tool_name: None,
            severity,
            description,
            recommendation: kind.recommendation().to_string(),
            detected_at: Utc::now(),
        }
    }

    pub(crate) fn for_agent(mut self, agent_id: &str) -> Self {
        self.agent_id = Some(agent_id.to_string());
        self
    }

    pub(crate) fn for_tool(mut self, tool_name: &str) -> Self {
        self.tool_name = Some(tool_name.to_string());
        self
    }
}

/// Error from a single detection rule. Isolated per rule: one failing rule
/// never prevents the others from running.
#[derive(Debug, thiserror::Error)]
#[error("anomaly rule failed: {0}")]
pub struct RuleError(pub String);

/// Scans accumulated decisions for misuse patterns.
///
/// Holds a shared reference to the manager, not ownership; any number of
/// monitors may observe the same manager.
pub struct AnomalyMonitor {
    manager: Arc<PermissionManager>,
}

impl AnomalyMonitor {
    /// Create a monitor over a manager.
    pub fn new(manager: Arc<PermissionManager>) -> Self {
        Self { manager }
    }

    /// Run all detection rules over one consistent snapshot.
    ///
    /// Returns anomalies ordered by descending severity; ties keep
    /// detection order. A rule that fails is logged and skipped.
    pub fn detect_anomalies(&self) -> Vec<SecurityAnomaly> {
        Self::run_rules(&self.manager.observe())
    }

    fn run_rules(snapshot: &ObservationSnapshot) -> Vec<SecurityAnomaly> {
        let mut anomalies = Vec::new();
        for (name, rule) in rules::RULES {
            match rule(snapshot) {
                Ok(found) => anomalies.extend(found),
                Err(e) => warn!(rule = name, error = %e, "anomaly rule skipped"),
            }
        }

        // Stable sort: severity descending, detection order preserved within
        // a severity level.
        anomalies.sort_by(|a, b| b.severity.cmp(&a.severity));
        anomalies
    }

    /// Bundle counts, anomalies and per-kind recommendations into a report.
    ///
    /// Counts and anomalies come from the same snapshot, so a report never
    /// mixes totals from one instant with anomalies from another.
    pub fn generate_security_report(&self) -> SecurityReport {
        let snapshot = self.manager.observe();
        let anomalies = Self::run_rules(&snapshot);
        SecurityReport::assemble(
            snapshot.metrics.total_checks,
            snapshot.metrics.allowed,
            snapshot.metrics.denied,
            anomalies,
        )
    }

    /// Spawn a periodic scan, delivering reports over a channel.
    ///
    /// The task stops when the returned receiver is dropped. Must be called
    /// from within a tokio runtime.
    pub fn watch(&self, interval: Duration) -> tokio::sync::mpsc::Receiver<SecurityReport> {
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let manager = Arc::clone(&self.manager);

        tokio::spawn(async move {
            let monitor = AnomalyMonitor::new(manager);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(monitor.generate_security_report()).await.is_err() {
                    break;
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CallContext, OperationType, PermissionPolicy};

    fn manager_with_denials(denied: usize) -> Arc<PermissionManager> {
        let manager = Arc::new(PermissionManager::new());
        let ctx = CallContext::new();
        for _ in 0..denied {
            // No policy registered: every check is a denial.
            manager.check_permission("rogue", "probe", OperationType::Execute, &ctx);
        }
        manager
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_clean_manager_has_no_anomalies() {
        let monitor = AnomalyMonitor::new(Arc::new(PermissionManager::new()));
        assert!(monitor.detect_anomalies().is_empty());
        assert!(monitor.generate_security_report().is_clean());
    }

    #[test]
    fn test_detection_is_repeatable() {
        let monitor = AnomalyMonitor::new(manager_with_denials(6));
        let first = monitor.detect_anomalies();
        let second = monitor.detect_anomalies();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.severity, b.severity);
            assert_eq!(a.description, b.description);
        }
    }

    #[test]
    fn test_anomalies_sorted_by_descending_severity() {
        // 20 denials: critical RepeatedViolations, critical denial rate,
        // high ToolTargeting.
        let monitor = AnomalyMonitor::new(manager_with_denials(20));
        let anomalies = monitor.detect_anomalies();

        assert!(!anomalies.is_empty());
        for pair in anomalies.windows(2) {
            assert!(pair[0].severity >= pair[1].severity);
        }
        assert_eq!(anomalies[0].severity, Severity::Critical);
    }

    #[test]
    fn test_report_includes_counts_and_recommendations() {
        let monitor = AnomalyMonitor::new(manager_with_denials(10));
        let report = monitor.generate_security_report();

        assert_eq!(report.total_checks, 10);
        assert_eq!(report.denied, 10);
        assert_eq!(report.allowed, 0);
        assert!(report
            .recommendations
            .contains_key(&AnomalyKind::RepeatedViolations));
        assert!(report
            .recommendations
            .contains_key(&AnomalyKind::SystemWideDenialRate));
    }

    #[test]
    fn test_failing_rule_does_not_block_the_others() {
        // Counters that disagree make the denial-rate rule fail; the
        // audit-based rules still run over the same snapshot.
        let audit = (0..6)
            .map(|_| {
                crate::audit::AuditEntry::new(
                    "rogue",
                    "probe",
                    OperationType::Execute,
                    false,
                    "no policy registered",
                    serde_json::Value::Null,
                )
            })
            .collect();
        let snapshot = ObservationSnapshot {
            audit,
            metrics: crate::metrics::MetricsSnapshot {
                total_checks: 6,
                allowed: 1,
                denied: 6,
                per_agent: Default::default(),
            },
            quotas: Vec::new(),
        };

        let anomalies = AnomalyMonitor::run_rules(&snapshot);
        assert!(anomalies
            .iter()
            .any(|a| a.kind == AnomalyKind::RepeatedViolations));
        assert!(anomalies
            .iter()
            .any(|a| a.kind == AnomalyKind::ToolTargeting));
        assert!(!anomalies
            .iter()
            .any(|a| a.kind == AnomalyKind::SystemWideDenialRate));
    }

    #[test]
    fn test_scan_does_not_mutate_state() {
        let manager = manager_with_denials(3);
        let monitor = AnomalyMonitor::new(Arc::clone(&manager));

        let before = manager.get_metrics();
        monitor.detect_anomalies();
        monitor.generate_security_report();
        let after = manager.get_metrics();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_watch_delivers_reports() {
        let manager = Arc::new(PermissionManager::new());
        manager
            .register_policy(
                PermissionPolicy::new("a")
                    .allow_tool("t")
                    .allow_operation(OperationType::Read),
            )
            .unwrap();
        manager.check_permission("a", "t", OperationType::Read, &CallContext::new());

        let monitor = AnomalyMonitor::new(Arc::clone(&manager));
        let mut rx = monitor.watch(Duration::from_millis(5));

        let report = rx.recv().await.expect("report delivered");
        assert_eq!(report.total_checks, 1);

        // Dropping the receiver stops the task.
        drop(rx);
    }
}
