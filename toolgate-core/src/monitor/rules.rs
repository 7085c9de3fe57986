//! Detection rules.
//!
//! Each rule is a pure function over one [`ObservationSnapshot`]. Rules
//! never read live manager state, so two scans over the same snapshot
//! always produce the same anomalies.

use std::collections::BTreeMap;

use crate::manager::ObservationSnapshot;

use super::{AnomalyKind, RuleError, SecurityAnomaly, Severity};

// RepeatedViolations thresholds (denials per agent)
const VIOLATIONS_MEDIUM: usize = 5;
const VIOLATIONS_HIGH: usize = 10;
const VIOLATIONS_CRITICAL: usize = 20;

// QuotaPressure thresholds (call_count / max_calls_per_session)
const QUOTA_LOW: f64 = 0.80;
const QUOTA_MEDIUM: f64 = 0.90;
const QUOTA_HIGH: f64 = 0.95;

// SystemWideDenialRate thresholds (denied / total)
const DENIAL_RATE_HIGH: f64 = 0.30;
const DENIAL_RATE_CRITICAL: f64 = 0.50;

// ToolTargeting thresholds (denials per tool, across agents)
const TARGETING_MEDIUM: usize = 5;
const TARGETING_HIGH: usize = 10;

pub(super) type Rule = fn(&ObservationSnapshot) -> Result<Vec<SecurityAnomaly>, RuleError>;

/// All rules, in detection order. Ordering matters: severity ties in the
/// final anomaly list are broken by this order.
pub(super) const RULES: &[(&str, Rule)] = &[
    ("repeated_violations", repeated_violations),
    ("quota_pressure", quota_pressure),
    ("system_wide_denial_rate", system_wide_denial_rate),
    ("tool_targeting", tool_targeting),
];

/// Agents accumulating denials: ≥5 medium, ≥10 high, ≥20 critical.
fn repeated_violations(
    snapshot: &ObservationSnapshot,
) -> Result<Vec<SecurityAnomaly>, RuleError> {
    // BTreeMap keeps agent order deterministic across scans.
    let mut denials: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in snapshot.audit.iter().filter(|e| !e.allowed) {
        *denials.entry(entry.agent_id.as_str()).or_default() += 1;
    }

    Ok(denials
        .into_iter()
        .filter_map(|(agent, count)| {
            let severity = if count >= VIOLATIONS_CRITICAL {
                Severity::Critical
            } else if count >= VIOLATIONS_HIGH {
                Severity::High
            } else if count >= VIOLATIONS_MEDIUM {
                Severity::Medium
            } else {
                return None;
            };
            Some(SecurityAnomaly::new(
                AnomalyKind::RepeatedViolations,
                severity,
                format!(
                    "agent '{}' accumulated {} denied calls in the observation window",
                    agent, count
                ),
            )
            .for_agent(agent))
        })
        .collect())
}

/// Agents close to their session quota: ≥80% low, ≥90% medium, ≥95% high.
fn quota_pressure(snapshot: &ObservationSnapshot) -> Result<Vec<SecurityAnomaly>, RuleError> {
    let mut usages: Vec<_> = snapshot.quotas.iter().collect();
    usages.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));

    Ok(usages
        .into_iter()
        .filter_map(|usage| {
            let ratio = usage.ratio();
            let severity = if ratio >= QUOTA_HIGH {
                Severity::High
            } else if ratio >= QUOTA_MEDIUM {
                Severity::Medium
            } else if ratio >= QUOTA_LOW {
                Severity::Low
            } else {
                return None;
            };
            Some(SecurityAnomaly::new(
                AnomalyKind::QuotaPressure,
                severity,
                format!(
                    "agent '{}' has used {} of {} session calls ({:.0}%)",
                    usage.agent_id,
                    usage.call_count,
                    usage.max_calls_per_session,
                    ratio * 100.0
                ),
            )
            .for_agent(&usage.agent_id))
        })
        .collect())
}

/// Overall denial rate: ≥30% high, ≥50% critical.
///
/// Fails (and is skipped by the monitor) when the snapshot's counters do
/// not add up: a rate computed from disagreeing counters would be
/// meaningless.
fn system_wide_denial_rate(
    snapshot: &ObservationSnapshot,
) -> Result<Vec<SecurityAnomaly>, RuleError> {
    let metrics = &snapshot.metrics;
    if metrics.allowed + metrics.denied != metrics.total_checks {
        return Err(RuleError(format!(
            "counters disagree: {} allowed + {} denied != {} total checks",
            metrics.allowed, metrics.denied, metrics.total_checks
        )));
    }
    if metrics.total_checks == 0 {
        return Ok(Vec::new());
    }

    let rate = metrics.denial_rate();
    let severity = if rate >= DENIAL_RATE_CRITICAL {
        Severity::Critical
    } else if rate >= DENIAL_RATE_HIGH {
        Severity::High
    } else {
        return Ok(Vec::new());
    };

    Ok(vec![SecurityAnomaly::new(
        AnomalyKind::SystemWideDenialRate,
        severity,
        format!(
            "{} of {} checks were denied ({:.0}%) across all agents",
            metrics.denied,
            metrics.total_checks,
            rate * 100.0
        ),
    )])
}

/// One tool drawing denials from any number of agents: ≥5 medium, ≥10 high.
fn tool_targeting(snapshot: &ObservationSnapshot) -> Result<Vec<SecurityAnomaly>, RuleError> {
    let mut denials: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in snapshot.audit.iter().filter(|e| !e.allowed) {
        *denials.entry(entry.tool_name.as_str()).or_default() += 1;
    }

    Ok(denials
        .into_iter()
        .filter_map(|(tool, count)| {
            let severity = if count >= TARGETING_HIGH {
                Severity::High
            } else if count >= TARGETING_MEDIUM {
                Severity::Medium
            } else {
                return None;
            };
            Some(SecurityAnomaly::new(
                AnomalyKind::ToolTargeting,
                severity,
                format!(
                    "tool '{}' drew {} denied calls across all agents",
                    tool, count
                ),
            )
            .for_tool(tool))
        })
        .collect())
}
