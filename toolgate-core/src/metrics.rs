//! Running counters derived from permission decisions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-agent decision counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetrics {
    /// Total checks for this agent.
    pub checks: u64,
    /// Checks that were allowed.
    pub allowed: u64,
    /// Checks that were denied.
    pub denied: u64,
}

/// Read-only aggregate of all decisions so far.
///
/// Snapshots are clones; taking one never mutates the underlying counters,
/// and repeated snapshots with no intervening checks are identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total permission checks across all agents.
    pub total_checks: u64,
    /// Checks that were allowed.
    pub allowed: u64,
    /// Checks that were denied.
    pub denied: u64,
    /// Counters broken down by agent.
    pub per_agent: HashMap<String, AgentMetrics>,
}

impl MetricsSnapshot {
    /// Fraction of all checks that were denied, or zero when nothing ran.
    pub fn denial_rate(&self) -> f64 {
        if self.total_checks == 0 {
            0.0
        } else {
            self.denied as f64 / self.total_checks as f64
        }
    }
}

/// Mutable counters, owned by the manager and updated once per decision.
#[derive(Debug, Default)]
pub(crate) struct MetricsAggregator {
    snapshot: MetricsSnapshot,
}

impl MetricsAggregator {
    pub(crate) fn record(&mut self, agent_id: &str, allowed: bool) {
        self.snapshot.total_checks += 1;
        let agent = self
            .snapshot
            .per_agent
            .entry(agent_id.to_string())
            .or_default();
        agent.checks += 1;
        if allowed {
            self.snapshot.allowed += 1;
            agent.allowed += 1;
        } else {
            self.snapshot.denied += 1;
            agent.denied += 1;
        }
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot.clone()
    }
}
