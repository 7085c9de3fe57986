//! Append-only audit trail of permission decisions.
//!
//! Every call to [`crate::PermissionManager::check_permission`] appends
//! exactly one entry, allowed or denied. Ordering is arrival order at the
//! manager's lock, not external wall-clock order. The trail lives for the
//! process lifetime; durable persistence is an extension point, not part of
//! this core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::policy::OperationType;

/// One recorded permission decision. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique id for this entry.
    pub id: Uuid,

    /// When the decision was recorded.
    pub timestamp: DateTime<Utc>,

    /// Agent the decision was made for.
    pub agent_id: String,

    /// Tool the agent asked to invoke.
    pub tool_name: String,

    /// Operation category of the invocation.
    pub operation: OperationType,

    /// Whether the call was allowed.
    pub allowed: bool,

    /// Why the call was allowed or denied.
    pub reason: String,

    /// Snapshot of the call context metadata at decision time.
    pub context: Value,
}

impl AuditEntry {
    pub(crate) fn new(
        agent_id: &str,
        tool_name: &str,
        operation: OperationType,
        allowed: bool,
        reason: &str,
        context: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            agent_id: agent_id.to_string(),
            tool_name: tool_name.to_string(),
            operation,
            allowed,
            reason: reason.to_string(),
            context,
        }
    }
}

/// Append-only ordered sequence of [`AuditEntry`] values.
///
/// Owned by the [`crate::PermissionManager`]; appends happen under its lock,
/// so entries may interleave across agents but each entry is internally
/// consistent.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub(crate) fn append(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    /// Entries matching the filters, in arrival order.
    ///
    /// `agent_id` restricts to one agent; `allowed` restricts to allowed or
    /// denied decisions. Both `None` returns the full trail.
    pub fn query(&self, agent_id: Option<&str>, allowed: Option<bool>) -> Vec<AuditEntry> {
        self.entries
            .iter()
            .filter(|e| agent_id.map_or(true, |a| e.agent_id == a))
            .filter(|e| allowed.map_or(true, |v| e.allowed == v))
            .cloned()
            .collect()
    }

    /// All entries in arrival order.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Number of recorded decisions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no decisions have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
