//! Policy storage.

use std::collections::HashMap;

use super::policy::{PermissionPolicy, PolicyError};

/// Holds one [`PermissionPolicy`] per agent identity.
///
/// The store is owned by the [`crate::PermissionManager`] and mutated only
/// through it; lookup is O(1). Registering a policy for an agent that
/// already has one replaces it (hot-reload). A replacement does not touch
/// the agent's in-flight session counters.
#[derive(Debug, Default)]
pub struct PolicyStore {
    policies: HashMap<String, PermissionPolicy>,
}

impl PolicyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy, replacing any existing policy for the same agent.
    ///
    /// The policy is validated first and rejected with
    /// [`PolicyError::InvalidConfiguration`] if malformed. Rejection happens
    /// here, at registration time, never silently later.
    pub fn register(&mut self, policy: PermissionPolicy) -> Result<(), PolicyError> {
        policy.validate()?;
        self.policies.insert(policy.agent_id.clone(), policy);
        Ok(())
    }

    /// Look up the policy for an agent.
    ///
    /// Absence is not an error condition for callers; the manager treats a
    /// missing policy as fail-secure deny.
    pub fn lookup(&self, agent_id: &str) -> Option<&PermissionPolicy> {
        self.policies.get(agent_id)
    }

    /// Remove the policy for an agent, returning it if present.
    pub fn remove(&mut self, agent_id: &str) -> Option<PermissionPolicy> {
        self.policies.remove(agent_id)
    }

    /// Number of registered policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the store has no policies.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Iterate over registered agent identities.
    pub fn agent_ids(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(|s| s.as_str())
    }
}
