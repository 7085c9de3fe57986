//! Call context passed through a permission check.

use serde_json::{Map, Value};

/// Context accompanying one permission check.
///
/// Carries the pre-resolved approval outcome and arbitrary metadata that is
/// snapshotted into the audit entry. The approval workflow itself (UI,
/// human reviewer) lives outside this core; by the time a check runs, the
/// approval is already a boolean. Nothing here is ever awaited.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    approval_granted: bool,
    metadata: Map<String, Value>,
}

impl CallContext {
    /// Context with no resolved approval.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context carrying a resolved approval.
    pub fn approved() -> Self {
        Self {
            approval_granted: true,
            metadata: Map::new(),
        }
    }

    /// Attach a metadata field, recorded verbatim in the audit entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether an approval has been resolved for this call.
    pub fn approval_granted(&self) -> bool {
        self.approval_granted
    }

    /// Snapshot for auditing: metadata plus the approval flag.
    pub fn snapshot(&self) -> Value {
        let mut map = self.metadata.clone();
        map.insert(
            "approval_granted".to_string(),
            Value::Bool(self.approval_granted),
        );
        Value::Object(map)
    }
}
