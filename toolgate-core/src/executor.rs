//! Permission-gated tool execution.
//!
//! [`SecureExecutor`] is the only path from an agent's request to a tool's
//! code: every invocation goes through [`PermissionManager::check_permission`]
//! first, so a tool body can never run without a matching audit entry. A
//! denial is a normal outcome ([`ToolOutcome::Denied`]), not an error;
//! errors are reserved for invocation problems (bad input, unregistered
//! tool) and tool failures.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::manager::{CallContext, DenialReason, PermissionManager};
use crate::policy::OperationType;
use crate::tool::{box_tool, DynTool, Tool, ToolError, ToolResult};

/// Error from an invocation attempt.
///
/// Permission denials are NOT errors; they come back as
/// [`ToolOutcome::Denied`].
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// Tool input must be a JSON object.
    #[error("Tool input must be a JSON object, got: {0}")]
    InvalidInput(String),

    /// The call was allowed but no tool with this name is registered.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The tool ran and failed.
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Outcome of a permitted invocation attempt.
#[derive(Debug)]
pub enum ToolOutcome {
    /// The call was checked, allowed, and the tool produced a result.
    Completed(ToolResult),

    /// The call was checked and denied. The denial is already audited.
    Denied { reason: DenialReason },
}

impl ToolOutcome {
    pub fn is_denied(&self) -> bool {
        matches!(self, ToolOutcome::Denied { .. })
    }

    /// The tool result, if the call completed.
    pub fn result(&self) -> Option<&ToolResult> {
        match self {
            ToolOutcome::Completed(result) => Some(result),
            ToolOutcome::Denied { .. } => None,
        }
    }
}

/// Executes tools only after a permission check passes.
///
/// Each registered tool carries an [`OperationType`] classification used
/// for the check. A tool name with no registered classification is treated
/// as [`OperationType::Execute`], the most restrictive class, so an
/// unclassified tool is never accidentally matched by a broad read-only
/// policy.
pub struct SecureExecutor {
    manager: Arc<PermissionManager>,
    tools: HashMap<String, Box<dyn DynTool>>,
    operations: HashMap<String, OperationType>,
}

impl SecureExecutor {
    /// Create an executor over a manager, with no tools registered.
    pub fn new(manager: Arc<PermissionManager>) -> Self {
        Self {
            manager,
            tools: HashMap::new(),
            operations: HashMap::new(),
        }
    }

    /// Register a tool under an operation classification.
    ///
    /// Re-registering a name replaces the previous tool and classification.
    pub fn register<T: Tool + 'static>(&mut self, tool: T, operation: OperationType) {
        self.register_boxed(box_tool(tool), operation);
    }

    /// Register an already-boxed tool under an operation classification.
    pub fn register_boxed(&mut self, tool: Box<dyn DynTool>, operation: OperationType) {
        let name = tool.name().to_string();
        self.operations.insert(name.clone(), operation);
        self.tools.insert(name, tool);
    }

    /// The operation classification a tool name will be checked under.
    pub fn classification(&self, tool_name: &str) -> OperationType {
        self.operations
            .get(tool_name)
            .copied()
            .unwrap_or(OperationType::Execute)
    }

    /// List registered tool names.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Check permission, then run the tool.
    ///
    /// The permission check always runs first, even for unregistered tool
    /// names or malformed input, so every attempt lands in the audit log.
    pub async fn invoke(
        &self,
        agent_id: &str,
        tool_name: &str,
        input: Value,
        context: &CallContext,
    ) -> Result<ToolOutcome, ExecutorError> {
        let operation = self.classification(tool_name);

        let decision = self
            .manager
            .check_permission(agent_id, tool_name, operation, context);
        if let Some(reason) = decision.reason_denied() {
            debug!(agent_id, tool_name, %reason, "invocation denied");
            return Ok(ToolOutcome::Denied { reason });
        }

        if !input.is_object() {
            let type_name = match &input {
                Value::Null => "null",
                Value::Bool(_) => "boolean",
                Value::Number(_) => "number",
                Value::String(_) => "string",
                Value::Array(_) => "array",
                Value::Object(_) => "object",
            };
            return Err(ExecutorError::InvalidInput(type_name.to_string()));
        }

        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| ExecutorError::ToolNotFound(tool_name.to_string()))?;

        let result = tool.execute_raw(input).await?;
        Ok(ToolOutcome::Completed(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PermissionPolicy;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EchoInput {
        message: String,
    }

    struct EchoTool;

    impl Tool for EchoTool {
        type Input = EchoInput;

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the input back"
        }

        async fn execute(&self, input: Self::Input) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::text(input.message))
        }
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EmptyInput {}

    struct FailingTool;

    impl Tool for FailingTool {
        type Input = EmptyInput;

        fn name(&self) -> &str {
            "failing_tool"
        }

        fn description(&self) -> &str {
            "A tool that always fails"
        }

        async fn execute(&self, _input: Self::Input) -> Result<ToolResult, ToolError> {
            Err(ToolError::Custom("Tool execution failed".to_string()))
        }
    }

    fn permissive_manager(agent_id: &str) -> Arc<PermissionManager> {
        let manager = Arc::new(PermissionManager::new());
        manager
            .register_policy(
                PermissionPolicy::new(agent_id)
                    .allow_tool("echo")
                    .allow_tool("failing_tool")
                    .allow_operation(OperationType::Read)
                    .allow_operation(OperationType::Execute),
            )
            .unwrap();
        manager
    }

    // ===== Classification Tests =====

    #[test]
    fn test_unregistered_tool_classified_as_execute() {
        let executor = SecureExecutor::new(Arc::new(PermissionManager::new()));
        assert_eq!(executor.classification("mystery"), OperationType::Execute);
    }

    #[test]
    fn test_registered_tool_keeps_its_classification() {
        let mut executor = SecureExecutor::new(Arc::new(PermissionManager::new()));
        executor.register(EchoTool, OperationType::Read);
        assert_eq!(executor.classification("echo"), OperationType::Read);
    }

    // ===== invoke Tests =====

    #[tokio::test]
    async fn test_invoke_allowed_tool() {
        let manager = permissive_manager("agent");
        let mut executor = SecureExecutor::new(Arc::clone(&manager));
        executor.register(EchoTool, OperationType::Read);

        let outcome = executor
            .invoke(
                "agent",
                "echo",
                serde_json::json!({"message": "hi"}),
                &CallContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.result().unwrap().as_text(), "hi");
    }

    #[tokio::test]
    async fn test_denial_is_an_outcome_not_an_error() {
        // No policy registered: the check denies.
        let manager = Arc::new(PermissionManager::new());
        let mut executor = SecureExecutor::new(Arc::clone(&manager));
        executor.register(EchoTool, OperationType::Read);

        let outcome = executor
            .invoke(
                "stranger",
                "echo",
                serde_json::json!({"message": "hi"}),
                &CallContext::new(),
            )
            .await
            .unwrap();

        match outcome {
            ToolOutcome::Denied { reason } => assert_eq!(reason, DenialReason::NoPolicy),
            ToolOutcome::Completed(_) => panic!("expected denial"),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_checked_as_execute() {
        // Policy only grants Read. An unregistered name is classified as
        // Execute, so the check denies on the operation allowlist.
        let manager = Arc::new(PermissionManager::new());
        manager
            .register_policy(
                PermissionPolicy::new("agent")
                    .allow_tool("mystery")
                    .allow_operation(OperationType::Read),
            )
            .unwrap();
        let executor = SecureExecutor::new(Arc::clone(&manager));

        let outcome = executor
            .invoke("agent", "mystery", serde_json::json!({}), &CallContext::new())
            .await
            .unwrap();

        match outcome {
            ToolOutcome::Denied { reason } => {
                assert_eq!(reason, DenialReason::OperationNotPermitted)
            }
            ToolOutcome::Completed(_) => panic!("expected denial"),
        }
    }

    #[tokio::test]
    async fn test_allowed_but_unregistered_tool_is_not_found() {
        let manager = permissive_manager("agent");
        let executor = SecureExecutor::new(Arc::clone(&manager));

        let err = executor
            .invoke("agent", "echo", serde_json::json!({}), &CallContext::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::ToolNotFound(_)));
        // The attempt was still checked and audited.
        let log = manager.get_audit_log(None, None);
        assert_eq!(log.len(), 1);
        assert!(log[0].allowed);
    }

    #[tokio::test]
    async fn test_invoke_rejects_non_object_input() {
        let manager = permissive_manager("agent");
        let mut executor = SecureExecutor::new(Arc::clone(&manager));
        executor.register(EchoTool, OperationType::Read);

        let err = executor
            .invoke(
                "agent",
                "echo",
                serde_json::json!([1, 2, 3]),
                &CallContext::new(),
            )
            .await
            .unwrap_err();

        match err {
            ExecutorError::InvalidInput(type_name) => assert_eq!(type_name, "array"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_tool_failure_passes_through() {
        let manager = permissive_manager("agent");
        let mut executor = SecureExecutor::new(Arc::clone(&manager));
        executor.register(FailingTool, OperationType::Execute);

        let err = executor
            .invoke(
                "agent",
                "failing_tool",
                serde_json::json!({}),
                &CallContext::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::Tool(_)));
    }

    #[tokio::test]
    async fn test_every_invocation_lands_in_the_audit_log() {
        let manager = permissive_manager("agent");
        let mut executor = SecureExecutor::new(Arc::clone(&manager));
        executor.register(EchoTool, OperationType::Read);

        executor
            .invoke(
                "agent",
                "echo",
                serde_json::json!({"message": "a"}),
                &CallContext::new(),
            )
            .await
            .unwrap();
        executor
            .invoke(
                "nobody",
                "echo",
                serde_json::json!({"message": "b"}),
                &CallContext::new(),
            )
            .await
            .unwrap();

        let log = manager.get_audit_log(None, None);
        assert_eq!(log.len(), 2);
        assert!(log[0].allowed);
        assert!(!log[1].allowed);
    }
}
