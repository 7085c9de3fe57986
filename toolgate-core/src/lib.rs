//! # Toolgate
//!
//! An authorization and behavioral-monitoring core for agentic tool use.
//!
//! Toolgate sits between an LLM agent and the tools it wants to invoke.
//! Every call is checked against a per-agent [`PermissionPolicy`] through a
//! fixed sequence of rules (policy existence, blocked tools, forbidden
//! operations, tool and operation allowlists, rate limits, session quotas,
//! approval requirements), and every decision leaves exactly one audit
//! entry and one metrics update. An [`AnomalyMonitor`] re-derives misuse
//! signals from that record on demand.
//!
//! ## Quick Start
//!
//! ```rust
//! use toolgate_core::{
//!     CallContext, OperationType, PermissionManager, PermissionPolicy,
//! };
//!
//! let manager = PermissionManager::new();
//! manager.register_policy(
//!     PermissionPolicy::new("researcher")
//!         .allow_tool("read_file")
//!         .allow_operation(OperationType::Read)
//!         .with_max_calls_per_session(100),
//! )?;
//!
//! let decision = manager.check_permission(
//!     "researcher",
//!     "read_file",
//!     OperationType::Read,
//!     &CallContext::new(),
//! );
//! assert!(decision.is_allowed());
//!
//! // An agent with no policy is always denied.
//! let decision = manager.check_permission(
//!     "stranger",
//!     "read_file",
//!     OperationType::Read,
//!     &CallContext::new(),
//! );
//! assert!(decision.is_denied());
//! # Ok::<(), toolgate_core::Error>(())
//! ```
//!
//! ## Gated Execution
//!
//! [`SecureExecutor`] binds real tools to the checks. Implement the
//! [`Tool`] trait, register each tool under an [`OperationType`]
//! classification, and call [`SecureExecutor::invoke`]:
//!
//! ```rust
//! use std::sync::Arc;
//! use toolgate_core::{
//!     CallContext, OperationType, PermissionManager, PermissionPolicy,
//!     SecureExecutor, Tool, ToolError, ToolResult,
//! };
//! # use schemars::JsonSchema;
//! # use serde::Deserialize;
//! #
//! # #[derive(Deserialize, JsonSchema)]
//! # struct EchoInput {
//! #     message: String,
//! # }
//! #
//! # struct EchoTool;
//! #
//! # impl Tool for EchoTool {
//! #     type Input = EchoInput;
//! #     fn name(&self) -> &str { "echo" }
//! #     fn description(&self) -> &str { "Echoes a message back" }
//! #     async fn execute(&self, input: EchoInput) -> Result<ToolResult, ToolError> {
//! #         Ok(ToolResult::text(input.message))
//! #     }
//! # }
//! #
//! # tokio_test::block_on(async {
//! let manager = Arc::new(PermissionManager::new());
//! manager
//!     .register_policy(
//!         PermissionPolicy::new("researcher")
//!             .allow_tool("echo")
//!             .allow_operation(OperationType::Read),
//!     )
//!     .unwrap();
//!
//! let mut executor = SecureExecutor::new(Arc::clone(&manager));
//! executor.register(EchoTool, OperationType::Read);
//!
//! let outcome = executor
//!     .invoke(
//!         "researcher",
//!         "echo",
//!         serde_json::json!({ "message": "hello" }),
//!         &CallContext::new(),
//!     )
//!     .await
//!     .unwrap();
//! assert!(!outcome.is_denied());
//! # });
//! ```
//!
//! Denials are ordinary [`ToolOutcome::Denied`] values. Errors are
//! reserved for malformed invocations and tool failures.
//!
//! ## Monitoring
//!
//! [`AnomalyMonitor`] scans the accumulated audit trail for repeated
//! violations, quota pressure, elevated denial rates and tool targeting,
//! and bundles its findings into a [`SecurityReport`].

pub mod audit;
pub mod error;
pub mod executor;
pub mod manager;
pub mod metrics;
pub mod monitor;
pub mod policy;
pub mod tool;

pub use audit::{AuditEntry, AuditLog};
pub use error::{Error, Result};
pub use executor::{ExecutorError, SecureExecutor, ToolOutcome};
pub use manager::{
    CallContext, Decision, DenialReason, ObservationSnapshot, PermissionManager, QuotaUsage,
};
pub use metrics::{AgentMetrics, MetricsSnapshot};
pub use monitor::{
    AnomalyKind, AnomalyMonitor, RuleError, SecurityAnomaly, SecurityReport, Severity,
};
pub use policy::{
    load_policies, load_policies_from_file, ApprovalLevel, ConfigError, OperationType,
    PermissionPolicy, PolicyConfig, PolicyError, PolicyStore,
};
pub use tool::{box_tool, DynTool, Tool, ToolError, ToolResult};
