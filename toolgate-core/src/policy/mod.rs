//! Permission policies for agent tool use.
//!
//! This module defines the authorization rule set bound to each agent
//! identity and the store that holds one policy per agent.
//!
//! # Overview
//!
//! - **[`PermissionPolicy`]**: allowed tools/operations, forbidden
//!   operations, per-tool approval levels, session quota, rate limit
//! - **[`OperationType`]**: closed enumeration of invocation categories
//! - **[`ApprovalLevel`]**: ordered approval requirements; `Blocked` is an
//!   absolute veto
//! - **[`PolicyStore`]**: one policy per agent, O(1) lookup
//! - **[`PolicyConfig`]** / [`load_policies`] / [`load_policies_from_file`]:
//!   JSON configuration loading
//!
//! # Precedence
//!
//! Policy authors may list an operation as both allowed and forbidden;
//! forbidden always wins. A missing policy is not an error here - the
//! manager turns it into a fail-secure deny.

mod config;
mod policy;
mod store;

pub use config::{load_policies, load_policies_from_file, ConfigError, PolicyConfig};
pub use policy::{ApprovalLevel, OperationType, PermissionPolicy, PolicyError};
pub use store::PolicyStore;
