//! Ready-to-use tool implementations for the toolgate authorization core.
//!
//! Each tool implements [`toolgate_core::Tool`] and is meant to be
//! registered with a [`toolgate_core::SecureExecutor`] under an operation
//! classification. The grouping functions in each module return tools
//! already paired with the classification they should be checked under:
//!
//! ```ignore
//! use std::sync::Arc;
//! use toolgate_core::{PermissionManager, SecureExecutor};
//! use toolgate_tools::filesystem;
//!
//! let manager = Arc::new(PermissionManager::new());
//! let mut executor = SecureExecutor::new(Arc::clone(&manager));
//! for (tool, operation) in filesystem::read_only_tools("/app/data".into()) {
//!     executor.register_boxed(tool, operation);
//! }
//! ```

#[cfg(feature = "filesystem")]
pub mod filesystem;
#[cfg(feature = "search")]
pub mod search;
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export validate_path at crate root for convenience
#[cfg(feature = "filesystem")]
pub use filesystem::validate_path;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use schemars::JsonSchema;
    pub use serde::{Deserialize, Serialize};
    pub use toolgate_core::{Tool, ToolError, ToolResult};
}
