//! Read-only SQLite access.
//!
//! The query tool parses every statement before execution and refuses
//! anything that is not a plain query, so a policy that grants
//! `database_query` can never be leveraged into writes. The statement gate
//! runs on the parsed AST, not on string prefixes, so tricks like leading
//! comments or `WITH ... INSERT` do not slip through.

mod query;

pub use query::{SqliteQueryInput, SqliteQueryTool};

use std::path::PathBuf;

use toolgate_core::{box_tool, DynTool, OperationType};

/// The sqlite tools, paired with the operation class they should be checked
/// under when registered with a `SecureExecutor`.
pub fn read_only_tools(db_path: PathBuf) -> Vec<(Box<dyn DynTool>, OperationType)> {
    vec![(
        box_tool(SqliteQueryTool::new(db_path)),
        OperationType::DatabaseQuery,
    )]
}
