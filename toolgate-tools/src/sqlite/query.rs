use std::path::PathBuf;

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use crate::prelude::*;

/// Input for read-only query execution
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SqliteQueryInput {
    /// SQL to execute (SELECT, EXPLAIN, or PRAGMA only)
    pub query: String,

    /// Maximum number of rows to return (default: 1000)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    1000
}

/// Tool for executing read-only queries against one SQLite database.
///
/// Statements are parsed before execution; anything that is not a query
/// (INSERT, UPDATE, DELETE, DDL, multi-statement batches mixing in writes)
/// is rejected.
pub struct SqliteQueryTool {
    db_path: PathBuf,
}

impl SqliteQueryTool {
    /// Create a tool bound to one database file.
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    fn ensure_read_only(sql: &str) -> std::result::Result<(), ToolError> {
        let dialect = SQLiteDialect {};
        let statements = Parser::parse_sql(&dialect, sql)
            .map_err(|e| ToolError::from(format!("Failed to parse SQL: {}", e)))?;

        if statements.is_empty() {
            return Err(ToolError::from("Empty SQL statement".to_string()));
        }

        for statement in &statements {
            match statement {
                Statement::Query(_) | Statement::Explain { .. } | Statement::Pragma { .. } => {}
                other => {
                    return Err(ToolError::from(format!(
                        "Only read-only statements are allowed, got: {}",
                        statement_kind(other)
                    )))
                }
            }
        }
        Ok(())
    }
}

fn statement_kind(statement: &Statement) -> &'static str {
    match statement {
        Statement::Insert(_) => "INSERT",
        Statement::Update { .. } => "UPDATE",
        Statement::Delete(_) => "DELETE",
        Statement::CreateTable(_) => "CREATE TABLE",
        Statement::Drop { .. } => "DROP",
        Statement::AlterTable { .. } => "ALTER TABLE",
        _ => "a non-query statement",
    }
}

fn sql_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Value::from(f),
        ValueRef::Text(t) => serde_json::Value::from(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => serde_json::Value::from(format!("<blob {} bytes>", b.len())),
    }
}

impl Tool for SqliteQueryTool {
    type Input = SqliteQueryInput;

    fn name(&self) -> &str {
        "sqlite_query"
    }

    fn description(&self) -> &str {
        "Execute a read-only SQL query (SELECT, EXPLAIN, PRAGMA) against the configured SQLite database. Returns column names and row data."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        Self::ensure_read_only(&input.query)?;

        let conn = Connection::open(&self.db_path)
            .map_err(|e| ToolError::from(format!("Failed to open database: {}", e)))?;

        let mut stmt = conn
            .prepare(&input.query)
            .map_err(|e| ToolError::from(format!("Failed to prepare query: {}", e)))?;

        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut rows_result = stmt
            .query([])
            .map_err(|e| ToolError::from(format!("Query failed: {}", e)))?;

        let mut rows: Vec<Vec<serde_json::Value>> = Vec::new();
        while let Some(row) = rows_result
            .next()
            .map_err(|e| ToolError::from(format!("Row read failed: {}", e)))?
        {
            if rows.len() >= input.limit {
                break;
            }
            let mut row_data = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                let value = row
                    .get_ref(i)
                    .map_err(|e| ToolError::from(format!("Column read failed: {}", e)))?;
                row_data.push(sql_to_json(value));
            }
            rows.push(row_data);
        }

        ToolResult::json(serde_json::json!({
            "columns": columns,
            "row_count": rows.len(),
            "rows": rows,
        }))
        .map_err(ToolError::from)
    }
}
