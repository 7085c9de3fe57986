use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result types that tools can return.
///
/// Tools return either plain text or structured JSON. The executor passes
/// results through to the calling agent unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ToolResult {
    /// Plain text response
    Text(String),

    /// Structured JSON data - use for complex responses
    Json(Value),
}

impl ToolResult {
    /// Create a JSON result from any serializable type
    pub fn json<T: Serialize>(value: T) -> Result<Self, serde_json::Error> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Create a text result from a string
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Get the text content, converting JSON to its string form
    pub fn as_text(&self) -> String {
        match self {
            ToolResult::Text(s) => s.clone(),
            ToolResult::Json(v) => v.to_string(),
        }
    }

    /// Get a reference to the text content if this is a Text variant
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ToolResult::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Convert strings directly to ToolResult::Text
impl From<String> for ToolResult {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for ToolResult {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Errors that can occur during tool execution
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl From<String> for ToolError {
    fn from(s: String) -> Self {
        Self::Custom(s)
    }
}

impl From<&str> for ToolError {
    fn from(s: &str) -> Self {
        Self::Custom(s.to_string())
    }
}

/// Trait for implementing tools that agents may invoke.
///
/// Tools define an input type with `#[derive(Deserialize, JsonSchema)]` to
/// automatically generate JSON schemas from Rust types. Tool correctness is
/// the tool author's concern; authorization happens in
/// [`crate::SecureExecutor`] before `execute` is ever reached.
///
/// # Example
///
/// ```rust
/// use toolgate_core::{Tool, ToolResult, ToolError};
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct LookupInput {
///     /// Term to look up
///     term: String,
/// }
///
/// struct LookupTool;
///
/// impl Tool for LookupTool {
///     type Input = LookupInput;
///
///     fn name(&self) -> &str { "lookup" }
///     fn description(&self) -> &str { "Look up a term" }
///
///     fn execute(&self, input: Self::Input) -> impl std::future::Future<Output = Result<ToolResult, ToolError>> + Send {
///         async move {
///             Ok(format!("definition of {}", input.term).into())
///         }
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    /// The input type for this tool. Must implement `Deserialize` and `JsonSchema`.
    type Input: DeserializeOwned + JsonSchema;

    /// The name of the tool (e.g., "read_file", "sqlite_query")
    fn name(&self) -> &str;

    /// A description of what the tool does
    fn description(&self) -> &str;

    /// Execute the tool with typed input
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl std::future::Future<Output = Result<ToolResult, ToolError>> + Send;

    /// Get the JSON schema for this tool's input.
    ///
    /// This is automatically implemented using the `JsonSchema` derive on `Input`.
    fn input_schema(&self) -> Value {
        let schema = schemars::schema_for!(Self::Input);
        serde_json::to_value(schema).expect("Failed to serialize schema")
    }
}

/// Object-safe trait for dynamic tool dispatch (used internally by the executor).
///
/// Users should implement `Tool` instead and use `box_tool()` to convert.
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;
    fn execute_raw(
        &self,
        input: Value,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ToolResult, ToolError>> + Send + '_>,
    >;
}

/// Convert a `Tool` into a type-erased `Box<dyn DynTool>` for storage in collections.
pub fn box_tool<T: Tool + 'static>(tool: T) -> Box<dyn DynTool> {
    Box::new(ToolWrapper(tool))
}

/// Create a `Vec<Box<dyn DynTool>>` from heterogeneous tool types.
///
/// # Example
///
/// ```ignore
/// use toolgate_core::{box_tools, OperationType, SecureExecutor};
///
/// let mut executor = SecureExecutor::new(manager);
/// for tool in box_tools![Lookup, FileReader] {
///     executor.register_boxed(tool, OperationType::Read);
/// }
/// ```
#[macro_export]
macro_rules! box_tools {
    ($($tool:expr),* $(,)?) => {
        vec![$($crate::tool::box_tool($tool)),*]
    };
}

/// Internal wrapper that implements DynTool for any Tool
struct ToolWrapper<T>(T);

impl<T: Tool + 'static> DynTool for ToolWrapper<T> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    fn input_schema(&self) -> Value {
        self.0.input_schema()
    }

    fn execute_raw(
        &self,
        input: Value,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ToolResult, ToolError>> + Send + '_>,
    > {
        Box::pin(async move {
            let typed_input: T::Input = serde_json::from_value(input)
                .map_err(|e| ToolError::Custom(format!("Failed to deserialize input: {}", e)))?;

            self.0.execute(typed_input).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    // ===== ToolResult Tests =====

    #[test]
    fn test_tool_result_text_factory() {
        let result = ToolResult::text("Hello");
        assert!(matches!(result, ToolResult::Text(_)));
        assert_eq!(result.as_text(), "Hello");
    }

    #[test]
    fn test_tool_result_json_factory() {
        #[derive(Serialize)]
        struct Payload {
            rows: usize,
        }

        let result = ToolResult::json(Payload { rows: 3 }).unwrap();
        if let ToolResult::Json(v) = &result {
            assert_eq!(v["rows"], 3);
        } else {
            panic!("Expected Json variant");
        }
    }

    #[test]
    fn test_tool_result_as_str() {
        let text = ToolResult::text("raw");
        assert_eq!(text.as_str(), Some("raw"));

        let json = ToolResult::Json(serde_json::json!({"k": 1}));
        assert!(json.as_str().is_none());
    }

    #[test]
    fn test_tool_result_from_strings() {
        let a: ToolResult = "abc".into();
        let b: ToolResult = String::from("abc").into();
        assert_eq!(a.as_text(), b.as_text());
    }

    // ===== DynTool Tests =====

    #[derive(serde::Deserialize, schemars::JsonSchema)]
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

    #[tokio::test]
    async fn test_box_tool_dispatch() {
        let tool = box_tool(EchoTool);
        assert_eq!(tool.name(), "echo");
        assert!(!tool.description().is_empty());

        let result = tool
            .execute_raw(serde_json::json!({"message": "hi"}))
            .await
            .unwrap();
        assert_eq!(result.as_text(), "hi");
    }

    #[tokio::test]
    async fn test_box_tool_bad_input() {
        let tool = box_tool(EchoTool);
        let result = tool.execute_raw(serde_json::json!({"wrong": true})).await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to deserialize input"));
    }

    #[test]
    fn test_input_schema_generated() {
        let schema = EchoTool.input_schema();
        let text = schema.to_string();
        assert!(text.contains("message"));
    }
}
