/// Helpers connecting validation and audit logging to MCP tools
use super::{AuditLogger, ValidationError};
use rmcp::ErrorData as McpError;
use serde_json::json;
use std::time::Instant;

/// Convert ValidationError to McpError
pub fn validation_error_to_mcp(err: ValidationError) -> McpError {
    McpError::invalid_params(
        err.to_string(),
        Some(json!({
            "kind": err.kind(),
            "label": err.label(),
            "validation_error": format!("{:?}", err),
        })),
    )
}

/// Audit tool execution with timing
pub async fn audit_tool_execution<F, Fut, T>(
    audit: &AuditLogger,
    tool_name: &str,
    parameters: Option<serde_json::Value>,
    f: F,
) -> Result<T, McpError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, McpError>>,
{
    let start = Instant::now();
    let result = f().await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => {
            audit.log_tool_invocation(tool_name, parameters, true, None, duration_ms);
        }
        Err(e) => {
            audit.log_tool_invocation(
                tool_name,
                parameters,
                false,
                Some(e.message.to_string()),
                duration_ms,
            );
        }
    }

    result
}
