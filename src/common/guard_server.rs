use crate::common::security::helpers::audit_tool_execution;
use crate::common::security::{
    audit_logger, validation_error_to_mcp, ApprovedCommand, AuditLogger, CommandValidator,
    RuleTables,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars,
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use serde_json::json;
use std::sync::Arc;

/// Label used when a caller does not name the command
pub const DEFAULT_LABEL: &str = "command";

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ValidateCommandArgs {
    /// Shell command to validate (e.g., "npm install && npm test")
    pub command: String,
    /// Name shown in rejection messages (e.g., "BUILD_COMMAND"; default: "command")
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ExplainCommandArgs {
    /// Shell command to break down
    pub command: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ListRulesArgs {}

#[derive(Clone)]
pub struct GuardServer {
    tool_router: ToolRouter<GuardServer>,
    audit: Arc<AuditLogger>,
    validator: CommandValidator,
}

impl Default for GuardServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl GuardServer {
    pub fn new() -> Self {
        Self::with_validator(CommandValidator::default())
    }

    /// Server enforcing a custom rule set
    pub fn with_validator(validator: CommandValidator) -> Self {
        Self {
            tool_router: Self::tool_router(),
            audit: audit_logger(),
            validator,
        }
    }

    #[tool(
        description = "Validate an AI-generated shell command against the build command allowlist. \
                       Returns the approved segments, or an invalid_params error \
                       naming the rejection reason.",
        annotations(read_only_hint = true)
    )]
    pub async fn validate_command(
        &self,
        Parameters(ValidateCommandArgs { command, label }): Parameters<ValidateCommandArgs>,
    ) -> Result<CallToolResult, McpError> {
        let label = label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LABEL.to_string());

        audit_tool_execution(
            &self.audit,
            "validate_command",
            Some(json!({"label": &label, "command": &command})),
            || async {
                match self.validator.analyze(&label, &command) {
                    Ok(approved) => {
                        self.audit.log_command_approved(&label, approved.segments.len());
                        Ok(CallToolResult::success(vec![Content::text(
                            format_approval(&label, &approved),
                        )]))
                    }
                    Err(err) => {
                        self.audit.log_command_rejected(&err);
                        Err(validation_error_to_mcp(err))
                    }
                }
            },
        )
        .await
    }

    #[tool(
        description = "Show how a shell command is split and tokenized (segments, operators, \
                       executables, arguments, redirect targets) together with \
                       the validation verdict",
        annotations(read_only_hint = true)
    )]
    pub async fn explain_command(
        &self,
        Parameters(ExplainCommandArgs { command }): Parameters<ExplainCommandArgs>,
    ) -> Result<CallToolResult, McpError> {
        audit_tool_execution(
            &self.audit,
            "explain_command",
            Some(json!({"command": &command})),
            || async {
                let text = match self.validator.analyze(DEFAULT_LABEL, &command) {
                    Ok(approved) => format!("Verdict: APPROVED\n\n{}", format_breakdown(&approved)),
                    Err(err) => format!("Verdict: REJECTED ({})\nReason: {}", err.kind(), err),
                };
                Ok(CallToolResult::success(vec![Content::text(text)]))
            },
        )
        .await
    }

    #[tool(
        description = "List the validation rules: allowed executables, operators, limits, \
                       interpreter flags, Python modules and dangerous patterns",
        annotations(read_only_hint = true)
    )]
    pub async fn list_rules(
        &self,
        Parameters(ListRulesArgs {}): Parameters<ListRulesArgs>,
    ) -> Result<CallToolResult, McpError> {
        audit_tool_execution(&self.audit, "list_rules", None, || async {
            Ok(CallToolResult::success(vec![Content::text(format_rules(
                self.validator.rules(),
            ))]))
        })
        .await
    }
}

fn format_approval(label: &str, approved: &ApprovedCommand) -> String {
    format!(
        "{} approved ({} segment{})\n\n{}",
        label,
        approved.segments.len(),
        if approved.segments.len() == 1 { "" } else { "s" },
        format_breakdown(approved)
    )
}

fn format_breakdown(approved: &ApprovedCommand) -> String {
    let mut out = format!("Normalized: {}\n", approved.normalized);
    for (i, segment) in approved.segments.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n", i + 1, segment.text));
        match &segment.executable {
            Some(exe) => out.push_str(&format!("   executable: {}\n", exe)),
            None => out.push_str("   executable: (none, redirect only)\n"),
        }
        if !segment.args.is_empty() {
            out.push_str(&format!("   args: {:?}\n", segment.args));
        }
        if !segment.redirects.is_empty() {
            out.push_str(&format!("   redirects: {}\n", segment.redirects.join(", ")));
        }
        if let Some(op) = &segment.operator {
            out.push_str(&format!("   then: {}\n", op));
        }
    }
    out
}

fn format_rules(rules: &RuleTables) -> String {
    let executables: Vec<&str> = rules.allowed_executables().collect();
    let operators: Vec<&str> = rules.allowed_operators().collect();
    let modules: Vec<&str> = rules.allowed_python_modules().collect();

    let mut out = String::from("Command Validation Rules\n\n");
    out.push_str(&format!(
        "Limits: {} characters, {} chained segments\n\n",
        rules.max_command_length(),
        rules.max_segments()
    ));
    out.push_str(&format!("Allowed operators: {}\n\n", operators.join(" ")));
    out.push_str(&format!("Allowed executables:\n  {}\n\n", executables.join(", ")));
    out.push_str("sh/bash: only `sh ./script.sh` style invocations; -c is blocked\n\n");

    out.push_str("Blocked interpreter flags:\n");
    for (exe, flags) in rules.restricted_interpreters() {
        out.push_str(&format!("  {}: {}\n", exe, flags.join(", ")));
    }

    out.push_str(&format!("\nAllowed python -m modules:\n  {}\n\n", modules.join(", ")));

    out.push_str("Dangerous patterns (blocked anywhere in the command):\n");
    for pattern in rules.dangerous_patterns() {
        out.push_str(&format!("  {}\n", pattern));
    }

    out.push_str("\nRedirects (`>`, `>>`, `>&file`): relative paths only after quote removal; ");
    out.push_str("no leading / or ~, no .., no $ expansion\n");
    out
}

#[tool_handler]
impl ServerHandler for GuardServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "This server vets shell commands before an automation pipeline executes them. \
                \n\nTools: \
                \n- validate_command - approve or reject an AI-generated build/format command \
                \n- explain_command - show how a command is split and tokenized \
                \n- list_rules - show the allowlists, limits and blocked patterns \
                \n\nOnly commands that validate_command approves may be handed to a shell. \
                Rejections name the offending pattern, executable, flag, module or path."
                    .to_string(),
            ),
        }
    }

    async fn initialize(
        &self,
        _request: InitializeRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        if let Some(http_request_part) = context.extensions.get::<axum::http::request::Parts>() {
            let initialize_headers = &http_request_part.headers;
            let initialize_uri = &http_request_part.uri;
            tracing::info!(?initialize_headers, %initialize_uri, "initialize from http server");
        }
        Ok(self.get_info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::security::CommandValidator;

    #[test]
    fn test_format_rules_lists_tables() {
        let text = format_rules(&RuleTables::new());
        assert!(text.contains("10000 characters, 50 chained segments"));
        assert!(text.contains("mvn"));
        assert!(text.contains("node: -e, --eval"));
        assert!(text.contains("pytest"));
        assert!(text.contains(r"\$\("));
    }

    #[test]
    fn test_format_breakdown() {
        let approved = CommandValidator::default()
            .analyze("BUILD_COMMAND", "npm test > build.log && make")
            .unwrap();
        let text = format_breakdown(&approved);
        assert!(text.contains("1. npm test > build.log"));
        assert!(text.contains("redirects: build.log"));
        assert!(text.contains("then: &&"));
        assert!(text.contains("2. make"));
    }

    #[test]
    fn test_format_approval_pluralizes() {
        let approved = CommandValidator::default().analyze("X", "make").unwrap();
        assert!(format_approval("X", &approved).starts_with("X approved (1 segment)"));
    }

    #[test]
    fn test_server_info_advertises_tools() {
        let info = GuardServer::new().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("validate_command"));
    }
}
