/// Audit logging for command vetting decisions
/// Provides structured logging of approvals, rejections and trusted bypasses
use super::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Security levels for audit events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SecurityLevel {
    /// Normal operation
    Info,
    /// Rejected or suspicious input
    Warning,
    /// Security violation or failure
    Error,
}

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type")]
pub enum AuditEvent {
    /// Tool invocation
    ToolInvoked {
        tool_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        parameters: Option<serde_json::Value>,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        duration_ms: u64,
    },

    /// Command passed validation
    CommandApproved { label: String, segments: usize },

    /// Command failed validation
    CommandRejected {
        label: String,
        kind: String,
        reason: String,
    },

    /// Command came from a trusted source and was not validated
    TrustedCommandSkipped { label: String },
}

/// Audit logger implementation
#[derive(Clone)]
pub struct AuditLogger {
    _marker: std::marker::PhantomData<()>,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }

    /// Log an audit event with security level
    pub fn log(&self, level: SecurityLevel, event: AuditEvent) {
        let event_json = serde_json::to_string(&event)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize event: {}\"}}", e));

        match level {
            SecurityLevel::Info => {
                info!(
                    security_level = "info",
                    event = %event_json,
                    "Security audit event"
                );
            }
            SecurityLevel::Warning => {
                warn!(
                    security_level = "warning",
                    event = %event_json,
                    "Security audit warning"
                );
            }
            SecurityLevel::Error => {
                error!(
                    security_level = "error",
                    event = %event_json,
                    "Security audit error"
                );
            }
        }
    }

    /// Log tool invocation
    pub fn log_tool_invocation(
        &self,
        tool_name: &str,
        parameters: Option<serde_json::Value>,
        success: bool,
        error: Option<String>,
        duration_ms: u64,
    ) {
        let event = AuditEvent::ToolInvoked {
            tool_name: tool_name.to_string(),
            parameters,
            success,
            error,
            duration_ms,
        };

        let level = if success {
            SecurityLevel::Info
        } else {
            SecurityLevel::Warning
        };

        self.log(level, event);
    }

    /// Log an approved command
    pub fn log_command_approved(&self, label: &str, segments: usize) {
        self.log(
            SecurityLevel::Info,
            AuditEvent::CommandApproved {
                label: label.to_string(),
                segments,
            },
        );
    }

    /// Log a rejected command
    pub fn log_command_rejected(&self, err: &ValidationError) {
        self.log(
            SecurityLevel::Warning,
            AuditEvent::CommandRejected {
                label: err.label().to_string(),
                kind: err.kind().to_string(),
                reason: err.to_string(),
            },
        );
    }

    /// Log a command accepted on trust without validation
    pub fn log_trusted_skip(&self, label: &str) {
        self.log(
            SecurityLevel::Info,
            AuditEvent::TrustedCommandSkipped {
                label: label.to_string(),
            },
        );
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Global audit logger instance
static AUDIT_LOGGER: once_cell::sync::Lazy<Arc<AuditLogger>> =
    once_cell::sync::Lazy::new(|| Arc::new(AuditLogger::new()));

/// Get global audit logger
pub fn audit_logger() -> Arc<AuditLogger> {
    Arc::clone(&AUDIT_LOGGER)
}
