//! Environment configuration and command vetting.
//!
//! Build and formatting commands arrive through the environment. Whether they
//! are validated depends on where they came from: commands written by a human
//! in the workflow configuration are trusted as-is, commands produced by an AI
//! agent must pass [`validate`](crate::common::security::validate).

use crate::common::security::{analyze, AuditLogger, RuleTables, ValidationError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const BUILD_COMMAND_VAR: &str = "BUILD_COMMAND";
pub const FORMATTING_COMMAND_VAR: &str = "FORMATTING_COMMAND";
pub const COMMAND_SOURCE_VAR: &str = "CMDGUARD_COMMAND_SOURCE";
pub const SERVE_VAR: &str = "CMDGUARD_SERVE";

/// Errors raised while loading or vetting configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// A command failed validation; the message is the rejection itself
    #[error(transparent)]
    Rejected(#[from] ValidationError),
}

/// Where a candidate command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustSource {
    /// Written by a human in the configuration; not validated
    #[default]
    Config,
    /// Produced or influenced by an AI agent; always validated
    AiGenerated,
}

impl FromStr for TrustSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "config" => Ok(TrustSource::Config),
            "ai_generated" | "ai_detected" | "ai" => Ok(TrustSource::AiGenerated),
            _ => Err(ConfigError::InvalidValue {
                var: COMMAND_SOURCE_VAR.to_string(),
                expected: "config or ai_generated".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TrustSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustSource::Config => write!(f, "config"),
            TrustSource::AiGenerated => write!(f, "ai_generated"),
        }
    }
}

/// Commands and switches read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    pub build_command: Option<String>,
    pub formatting_command: Option<String>,
    pub command_source: TrustSource,
    /// Start the MCP server after vetting
    pub serve: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            build_command: None,
            formatting_command: None,
            command_source: TrustSource::Config,
            serve: true,
        }
    }
}

impl GuardConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let command_source = match get(COMMAND_SOURCE_VAR) {
            Some(value) => value.parse()?,
            None => TrustSource::default(),
        };

        let serve = match get(SERVE_VAR) {
            Some(value) => parse_bool(SERVE_VAR, &value)?,
            None => true,
        };

        Ok(Self {
            build_command: get(BUILD_COMMAND_VAR),
            formatting_command: get(FORMATTING_COMMAND_VAR),
            command_source,
            serve,
        })
    }

    /// Vet the configured commands, build first
    pub fn vet(&self, rules: &RuleTables, audit: &AuditLogger) -> Result<(), ConfigError> {
        vet_command(
            BUILD_COMMAND_VAR,
            self.build_command.as_deref(),
            self.command_source,
            rules,
            audit,
        )?;
        vet_command(
            FORMATTING_COMMAND_VAR,
            self.formatting_command.as_deref(),
            self.command_source,
            rules,
            audit,
        )
    }
}

/// Decide whether `command` may be used.
///
/// Absent or empty commands pass; whether one is required is decided when
/// loading. `Config` commands are trusted, `AiGenerated` ones are validated.
pub fn vet_command(
    label: &str,
    command: Option<&str>,
    source: TrustSource,
    rules: &RuleTables,
    audit: &AuditLogger,
) -> Result<(), ConfigError> {
    let Some(command) = command.filter(|c| !c.is_empty()) else {
        return Ok(());
    };

    match source {
        TrustSource::Config => {
            tracing::info!(
                label = %label,
                "{} from action config (trusted source), skipping allowlist validation",
                label
            );
            audit.log_trusted_skip(label);
            Ok(())
        }
        TrustSource::AiGenerated => match analyze(rules, label, command) {
            Ok(approved) => {
                audit.log_command_approved(label, approved.segments.len());
                Ok(())
            }
            Err(err) => {
                tracing::error!(label = %label, error = %err, "Command validation failed");
                audit.log_command_rejected(&err);
                Err(ConfigError::Rejected(err))
            }
        },
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            expected: "true or false".to_string(),
            value: value.to_string(),
        }),
    }
}
