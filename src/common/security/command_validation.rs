//! Shell command validation.
//!
//! Commands produced by an AI agent are checked here before they can reach a
//! shell. Validation is layered and fails fast:
//!
//! 1. Global checks on the whole string ([`precheck`]): emptiness, length,
//!    unescaped newlines, line-continuation folding, dangerous patterns.
//! 2. Chain decomposition on `&&`, `||`, `;` and `|` ([`split_chain`]).
//! 3. For every segment: tokenization ([`parse_segment`]) followed by the
//!    segment checks ([`check_segment`]): executable allowlist, `sh`/`bash`
//!    script-only use, interpreter eval flags, `python -m` modules, and
//!    redirect targets.
//!
//! Validation is pure: no I/O, no logging, no shared mutable state. The same
//! input against the same [`RuleTables`] always yields the same outcome.
//!
//! # Examples
//!
//! ```
//! use cmdguard_mcp::common::security::{validate_command, ValidationError};
//!
//! assert!(validate_command("BUILD_COMMAND", "npm install && npm test").is_ok());
//!
//! let err = validate_command("BUILD_COMMAND", "sh -c 'npm install'").unwrap_err();
//! assert!(matches!(err, ValidationError::ImproperShellUsage { .. }));
//! ```

use super::chain::split_chain;
use super::error::ValidationError;
use super::policy::check_segment;
use super::precheck::precheck;
use super::rules::{default_rules, RuleTables};
use super::segment::{extract_redirects, parse_segment};
use serde::Serialize;
use std::sync::Arc;

/// One approved segment, as the engine understood it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovedSegment {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// `None` for a segment holding only redirects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    pub args: Vec<String>,
    pub redirects: Vec<String>,
}

/// A command that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovedCommand {
    /// Command text after line-continuation folding
    pub normalized: String,
    pub segments: Vec<ApprovedSegment>,
}

/// Validate `command` against `rules`, returning how it was decomposed
pub fn analyze(
    rules: &RuleTables,
    label: &str,
    command: &str,
) -> Result<ApprovedCommand, ValidationError> {
    let normalized = precheck(rules, label, command)?;
    let chain = split_chain(rules, label, normalized.as_str())?;

    let mut segments = Vec::with_capacity(chain.len());
    for link in chain.iter() {
        let parsed = parse_segment(link.segment);
        check_segment(rules, label, link.segment, parsed.as_ref())?;

        let (executable, args) = match parsed {
            Some(p) => (Some(p.executable), p.args),
            None => (None, Vec::new()),
        };
        segments.push(ApprovedSegment {
            text: link.segment.to_string(),
            operator: link.operator.map(str::to_string),
            executable,
            args,
            redirects: extract_redirects(link.segment),
        });
    }

    Ok(ApprovedCommand {
        normalized: normalized.as_str().to_string(),
        segments,
    })
}

/// Validate `command` against `rules`
pub fn validate(rules: &RuleTables, label: &str, command: &str) -> Result<(), ValidationError> {
    analyze(rules, label, command).map(|_| ())
}

/// Validate `command` against the built-in rule set
pub fn validate_command(label: &str, command: &str) -> Result<(), ValidationError> {
    validate(&default_rules(), label, command)
}

/// Validator bound to a shared rule set
#[derive(Debug, Clone)]
pub struct CommandValidator {
    rules: Arc<RuleTables>,
}

impl CommandValidator {
    pub fn new(rules: Arc<RuleTables>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTables {
        &self.rules
    }

    pub fn validate(&self, label: &str, command: &str) -> Result<(), ValidationError> {
        validate(&self.rules, label, command)
    }

    pub fn analyze(&self, label: &str, command: &str) -> Result<ApprovedCommand, ValidationError> {
        analyze(&self.rules, label, command)
    }
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::new(default_rules())
    }
}
