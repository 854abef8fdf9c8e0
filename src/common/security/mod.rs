//! Security infrastructure for cmdguard-mcp.
//!
//! This module decides whether a shell command string may be handed to a real
//! shell, and records those decisions.
//!
//! # Modules
//!
//! - [`rules`] - Allowlists, limits and compiled dangerous-pattern matchers
//! - [`precheck`] - Whole-command checks (length, newlines, dangerous patterns)
//! - [`chain`] - Splitting a command on `&&`, `||`, `;` and `|`
//! - [`segment`] - Tokenizing one segment, redirect extraction
//! - [`policy`] - Per-segment checks (executables, shells, interpreters, redirects)
//! - [`command_validation`] - The validation entry points
//! - [`error`] - Rejection reasons
//! - [`audit`] - Security event logging
//! - [`helpers`] - MCP error conversion and tool auditing
//!
//! # Examples
//!
//! ```
//! use cmdguard_mcp::common::security::{default_rules, validate, validate_command};
//!
//! validate_command("BUILD_COMMAND", "mvn clean install").expect("allowed");
//!
//! let rules = default_rules();
//! assert!(validate(&rules, "BUILD_COMMAND", "echo $(whoami)").is_err());
//! ```
//!
//! # Threat Model
//!
//! This module protects against:
//!
//! - **Command Injection** (OWASP A03:2021): substitution, `eval`/`exec`, hidden newlines,
//!   pipes into shells, here-documents, process substitution
//! - **Arbitrary Code Execution**: executable allowlist, `sh -c`, interpreter eval flags,
//!   `python -m` module allowlist
//! - **Path Traversal** (OWASP A01:2021): absolute, `..` and `~` redirect targets
//! - **Denial of Service**: length and segment limits applied before regex work

pub mod audit;
pub mod chain;
pub mod command_validation;
pub mod error;
pub mod helpers;
pub mod policy;
pub mod precheck;
pub mod rules;
pub mod segment;

pub use audit::{audit_logger, AuditLogger};
pub use command_validation::{
    analyze, validate, validate_command, ApprovedCommand, ApprovedSegment, CommandValidator,
};
pub use error::ValidationError;
pub use helpers::validation_error_to_mcp;
pub use precheck::find_dangerous_pattern;
pub use rules::{default_rules, DangerousPattern, RuleTables};
pub use segment::{extract_redirects, parse_segment, ParsedSegment};
