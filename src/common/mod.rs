//! Common infrastructure module.
//!
//! # Modules
//!
//! - [`security`] - Command validation engine, audit logging, and MCP error conversion
//! - [`guard_server`] - MCP server exposing validation as tools
//!
//! # Architecture
//!
//! ```text
//! GuardServer
//!   ├── CommandValidator (shared Arc<RuleTables>)
//!   │   └── precheck → split_chain → parse_segment → check_segment
//!   └── AuditLogger (security event logging)
//! ```

pub mod guard_server;
pub mod security;
