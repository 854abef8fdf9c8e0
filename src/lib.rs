// Library exports for cmdguard-mcp
// The validation engine is usable without the MCP server

pub mod common;
pub mod config;
