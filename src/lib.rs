//! MCP Bridge - a local tool-serving HTTP bridge
//!
//! Exposes a fixed catalog of file tools over a small HTTP surface and
//! forwards content analysis to a local Ollama backend.

pub mod cli;
pub mod config;
pub mod error;
pub mod ollama;
pub mod server;
pub mod tools;

pub use error::{BridgeError, ErrorKind, Result};
