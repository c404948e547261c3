//! # Sprout application library
//!
//! HTTP API, CLI and configuration for the Sprout server. Exposed as a
//! library so integration tests can build the router in-process.

pub mod api;
pub mod cli;
pub mod config;
