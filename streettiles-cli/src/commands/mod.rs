//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`init`] - Configuration initialization
//! - [`quantize`] - Index tile lookup
//! - [`serve`] - HTTP tile server
//! - [`tile`] - Single tile generation

pub mod init;
pub mod quantize;
pub mod serve;
pub mod tile;
