//! Application-level utilities for the Hafalan CLI.
//!
//! This module provides:
//! - Path resolution for the config file and the store
//! - A lazily-configured context shared by command handlers
//! - An open store session (store handle plus loaded roster)

mod context;
mod resolver;

pub use context::{parse_format, AppContext};
pub use resolver::resolve_config_path;
