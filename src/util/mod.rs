//! Utility modules for dockmate
//!
//! Currently this is only the structured logging setup shared by the binary and
//! by embedders of the library.

pub mod logging;

pub use logging::{init_default, init_from_env, init_logging, parse_level, LoggingConfig};
