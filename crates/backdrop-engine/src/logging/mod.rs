//! Logging utilities.
//!
//! Effects log through the `log` facade only; hosts call [`init_logging`]
//! once to install `env_logger` as the backend.

mod init;

pub use init::{init_logging, LoggingConfig};
