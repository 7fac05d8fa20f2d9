//! `env_logger` setup for binaries built on `tkdocs`.
//!
//! Phases log at `debug` (document parsed, build started and finished),
//! single nodes and options at `trace`, and unbound callbacks that fall
//! back to a stub at `warn`.

mod init;

pub use init::{init_logging, LoggingConfig};
