//! Rocket Runtime
//!
//! Hosts Lua scripts with the Rocket standard library installed: session
//! lifecycle, `rocket.toml` configuration and log setup.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use config::{ConfigError, RocketConfig};
pub use error::RuntimeError;
pub use session::{RuntimeOptions, Session};
