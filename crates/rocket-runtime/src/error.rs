//! Runtime error types.

use crate::config::ConfigError;

/// Errors that can occur while configuring, loading or running a script.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Error raised by Lua, including errors raised by native modules
    #[error("{0}")]
    Lua(#[from] mlua::Error),

    /// The script did not define its entry function
    #[error("entry function '{0}' is not defined")]
    MissingEntry(String),

    /// The session was already closed
    #[error("session is closed")]
    Closed,
}
