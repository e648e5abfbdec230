//! Error types for the bridge layer
//!
//! Every variant here is a programmer error: it is raised at the native call
//! boundary and unwinds the running script. Recoverable domain failures use
//! the dual-return convention in [`crate::outcome`] instead.

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Wrong value type in a required argument slot
    #[error("bad argument: expected {expected}, got {found}")]
    ArgumentType {
        /// Expected type name
        expected: String,
        /// Actual type name
        found: String,
    },

    /// Structured argument lacks a required numeric field
    #[error("expected number for field '{key}'")]
    MissingField {
        /// Name of the missing or mistyped field
        key: String,
    },

    /// Tag mismatch or non-handle value at an accessor
    #[error("invalid handle: expected {expected}, got {found}")]
    InvalidHandle {
        /// Tag (or type) the call site asked for
        expected: String,
        /// What was actually passed
        found: String,
    },

    /// Native resource construction failed
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// Method called on a native object that was already torn down
    #[error("native object has already been released")]
    Released,

    /// Session-scoped device used outside its init/teardown window
    #[error("{0} is not initialized")]
    NotInitialized(String),
}

impl BridgeError {
    /// Build an `ArgumentType` error from a Lua value.
    pub fn argument(expected: impl Into<String>, found: &mlua::Value) -> Self {
        BridgeError::ArgumentType {
            expected: expected.into(),
            found: found.type_name().to_string(),
        }
    }

    /// Build a `MissingField` error.
    pub fn missing_field(key: impl Into<String>) -> Self {
        BridgeError::MissingField { key: key.into() }
    }
}

impl From<BridgeError> for mlua::Error {
    fn from(err: BridgeError) -> Self {
        mlua::Error::external(err)
    }
}
