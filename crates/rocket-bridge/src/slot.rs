//! Session slots for singleton devices
//!
//! A slot holds at most one open session of a process-wide device. Opening an
//! already open slot is a no-op; using a closed slot fails with
//! [`BridgeError::NotInitialized`].

use crate::error::{BridgeError, BridgeResult};

/// Init/teardown discipline around a single device session.
#[derive(Debug)]
pub struct SessionSlot<T> {
    name: &'static str,
    state: Option<T>,
}

impl<T> SessionSlot<T> {
    /// Create a closed slot
    pub fn new(name: &'static str) -> Self {
        SessionSlot { name, state: None }
    }

    /// Open the session with `open` unless it is already open.
    ///
    /// Returns `Ok(false)` without calling `open` on a repeated init.
    pub fn init_with<E>(&mut self, open: impl FnOnce() -> Result<T, E>) -> Result<bool, E> {
        if self.state.is_some() {
            tracing::debug!(session = self.name, "already initialized");
            return Ok(false);
        }
        self.state = Some(open()?);
        tracing::debug!(session = self.name, "initialized");
        Ok(true)
    }

    /// Check whether a session is open
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Borrow the open session
    pub fn get(&self) -> BridgeResult<&T> {
        self.state
            .as_ref()
            .ok_or_else(|| BridgeError::NotInitialized(self.name.to_string()))
    }

    /// Mutably borrow the open session
    pub fn get_mut(&mut self) -> BridgeResult<&mut T> {
        let name = self.name;
        self.state
            .as_mut()
            .ok_or_else(|| BridgeError::NotInitialized(name.to_string()))
    }

    /// Close the session, handing it back for teardown.
    pub fn shutdown(&mut self) -> Option<T> {
        let state = self.state.take();
        if state.is_some() {
            tracing::debug!(session = self.name, "shut down");
        }
        state
    }
}
