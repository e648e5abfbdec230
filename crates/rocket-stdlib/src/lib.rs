//! Rocket standard library
//!
//! Native modules exposed to Rocket scripts, all built on `rocket-bridge`:
//! filesystem access, a minimal curses-style terminal, pooled images and
//! camera objects.
//!
//! All calls are synchronous and run on the thread that owns the Lua state.

#![warn(missing_docs)]

pub mod registry;

pub mod camera;
pub mod curses;
pub mod fs;
pub mod images;

pub use registry::{install_module, install_stdlib, is_module, StdlibState, MODULES};
