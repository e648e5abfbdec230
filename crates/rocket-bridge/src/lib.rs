//! Rocket bridge - boxing native objects as Lua values
//!
//! Everything a native module needs to expose Rust objects to scripts:
//!
//! - [`tag`]: per-family type tags, owned by the Lua state
//! - [`dispatch`]: self-indexed method tables per tag
//! - [`handle`]: userdata handles with an explicit [`Ownership`] policy
//! - [`access`]: checked, unchecked and never-failing retrieval
//! - [`class`]: module tables and classes with constructors
//! - [`marshal`]: strict numeric field extraction from records
//! - [`pool`]: bulk-owned native objects
//! - [`slot`]: singleton device sessions
//!
//! # Example
//!
//! ```ignore
//! use rocket_bridge::{box_auto, unwrap_auto, ClassBuilder, NativeRef, NativeType, Ownership};
//!
//! struct Counter(i64);
//!
//! impl NativeType for Counter {
//!     const TAG: &'static str = "Counter";
//! }
//!
//! ClassBuilder::new("Counter")
//!     .method(&lua, "get", |lua, this: mlua::Value| {
//!         let counter = unwrap_auto::<Counter>(lua, &this)?;
//!         Ok(counter.with(|c| c.0)?)
//!     })?
//!     .function(&lua, "new", |lua, start: i64| {
//!         box_auto(lua, Some(&NativeRef::new(Counter(start))), Ownership::Collector)
//!     })?
//!     .register(&lua)?;
//! ```

#![warn(missing_docs)]

pub mod access;
pub mod cell;
pub mod class;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod marshal;
pub mod outcome;
pub mod pool;
pub mod slot;
pub mod tag;

pub use access::{unwrap, unwrap_auto, unwrap_checked, unwrap_or_null};
pub use cell::{Finalizer, NativeRef};
pub use class::{new_module, register_class, set_constants, ClassBuilder};
pub use dispatch::{register, register_type, MethodTable};
pub use error::{BridgeError, BridgeResult};
pub use handle::{box_auto, box_named, box_native, Handle, Ownership};
pub use marshal::{global_number, number_field, record, Rect, Vec2, Vec3};
pub use outcome::{outcome, status, Outcome};
pub use pool::ResourcePool;
pub use slot::SessionSlot;
pub use tag::{intern_tag, lookup_tag, tag_of, NativeType, TagRegistry, TypeTag};
