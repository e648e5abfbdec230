//! Handles: native objects boxed as Lua userdata
//!
//! Every handle is the same Rust userdata type. Per-family behavior comes from
//! the dispatch table of the handle's [`TypeTag`], which `__index` resolves
//! against. What happens when the collector reclaims a handle is decided by
//! its [`Ownership`]:
//!
//! - `Collector`: the handle shares ownership with every other collector-owned
//!   handle over the same object; finalizing the last of them destroys it.
//! - `Pool`: a [`crate::ResourcePool`] owns the object; finalization is a no-op.
//! - `Borrowed`: someone else owns it; finalization is a no-op.
//!
//! Whatever the policy, destruction goes through the cell's liveness marker,
//! so combining two policies by mistake still tears the object down once.

use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use mlua::{AnyUserData, Lua, MetaMethod, UserData, UserDataMethods, Value};

use crate::cell::{ErasedCell, NativeRef};
use crate::dispatch;
use crate::tag::{self, NativeType, TypeTag};

/// Who is responsible for tearing down a boxed object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The Lua collector finalizes the object
    Collector,
    /// A resource pool releases the object
    Pool,
    /// The object is owned outside the handle
    Borrowed,
}

/// Userdata payload of every boxed native object.
pub struct Handle {
    tag: TypeTag,
    ownership: Ownership,
    cell: Rc<dyn ErasedCell>,
}

impl Handle {
    /// Tag of this handle's object family
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    /// Check whether the boxed object is still alive
    pub fn is_live(&self) -> bool {
        self.cell.is_live()
    }

    /// Raw address of the boxed object while it is alive
    pub fn address(&self) -> Option<NonNull<()>> {
        self.cell.address()
    }

    pub(crate) fn cell(&self) -> Rc<dyn ErasedCell> {
        Rc::clone(&self.cell)
    }

    fn same_object(&self, other: &Handle) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    fn describe(&self) -> String {
        match self.address() {
            Some(addr) => format!("{}: {:p}", self.tag, addr),
            None => format!("{}: released", self.tag),
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("tag", &self.tag)
            .field("ownership", &self.ownership)
            .field("address", &self.address())
            .finish()
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.ownership != Ownership::Collector {
            return;
        }
        if !self.cell.drop_collector() {
            tracing::trace!(tag = %self.tag, "other collector-owned handles remain");
            return;
        }
        if self.cell.destroy() {
            tracing::debug!(tag = %self.tag, "finalized by collector");
        } else {
            tracing::trace!(tag = %self.tag, "collector found object already released");
        }
    }
}

impl UserData for Handle {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Index, |lua, this, key: Value| {
            match dispatch::dispatch_table(lua, &this.tag)? {
                Some(table) => table.raw_get::<Value>(key),
                None => Ok(Value::Nil),
            }
        });

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.describe()));

        methods.add_meta_method(MetaMethod::Eq, |_, this, other: AnyUserData| {
            Ok(other
                .borrow::<Handle>()
                .map(|other| this.same_object(&other))
                .unwrap_or(false))
        });
    }
}

/// Box `native` under `tag`.
///
/// Returns `nil` when there is no object to box. Boxing the same object
/// twice yields two handles over one cell. With `Collector` ownership the
/// object stays alive until every such handle has been finalized.
pub fn box_native<T: 'static>(
    lua: &Lua,
    tag: &TypeTag,
    native: Option<&NativeRef<T>>,
    ownership: Ownership,
) -> mlua::Result<Value> {
    let Some(native) = native else {
        return Ok(Value::Nil);
    };
    dispatch::ensure_table(lua, tag)?;
    if ownership == Ownership::Collector {
        native.erase().add_collector();
    }
    let handle = Handle {
        tag: tag.clone(),
        ownership,
        cell: native.erase(),
    };
    tracing::debug!(tag = %tag, ?ownership, "boxed native object");
    Ok(Value::UserData(lua.create_userdata(handle)?))
}

/// Box `native` under the tag registered as `tag_name`.
pub fn box_named<T: 'static>(
    lua: &Lua,
    tag_name: &str,
    native: Option<&NativeRef<T>>,
    ownership: Ownership,
) -> mlua::Result<Value> {
    let tag = tag::intern_tag(lua, tag_name);
    box_native(lua, &tag, native, ownership)
}

/// Box `native` under the tag derived from `T`.
///
/// The first use creates a minimal dispatch table if none was registered.
pub fn box_auto<T: NativeType>(
    lua: &Lua,
    native: Option<&NativeRef<T>>,
    ownership: Ownership,
) -> mlua::Result<Value> {
    let tag = tag::tag_of::<T>(lua);
    box_native(lua, &tag, native, ownership)
}
