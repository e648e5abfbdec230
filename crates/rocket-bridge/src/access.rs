//! Pointer accessors
//!
//! Retrieve the native object behind a handle. Three forms:
//!
//! - [`unwrap`] skips tag verification but still refuses non-handles and
//!   never reinterprets a cell of another Rust type.
//! - [`unwrap_checked`] additionally requires the handle's tag to match.
//! - [`unwrap_or_null`] never fails.
//!
//! The returned [`NativeRef`] shares the handle's cell; it may already be
//! released, in which case its accessors report [`BridgeError::Released`].

use mlua::{AnyUserData, Lua, Value};

use crate::cell::NativeRef;
use crate::error::{BridgeError, BridgeResult};
use crate::handle::Handle;
use crate::tag::{self, NativeType, TypeTag};

fn handle_of(value: &Value) -> BridgeResult<&AnyUserData> {
    match value {
        Value::UserData(ud) if ud.is::<Handle>() => Ok(ud),
        other => Err(BridgeError::argument("native handle", other)),
    }
}

fn downcast<T: 'static>(handle: &Handle) -> BridgeResult<NativeRef<T>> {
    NativeRef::from_erased(handle.cell()).ok_or_else(|| BridgeError::InvalidHandle {
        expected: std::any::type_name::<T>().to_string(),
        found: handle.tag().name().to_string(),
    })
}

/// Get the native object without checking the tag.
pub fn unwrap<T: 'static>(value: &Value) -> BridgeResult<NativeRef<T>> {
    let ud = handle_of(value)?;
    let handle = ud
        .borrow::<Handle>()
        .map_err(|_| BridgeError::argument("native handle", value))?;
    downcast(&handle)
}

/// Get the native object, requiring the handle to carry `expected`.
pub fn unwrap_checked<T: 'static>(value: &Value, expected: &TypeTag) -> BridgeResult<NativeRef<T>> {
    let mismatch = |found: &str| BridgeError::InvalidHandle {
        expected: expected.name().to_string(),
        found: found.to_string(),
    };
    let Value::UserData(ud) = value else {
        return Err(mismatch(value.type_name()));
    };
    let handle = ud
        .borrow::<Handle>()
        .map_err(|_| mismatch(value.type_name()))?;
    if handle.tag() != expected {
        return Err(mismatch(handle.tag().name()));
    }
    downcast(&handle)
}

/// Get the native object, or `None` for anything that is not a live handle
/// of type `T`.
pub fn unwrap_or_null<T: 'static>(value: &Value) -> Option<NativeRef<T>> {
    unwrap::<T>(value).ok().filter(NativeRef::is_live)
}

/// Checked access using the tag bound to `T`.
pub fn unwrap_auto<T: NativeType>(lua: &Lua, value: &Value) -> BridgeResult<NativeRef<T>> {
    let expected = tag::tag_of::<T>(lua);
    unwrap_checked(value, &expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{box_named, Ownership};

    struct Sample(u32);

    #[test]
    fn test_checked_round_trip_returns_same_cell() {
        let lua = Lua::new();
        let native = NativeRef::new(Sample(5));
        let value = box_named(&lua, "Sample", Some(&native), Ownership::Borrowed).unwrap();
        let tag = tag::lookup_tag(&lua, "Sample").unwrap();

        let back = unwrap_checked::<Sample>(&value, &tag).unwrap();
        assert!(back.ptr_eq(&native));
        assert_eq!(back.with(|s| s.0), Ok(5));
    }

    #[test]
    fn test_non_handle_is_rejected() {
        let lua = Lua::new();
        let tag = tag::intern_tag(&lua, "Sample");
        let value = Value::Integer(3);

        assert!(matches!(
            unwrap::<Sample>(&value),
            Err(BridgeError::ArgumentType { .. })
        ));
        assert!(matches!(
            unwrap_checked::<Sample>(&value, &tag),
            Err(BridgeError::InvalidHandle { .. })
        ));
        assert!(unwrap_or_null::<Sample>(&value).is_none());
    }

    #[test]
    fn test_wrong_rust_type_is_never_reinterpreted() {
        let lua = Lua::new();
        let native = NativeRef::new(Sample(1));
        let value = box_named(&lua, "Sample", Some(&native), Ownership::Borrowed).unwrap();

        assert!(matches!(
            unwrap::<String>(&value),
            Err(BridgeError::InvalidHandle { .. })
        ));
    }

    #[test]
    fn test_or_null_skips_released_objects() {
        let lua = Lua::new();
        let native = NativeRef::new(Sample(1));
        let value = box_named(&lua, "Sample", Some(&native), Ownership::Borrowed).unwrap();

        assert!(unwrap_or_null::<Sample>(&value).is_some());
        native.destroy();
        assert!(unwrap_or_null::<Sample>(&value).is_none());
        assert_eq!(
            unwrap::<Sample>(&value).unwrap().with(|s| s.0),
            Err(BridgeError::Released)
        );
    }
}
