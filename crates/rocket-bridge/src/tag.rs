//! Type tag registry
//!
//! A [`TypeTag`] names one family of native objects that share a dispatch
//! table. Tags are assigned in registration order and live in the Lua state's
//! application data, so two Lua states never share tag ids.
//!
//! Tags can be interned by explicit name or derived from a Rust type through
//! [`NativeType`]. Both paths converge: a type whose `TAG` equals a name that
//! was already registered resolves to the same tag.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use mlua::Lua;
use rustc_hash::FxHashMap;

/// Prefix of the named registry slots holding dispatch tables.
const DISPATCH_KEY_PREFIX: &str = "rocket.dispatch.";

/// Stable identifier for a native object family.
///
/// Equality is by registration id; the name is carried for lookups and
/// diagnostics.
#[derive(Clone)]
pub struct TypeTag {
    id: u32,
    name: Rc<str>,
}

impl TypeTag {
    /// Registration-order id
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Tag name as seen by scripts
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Named registry slot of this tag's dispatch table
    pub(crate) fn registry_key(&self) -> String {
        format!("{}{}", DISPATCH_KEY_PREFIX, self.name)
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl std::hash::Hash for TypeTag {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({}, {:?})", self.id, self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A Rust type that can be boxed without naming its tag at the call site.
pub trait NativeType: 'static {
    /// Tag name used the first time this type is boxed
    const TAG: &'static str;
}

/// Tag bookkeeping for one Lua state.
#[derive(Debug, Default)]
pub struct TagRegistry {
    by_name: FxHashMap<String, TypeTag>,
    by_type: FxHashMap<TypeId, TypeTag>,
    next_id: u32,
}

impl TagRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the tag for `name`. Returns `true` when it was created.
    pub fn intern(&mut self, name: &str) -> (TypeTag, bool) {
        if let Some(tag) = self.by_name.get(name) {
            return (tag.clone(), false);
        }
        let tag = TypeTag {
            id: self.next_id,
            name: Rc::from(name),
        };
        self.next_id += 1;
        self.by_name.insert(name.to_string(), tag.clone());
        (tag, true)
    }

    /// Get or create the tag bound to the Rust type `T`.
    pub fn intern_type<T: NativeType>(&mut self) -> (TypeTag, bool) {
        let type_id = TypeId::of::<T>();
        if let Some(tag) = self.by_type.get(&type_id) {
            return (tag.clone(), false);
        }
        let (tag, created) = self.intern(T::TAG);
        self.by_type.insert(type_id, tag.clone());
        (tag, created)
    }

    /// Look up a tag by name
    pub fn get(&self, name: &str) -> Option<TypeTag> {
        self.by_name.get(name).cloned()
    }
}

/// Run `f` against the registry stored in `lua`, creating it on first use.
pub(crate) fn with_registry<R>(lua: &Lua, f: impl FnOnce(&mut TagRegistry) -> R) -> R {
    if let Some(mut registry) = lua.app_data_mut::<TagRegistry>() {
        return f(&mut registry);
    }
    let mut registry = TagRegistry::new();
    let result = f(&mut registry);
    lua.set_app_data(registry);
    result
}

/// Get or create the tag named `name` in this Lua state.
pub fn intern_tag(lua: &Lua, name: &str) -> TypeTag {
    with_registry(lua, |registry| registry.intern(name).0)
}

/// Get or create the tag bound to `T` in this Lua state.
pub fn tag_of<T: NativeType>(lua: &Lua) -> TypeTag {
    with_registry(lua, |registry| registry.intern_type::<T>().0)
}

/// Look up an already registered tag.
pub fn lookup_tag(lua: &Lua, name: &str) -> Option<TypeTag> {
    with_registry(lua, |registry| registry.get(name))
}
