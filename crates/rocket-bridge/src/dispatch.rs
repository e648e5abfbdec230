//! Dispatch tables
//!
//! One table per [`TypeTag`], kept in a named slot of the Lua registry. The
//! table indexes itself (`__index`) and carries the tag name (`__name`), so it
//! can serve directly as a metatable as well as the lookup target of every
//! handle's `__index`.

use mlua::{FromLuaMulti, Function, IntoLuaMulti, Lua, Table};

use crate::tag::{self, NativeType, TypeTag};

/// Ordered set of named entry points, applied to a dispatch table or module.
#[derive(Debug, Default, Clone)]
pub struct MethodTable {
    entries: Vec<(String, Function)>,
}

impl MethodTable {
    /// Create an empty method table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a Rust closure as an entry point.
    pub fn add<A, R, F>(self, lua: &Lua, name: &str, f: F) -> mlua::Result<Self>
    where
        A: FromLuaMulti,
        R: IntoLuaMulti,
        F: Fn(&Lua, A) -> mlua::Result<R> + 'static,
    {
        let function = lua.create_function(f)?;
        Ok(self.with_function(name, function))
    }

    /// Add an already created Lua function. A repeated name replaces the
    /// earlier entry.
    pub fn with_function(mut self, name: &str, function: Function) -> Self {
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = function,
            None => self.entries.push((name.to_string(), function)),
        }
        self
    }

    /// Entry names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry into `table`.
    pub(crate) fn apply(&self, table: &Table) -> mlua::Result<()> {
        for (name, function) in &self.entries {
            table.raw_set(name.as_str(), function.clone())?;
        }
        Ok(())
    }
}

/// Register `methods` under the tag named `name`.
///
/// Safe to call repeatedly: existing entries survive, entries with the same
/// name are replaced, and the self-index is re-established each time.
pub fn register(lua: &Lua, name: &str, methods: &MethodTable) -> mlua::Result<TypeTag> {
    let tag = tag::intern_tag(lua, name);
    register_tag(lua, &tag, methods)?;
    Ok(tag)
}

/// Register `methods` under the tag derived from `T`.
pub fn register_type<T: NativeType>(lua: &Lua, methods: &MethodTable) -> mlua::Result<TypeTag> {
    let tag = tag::tag_of::<T>(lua);
    register_tag(lua, &tag, methods)?;
    Ok(tag)
}

fn register_tag(lua: &Lua, tag: &TypeTag, methods: &MethodTable) -> mlua::Result<()> {
    let table = ensure_table(lua, tag)?;
    methods.apply(&table)?;
    tracing::debug!(
        tag = %tag,
        methods = ?methods.names().collect::<Vec<_>>(),
        "registered dispatch table"
    );
    Ok(())
}

/// Get the dispatch table of `tag`, creating an empty one if absent.
pub fn ensure_table(lua: &Lua, tag: &TypeTag) -> mlua::Result<Table> {
    let key = tag.registry_key();
    let table = match lua.named_registry_value::<Option<Table>>(&key)? {
        Some(table) => table,
        None => {
            let table = lua.create_table()?;
            lua.set_named_registry_value(&key, table.clone())?;
            table
        }
    };
    table.raw_set("__index", table.clone())?;
    table.raw_set("__name", tag.name())?;
    Ok(table)
}

/// Get the dispatch table of `tag` if one exists.
pub fn dispatch_table(lua: &Lua, tag: &TypeTag) -> mlua::Result<Option<Table>> {
    lua.named_registry_value::<Option<Table>>(&tag.registry_key())
}
