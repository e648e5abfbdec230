//! Module and class registration
//!
//! A module is a named global table of entry points. A class is a module that
//! also exposes `new` and whose instances resolve methods through the
//! dispatch table of its tag.

use mlua::{FromLuaMulti, Function, IntoLuaMulti, Lua, Table};

use crate::dispatch::{self, MethodTable};
use crate::tag::TypeTag;

/// Publish `functions` as the global table `name`.
///
/// An existing global table of that name is extended rather than replaced.
pub fn new_module(lua: &Lua, name: &str, functions: &MethodTable) -> mlua::Result<Table> {
    let globals = lua.globals();
    let module = match globals.raw_get::<Option<Table>>(name)? {
        Some(existing) => existing,
        None => {
            let table = lua.create_table()?;
            globals.raw_set(name, table.clone())?;
            table
        }
    };
    functions.apply(&module)?;
    tracing::debug!(module = name, functions = functions.len(), "published module");
    Ok(module)
}

/// Set integer constants on a module table.
pub fn set_constants(module: &Table, constants: &[(&str, i64)]) -> mlua::Result<()> {
    for (name, value) in constants {
        module.raw_set(*name, *value)?;
    }
    Ok(())
}

/// Register instance `methods` under tag `name` and publish a global of the
/// same name exposing `new`.
pub fn register_class(
    lua: &Lua,
    name: &str,
    methods: &MethodTable,
    constructor: Function,
) -> mlua::Result<TypeTag> {
    ClassBuilder::new(name)
        .methods(methods.clone())
        .constructor(constructor)
        .register(lua)
}

/// Step-by-step composition of a class: instance methods, static functions,
/// constants and an optional constructor.
#[derive(Debug)]
pub struct ClassBuilder {
    name: String,
    methods: MethodTable,
    statics: MethodTable,
    constants: Vec<(String, i64)>,
    constructor: Option<Function>,
}

impl ClassBuilder {
    /// Start a class named `name`
    pub fn new(name: &str) -> Self {
        ClassBuilder {
            name: name.to_string(),
            methods: MethodTable::new(),
            statics: MethodTable::new(),
            constants: Vec::new(),
            constructor: None,
        }
    }

    /// Replace the instance method set
    pub fn methods(mut self, methods: MethodTable) -> Self {
        self.methods = methods;
        self
    }

    /// Add one instance method.
    pub fn method<A, R, F>(mut self, lua: &Lua, name: &str, f: F) -> mlua::Result<Self>
    where
        A: FromLuaMulti,
        R: IntoLuaMulti,
        F: Fn(&Lua, A) -> mlua::Result<R> + 'static,
    {
        self.methods = self.methods.add(lua, name, f)?;
        Ok(self)
    }

    /// Add one function on the class table itself.
    pub fn function<A, R, F>(mut self, lua: &Lua, name: &str, f: F) -> mlua::Result<Self>
    where
        A: FromLuaMulti,
        R: IntoLuaMulti,
        F: Fn(&Lua, A) -> mlua::Result<R> + 'static,
    {
        self.statics = self.statics.add(lua, name, f)?;
        Ok(self)
    }

    /// Add an integer constant on the class table
    pub fn constant(mut self, name: &str, value: i64) -> Self {
        self.constants.push((name.to_string(), value));
        self
    }

    /// Use `constructor` as `new`
    pub fn constructor(mut self, constructor: Function) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Register the dispatch table and publish the class global.
    pub fn register(self, lua: &Lua) -> mlua::Result<TypeTag> {
        let tag = dispatch::register(lua, &self.name, &self.methods)?;

        let mut statics = self.statics;
        if let Some(constructor) = self.constructor {
            statics = statics.with_function("new", constructor);
        }
        let class = new_module(lua, &self.name, &statics)?;
        for (name, value) in &self.constants {
            class.raw_set(name.as_str(), *value)?;
        }
        Ok(tag)
    }
}
