//! Argument marshaling
//!
//! Geometry-like arguments arrive as records with named numeric fields. A
//! missing or non-numeric field is always an error; no reader here ever
//! substitutes a default.

use mlua::{FromLua, IntoLua, Lua, Table, Value};

use crate::error::{BridgeError, BridgeResult};

fn as_number(value: Value, key: &str) -> BridgeResult<f64> {
    match value {
        Value::Integer(n) => Ok(n as f64),
        Value::Number(n) => Ok(n),
        _ => Err(BridgeError::missing_field(key)),
    }
}

/// Read the number stored under `key` in the record `arg`.
pub fn number_field(arg: &Value, key: &str) -> BridgeResult<f64> {
    let Value::Table(table) = arg else {
        return Err(BridgeError::argument("table", arg));
    };
    let value = table
        .get::<Value>(key)
        .map_err(|_| BridgeError::missing_field(key))?;
    as_number(value, key)
}

/// Read the global number `key`.
pub fn global_number(lua: &Lua, key: &str) -> BridgeResult<f64> {
    let value = lua
        .globals()
        .get::<Value>(key)
        .map_err(|_| BridgeError::missing_field(key))?;
    as_number(value, key)
}

/// Build a result table from named numeric fields.
pub fn record(lua: &Lua, fields: &[(&str, f64)]) -> mlua::Result<Table> {
    let table = lua.create_table_with_capacity(0, fields.len())?;
    for (key, value) in fields {
        table.raw_set(*key, *value)?;
    }
    Ok(table)
}

/// `{x, y}` record
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    /// Horizontal component
    pub x: f64,
    /// Vertical component
    pub y: f64,
}

impl Vec2 {
    /// Create a vector
    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// Read `{x, y}` from a record
    pub fn from_record(arg: &Value) -> BridgeResult<Self> {
        Ok(Vec2 {
            x: number_field(arg, "x")?,
            y: number_field(arg, "y")?,
        })
    }
}

impl FromLua for Vec2 {
    fn from_lua(value: Value, _: &Lua) -> mlua::Result<Self> {
        Ok(Vec2::from_record(&value)?)
    }
}

impl IntoLua for Vec2 {
    fn into_lua(self, lua: &Lua) -> mlua::Result<Value> {
        record(lua, &[("x", self.x), ("y", self.y)]).map(Value::Table)
    }
}

/// `{x, y, z}` record
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    /// Horizontal component
    pub x: f64,
    /// Vertical component
    pub y: f64,
    /// Depth component
    pub z: f64,
}

impl Vec3 {
    /// Create a vector
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3 { x, y, z }
    }

    /// Read `{x, y, z}` from a record
    pub fn from_record(arg: &Value) -> BridgeResult<Self> {
        Ok(Vec3 {
            x: number_field(arg, "x")?,
            y: number_field(arg, "y")?,
            z: number_field(arg, "z")?,
        })
    }
}

impl FromLua for Vec3 {
    fn from_lua(value: Value, _: &Lua) -> mlua::Result<Self> {
        Ok(Vec3::from_record(&value)?)
    }
}

impl IntoLua for Vec3 {
    fn into_lua(self, lua: &Lua) -> mlua::Result<Value> {
        record(lua, &[("x", self.x), ("y", self.y), ("z", self.z)]).map(Value::Table)
    }
}

/// `{x, y, width, height}` record
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Horizontal component
    pub x: f64,
    /// Vertical component
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Read `{x, y, width, height}` from a record
    pub fn from_record(arg: &Value) -> BridgeResult<Self> {
        Ok(Rect {
            x: number_field(arg, "x")?,
            y: number_field(arg, "y")?,
            width: number_field(arg, "width")?,
            height: number_field(arg, "height")?,
        })
    }
}

impl FromLua for Rect {
    fn from_lua(value: Value, _: &Lua) -> mlua::Result<Self> {
        Ok(Rect::from_record(&value)?)
    }
}

impl IntoLua for Rect {
    fn into_lua(self, lua: &Lua) -> mlua::Result<Value> {
        record(
            lua,
            &[
                ("x", self.x),
                ("y", self.y),
                ("width", self.width),
                ("height", self.height),
            ],
        )
        .map(Value::Table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(lua: &Lua, chunk: &str) -> Value {
        lua.load(chunk).eval().unwrap()
    }

    #[test]
    fn test_missing_field_names_key() {
        let lua = Lua::new();
        let arg = eval(&lua, "return { x = 1, y = 2, width = 3 }");
        let err = number_field(&arg, "height").unwrap_err();
        assert_eq!(err, BridgeError::missing_field("height"));
        assert!(err.to_string().contains("height"));
        assert!(Rect::from_record(&arg).is_err());
    }

    #[test]
    fn test_non_table_is_argument_error() {
        let err = number_field(&Value::Boolean(true), "x").unwrap_err();
        assert!(matches!(err, BridgeError::ArgumentType { .. }));
    }

    #[test]
    fn test_numeric_strings_are_not_numbers() {
        let lua = Lua::new();
        let arg = eval(&lua, "return { x = '1' }");
        assert_eq!(number_field(&arg, "x"), Err(BridgeError::missing_field("x")));
    }

    #[test]
    fn test_integers_and_floats_are_read() {
        let lua = Lua::new();
        let arg = eval(&lua, "return { x = 1, y = 2.5, z = -3 }");
        assert_eq!(Vec3::from_record(&arg), Ok(Vec3::new(1.0, 2.5, -3.0)));
    }

    #[test]
    fn test_global_number() {
        let lua = Lua::new();
        lua.globals().set("SPEED", 4.5).unwrap();
        assert_eq!(global_number(&lua, "SPEED"), Ok(4.5));
        assert_eq!(
            global_number(&lua, "MISSING"),
            Err(BridgeError::missing_field("MISSING"))
        );
    }

    #[test]
    fn test_vec2_passes_through_lua() {
        let lua = Lua::new();
        let flip = lua
            .create_function(|_, v: Vec2| Ok(Vec2::new(v.y, v.x)))
            .unwrap();
        lua.globals().set("flip", flip).unwrap();

        let (x, y): (f64, f64) = lua
            .load("local v = flip({ x = 1, y = 2 }); return v.x, v.y")
            .eval()
            .unwrap();
        assert_eq!((x, y), (2.0, 1.0));

        let err = lua.load("flip({ x = 1 })").exec().unwrap_err();
        assert!(err.to_string().contains("'y'"));
    }
}
