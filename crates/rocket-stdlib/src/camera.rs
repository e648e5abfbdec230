//! Camera2D / Camera3D: Camera state objects
//!
//! Cameras are plain values with no external resources, so their handles are
//! owned by the Lua collector.

use mlua::{Lua, Table, Value};
use rocket_bridge::{
    box_auto, set_constants, unwrap_auto, BridgeError, BridgeResult, ClassBuilder, NativeRef,
    NativeType, Ownership, TypeTag, Vec2, Vec3,
};

/// Perspective projection
pub const CAMERA_PERSPECTIVE: i64 = 0;
/// Orthographic projection
pub const CAMERA_ORTHOGRAPHIC: i64 = 1;

const CAMERA_CONSTANTS: &[(&str, i64)] = &[
    ("CAMERA_PERSPECTIVE", CAMERA_PERSPECTIVE),
    ("CAMERA_ORTHOGRAPHIC", CAMERA_ORTHOGRAPHIC),
    ("CAMERA_CUSTOM", 0),
    ("CAMERA_FREE", 1),
    ("CAMERA_ORBITAL", 2),
    ("CAMERA_FIRST_PERSON", 3),
    ("CAMERA_THIRD_PERSON", 4),
];

fn parse_projection(value: f64) -> BridgeResult<i64> {
    if value == CAMERA_PERSPECTIVE as f64 {
        Ok(CAMERA_PERSPECTIVE)
    } else if value == CAMERA_ORTHOGRAPHIC as f64 {
        Ok(CAMERA_ORTHOGRAPHIC)
    } else {
        Err(BridgeError::ArgumentType {
            expected: "CAMERA_PERSPECTIVE or CAMERA_ORTHOGRAPHIC".to_string(),
            found: value.to_string(),
        })
    }
}

fn unknown_field(expected: &str, field: &str) -> BridgeError {
    BridgeError::ArgumentType {
        expected: expected.to_string(),
        found: format!("'{}'", field),
    }
}

// ── Camera2D ──

/// 2D camera: a target point drawn at a screen offset, rotated and zoomed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    /// Screen position of the target
    pub offset: Vec2,
    /// World point the camera looks at
    pub target: Vec2,
    /// Rotation in degrees
    pub rotation: f64,
    /// Scale factor
    pub zoom: f64,
}

impl NativeType for Camera2D {
    const TAG: &'static str = "Camera2D";
}

impl Camera2D {
    /// Project a world point onto the screen
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let dx = (world.x - self.target.x) * self.zoom;
        let dy = (world.y - self.target.y) * self.zoom;
        Vec2::new(
            dx * cos - dy * sin + self.offset.x,
            dx * sin + dy * cos + self.offset.y,
        )
    }

    /// Map a screen point back into the world
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let dx = screen.x - self.offset.x;
        let dy = screen.y - self.offset.y;
        let rx = dx * cos + dy * sin;
        let ry = -dx * sin + dy * cos;
        Vec2::new(rx / self.zoom + self.target.x, ry / self.zoom + self.target.y)
    }

    /// Set `target` or `offset`
    pub fn set_vec2(&mut self, field: &str, value: Vec2) -> BridgeResult<()> {
        match field {
            "target" => self.target = value,
            "offset" => self.offset = value,
            other => return Err(unknown_field("'target' or 'offset'", other)),
        }
        Ok(())
    }

    /// Set `rotation` or `zoom`
    pub fn set_number(&mut self, field: &str, value: f64) -> BridgeResult<()> {
        match field {
            "rotation" => self.rotation = value,
            "zoom" => self.zoom = value,
            other => return Err(unknown_field("'rotation' or 'zoom'", other)),
        }
        Ok(())
    }

    fn to_table(self, lua: &Lua) -> mlua::Result<Table> {
        let table = lua.create_table()?;
        table.set("offset", self.offset)?;
        table.set("target", self.target)?;
        table.set("rotation", self.rotation)?;
        table.set("zoom", self.zoom)?;
        Ok(table)
    }
}

// ── Camera3D ──

/// 3D camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera3D {
    /// Eye position
    pub position: Vec3,
    /// Point looked at
    pub target: Vec3,
    /// Up direction
    pub up: Vec3,
    /// Vertical field of view in degrees, or view height when orthographic
    pub fovy: f64,
    /// `CAMERA_PERSPECTIVE` or `CAMERA_ORTHOGRAPHIC`
    pub projection: i64,
}

impl NativeType for Camera3D {
    const TAG: &'static str = "Camera3D";
}

impl Camera3D {
    /// Set `position`, `target` or `up`
    pub fn set_vec3(&mut self, field: &str, value: Vec3) -> BridgeResult<()> {
        match field {
            "position" => self.position = value,
            "target" => self.target = value,
            "up" => self.up = value,
            other => return Err(unknown_field("'position', 'target' or 'up'", other)),
        }
        Ok(())
    }

    /// Set `fovy` or `projection`
    pub fn set_number(&mut self, field: &str, value: f64) -> BridgeResult<()> {
        match field {
            "fovy" => self.fovy = value,
            "projection" => self.projection = parse_projection(value)?,
            other => return Err(unknown_field("'fovy' or 'projection'", other)),
        }
        Ok(())
    }

    fn to_table(self, lua: &Lua) -> mlua::Result<Table> {
        let table = lua.create_table()?;
        table.set("position", self.position)?;
        table.set("target", self.target)?;
        table.set("up", self.up)?;
        table.set("fovy", self.fovy)?;
        table.set("projection", self.projection)?;
        Ok(table)
    }
}

// ── Registration ──

fn camera2d<R>(lua: &Lua, this: &Value, f: impl FnOnce(&mut Camera2D) -> R) -> mlua::Result<R> {
    Ok(unwrap_auto::<Camera2D>(lua, this)?.with_mut(f)?)
}

fn camera3d<R>(lua: &Lua, this: &Value, f: impl FnOnce(&mut Camera3D) -> R) -> mlua::Result<R> {
    Ok(unwrap_auto::<Camera3D>(lua, this)?.with_mut(f)?)
}

/// Register the `Camera2D` and `Camera3D` classes.
pub fn install(lua: &Lua) -> mlua::Result<(TypeTag, TypeTag)> {
    let camera_2d = ClassBuilder::new(Camera2D::TAG)
        .function(lua, "new", |lua, (offset, target, rotation, zoom): (Vec2, Vec2, f64, f64)| {
            let camera = Camera2D { offset, target, rotation, zoom };
            box_auto(lua, Some(&NativeRef::new(camera)), Ownership::Collector)
        })?
        .method(lua, "worldToScreen", |lua, (this, point): (Value, Vec2)| {
            camera2d(lua, &this, |camera| camera.world_to_screen(point))
        })?
        .method(lua, "screenToWorld", |lua, (this, point): (Value, Vec2)| {
            camera2d(lua, &this, |camera| camera.screen_to_world(point))
        })?
        .method(lua, "setVec2", |lua, (this, field, value): (Value, String, Vec2)| {
            Ok(camera2d(lua, &this, |camera| camera.set_vec2(&field, value))??)
        })?
        .method(lua, "setNumber", |lua, (this, field, value): (Value, String, f64)| {
            Ok(camera2d(lua, &this, |camera| camera.set_number(&field, value))??)
        })?
        .method(lua, "get", |lua, this: Value| {
            let camera = camera2d(lua, &this, |camera| *camera)?;
            camera.to_table(lua)
        })?
        .register(lua)?;

    let camera_3d = ClassBuilder::new(Camera3D::TAG)
        .function(
            lua,
            "new",
            |lua, (position, target, up, fovy, mode): (Vec3, Vec3, Vec3, f64, f64)| {
                let projection = parse_projection(mode)?;
                let camera = Camera3D { position, target, up, fovy, projection };
                box_auto(lua, Some(&NativeRef::new(camera)), Ownership::Collector)
            },
        )?
        .method(lua, "setVec3", |lua, (this, field, value): (Value, String, Vec3)| {
            Ok(camera3d(lua, &this, |camera| camera.set_vec3(&field, value))??)
        })?
        .method(lua, "setNumber", |lua, (this, field, value): (Value, String, f64)| {
            Ok(camera3d(lua, &this, |camera| camera.set_number(&field, value))??)
        })?
        .method(lua, "get", |lua, this: Value| {
            let camera = camera3d(lua, &this, |camera| *camera)?;
            camera.to_table(lua)
        })?
        .register(lua)?;

    let class: Table = lua.globals().get(Camera3D::TAG)?;
    set_constants(&class, CAMERA_CONSTANTS)?;
    Ok((camera_2d, camera_3d))
}
