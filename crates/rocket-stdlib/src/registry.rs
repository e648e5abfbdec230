//! Module installation
//!
//! Installs stdlib modules by name into a Lua state. Shared module state
//! (the image pool, the terminal session) lives in [`StdlibState`], which the
//! host owns and closes when its session ends.

use std::rc::Rc;

use mlua::Lua;

use crate::curses::{self, Terminal};
use crate::images::{self, ImageLibrary};
use crate::{camera, fs};

/// Names accepted by [`install_stdlib`]
pub const MODULES: &[&str] = &["fs", "curses", "Image", "Camera"];

/// State shared between a session's native modules.
#[derive(Debug, Clone)]
pub struct StdlibState {
    /// Images loaded through `Image.load*`
    pub images: ImageLibrary,
    /// Terminal behind the `curses` module
    pub terminal: Rc<Terminal>,
}

impl StdlibState {
    /// State bound to the process terminal
    pub fn new() -> Self {
        Self::with_terminal(Terminal::stdio())
    }

    /// State bound to a specific terminal
    pub fn with_terminal(terminal: Terminal) -> Self {
        StdlibState {
            images: ImageLibrary::new(),
            terminal: Rc::new(terminal),
        }
    }

    /// Release every pooled object and end the terminal session.
    pub fn close(&self) {
        let images = self.images.unload_all();
        let terminal = self.terminal.end();
        tracing::debug!(images, terminal, "closed stdlib state");
    }
}

impl Default for StdlibState {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether `name` is a known module
pub fn is_module(name: &str) -> bool {
    MODULES.contains(&name)
}

/// Install one module.
pub fn install_module(lua: &Lua, state: &StdlibState, name: &str) -> mlua::Result<()> {
    match name {
        "fs" => {
            fs::install(lua)?;
        }
        "curses" => {
            curses::install(lua, &state.terminal)?;
        }
        "Image" => {
            images::install(lua, &state.images)?;
        }
        "Camera" => {
            camera::install(lua)?;
        }
        other => return Err(mlua::Error::runtime(format!("unknown module '{}'", other))),
    }
    tracing::debug!(module = name, "installed module");
    Ok(())
}

/// Install each module in `names`, in order.
pub fn install_stdlib<S: AsRef<str>>(
    lua: &Lua,
    state: &StdlibState,
    names: &[S],
) -> mlua::Result<()> {
    for name in names {
        install_module(lua, state, name.as_ref())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_module_installs() {
        let lua = Lua::new();
        let state = StdlibState::new();
        install_stdlib(&lua, &state, MODULES).unwrap();

        for name in ["fs", "curses", "Image", "Camera2D", "Camera3D"] {
            let module: Option<mlua::Table> = lua.globals().get(name).unwrap();
            assert!(module.is_some(), "{} missing", name);
        }
    }

    #[test]
    fn test_unknown_module_is_an_error() {
        let lua = Lua::new();
        let state = StdlibState::new();
        let err = install_stdlib(&lua, &state, &["fs", "sound"]).unwrap_err();
        assert!(err.to_string().contains("unknown module 'sound'"));
        assert!(is_module("Image"));
        assert!(!is_module("image"));
    }
}
