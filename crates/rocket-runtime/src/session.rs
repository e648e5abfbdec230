//! Script execution session.
//!
//! A session owns one Lua state plus the native module state installed into
//! it. Running a file publishes `arg`, executes the chunk, then calls the
//! entry function. Closing the session (explicitly or on drop) releases every
//! pooled native object and ends the terminal session.
//!
//! # Example
//!
//! ```rust,ignore
//! use rocket_runtime::{RuntimeOptions, Session};
//!
//! let mut session = Session::new(&RuntimeOptions::default())?;
//! session.run_file(Path::new("game.lua"), &["--fullscreen".to_string()])?;
//! session.close();
//! ```

use std::path::{Path, PathBuf};

use mlua::{Function, Lua, Table};
use rocket_stdlib::{install_stdlib, StdlibState};

use crate::config::RocketConfig;
use crate::error::RuntimeError;

/// Options for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeOptions {
    /// Global function called after the script body
    pub entry: String,
    /// Native modules to install
    pub modules: Vec<String>,
    /// Directories prepended to `package.path`
    pub package_path: Vec<PathBuf>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self::from_config(&RocketConfig::default())
    }
}

impl RuntimeOptions {
    /// Options described by a parsed config
    pub fn from_config(config: &RocketConfig) -> Self {
        Self {
            entry: config.runtime.entry.clone(),
            modules: config.runtime.modules.clone(),
            package_path: config.runtime.package_path.clone(),
        }
    }
}

/// A Lua state with Rocket's native modules installed.
pub struct Session {
    lua: Lua,
    state: StdlibState,
    options: RuntimeOptions,
    closed: bool,
}

impl Session {
    /// Create a session bound to the process terminal.
    pub fn new(options: &RuntimeOptions) -> Result<Self, RuntimeError> {
        Self::with_state(options, StdlibState::new())
    }

    /// Create a session over caller-provided module state.
    pub fn with_state(options: &RuntimeOptions, state: StdlibState) -> Result<Self, RuntimeError> {
        let lua = Lua::new();
        install_stdlib(&lua, &state, options.modules.as_slice())?;
        extend_package_path(&lua, &options.package_path)?;
        tracing::debug!(modules = ?options.modules, "session created");
        Ok(Self {
            lua,
            state,
            options: options.clone(),
            closed: false,
        })
    }

    /// The underlying Lua state
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Native module state shared by this session
    pub fn state(&self) -> &StdlibState {
        &self.state
    }

    /// Options this session was created with
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Run a script file, then call its entry function.
    pub fn run_file(&mut self, path: &Path, args: &[String]) -> Result<(), RuntimeError> {
        if self.closed {
            return Err(RuntimeError::Closed);
        }
        let source = std::fs::read_to_string(path)?;
        let script = path.to_string_lossy();
        self.publish_args(&script, args)?;

        tracing::debug!(script = %script, "executing script");
        self.lua
            .load(source.as_str())
            .set_name(format!("@{}", script))
            .exec()?;

        self.call_entry()
    }

    /// Run a chunk of source, then call the entry function.
    pub fn run_source(
        &mut self,
        name: &str,
        source: &str,
        args: &[String],
    ) -> Result<(), RuntimeError> {
        if self.closed {
            return Err(RuntimeError::Closed);
        }
        self.publish_args(name, args)?;
        self.lua.load(source).set_name(name).exec()?;
        self.call_entry()
    }

    fn publish_args(&self, script: &str, args: &[String]) -> Result<(), RuntimeError> {
        let table = self.lua.create_table_with_capacity(args.len(), 1)?;
        table.raw_set(0, script)?;
        for (i, arg) in args.iter().enumerate() {
            table.raw_set(i + 1, arg.as_str())?;
        }
        self.lua.globals().set("arg", table)?;
        Ok(())
    }

    fn call_entry(&self) -> Result<(), RuntimeError> {
        let entry = &self.options.entry;
        match self.lua.globals().get::<Option<Function>>(entry.as_str())? {
            Some(function) => {
                tracing::debug!(entry = %entry, "calling entry function");
                function.call::<()>(())?;
                Ok(())
            }
            None => Err(RuntimeError::MissingEntry(entry.clone())),
        }
    }

    /// Release pooled native objects and end the terminal session.
    ///
    /// Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.state.close();
        tracing::debug!("session closed");
    }

    /// Check whether the session was closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

fn extend_package_path(lua: &Lua, dirs: &[PathBuf]) -> mlua::Result<()> {
    if dirs.is_empty() {
        return Ok(());
    }
    let package: Table = lua.globals().get("package")?;
    let current: String = package.get("path")?;
    let mut path = String::new();
    for dir in dirs {
        let dir = dir.to_string_lossy();
        path.push_str(&format!("{dir}/?.lua;{dir}/?/init.lua;"));
    }
    path.push_str(&current);
    package.set("path", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(modules: &[&str]) -> RuntimeOptions {
        RuntimeOptions {
            modules: modules.iter().map(|m| m.to_string()).collect(),
            ..RuntimeOptions::default()
        }
    }

    #[test]
    fn test_arg_table_and_entry() {
        let mut session = Session::new(&options(&[])).unwrap();
        session
            .run_source(
                "inline",
                "function main() result = arg[0] .. ':' .. arg[1] .. ':' .. #arg end",
                &["a".to_string(), "b".to_string()],
            )
            .unwrap();
        let result: String = session.lua().globals().get("result").unwrap();
        assert_eq!(result, "inline:a:2");
    }

    #[test]
    fn test_missing_entry_is_an_error() {
        let mut session = Session::new(&options(&[])).unwrap();
        let err = session.run_source("inline", "x = 1", &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::MissingEntry(ref name) if name == "main"));
    }

    #[test]
    fn test_custom_entry() {
        let opts = RuntimeOptions {
            entry: "start".to_string(),
            ..options(&[])
        };
        let mut session = Session::new(&opts).unwrap();
        session
            .run_source("inline", "function start() started = true end", &[])
            .unwrap();
        let started: bool = session.lua().globals().get("started").unwrap();
        assert!(started);
    }

    #[test]
    fn test_runtime_error_propagates() {
        let mut session = Session::new(&options(&[])).unwrap();
        let err = session
            .run_source("inline", "function main() error('boom') end", &[])
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Lua(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_closed_session_refuses_to_run() {
        let mut session = Session::new(&options(&[])).unwrap();
        session.close();
        session.close();
        assert!(session.is_closed());
        assert!(matches!(
            session.run_source("inline", "function main() end", &[]),
            Err(RuntimeError::Closed)
        ));
    }

    #[test]
    fn test_package_path_is_extended() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("helper.lua"), "return { value = 7 }").unwrap();
        let opts = RuntimeOptions {
            package_path: vec![dir.path().to_path_buf()],
            ..options(&[])
        };
        let mut session = Session::new(&opts).unwrap();
        session
            .run_source("inline", "function main() value = require('helper').value end", &[])
            .unwrap();
        let value: i64 = session.lua().globals().get("value").unwrap();
        assert_eq!(value, 7);
    }
}
