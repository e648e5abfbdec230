//! fs: Filesystem operations
//!
//! Failures a script can reasonably handle (missing file, permission denied)
//! come back as dual returns; only wrong argument types raise.

use std::fs;
use std::io::Write;
use std::path::Path;

use mlua::{Lua, Table};
use rocket_bridge::{new_module, MethodTable, Outcome};

/// Read a whole file as text
pub fn read_file(path: &str) -> Outcome<String> {
    match fs::read_to_string(path) {
        Ok(contents) => (Some(contents), None),
        Err(err) => {
            tracing::debug!(path, error = %err, "fs.readFile failed");
            (None, Some(format!("Cannot open file '{}'", path)))
        }
    }
}

/// Replace a file's contents
pub fn write_file(path: &str, contents: &str) -> (bool, Option<String>) {
    match fs::write(path, contents) {
        Ok(()) => (true, None),
        Err(err) => {
            tracing::debug!(path, error = %err, "fs.writeFile failed");
            (false, Some(format!("Cannot open file '{}' for writing", path)))
        }
    }
}

/// Append to a file, creating it if needed
pub fn append_file(path: &str, contents: &str) -> (bool, Option<String>) {
    let result = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .and_then(|mut file| file.write_all(contents.as_bytes()));
    match result {
        Ok(()) => (true, None),
        Err(err) => (false, Some(format!("Cannot append to file '{}': {}", path, err))),
    }
}

/// List entry names of a directory, sorted
pub fn read_dir(path: &str) -> Outcome<Vec<String>> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(_) => return (None, Some(format!("Cannot read directory '{}'", path))),
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    (Some(names), None)
}

/// Remove a file
pub fn remove_file(path: &str) -> bool {
    fs::remove_file(path).is_ok()
}

/// Check if a path exists
pub fn file_exists(path: &str) -> bool {
    Path::new(path).exists()
}

/// Check if a path is a directory
pub fn is_dir(path: &str) -> bool {
    Path::new(path).is_dir()
}

/// Create a directory and any missing parents
pub fn mkdir(path: &str) -> (bool, Option<String>) {
    match fs::create_dir_all(path) {
        Ok(()) => (true, None),
        Err(err) => (false, Some(format!("Cannot create directory '{}': {}", path, err))),
    }
}

/// Publish the `fs` module.
pub fn install(lua: &Lua) -> mlua::Result<Table> {
    let functions = MethodTable::new()
        .add(lua, "readFile", |_, path: String| Ok(read_file(&path)))?
        .add(lua, "writeFile", |_, (path, text): (String, String)| {
            Ok(write_file(&path, &text))
        })?
        .add(lua, "appendFile", |_, (path, text): (String, String)| {
            Ok(append_file(&path, &text))
        })?
        .add(lua, "readDir", |_, path: String| Ok(read_dir(&path)))?
        .add(lua, "removeFile", |_, path: String| Ok(remove_file(&path)))?
        .add(lua, "fileExists", |_, path: String| Ok(file_exists(&path)))?
        .add(lua, "isDir", |_, path: String| Ok(is_dir(&path)))?
        .add(lua, "mkdir", |_, path: String| Ok(mkdir(&path)))?;
    new_module(lua, "fs", &functions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let file = path_str(&dir.path().join("note.txt"));

        assert_eq!(write_file(&file, "hello"), (true, None));
        assert_eq!(append_file(&file, " world"), (true, None));
        assert_eq!(read_file(&file), (Some("hello world".to_string()), None));
    }

    #[test]
    fn test_read_missing_file_reports_path() {
        let (contents, err) = read_file("/definitely/not/here.txt");
        assert!(contents.is_none());
        assert_eq!(err.as_deref(), Some("Cannot open file '/definitely/not/here.txt'"));
    }

    #[test]
    fn test_read_dir_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.lua", "a.lua", "b.lua"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let (names, err) = read_dir(&path_str(dir.path()));
        assert!(err.is_none());
        assert_eq!(names.unwrap(), vec!["a.lua", "b.lua", "c.lua"]);
    }

    #[test]
    fn test_mkdir_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        assert_eq!(mkdir(&path_str(&nested)), (true, None));
        assert!(is_dir(&path_str(&nested)));

        let file = path_str(&nested.join("x"));
        assert!(!remove_file(&file));
        fs::write(&file, "x").unwrap();
        assert!(file_exists(&file));
        assert!(remove_file(&file));
        assert!(!file_exists(&file));
    }
}
