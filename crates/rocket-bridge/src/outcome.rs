//! Dual returns for recoverable failures
//!
//! Domain failures do not raise. They return `nil` (or `false`) plus a message
//! that the calling script is expected to check:
//!
//! ```lua
//! local img, err = Image.load("missing.png")
//! if not img then print(err) end
//! ```

use std::fmt::Display;

/// `value` on success, `nil, message` on failure.
pub type Outcome<T> = (Option<T>, Option<String>);

/// Convert a domain result into a value-or-message pair.
pub fn outcome<T, E: Display>(result: Result<T, E>) -> Outcome<T> {
    match result {
        Ok(value) => (Some(value), None),
        Err(err) => (None, Some(err.to_string())),
    }
}

/// Convert a domain result into `true` or `false, message`.
pub fn status<E: Display>(result: Result<(), E>) -> (bool, Option<String>) {
    match result {
        Ok(()) => (true, None),
        Err(err) => (false, Some(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlua::Lua;

    #[test]
    fn test_failure_becomes_nil_and_message() {
        let lua = Lua::new();
        let open = lua
            .create_function(|_, ok: bool| {
                let result: Result<i64, String> = if ok {
                    Ok(7)
                } else {
                    Err("no such file".into())
                };
                Ok(outcome(result))
            })
            .unwrap();
        lua.globals().set("open", open).unwrap();

        let (value, err): (Option<i64>, Option<String>) =
            lua.load("return open(false)").eval().unwrap();
        assert_eq!(value, None);
        assert_eq!(err.as_deref(), Some("no such file"));

        let count: i64 = lua.load("return select('#', open(true))").eval().unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_status_reports_false_with_message() {
        assert_eq!(status::<String>(Ok(())), (true, None));
        assert_eq!(
            status(Err("denied")),
            (false, Some("denied".to_string()))
        );
    }
}
