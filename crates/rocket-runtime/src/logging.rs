//! Log subscriber setup
//!
//! Logs go to stderr so they never mix with what scripts print. `RUST_LOG`
//! takes precedence over the configured level.

use tracing_subscriber::EnvFilter;

/// Build the filter for `level`, letting `RUST_LOG` override it.
pub fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global fmt subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init(level: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        init("debug");
        assert!(!init("debug"));
    }

    #[test]
    fn test_bad_level_falls_back() {
        let filter = filter("not a [valid filter");
        assert!(!filter.to_string().is_empty());
    }
}
