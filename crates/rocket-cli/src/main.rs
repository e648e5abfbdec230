//! Rocket command-line host
//!
//! Runs one Lua script with the Rocket standard library installed:
//!
//! ```text
//! rocket game.lua --level 3
//! ```
//!
//! Settings come from `rocket.toml` next to the script (or `--config`), with
//! flags taking precedence.

use anyhow::Context;
use clap::Parser;
use rocket_runtime::{logging, RocketConfig, RuntimeError, RuntimeOptions, Session};
use std::path::{Path, PathBuf};

const USAGE: &str = "Usage: rocket <script.lua> [args...]";

#[derive(Parser, Debug)]
#[command(name = "rocket")]
#[command(about = "Run Lua scripts with Rocket's native modules", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to rocket.toml next to the script)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Entry function called after the script body
    #[arg(long)]
    entry: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,

    /// Script to run
    script: Option<PathBuf>,

    /// Arguments passed to the script as arg[1..]
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    let Some(script) = cli.script.as_deref() else {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    };

    if let Err(err) = run(&cli, script) {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli, script: &Path) -> anyhow::Result<RocketConfig> {
    match &cli.config {
        Some(path) => RocketConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(RocketConfig::discover(script)?.unwrap_or_default()),
    }
}

fn options(cli: &Cli, config: &RocketConfig) -> RuntimeOptions {
    let mut options = RuntimeOptions::from_config(config);
    if let Some(entry) = &cli.entry {
        options.entry = entry.clone();
    }
    options
}

fn run(cli: &Cli, script: &Path) -> anyhow::Result<()> {
    let config = load_config(cli, script)?;
    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    logging::init(level);

    let mut session = Session::new(&options(cli, &config)).map_err(script_error)?;
    let result = session.run_file(script, &cli.args);
    session.close();
    result.map_err(script_error)
}

// Lua errors are not `Send`, so they are flattened to text here.
fn script_error(err: RuntimeError) -> anyhow::Error {
    tracing::debug!(error = ?err, "script failed");
    anyhow::anyhow!("{}", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_args_keep_hyphens() {
        let cli =
            Cli::try_parse_from(["rocket", "--entry", "start", "game.lua", "-v", "--fast"])
                .unwrap();
        assert_eq!(cli.script, Some(PathBuf::from("game.lua")));
        assert_eq!(cli.args, vec!["-v", "--fast"]);
        assert_eq!(cli.entry.as_deref(), Some("start"));
    }

    #[test]
    fn test_no_script_parses() {
        let cli = Cli::try_parse_from(["rocket"]).unwrap();
        assert!(cli.script.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from(["rocket", "--entry", "boot", "x.lua"]).unwrap();
        let config = RocketConfig::default();
        let options = options(&cli, &config);
        assert_eq!(options.entry, "boot");
        assert_eq!(options.modules, config.runtime.modules);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["rocket", "--config", "/no/such/rocket.toml", "x.lua"])
            .unwrap();
        let err = load_config(&cli, Path::new("x.lua")).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to load"));
    }
}
