//! Argument parsing.
//!
//! The documented grammar doesn't fit a conventional subcommand parser: an
//! unrecognized first word is shorthand for `ssa-gen <that word>` rather
//! than a hard error, and the diagnostic-dump flags are single-dash
//! (`-show-env`, not `--show-env`). Both are easiest to get right with a
//! small hand-rolled scan over `argv` rather than forcing them through a
//! derive macro built around a fixed, closed command set.

use std::fmt;

#[derive(Debug, Clone)]
pub enum Command {
    Help,
    Find(String),
    Parse(String),
    Compile(String),
    Specialize(String),
    SsaGen(String),
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub show_env: bool,
    pub show_types: bool,
    pub show_expr_types: bool,
    pub show_defn_types: bool,
    pub max_tuple: usize,
}

#[derive(Debug)]
pub enum CliError {
    MissingEntryModule,
    InvalidMaxTuple(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::MissingEntryModule => write!(f, "expected an entry module name"),
            CliError::InvalidMaxTuple(v) => write!(f, "MAX_TUPLE must be a positive integer, got `{v}`"),
        }
    }
}

impl std::error::Error for CliError {}

const DEFAULT_MAX_TUPLE: usize = 16;

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v != "0" && !v.is_empty()).unwrap_or(false)
}

impl Config {
    fn from_flags(flags: &[String]) -> Result<Config, CliError> {
        let mut config = Config {
            show_env: env_flag("SHOW_ENV"),
            show_types: env_flag("SHOW_TYPES"),
            show_expr_types: env_flag("SHOW_EXPR_TYPES"),
            show_defn_types: env_flag("SHOW_DEFN_TYPES"),
            max_tuple: match std::env::var("MAX_TUPLE") {
                Ok(v) => v.parse().map_err(|_| CliError::InvalidMaxTuple(v))?,
                Err(_) => DEFAULT_MAX_TUPLE,
            },
        };

        for flag in flags {
            match flag.as_str() {
                "-show-env" => config.show_env = true,
                "-show-types" => config.show_types = true,
                "-show-expr-types" => config.show_expr_types = true,
                "-show-defn-types" => config.show_defn_types = true,
                _ => {}
            }
        }

        Ok(config)
    }
}

/// Splits raw `argv` (excluding `arg0`) into the command word, its entry
/// module argument, and every `-`-prefixed flag, then builds the `Command`/
/// `Config` pair `run` dispatches on.
pub fn parse_args(args: &[String]) -> Result<(Command, Config), CliError> {
    let mut positionals = Vec::new();
    let mut flags = Vec::new();
    for arg in args {
        if arg.starts_with('-') && arg.len() > 1 {
            flags.push(arg.clone());
        } else {
            positionals.push(arg.clone());
        }
    }

    let config = Config::from_flags(&flags)?;

    let command = match positionals.first().map(String::as_str) {
        Some("help") | None => Command::Help,
        Some("find") => Command::Find(positionals.get(1).cloned().ok_or(CliError::MissingEntryModule)?),
        Some("parse") => Command::Parse(positionals.get(1).cloned().ok_or(CliError::MissingEntryModule)?),
        Some("compile") => Command::Compile(positionals.get(1).cloned().ok_or(CliError::MissingEntryModule)?),
        Some("specialize") => {
            Command::Specialize(positionals.get(1).cloned().ok_or(CliError::MissingEntryModule)?)
        }
        Some("ssa-gen") => Command::SsaGen(positionals.get(1).cloned().ok_or(CliError::MissingEntryModule)?),
        Some(other) => Command::SsaGen(other.to_string()),
    };

    Ok((command, config))
}
