//! Harness configuration.
//!
//! Values come from defaults, then `SPIN_*` environment variables, then the
//! command line. Later sources win.

use std::num::NonZeroUsize;

/// Environment variable overriding [`HarnessConfig::increments`].
pub const ENV_INCREMENTS: &str = "SPIN_INCREMENTS";
/// Environment variable overriding [`HarnessConfig::workers`].
pub const ENV_WORKERS: &str = "SPIN_WORKERS";
/// Environment variable overriding [`HarnessConfig::protect`].
pub const ENV_PROTECT: &str = "SPIN_PROTECT";

/// How many increments the harness issues, on how many threads, and how.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Total number of increment requests issued.
    pub increments: usize,
    /// Number of OS threads the requests are spread over.
    pub workers: usize,
    /// Whether increments run under the counter's lock.
    pub protect: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            increments: 1000,
            workers: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            protect: true,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the harness with this configuration.
    Run(HarnessConfig),
    /// Print usage and exit.
    Help,
}

impl HarnessConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `SPIN_*` key.
    pub fn from_vars<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup(ENV_INCREMENTS) {
            cfg.increments = parse_count(ENV_INCREMENTS, &v)?;
        }
        if let Some(v) = lookup(ENV_WORKERS) {
            cfg.workers = parse_count(ENV_WORKERS, &v)?;
        }
        if let Some(v) = lookup(ENV_PROTECT) {
            cfg.protect = parse_bool(ENV_PROTECT, &v)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies command-line arguments (without the program name) on top of `self`.
    pub fn apply_args<I, S>(mut self, args: I) -> Result<Command, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            let (flag, inline) = match arg.split_once('=') {
                Some((f, v)) if f.starts_with("--") => (f, Some(v.to_string())),
                _ => (arg, None),
            };
            let mut value = || -> Result<String, String> {
                match &inline {
                    Some(v) => Ok(v.clone()),
                    None => args
                        .next()
                        .map(|v| v.as_ref().to_string())
                        .ok_or_else(|| format!("missing value for {flag}")),
                }
            };
            match flag {
                "-h" | "--help" => return Ok(Command::Help),
                "-n" | "--increments" => self.increments = parse_count(flag, &value()?)?,
                "-w" | "--workers" => self.workers = parse_count(flag, &value()?)?,
                "--protected" => self.protect = true,
                "--unprotected" => self.protect = false,
                _ => return Err(format!("unknown argument {arg}")),
            }
        }
        self.validate()?;
        Ok(Command::Run(self))
    }

    fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        Ok(())
    }
}

fn parse_count(name: &str, val: &str) -> Result<usize, String> {
    val.trim()
        .replace('_', "")
        .parse::<usize>()
        .map_err(|e| format!("bad value for {name}: {val:?} ({e})"))
}

fn parse_bool(name: &str, val: &str) -> Result<bool, String> {
    match val.trim() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("bad bool for {name}: {val:?}")),
    }
}
