//! The shared parameter namespace handed to `init_flags`.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Arg, ArgAction, Command};
use thiserror::Error;

use crate::flags::env::{env_key, load_env_file, quote_value, EnvSource};
use crate::flags::flag::{AnyFlag, Flag, FlagValue};

/// Error type for parameter registration and resolution.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FlagError {
    /// Two registrations used the same flag name.
    #[error("flag `{name}` registered more than once")]
    Duplicate { name: String },

    /// A value from the command line or environment did not parse.
    #[error("invalid value `{value}` for flag `{name}` (from {origin}): {reason}")]
    Invalid {
        name: String,
        value: String,
        origin: &'static str,
        reason: String,
    },

    /// The command line itself was rejected (unknown flag, `--help`, ...).
    #[error(transparent)]
    Cli(#[from] clap::Error),

    /// The env file exists but could not be read.
    #[error("cannot read env file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FlagError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FlagError::Duplicate { .. } => "flag_duplicate",
            FlagError::Invalid { .. } => "flag_invalid",
            FlagError::Cli(_) => "flag_cli",
            FlagError::EnvFile { .. } => "flag_env_file",
        }
    }
}

/// Inputs a [`FlagSet`] resolves values from.
#[derive(Debug, Clone)]
pub struct FlagSources {
    /// Command line, program name first.
    pub args: Vec<String>,
    pub env: EnvSource,
    /// Optional `KEY=VALUE` file consulted after the environment.
    pub env_file: Option<PathBuf>,
}

impl FlagSources {
    /// Real command line and environment; env file from `ENV_FILE` or `.env`.
    pub fn from_process() -> Self {
        let env_file = std::env::var("ENV_FILE").unwrap_or_else(|_| ".env".to_string());
        Self {
            args: std::env::args().collect(),
            env: EnvSource::Process,
            env_file: Some(PathBuf::from(env_file)),
        }
    }

    /// Only the given arguments (without program name); no environment at all.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = vec!["service".to_string()];
        all.extend(args.into_iter().map(Into::into));
        Self {
            args: all,
            env: EnvSource::Map(HashMap::new()),
            env_file: None,
        }
    }

    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }
}

impl Default for FlagSources {
    fn default() -> Self {
        Self::from_process()
    }
}

/// Ordered collection of registered flags.
#[derive(Default)]
pub struct FlagSet {
    flags: Vec<Arc<dyn AnyFlag>>,
    names: HashSet<String>,
    duplicates: Vec<String>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flag. A repeated name is remembered and reported by [`FlagSet::parse`].
    pub fn register<T: FlagValue>(&mut self, flag: &Flag<T>) {
        if !self.names.insert(flag.name().to_string()) {
            tracing::warn!(flag = %flag.name(), "Flag registered more than once");
            self.duplicates.push(flag.name().to_string());
            return;
        }
        self.flags.push(flag.erased());
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Flag names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.flags.iter().map(|f| f.name()).collect()
    }

    /// Current value of a flag rendered as text.
    pub fn value_of(&self, name: &str) -> Option<String> {
        self.flags.iter().find(|f| f.name() == name).map(|f| f.render())
    }

    /// Resolves every flag: command line, then environment, then env file, then the
    /// flag's current value.
    pub fn parse(&self, sources: &FlagSources) -> Result<(), FlagError> {
        if let Some(name) = self.duplicates.first() {
            return Err(FlagError::Duplicate { name: name.clone() });
        }

        let matches = self.command().try_get_matches_from(&sources.args)?;

        let file_vars = match &sources.env_file {
            Some(path) => load_env_file(path).map_err(|source| FlagError::EnvFile {
                path: path.clone(),
                source,
            })?,
            None => HashMap::new(),
        };

        for flag in &self.flags {
            let key = env_key(flag.name());
            let resolved = if let Some(raw) = matches.get_one::<String>(flag.name()) {
                Some((raw.clone(), "command line"))
            } else if let Some(raw) = sources.env.var(&key) {
                Some((raw, "environment"))
            } else {
                file_vars.get(&key).map(|raw| (raw.clone(), "env file"))
            };

            // Unresolved flags keep their current value: the default, or
            // whatever the owner set programmatically.
            if let Some((raw, origin)) = resolved {
                flag.set_raw(&raw).map_err(|reason| FlagError::Invalid {
                    name: flag.name().to_string(),
                    value: raw.clone(),
                    origin,
                    reason,
                })?;
            }
        }

        tracing::debug!(count = self.flags.len(), "Flags resolved");
        Ok(())
    }

    /// One `KEY=VALUE` line per flag, in registration order.
    pub fn render_env(&self) -> String {
        let mut out = String::new();
        for flag in &self.flags {
            out.push_str(&env_key(flag.name()));
            out.push('=');
            out.push_str(&quote_value(&flag.render()));
            out.push('\n');
        }
        out
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("service").disable_version_flag(true);
        for flag in &self.flags {
            let mut arg = Arg::new(flag.name().to_string())
                .long(flag.name().to_string())
                .help(flag.help().to_string())
                .value_name(flag.kind())
                .action(ArgAction::Set);
            if flag.is_switch() {
                arg = arg.num_args(0..=1).default_missing_value("true");
            }
            cmd = cmd.arg(arg);
        }
        cmd
    }
}

impl std::fmt::Debug for FlagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagSet")
            .field("flags", &self.names())
            .field("duplicates", &self.duplicates)
            .finish()
    }
}
