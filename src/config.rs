//! Configuration module for feedwatch.
//!
//! Settings come from three layers, highest priority first: command-line
//! arguments, the TOML configuration file, built-in defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::notify::Notifier;
use crate::watch::MAX_INTERVAL_MINUTES;
use crate::{FeedwatchError, Result};

/// Default configuration file, relative to the home directory.
pub const DEFAULT_CONFIG_FILE: &str = "~/.feedwatch/feedwatch.toml";

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file. Logs go to stdout only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Watch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Minutes between two sweeps of every feed.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// Root of the feed cache.
    #[serde(default = "default_working_dir")]
    pub working_dir: String,
    /// Folder holding `<host>.xslt` transforms.
    #[serde(default)]
    pub assets_dir: Option<String>,
    /// Watch-list files.
    #[serde(default)]
    pub files: Vec<String>,
}

fn default_interval_minutes() -> u64 {
    30
}

fn default_working_dir() -> String {
    "~/.feedwatch".to_string()
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            working_dir: default_working_dir(),
            assets_dir: None,
            files: Vec::new(),
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotifyConfig {
    /// Notifier specs (`pushover:<appToken>:<userKey>`, `telegram:<botId>#<chatId>`).
    #[serde(default)]
    pub notifiers: Vec<String>,
    /// Message template files.
    #[serde(default)]
    pub templates: Vec<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FeedwatchError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FeedwatchError::Config(format!("config parse error: {e}")))
    }

    /// Build the effective configuration for a command line.
    ///
    /// An explicitly named config file must exist. The default one is
    /// optional.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(expand_home(&path.to_string_lossy()))?,
            None => {
                let path = expand_home(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::load(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Override file values with the options given on the command line.
    ///
    /// Repeatable options replace the file's list when given at all.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
        if let Some(file) = &cli.log_file {
            self.logging.file = Some(file.to_string_lossy().into_owned());
        }
        if let Some(interval) = cli.interval {
            self.watch.interval_minutes = interval;
        }
        if let Some(dir) = &cli.working_dir {
            self.watch.working_dir = dir.to_string_lossy().into_owned();
        }
        if let Some(dir) = &cli.assets_dir {
            self.watch.assets_dir = Some(dir.to_string_lossy().into_owned());
        }
        if !cli.files.is_empty() {
            self.watch.files = to_strings(&cli.files);
        }
        if !cli.notifiers.is_empty() {
            self.notify.notifiers = cli.notifiers.clone();
        }
        if !cli.templates.is_empty() {
            self.notify.templates = to_strings(&cli.templates);
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - no notifier is configured, or one of them does not parse
    /// - no watch-list file is given
    /// - the interval is zero or longer than a year
    pub fn validate(&self) -> Result<()> {
        if self.notify.notifiers.is_empty() {
            return Err(FeedwatchError::Config(
                "at least one notifier is required (-n <type>:<value>)".to_string(),
            ));
        }
        self.notifiers()?;

        if self.watch.files.is_empty() {
            return Err(FeedwatchError::Config(
                "at least one watch-list file is required".to_string(),
            ));
        }
        if !(1..=MAX_INTERVAL_MINUTES).contains(&self.watch.interval_minutes) {
            return Err(FeedwatchError::Config(format!(
                "interval must be between 1 and {} minutes",
                MAX_INTERVAL_MINUTES
            )));
        }
        Ok(())
    }

    /// Parsed notifiers.
    pub fn notifiers(&self) -> Result<Vec<Notifier>> {
        self.notify
            .notifiers
            .iter()
            .map(|spec| Notifier::parse(spec))
            .collect()
    }

    /// Time between two sweeps.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.watch.interval_minutes.saturating_mul(60))
    }

    /// Root of the feed cache, with `~` expanded.
    pub fn working_dir(&self) -> PathBuf {
        expand_home(&self.watch.working_dir)
    }

    /// Transform folder; `assets` next to the executable when unset.
    pub fn assets_dir(&self) -> Option<PathBuf> {
        match &self.watch.assets_dir {
            Some(dir) => Some(expand_home(dir)),
            None => std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|dir| dir.join("assets"))),
        }
    }

    /// Watch-list files, with `~` expanded.
    pub fn files(&self) -> Vec<PathBuf> {
        self.watch.files.iter().map(|f| expand_home(f)).collect()
    }

    /// Template files, with `~` expanded.
    pub fn template_files(&self) -> Vec<PathBuf> {
        self.notify.templates.iter().map(|f| expand_home(f)).collect()
    }

    /// Log file, with `~` expanded.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.as_deref().map(expand_home)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => &rest[1..],
        _ => return PathBuf::from(path),
    };

    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

fn to_strings(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}
