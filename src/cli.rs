//! Command-line arguments.
//!
//! Every option is optional here: unset options are filled from the
//! configuration file, then from built-in defaults.

use std::path::PathBuf;

use clap::Parser;

/// feedwatch - pushes new feed entries to notification channels
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "feedwatch", version, about = "Watches feed subscriptions and pushes new entries")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long = "loglevel", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Check interval in minutes [default: 30]
    #[arg(short = 'i', long = "interval", value_name = "MINUTES")]
    pub interval: Option<u64>,

    /// Log file
    #[arg(short = 'f', long = "log", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Notifier spec: pushover:<appToken>:<userKey> or telegram:<botId>#<chatId>
    #[arg(short = 'n', long = "notifier", value_name = "TYPE:VALUE")]
    pub notifiers: Vec<String>,

    /// Working directory holding cached feeds [default: ~/.feedwatch]
    #[arg(short = 'w', long = "workingdir", value_name = "FOLDER")]
    pub working_dir: Option<PathBuf>,

    /// Message template file, named <host>.tmpl
    #[arg(short = 't', long = "template", value_name = "FILE")]
    pub templates: Vec<PathBuf>,

    /// Folder holding <host>.xslt transforms [default: <exe dir>/assets]
    #[arg(short = 'a', long = "assets", value_name = "FOLDER")]
    pub assets_dir: Option<PathBuf>,

    /// Configuration file [default: ~/.feedwatch/feedwatch.toml]
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Watch-list files, one feed URL per line
    #[arg(value_name = "FEED-FILE")]
    pub files: Vec<PathBuf>,
}
