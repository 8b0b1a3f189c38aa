use std::{borrow::Cow, fmt, io::IsTerminal, path::PathBuf, str::FromStr};

use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use logforth::filter::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "StoryGenie", version, long_about = concat!("StoryGenie v", env!("CARGO_PKG_VERSION"), ", children's stories on demand"))]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(long, short, global = true, env = "STORYGENIE_CONFIG_PATH", default_value = "./storygenie.toml")]
    pub config: PathBuf,
    /// Set the logging level
    #[arg(long = "log", global = true, env = "STORYGENIE_LOG", default_value_t = LogLevel::default())]
    pub log_level: LogLevel,
    /// Set the style of log output
    #[arg(long, global = true, env = "STORYGENIE_LOG_STYLE", default_value_t = LogStyle::default())]
    pub log_style: LogStyle,
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn config(&self) -> anyhow::Result<Config> {
        let config = if self.config.exists() {
            Config::load(&self.config)?
        } else {
            log::debug!("No configuration at {}, using defaults", self.config.display());
            Config::default()
        };

        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a children's story from a prompt
    Generate {
        /// What the story should be about
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
        /// Save the generated story as a favorite
        #[arg(long)]
        save: bool,
    },
    /// List favorite stories
    Favorites,
    /// List every story that can be read
    Stories,
    /// Print a story by title
    Read {
        /// Title of the story, case-insensitive
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogStyle {
    /// Colorized text, used as the default with TTY output
    Color,
    /// Standard text, used as the default with non-TTY output
    Text,
    /// JSON objects
    Json,
}

impl Default for LogStyle {
    fn default() -> Self {
        // Logs go to stderr, stories to stdout.
        if std::io::stderr().is_terminal() {
            LogStyle::Color
        } else {
            LogStyle::Text
        }
    }
}

impl AsRef<str> for LogStyle {
    fn as_ref(&self) -> &str {
        match self {
            LogStyle::Color => "color",
            LogStyle::Text => "text",
            LogStyle::Json => "json",
        }
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogLevel {
    /// Disable logging
    Off,
    /// Only log errors
    Error,
    /// Log errors, and warnings
    Warn,
    /// Log errors, warnings, and info messages
    #[default]
    Info,
    /// Log errors, warnings, info, and debug messages
    Debug,
    /// Log errors, warnings, info, debug, and trace messages
    Trace,
}

impl LogLevel {
    pub fn env_filter(self) -> EnvFilter {
        let filter_str = match self {
            LogLevel::Off => Cow::Borrowed("off"),
            // Dependencies stay at 'warn', workspace crates use the selected level
            level => Cow::Owned(format!("warn,storygenie={level},story={level},config={level}")),
        };

        EnvFilter::from_str(&filter_str).expect("These all are valid env filters.")
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
