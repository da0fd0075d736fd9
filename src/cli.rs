use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::{io, path::PathBuf};

/// fevm_fand: fan curve daemon for the FEVM IP3 platform fans
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML config file path (default: $FEVM_FAND_CONFIG, then the user
    /// config dir, then /etc/fevm_fand/config.yml). The old TOML file
    /// /etc/fevm-fan-curve.toml is no longer read.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log verbosity (case-insensitive)
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        ignore_case = true,
        default_value_t = LogLevel::Info
    )]
    pub log_level: LogLevel,

    /// Detach from the terminal and log to syslog
    #[arg(short = 'd', long = "daemonize", default_value = "false")]
    pub daemonize: bool,
}

impl Cli {
    /// `--config` made absolute against the current directory, so it still
    /// names the same file once the daemon has changed directory to `/`.
    pub fn config_path(&self) -> io::Result<Option<PathBuf>> {
        self.config.as_deref().map(std::path::absolute).transpose()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    #[value(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
