//! Logger setup: syslog when daemonized, timestamped stderr otherwise.

use anyhow::{Result, anyhow};
use fern::Dispatch;
use log::LevelFilter;
use syslog::{BasicLogger, Facility, Formatter3164};

/// Process name reported to syslog.
pub const SYSLOG_PROCESS: &str = "fevm_fand";

/// Installs the global logger. Must be called once, before any log line.
pub fn init(level: LevelFilter, daemonized: bool) -> Result<()> {
    if daemonized {
        init_syslog(level)
    } else {
        init_stderr(level)
    }
}

// Set up before daemonizing, so the current pid would be the parent's.
fn syslog_formatter() -> Formatter3164 {
    Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: SYSLOG_PROCESS.into(),
        pid: 0,
    }
}

fn init_syslog(level: LevelFilter) -> Result<()> {
    syslog::unix(syslog_formatter())
    .map_err(|e| anyhow!("{e}"))
    .and_then(|logger| {
        log::set_boxed_logger(Box::new(BasicLogger::new(logger)))
            .map(|_| log::set_max_level(level))
            .map_err(|e| anyhow!("{e}"))
    })
}

fn init_stderr(level: LevelFilter) -> Result<()> {
    Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}
