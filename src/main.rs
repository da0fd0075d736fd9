use std::fs::File;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use daemonize::Daemonize;
use log::{error, info};
use tokio_util::sync::CancellationToken;

use fevm_fand::{application::Application, cli::Cli, config::Config, logging, shutdown};

const DAEMON_LOG: &str = "/var/tmp/fevm_fand.log";

fn into_daemon() -> Result<()> {
    File::create(DAEMON_LOG)
        .and_then(|out| Ok((out.try_clone()?, out)))
        .map_err(|e| anyhow!("{e}"))
        .and_then(|(stderr, stdout)| {
            Daemonize::new()
                .stdout(stdout)
                .stderr(stderr)
                .start()
                .map_err(|e| anyhow!("{e}"))
        })
}

async fn serve(config: Config) -> Result<()> {
    let app = Application::builder()
        .with_config(config)
        .build()
        .context("Startup failed")?;

    let token = CancellationToken::new();
    let listener = shutdown::listen(token.clone()).context("Failed to install signal handlers")?;

    let state = app.run(token).await;
    listener.abort();
    info!("Control loop {state:?}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.log_level.into(), cli.daemonize)?;

    // Config is read before the fork, which changes directory to `/`.
    // The runtime is built after it.
    let result = cli
        .config_path()
        .context("Failed to resolve config path")
        .and_then(|path| Config::load(path).context("Failed to load config"))
        .and_then(|config| {
            if cli.daemonize {
                into_daemon()?;
            }
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to build tokio runtime")?
                .block_on(serve(config))
        });

    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}
