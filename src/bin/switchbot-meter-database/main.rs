mod args;

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser as _;
use switchbot_meter_database::{scheduler::Scheduler, sink::Sink, switchbot::SwitchBotClient};
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(args.log_level);

    if let Err(e) = run(args).await {
        error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

fn init_tracing(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: Args) -> Result<()> {
    let storage_config = args
        .storage_config()
        .context("invalid storage configuration")?;
    let request_timeout = args.request_timeout();

    let api = SwitchBotClient::new(args.credentials(), request_timeout)
        .context("failed to build SwitchBot API client")?;
    let sink = Sink::configure(storage_config, request_timeout)
        .await
        .context("failed to configure storage sink")?;

    let scheduler = Scheduler::new(api, sink).with_call_timeout(request_timeout);

    info!(version = env!("CARGO_PKG_VERSION"), daemon = args.daemon, "start");

    if !args.daemon {
        let report = scheduler
            .run_once()
            .await
            .context("failed to list SwitchBot devices")?;
        if !report.is_clean() {
            warn!(%report, "some devices were skipped");
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for shutdown signal: {e}");
                return;
            }
            info!("shutdown signal received, stopping after the current run");
            cancel.cancel();
        }
    });

    scheduler.run_periodic(args.period(), cancel).await;

    Ok(())
}
