//! `stomp-events` terminal client.
//!
//! Run with: cargo run -p stomp-events-client -- [HOST] [PORT]
//!
//! Reads commands from standard input, one per line:
//! `login`, `join`, `exit`, `report`, `summary`, `logout`.

use std::{process::ExitCode, sync::Arc};

use anyhow::Result;
use clap::Parser;
use stomp_events_client::{Cli, Dispatcher, run_commands, spawn_stdin_reader};
use stomp_events_core::Transport;
use stomp_events_session::{Session, run_inbound, storage::FsStore};
use stomp_events_transport::TcpTransport;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Diagnostics on stderr, status text on stdout
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.client_config()?;

    let transport = match TcpTransport::connect(&config.host, config.port).await {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let session = Arc::new(
        Session::new(transport, FsStore).with_accept_version(config.accept_version.clone()),
    );

    let inbound = tokio::spawn({
        let session = Arc::clone(&session);
        async move {
            run_inbound(&session, |outcome| {
                if let Some(text) = outcome.notice() {
                    println!("{text}");
                }
            })
            .await;
        }
    });

    let dispatcher = Dispatcher::new(Arc::clone(&session));
    run_commands(&dispatcher, spawn_stdin_reader(), |text| println!("{text}")).await;

    session.transport().close().await;
    inbound.await?;
    tracing::info!("client stopped");

    Ok(ExitCode::SUCCESS)
}
