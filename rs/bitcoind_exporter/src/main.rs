use anyhow::{Context, Result};
use bitcoind_exporter::{
    cli::CliArgs,
    http,
    logger::new_logger,
    metrics::{ExporterMetrics, MetricsRegistry},
    rpc::{JsonRpcClient, RpcClient},
    scheduler::{NodePoller, PollScheduler, TokioClock},
};
use clap::Parser;
use slog::{error, info, warn, Logger};
use std::{process::ExitCode, sync::Arc};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let config = CliArgs::parse().validate()?.get_config()?;
    let (log, guard) = new_logger(&config.logger);

    info!(
        log,
        "starting bitcoind-exporter";
        "interval" => humantime::format_duration(config.interval).to_string(),
        "listen" => &config.listen,
        "failure_domain" => format!("{:?}", config.failure_domain),
        "nodes" => config.nodes.len(),
    );

    let registry = MetricsRegistry::new();
    let metrics = ExporterMetrics::new(&registry, config.label_mode);

    let nodes = config
        .nodes
        .iter()
        .map(|node| {
            let client = JsonRpcClient::new(&node.url, config.rpc_timeout)
                .with_context(|| format!("failed to build RPC client for {}", node.name))?;
            info!(
                log,
                "polling node";
                "node" => &node.name,
                "type" => node.coin.as_ref(),
                "url" => client.display_url(),
            );
            Ok(NodePoller::new(
                node.clone(),
                Arc::new(client),
                config.label_mode,
                &log,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let listener = TcpListener::bind(config.listen.as_str())
        .await
        .with_context(|| format!("failed to listen on {}", config.listen))?;
    let server_log = log.clone();
    tokio::spawn(async move {
        if let Err(err) = http::serve(listener, registry, server_log.clone()).await {
            error!(server_log, "metrics endpoint failed: {}", err);
        }
    });

    let mut scheduler = PollScheduler::new(
        nodes,
        metrics,
        Arc::new(TokioClock),
        config.interval,
        config.failure_domain,
        log.clone(),
    );
    let exit_code = tokio::select! {
        result = scheduler.run() => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!(log, "{:#}", anyhow::Error::from(err));
                ExitCode::FAILURE
            }
        },
        _ = shutdown_signal(log.clone()) => ExitCode::SUCCESS,
    };

    // Flushes the log drain before the process exits.
    drop(guard);
    Ok(exit_code)
}

/// Resolves on the first SIGINT or SIGTERM.
async fn shutdown_signal(log: Logger) {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                warn!(log, "failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!(log, "caught SIGINT, shutting down"),
        _ = terminate => info!(log, "caught SIGTERM, shutting down"),
    }
}
