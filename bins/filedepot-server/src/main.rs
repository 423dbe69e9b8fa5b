use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use filedepot_logging::{init_logging, LogConfig};
use filedepot_net::server::Server;
use filedepot_net_tcp::TcpListener;
use filedepot_service::{FileService, ServiceConfig};

/// Filedepot file transfer server
#[derive(Parser, Debug)]
#[command(name = "filedepot-server", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides the config file)
    #[arg(long)]
    listen: Option<String>,

    /// Upload directory (overrides the config file)
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Dump the default configuration as TOML and exit
    #[arg(long)]
    dump_default_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.dump_default_config {
        print!("{}", toml::to_string_pretty(&ServiceConfig::default())?);
        return Ok(());
    }

    let _log_guard = init_logging(&LogConfig::default());

    let mut config = match &args.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(upload_dir) = args.upload_dir {
        config.upload_dir = upload_dir;
    }
    config.validate()?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create upload directory {}",
                config.upload_dir.display()
            )
        })?;

    let addr = config.listen_socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let mut server = Server::new();
    server.register_service(Box::new(FileService::from_config(&config)));
    server.start(listener);

    tracing::info!(
        listen = %addr,
        upload_dir = %config.upload_dir.display(),
        transfer_limit = config.transfer_limit,
        list_limit = config.list_limit,
        "filedepot server started"
    );

    wait_for_shutdown_signal().await;

    server.stop();
    tracing::info!("filedepot server stopped");
    Ok(())
}

/// Wait for a shutdown signal (CTRL+C or SIGTERM).
async fn wait_for_shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");
    tokio::select! {
        _ = ctrl_c => { tracing::info!("received CTRL+C"); }
        _ = sigterm.recv() => { tracing::info!("received SIGTERM"); }
    }
}
