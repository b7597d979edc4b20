//! callmesh server binary.

use anyhow::{Context, Result};
use callmesh_core::Config;
use callmesh_server::observability::{init_tracing, TracingConfig};
use callmesh_server::{ApiServer, VERSION};
use clap::Parser;

/// Synthesize distributed call topologies on demand.
///
/// Configuration is read from the environment (`CALLMESH_HOST`,
/// `CALLMESH_PORT`, `CALLMESH_TARGET_URL`, `CALLMESH_UPSTREAM_TIMEOUT_MS`);
/// flags override it.
#[derive(Parser)]
#[command(name = "callmesh")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Base URL recursive child calls are sent to
    #[arg(short, long)]
    target_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&TracingConfig::from_env())?;

    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(target_url) = cli.target_url {
        config.target_url = target_url.trim_end_matches('/').to_string();
    }

    tracing::info!(version = VERSION, config = ?config, "starting callmesh");

    let mut server = ApiServer::new(config.clone())?;
    println!("callmesh {VERSION}");
    println!();
    println!("Listening on http://{}", config.listen_addr());
    println!("Child calls go to {}", config.target_url);
    println!();
    println!("Endpoints:");
    println!("  GET  /            - build a call tree (size, topology, time)");
    println!("  GET  /<task>      - same, running a tasklet at every node");
    println!("  POST /internal    - recursive entry point (internal)");
    println!("  GET  /healthz     - health check");
    println!("  GET  /help        - usage text");
    println!();
    println!("Press Ctrl+C to stop.");

    let shutdown = server
        .shutdown_handle()
        .context("shutdown handle already taken")?;
    let server_handle = tokio::spawn(async move { server.run().await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    shutdown.shutdown();
    server_handle.await??;

    Ok(())
}
