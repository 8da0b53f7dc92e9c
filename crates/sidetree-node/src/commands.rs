use std::net::SocketAddr;
use std::path::Path;

use colored::Colorize;
use tracing::{error, info};

use sidetree_core::Core;
use sidetree_types::{ProtocolVersion, ProtocolVersionFile};

use crate::cli::{CheckArgs, Cli, Command, RunArgs};
use crate::config::NodeConfig;
use crate::error::{NodeError, NodeResult};
use crate::server::NodeServer;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args).await,
        Command::Check(args) => cmd_check(args),
    }
}

fn load(config: &Path, protocol: &Path) -> NodeResult<(NodeConfig, Vec<ProtocolVersion>)> {
    let node = NodeConfig::load(config)?;
    let versions = ProtocolVersionFile::load(protocol)?.versions;
    Ok((node, versions))
}

async fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let (node, versions) = load(&args.config, &args.protocol)?;
    let bind_addr = match args.bind {
        Some(addr) => addr
            .parse::<SocketAddr>()
            .map_err(|_| NodeError::BindAddress(addr))?,
        None => node.server.bind_addr,
    };

    let core = Core::new(&node.core, versions)?;
    if let Err(e) = core.initialize().await {
        error!(error = %e, "node failed to start");
        core.shutdown().await;
        return Err(e.into());
    }

    let server = NodeServer::new(bind_addr, core.request_handler());
    let served = server.serve(shutdown_signal()).await;
    core.shutdown().await;
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c; shutting down");
        return;
    }
    info!("shutdown requested");
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let (node, versions) = load(&args.config, &args.protocol)?;
    Core::validate(&node.core, versions.clone())?;

    println!("{} Configuration valid", "✓".green().bold());
    println!("  DID method: {}", node.core.did_method_name.cyan());
    println!("  Blockchain: {}", node.core.blockchain_service_uri);
    println!("  CAS: {}", node.core.content_addressable_store_service_uri);
    println!("  Store: {}", node.core.database_connection_string);
    println!("  Listen: {}", node.server.bind_addr.to_string().bold());
    println!("  Protocol versions: {}", versions.len().to_string().bold());
    for version in &versions {
        println!(
            "    from t={}: {} ops/batch, {} bytes/op",
            version.starting_blockchain_time.to_string().yellow(),
            version.max_operations_per_batch,
            version.max_operation_byte_size
        );
    }
    Ok(())
}
