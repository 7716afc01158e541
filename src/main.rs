use chrono::Utc;
use clap::Parser;
use slog::Drain;
use std::error::Error;
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use topic_cluster::{ClusterNodeConfig, ClusterOptions, GrpcRegistry};

/// One node of a self-organizing topic cluster.
#[derive(Parser, Debug)]
#[command(name = "topic-cluster-node", version)]
struct Cli {
    /// Cluster-assignment registry (host:port).
    #[arg(long)]
    registry: String,

    /// Address the peer and client RPC server binds to.
    #[arg(long, default_value = "0.0.0.0:7000")]
    listen: SocketAddr,

    /// Address peers and clients reach this node at. Defaults to `--listen`.
    #[arg(long)]
    advertise: Option<String>,

    /// Directory for the node's data file.
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Write logs to a timestamped file in this directory instead of stdout.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let listen = cli.listen;
    let advertise_address = cli.advertise.unwrap_or_else(|| listen.to_string());

    let logger = match &cli.log_dir {
        Some(log_dir) => create_root_logger_for_file(log_dir, &advertise_address)?,
        None => create_root_logger_for_stdout(),
    };

    let registry = GrpcRegistry::connect(logger.clone(), &cli.registry).await?;
    let node = topic_cluster::try_create_cluster_node(ClusterNodeConfig {
        listen_addr: listen,
        advertise_address,
        data_directory: cli.data_dir,
        info_logger: logger.clone(),
        options: ClusterOptions::default(),
        registry: Arc::new(registry),
    })
    .await?;
    slog::info!(logger, "Node {} is up", node.address());

    tokio::signal::ctrl_c().await?;
    node.shutdown();

    Ok(())
}

fn create_root_logger_for_file(log_dir: &PathBuf, node_address: &str) -> Result<slog::Logger, Box<dyn Error>> {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let file_name = format!("{}_{}_info.log", node_address.replace(':', "_"), now);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_dir.join(file_name))?;

    let decorator = slog_term::PlainDecorator::new(file);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Ok(slog::Logger::root(drain, slog::o!()))
}

fn create_root_logger_for_stdout() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}
