use clap::{Parser, Subcommand};
use epp_gateway::application::orchestrator::PaymentOrchestrator;
use epp_gateway::config::EppConfig;
use epp_gateway::domain::ports::TransactionStoreBox;
use epp_gateway::domain::sale::{CallbackPayload, SaleRequest};
use epp_gateway::infrastructure::in_memory::InMemoryTransactionStore;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gateway configuration JSON file
    #[arg(long)]
    config: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a sale request and print the hosted-checkout form HTML
    Initiate {
        /// Sale request JSON file
        request: PathBuf,
    },
    /// Process a processor callback and print the acknowledgment JSON
    Callback {
        /// Callback payload JSON file
        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = EppConfig::from_file(&cli.config).into_diagnostic()?;
    let store = build_store(cli.db_path)?;
    let orchestrator = PaymentOrchestrator::new(config, store);

    match cli.command {
        Command::Initiate { request } => {
            let data = std::fs::read_to_string(request).into_diagnostic()?;
            let sale: SaleRequest = serde_json::from_str(&data).into_diagnostic()?;
            let html = orchestrator.initiate(sale).await.into_diagnostic()?;
            println!("{html}");
        }
        Command::Callback { payload } => {
            let data = std::fs::read_to_string(payload).into_diagnostic()?;
            let callback: CallbackPayload = serde_json::from_str(&data).into_diagnostic()?;
            // The processor must always receive a valid acknowledgment, so
            // this path never returns an error past this point.
            let ack = orchestrator.acknowledge(callback).await;
            println!("{}", serde_json::to_string(&ack).into_diagnostic()?);
        }
    }

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn build_store(db_path: Option<PathBuf>) -> Result<TransactionStoreBox> {
    use epp_gateway::infrastructure::rocksdb::RocksDbTransactionStore;

    match db_path {
        Some(path) => Ok(Box::new(
            RocksDbTransactionStore::open(path).into_diagnostic()?,
        )),
        None => Ok(Box::new(InMemoryTransactionStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_store(db_path: Option<PathBuf>) -> Result<TransactionStoreBox> {
    if db_path.is_some() {
        miette::bail!("this build has no RocksDB support; rebuild with --features storage-rocksdb");
    }
    Ok(Box::new(InMemoryTransactionStore::new()))
}
