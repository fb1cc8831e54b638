use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rmcp::ServiceExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use portfolio_core::settings::read_settings;
use portfolio_core::{data_dir, FileStore};
use portfolio_suggest::{
    ConfigError, GatewayConfig, LlmGateway, PortfolioAnalyzer, SeedOptions, Seeder,
};

mod server;

use server::PortfolioServer;

#[derive(Parser)]
#[command(name = "portfolio-mcp", version, about = "Bank application portfolio over MCP")]
struct Cli {
    /// Directory holding portfolio.json and settings.json
    #[arg(long, global = true, env = "PORTFOLIO_HOME")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the portfolio tools over stdio (default)
    Serve,
    /// Wipe applications and integrations, then generate sample data
    Seed {
        /// Batches of applications, and again of integrations
        #[arg(long, default_value_t = 4)]
        batches: usize,
        /// Records requested per batch
        #[arg(long, default_value_t = 10)]
        batch_size: usize,
        /// Pause after each application batch, in milliseconds
        #[arg(long, default_value_t = 1000)]
        pause_ms: u64,
    },
}

fn build_gateway(dir: &Path) -> Result<LlmGateway, ConfigError> {
    let settings = read_settings(dir).with_env(|key| std::env::var(key).ok());
    LlmGateway::new(GatewayConfig::from_settings(&settings))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the MCP protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dir = cli.data_dir.unwrap_or_else(data_dir);
    std::fs::create_dir_all(&dir)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&dir).await,
        Command::Seed {
            batches,
            batch_size,
            pause_ms,
        } => {
            let options = SeedOptions {
                app_batches: batches,
                integration_batches: batches,
                batch_size,
                pause: Duration::from_millis(pause_ms),
            };
            seed(&dir, options).await
        }
    }
}

async fn serve(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open_in(dir)?;
    let analyzer = match build_gateway(dir) {
        Ok(gateway) => {
            info!(?gateway, "AI gateway ready");
            Ok(PortfolioAnalyzer::new(Arc::new(gateway)))
        }
        Err(e) => {
            warn!(error = %e, "AI tools disabled");
            Err(e.to_string())
        }
    };
    info!(path = %store.path().display(), "serving portfolio");

    let service = PortfolioServer::new(store, analyzer)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| eprintln!("MCP server error: {}", e))?;
    service.waiting().await?;
    Ok(())
}

async fn seed(dir: &Path, options: SeedOptions) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = build_gateway(dir)?;
    let mut store = FileStore::open_in(dir)?;
    info!(path = %store.path().display(), ?options, "seeding portfolio");

    let report = Seeder::new(Arc::new(gateway))
        .with_options(options)
        .run(&mut store)
        .await?;

    println!(
        "Done! {} applications, {} integrations ({} failed batches, {} skipped records)",
        report.applications, report.integrations, report.failed_batches, report.skipped_records
    );
    Ok(())
}
