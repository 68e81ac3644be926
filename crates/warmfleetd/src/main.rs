//! warmfleetd — the warmfleet daemon.
//!
//! Single binary that wires discovery, the warmer and the HTTP surface:
//! - Cloud Run discovery (metadata-server or static token)
//! - Warmer (label filter + concurrent health probes)
//! - REST API + landing page
//!
//! # Usage
//!
//! ```text
//! warmfleetd serve --port 8080 --project-id my-project --region us-west1
//! warmfleetd warm --access-token "$(gcloud auth print-access-token)"
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use warmfleet_core::WarmConfig;
use warmfleet_discovery::cloud_run::DEFAULT_API_BASE;
use warmfleet_discovery::{CloudRunDiscovery, MetadataTokenSource, StaticTokenSource, TokenSource};
use warmfleet_probe::{HttpProber, Warmer};

#[derive(Parser)]
#[command(name = "warmfleetd", about = "Keeps labelled Cloud Run services warm")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

/// Landing page shipped with the api crate, relative to the workspace root.
const DEFAULT_PUBLIC_DIR: &str = "crates/warmfleet-api/public";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (`POST /api/warm`, `GET /health`, static files).
    Serve {
        /// Port to listen on.
        #[arg(long, env = "PORT", default_value = "8080")]
        port: u16,

        /// Directory of static files served at `/`. The default resolves
        /// when started from the workspace root.
        #[arg(long, default_value = DEFAULT_PUBLIC_DIR)]
        public_dir: PathBuf,

        #[command(flatten)]
        warm: WarmArgs,
    },
    /// Run a single warm cycle and print the summary as JSON.
    Warm {
        #[command(flatten)]
        warm: WarmArgs,
    },
}

#[derive(Args, Clone, Debug)]
struct WarmArgs {
    /// TOML file with warm settings; flags and environment override it.
    #[arg(long, env = "WARMFLEET_CONFIG")]
    config: Option<PathBuf>,

    /// Cloud project to discover services in.
    #[arg(long, env = "GCP_PROJECT_ID")]
    project_id: Option<String>,

    /// Region to discover services in.
    #[arg(long, env = "GCP_REGION")]
    region: Option<String>,

    /// Label key that opts a service into warming.
    #[arg(long)]
    label_key: Option<String>,

    /// Required value of the label.
    #[arg(long)]
    label_value: Option<String>,

    /// Per-probe timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Cloud Run Admin API base URL.
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Bearer token for the Admin API; defaults to the metadata server.
    #[arg(long, env = "WARMFLEET_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

impl WarmArgs {
    /// Defaults, then the config file, then flags/environment.
    fn to_config(&self) -> anyhow::Result<WarmConfig> {
        let mut config = match &self.config {
            Some(path) => WarmConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => WarmConfig::default(),
        };

        if let Some(project_id) = &self.project_id {
            config.project_id = project_id.clone();
        }
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if let Some(label_key) = &self.label_key {
            config.label_key = label_key.clone();
        }
        if let Some(label_value) = &self.label_value {
            config.label_value = label_value.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }

        config.validate()?;
        Ok(config)
    }

    /// Composition root: one HTTP client shared by discovery and probes.
    fn build_warmer(&self) -> anyhow::Result<Warmer> {
        let config = self.to_config()?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("warmfleet/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;

        let tokens: Arc<dyn TokenSource> = match &self.access_token {
            Some(token) => Arc::new(StaticTokenSource::new(token.clone())),
            None => Arc::new(MetadataTokenSource::new(client.clone())),
        };
        let discovery = CloudRunDiscovery::with_api_base(client.clone(), tokens, &self.api_base);

        info!(
            project_id = %config.project_id,
            region = %config.region,
            label = %format!("{}={}", config.label_key, config.label_value),
            timeout_ms = config.timeout_ms,
            "warmer configured"
        );

        Ok(Warmer::new(
            Arc::new(discovery),
            Arc::new(HttpProber::new(client)),
            config,
        ))
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,warmfleetd=debug,warmfleet=debug"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve {
            port,
            public_dir,
            warm,
        } => run_serve(port, public_dir, warm).await,
        Command::Warm { warm } => run_once(warm).await,
    }
}

async fn run_serve(port: u16, public_dir: PathBuf, args: WarmArgs) -> anyhow::Result<()> {
    let warmer = Arc::new(args.build_warmer()?);
    let router = warmfleet_api::build_router(warmer, &public_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, public_dir = %public_dir.display(), "warmfleet service starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("warmfleet service stopped");
    Ok(())
}

async fn run_once(args: WarmArgs) -> anyhow::Result<()> {
    let warmer = args.build_warmer()?;
    let summary = warmer.run().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
