//! stackbot - stacked pull requests for GitHub

mod cli;

use clap::{Parser, Subcommand, ValueEnum};
use stackbot::types::RepoId;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackbot")]
#[command(about = "Stacked pull requests for GitHub, driven by webhooks")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to <config dir>/stackbot/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitHub token (falls back to GH_TOKEN, then `gh auth token`)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve {
        /// Secret shared with the GitHub webhook
        #[arg(long, env = "STACKBOT_WEBHOOK_SECRET", hide_env_values = true)]
        webhook_secret: String,

        /// Address to listen on (overrides server.listen)
        #[arg(long)]
        listen: Option<SocketAddr>,
    },

    /// Process one saved webhook payload
    Replay {
        /// Webhook event type (X-GitHub-Event)
        #[arg(long, default_value = "pull_request")]
        event: String,

        /// Path to the JSON payload
        payload: PathBuf,
    },

    /// Show how stackbot sees a pull request
    Inspect {
        /// Repository as owner/name
        #[arg(long, value_parser = parse_repo)]
        repo: RepoId,

        /// Pull request number
        pr: u64,
    },
}

fn parse_repo(s: &str) -> Result<RepoId, String> {
    RepoId::parse(s).ok_or_else(|| format!("expected owner/name, got {s:?}"))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "stackbot=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Serve {
            webhook_secret,
            listen,
        } => cli::run_serve(config, cli.token, webhook_secret, listen).await?,
        Commands::Replay { event, payload } => {
            cli::run_replay(config, cli.token, &event, &payload).await?;
        }
        Commands::Inspect { repo, pr } => cli::run_inspect(config, cli.token, &repo, pr).await?,
    }

    Ok(())
}
