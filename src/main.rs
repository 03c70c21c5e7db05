//! Weibo Group Sender CLI - main entry point
//!
//! Log in once with browser cookies, then search group chats and broadcast
//! a message to the ones you pick.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use tracing::warn;
use weibo_group_sender::commands::{self, BroadcastArgs};
use weibo_group_sender::config::CONFIG_FILE;
use weibo_group_sender::metrics;

#[derive(Parser)]
#[command(name = "weibo_group_sender")]
#[command(about = "Broadcast a message to Weibo group chats", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the JSON config holding cookies and pacing
    #[arg(long, global = true, env = "WEIBO_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the browser session cookies
    Login {
        /// Full Cookie header value; prompted for when omitted
        #[arg(long)]
        cookie: Option<String>,
    },

    /// Forget the stored session cookies
    Logout,

    /// List group chats matching a keyword
    Search {
        /// Keyword to search for
        keyword: String,
    },

    /// Send one message to selected group chats
    Broadcast {
        /// Search keyword (prompted when omitted)
        #[arg(short, long)]
        keyword: Option<String>,

        /// Selection from the search result: "1,2,3" or "all"
        #[arg(short, long)]
        select: Option<String>,

        /// Message text (prompted when omitted)
        #[arg(short, long)]
        message: Option<String>,

        /// Group id to send to; repeatable, skips the search
        #[arg(long = "group")]
        groups: Vec<i64>,

        /// Seconds between sends (overrides config)
        #[arg(long)]
        delay: Option<u64>,

        /// Write per-group outcomes to this CSV file
        #[arg(long)]
        report_csv: Option<PathBuf>,

        /// Do not ask for confirmation
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::Logout => "logout",
            Commands::Search { .. } => "search",
            Commands::Broadcast { .. } => "broadcast",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("weibo_group_sender=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    let command_name = cli.command.name();
    metrics::record_command_start(command_name);
    let start = Instant::now();

    let result = execute_command(cli.config, cli.command).await;

    metrics::record_command_result(command_name, start.elapsed(), result.is_ok());

    result
}

async fn execute_command(config: PathBuf, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { cookie } => {
            commands::login_run(&config, cookie)?;
        }
        Commands::Logout => {
            commands::logout(&config)?;
        }
        Commands::Search { keyword } => {
            commands::search_run(&config, &keyword).await?;
        }
        Commands::Broadcast {
            keyword,
            select,
            message,
            groups,
            delay,
            report_csv,
            yes,
        } => {
            let args = BroadcastArgs {
                keyword,
                select,
                message,
                groups,
                delay,
                report_csv,
                yes,
            };
            commands::broadcast_run(&config, args).await?;
        }
    }

    Ok(())
}
