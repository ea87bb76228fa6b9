//! Consul to chat bridge.
//!
//! Long-polls Consul for health check transitions and forwards each one to
//! Slack and Discord.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │               CONSUL CHAT BRIDGE             │
//!                       │                                              │
//!   Consul agent        │  ┌─────────────┐    ┌──────────────┐         │
//!   ────────────────────┼─▶│   consul    │───▶│   dispatch   │         │
//!   /v1/health/state    │  │ WatchClient │    │  render +    │         │
//!   (blocking query)    │  └──────▲──────┘    │  fan-out     │         │
//!                       │         │           └──┬───────┬───┘         │
//!                       │         │ close        │       │             │
//!                       │  ┌──────┴──────┐   ┌───▼───┐ ┌─▼───────┐     │
//!                       │  │  lifecycle  │   │ slack │ │ discord │─────┼──▶ webhooks
//!                       │  │  signals    │   └───────┘ └─────────┘     │
//!                       │  └──────┬──────┘                             │
//!                       │         │ stop     ┌────────────┐            │
//!                       │         └─────────▶│ health     │◀───────────┼─── GET /healthz
//!                       │                    │ /healthz   │            │
//!                       │                    └────────────┘            │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tokio::net::TcpListener;

use consul_chat_bridge::config::validation::{normalize_bind_address, resolve_bind_address};
use consul_chat_bridge::config::{load_config, BridgeConfig, Overrides};
use consul_chat_bridge::consul::WatchClient;
use consul_chat_bridge::dispatch::Dispatcher;
use consul_chat_bridge::health;
use consul_chat_bridge::lifecycle::{spawn_signal_handler, Shutdown};
use consul_chat_bridge::notify::{DiscordNotifier, Notifier, SlackNotifier};
use consul_chat_bridge::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "consul-chat-bridge", version)]
#[command(about = "Forward Consul health check transitions to Slack and Discord", long_about = None)]
struct Cli {
    /// Slack incoming webhook URL
    #[arg(value_name = "SLACK_WEBHOOK_URL", env = "SLACK_WEBHOOK_URL")]
    slack_webhook_url: Option<String>,

    /// Discord webhook URL
    #[arg(long, env = "DISCORD_WEBHOOK_URL")]
    discord_webhook: Option<String>,

    /// Slack user name
    #[arg(long)]
    slack_username: Option<String>,

    /// Slack user avatar URL
    #[arg(long)]
    slack_icon: Option<String>,

    /// Address of the Consul agent [default: 127.0.0.1:8500]
    #[arg(long, env = "CONSUL_HTTP_ADDR")]
    consul_address: Option<String>,

    /// URI scheme of the Consul agent [default: http]
    #[arg(long)]
    consul_scheme: Option<String>,

    /// Datacenter to watch [default: dc1]
    #[arg(long)]
    consul_datacenter: Option<String>,

    /// Consul ACL token
    #[arg(long, env = "CONSUL_HTTP_TOKEN", hide_env_values = true)]
    consul_token: Option<String>,

    /// Liveness endpoint address [default: :8080]
    #[arg(long, env = "HEALTH_CHECK_ADDR")]
    health_check_addr: Option<String>,

    /// Log level [default: info]
    #[arg(long)]
    log_level: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            slack_webhook_url: self.slack_webhook_url.clone(),
            slack_username: self.slack_username.clone(),
            slack_icon_url: self.slack_icon.clone(),
            discord_webhook_url: self.discord_webhook.clone(),
            consul_address: self.consul_address.clone(),
            consul_scheme: self.consul_scheme.clone(),
            consul_datacenter: self.consul_datacenter.clone(),
            consul_token: self.consul_token.clone(),
            health_check_address: self.health_check_addr.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config) = load(&cli, &mut std::io::stderr()) else {
        return ExitCode::FAILURE;
    };

    logging::init_logging(&config.observability);
    tracing::info!(
        "{} v{} starting",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = start(config).await {
        eprintln!("exited with error: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

/// Load the configuration, or explain the problem and print usage to `out`.
fn load(cli: &Cli, out: &mut impl Write) -> Option<BridgeConfig> {
    match load_config(cli.config.as_deref(), &cli.overrides()) {
        Ok(config) => Some(config),
        Err(e) => {
            let _ = writeln!(out, "error: {e}");
            let _ = writeln!(out, "{}", Cli::command().render_help());
            None
        }
    }
}

async fn start(config: BridgeConfig) -> Result<(), Box<dyn Error>> {
    tracing::info!(
        consul_address = %config.consul.address,
        consul_scheme = %config.consul.scheme,
        datacenter = %config.consul.datacenter,
        slack_username = %config.slack.username,
        "Configuration loaded"
    );

    let slack = SlackNotifier::new(&config.slack, &config.timeouts)?;
    let discord = DiscordNotifier::new(&config.discord, &config.timeouts)?;

    let shutdown = Shutdown::new();
    let mut watch = WatchClient::new(
        &config.consul,
        &config.timeouts,
        &config.retries,
        shutdown.subscribe(),
    )?;
    spawn_signal_handler(shutdown.clone());

    if config.health_check.enabled {
        let addr = normalize_bind_address(&config.health_check.bind_address);
        let listener = TcpListener::bind(addr.as_str()).await?;
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = health::serve(listener, server_shutdown).await {
                tracing::error!(error = %e, "Health check server failed");
            }
        });
    }

    if config.observability.metrics_enabled {
        let addr = resolve_bind_address(&config.observability.metrics_address).await?;
        metrics::init_metrics(addr);
    }

    let sinks: Vec<Box<dyn Notifier>> = vec![Box::new(slack), Box::new(discord)];
    let dispatcher = Dispatcher::new(sinks);

    let result = dispatcher.run(&mut watch).await;
    shutdown.trigger();
    result?;
    Ok(())
}
