//! Wavechat CLI client (test build).
//!
//! Non-interactive: signs in with the given credentials, prints the feed,
//! subscribes to insert notifications and prints every reload until the run
//! duration elapses. Optionally sends one message before listening.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use wavechat_sdk_core::{ChatClient, ClientConfig, FeedListener};

#[derive(Parser, Debug)]
#[command(name = "wavechat-cli")]
#[command(about = "Wavechat CLI client for exercising the feed", long_about = None)]
struct Args {
    /// Project base URL
    #[arg(long, default_value = "http://localhost:54321")]
    url: String,

    /// Anonymous API key
    #[arg(long)]
    api_key: String,

    /// Account email
    #[arg(short, long)]
    email: String,

    /// Account password
    #[arg(short, long)]
    password: String,

    /// Conversation to scope the feed to (default: the global conversation)
    #[arg(short, long)]
    conversation: Option<String>,

    /// Message to send once connected
    #[arg(short, long)]
    send: Option<String>,

    /// Run duration in seconds, 0 keeps running
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// Log filter
    #[arg(long, default_value = "info,wavechat_sdk_core=debug")]
    log_level: String,
}

/// Logs to stdout and to a file at the same time.
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("wavechat-cli.log")
        .expect("cannot open wavechat-cli.log");

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_target(false)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

struct CliFeedListener;

#[async_trait::async_trait]
impl FeedListener for CliFeedListener {
    async fn on_feed_reloaded(&self, entry_count: usize) {
        info!("[CLI/Feed] feed reloaded, {} entries", entry_count);
    }

    async fn on_notice(&self, notice: String) {
        error!("[CLI/Feed] {}", notice);
    }

    async fn on_subscription_changed(&self, subscribed: bool) {
        if subscribed {
            info!("[CLI/Feed] realtime channel joined");
        } else {
            info!("[CLI/Feed] realtime channel released");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level);

    let mut config = ClientConfig::new(&args.url, &args.api_key);
    config.conversation_id = args.conversation.clone();

    let mut client = ChatClient::new(config);
    client.set_feed_listener(Arc::new(CliFeedListener));

    info!("[CLI] signing in as {}", args.email);
    client.sign_in(&args.email, &args.password).await?;

    client.connect().await?;
    let controller = client
        .controller()
        .ok_or_else(|| anyhow::anyhow!("controller missing after connect"))?;

    for entry in controller.feed() {
        let marker = if entry.is_own { "me" } else { "  " };
        let media = entry
            .message
            .media_url
            .as_deref()
            .map(|url| format!(" [{url}]"))
            .unwrap_or_default();
        info!(
            "[CLI] {} {} | {}{}",
            marker,
            entry.message.created_at.format("%H:%M:%S"),
            entry.message.content,
            media
        );
    }

    match client.fetch_profiles().await {
        Ok(profiles) => {
            for profile in &profiles {
                info!("[CLI] contact {} ({})", profile.username, profile.status.label());
            }
        }
        Err(e) => error!("[CLI] contact list unavailable: {e}"),
    }

    if let Some(text) = &args.send {
        controller.send_text(text).await?;
        info!("[CLI] sent: {}", text);
    }

    if args.duration > 0 {
        info!("[CLI] listening for {} seconds", args.duration);
        tokio::time::sleep(std::time::Duration::from_secs(args.duration)).await;
    } else {
        info!("[CLI] listening, Ctrl+C to exit");
        tokio::signal::ctrl_c().await?;
    }

    client.disconnect().await?;
    Ok(())
}
