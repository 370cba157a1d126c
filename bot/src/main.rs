mod discord;
mod listener;
mod logging;

use std::path::PathBuf;
use std::time::Duration;

use bftracker_core::commands::usage_reply;
use bftracker_core::{
    AppContext, Caller, ChatSink, OutputChannel, PollError, StatsClient, dispatch, parse_command,
    run_poll_pass,
};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::discord::DiscordClient;
use crate::listener::{InboundMessage, ListenerConfig, spawn_command_listener};

/// Queued commands beyond this wait in the listener.
const COMMAND_QUEUE: usize = 64;

#[derive(Parser)]
#[command(version, about = "Announces when tracked Battlefield players start and stop playing")]
struct Args {
    /// Config file (TOML). Written with defaults if missing.
    #[arg(short, long, default_value = "bftracker.toml")]
    config: PathBuf,

    /// Tracking state file (JSON).
    #[arg(short, long, default_value = "state.json")]
    state: PathBuf,

    #[arg(long, default_value = "bftracker.log")]
    log_file: PathBuf,

    /// Log filter, e.g. `debug` or `info,bftracker_core=trace`. Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    let args = Args::parse();
    let _guard = logging::init_logging(&args.log_file, args.log_level.as_deref())?;

    let mut ctx = AppContext::load(&args.config, &args.state).map_err(|e| {
        error!(error = %e, "Startup failed");
        e.to_string()
    })?;

    let stats = StatsClient::new(&ctx.config.stats_endpoint, &ctx.config.platform)
        .map_err(|e| format!("cannot build stats client: {e}"))?;
    let discord = DiscordClient::new(&ctx.config.token).map_err(|e| e.to_string())?;

    let me = discord.current_user().await.map_err(|e| {
        error!(error = %e, "Login failed");
        format!("login failed: {e}")
    })?;
    info!(user = %me.username, id = me.id, "Bot logged in");

    let (tx, mut rx) = mpsc::channel(COMMAND_QUEUE);
    let listener = spawn_command_listener(
        discord.clone(),
        ListenerConfig {
            channel_id: ctx.config.channel_id,
            prefix: ctx.config.command_prefix.clone(),
            poll_interval: Duration::from_secs(ctx.config.command_poll_seconds),
            self_id: me.id,
        },
        tx,
    );

    let mut ticker = time::interval(Duration::from_secs(ctx.config.check_interval_secs()));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut rng = StdRng::from_entropy();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match run_poll_pass(&mut ctx, &stats, &discord, &mut rng, now_epoch).await {
                    Ok(_) => {}
                    // Logged when the channel lookup failed; the next tick retries.
                    Err(PollError::Chat(_)) => {}
                    Err(e) => error!(error = %e, "Poll pass failed"),
                }
            }
            Some(message) = rx.recv() => {
                handle_message(&mut ctx, &stats, &discord, message).await;
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for shutdown signal");
                }
                info!("Shutting down");
                break;
            }
        }
    }

    listener.abort();
    ctx.save_state().map_err(|e| {
        error!(error = %e, "Final state flush failed");
        e.to_string()
    })?;
    info!("State flushed, bye");
    Ok(())
}

async fn handle_message(
    ctx: &mut AppContext,
    stats: &StatsClient,
    discord: &DiscordClient,
    message: InboundMessage,
) {
    let prefix = ctx.config.command_prefix.clone();

    let reply = match parse_command(&prefix, &message.content) {
        None => return,
        Some(Err(reason)) => {
            debug!(author = %message.author_name, reason = %reason, "Unparseable command");
            usage_reply(&prefix, &reason)
        }
        Some(Ok(command)) => {
            let caller = Caller {
                id: message.author_id,
                privileged: ctx.config.is_admin(message.author_id),
                name: message.author_name,
            };
            dispatch(ctx, stats, &caller, &command).await
        }
    };

    let channel = OutputChannel::new(ctx.config.channel_id, None);
    if let Err(e) = discord.post(&channel, &reply).await {
        warn!(error = %e, "Failed to send command reply");
    }
}
