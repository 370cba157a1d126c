//! Chat command parsing and dispatch.
//!
//! Messages are tokenized with `shlex` and parsed by a `clap` subcommand
//! enum, the same way an interactive CLI would parse a typed line.

use bftracker_types::formatting::{bullet_list, truncate_with_marker};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use crate::context::AppContext;
use crate::error::{CommandError, RosterError};
use crate::roster;
use crate::stats::StatsSource;

/// Longest raw payload shown by `checkplayer`, in characters.
pub const CHECK_DISPLAY_LIMIT: usize = 1900;
const TRUNCATION_MARKER: &str = "\n... (truncated)";

pub const GENERIC_FAILURE: &str = "⚠️ An error occurred while processing the command.";

#[derive(Parser, Debug)]
#[command(
    disable_help_subcommand = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct CommandLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Players,
    #[command(name = "addplayer")]
    AddPlayer { username: String },
    #[command(name = "removeplayer")]
    RemovePlayer { username: String },
    #[command(name = "checkplayer")]
    CheckPlayer { username: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Players => "players",
            Command::AddPlayer { .. } => "addplayer",
            Command::RemovePlayer { .. } => "removeplayer",
            Command::CheckPlayer { .. } => "checkplayer",
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self, Command::AddPlayer { .. } | Command::RemovePlayer { .. })
    }
}

/// Identity of whoever sent a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: u64,
    pub name: String,
    pub privileged: bool,
}

/// Parse a chat message.
///
/// Returns `None` when the message is not addressed to the bot, and
/// `Some(Err(reason))` when it is but doesn't parse.
pub fn parse_command(prefix: &str, content: &str) -> Option<Result<Command, String>> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let Some(mut args) = shlex::split(rest) else {
        return Some(Err("invalid quoting".to_string()));
    };
    if args.is_empty() {
        return Some(Ok(Command::Help));
    }
    args.insert(0, prefix.to_string());

    Some(
        CommandLine::try_parse_from(args)
            .map(|line| line.command)
            .map_err(|e| {
                let rendered = e.to_string();
                let first = rendered.lines().next().unwrap_or_default();
                first.trim_start_matches("error: ").to_string()
            }),
    )
}

/// Reply for a message that addressed the bot but didn't parse.
pub fn usage_reply(prefix: &str, reason: &str) -> String {
    format!("⚠️ {reason}. Try `{prefix} help`.")
}

pub fn help_text(prefix: &str) -> String {
    format!(
        "**🪖 Battlefield Tracker Bot – Commands**\n\n\
         `{prefix} help` – Show this help message\n\
         `{prefix} players` – List monitored players\n\
         `{prefix} addplayer <EA username>` – Add a player *(Admin only)*\n\
         `{prefix} removeplayer <EA username>` – Remove a player *(Admin only)*\n\
         `{prefix} checkplayer <EA username>` – Show API stats for a player\n"
    )
}

/// Run `command` for `caller` and produce the reply.
///
/// Never fails: user mistakes become warnings, anything else is logged with
/// the caller and answered with [`GENERIC_FAILURE`].
pub async fn dispatch<S: StatsSource>(
    ctx: &mut AppContext,
    stats: &S,
    caller: &Caller,
    command: &Command,
) -> String {
    info!(
        caller = %caller.name,
        caller_id = caller.id,
        command = command.name(),
        "Command received"
    );

    match execute(ctx, stats, caller, command).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(caller = %caller.name, caller_id = caller.id, error = %e, "Command failed");
            GENERIC_FAILURE.to_string()
        }
    }
}

async fn execute<S: StatsSource>(
    ctx: &mut AppContext,
    stats: &S,
    caller: &Caller,
    command: &Command,
) -> Result<String, CommandError> {
    if command.is_privileged() && !caller.privileged {
        warn!(caller = %caller.name, command = command.name(), "Rejected unprivileged caller");
        return Ok(format!(
            "⛔ `{}` is restricted to admins.",
            command.name()
        ));
    }

    match command {
        Command::Help => Ok(help_text(&ctx.config.command_prefix)),
        Command::Players => Ok(list_players(ctx)),
        Command::AddPlayer { username } => roster_reply(
            command.name(),
            roster::add_player(ctx, username),
            format!("✅ Now monitoring **{username}**"),
        ),
        Command::RemovePlayer { username } => roster_reply(
            command.name(),
            roster::remove_player(ctx, username),
            format!("🗑️ Stopped monitoring **{username}**"),
        ),
        Command::CheckPlayer { username } => check_player(stats, username).await,
    }
}

fn list_players(ctx: &AppContext) -> String {
    let players = roster::players(ctx);
    if players.is_empty() {
        return "📭 No players are being monitored.".to_string();
    }
    format!("**📋 Monitored Players**\n{}", bullet_list(players))
}

fn roster_reply(
    command: &'static str,
    result: Result<(), RosterError>,
    success: String,
) -> Result<String, CommandError> {
    match result {
        Ok(()) => Ok(success),
        Err(RosterError::AlreadyMonitored(name)) => {
            warn!(player = %name, "Add rejected, already monitored");
            Ok(format!("⚠️ **{name}** is already monitored."))
        }
        Err(RosterError::NotMonitored(name)) => {
            warn!(player = %name, "Remove rejected, not monitored");
            Ok(format!("⚠️ **{name}** is not monitored."))
        }
        Err(RosterError::Storage(e)) => Err(CommandError {
            command,
            source: Box::new(e),
        }),
    }
}

async fn check_player<S: StatsSource>(stats: &S, username: &str) -> Result<String, CommandError> {
    let payload = match roster::check_player(stats, username).await {
        Ok(payload) => payload,
        Err(_) => return Ok(format!("⚠️ Failed to fetch data for **{username}**")),
    };

    let pretty = serde_json::to_string_pretty(&payload).map_err(|e| CommandError {
        command: "checkplayer",
        source: Box::new(e),
    })?;
    let shown = truncate_with_marker(&pretty, CHECK_DISPLAY_LIMIT, TRUNCATION_MARKER);

    Ok(format!("```json\n{shown}\n```"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bftracker_types::TrackerConfig;
    use serde_json::json;

    use crate::testing::FakeStats;
    use crate::tracking::TrackingStore;

    fn admin() -> Caller {
        Caller {
            id: 1,
            name: "admin".to_string(),
            privileged: true,
        }
    }

    fn member() -> Caller {
        Caller {
            id: 2,
            name: "member".to_string(),
            privileged: false,
        }
    }

    fn context(dir: &tempfile::TempDir, players: &[&str]) -> AppContext {
        let config = TrackerConfig {
            token: "t".to_string(),
            channel_id: 1,
            players: players.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        };
        AppContext::new(
            config,
            dir.path().join("bftracker.toml"),
            TrackingStore::empty(dir.path().join("state.json")),
        )
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("!bf", "!bf help"), Some(Ok(Command::Help)));
        assert_eq!(parse_command("!bf", "  !bf players "), Some(Ok(Command::Players)));
        assert_eq!(
            parse_command("!bf", "!bf addplayer Alpha"),
            Some(Ok(Command::AddPlayer {
                username: "Alpha".to_string()
            }))
        );
        assert_eq!(
            parse_command("!bf", "!bf checkplayer \"Some Name\""),
            Some(Ok(Command::CheckPlayer {
                username: "Some Name".to_string()
            }))
        );
        assert_eq!(parse_command("!bf", "!bf"), Some(Ok(Command::Help)));
    }

    #[test]
    fn test_parse_ignores_other_messages() {
        assert_eq!(parse_command("!bf", "hello there"), None);
        assert_eq!(parse_command("!bf", "!bfplayers"), None);
        assert_eq!(parse_command("!bf", ""), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_command("!bf", "!bf dance"), Some(Err(_))));
        assert!(matches!(parse_command("!bf", "!bf addplayer"), Some(Err(_))));
        assert!(matches!(parse_command("!bf", "!bf addplayer a b"), Some(Err(_))));
        assert_eq!(
            parse_command("!bf", "!bf checkplayer \"open"),
            Some(Err("invalid quoting".to_string()))
        );
    }

    #[tokio::test]
    async fn test_players_lists_roster_or_notice() {
        let dir = tempfile::tempdir().unwrap();
        let stats = FakeStats::new();

        let mut empty = context(&dir, &[]);
        let reply = dispatch(&mut empty, &stats, &member(), &Command::Players).await;
        assert_eq!(reply, "📭 No players are being monitored.");

        let mut ctx = context(&dir, &["Alpha", "Bravo"]);
        let reply = dispatch(&mut ctx, &stats, &member(), &Command::Players).await;
        assert_eq!(reply, "**📋 Monitored Players**\n• Alpha\n• Bravo");
    }

    #[tokio::test]
    async fn test_help_uses_configured_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &[]);
        ctx.config.command_prefix = "?bt".to_string();

        let reply = dispatch(&mut ctx, &FakeStats::new(), &member(), &Command::Help).await;
        assert!(reply.contains("`?bt addplayer <EA username>`"));
    }

    #[tokio::test]
    async fn test_unprivileged_caller_cannot_mutate_roster() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &["Alpha"]);
        let stats = FakeStats::new();

        let add = Command::AddPlayer {
            username: "Bravo".to_string(),
        };
        let reply = dispatch(&mut ctx, &stats, &member(), &add).await;
        assert!(reply.starts_with("⛔"));

        let remove = Command::RemovePlayer {
            username: "Alpha".to_string(),
        };
        dispatch(&mut ctx, &stats, &member(), &remove).await;

        assert_eq!(ctx.config.players, vec!["Alpha"]);
        assert!(!ctx.config_path().exists());
    }

    #[tokio::test]
    async fn test_admin_add_and_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &[]);
        let stats = FakeStats::new();
        let add = Command::AddPlayer {
            username: "x".to_string(),
        };

        let first = dispatch(&mut ctx, &stats, &admin(), &add).await;
        assert_eq!(first, "✅ Now monitoring **x**");

        let second = dispatch(&mut ctx, &stats, &admin(), &add).await;
        assert_eq!(second, "⚠️ **x** is already monitored.");
        assert_eq!(ctx.config.players, vec!["x"]);
    }

    #[tokio::test]
    async fn test_remove_unknown_player_warns() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &[]);
        let remove = Command::RemovePlayer {
            username: "ghost".to_string(),
        };

        let reply = dispatch(&mut ctx, &FakeStats::new(), &admin(), &remove).await;
        assert_eq!(reply, "⚠️ **ghost** is not monitored.");
    }

    #[tokio::test]
    async fn test_storage_failure_gets_generic_notice() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let mut ctx = AppContext::new(
            TrackerConfig {
                token: "t".to_string(),
                channel_id: 1,
                ..Default::default()
            },
            blocker.join("bftracker.toml"),
            TrackingStore::empty(dir.path().join("state.json")),
        );
        let add = Command::AddPlayer {
            username: "x".to_string(),
        };

        let reply = dispatch(&mut ctx, &FakeStats::new(), &admin(), &add).await;
        assert_eq!(reply, GENERIC_FAILURE);
        assert!(ctx.config.players.is_empty());
    }

    #[tokio::test]
    async fn test_checkplayer_pretty_prints_payload() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &[]);
        let stats = FakeStats::new().with_payload("Alpha", json!({ "kills": 3 }));
        let check = Command::CheckPlayer {
            username: "Alpha".to_string(),
        };

        let reply = dispatch(&mut ctx, &stats, &member(), &check).await;
        assert_eq!(reply, "```json\n{\n  \"kills\": 3\n}\n```");
        assert!(ctx.store.is_empty());
    }

    #[tokio::test]
    async fn test_checkplayer_truncates_long_payload() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &[]);
        let stats = FakeStats::new().with_payload("Alpha", json!({ "blob": "x".repeat(5_000) }));
        let check = Command::CheckPlayer {
            username: "Alpha".to_string(),
        };

        let reply = dispatch(&mut ctx, &stats, &member(), &check).await;
        assert!(reply.contains("\n... (truncated)\n```"));
        let body = reply
            .trim_start_matches("```json\n")
            .trim_end_matches("\n... (truncated)\n```");
        assert_eq!(body.chars().count(), CHECK_DISPLAY_LIMIT);
    }

    #[tokio::test]
    async fn test_checkplayer_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &[]);
        let check = Command::CheckPlayer {
            username: "Nobody".to_string(),
        };

        let reply = dispatch(&mut ctx, &FakeStats::new(), &member(), &check).await;
        assert_eq!(reply, "⚠️ Failed to fetch data for **Nobody**");
    }

    #[test]
    fn test_usage_reply() {
        assert_eq!(
            usage_reply("!bf", "unrecognized subcommand 'dance'"),
            "⚠️ unrecognized subcommand 'dance'. Try `!bf help`."
        );
    }
}
