//! One poll pass over the roster.
//!
//! The timer driving passes lives in the binary; this module only knows how
//! to run a single pass against injected collaborators.

use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::activity::{Step, advance};
use crate::chat::ChatSink;
use crate::context::AppContext;
use crate::error::PollError;
use crate::messages::select_message;
use crate::stats::StatsSource;

/// Outcome of a completed pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Players whose stats were fetched successfully.
    pub checked: usize,
    /// Players skipped because their fetch failed.
    pub failed: Vec<String>,
    /// Notifications delivered to the channel.
    pub notified: usize,
}

/// Run one pass: fetch → advance → notify for each roster player, then
/// persist tracking state once.
///
/// If the output channel can't be resolved the pass is abandoned before any
/// record changes. The roster is snapshotted at pass start.
pub async fn run_poll_pass<S, C, R, F>(
    ctx: &mut AppContext,
    stats: &S,
    chat: &C,
    rng: &mut R,
    mut clock: F,
) -> Result<PassReport, PollError>
where
    S: StatsSource,
    C: ChatSink,
    R: Rng + ?Sized,
    F: FnMut() -> i64,
{
    let channel_id = ctx.config.channel_id;
    let channel = chat.open_channel(channel_id).await.inspect_err(|e| {
        error!(channel_id, error = %e, "Output channel unavailable, skipping poll pass");
    })?;

    let roster = ctx.config.players.clone();
    let threshold = ctx.config.inactivity_threshold_secs();
    let policy = ctx.config.policy;
    let mut report = PassReport::default();

    debug!(players = roster.len(), "Starting poll pass");

    for player in &roster {
        let snapshot = match stats.fetch(player).await {
            Ok(snapshot) => snapshot,
            Err(_) => {
                // Already logged by the fetcher.
                report.failed.push(player.clone());
                continue;
            }
        };
        report.checked += 1;

        let record = ctx.store.get(player).copied().unwrap_or_default();
        let transition = advance(player, &record, snapshot, clock(), threshold, policy);

        match transition.step {
            Step::Seeded => info!(player = %player, "Seeded baseline"),
            Step::Unchanged => debug!(player = %player, playing = record.playing, "No change"),
            Step::Active | Step::Stopped => debug!(player = %player, step = ?transition.step, "State changed"),
        }

        if transition.record != record {
            ctx.store.insert(player, transition.record);
        }

        let Some(event) = transition.event else {
            continue;
        };

        let message = select_message(&event, &ctx.config.messages, rng);
        match chat.post(&channel, &message).await {
            Ok(()) => {
                report.notified += 1;
                info!(player = %player, kind = event.kind.as_str(), kills = event.kill_delta, "Notification sent");
            }
            Err(e) => warn!(player = %player, error = %e, "Failed to send notification"),
        }
    }

    ctx.save_state()?;

    info!(
        checked = report.checked,
        failed = report.failed.len(),
        notified = report.notified,
        "Poll pass complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bftracker_types::{MessageTemplates, TrackerConfig};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::error::{ChatError, FetchError};
    use crate::testing::{FakeChat, FakeStats};
    use crate::tracking::{Checkpoint, TrackingRecord, TrackingStore};

    const T0: i64 = 1_700_000_000;

    fn templates() -> MessageTemplates {
        MessageTemplates {
            played_again: vec!["{player} is back".to_string()],
            still_playing: vec!["{player} still".to_string()],
            rampage: vec!["{player} +{kills}".to_string()],
            stopped: vec!["{player} stopped".to_string()],
        }
    }

    fn context(dir: &tempfile::TempDir, players: &[&str]) -> AppContext {
        let config = TrackerConfig {
            token: "t".to_string(),
            channel_id: 7,
            inactivity_threshold_minutes: 10,
            players: players.iter().map(|p| p.to_string()).collect(),
            messages: templates(),
            ..Default::default()
        };
        let mut ctx = AppContext::new(
            config,
            dir.path().join("bftracker.toml"),
            TrackingStore::empty(dir.path().join("state.json")),
        );
        ctx.seed_records();
        ctx
    }

    fn idle(seconds_played: u64, kills: u64) -> TrackingRecord {
        TrackingRecord {
            checkpoint: Some(Checkpoint {
                seconds_played,
                kills,
            }),
            last_check: T0,
            playing: false,
            session_start: None,
        }
    }

    #[tokio::test]
    async fn test_first_pass_seeds_silently() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &["Alpha", "Bravo"]);
        let stats = FakeStats::new()
            .with_snapshot("Alpha", 100, 5)
            .with_snapshot("Bravo", 200, 9);
        let chat = FakeChat::new();

        let report = run_poll_pass(&mut ctx, &stats, &chat, &mut StdRng::seed_from_u64(0), || T0)
            .await
            .unwrap();

        assert_eq!(report.checked, 2);
        assert_eq!(report.notified, 0);
        assert!(chat.posts().is_empty());
        assert_eq!(ctx.store.get("Alpha"), Some(&idle(100, 5)));

        let saved = TrackingStore::load(dir.path().join("state.json")).unwrap();
        assert_eq!(saved.get("Bravo"), ctx.store.get("Bravo"));
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_affect_others() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &["Alpha", "Broken", "Charlie"]);
        for player in ["Alpha", "Broken", "Charlie"] {
            ctx.store.insert(player, idle(100, 5));
        }
        let stats = FakeStats::new()
            .with_snapshot("Alpha", 160, 5)
            .with_error("Broken", FetchError::Timeout)
            .with_snapshot("Charlie", 160, 8);
        let chat = FakeChat::new();

        let report = run_poll_pass(&mut ctx, &stats, &chat, &mut StdRng::seed_from_u64(0), || T0 + 60)
            .await
            .unwrap();

        assert_eq!(report.checked, 2);
        assert_eq!(report.failed, vec!["Broken"]);
        assert_eq!(chat.posts(), vec!["Alpha is back", "Charlie +3"]);
        assert_eq!(ctx.store.get("Broken"), Some(&idle(100, 5)));
        assert!(ctx.store.get("Alpha").unwrap().playing);
        assert!(ctx.store.get("Charlie").unwrap().playing);

        // State is persisted even though one player failed.
        let saved = TrackingStore::load(dir.path().join("state.json")).unwrap();
        assert!(saved.get("Charlie").unwrap().playing);
    }

    #[tokio::test]
    async fn test_unavailable_channel_skips_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &["Alpha"]);
        ctx.store.insert("Alpha", idle(100, 5));
        let stats = FakeStats::new().with_snapshot("Alpha", 200, 9);

        let result = run_poll_pass(
            &mut ctx,
            &stats,
            &FakeChat::unavailable(),
            &mut StdRng::seed_from_u64(0),
            || T0 + 60,
        )
        .await;

        assert!(matches!(
            result,
            Err(PollError::Chat(ChatError::ChannelUnavailable { channel_id: 7, .. }))
        ));
        assert!(stats.calls().is_empty());
        assert_eq!(ctx.store.get("Alpha"), Some(&idle(100, 5)));
        assert!(!dir.path().join("state.json").exists());
    }

    #[tokio::test]
    async fn test_notifications_follow_roster_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &["Zulu", "Alpha", "Mike"]);
        for player in ["Zulu", "Alpha", "Mike"] {
            ctx.store.insert(player, idle(0, 0));
        }
        let stats = FakeStats::new()
            .with_snapshot("Zulu", 60, 1)
            .with_snapshot("Alpha", 60, 2)
            .with_snapshot("Mike", 60, 3);
        let chat = FakeChat::new();

        run_poll_pass(&mut ctx, &stats, &chat, &mut StdRng::seed_from_u64(0), || T0 + 60)
            .await
            .unwrap();

        assert_eq!(stats.calls(), vec!["Zulu", "Alpha", "Mike"]);
        assert_eq!(chat.posts(), vec!["Zulu +1", "Alpha +2", "Mike +3"]);
    }

    #[tokio::test]
    async fn test_send_failure_still_updates_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &["Alpha"]);
        ctx.store.insert("Alpha", idle(100, 5));
        let stats = FakeStats::new().with_snapshot("Alpha", 200, 5);

        let report = run_poll_pass(
            &mut ctx,
            &stats,
            &FakeChat::failing_sends(),
            &mut StdRng::seed_from_u64(0),
            || T0 + 60,
        )
        .await
        .unwrap();

        assert_eq!(report.notified, 0);
        assert!(ctx.store.get("Alpha").unwrap().playing);
    }

    #[tokio::test]
    async fn test_session_across_passes() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, &["Alpha"]);
        let stats = FakeStats::new().with_snapshot("Alpha", 1_000, 10);
        let chat = FakeChat::new();
        let mut rng = StdRng::seed_from_u64(3);

        let polls = [
            (T0, None),
            (T0 + 300, Some((1_300, 10))),
            (T0 + 600, Some((1_600, 14))),
            (T0 + 900, None),
            (T0 + 1_200, None),
        ];
        for (now, counters) in polls {
            if let Some((seconds_played, kills)) = counters {
                stats.set_snapshot("Alpha", seconds_played, kills);
            }
            run_poll_pass(&mut ctx, &stats, &chat, &mut rng, || now)
                .await
                .unwrap();
        }

        assert_eq!(
            chat.posts(),
            vec!["Alpha is back", "Alpha +4", "Alpha stopped"]
        );
        assert!(!ctx.store.get("Alpha").unwrap().playing);
    }
}
