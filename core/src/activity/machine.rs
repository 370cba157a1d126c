//! Activity state machine for a single player.
//!
//! A player moves through three states, encoded in [`TrackingRecord`]:
//! - Unobserved: no checkpoint yet
//! - Idle: checkpoint set, `playing == false`
//! - Active: checkpoint set, `playing == true`
//!
//! Each poll feeds a fresh [`Snapshot`] through [`advance`], which returns the
//! updated record and at most one [`NotificationEvent`].

use bftracker_types::ActivityPolicy;

use crate::stats::Snapshot;
use crate::tracking::{Checkpoint, TrackingRecord};

use super::event::{EventKind, NotificationEvent};

/// Which rule fired for a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// First observation seeded the checkpoint.
    Seeded,
    /// Play time moved since the checkpoint.
    Active,
    /// The player went quiet for at least the inactivity threshold.
    Stopped,
    /// Nothing to record.
    Unchanged,
}

/// Result of advancing the state machine by one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub record: TrackingRecord,
    pub event: Option<NotificationEvent>,
    pub step: Step,
}

impl Transition {
    fn unchanged(record: &TrackingRecord) -> Self {
        Self {
            record: *record,
            event: None,
            step: Step::Unchanged,
        }
    }
}

/// Minutes between two play-time counters, rounded to the nearest minute.
pub fn session_minutes(from_seconds: u64, to_seconds: u64) -> u64 {
    (to_seconds.saturating_sub(from_seconds) as f64 / 60.0).round() as u64
}

/// Advance `player`'s record with a fresh snapshot taken at `now`.
///
/// Rules are checked in order: seed an unobserved record, react to changed
/// play time, end a session after `threshold_secs` of silence, otherwise do
/// nothing.
pub fn advance(
    player: &str,
    record: &TrackingRecord,
    snapshot: Snapshot,
    now: i64,
    threshold_secs: i64,
    policy: ActivityPolicy,
) -> Transition {
    let Some(checkpoint) = record.checkpoint else {
        return seed(snapshot, now);
    };

    if snapshot.seconds_played != checkpoint.seconds_played {
        return resume_or_continue(player, record, checkpoint, snapshot, now, policy);
    }

    if record.playing && now.saturating_sub(record.last_check) >= threshold_secs {
        return stop(player, record, checkpoint, snapshot);
    }

    Transition::unchanged(record)
}

fn seed(snapshot: Snapshot, now: i64) -> Transition {
    Transition {
        record: TrackingRecord {
            checkpoint: Some(snapshot.into()),
            last_check: now,
            playing: false,
            session_start: None,
        },
        event: None,
        step: Step::Seeded,
    }
}

/// Play time moved: re-baseline the checkpoint and report kills.
///
/// `PerPoll` reports kills since the previous poll. `PerSession` reports
/// kills since the session began and announces the idle → active edge
/// without a kill count.
fn resume_or_continue(
    player: &str,
    record: &TrackingRecord,
    checkpoint: Checkpoint,
    snapshot: Snapshot,
    now: i64,
    policy: ActivityPolicy,
) -> Transition {
    let resumed = !record.playing;
    let session_start = if resumed {
        checkpoint
    } else {
        record.session_start.unwrap_or(checkpoint)
    };

    let (kind, kill_delta) = match policy {
        ActivityPolicy::PerPoll => {
            let kill_delta = snapshot.kills.saturating_sub(checkpoint.kills);
            (EventKind::from_kill_delta(kill_delta), kill_delta)
        }
        ActivityPolicy::PerSession => {
            let kill_delta = snapshot.kills.saturating_sub(session_start.kills);
            let kind = if resumed {
                EventKind::Activity
            } else {
                EventKind::from_kill_delta(kill_delta)
            };
            (kind, kill_delta)
        }
    };

    Transition {
        record: TrackingRecord {
            checkpoint: Some(snapshot.into()),
            last_check: now,
            playing: true,
            session_start: Some(session_start),
        },
        event: Some(NotificationEvent {
            player: player.to_string(),
            kind,
            resumed,
            kill_delta,
            session_minutes: None,
        }),
        step: Step::Active,
    }
}

/// Close the session. Totals are measured from the session start when one
/// was captured, otherwise from the checkpoint.
fn stop(
    player: &str,
    record: &TrackingRecord,
    checkpoint: Checkpoint,
    snapshot: Snapshot,
) -> Transition {
    let baseline = record.session_start.unwrap_or(checkpoint);
    let kill_delta = snapshot.kills.saturating_sub(baseline.kills);
    let minutes = session_minutes(baseline.seconds_played, snapshot.seconds_played);

    Transition {
        record: TrackingRecord {
            checkpoint: Some(snapshot.into()),
            last_check: record.last_check,
            playing: false,
            session_start: None,
        },
        event: Some(NotificationEvent {
            player: player.to_string(),
            kind: EventKind::Inactive,
            resumed: false,
            kill_delta,
            session_minutes: Some(minutes),
        }),
        step: Step::Stopped,
    }
}
