/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Play time moved but no new kills: low-signal activity.
    Activity,
    /// Play time moved with new kills.
    Rampage,
    /// The session ended after the inactivity threshold.
    Inactive,
}

impl EventKind {
    pub fn from_kill_delta(kill_delta: u64) -> Self {
        if kill_delta == 0 {
            Self::Activity
        } else {
            Self::Rampage
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Rampage => "rampage",
            Self::Inactive => "inactive",
        }
    }
}

/// A notification produced by one poll of one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub player: String,
    pub kind: EventKind,
    /// True when this poll moved the player from idle to active.
    pub resumed: bool,
    /// Kills gained, clamped at zero.
    pub kill_delta: u64,
    /// Session length, only set when a session ends.
    pub session_minutes: Option<u64>,
}
