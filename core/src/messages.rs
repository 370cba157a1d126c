//! Notification text selection. Callers inject the RNG.

use bftracker_types::MessageTemplates;
use bftracker_types::formatting::format_thousands;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::activity::{EventKind, NotificationEvent};

/// Templates applicable to `event`.
fn templates_for<'a>(event: &NotificationEvent, templates: &'a MessageTemplates) -> &'a [String] {
    match (event.kind, event.resumed) {
        (EventKind::Activity, true) => &templates.played_again,
        (EventKind::Activity, false) => &templates.still_playing,
        (EventKind::Rampage, _) => &templates.rampage,
        (EventKind::Inactive, _) => &templates.stopped,
    }
}

fn fallback_template(event: &NotificationEvent) -> &'static str {
    match (event.kind, event.resumed) {
        (EventKind::Activity, true) => "🎮 **{player}** has played again!",
        (EventKind::Activity, false) => "🎮 **{player}** is still playing.",
        (EventKind::Rampage, _) => "🎮 **{player}** racked up {kills} kills!",
        (EventKind::Inactive, _) => "🎮 **{player}** stopped playing ({kills} kills in {minutes} minutes).",
    }
}

/// Fill `{player}`, `{kills}` and `{minutes}` placeholders.
pub fn render(template: &str, event: &NotificationEvent) -> String {
    let minutes = event
        .session_minutes
        .map(|m| m.to_string())
        .unwrap_or_else(|| "?".to_string());

    template
        .replace("{player}", &event.player)
        .replace("{kills}", &format_thousands(event.kill_delta))
        .replace("{minutes}", &minutes)
}

/// Pick a template for `event` and render it.
///
/// An empty template list for the event's kind falls back to a built-in line.
pub fn select_message<R: Rng + ?Sized>(
    event: &NotificationEvent,
    templates: &MessageTemplates,
    rng: &mut R,
) -> String {
    let template = templates_for(event, templates)
        .choose(rng)
        .map(String::as_str)
        .unwrap_or_else(|| fallback_template(event));

    render(template, event)
}
