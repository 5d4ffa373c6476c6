//! Milestone notice rendering — the text that actually reaches the channel.

use chrono::{DateTime, FixedOffset};

use flagwatch_core::types::{Notice, colors};

use crate::event::Event;
use crate::milestone::Milestone;

/// Display-offset formatting for notice bodies.
pub fn format_stamp(ts: &DateTime<FixedOffset>, display_offset: FixedOffset) -> String {
    ts.with_timezone(&display_offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Shorter form used by the agenda listing.
pub fn format_stamp_short(ts: &DateTime<FixedOffset>, display_offset: FixedOffset) -> String {
    ts.with_timezone(&display_offset)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Build the notice for a due milestone.
pub fn milestone_notice(event: &Event, milestone: Milestone, display_offset: FixedOffset) -> Notice {
    let start = format_stamp(&event.start, display_offset);
    let finish = format_stamp(&event.finish, display_offset);
    match milestone {
        Milestone::Reminder => Notice::new(
            format!("🚨 `{}` starts in 1 hour!", event.name),
            format!("Don't forget to prepare for the CTF at {start}!"),
            colors::RED,
        ),
        Milestone::Ongoing => Notice::new(
            format!("🍀 Good luck for `{}` everyone!", event.name),
            format!("The CTF is currently ongoing until {finish}."),
            colors::GREEN,
        ),
        Milestone::EndingSoon => Notice::new(
            format!("⏰ `{}` ends in 1 hour!", event.name),
            format!("Hurry up and submit your flags before the CTF ends at {finish}!"),
            colors::ORANGE,
        ),
        Milestone::Concluded => Notice::new(
            format!("🎉 Congratulations for `{}` everyone!", event.name),
            format!("The CTF ended at {finish}."),
            colors::CYAN,
        ),
    }
}
