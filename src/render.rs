//! Reply rendering — embeds for the command surface.

use chrono::FixedOffset;

use flagwatch_agenda::Event;
use flagwatch_agenda::render::format_stamp_short;
use flagwatch_catalog::RawEvent;
use flagwatch_core::types::{Notice, colors};

/// The `/agenda` listing.
pub fn agenda_notice(events: &[Event], offset: FixedOffset) -> Notice {
    let mut notice = Notice::new("📅 CTF events", "List of CTF events.", colors::BLURPLE);
    for event in events {
        notice = notice.field(
            format!("**{}**", event.name),
            format!(
                "Start: {}\nEnd: {}",
                format_stamp_short(&event.start, offset),
                format_stamp_short(&event.finish, offset)
            ),
            false,
        );
    }
    notice
}

/// The `/details` card for one event.
pub fn details_notice(event: &Event, offset: FixedOffset) -> Notice {
    Notice::new(
        format!("🛡️ {}", event.name),
        format!("{}.", event.description.trim_end_matches('.')),
        colors::BLURPLE,
    )
    .field("**Start**", format_stamp_short(&event.start, offset), true)
    .field("**End**", format_stamp_short(&event.finish, offset), true)
    .field("**Format**", event.format.clone(), true)
    .field("**Organizers**", event.organizers.clone(), true)
    .field("**Weight**", event.weight.to_string(), true)
    .field("**Participants**", event.participants.to_string(), true)
    .field("**CTFtime**", event.catalog_url.clone(), true)
    .field("**URL**", event.event_url.clone(), true)
}

/// The `/upcoming` preview straight off the catalog — nothing stored.
pub fn upcoming_notice(events: &[RawEvent], offset: FixedOffset) -> Notice {
    let mut notice = Notice::new(
        "📅 Upcoming CTF events",
        "List of upcoming CTF events.",
        colors::BLURPLE,
    );
    for event in events {
        let start = event
            .start_time()
            .map(|t| format_stamp_short(&t, offset))
            .unwrap_or_else(|_| event.start.clone());
        let finish = event
            .finish_time()
            .map(|t| format_stamp_short(&t, offset))
            .unwrap_or_else(|_| event.finish.clone());
        notice = notice.field(
            format!("**{}**", event.title.trim()),
            format!("Start: {start}\nEnd: {finish}"),
            false,
        );
    }
    notice
}

/// The `/clear` confirmation prompt.
pub fn clear_warning_notice() -> Notice {
    Notice::new(
        "⚠️ Warning",
        "Are you sure you want to clear all events?",
        colors::RED,
    )
}

/// The `/help` card.
pub fn help_notice() -> Notice {
    Notice::new(
        "📚 Available commands",
        "List of available commands for this bot.",
        colors::BLURPLE,
    )
    .field("``/add <event-url>``", "Add a CTF event", false)
    .field("``/agenda``", "List the added CTF events", false)
    .field("``/details <event-name>``", "Show details for a specific event", false)
    .field("``/remove <event-name>``", "Remove a specific event", false)
    .field("``/clear``", "Remove all events", false)
    .field("``/upcoming``", "Show upcoming CTF events", false)
    .field("``/help``", "Show this help message", false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use flagwatch_agenda::MilestoneFlags;

    fn event() -> Event {
        let start = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 9, 11, 16, 0, 0)
            .unwrap();
        Event {
            name: "Fake_CTF_2026".into(),
            catalog_url: "https://ctftime.org/event/9999/".into(),
            event_url: "https://fakectf.example.com/".into(),
            start,
            finish: start + Duration::hours(48),
            format: "Jeopardy".into(),
            organizers: "FakeTeam".into(),
            weight: 24.31,
            description: "A fake CTF.".into(),
            participants: 512,
            notified: MilestoneFlags::default(),
        }
    }

    #[test]
    fn agenda_lists_one_field_per_event_with_offset_times() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let notice = agenda_notice(&[event()], offset);
        assert_eq!(notice.fields.len(), 1);
        assert!(notice.fields[0].value.contains("Start: 2026-09-11 18:00"));
    }

    #[test]
    fn details_carries_all_metadata_fields() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let notice = details_notice(&event(), offset);
        let names: Vec<_> = notice.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "**Start**",
                "**End**",
                "**Format**",
                "**Organizers**",
                "**Weight**",
                "**Participants**",
                "**CTFtime**",
                "**URL**"
            ]
        );
    }

    #[test]
    fn help_mentions_every_command() {
        let notice = help_notice();
        for command in ["/add", "/agenda", "/details", "/remove", "/clear", "/upcoming", "/help"] {
            assert!(
                notice.fields.iter().any(|f| f.name.contains(command)),
                "missing {command}"
            );
        }
    }
}
