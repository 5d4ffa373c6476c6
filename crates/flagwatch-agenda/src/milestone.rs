//! Milestone evaluation — which lifecycle notice, if any, is due right now.

use chrono::{DateTime, Duration, Utc};

use crate::event::Event;

/// The four lifecycle trigger points of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    /// One hour before start.
    Reminder,
    /// Start has passed, finish has not.
    Ongoing,
    /// One hour before finish.
    EndingSoon,
    /// Finish has passed. Terminal: the event is removed after this fires.
    Concluded,
}

impl Milestone {
    pub fn label(&self) -> &'static str {
        match self {
            Milestone::Reminder => "reminder",
            Milestone::Ongoing => "ongoing",
            Milestone::EndingSoon => "ending-soon",
            Milestone::Concluded => "concluded",
        }
    }

    /// Concluded is the end of the line — the event record is deleted once
    /// its notice went out.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Milestone::Concluded)
    }
}

/// Determine the single milestone newly due for `event` at `now`.
///
/// First match wins, so at most one notice fires per event per tick, and
/// `concluded` is checked before `ending-soon`: once the finish line has
/// passed, ties always resolve toward the terminal state. The concluded
/// branch has no upper bound — an event whose finish slipped by while the
/// process was down still concludes (and gets cleaned up) on the next scan.
/// Windows that were skipped entirely stay silent; already-sent flags keep
/// every branch from firing twice.
pub fn due_milestone(event: &Event, now: DateTime<Utc>) -> Option<Milestone> {
    let start = event.start.with_timezone(&Utc);
    let finish = event.finish.with_timezone(&Utc);
    let hour = Duration::hours(1);
    let flags = &event.notified;

    if !flags.reminder_sent && start - hour <= now && now < start {
        Some(Milestone::Reminder)
    } else if !flags.ongoing_sent && start <= now && now < finish {
        Some(Milestone::Ongoing)
    } else if !flags.concluded_sent && finish <= now {
        Some(Milestone::Concluded)
    } else if !flags.ending_soon_sent && finish - hour <= now && now < finish {
        Some(Milestone::EndingSoon)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MilestoneFlags;
    use chrono::TimeZone;

    /// Event running 10:00–14:00 UTC.
    fn event() -> Event {
        let start = chrono::FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 9, 11, 10, 0, 0)
            .unwrap();
        Event {
            name: "Test_CTF".into(),
            catalog_url: String::new(),
            event_url: String::new(),
            start,
            finish: start + Duration::hours(4),
            format: "Jeopardy".into(),
            organizers: "Team".into(),
            weight: 0.0,
            description: String::new(),
            participants: 0,
            notified: MilestoneFlags::default(),
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 11, h, m, 0).unwrap()
    }

    #[test]
    fn nothing_due_before_reminder_window() {
        assert_eq!(due_milestone(&event(), at(8, 59)), None);
    }

    #[test]
    fn reminder_fires_inside_the_hour_before_start() {
        assert_eq!(due_milestone(&event(), at(9, 0)), Some(Milestone::Reminder));
        assert_eq!(due_milestone(&event(), at(9, 59)), Some(Milestone::Reminder));
    }

    #[test]
    fn ongoing_fires_from_start_to_finish() {
        assert_eq!(due_milestone(&event(), at(10, 0)), Some(Milestone::Ongoing));
        let mut e = event();
        e.notified.ongoing_sent = true;
        assert_eq!(due_milestone(&e, at(10, 0)), None);
    }

    #[test]
    fn ending_soon_fires_in_the_last_hour_once_ongoing_sent() {
        let mut e = event();
        e.notified.ongoing_sent = true;
        assert_eq!(due_milestone(&e, at(13, 0)), Some(Milestone::EndingSoon));
        assert_eq!(due_milestone(&e, at(13, 59)), Some(Milestone::EndingSoon));
    }

    #[test]
    fn ongoing_outranks_ending_soon_when_both_windows_open() {
        // Nothing sent yet, now inside the last hour: ongoing wins.
        assert_eq!(due_milestone(&event(), at(13, 30)), Some(Milestone::Ongoing));
    }

    #[test]
    fn concluded_outranks_ending_soon_after_finish() {
        let e = event();
        assert_eq!(due_milestone(&e, at(14, 0)), Some(Milestone::Concluded));
        // Long after finish — still concludes, never "ending soon".
        assert_eq!(
            due_milestone(&e, at(23, 0)),
            Some(Milestone::Concluded)
        );
    }

    #[test]
    fn sent_flags_silence_their_windows() {
        let mut e = event();
        e.notified.reminder_sent = true;
        assert_eq!(due_milestone(&e, at(9, 30)), None);
        e.notified.concluded_sent = true;
        assert_eq!(due_milestone(&e, at(15, 0)), None);
    }

    #[test]
    fn evaluation_is_pure_without_flag_updates() {
        let e = event();
        let first = due_milestone(&e, at(9, 30));
        let second = due_milestone(&e, at(9, 30));
        assert_eq!(first, second);
        assert_eq!(first, Some(Milestone::Reminder));
    }

    #[test]
    fn full_lifecycle_timeline() {
        // start = now+30min, finish = now+2h
        let now = at(12, 0);
        let mut e = event();
        e.start = e.start.with_timezone(&chrono::FixedOffset::east_opt(0).unwrap())
            + Duration::hours(2)
            + Duration::minutes(30); // 12:30
        e.finish = e.start + Duration::hours(1) + Duration::minutes(30); // 14:00

        // Tick at now: reminder window opened at 11:30.
        assert_eq!(due_milestone(&e, now), Some(Milestone::Reminder));
        e.notified.mark(Milestone::Reminder);

        // 1h31min later: ongoing.
        let later = now + Duration::minutes(91);
        assert_eq!(due_milestone(&e, later), Some(Milestone::Ongoing));
        e.notified.mark(Milestone::Ongoing);

        // After finish: concluded.
        let after = now + Duration::hours(3);
        assert_eq!(due_milestone(&e, after), Some(Milestone::Concluded));
    }
}
