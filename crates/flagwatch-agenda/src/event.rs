//! Event definitions — the core data model for tracked competitions.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use flagwatch_catalog::RawEvent;
use flagwatch_core::error::{FlagwatchError, Result};

use crate::milestone::Milestone;

/// One tracked competition. Everything except `notified` is immutable after
/// creation; the flags are flipped only by the scheduler, only false→true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique key, derived from the catalog title.
    pub name: String,
    /// Catalog page for the event.
    pub catalog_url: String,
    /// The competition's own site.
    pub event_url: String,
    pub start: DateTime<FixedOffset>,
    pub finish: DateTime<FixedOffset>,
    pub format: String,
    /// Organizer names, comma-joined for display.
    pub organizers: String,
    pub weight: f64,
    pub description: String,
    pub participants: u32,
    #[serde(default)]
    pub notified: MilestoneFlags,
}

/// Which lifecycle notices have already gone out. Monotonic: a sent flag is
/// never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneFlags {
    #[serde(default)]
    pub reminder_sent: bool,
    #[serde(default)]
    pub ongoing_sent: bool,
    #[serde(default)]
    pub ending_soon_sent: bool,
    #[serde(default)]
    pub concluded_sent: bool,
}

impl MilestoneFlags {
    pub fn is_sent(&self, milestone: Milestone) -> bool {
        match milestone {
            Milestone::Reminder => self.reminder_sent,
            Milestone::Ongoing => self.ongoing_sent,
            Milestone::EndingSoon => self.ending_soon_sent,
            Milestone::Concluded => self.concluded_sent,
        }
    }

    /// Set a flag. Returns false if it was already set.
    pub fn mark(&mut self, milestone: Milestone) -> bool {
        let slot = match milestone {
            Milestone::Reminder => &mut self.reminder_sent,
            Milestone::Ongoing => &mut self.ongoing_sent,
            Milestone::EndingSoon => &mut self.ending_soon_sent,
            Milestone::Concluded => &mut self.concluded_sent,
        };
        if *slot {
            false
        } else {
            *slot = true;
            true
        }
    }
}

/// Derive the unique event name from a catalog title: trim, drop quote
/// characters, and join the remaining words with underscores.
pub fn sanitize_name(title: &str) -> String {
    title
        .replace(['"', '\''], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

impl Event {
    /// Validate raw catalog metadata into a trackable event. Rejects events
    /// that already finished; malformed or inverted timestamps are a catalog
    /// problem, not ours.
    pub fn from_catalog(raw: &RawEvent, now: DateTime<Utc>) -> Result<Self> {
        let start = raw.start_time()?;
        let finish = raw.finish_time()?;
        if start >= finish {
            return Err(FlagwatchError::CatalogMalformed(format!(
                "start {start} is not before finish {finish}"
            )));
        }
        if finish.with_timezone(&Utc) < now {
            return Err(FlagwatchError::AlreadyFinished);
        }
        let name = sanitize_name(&raw.title);
        if name.is_empty() {
            return Err(FlagwatchError::CatalogMalformed("empty event title".into()));
        }
        Ok(Self {
            name,
            catalog_url: raw.ctftime_url.clone(),
            event_url: raw.url.clone(),
            start,
            finish,
            format: raw.format.clone(),
            organizers: raw.organizer_names(),
            weight: raw.weight,
            description: raw.description.clone(),
            participants: raw.participants,
            notified: MilestoneFlags::default(),
        })
    }
}
