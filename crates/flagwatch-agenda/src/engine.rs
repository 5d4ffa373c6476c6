//! Scheduler engine — the scan loop that turns time into notifications.
//! One pass per tick over every tracked event; a notice only counts once
//! its flag is marked, so failures retry instead of duplicating.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::Mutex;

use flagwatch_core::traits::NotificationSink;

use crate::milestone::due_milestone;
use crate::render::milestone_notice;
use crate::store::EventStore;

/// The milestone scheduler. Shares the store with the command handlers;
/// every store touch happens under the one lock, but never across a network
/// call, so a slow sink cannot wedge the command path.
pub struct Scheduler {
    store: Arc<Mutex<EventStore>>,
    sink: Arc<dyn NotificationSink>,
    /// The single audience target every notice goes to.
    target: String,
    display_offset: FixedOffset,
}

impl Scheduler {
    pub fn new(
        store: Arc<Mutex<EventStore>>,
        sink: Arc<dyn NotificationSink>,
        target: impl Into<String>,
        display_offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            sink,
            target: target.into(),
            display_offset,
        }
    }

    /// One scan over the agenda at the current instant.
    pub async fn tick(&self) -> usize {
        self.tick_at(Utc::now()).await
    }

    /// One scan at an explicit instant (tests drive this directly).
    /// Returns the number of notices delivered.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> usize {
        let names = { self.store.lock().await.names() };
        let mut fired = 0usize;
        let mut concluded: Vec<String> = Vec::new();

        for name in names {
            // Re-read per name: the event may have been removed or mutated
            // since the snapshot.
            let snapshot = { self.store.lock().await.get(&name).cloned() };
            let Some(event) = snapshot else {
                continue;
            };
            let Some(milestone) = due_milestone(&event, now) else {
                continue;
            };

            let notice = milestone_notice(&event, milestone, self.display_offset);
            if let Err(e) = self.sink.notify(&self.target, &notice).await {
                // Flag stays unset — this milestone is retried next tick.
                tracing::warn!(
                    "⚠️ Notify failed for `{name}` ({}): {e}",
                    milestone.label()
                );
                continue;
            }
            fired += 1;
            tracing::info!("🔔 `{name}` → {}", milestone.label());

            match self.store.lock().await.mark_notified(&name, milestone) {
                Ok(_) => {}
                Err(e) => {
                    // Not durable: after a crash this notice would go out
                    // again. Nothing else to do but say so.
                    tracing::warn!("⚠️ Failed to persist `{name}` {} flag: {e}", milestone.label());
                }
            }
            if milestone.is_terminal() {
                concluded.push(name);
            }
        }

        if !concluded.is_empty() {
            let mut store = self.store.lock().await;
            match store.remove_many(&concluded) {
                Ok(()) => tracing::info!("🗑️ Removed {} concluded event(s)", concluded.len()),
                Err(e) => tracing::warn!("⚠️ Failed to prune concluded events: {e}"),
            }
        }

        fired
    }

    /// Run the scan loop forever. Ticks are awaited back-to-back on a fixed
    /// interval — a long scan delays the next one instead of overlapping it.
    /// No error escapes; process shutdown is the only way out.
    pub async fn run(self, tick_interval_secs: u64) {
        tracing::info!("⏰ Agenda scan loop started (every {tick_interval_secs}s)");
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(tick_interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let fired = self.tick().await;
            if fired > 0 {
                tracing::debug!("📣 Scan dispatched {fired} notice(s)");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, MilestoneFlags};
    use crate::milestone::Milestone;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use flagwatch_core::error::{FlagwatchError, Result};
    use flagwatch_core::types::Notice;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Sink that records every delivered notice title.
    #[derive(Default)]
    struct RecordingSink {
        sent: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify(&self, _target: &str, notice: &Notice) -> Result<()> {
            self.sent.lock().unwrap().push(notice.title.clone());
            Ok(())
        }
    }

    /// Sink that fails the first `failures` calls, then records.
    struct FlakySink {
        failures: AtomicUsize,
        sent: std::sync::Mutex<Vec<String>>,
    }

    impl FlakySink {
        fn new(failures: usize) -> Self {
            Self {
                failures: AtomicUsize::new(failures),
                sent: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl NotificationSink for FlakySink {
        async fn notify(&self, _target: &str, notice: &Notice) -> Result<()> {
            let still_failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    if n > 0 { Some(n - 1) } else { None }
                })
                .is_ok();
            if still_failing {
                return Err(FlagwatchError::Notify("sink down".into()));
            }
            self.sent.lock().unwrap().push(notice.title.clone());
            Ok(())
        }
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 11, h, m, 0).unwrap()
    }

    /// Event running 10:00–14:00 UTC.
    fn event(name: &str) -> Event {
        let start = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 9, 11, 10, 0, 0)
            .unwrap();
        Event {
            name: name.into(),
            catalog_url: String::new(),
            event_url: String::new(),
            start,
            finish: start + Duration::hours(4),
            format: String::new(),
            organizers: String::new(),
            weight: 0.0,
            description: String::new(),
            participants: 0,
            notified: MilestoneFlags::default(),
        }
    }

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn shared_store(dir: &TempDir) -> Arc<Mutex<EventStore>> {
        Arc::new(Mutex::new(EventStore::open(dir.path())))
    }

    #[tokio::test]
    async fn fires_each_milestone_once() {
        let dir = TempDir::new().unwrap();
        let store = shared_store(&dir);
        store.lock().await.add(event("A")).unwrap();
        let sink = Arc::new(RecordingSink::default());
        let scheduler = Scheduler::new(store.clone(), sink.clone(), "chan", offset());

        assert_eq!(scheduler.tick_at(utc(9, 30)).await, 1);
        // Same instant again: flag is set, nothing fires.
        assert_eq!(scheduler.tick_at(utc(9, 30)).await, 0);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
        assert!(store.lock().await.get("A").unwrap().notified.reminder_sent);
    }

    #[tokio::test]
    async fn concluded_event_is_gone_after_the_scan() {
        let dir = TempDir::new().unwrap();
        let store = shared_store(&dir);
        store.lock().await.add(event("A")).unwrap();
        let sink = Arc::new(RecordingSink::default());
        let scheduler = Scheduler::new(store.clone(), sink.clone(), "chan", offset());

        assert_eq!(scheduler.tick_at(utc(15, 0)).await, 1);
        assert!(store.lock().await.is_empty());
        // Durably gone, not just in memory.
        let reloaded = EventStore::open(dir.path());
        assert!(reloaded.is_empty());
        // Nothing left to fire.
        assert_eq!(scheduler.tick_at(utc(16, 0)).await, 0);
    }

    #[tokio::test]
    async fn failed_dispatch_leaves_flag_unset_and_retries() {
        let dir = TempDir::new().unwrap();
        let store = shared_store(&dir);
        store.lock().await.add(event("A")).unwrap();
        let sink = Arc::new(FlakySink::new(1));
        let scheduler = Scheduler::new(store.clone(), sink.clone(), "chan", offset());

        // First tick: sink down, nothing delivered, flag untouched.
        assert_eq!(scheduler.tick_at(utc(9, 30)).await, 0);
        assert!(!store.lock().await.get("A").unwrap().notified.reminder_sent);

        // Next tick: sink recovered, the same milestone goes out.
        assert_eq!(scheduler.tick_at(utc(9, 31)).await, 1);
        assert!(store.lock().await.get("A").unwrap().notified.reminder_sent);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_scan() {
        let dir = TempDir::new().unwrap();
        let store = shared_store(&dir);
        store.lock().await.add(event("A")).unwrap();
        store.lock().await.add(event("B")).unwrap();
        // Fails exactly once: event A's dispatch dies, B's succeeds.
        let sink = Arc::new(FlakySink::new(1));
        let scheduler = Scheduler::new(store.clone(), sink.clone(), "chan", offset());

        assert_eq!(scheduler.tick_at(utc(9, 30)).await, 1);
        let store = store.lock().await;
        assert!(!store.get("A").unwrap().notified.reminder_sent);
        assert!(store.get("B").unwrap().notified.reminder_sent);
    }

    #[tokio::test]
    async fn at_most_one_milestone_per_event_per_tick() {
        let dir = TempDir::new().unwrap();
        let store = shared_store(&dir);
        store.lock().await.add(event("A")).unwrap();
        let sink = Arc::new(RecordingSink::default());
        let scheduler = Scheduler::new(store.clone(), sink.clone(), "chan", offset());

        // Inside the last hour with nothing sent: only ongoing fires.
        assert_eq!(scheduler.tick_at(utc(13, 30)).await, 1);
        let flags = store.lock().await.get("A").unwrap().notified;
        assert!(flags.ongoing_sent);
        assert!(!flags.ending_soon_sent);

        // The next tick picks up ending-soon.
        assert_eq!(scheduler.tick_at(utc(13, 31)).await, 1);
        let flags = store.lock().await.get("A").unwrap().notified;
        assert!(flags.ending_soon_sent);
    }

    #[tokio::test]
    async fn flags_survive_restart_without_refiring() {
        let dir = TempDir::new().unwrap();
        {
            let store = shared_store(&dir);
            store.lock().await.add(event("A")).unwrap();
            let sink = Arc::new(RecordingSink::default());
            let scheduler = Scheduler::new(store, sink, "chan", offset());
            assert_eq!(scheduler.tick_at(utc(9, 30)).await, 1);
        }
        // "Restart": fresh store from the same directory.
        let store = shared_store(&dir);
        let sink = Arc::new(RecordingSink::default());
        let scheduler = Scheduler::new(store, sink.clone(), "chan", offset());
        assert_eq!(scheduler.tick_at(utc(9, 45)).await, 0);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn marking_after_eval_silences_reeval() {
        // Evaluator + store interplay without the async machinery.
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::open(dir.path());
        store.add(event("A")).unwrap();
        let now = utc(9, 30);
        let due = due_milestone(store.get("A").unwrap(), now).unwrap();
        assert_eq!(due, Milestone::Reminder);
        store.mark_notified("A", due).unwrap();
        assert_eq!(due_milestone(store.get("A").unwrap(), now), None);
    }
}
