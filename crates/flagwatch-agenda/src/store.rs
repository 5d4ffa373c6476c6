//! Durable event store — the single owner of the tracked-event mapping.
//! Events saved as one JSON file, rewritten after every mutation so a
//! restart resumes with the exact flag state it crashed with.

use std::path::{Path, PathBuf};

use flagwatch_core::error::{FlagwatchError, Result};

use crate::event::Event;
use crate::milestone::Milestone;

/// File-backed event store. Insertion order is preserved (it drives the
/// agenda listing); names are unique. Callers share it behind one lock —
/// there is no interior locking here.
pub struct EventStore {
    path: PathBuf,
    events: Vec<Event>,
}

impl EventStore {
    /// Open the store in the given directory, loading `events.json` if it
    /// exists. An absent or unreadable file is not an error — the agenda
    /// just starts empty.
    pub fn open(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        let path = dir.join("events.json");
        let events = Self::load(&path);
        if !events.is_empty() {
            tracing::info!("📂 Loaded {} tracked event(s) from {}", events.len(), path.display());
        }
        Self { path, events }
    }

    /// Default store directory (~/.flagwatch).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".flagwatch")
    }

    /// Track a new event. All notified-flags start false.
    pub fn add(&mut self, event: Event) -> Result<String> {
        if self.events.iter().any(|e| e.name == event.name) {
            return Err(FlagwatchError::DuplicateName(event.name));
        }
        let name = event.name.clone();
        self.events.push(event);
        if let Err(e) = self.save() {
            self.events.pop();
            return Err(e);
        }
        tracing::info!("📅 Event added: `{name}`");
        Ok(name)
    }

    /// Stop tracking one event.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let Some(idx) = self.events.iter().position(|e| e.name == name) else {
            return Err(FlagwatchError::NotFound(name.to_string()));
        };
        let removed = self.events.remove(idx);
        if let Err(e) = self.save() {
            self.events.insert(idx, removed);
            return Err(e);
        }
        tracing::info!("🗑️ Event removed: `{name}`");
        Ok(())
    }

    /// Drop every tracked event.
    pub fn clear(&mut self) -> Result<()> {
        let backup = std::mem::take(&mut self.events);
        if let Err(e) = self.save() {
            self.events = backup;
            return Err(e);
        }
        tracing::info!("🗑️ All events cleared");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.name == name)
    }

    /// All events, insertion order.
    pub fn list(&self) -> &[Event] {
        &self.events
    }

    /// Snapshot of event names for a scan pass.
    pub fn names(&self) -> Vec<String> {
        self.events.iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Flip one notified-flag. No-op if the event vanished in the meantime
    /// or the flag is already set; persists only on an actual change. A
    /// failed save leaves the in-memory flag set (no duplicate notice this
    /// run) and surfaces the error for logging — after a crash the milestone
    /// simply fires again.
    pub fn mark_notified(&mut self, name: &str, milestone: Milestone) -> Result<bool> {
        let Some(event) = self.events.iter_mut().find(|e| e.name == name) else {
            return Ok(false);
        };
        if !event.notified.mark(milestone) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Batch-remove events whose terminal notice fired this scan, with a
    /// single persist.
    pub fn remove_many(&mut self, names: &[String]) -> Result<()> {
        let before = self.events.len();
        self.events.retain(|e| !names.contains(&e.name));
        if self.events.len() == before {
            return Ok(());
        }
        self.save()
    }

    fn load(path: &Path) -> Vec<Event> {
        if !path.exists() {
            return Vec::new();
        }
        match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Failed to parse {}: {e}", path.display());
                Vec::new()
            }),
            Err(e) => {
                tracing::warn!("⚠️ Failed to read {}: {e}", path.display());
                Vec::new()
            }
        }
    }

    /// Write the whole mapping. Temp-file-then-rename keeps the previous
    /// valid file intact if we die mid-write.
    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.events)
            .map_err(|e| FlagwatchError::Persistence(format!("serialize: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)
            .map_err(|e| FlagwatchError::Persistence(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| FlagwatchError::Persistence(format!("rename {}: {e}", self.path.display())))?;
        tracing::debug!("💾 Saved {} event(s) to {}", self.events.len(), self.path.display());
        Ok(())
    }
}
