pub mod events;
pub mod models;

pub use events::{spawn_interaction_listener, InteractionBus, InteractionReporter, MoodInteraction};
pub use models::{GrowthStage, MoodEntry};

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local, Utc};
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::storage::{read_json, write_json, KeyValueStore};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const GARDEN_STORAGE_KEY: &str = "moodGarden";
pub const MAX_PLANTS_PER_DAY: usize = 2;

/// Journal of planted moods, persisted as one JSON list.
pub struct MoodGarden {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<MoodEntry>,
}

impl MoodGarden {
    /// Missing or malformed data yields an empty garden.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let entries: Vec<MoodEntry> = read_json(store.as_ref(), GARDEN_STORAGE_KEY);
        Self { store, entries }
    }

    pub fn entries(&self) -> &[MoodEntry] {
        &self.entries
    }

    /// Entries planted on the same local calendar day as `now`.
    pub fn planted_on_day_of(&self, now: DateTime<Utc>) -> usize {
        let day = now.with_timezone(&Local).date_naive();
        self.entries
            .iter()
            .filter(|entry| entry.created_at.with_timezone(&Local).date_naive() == day)
            .count()
    }

    pub fn can_plant(&self, now: DateTime<Utc>) -> bool {
        self.planted_on_day_of(now) < MAX_PLANTS_PER_DAY
    }

    /// Plant a new mood. Rejected once today's allowance is used up.
    pub fn plant(&mut self, mood: &str, now: DateTime<Utc>) -> Result<MoodEntry> {
        let mood = mood.trim();
        if mood.is_empty() {
            bail!("mood label must not be empty");
        }
        if !self.can_plant(now) {
            bail!("Only {} moods can be planted per day", MAX_PLANTS_PER_DAY);
        }

        let entry = MoodEntry::new(mood.to_string(), now);
        let mut entries = self.entries.clone();
        entries.push(entry.clone());
        self.commit(entries)?;

        log_info!("Planted mood '{}' ({} in garden)", entry.mood, self.entries.len());
        Ok(entry)
    }

    /// Credit the most recently planted entry for `mood`. Returns false when
    /// the garden has no such mood.
    pub fn record_interaction(&mut self, mood: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut entries = self.entries.clone();
        let Some(entry) = entries
            .iter_mut()
            .filter(|entry| entry.mood.eq_ignore_ascii_case(mood.trim()))
            .max_by_key(|entry| entry.created_at)
        else {
            return Ok(false);
        };

        entry.interactions = entry.interactions.saturating_add(1);
        entry.last_interaction_at = now;
        entry.growth = GrowthStage::derive(entry.interactions, now, now);

        self.commit(entries)?;
        Ok(true)
    }

    pub fn set_journal(&mut self, id: &str, text: Option<String>) -> Result<()> {
        let mut entries = self.entries.clone();
        let entry = entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| anyhow!("no mood entry with id {id}"))?;

        entry.journal = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self.commit(entries)
    }

    pub fn remove(&mut self, id: &str) -> Result<MoodEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| anyhow!("no mood entry with id {id}"))?;
        let mut entries = self.entries.clone();
        let removed = entries.remove(index);
        self.commit(entries)?;
        Ok(removed)
    }

    /// Recompute every growth stage. Persists only when something changed.
    pub fn refresh_growth(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let mut entries = self.entries.clone();
        let mut changed = 0;
        for entry in &mut entries {
            let stage = GrowthStage::derive(entry.interactions, entry.last_interaction_at, now);
            if stage != entry.growth {
                entry.growth = stage;
                changed += 1;
            }
        }
        if changed > 0 {
            self.commit(entries)?;
        }
        Ok(changed)
    }

    /// Persist `entries` and adopt them only once the write succeeded.
    fn commit(&mut self, entries: Vec<MoodEntry>) -> Result<()> {
        write_json(self.store.as_ref(), GARDEN_STORAGE_KEY, &entries)?;
        self.entries = entries;
        Ok(())
    }
}

/// Periodically recompute growth stages until cancelled.
pub fn spawn_growth_refresher(
    garden: Arc<Mutex<MoodGarden>>,
    every: Duration,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let mut garden = garden.lock().await;
                    match garden.refresh_growth(Utc::now()) {
                        Ok(0) => {}
                        Ok(changed) => log_info!("{changed} plants changed growth stage"),
                        Err(err) => log_warn!("growth refresh failed: {err:#}"),
                    }
                }
                _ = cancel_token.cancelled() => break,
            }
        }
    })
}
