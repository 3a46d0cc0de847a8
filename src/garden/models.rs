//! Mood Garden records as persisted in local storage.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Interactions needed to reach each stage.
const SPROUT_AT: u32 = 1;
const BUD_AT: u32 = 3;
const BLOOM_AT: u32 = 6;
/// A plant with no interaction for this long wilts until tended again.
const WILT_AFTER_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum GrowthStage {
    #[default]
    Seed,
    Sprout,
    Bud,
    Bloom,
    Wilted,
}

impl GrowthStage {
    /// Stage implied by how often and how recently a mood was tended.
    pub fn derive(interactions: u32, last_interaction_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if interactions > 0 && now - last_interaction_at > Duration::days(WILT_AFTER_DAYS) {
            return GrowthStage::Wilted;
        }

        match interactions {
            n if n >= BLOOM_AT => GrowthStage::Bloom,
            n if n >= BUD_AT => GrowthStage::Bud,
            n if n >= SPROUT_AT => GrowthStage::Sprout,
            _ => GrowthStage::Seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub id: String,
    pub mood: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub growth: GrowthStage,
    #[serde(default)]
    pub interactions: u32,
    pub last_interaction_at: DateTime<Utc>,
    #[serde(default)]
    pub journal: Option<String>,
}

impl MoodEntry {
    pub fn new(mood: String, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mood,
            created_at: now,
            growth: GrowthStage::Seed,
            interactions: 0,
            last_interaction_at: now,
            journal: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_follow_interaction_count() {
        let now = Utc::now();
        assert_eq!(GrowthStage::derive(0, now, now), GrowthStage::Seed);
        assert_eq!(GrowthStage::derive(1, now, now), GrowthStage::Sprout);
        assert_eq!(GrowthStage::derive(3, now, now), GrowthStage::Bud);
        assert_eq!(GrowthStage::derive(9, now, now), GrowthStage::Bloom);
    }

    #[test]
    fn neglected_plants_wilt() {
        let now = Utc::now();
        let stale = now - Duration::days(4);
        assert_eq!(GrowthStage::derive(9, stale, now), GrowthStage::Wilted);
        // A fresh seed has nothing to wilt.
        assert_eq!(GrowthStage::derive(0, stale, now), GrowthStage::Seed);
    }

    #[test]
    fn tolerant_of_sparse_records() {
        let raw = r#"{"id":"a","mood":"calm","createdAt":"2026-10-01T09:00:00Z","lastInteractionAt":"2026-10-01T09:00:00Z"}"#;
        let entry: MoodEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.growth, GrowthStage::Seed);
        assert_eq!(entry.interactions, 0);
        assert!(entry.journal.is_none());
    }
}
