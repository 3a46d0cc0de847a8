//! Read-only view of what the user has told the app about themselves.

use crate::canvas::Color;
use crate::storage::KeyValueStore;

pub const PERSONAL_CONTEXT_KEY: &str = "personalContext";
pub const LAST_CREATIVE_RESPONSE_KEY: &str = "lastCreativeResponse";

const DEFAULT_BREATHING_COLOR: Color = Color::rgb(0x9B, 0xD7, 0xA8);

// First matching keyword wins.
const BREATHING_PALETTE: &[(&[&str], Color)] = &[
    (&["anxious", "anxiety", "stress", "overwhelm", "panic"], Color::rgb(0x7F, 0xB3, 0xD5)),
    (&["tired", "sleep", "exhausted", "insomnia"], Color::rgb(0xC3, 0xB1, 0xE1)),
    (&["sad", "lonely", "down", "grief"], Color::rgb(0xF7, 0xC5, 0x9F)),
    (&["angry", "frustrat", "irritat"], Color::rgb(0xA8, 0xE6, 0xCF)),
    (&["focus", "study", "exam", "work"], Color::rgb(0xFF, 0xE0, 0x8A)),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Personalization {
    pub personal_context: String,
    pub last_creative_response: String,
}

impl Personalization {
    /// Never fails: absent keys read as empty text.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            personal_context: store.get(PERSONAL_CONTEXT_KEY).unwrap_or_default(),
            last_creative_response: store.get(LAST_CREATIVE_RESPONSE_KEY).unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.personal_context.trim().is_empty() && self.last_creative_response.trim().is_empty()
    }

    /// Default color for the breathing activity, biased by what the user
    /// shared. Personal context takes priority over the last prompt answer.
    pub fn suggested_breathing_color(&self) -> Color {
        [&self.personal_context, &self.last_creative_response]
            .into_iter()
            .find_map(|text| match_palette(text))
            .unwrap_or(DEFAULT_BREATHING_COLOR)
    }
}

fn match_palette(text: &str) -> Option<Color> {
    let lowered = text.to_lowercase();
    if lowered.trim().is_empty() {
        return None;
    }
    BREATHING_PALETTE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, color)| *color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn empty_store_gives_defaults() {
        let store = MemoryStore::new();
        let personal = Personalization::load(&store);
        assert!(personal.is_empty());
        assert_eq!(personal.suggested_breathing_color(), DEFAULT_BREATHING_COLOR);
    }

    #[test]
    fn context_biases_breathing_color() {
        let store = MemoryStore::new();
        store
            .set(PERSONAL_CONTEXT_KEY, "Feeling STRESSED about deadlines".into())
            .unwrap();
        store
            .set(LAST_CREATIVE_RESPONSE_KEY, "a sleepy cat".into())
            .unwrap();
        let personal = Personalization::load(&store);
        assert_eq!(personal.suggested_breathing_color(), Color::from_hex("#7FB3D5").unwrap());
    }

    #[test]
    fn falls_back_to_creative_response() {
        let store = MemoryStore::new();
        store
            .set(LAST_CREATIVE_RESPONSE_KEY, "I could not sleep".into())
            .unwrap();
        let personal = Personalization::load(&store);
        assert_eq!(personal.suggested_breathing_color(), Color::from_hex("#C3B1E1").unwrap());
    }
}
