use serde::{Deserialize, Serialize};

/// One synth timbre, drawn as a shape in the grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Voice {
    Circle,
    Square,
    Triangle,
    Star,
    Heart,
    Diamond,
    Hexagon,
}

impl Voice {
    pub const ALL: [Voice; 7] = [
        Voice::Circle,
        Voice::Square,
        Voice::Triangle,
        Voice::Star,
        Voice::Heart,
        Voice::Diamond,
        Voice::Hexagon,
    ];

    pub fn frequency(self) -> f32 {
        match self {
            Voice::Circle => 220.0,
            Voice::Square => 275.0,
            Voice::Triangle => 330.0,
            Voice::Star => 440.0,
            Voice::Heart => 550.0,
            Voice::Diamond => 660.0,
            Voice::Hexagon => 880.0,
        }
    }

    /// Row index in the pattern grid.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Voice::Circle => "circle",
            Voice::Square => "square",
            Voice::Triangle => "triangle",
            Voice::Star => "star",
            Voice::Heart => "heart",
            Voice::Diamond => "diamond",
            Voice::Hexagon => "hexagon",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequencies_are_distinct_and_ascending() {
        let freqs: Vec<f32> = Voice::ALL.iter().map(|v| v.frequency()).collect();
        assert!(freqs.windows(2).all(|w| w[0] < w[1]));
        for (i, voice) in Voice::ALL.iter().enumerate() {
            assert_eq!(voice.index(), i);
        }
    }
}
