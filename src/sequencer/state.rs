use serde::Serialize;
use std::time::Duration;

use super::{Pattern, Voice};

pub const MIN_BPM: u32 = 60;
pub const MAX_BPM: u32 = 160;
pub const DEFAULT_BPM: u32 = 80;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SequencerStatus {
    #[default]
    Stopped,
    Running,
}

/// Tick period for `bpm`: each beat is split into two steps.
pub fn step_interval(bpm: u32) -> Duration {
    Duration::from_secs_f64(60_000.0 / bpm as f64 / 2.0 / 1000.0)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencerState {
    pub status: SequencerStatus,
    pub cursor: usize,
    pub bpm: u32,
    pub pattern: Pattern,
    /// Ticks fired since the last start.
    pub ticks: u64,
}

impl Default for SequencerState {
    fn default() -> Self {
        Self {
            status: SequencerStatus::Stopped,
            cursor: 0,
            bpm: DEFAULT_BPM,
            pattern: Pattern::default(),
            ticks: 0,
        }
    }
}

impl SequencerState {
    pub fn new(steps: usize) -> Self {
        Self {
            pattern: Pattern::new(steps),
            ..Self::default()
        }
    }

    pub fn interval(&self) -> Duration {
        step_interval(self.bpm)
    }

    pub fn set_bpm(&mut self, bpm: u32) -> u32 {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        self.bpm
    }

    pub fn begin(&mut self) {
        self.status = SequencerStatus::Running;
        self.cursor = 0;
        self.ticks = 0;
    }

    pub fn stop(&mut self) {
        self.status = SequencerStatus::Stopped;
        self.cursor = 0;
    }

    /// Voices to sound at the cursor, then advance it by one step, wrapping.
    pub fn advance(&mut self) -> (usize, Vec<Voice>) {
        let step = self.cursor;
        let voices = self.pattern.voices_at(step);
        self.cursor = (self.cursor + 1) % self.pattern.steps();
        self.ticks = self.ticks.wrapping_add(1);
        (step, voices)
    }
}
