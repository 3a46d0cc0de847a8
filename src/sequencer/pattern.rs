use anyhow::{bail, Result};
use rand::Rng;
use serde::Serialize;

use super::Voice;

pub const DEFAULT_STEPS: usize = 8;
pub const DEFAULT_DENSITY: f64 = 0.28;

/// One row of boolean step slots per voice. Every row always has exactly
/// `steps` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    steps: usize,
    rows: Vec<Vec<bool>>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS)
    }
}

impl Pattern {
    pub fn new(steps: usize) -> Self {
        let steps = steps.max(1);
        Self {
            steps,
            rows: vec![vec![false; steps]; Voice::ALL.len()],
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_active(&self, voice: Voice, step: usize) -> bool {
        self.rows[voice.index()].get(step).copied().unwrap_or(false)
    }

    pub fn row(&self, voice: Voice) -> &[bool] {
        &self.rows[voice.index()]
    }

    fn check_step(&self, step: usize) -> Result<()> {
        if step >= self.steps {
            bail!("step {step} is outside the {}-step grid", self.steps);
        }
        Ok(())
    }

    /// Flip one cell. Returns the new value.
    pub fn toggle(&mut self, voice: Voice, step: usize) -> Result<bool> {
        self.check_step(step)?;
        let cell = &mut self.rows[voice.index()][step];
        *cell = !*cell;
        Ok(*cell)
    }

    pub fn set(&mut self, voice: Voice, step: usize, active: bool) -> Result<()> {
        self.check_step(step)?;
        self.rows[voice.index()][step] = active;
        Ok(())
    }

    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.iter_mut().for_each(|cell| *cell = false);
        }
    }

    /// Replace every cell with an independent draw that is true with
    /// probability `density`.
    pub fn randomize<R: Rng + ?Sized>(&mut self, density: f64, rng: &mut R) {
        let density = density.clamp(0.0, 1.0);
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                *cell = rng.gen_bool(density);
            }
        }
    }

    /// Voices with an active cell at `step`, in table order.
    pub fn voices_at(&self, step: usize) -> Vec<Voice> {
        Voice::ALL
            .iter()
            .copied()
            .filter(|voice| self.is_active(*voice, step))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.rows.iter().flatten().filter(|cell| **cell).count()
    }

    pub fn cell_count(&self) -> usize {
        self.steps * self.rows.len()
    }
}
