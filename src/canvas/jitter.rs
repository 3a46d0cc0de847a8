use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Control-point offset as a fraction of stroke width.
const CONTROL_JITTER_PER_WIDTH: f32 = 0.15;
/// Per-segment line width variation (±6%).
const WIDTH_JITTER: f32 = 0.06;

/// Hand-drawn texture source. `disabled()` gives perfectly smooth, repeatable
/// strokes.
pub struct Jitter {
    rng: Option<StdRng>,
}

impl Jitter {
    pub fn from_entropy() -> Self {
        Self {
            rng: Some(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Some(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn disabled() -> Self {
        Self { rng: None }
    }

    pub fn perturb(&mut self, point: [f32; 2], width: f32) -> [f32; 2] {
        let Some(rng) = self.rng.as_mut() else {
            return point;
        };
        let amplitude = width * CONTROL_JITTER_PER_WIDTH;
        [
            point[0] + rng.gen_range(-amplitude..=amplitude),
            point[1] + rng.gen_range(-amplitude..=amplitude),
        ]
    }

    pub fn width(&mut self, width: f32) -> f32 {
        match self.rng.as_mut() {
            Some(rng) => width * (1.0 + rng.gen_range(-WIDTH_JITTER..=WIDTH_JITTER)),
            None => width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_jitter_is_identity() {
        let mut jitter = Jitter::disabled();
        assert_eq!(jitter.perturb([3.0, 4.0], 10.0), [3.0, 4.0]);
        assert_eq!(jitter.width(10.0), 10.0);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let mut jitter = Jitter::seeded(11);
        for _ in 0..1000 {
            let w = jitter.width(10.0);
            assert!((9.399..=10.601).contains(&w));
            let p = jitter.perturb([0.0, 0.0], 10.0);
            assert!(p[0].abs() <= 1.501 && p[1].abs() <= 1.501);
        }
    }
}
