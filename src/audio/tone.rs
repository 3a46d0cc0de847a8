use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;

/// Attack/decay shape shared by sequenced tones and one-shot previews so both
/// sound identical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneEnvelope {
    pub peak: f32,
    pub attack_secs: f32,
    pub floor: f32,
    pub release_at_secs: f32,
}

impl Default for ToneEnvelope {
    fn default() -> Self {
        Self {
            peak: 0.3,
            attack_secs: 0.1,
            floor: 0.001,
            release_at_secs: 2.0,
        }
    }
}

impl ToneEnvelope {
    /// Gain at `t` seconds after the tone starts. Linear ramp up to `peak`,
    /// then exponential decay reaching `floor` at `release_at_secs`.
    pub fn gain_at(&self, t: f32) -> f32 {
        if t <= 0.0 || t >= self.release_at_secs {
            return 0.0;
        }
        if t < self.attack_secs {
            return self.peak * t / self.attack_secs;
        }

        let decay_span = self.release_at_secs - self.attack_secs;
        let progress = (t - self.attack_secs) / decay_span;
        self.peak * (self.floor / self.peak).powf(progress)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.release_at_secs)
    }
}

/// Sine oscillator shaped by a [`ToneEnvelope`]. Finite: the iterator ends
/// when the envelope releases, which lets the owning sink drain and drop.
pub struct ToneSource {
    frequency: f32,
    envelope: ToneEnvelope,
    sample_rate: u32,
    num_sample: u64,
    total_samples: u64,
}

impl ToneSource {
    pub fn new(frequency: f32, envelope: ToneEnvelope) -> Self {
        let total_samples = (envelope.release_at_secs * SAMPLE_RATE as f32) as u64;
        Self {
            frequency,
            envelope,
            sample_rate: SAMPLE_RATE,
            num_sample: 0,
            total_samples,
        }
    }
}

impl Iterator for ToneSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }

        let t = self.num_sample as f32 / self.sample_rate as f32;
        self.num_sample += 1;

        let sample = (2.0 * PI * self.frequency * t).sin();
        Some(sample * self.envelope.gain_at(t))
    }
}

impl Source for ToneSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some((self.total_samples - self.num_sample.min(self.total_samples)) as usize)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.envelope.duration())
    }
}
