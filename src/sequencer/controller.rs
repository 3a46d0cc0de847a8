use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::audio::{ToneHandle, ToneOutput};

use super::{pattern::DEFAULT_DENSITY, SequencerState, SequencerStatus, Voice};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

struct Clock {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Handle to the step sequencer. Clones share the same pattern, clock and
/// audio output.
pub struct SequencerController<O: ToneOutput> {
    state: Arc<Mutex<SequencerState>>,
    output: Arc<O>,
    clock: Arc<Mutex<Option<Clock>>>,
    previews: Arc<Mutex<HashMap<Voice, ToneHandle>>>,
    rng: Arc<Mutex<StdRng>>,
}

impl<O: ToneOutput> Clone for SequencerController<O> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            output: self.output.clone(),
            clock: self.clock.clone(),
            previews: self.previews.clone(),
            rng: self.rng.clone(),
        }
    }
}

impl<O: ToneOutput> SequencerController<O> {
    pub fn new(output: Arc<O>, steps: usize) -> Self {
        Self::with_rng(output, steps, StdRng::from_entropy())
    }

    pub fn with_rng(output: Arc<O>, steps: usize, rng: StdRng) -> Self {
        Self {
            state: Arc::new(Mutex::new(SequencerState::new(steps))),
            output,
            clock: Arc::new(Mutex::new(None)),
            previews: Arc::new(Mutex::new(HashMap::new())),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn output(&self) -> &Arc<O> {
        &self.output
    }

    pub async fn snapshot(&self) -> SequencerState {
        self.state.lock().await.clone()
    }

    pub async fn toggle_cell(&self, voice: Voice, step: usize) -> Result<bool> {
        self.state.lock().await.pattern.toggle(voice, step)
    }

    pub async fn set_cell(&self, voice: Voice, step: usize, active: bool) -> Result<()> {
        self.state.lock().await.pattern.set(voice, step, active)
    }

    pub async fn clear_pattern(&self) {
        self.state.lock().await.pattern.clear();
    }

    /// Re-roll the whole grid. `None` uses the default density.
    pub async fn randomize(&self, density: Option<f64>) {
        let density = density.unwrap_or(DEFAULT_DENSITY);
        let mut rng = self.rng.lock().await;
        let mut state = self.state.lock().await;
        state.pattern.randomize(density, &mut *rng);
        log_debug!(
            "pattern randomized at density {density}: {} active cells",
            state.pattern.active_count()
        );
    }

    /// Takes effect at the next tick boundary; the interval already being
    /// waited on is not rescheduled.
    pub async fn set_tempo(&self, bpm: u32) -> u32 {
        self.state.lock().await.set_bpm(bpm)
    }

    pub async fn start(&self) -> Result<SequencerState> {
        if let Err(err) = self.output.ensure_ready().await {
            log_warn!("audio not ready, sequencer will run silently: {err:#}");
        }

        let (bpm, voices) = {
            let mut state = self.state.lock().await;
            if state.status == SequencerStatus::Running {
                return Ok(state.clone());
            }
            state.begin();
            let (_, voices) = state.advance();
            (state.bpm, voices)
        };

        // Step 0 sounds right away instead of waiting out the first interval.
        sound_voices(self.output.as_ref(), &voices);
        self.spawn_clock().await;

        log_info!("Sequencer started at {bpm} bpm");
        Ok(self.snapshot().await)
    }

    /// Idempotent. Safe to call before any audio context exists.
    pub async fn stop(&self) {
        self.cancel_clock().await;

        let mut state = self.state.lock().await;
        if state.status == SequencerStatus::Running {
            log_info!("Sequencer stopped after {} ticks", state.ticks);
        }
        state.stop();
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.status == SequencerStatus::Running
    }

    /// Play one voice outside the grid. A preview already in flight for the
    /// same voice is stopped first.
    pub async fn preview(&self, voice: Voice) -> Result<ToneHandle> {
        if let Err(err) = self.output.ensure_ready().await {
            log_warn!("audio not ready for preview: {err:#}");
        }

        let mut previews = self.previews.lock().await;
        if let Some(previous) = previews.remove(&voice) {
            self.output.release(previous);
        }
        let handle = self.output.play_tone(voice.frequency())?;
        previews.insert(voice, handle);
        Ok(handle)
    }

    /// Stop the clock and release any preview tones still in flight.
    pub async fn teardown(&self) {
        self.stop().await;
        let mut previews = self.previews.lock().await;
        for (_, handle) in previews.drain() {
            self.output.release(handle);
        }
    }

    async fn spawn_clock(&self) {
        let mut clock_guard = self.clock.lock().await;
        if let Some(clock) = clock_guard.take() {
            clock.cancel_token.cancel();
            clock.handle.abort();
        }

        let state = self.state.clone();
        let output = self.output.clone();
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            loop {
                let interval = state.lock().await.interval();

                tokio::select! {
                    _ = time::sleep(interval) => {}
                    _ = token.cancelled() => break,
                }

                let (step, voices) = {
                    let mut guard = state.lock().await;
                    if token.is_cancelled() || guard.status != SequencerStatus::Running {
                        break;
                    }
                    guard.advance()
                };

                log_debug!("tick step {step}: {} voices", voices.len());
                sound_voices(output.as_ref(), &voices);
            }
        });

        *clock_guard = Some(Clock {
            handle,
            cancel_token,
        });
    }

    async fn cancel_clock(&self) {
        if let Some(clock) = self.clock.lock().await.take() {
            clock.cancel_token.cancel();
            clock.handle.abort();
        }
    }
}

fn sound_voices<O: ToneOutput>(output: &O, voices: &[Voice]) {
    for voice in voices {
        if let Err(err) = output.play_tone(voice.frequency()) {
            log_warn!("failed to schedule {} tone: {err:#}", voice.as_str());
        }
    }
}
