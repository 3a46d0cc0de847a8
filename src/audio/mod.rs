pub mod tone;

pub use tone::{ToneEnvelope, ToneSource};

use anyhow::{anyhow, Context, Result};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

type StreamOpener = fn() -> Result<(OutputStream, OutputStreamHandle)>;

const UNAVAILABLE_NOTICE: &str =
    "Sound is unavailable on this device, so the sound toys will stay quiet.";

/// Identifies one oscillator/gain pair scheduled on an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToneHandle(pub u64);

/// Anything that can turn a frequency into an enveloped tone.
pub trait ToneOutput: Send + Sync + 'static {
    /// Create or resume the underlying context. Awaited before any sound is
    /// scheduled; idempotent once ready.
    fn ensure_ready(&self) -> impl Future<Output = Result<()>> + Send;

    /// Schedule a tone with the shared envelope. Returns immediately.
    fn play_tone(&self, frequency: f32) -> Result<ToneHandle>;

    /// Stop and disconnect a tone early. Unknown or finished handles are ignored.
    fn release(&self, handle: ToneHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioContextState {
    Uninitialized,
    Running,
    Suspended,
    Unavailable,
    Closed,
}

enum AudioCommand {
    Resume { reply: oneshot::Sender<Result<()>> },
    Suspend,
    Play { id: u64, frequency: f32 },
    Release { id: u64 },
    Shutdown,
}

struct ContextInner {
    tx: Mutex<Option<Sender<AudioCommand>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    state: Mutex<AudioContextState>,
    next_id: AtomicU64,
    notice_pending: AtomicBool,
    envelope: ToneEnvelope,
    open_stream: StreamOpener,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        let sender = self.tx.get_mut().unwrap_or_else(|p| p.into_inner()).take();
        let worker = self.worker.get_mut().unwrap_or_else(|p| p.into_inner()).take();

        if let Some(tx) = sender {
            let _ = tx.send(AudioCommand::Shutdown);
        }
        if let Some(handle) = worker {
            if let Err(join_err) = handle.join() {
                log_error!("Failed to join audio thread: {join_err:?}");
            }
        }
    }
}

/// Lazily created audio context backed by a dedicated `audio-engine` thread
/// that owns the non-`Send` rodio output stream. One per activity instance;
/// clones share the same thread.
#[derive(Clone)]
pub struct AudioContext {
    inner: Arc<ContextInner>,
}

impl Default for AudioContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioContext {
    pub fn new() -> Self {
        Self::with_envelope(ToneEnvelope::default())
    }

    pub fn with_envelope(envelope: ToneEnvelope) -> Self {
        Self::with_stream_opener(envelope, open_default_stream)
    }

    fn with_stream_opener(envelope: ToneEnvelope, open_stream: StreamOpener) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                tx: Mutex::new(None),
                worker: Mutex::new(None),
                state: Mutex::new(AudioContextState::Uninitialized),
                next_id: AtomicU64::new(1),
                notice_pending: AtomicBool::new(false),
                envelope,
                open_stream,
            }),
        }
    }

    pub fn state(&self) -> AudioContextState {
        *self.inner.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_state(&self, state: AudioContextState) {
        *self.inner.state.lock().unwrap_or_else(|p| p.into_inner()) = state;
    }

    /// The one-time "sound unavailable" notice, if it has not been shown yet.
    pub fn take_notice(&self) -> Option<&'static str> {
        self.inner
            .notice_pending
            .swap(false, Ordering::SeqCst)
            .then_some(UNAVAILABLE_NOTICE)
    }

    fn sender(&self) -> Option<Sender<AudioCommand>> {
        self.inner
            .tx
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>> {
        let mut tx_guard = self.inner.tx.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(tx) = tx_guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();
        let envelope = self.inner.envelope;
        let open_stream = self.inner.open_stream;

        let worker = thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || audio_thread(rx, envelope, open_stream))
            .context("failed to spawn audio thread")?;

        *self.inner.worker.lock().unwrap_or_else(|p| p.into_inner()) = Some(worker);
        *tx_guard = Some(tx.clone());
        Ok(tx)
    }

    fn mark_unavailable(&self, reason: &anyhow::Error) {
        let previous = {
            let mut state = self.inner.state.lock().unwrap_or_else(|p| p.into_inner());
            std::mem::replace(&mut *state, AudioContextState::Unavailable)
        };
        if previous != AudioContextState::Unavailable {
            log_warn!("Audio unavailable, continuing silently: {reason:#}");
            self.inner.notice_pending.store(true, Ordering::SeqCst);
        }
    }

    /// Pause every in-flight tone, mirroring a browser suspending the context.
    pub fn suspend(&self) {
        if self.state() != AudioContextState::Running {
            return;
        }
        if let Some(tx) = self.sender() {
            let _ = tx.send(AudioCommand::Suspend);
            self.set_state(AudioContextState::Suspended);
        }
    }

    /// Tear the context down. Later calls to [`ToneOutput::ensure_ready`]
    /// recreate it.
    pub fn close(&self) {
        let sender = self.inner.tx.lock().unwrap_or_else(|p| p.into_inner()).take();
        let worker = self
            .inner
            .worker
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();

        if let Some(tx) = sender {
            let _ = tx.send(AudioCommand::Shutdown);
        }
        if let Some(handle) = worker {
            if let Err(join_err) = handle.join() {
                log_error!("Failed to join audio thread: {join_err:?}");
            }
        }

        let mut state = self.inner.state.lock().unwrap_or_else(|p| p.into_inner());
        if *state != AudioContextState::Unavailable {
            *state = AudioContextState::Closed;
        }
    }
}

impl ToneOutput for AudioContext {
    async fn ensure_ready(&self) -> Result<()> {
        match self.state() {
            AudioContextState::Running | AudioContextState::Unavailable => return Ok(()),
            AudioContextState::Uninitialized
            | AudioContextState::Suspended
            | AudioContextState::Closed => {}
        }

        let tx = self.ensure_thread()?;
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(AudioCommand::Resume { reply: reply_tx })
            .map_err(|err| anyhow!("failed to send resume to audio thread: {err}"))?;

        let outcome = reply_rx
            .await
            .map_err(|_| anyhow!("audio thread terminated unexpectedly"))
            .and_then(|result| result);

        match outcome {
            Ok(()) => {
                self.set_state(AudioContextState::Running);
                log_info!("Audio context running");
            }
            Err(err) => self.mark_unavailable(&err),
        }
        Ok(())
    }

    fn play_tone(&self, frequency: f32) -> Result<ToneHandle> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if self.state() != AudioContextState::Running {
            return Ok(ToneHandle(id));
        }

        let tx = self
            .sender()
            .ok_or_else(|| anyhow!("audio context is not open"))?;
        tx.send(AudioCommand::Play { id, frequency })
            .map_err(|err| anyhow!("failed to schedule tone: {err}"))?;
        Ok(ToneHandle(id))
    }

    fn release(&self, handle: ToneHandle) {
        if let Some(tx) = self.sender() {
            let _ = tx.send(AudioCommand::Release { id: handle.0 });
        }
    }
}

fn open_default_stream() -> Result<(OutputStream, OutputStreamHandle)> {
    OutputStream::try_default().map_err(|e| anyhow!("Failed to create audio output stream: {e}"))
}

fn audio_thread(
    rx: mpsc::Receiver<AudioCommand>,
    envelope: ToneEnvelope,
    open_stream: StreamOpener,
) {
    let mut output: Option<(OutputStream, OutputStreamHandle)> = None;
    let mut tones: HashMap<u64, Sink> = HashMap::new();

    let ensure_output = |output: &mut Option<(OutputStream, OutputStreamHandle)>| -> Result<()> {
        if output.is_none() {
            *output = Some(open_stream()?);
        }
        Ok(())
    };

    while let Ok(cmd) = rx.recv() {
        // Finished tones have drained their source; dropping the sink disconnects it.
        tones.retain(|_, sink| !sink.empty());

        match cmd {
            AudioCommand::Resume { reply } => {
                let result = ensure_output(&mut output);
                if result.is_ok() {
                    for sink in tones.values() {
                        sink.play();
                    }
                }
                let _ = reply.send(result);
            }
            AudioCommand::Suspend => {
                for sink in tones.values() {
                    sink.pause();
                }
            }
            AudioCommand::Play { id, frequency } => {
                let Some((_, handle)) = output.as_ref() else {
                    continue;
                };
                match Sink::try_new(handle) {
                    Ok(sink) => {
                        sink.append(ToneSource::new(frequency, envelope));
                        tones.insert(id, sink);
                        log_debug!("tone {id} at {frequency} Hz ({} in flight)", tones.len());
                    }
                    Err(e) => log_error!("Failed to create audio sink: {e}"),
                }
            }
            AudioCommand::Release { id } => {
                if let Some(sink) = tones.remove(&id) {
                    sink.stop();
                }
            }
            AudioCommand::Shutdown => break,
        }
    }

    for (_, sink) in tones.drain() {
        sink.stop();
    }
    log_info!("Audio thread shutting down");
}

/// Output that never makes a sound. Used when audio is disabled by config.
#[derive(Debug, Default)]
pub struct SilentOutput {
    next_id: AtomicU64,
}

impl ToneOutput for SilentOutput {
    async fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    fn play_tone(&self, _frequency: f32) -> Result<ToneHandle> {
        Ok(ToneHandle(self.next_id.fetch_add(1, Ordering::Relaxed)))
    }

    fn release(&self, _handle: ToneHandle) {}
}

/// A tone as seen by [`RecordingOutput`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTone {
    pub handle: ToneHandle,
    pub frequency: f32,
    pub released: bool,
}

/// Output that keeps a log of every scheduled tone instead of playing it.
/// Lets hosts and tests observe exactly what the sequencer fired.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    next_id: AtomicU64,
    ready_calls: AtomicU64,
    tones: Mutex<Vec<RecordedTone>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tones(&self) -> Vec<RecordedTone> {
        self.tones.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn frequencies(&self) -> Vec<f32> {
        self.tones().into_iter().map(|tone| tone.frequency).collect()
    }

    pub fn ready_calls(&self) -> u64 {
        self.ready_calls.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.tones.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }
}

impl ToneOutput for RecordingOutput {
    async fn ensure_ready(&self) -> Result<()> {
        self.ready_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn play_tone(&self, frequency: f32) -> Result<ToneHandle> {
        let handle = ToneHandle(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.tones
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(RecordedTone {
                handle,
                frequency,
                released: false,
            });
        Ok(handle)
    }

    fn release(&self, handle: ToneHandle) {
        let mut tones = self.tones.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(tone) = tones.iter_mut().find(|tone| tone.handle == handle) {
            tone.released = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_context_before_first_gesture() {
        let ctx = AudioContext::new();
        assert_eq!(ctx.state(), AudioContextState::Uninitialized);
        // Scheduling before ensure_ready is a quiet no-op.
        assert!(ctx.play_tone(440.0).is_ok());
        assert!(ctx.take_notice().is_none());
        ctx.close();
        ctx.close();
    }

    fn no_device() -> Result<(OutputStream, OutputStreamHandle)> {
        Err(anyhow!("no output device"))
    }

    #[tokio::test]
    async fn missing_device_degrades_to_silence() {
        let ctx = AudioContext::with_stream_opener(ToneEnvelope::default(), no_device);

        ctx.ensure_ready().await.unwrap();
        assert_eq!(ctx.state(), AudioContextState::Unavailable);
        assert!(ctx.take_notice().is_some());
        assert!(ctx.take_notice().is_none());

        // Later gestures neither retry nor raise the notice again.
        ctx.ensure_ready().await.unwrap();
        assert!(ctx.take_notice().is_none());

        let a = ctx.play_tone(220.0).unwrap();
        let b = ctx.play_tone(440.0).unwrap();
        assert_ne!(a, b);
        ctx.release(a);
        assert_eq!(ctx.state(), AudioContextState::Unavailable);

        ctx.close();
        assert_eq!(ctx.state(), AudioContextState::Unavailable);
    }

    #[tokio::test]
    async fn recording_output_tracks_release() {
        let output = RecordingOutput::new();
        output.ensure_ready().await.unwrap();
        let a = output.play_tone(220.0).unwrap();
        let _b = output.play_tone(330.0).unwrap();
        output.release(a);

        let tones = output.tones();
        assert_eq!(output.ready_calls(), 1);
        assert!(tones[0].released);
        assert!(!tones[1].released);
    }
}
