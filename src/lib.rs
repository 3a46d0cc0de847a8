pub mod audio;
pub mod canvas;
pub mod config;
pub mod garden;
pub mod personalization;
pub mod sequencer;
pub mod storage;
pub mod utils;

use std::sync::Arc;

use anyhow::Result;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use audio::{AudioContext, SilentOutput, ToneOutput};
use canvas::{CanvasEngine, Jitter, RasterSurface, CANVAS_HEIGHT};
use config::AppConfig;
use garden::{spawn_growth_refresher, spawn_interaction_listener, InteractionBus, InteractionReporter, MoodGarden};
use personalization::Personalization;
use sequencer::{SequencerController, DEFAULT_STEPS};
use storage::{KeyValueStore, LocalStore};

pub use utils::init_logging;

const ENABLE_LOGS: bool = true;

const DEFAULT_CANVAS_WIDTH: u32 = 600;

/// Audio backend picked at launch.
pub enum Output {
    Device(AudioContext),
    Silent(SilentOutput),
}

impl Output {
    /// Pending "sound unavailable" notice for the UI, shown once.
    pub fn take_notice(&self) -> Option<&'static str> {
        match self {
            Output::Device(ctx) => ctx.take_notice(),
            Output::Silent(_) => None,
        }
    }

    pub fn close(&self) {
        if let Output::Device(ctx) = self {
            ctx.close();
        }
    }
}

impl ToneOutput for Output {
    async fn ensure_ready(&self) -> Result<()> {
        match self {
            Output::Device(ctx) => ctx.ensure_ready().await,
            Output::Silent(silent) => silent.ensure_ready().await,
        }
    }

    fn play_tone(&self, frequency: f32) -> Result<audio::ToneHandle> {
        match self {
            Output::Device(ctx) => ctx.play_tone(frequency),
            Output::Silent(silent) => silent.play_tone(frequency),
        }
    }

    fn release(&self, handle: audio::ToneHandle) {
        match self {
            Output::Device(ctx) => ctx.release(handle),
            Output::Silent(silent) => silent.release(handle),
        }
    }
}

/// Everything an activity screen needs, wired once by the host shell.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub canvas: CanvasEngine<RasterSurface>,
    pub sequencer: SequencerController<Output>,
    pub garden: Arc<Mutex<MoodGarden>>,
    interactions: InteractionReporter,
    cancel_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl AppState {
    /// Must be called from inside a tokio runtime.
    pub fn launch(config: AppConfig) -> Result<Self> {
        log_info!("Playful Pause starting up...");

        let store: Arc<dyn KeyValueStore> = Arc::new(LocalStore::open(config.store_path())?);

        let output = if config.silent {
            log_info!("Audio disabled by configuration");
            Output::Silent(SilentOutput::default())
        } else {
            Output::Device(AudioContext::new())
        };
        let sequencer = SequencerController::new(Arc::new(output), DEFAULT_STEPS);

        let canvas = CanvasEngine::new(
            RasterSurface::new(DEFAULT_CANVAS_WIDTH, CANVAS_HEIGHT, 1.0),
            Jitter::from_entropy(),
        );

        let garden = Arc::new(Mutex::new(MoodGarden::load(store.clone())));
        let bus = InteractionBus::new();
        let interactions = bus.reporter();

        let cancel_token = CancellationToken::new();
        let tasks = vec![
            spawn_interaction_listener(garden.clone(), bus.into_receiver(), cancel_token.child_token()),
            spawn_growth_refresher(garden.clone(), config.growth_refresh_every, cancel_token.child_token()),
        ];

        Ok(Self {
            config,
            store,
            canvas,
            sequencer,
            garden,
            interactions,
            cancel_token,
            tasks,
        })
    }

    /// Reporter other activities use to credit a mood in the garden.
    pub fn interaction_reporter(&self) -> InteractionReporter {
        self.interactions.clone()
    }

    pub fn personalization(&self) -> Personalization {
        Personalization::load(self.store.as_ref())
    }

    /// Stop the clock, release timers and tasks, and close the audio device.
    pub async fn shutdown(mut self) {
        self.sequencer.teardown().await;
        self.canvas.teardown();
        self.cancel_token.cancel();
        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                log_warn!("background task ended abnormally: {err}");
            }
        }
        self.sequencer.output().close();
        log_info!("Playful Pause shut down");
    }
}
