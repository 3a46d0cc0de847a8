pub mod controller;
pub mod pattern;
pub mod state;
pub mod voice;

pub use controller::SequencerController;
pub use pattern::{Pattern, DEFAULT_DENSITY, DEFAULT_STEPS};
pub use state::{step_interval, SequencerState, SequencerStatus, DEFAULT_BPM, MAX_BPM, MIN_BPM};
pub use voice::Voice;
