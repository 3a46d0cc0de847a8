//! Cross-activity "mood interaction" reports.
//!
//! Any activity can hold an [`InteractionReporter`] handed down by the app
//! shell. The garden drains the matching receiver; when nothing is listening
//! a report is silently dropped.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::MoodGarden;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, PartialEq)]
pub struct MoodInteraction {
    pub mood: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct InteractionReporter {
    tx: Option<mpsc::UnboundedSender<MoodInteraction>>,
}

impl InteractionReporter {
    /// A reporter that goes nowhere, for activities mounted without a garden.
    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub fn report(&self, mood: &str) {
        self.report_at(mood, Utc::now());
    }

    pub fn report_at(&self, mood: &str, at: DateTime<Utc>) {
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        let event = MoodInteraction {
            mood: mood.to_string(),
            at,
        };
        if tx.send(event).is_err() {
            log_debug!("mood garden not listening; dropped interaction for '{mood}'");
        }
    }
}

pub struct InteractionBus {
    tx: mpsc::UnboundedSender<MoodInteraction>,
    rx: mpsc::UnboundedReceiver<MoodInteraction>,
}

impl Default for InteractionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionBus {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn reporter(&self) -> InteractionReporter {
        InteractionReporter {
            tx: Some(self.tx.clone()),
        }
    }

    /// Hand the receiving side to the garden's listener task.
    pub fn into_receiver(self) -> mpsc::UnboundedReceiver<MoodInteraction> {
        self.rx
    }
}

/// Apply reports to the garden until `cancel_token` fires or every reporter
/// is gone.
pub fn spawn_interaction_listener(
    garden: Arc<Mutex<MoodGarden>>,
    mut rx: mpsc::UnboundedReceiver<MoodInteraction>,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    let mut garden = garden.lock().await;
                    match garden.record_interaction(&event.mood, event.at) {
                        Ok(true) => {}
                        Ok(false) => log_debug!("no plant for mood '{}'", event.mood),
                        Err(err) => log_warn!("failed to record interaction for '{}': {err:#}", event.mood),
                    }
                }
                _ = cancel_token.cancelled() => break,
            }
        }
        log_info!("mood interaction listener stopped");
    })
}
