use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use super::stage::{PipelineState, Stage};

/// Progress notification emitted by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Started(Stage),
    Completed(Stage),
    Failed(Stage),
    Done,
}

impl ProgressEvent {
    /// Pipeline state right after this event.
    pub fn state(&self) -> PipelineState {
        match *self {
            ProgressEvent::Started(stage) => PipelineState::Running(stage),
            ProgressEvent::Completed(Stage::Delivering) | ProgressEvent::Done => {
                PipelineState::Done
            }
            ProgressEvent::Completed(stage) => match next_stage(stage) {
                Some(next) => PipelineState::Running(next),
                None => PipelineState::Done,
            },
            ProgressEvent::Failed(stage) => PipelineState::Failed(stage),
        }
    }
}

fn next_stage(stage: Stage) -> Option<Stage> {
    let position = Stage::ALL.iter().position(|s| *s == stage)?;
    Stage::ALL.get(position + 1).copied()
}

/// Receives progress events for a run. Implementations must not block.
pub trait ProgressObserver: Send + Sync {
    fn report(&self, addon: &str, event: ProgressEvent);
}

/// Forwards events to a channel, for callers rendering several runs at once.
impl ProgressObserver for UnboundedSender<(String, ProgressEvent)> {
    fn report(&self, addon: &str, event: ProgressEvent) {
        // A dropped receiver only means nobody is watching
        let _ = self.send((addon.to_string(), event));
    }
}

/// Keeps every event in order.
#[derive(Default)]
pub struct ProgressLog {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// State after the last recorded event.
    pub fn state(&self) -> PipelineState {
        self.events()
            .last()
            .map_or(PipelineState::Idle, ProgressEvent::state)
    }
}

impl ProgressObserver for ProgressLog {
    fn report(&self, _addon: &str, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
