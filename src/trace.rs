//! Observers for the canonical record built on each call.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::schema::{CanonicalInput, ImageSlot};

/// Receives every canonical record the input transform builds.
///
/// Sinks return nothing, so a misbehaving sink cannot fail the transform.
pub trait TraceSink: Send + Sync {
    fn record(&self, input: &CanonicalInput);
}

/// Emits a `debug!` event per record through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, input: &CanonicalInput) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        let summary = InputSummary::from(input);
        tracing::debug!(
            state = ?summary.state,
            images = ?summary.image_shapes,
            masks = ?summary.masks,
            prompt = summary.prompt.as_deref().unwrap_or(""),
            actions = ?summary.action_shape,
            "canonical input"
        );
    }
}

/// Discards records.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn record(&self, _input: &CanonicalInput) {}
}

/// Keeps a summary of every record, for inspection in tests and debugging sessions.
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    seen: Arc<Mutex<Vec<InputSummary>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<InputSummary> {
        match self.seen.lock() {
            Ok(seen) => seen.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TraceSink for CaptureSink {
    fn record(&self, input: &CanonicalInput) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(InputSummary::from(input));
        }
    }
}

/// Image-free view of a [`CanonicalInput`].
#[derive(Debug, Clone, PartialEq)]
pub struct InputSummary {
    pub state: Vec<f32>,
    pub image_shapes: Vec<(&'static str, Vec<usize>)>,
    pub masks: Vec<(&'static str, bool)>,
    pub prompt: Option<String>,
    pub action_shape: Option<Vec<usize>>,
}

impl From<&CanonicalInput> for InputSummary {
    fn from(input: &CanonicalInput) -> Self {
        Self {
            state: input.state().as_slice().to_vec(),
            image_shapes: input
                .image()
                .iter()
                .map(|(slot, image)| (slot.as_str(), image.shape().to_vec()))
                .collect(),
            masks: input
                .image_mask()
                .iter()
                .map(|(slot, mask)| (slot.as_str(), *mask))
                .collect(),
            prompt: input.prompt().map(str::to_string),
            action_shape: input.actions().map(|actions| actions.shape().to_vec()),
        }
    }
}

impl InputSummary {
    pub fn mask(&self, slot: ImageSlot) -> Option<bool> {
        self.masks
            .iter()
            .find(|(name, _)| *name == slot.as_str())
            .map(|(_, mask)| *mask)
    }
}

impl fmt::Display for InputSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state={:?} masks={:?}", self.state, self.masks)?;
        if let Some(prompt) = &self.prompt {
            write!(f, " prompt={prompt:?}")?;
        }
        Ok(())
    }
}
