//! The model call contract and the transform pipeline around it.

use async_trait::async_trait;
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::inputs::InputTransform;
use crate::outputs::{OutputTransform, RobotAction};
use crate::schema::{CanonicalInput, RawObservation};

/// Sampling knobs forwarded to the model on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleParams {
    pub temperature: f32,
    pub n_action_samples: usize,
}

impl Default for SampleParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            n_action_samples: 1,
        }
    }
}

/// What the model returns: an action chunk `(T, D)` plus free-form extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyOutput {
    pub actions: ArrayD<f32>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl PolicyOutput {
    pub fn new(actions: ArrayD<f32>) -> Self {
        Self {
            actions,
            metadata: serde_json::Map::new(),
        }
    }
}

/// A trained policy invoked on canonical records.
///
/// Implementations own model loading, batching and sampling; this crate only shapes the
/// record passed in and reads `actions` from the record returned.
#[async_trait]
pub trait Policy: Send + Sync {
    async fn infer(
        &self,
        input: &CanonicalInput,
        params: &SampleParams,
    ) -> Result<PolicyOutput, PolicyError>;
}

/// A policy wrapped with the robot's input and output transforms.
#[derive(Debug)]
pub struct TransformedPolicy<P> {
    inner: P,
    inputs: InputTransform,
    outputs: OutputTransform,
    params: SampleParams,
}

impl<P: Policy> TransformedPolicy<P> {
    pub fn new(inner: P, inputs: InputTransform, outputs: OutputTransform) -> Self {
        Self {
            inner,
            inputs,
            outputs,
            params: SampleParams::default(),
        }
    }

    pub fn with_sample_params(mut self, params: SampleParams) -> Self {
        self.params = params;
        self
    }

    pub fn sample_params(&self) -> SampleParams {
        self.params
    }

    /// Changes sampling for subsequent calls.
    pub fn set_sample_params(&mut self, params: SampleParams) {
        self.params = params;
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }

    /// Runs one observation through input transform, model and output transform.
    #[tracing::instrument(level = "trace", skip_all)]
    pub async fn infer(&self, observation: &RawObservation) -> Result<RobotAction, PolicyError> {
        let input = self.inputs.apply(observation)?;
        let output = self.inner.infer(&input, &self.params).await?;
        let actions = self.outputs.apply(&output.actions)?;
        tracing::trace!(
            raw = ?output.actions.shape(),
            robot = ?actions.shape(),
            "policy step"
        );
        Ok(actions)
    }
}
