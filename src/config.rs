//! Transform configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::inputs::InputTransform;
use crate::outputs::OutputTransform;
use crate::policy::{Policy, SampleParams, TransformedPolicy};
use crate::variant::ModelVariant;
use crate::{ACTION_DIM, TARGET_IMAGE_HEIGHT, TARGET_IMAGE_WIDTH};

/// Settings for one robot/checkpoint pairing. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub model_variant: ModelVariant,
    pub sample: SampleParams,
    /// Resolution the checkpoint was trained at. Frames are not resized to it.
    pub image_height: usize,
    pub image_width: usize,
    pub action_dim: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            model_variant: ModelVariant::default(),
            sample: SampleParams::default(),
            image_height: TARGET_IMAGE_HEIGHT,
            image_width: TARGET_IMAGE_WIDTH,
            action_dim: ACTION_DIM,
        }
    }
}

impl TransformConfig {
    pub fn from_json_str(json: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| PolicyError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn input_transform(&self) -> InputTransform {
        InputTransform::new(self.model_variant)
    }

    pub fn output_transform(&self) -> OutputTransform {
        OutputTransform::with_action_dim(self.action_dim)
    }

    /// Wraps `policy` with this config's transforms and sampling.
    pub fn build<P: Policy>(&self, policy: P) -> TransformedPolicy<P> {
        TransformedPolicy::new(policy, self.input_transform(), self.output_transform())
            .with_sample_params(self.sample)
    }
}
