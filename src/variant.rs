//! Per-checkpoint conventions for camera slots the robot cannot fill.

use serde::{Deserialize, Serialize};

/// Trained model configurations the transform can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    #[default]
    Pi0,
    /// Autoregressive variant with faster action decoding.
    Pi0Fast,
}

impl ModelVariant {
    /// How this variant was trained to see a zero-filled camera slot.
    pub fn mask_policy(self) -> SlotMaskPolicy {
        match self {
            ModelVariant::Pi0Fast => SlotMaskPolicy::new(FillerMask::Usable),
            ModelVariant::Pi0 => SlotMaskPolicy::new(FillerMask::Unused),
        }
    }
}

/// Mask convention for a slot synthesized as zero filler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillerMask {
    /// The filler frame is presented to the model as an attendable image.
    Usable,
    /// The slot is flagged as absent.
    Unused,
}

impl FillerMask {
    pub fn flag(self) -> bool {
        matches!(self, FillerMask::Usable)
    }
}

/// Mask rule applied by the input transform.
///
/// Slots backed by a real camera frame are always flagged `true`; only filler slots
/// consult the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMaskPolicy {
    pub filler: FillerMask,
}

impl SlotMaskPolicy {
    pub fn new(filler: FillerMask) -> Self {
        Self { filler }
    }

    pub fn mask(&self, is_real: bool) -> bool {
        is_real || self.filler.flag()
    }
}

impl From<ModelVariant> for SlotMaskPolicy {
    fn from(variant: ModelVariant) -> Self {
        variant.mask_policy()
    }
}
