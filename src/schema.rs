//! Record schemas on both sides of the input transform.

use ndarray::{Array3, ArrayD};
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::image::RawImage;
use crate::state::State;
use crate::STATE_DIM;

/// A language instruction, either as text or as UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    Text(String),
    Bytes(Vec<u8>),
}

impl Prompt {
    /// Decodes the prompt to text, failing on invalid UTF-8.
    pub fn decode(&self) -> Result<String, TransformError> {
        match self {
            Prompt::Text(text) => Ok(text.clone()),
            Prompt::Bytes(bytes) => Ok(String::from_utf8(bytes.clone())?),
        }
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::Text(text.to_string())
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Prompt::Text(text)
    }
}

impl From<Vec<u8>> for Prompt {
    fn from(bytes: Vec<u8>) -> Self {
        Prompt::Bytes(bytes)
    }
}

/// One observation step as produced by the robot or a replayed dataset.
///
/// Keys not listed here are ignored when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Joint positions, 6 values or 7 with the gripper embedded.
    #[serde(rename = "observation/joints")]
    pub joints: ArrayD<f32>,

    /// Gripper position as a scalar or a 1-element array.
    #[serde(
        rename = "observation/gripper_position",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub gripper: Option<ArrayD<f32>>,

    #[serde(rename = "observation/base_rgb")]
    pub base_image: RawImage,

    #[serde(rename = "observation/wrist_rgb")]
    pub wrist_image: RawImage,

    /// Action chunk `(T, 7)` carried through for training-style replay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<ArrayD<f32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Prompt>,
}

/// The fixed camera positions the model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageSlot {
    Base,
    LeftWrist,
    RightWrist,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 3] = [ImageSlot::Base, ImageSlot::LeftWrist, ImageSlot::RightWrist];

    /// Key used for this slot in the model's input record.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSlot::Base => "base_0_rgb",
            ImageSlot::LeftWrist => "left_wrist_0_rgb",
            ImageSlot::RightWrist => "right_wrist_0_rgb",
        }
    }
}

/// Exactly one value per [`ImageSlot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMap<T> {
    #[serde(rename = "base_0_rgb")]
    pub base: T,
    #[serde(rename = "left_wrist_0_rgb")]
    pub left_wrist: T,
    #[serde(rename = "right_wrist_0_rgb")]
    pub right_wrist: T,
}

impl<T> SlotMap<T> {
    pub fn new(base: T, left_wrist: T, right_wrist: T) -> Self {
        Self {
            base,
            left_wrist,
            right_wrist,
        }
    }

    pub fn get(&self, slot: ImageSlot) -> &T {
        match slot {
            ImageSlot::Base => &self.base,
            ImageSlot::LeftWrist => &self.left_wrist,
            ImageSlot::RightWrist => &self.right_wrist,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageSlot, &T)> + '_ {
        ImageSlot::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(ImageSlot, &T) -> U) -> SlotMap<U> {
        SlotMap {
            base: f(ImageSlot::Base, &self.base),
            left_wrist: f(ImageSlot::LeftWrist, &self.left_wrist),
            right_wrist: f(ImageSlot::RightWrist, &self.right_wrist),
        }
    }
}

/// The fixed-schema record the model consumes.
///
/// Deserialization goes through [`CanonicalInput::new`], so replayed records obey the
/// same state length rule as freshly built ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CanonicalInputRepr")]
pub struct CanonicalInput {
    state: State,
    image: SlotMap<Array3<u8>>,
    image_mask: SlotMap<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actions: Option<ArrayD<f32>>,
}

#[derive(Deserialize)]
struct CanonicalInputRepr {
    state: State,
    image: SlotMap<Array3<u8>>,
    image_mask: SlotMap<bool>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    actions: Option<ArrayD<f32>>,
}

impl TryFrom<CanonicalInputRepr> for CanonicalInput {
    type Error = TransformError;

    fn try_from(repr: CanonicalInputRepr) -> Result<Self, Self::Error> {
        CanonicalInput::new(
            repr.state,
            repr.image,
            repr.image_mask,
            repr.prompt,
            repr.actions,
        )
    }
}

impl CanonicalInput {
    /// Assembles a record, rejecting a state vector that is not `STATE_DIM` long.
    pub fn new(
        state: State,
        image: SlotMap<Array3<u8>>,
        image_mask: SlotMap<bool>,
        prompt: Option<String>,
        actions: Option<ArrayD<f32>>,
    ) -> Result<Self, TransformError> {
        if state.len() != STATE_DIM {
            return Err(TransformError::shape(format!(
                "state vector must have {STATE_DIM} values, got {}",
                state.len()
            )));
        }
        Ok(Self {
            state,
            image,
            image_mask,
            prompt,
            actions,
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn image(&self) -> &SlotMap<Array3<u8>> {
        &self.image
    }

    pub fn image_mask(&self) -> &SlotMap<bool> {
        &self.image_mask
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn actions(&self) -> Option<&ArrayD<f32>> {
        self.actions.as_ref()
    }
}
