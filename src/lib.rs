//! Policy I/O transforms for a single-arm UR5e.
//!
//! This crate defines:
//! - [`InputTransform`]: turns a [`RawObservation`] (joints, gripper, two cameras, prompt)
//!   into the fixed-schema [`CanonicalInput`] a trained policy consumes.
//! - [`OutputTransform`]: cuts the policy's padded action chunk down to the arm's 7 actuated
//!   dimensions.
//! - [`Policy`]: the async contract a model runner implements, plus [`TransformedPolicy`]
//!   and [`PolicyRecorder`] built on top of it.

mod config;
mod error;
mod image;
mod inputs;
mod outputs;
mod policy;
mod recorder;
mod schema;
mod state;
mod trace;
mod variant;

use ndarray::{arr1, Array, Array3};
use rand::Rng;

pub use config::TransformConfig;
pub use error::{PolicyError, TransformError};
pub use image::{normalize_image, RawImage, IMAGE_CHANNELS};
pub use inputs::InputTransform;
pub use outputs::{OutputTransform, RobotAction};
pub use policy::{Policy, PolicyOutput, SampleParams, TransformedPolicy};
pub use recorder::{PolicyRecorder, RecordedStep};
pub use schema::{CanonicalInput, ImageSlot, Prompt, RawObservation, SlotMap};
pub use state::{compose_state, State};
pub use trace::{CaptureSink, InputSummary, NoopSink, TraceSink, TracingSink};
pub use variant::{FillerMask, ModelVariant, SlotMaskPolicy};

/// Length of the state vector: six joints plus the gripper.
pub const STATE_DIM: usize = 7;

/// Action dimensions the arm executes: six joint targets plus the gripper.
pub const ACTION_DIM: usize = 7;

/// Camera resolution the checkpoints were trained at.
///
/// Informational only: frames are never resized here.
pub const TARGET_IMAGE_HEIGHT: usize = 224;
pub const TARGET_IMAGE_WIDTH: usize = 224;

/// Creates a random observation for smoke tests and benchmarks.
pub fn make_example() -> RawObservation {
    let mut rng = rand::thread_rng();
    let base = random_frame(&mut rng);
    let wrist = random_frame(&mut rng);
    let joints: Vec<f32> = (0..STATE_DIM - 1).map(|_| rng.gen::<f32>()).collect();

    RawObservation {
        joints: arr1(&joints).into_dyn(),
        gripper: Some(arr1(&[rng.gen::<f32>()]).into_dyn()),
        base_image: RawImage::from(base),
        wrist_image: RawImage::from(wrist),
        actions: None,
        prompt: Some(Prompt::from("do something")),
    }
}

fn random_frame(rng: &mut impl Rng) -> Array3<u8> {
    Array::from_shape_fn(
        (TARGET_IMAGE_HEIGHT, TARGET_IMAGE_WIDTH, IMAGE_CHANNELS),
        |_| rng.gen::<u8>(),
    )
}
