//! Raw observation -> canonical model input.

use std::fmt;
use std::sync::Arc;

use ndarray::Array3;

use crate::error::TransformError;
use crate::image::normalize_image;
use crate::schema::{CanonicalInput, ImageSlot, RawObservation, SlotMap};
use crate::state::compose_state;
use crate::trace::{TraceSink, TracingSink};
use crate::variant::{ModelVariant, SlotMaskPolicy};

/// Adapts single-arm observations (one base camera, one wrist camera) to the
/// three-camera input record.
///
/// The robot has no right wrist camera, so that slot is always a zero frame shaped like
/// the base frame; whether the model is told to look at it comes from the
/// [`SlotMaskPolicy`].
#[derive(Clone)]
pub struct InputTransform {
    mask_policy: SlotMaskPolicy,
    sink: Arc<dyn TraceSink>,
}

impl fmt::Debug for InputTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputTransform")
            .field("mask_policy", &self.mask_policy)
            .finish_non_exhaustive()
    }
}

impl InputTransform {
    pub fn new(variant: ModelVariant) -> Self {
        Self::with_mask_policy(variant.into())
    }

    pub fn with_mask_policy(mask_policy: SlotMaskPolicy) -> Self {
        Self {
            mask_policy,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replaces the sink that receives each built record.
    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn mask_policy(&self) -> SlotMaskPolicy {
        self.mask_policy
    }

    pub fn apply(&self, observation: &RawObservation) -> Result<CanonicalInput, TransformError> {
        let state = compose_state(&observation.joints, observation.gripper.as_ref())?;

        let base = normalize_image(&observation.base_image)?;
        let wrist = normalize_image(&observation.wrist_image)?;
        let filler = Array3::<u8>::zeros(base.raw_dim());

        let image = SlotMap::new(base, wrist, filler);
        let image_mask = image.map(|slot, _| self.mask_policy.mask(slot != ImageSlot::RightWrist));

        let prompt = observation
            .prompt
            .as_ref()
            .map(|prompt| prompt.decode())
            .transpose()?;

        let input = CanonicalInput::new(
            state,
            image,
            image_mask,
            prompt,
            observation.actions.clone(),
        )?;
        self.sink.record(&input);
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::RawImage;
    use crate::schema::Prompt;
    use crate::trace::{CaptureSink, NoopSink};
    use ndarray::{arr1, Array, Array2};
    use rand::Rng;

    fn random_frame() -> Array3<u8> {
        let mut rng = rand::thread_rng();
        Array::from_shape_fn((224, 224, 3), |_| rng.gen::<u8>())
    }

    fn observation() -> RawObservation {
        RawObservation {
            joints: arr1(&[0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0]).into_dyn(),
            gripper: None,
            base_image: RawImage::from(random_frame()),
            wrist_image: RawImage::from(random_frame()),
            actions: None,
            prompt: Some(Prompt::from("pick up the cup")),
        }
    }

    #[test]
    fn six_joint_observation_builds_canonical_record() {
        let obs = observation();
        let input = InputTransform::new(ModelVariant::Pi0).apply(&obs).unwrap();

        assert_eq!(input.state().as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 0.0]);
        for (_, image) in input.image().iter() {
            assert_eq!(image.shape(), &[224, 224, 3]);
        }
        assert_eq!(input.image_mask(), &SlotMap::new(true, true, false));
        assert_eq!(input.prompt(), Some("pick up the cup"));
        assert!(input.actions().is_none());

        let RawImage::U8(base) = &obs.base_image else {
            panic!("expected u8 frame");
        };
        assert_eq!(input.image().base.view().into_dyn(), base.view());
        assert!(input.image().right_wrist.iter().all(|&px| px == 0));
    }

    #[test]
    fn fast_variant_marks_filler_slot_usable() {
        let input = InputTransform::new(ModelVariant::Pi0Fast)
            .apply(&observation())
            .unwrap();
        assert_eq!(input.image_mask(), &SlotMap::new(true, true, true));
    }

    #[test]
    fn filler_matches_channel_first_base_after_normalization() {
        let mut obs = observation();
        obs.base_image = RawImage::from(Array3::<f32>::zeros((3, 10, 12)));
        let input = InputTransform::new(ModelVariant::Pi0).apply(&obs).unwrap();
        assert_eq!(input.image().base.shape(), &[10, 12, 3]);
        assert_eq!(input.image().right_wrist.shape(), &[10, 12, 3]);
    }

    #[test]
    fn absent_prompt_is_omitted() {
        let mut obs = observation();
        obs.prompt = None;
        let input = InputTransform::new(ModelVariant::Pi0).apply(&obs).unwrap();
        assert_eq!(input.prompt(), None);
        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("prompt").is_none());
    }

    #[test]
    fn byte_prompt_is_decoded() {
        let mut obs = observation();
        obs.prompt = Some(Prompt::Bytes(b"open the drawer".to_vec()));
        let input = InputTransform::new(ModelVariant::Pi0).apply(&obs).unwrap();
        assert_eq!(input.prompt(), Some("open the drawer"));
    }

    #[test]
    fn invalid_prompt_bytes_fail_the_call() {
        let mut obs = observation();
        obs.prompt = Some(Prompt::Bytes(vec![0xc3, 0x28]));
        let err = InputTransform::new(ModelVariant::Pi0).apply(&obs).unwrap_err();
        assert!(matches!(err, TransformError::Encoding(_)));
    }

    #[test]
    fn actions_are_carried_through() {
        let mut obs = observation();
        let actions = Array2::from_shape_fn((4, 7), |(t, d)| (t * 7 + d) as f32).into_dyn();
        obs.actions = Some(actions.clone());
        let input = InputTransform::new(ModelVariant::Pi0).apply(&obs).unwrap();
        assert_eq!(input.actions(), Some(&actions));
    }

    #[test]
    fn explicit_gripper_with_seven_joints_is_rejected() {
        let mut obs = observation();
        obs.joints = arr1(&[0.0f32; 7]).into_dyn();
        obs.gripper = Some(arr1(&[1.0f32]).into_dyn());
        let err = InputTransform::new(ModelVariant::Pi0).apply(&obs).unwrap_err();
        assert!(matches!(err, TransformError::Shape(_)));
    }

    #[test]
    fn sink_sees_the_returned_record() {
        let sink = CaptureSink::new();
        let transform = InputTransform::new(ModelVariant::Pi0).with_sink(Arc::new(sink.clone()));
        let input = transform.apply(&observation()).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, input.state().as_slice());
        assert_eq!(records[0].mask(ImageSlot::RightWrist), Some(false));
        assert_eq!(records[0].prompt.as_deref(), Some("pick up the cup"));
    }

    #[test]
    fn silenced_sink_leaves_the_record_unchanged() {
        let obs = observation();
        let traced = InputTransform::new(ModelVariant::Pi0Fast).apply(&obs).unwrap();
        let silent = InputTransform::new(ModelVariant::Pi0Fast)
            .with_sink(Arc::new(NoopSink))
            .apply(&obs)
            .unwrap();
        assert_eq!(silent, traced);
    }

    #[test]
    fn failed_call_is_not_traced() {
        let sink = CaptureSink::new();
        let transform = InputTransform::new(ModelVariant::Pi0).with_sink(Arc::new(sink.clone()));
        let mut obs = observation();
        obs.joints = arr1(&[0.0f32; 4]).into_dyn();
        assert!(transform.apply(&obs).is_err());
        assert!(sink.records().is_empty());
    }
}
