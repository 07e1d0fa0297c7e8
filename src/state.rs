//! Proprioceptive state composition.

use nalgebra::DVector;
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::STATE_DIM;

/// The joint + gripper state vector fed to the model.
///
/// Internally uses [`nalgebra::DVector<f32>`] so callers can do arm math on it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State(pub DVector<f32>);

impl State {
    pub fn from_slice(values: &[f32]) -> Self {
        Self(DVector::from_column_slice(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        self.0.as_slice()
    }
}

/// Builds the state vector from joint positions and an optional gripper reading.
///
/// With an explicit gripper the result is `joints ++ gripper` whatever the joint count;
/// the canonical length is checked by the input transform, not here. Without one,
/// 7 joints are taken to embed the gripper and 6 joints get a zero placeholder.
pub fn compose_state(
    joints: &ArrayD<f32>,
    gripper: Option<&ArrayD<f32>>,
) -> Result<State, TransformError> {
    if joints.ndim() != 1 {
        return Err(TransformError::shape(format!(
            "expected joints to be 1-D, got shape {:?}",
            joints.shape()
        )));
    }
    let mut values: Vec<f32> = joints.iter().copied().collect();

    match gripper {
        Some(gripper) => {
            // A scalar reading is promoted to a single element.
            if gripper.ndim() > 1 {
                return Err(TransformError::shape(format!(
                    "expected gripper position to be a scalar or 1-D, got shape {:?}",
                    gripper.shape()
                )));
            }
            values.extend(gripper.iter().copied());
        }
        None if values.len() == STATE_DIM => {}
        None if values.len() == STATE_DIM - 1 => values.push(0.0),
        None => {
            return Err(TransformError::shape(format!(
                "unexpected joint/state shape: {:?}",
                joints.shape()
            )));
        }
    }

    Ok(State(DVector::from_vec(values)))
}
