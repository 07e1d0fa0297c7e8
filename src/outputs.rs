//! Model action chunk -> robot action chunk.

use ndarray::{s, Array2, ArrayD, Ix2};

use crate::error::TransformError;
use crate::ACTION_DIM;

/// Actions the arm executes: `(T, 7)`, six joint targets plus the gripper.
pub type RobotAction = Array2<f32>;

/// Keeps the leading action dimensions the robot actuates and drops the model's padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputTransform {
    action_dim: usize,
}

impl Default for OutputTransform {
    fn default() -> Self {
        Self {
            action_dim: ACTION_DIM,
        }
    }
}

impl OutputTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action_dim(action_dim: usize) -> Self {
        Self { action_dim }
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    pub fn apply(&self, actions: &ArrayD<f32>) -> Result<RobotAction, TransformError> {
        let actions = actions.view().into_dimensionality::<Ix2>().map_err(|_| {
            TransformError::shape(format!(
                "expected a 2-D action chunk, got shape {:?}",
                actions.shape()
            ))
        })?;
        if actions.ncols() < self.action_dim {
            return Err(TransformError::shape(format!(
                "model produced {} action dims, robot needs {}",
                actions.ncols(),
                self.action_dim
            )));
        }
        Ok(actions.slice(s![.., ..self.action_dim]).to_owned())
    }
}
