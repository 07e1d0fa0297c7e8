//! Recording and replay of model calls for offline debugging.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::policy::{Policy, PolicyOutput, SampleParams};
use crate::schema::CanonicalInput;
use crate::trace::InputSummary;

const STEPS_TREE: &str = "steps";

/// One recorded call: what went into the model and what came out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedStep {
    pub step: u64,
    pub timestamp_ms: u64,
    pub params: SampleParams,
    pub input: CanonicalInput,
    pub output: PolicyOutput,
}

/// Wraps a policy and persists every call to an embedded Sled store.
///
/// The recorder is itself a [`Policy`], so it can sit anywhere the wrapped policy would.
pub struct PolicyRecorder<P> {
    inner: P,
    db: sled::Db,
}

impl<P> std::fmt::Debug for PolicyRecorder<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRecorder")
            .field("steps", &self.len().ok())
            .finish_non_exhaustive()
    }
}

impl<P: Policy> PolicyRecorder<P> {
    /// Opens (or creates) a recording directory.
    pub fn open(inner: P, path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let db = sled::open(path)?;
        Ok(Self::from_db(inner, db))
    }

    /// Records into a store that is removed when the recorder is dropped.
    pub fn temporary(inner: P) -> Result<Self, PolicyError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self::from_db(inner, db))
    }

    pub fn from_db(inner: P, db: sled::Db) -> Self {
        Self { inner, db }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P> PolicyRecorder<P> {
    /// Number of recorded steps.
    pub fn len(&self) -> Result<usize, PolicyError> {
        Ok(self.db.open_tree(STEPS_TREE)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, PolicyError> {
        Ok(self.len()? == 0)
    }

    /// Returns all recorded steps in call order.
    pub fn replay(&self) -> Result<Vec<RecordedStep>, PolicyError> {
        let tree = self.db.open_tree(STEPS_TREE)?;
        tree.iter()
            .map(|entry| {
                let (_, value) = entry?;
                Ok(serde_json::from_slice::<RecordedStep>(&value)?)
            })
            .collect()
    }
}

fn persist(db: sled::Db, step: RecordedStep) -> Result<(), PolicyError> {
    let tree = db.open_tree(STEPS_TREE)?;
    // Zero padded so lexicographic order is call order.
    let key = format!("{:020}", step.step);
    let value = serde_json::to_vec(&step)?;
    tree.insert(key.as_bytes(), value)?;
    tree.flush()?;
    Ok(())
}

#[async_trait]
impl<P: Policy> Policy for PolicyRecorder<P> {
    async fn infer(
        &self,
        input: &CanonicalInput,
        params: &SampleParams,
    ) -> Result<PolicyOutput, PolicyError> {
        let output = self.inner.infer(input, params).await?;

        let step = RecordedStep {
            step: self.db.generate_id()?,
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis() as u64)
                .unwrap_or(0),
            params: *params,
            input: input.clone(),
            output: output.clone(),
        };
        tracing::debug!(
            step = step.step,
            summary = %InputSummary::from(input),
            "recording policy step"
        );

        let db = self.db.clone();
        tokio::task::spawn_blocking(move || persist(db, step)).await??;
        Ok(output)
    }
}
