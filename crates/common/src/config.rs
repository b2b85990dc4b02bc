use serde::{Deserialize, Serialize};

/// What the planner entry point does with an internal-consistency failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InternalErrorPolicy {
    /// Return [`crate::MqError::Internal`] to the caller.
    Report,
    /// Panic with the failure message.
    Panic,
}

impl Default for InternalErrorPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            InternalErrorPolicy::Panic
        } else {
            InternalErrorPolicy::Report
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Reuse an existing internal select-list slot when a structurally equal
    /// column reference is pushed down again.
    pub dedup_pushdown: bool,
    /// Name grouped output columns from aliases / column names instead of
    /// emitting `"unnamed"` for every column.
    pub resolve_output_names: bool,
    pub internal_error_policy: InternalErrorPolicy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            dedup_pushdown: true,
            resolve_output_names: true,
            internal_error_policy: InternalErrorPolicy::default(),
        }
    }
}

impl PlannerConfig {
    /// Config that reports internal failures instead of panicking, regardless of build profile.
    pub fn reporting() -> Self {
        Self {
            internal_error_policy: InternalErrorPolicy::Report,
            ..Self::default()
        }
    }
}
