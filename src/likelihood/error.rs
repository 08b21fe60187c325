//! Error types of the likelihood engine and its configuration.

use crate::model::VertexIndex;

/// Errors aborting a likelihood evaluation.
///
/// Invalid parameter values (negative rates) are not errors; they evaluate
/// to an infinite negative log-likelihood instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LikelihoodError {
    #[error("Tip {vertex} (`{label}`) has no observed state")]
    MissingTipState { vertex: VertexIndex, label: String },
    #[error("Tip {vertex} has a continuous state, Mk2 needs discrete states")]
    NonDiscreteTipState { vertex: VertexIndex },
    #[error("State {state} of tip {vertex} is not a binary state")]
    TipStateOutOfRange { vertex: VertexIndex, state: usize },
    #[error("Vertex {vertex} has no branch length")]
    MissingBranchLength { vertex: VertexIndex },
    #[error("Vertex {vertex} has no time, needed for time-windowed rates")]
    MissingTime { vertex: VertexIndex },
    #[error("Expected {expected} rate parameters, got {got}")]
    InvalidParameterCount { expected: usize, got: usize },
    #[error("Fixed rate index {0} out of range (must be 0 or 1)")]
    InvalidFixedRateIndex(usize),
    #[error("Tree has no root")]
    EmptyTree,
}

/// Errors in the configuration of a likelihood model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown root prior `{0}`; use stationary, uniform, condlike or explicit weights")]
    UnknownRootPrior(String),
    #[error("Root prior needs one weight per state (2), got {0}")]
    InvalidRootWeights(usize),
}
