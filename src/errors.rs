//! Errors
//!
//! Custom error type used throughout the `cartree` crate.
use thiserror::Error;

/// Errors that can occur while growing, querying or exporting a tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Two values of different (or unsupported) representations were compared.
    #[error("Cannot compare a {left} value with a {right} value.")]
    Comparison {
        left: &'static str,
        right: &'static str,
    },
    /// An observation passed to the root lacks a configured predictor.
    #[error("Observation number {observation} has no value for predictor '{predictor}'.")]
    MissingPredictor {
        predictor: String,
        observation: usize,
    },
    /// An attribute needed for the operation is absent from an observation.
    #[error("Observation has no value for attribute '{0}'.")]
    MissingAttribute(String),
    /// Majority vote attempted on a node without observations.
    #[error("Cannot vote on an empty node.")]
    EmptyNode,
    /// Split boundary outside of the node's observations.
    #[error("Invalid split index {index} for a node with {len} observations.")]
    InvalidSplitIndex { index: usize, len: usize },
    /// Classification reached a node that was never expanded.
    #[error("Reached an unexpanded node at depth {depth}.")]
    UnexpandedNode { depth: usize },
    /// The estimator was used before being fitted.
    #[error("Tree wasn't built yet.")]
    NotFitted,
    /// Labels and predictions of different sizes.
    #[error("Predictions and labels are of different sizes ({0} and {1}).")]
    LengthMismatch(usize, usize),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Model could not be encoded as JSON.
    #[error("Unable to serialize model: {0}")]
    Serialization(#[from] serde_json::Error),
}
