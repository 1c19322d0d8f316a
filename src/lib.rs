//! # cartree
//!
//! `cartree` grows binary classification trees from labeled observations by
//! recursive, purity-driven partitioning (CART with Gini impurity), classifies
//! new observations with the grown tree and exports it as a nested record.
//!
//! ## Example Usage
//!
//! ```rust
//! use cartree::data::{Observation, Value};
//! use cartree::trees::{DecisionTree, GrowOptions};
//!
//! let observations = vec![
//!     Observation::new().with("size", 1.0).with("label", "small"),
//!     Observation::new().with("size", 2.0).with("label", "small"),
//!     Observation::new().with("size", 8.0).with("label", "large"),
//!     Observation::new().with("size", 9.0).with("label", "large"),
//! ];
//! let options = GrowOptions::with_params("label", ["size"], 1, 0.0, 5).unwrap();
//!
//! let mut tree = DecisionTree::init_root(options, observations).unwrap();
//! tree.expand(true).unwrap();
//!
//! let query = Observation::new().with("size", 8.5);
//! assert_eq!(tree.classify(&query).unwrap(), Value::from("large"));
//! println!("{}", tree.serialized_model().unwrap());
//! ```

/// Observations and their attribute values
pub mod data;
/// Error type of the crate
pub mod errors;
/// Functions for evaluating classification performance
pub mod metrics;
/// Decision trees
pub mod trees;

pub use errors::TreeError;
pub use trees::{DecisionTree, DecisionTreeClassifier, GrowOptions};
