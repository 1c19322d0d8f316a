pub mod classifier;
pub mod export;
pub mod node;
pub mod params;
pub mod purity;

pub use classifier::DecisionTreeClassifier;
pub use export::SerializedTree;
pub use node::{BestSplit, DecisionTree, Rule};
pub use params::GrowOptions;
pub use purity::{Gini, PurityMetric, SplitCandidate};
