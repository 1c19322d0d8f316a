pub mod confusion;

pub use confusion::ClassificationMetrics;
