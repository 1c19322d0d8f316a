pub mod observation;
pub mod value;

pub use observation::{sort_by_attribute, train_test_split, Observation};
pub use value::Value;
