use crate::data::value::Value;
use crate::errors::TreeError;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A labeled (or unlabeled) record: attribute name to value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation(HashMap<String, Value>);

impl Observation {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.insert(attribute, value);
        self
    }

    /// Inserts or replaces the value of an attribute, returning the old one.
    pub fn insert(&mut self, attribute: &str, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(attribute.to_string(), value.into())
    }

    pub fn remove(&mut self, attribute: &str) -> Option<Value> {
        self.0.remove(attribute)
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    /// Like [`Observation::get`], but a missing attribute is an error.
    pub fn value(&self, attribute: &str) -> Result<&Value, TreeError> {
        self.0
            .get(attribute)
            .ok_or_else(|| TreeError::MissingAttribute(attribute.to_string()))
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.0.contains_key(attribute)
    }

    /// Attribute names sorted alphabetically.
    pub fn attributes(&self) -> Vec<&str> {
        let mut names = self.0.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Observation {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Stable ascending sort of `observations` by the value of `attribute`.
///
/// Every observation must carry the attribute and all values must share one
/// representation; otherwise an error is returned and the slice is untouched.
pub fn sort_by_attribute(
    observations: &mut [Observation],
    attribute: &str,
) -> Result<(), TreeError> {
    if let Some(first) = observations.first() {
        let first = first.value(attribute)?;
        for obs in observations.iter() {
            first.cmp_value(obs.value(attribute)?)?;
        }
    }

    observations.sort_by(|a, b| match (a.get(attribute), b.get(attribute)) {
        (Some(l), Some(r)) => l.cmp_value(r).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    });
    Ok(())
}

/// Shuffles the observations and splits them into a train and a test part.
pub fn train_test_split(
    mut observations: Vec<Observation>,
    train_size: f64,
    seed: Option<u64>,
) -> Result<(Vec<Observation>, Vec<Observation>), TreeError> {
    if !(0.0..=1.0).contains(&train_size) {
        return Err(TreeError::InvalidParameter(
            "train_size".to_string(),
            "a value between 0.0 and 1.0".to_string(),
            train_size.to_string(),
        ));
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    observations.shuffle(&mut rng);
    let train_len = (observations.len() as f64 * train_size).floor() as usize;
    let test = observations.split_off(train_len);
    Ok((observations, test))
}
