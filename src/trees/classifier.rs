//! Decision Tree Classifier
use crate::data::{Observation, Value};
use crate::errors::TreeError;
use crate::metrics::confusion::ClassificationMetrics;
use crate::trees::export::SerializedTree;
use crate::trees::node::DecisionTree;
use crate::trees::params::GrowOptions;
use log::info;
use std::sync::Arc;

/// Decision Tree Classifier
///
/// Owns the grow options and, once fitted, the root of the grown tree.
#[derive(Debug)]
pub struct DecisionTreeClassifier {
    root: Option<DecisionTree>,
    options: Arc<GrowOptions>,
}

impl ClassificationMetrics for DecisionTreeClassifier {}

impl DecisionTreeClassifier {
    /// Creates a new, unfitted classifier.
    ///
    /// # Arguments
    ///
    /// * `options` - Stop conditions, metric, target attribute and predictors.
    pub fn new(options: GrowOptions) -> Self {
        Self {
            root: None,
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &GrowOptions {
        &self.options
    }

    /// The grown tree, if the classifier was fitted.
    pub fn root(&self) -> Option<&DecisionTree> {
        self.root.as_ref()
    }

    /// Grows a full tree from the observations, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Fails if an observation lacks a predictor or the target, if labels of
    /// different representations are mixed, or if `observations` is empty.
    pub fn fit(&mut self, observations: Vec<Observation>) -> Result<(), TreeError> {
        let mut root = DecisionTree::init_root(Arc::clone(&self.options), observations)?;
        root.expand(true)?;
        info!(
            "Finished building the tree: {} nodes, height {}, predictors used: {:?}.",
            root.n_nodes(),
            root.height(),
            root.used_predictors()
        );
        self.root = Some(root);
        Ok(())
    }

    /// Predicts the labels for new observations.
    ///
    /// # Errors
    ///
    /// Fails if the classifier wasn't fitted yet, or if an observation cannot
    /// be routed through the tree.
    pub fn predict(&self, observations: &[Observation]) -> Result<Vec<Value>, TreeError> {
        let root = self.root.as_ref().ok_or(TreeError::NotFitted)?;
        observations.iter().map(|obs| root.classify(obs)).collect()
    }

    /// The fitted tree in its nested record form.
    pub fn to_serialized(&self) -> Result<SerializedTree, TreeError> {
        self.root
            .as_ref()
            .map(DecisionTree::to_serialized)
            .ok_or(TreeError::NotFitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::train_test_split;
    use crate::trees::node::tests::{fixture_options, fixture_observations, TARGET};

    fn labels(observations: &[Observation]) -> Vec<Value> {
        observations
            .iter()
            .map(|o| o.get(TARGET).unwrap().clone())
            .collect()
    }

    fn banded_observations(n: usize) -> Vec<Observation> {
        (0..n)
            .map(|i| {
                let score = (i % 100) as f64;
                let age = ((i * 37) % 80) as f64;
                let label = if score >= 40.0 && age < 60.0 { "approve" } else { "reject" };
                Observation::new()
                    .with("score", score)
                    .with("age", age)
                    .with("member", i % 3 == 0)
                    .with(TARGET, label)
            })
            .collect()
    }

    #[test]
    fn test_predict_before_fit() {
        let classifier = DecisionTreeClassifier::new(fixture_options());
        assert!(matches!(
            classifier.predict(&fixture_observations(&[])),
            Err(TreeError::NotFitted)
        ));
        assert!(classifier.to_serialized().is_err());
        assert!(classifier.root().is_none());
    }

    #[test]
    fn test_fit_predict_fixture() {
        let mut classifier = DecisionTreeClassifier::new(fixture_options());
        classifier.fit(fixture_observations(&[])).unwrap();

        let observations = fixture_observations(&[]);
        let predictions = classifier.predict(&observations).unwrap();
        assert_eq!(predictions, labels(&observations));
        assert_eq!(classifier.accuracy(&labels(&observations), &predictions).unwrap(), 1.0);
        assert_eq!(
            classifier.to_serialized().unwrap().split_on.as_deref(),
            Some("feature3")
        );
    }

    #[test]
    fn test_fit_empty_fails() {
        let mut classifier = DecisionTreeClassifier::new(fixture_options());
        assert!(matches!(classifier.fit(Vec::new()), Err(TreeError::EmptyNode)));
        assert!(classifier.root().is_none());
    }

    #[test]
    fn test_held_out_accuracy() {
        let (train, test) = train_test_split(banded_observations(1000), 0.8, Some(7)).unwrap();
        let mut options = GrowOptions::with_params(TARGET, ["score", "age", "member"], 5, 0.0, 12).unwrap();
        options.set_parallel(true);

        let mut classifier = DecisionTreeClassifier::new(options);
        classifier.fit(train).unwrap();
        let predictions = classifier.predict(&test).unwrap();
        let accuracy = classifier.accuracy(&labels(&test), &predictions).unwrap();
        assert!(accuracy > 0.95, "accuracy was {}", accuracy);

        let used = classifier.root().unwrap().used_predictors();
        assert!(used.contains(&"score".to_string()));
        assert!(used.contains(&"age".to_string()));
    }
}
