use crate::errors::TreeError;
use crate::trees::purity::{Gini, PurityMetric};
use std::sync::Arc;

/// Settings governing tree expansion and the related stop conditions.
///
/// A tree takes the options by `Arc` when its root is initialized, after which
/// they are shared read-only by every node of that tree.
#[derive(Clone, Debug)]
pub struct GrowOptions {
    min_split_size: usize,
    max_split_impurity: f64,
    max_depth: usize,
    split_strategy: Arc<dyn PurityMetric>,
    target_attribute: String,
    predictors: Vec<String>,
    parallel: bool,
}

impl GrowOptions {
    /// Creates options with default stop conditions and the Gini metric.
    pub fn new<S: Into<String>>(target_attribute: &str, predictors: impl IntoIterator<Item = S>) -> Self {
        Self {
            min_split_size: 2,
            max_split_impurity: 0.0,
            max_depth: 10,
            split_strategy: Arc::new(Gini),
            target_attribute: target_attribute.to_string(),
            predictors: predictors.into_iter().map(Into::into).collect(),
            parallel: false,
        }
    }

    /// Creates options with custom stop conditions.
    ///
    /// # Errors
    ///
    /// Fails if `min_split_size` is zero or `max_split_impurity` is negative or not finite.
    pub fn with_params<S: Into<String>>(
        target_attribute: &str,
        predictors: impl IntoIterator<Item = S>,
        min_split_size: usize,
        max_split_impurity: f64,
        max_depth: usize,
    ) -> Result<Self, TreeError> {
        let mut options = Self::new(target_attribute, predictors);
        options.set_min_split_size(min_split_size)?;
        options.set_max_split_impurity(max_split_impurity)?;
        options.set_max_depth(max_depth);
        Ok(options)
    }

    pub fn set_min_split_size(&mut self, min_split_size: usize) -> Result<(), TreeError> {
        if min_split_size < 1 {
            return Err(TreeError::InvalidParameter(
                "min_split_size".to_string(),
                "a value of at least 1".to_string(),
                min_split_size.to_string(),
            ));
        }
        self.min_split_size = min_split_size;
        Ok(())
    }

    pub fn set_max_split_impurity(&mut self, max_split_impurity: f64) -> Result<(), TreeError> {
        if !max_split_impurity.is_finite() || max_split_impurity < 0.0 {
            return Err(TreeError::InvalidParameter(
                "max_split_impurity".to_string(),
                "a finite, non-negative value".to_string(),
                max_split_impurity.to_string(),
            ));
        }
        self.max_split_impurity = max_split_impurity;
        Ok(())
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn set_split_strategy(&mut self, split_strategy: Arc<dyn PurityMetric>) {
        self.split_strategy = split_strategy;
    }

    pub fn set_predictors<S: Into<String>>(&mut self, predictors: impl IntoIterator<Item = S>) {
        self.predictors = predictors.into_iter().map(Into::into).collect();
    }

    /// Grow sibling subtrees on the rayon thread pool.
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    pub fn min_split_size(&self) -> usize {
        self.min_split_size
    }

    pub fn max_split_impurity(&self) -> f64 {
        self.max_split_impurity
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn split_strategy(&self) -> &dyn PurityMetric {
        self.split_strategy.as_ref()
    }

    pub fn target_attribute(&self) -> &str {
        &self.target_attribute
    }

    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}
