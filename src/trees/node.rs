use crate::data::{sort_by_attribute, Observation, Value};
use crate::errors::TreeError;
use crate::trees::params::GrowOptions;
use log::{debug, error, trace};
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Best split found across all predictors of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct BestSplit {
    pub predictor: String,
    pub index: usize,
    pub impurity: f64,
}

/// Decision rule of a single node.
///
/// Leaves only carry a classification, internal nodes only carry the split
/// predictor and value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rule<'a> {
    pub predictor: Option<&'a str>,
    pub split_value: Option<&'a Value>,
    pub classification: Option<&'a Value>,
}

/// A classification tree node.
///
/// Observations are owned by the node until it is split; the split moves them
/// into the two children, the parent only remembers how many it had.
#[derive(Debug)]
pub struct DecisionTree {
    observations: Vec<Observation>,
    n_observations: usize,
    options: Arc<GrowOptions>,
    depth: usize,

    left: Option<Box<DecisionTree>>,
    right: Option<Box<DecisionTree>>,

    split_predictor: Option<String>,
    split_value: Option<Value>,
    classification: Option<Value>,

    impurity: OnceCell<f64>,
    sorted_by: Option<String>,
}

impl DecisionTree {
    fn new_node(
        options: Arc<GrowOptions>,
        observations: Vec<Observation>,
        depth: usize,
        sorted_by: Option<String>,
    ) -> Self {
        Self {
            n_observations: observations.len(),
            observations,
            options,
            depth,
            left: None,
            right: None,
            split_predictor: None,
            split_value: None,
            classification: None,
            impurity: OnceCell::new(),
            sorted_by,
        }
    }

    /// Creates the root of a new tree.
    ///
    /// # Errors
    ///
    /// Fails if an observation lacks one of the configured predictors or the
    /// target attribute. An empty observation set is accepted as is.
    pub fn init_root(
        options: impl Into<Arc<GrowOptions>>,
        observations: Vec<Observation>,
    ) -> Result<Self, TreeError> {
        let options = options.into();
        for (index, obs) in observations.iter().enumerate() {
            if let Some(predictor) = options.predictors().iter().find(|p| !obs.contains(p)) {
                return Err(TreeError::MissingPredictor {
                    predictor: predictor.clone(),
                    observation: index,
                });
            }
            obs.value(options.target_attribute())?;
        }
        Ok(Self::new_node(options, observations, 0, None))
    }

    /// Impurity of the node's observations under the configured metric.
    ///
    /// Computed on the first call and memoized for the node's lifetime.
    pub fn impurity(&self) -> Result<f64, TreeError> {
        if let Some(&impurity) = self.impurity.get() {
            return Ok(impurity);
        }
        let impurity = self
            .options
            .split_strategy()
            .slice_purity(&self.observations, self.options.target_attribute())?;
        let written = self.impurity.set(impurity).is_ok();
        debug_assert!(written, "impurity is written once");
        Ok(impurity)
    }

    /// Sorts the observations by `predictor` unless they already are.
    pub fn sort_by_predictor(&mut self, predictor: &str) -> Result<(), TreeError> {
        if self.sorted_by.as_deref() == Some(predictor) {
            return Ok(());
        }
        sort_by_attribute(&mut self.observations, predictor)?;
        self.sorted_by = Some(predictor.to_string());
        Ok(())
    }

    /// Tests every configured predictor and returns the split with the lowest
    /// combined impurity, or `None` if no predictor admits a split.
    ///
    /// Leaves the observations sorted by the last predictor evaluated.
    pub fn find_best_split(&mut self) -> Result<Option<BestSplit>, TreeError> {
        let options = Arc::clone(&self.options);
        let target = options.target_attribute();
        let mut best: Option<BestSplit> = None;

        for predictor in options.predictors() {
            let candidate = options.split_strategy().split_purity(predictor, target, self)?;
            if let Some(candidate) = candidate {
                if best.as_ref().map_or(true, |b| candidate.impurity < b.impurity) {
                    best = Some(BestSplit {
                        predictor: predictor.clone(),
                        index: candidate.index,
                        impurity: candidate.impurity,
                    });
                }
            }
        }
        Ok(best)
    }

    fn is_growable(&self) -> Result<bool, TreeError> {
        let impurity = self.impurity()?;
        let options = &self.options;

        let too_deep = self.depth >= options.max_depth();
        let pure_enough = impurity < options.max_split_impurity();
        let too_specific = self.observations.len() < options.min_split_size();
        Ok(!too_deep && !pure_enough && !too_specific)
    }

    /// Grows the subtree rooted at this node, or classifies the node.
    ///
    /// With `auto` the node is split on the best predictor and the children
    /// are expanded recursively until the whole subtree is grown; nodes where
    /// the stop conditions hold or no split exists become leaves classified by
    /// majority vote. Without `auto` the node is classified by majority vote
    /// right away. Calling it again on an expanded node only continues into the
    /// children (with `auto`).
    pub fn expand(&mut self, auto: bool) -> Result<(), TreeError> {
        if self.is_expanded() {
            return if auto { self.expand_children() } else { Ok(()) };
        }

        let growable = self.is_growable()?;
        if !auto || !growable {
            return self.make_leaf();
        }
        if self.split_best()? {
            self.expand_children()
        } else {
            self.make_leaf()
        }
    }

    /// Decides this node only: splits it on the best predictor if the stop
    /// conditions allow and a split exists, otherwise classifies it by
    /// majority vote. The children are left unexpanded so growth can be driven
    /// level by level. Does nothing on an expanded node.
    pub fn split_once(&mut self) -> Result<(), TreeError> {
        if self.is_expanded() {
            return Ok(());
        }
        if self.is_growable()? && self.split_best()? {
            return Ok(());
        }
        self.make_leaf()
    }

    fn split_best(&mut self) -> Result<bool, TreeError> {
        match self.find_best_split()? {
            None => Ok(false),
            Some(best) => {
                self.split_at(&best.predictor, best.index)?;
                debug!(
                    "Split node at depth {} on '{}' at index {} (impurity {:.5}).",
                    self.depth, best.predictor, best.index, best.impurity
                );
                Ok(true)
            }
        }
    }

    fn expand_children(&mut self) -> Result<(), TreeError> {
        let parallel = self.options.parallel();
        match (self.left.as_deref_mut(), self.right.as_deref_mut()) {
            (Some(left), Some(right)) if parallel => {
                let (left_result, right_result) =
                    rayon::join(|| left.expand(true), || right.expand(true));
                left_result?;
                right_result
            }
            (left, right) => {
                if let Some(left) = left {
                    left.expand(true)?;
                }
                if let Some(right) = right {
                    right.expand(true)?;
                }
                Ok(())
            }
        }
    }

    fn make_leaf(&mut self) -> Result<(), TreeError> {
        let vote = self.majority_vote()?;
        trace!(
            "Leaf at depth {} with {} observations classified as {}.",
            self.depth,
            self.observations.len(),
            vote
        );
        self.classification = Some(vote);
        Ok(())
    }

    /// Most frequent target value among the node's observations. Ties go to
    /// the value seen first.
    pub fn majority_vote(&self) -> Result<Value, TreeError> {
        if self.observations.is_empty() {
            return Err(TreeError::EmptyNode);
        }
        let target = self.options.target_attribute();

        let mut tally: Vec<(&Value, usize)> = Vec::new();
        for obs in &self.observations {
            let value = obs.value(target)?;
            let mut seen_at = None;
            for (i, (seen, _)) in tally.iter().enumerate() {
                if seen.eq_value(value)? {
                    seen_at = Some(i);
                    break;
                }
            }
            match seen_at {
                Some(i) => tally[i].1 += 1,
                None => tally.push((value, 1)),
            }
        }

        let mut best: Option<(&Value, usize)> = None;
        for &(value, count) in &tally {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((value, count));
            }
        }
        best.map(|(value, _)| value.clone()).ok_or(TreeError::EmptyNode)
    }

    /// Splits the observations sorted by `predictor` into `[0, index)` for the
    /// left child and `[index, n)` for the right child.
    pub(crate) fn split_at(&mut self, predictor: &str, index: usize) -> Result<(), TreeError> {
        let len = self.observations.len();
        if index == 0 || index >= len {
            error!("Refusing to split a node of {} observations at index {}.", len, index);
            return Err(TreeError::InvalidSplitIndex { index, len });
        }
        // the parent keeps its impurity once the observations move out
        self.impurity()?;
        self.sort_by_predictor(predictor)?;
        let split_value = self.observations[index].value(predictor)?.clone();

        let right = self.observations.split_off(index);
        let left = std::mem::take(&mut self.observations);
        let sorted_by = Some(predictor.to_string());
        let depth = self.depth + 1;

        self.left = Some(Box::new(Self::new_node(
            Arc::clone(&self.options),
            left,
            depth,
            sorted_by.clone(),
        )));
        self.right = Some(Box::new(Self::new_node(
            Arc::clone(&self.options),
            right,
            depth,
            sorted_by,
        )));
        self.split_predictor = Some(predictor.to_string());
        self.split_value = Some(split_value);
        self.sorted_by = None;
        Ok(())
    }

    /// Returns the classification for a new observation.
    pub fn classify(&self, observation: &Observation) -> Result<Value, TreeError> {
        match (
            self.split_predictor.as_deref(),
            self.split_value.as_ref(),
            self.left.as_deref(),
            self.right.as_deref(),
        ) {
            (Some(predictor), Some(split_value), Some(left), Some(right)) => {
                if observation.value(predictor)?.lt(split_value)? {
                    left.classify(observation)
                } else {
                    right.classify(observation)
                }
            }
            _ => self
                .classification
                .clone()
                .ok_or(TreeError::UnexpandedNode { depth: self.depth }),
        }
    }

    pub fn rule(&self) -> Rule<'_> {
        if self.is_leaf() {
            Rule {
                predictor: None,
                split_value: None,
                classification: self.classification.as_ref(),
            }
        } else {
            Rule {
                predictor: self.split_predictor.as_deref(),
                split_value: self.split_value.as_ref(),
                classification: None,
            }
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// True once the node was either split or classified.
    pub fn is_expanded(&self) -> bool {
        self.classification.is_some() || self.split_predictor.is_some()
    }

    pub fn left(&self) -> Option<&DecisionTree> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&DecisionTree> {
        self.right.as_deref()
    }

    pub fn left_mut(&mut self) -> Option<&mut DecisionTree> {
        self.left.as_deref_mut()
    }

    pub fn right_mut(&mut self) -> Option<&mut DecisionTree> {
        self.right.as_deref_mut()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn options(&self) -> &GrowOptions {
        &self.options
    }

    pub fn split_predictor(&self) -> Option<&str> {
        self.split_predictor.as_deref()
    }

    pub fn split_value(&self) -> Option<&Value> {
        self.split_value.as_ref()
    }

    pub fn classification(&self) -> Option<&Value> {
        self.classification.as_ref()
    }

    /// Number of observations the node held before any split.
    pub fn n_observations(&self) -> usize {
        self.n_observations
    }

    /// Observations owned by this node; empty for internal nodes.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// All observations of the subtree, left to right.
    pub fn all_observations(&self) -> Vec<&Observation> {
        let mut out = self.observations.iter().collect::<Vec<_>>();
        if let Some(left) = self.left() {
            out.extend(left.all_observations());
        }
        if let Some(right) = self.right() {
            out.extend(right.all_observations());
        }
        out
    }

    /// Leaves of the subtree, left to right.
    pub fn leaves(&self) -> Vec<&DecisionTree> {
        if self.is_leaf() {
            return vec![self];
        }
        let mut leaves = Vec::new();
        if let Some(left) = self.left() {
            leaves.extend(left.leaves());
        }
        if let Some(right) = self.right() {
            leaves.extend(right.leaves());
        }
        leaves
    }

    /// Distinct predictors used by the splits of the subtree, sorted by name.
    pub fn used_predictors(&self) -> Vec<String> {
        let mut used = BTreeSet::new();
        self.collect_predictors(&mut used);
        used.into_iter().map(str::to_string).collect()
    }

    fn collect_predictors<'a>(&'a self, used: &mut BTreeSet<&'a str>) {
        if let Some(predictor) = self.split_predictor.as_deref() {
            used.insert(predictor);
        }
        for child in [self.left(), self.right()].into_iter().flatten() {
            child.collect_predictors(used);
        }
    }

    /// Depth of the deepest leaf, relative to the tree root.
    pub fn height(&self) -> usize {
        self.leaves()
            .iter()
            .map(|leaf| leaf.depth)
            .max()
            .unwrap_or(self.depth)
    }

    pub fn n_nodes(&self) -> usize {
        1 + [self.left(), self.right()]
            .into_iter()
            .flatten()
            .map(DecisionTree::n_nodes)
            .sum::<usize>()
    }
}
