//! Purity metrics
//!
//! A purity metric scores how mixed the target labels of a set of observations
//! are (smaller is purer) and finds the best contiguous split of a node along a
//! single predictor. [`Gini`] is the metric shipped with the crate.
use crate::data::Observation;
use crate::errors::TreeError;
use crate::trees::node::DecisionTree;
use std::fmt::Debug;

/// Best split along one predictor: left side is `[0, index)`, right side is
/// `[index, n)` of the node's observations sorted by that predictor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitCandidate {
    pub index: usize,
    pub impurity: f64,
}

/// Strategy for measuring impurity and searching splits.
///
/// Implementations must be free of shared mutable state, since sibling
/// subtrees may be grown concurrently.
pub trait PurityMetric: Send + Sync + Debug {
    /// Impurity of an unordered set of observations. Must be finite and
    /// non-negative, and must not decrease as labels get more heterogeneous.
    fn slice_purity(&self, observations: &[Observation], target: &str) -> Result<f64, TreeError>;

    /// Sorts the node's observations by `predictor` and returns the split with
    /// the lowest combined impurity, or `None` if no split is eligible.
    fn split_purity(
        &self,
        predictor: &str,
        target: &str,
        node: &mut DecisionTree,
    ) -> Result<Option<SplitCandidate>, TreeError>;
}

/// Gini impurity for binary labels.
///
/// The label of the first observation of a set is the reference class; every
/// other label counts as the second class.
#[derive(Clone, Copy, Debug, Default)]
pub struct Gini;

impl Gini {
    /// `goods[i]` is the number of observations among the first `i` whose
    /// target equals the first observation's target. Empty input yields an
    /// empty vector, otherwise the result has `n + 1` entries.
    pub fn cumulative_good_counts(
        &self,
        observations: &[Observation],
        target: &str,
    ) -> Result<Vec<usize>, TreeError> {
        let first = match observations.first() {
            Some(first) => first.value(target)?,
            None => return Ok(Vec::new()),
        };

        let mut goods = Vec::with_capacity(observations.len() + 1);
        goods.push(0);
        let mut running = 0;
        for obs in observations {
            if first.eq_value(obs.value(target)?)? {
                running += 1;
            }
            goods.push(running);
        }
        Ok(goods)
    }
}

/// `1 - p² - (1 - p)²`, written as `2·p·q` so that mirrored class counts
/// give bit-identical scores.
fn gini(count: f64, good: f64) -> f64 {
    let p = good / count;
    let q = (count - good) / count;
    2.0 * p * q
}

impl PurityMetric for Gini {
    fn slice_purity(&self, observations: &[Observation], target: &str) -> Result<f64, TreeError> {
        let goods = self.cumulative_good_counts(observations, target)?;
        match goods.last() {
            Some(&good) => Ok(gini(observations.len() as f64, good as f64)),
            None => Ok(0.0),
        }
    }

    fn split_purity(
        &self,
        predictor: &str,
        target: &str,
        node: &mut DecisionTree,
    ) -> Result<Option<SplitCandidate>, TreeError> {
        node.sort_by_predictor(predictor)?;
        let min_split_size = node.options().min_split_size();
        let observations = node.observations();
        let goods = self.cumulative_good_counts(observations, target)?;

        let n = observations.len();
        let sum_good = match goods.last() {
            Some(&good) => good,
            None => return Ok(None),
        };

        let mut best: Option<SplitCandidate> = None;
        for (index, &good_left) in goods.iter().enumerate() {
            let (count_left, count_right) = (index, n - index);
            if count_left < min_split_size || count_right < min_split_size {
                continue;
            }
            // only boundaries between runs of equal predictor values are legal
            if index > 0 && index < n {
                let prev = observations[index - 1].value(predictor)?;
                let next = observations[index].value(predictor)?;
                if prev.eq_value(next)? {
                    continue;
                }
            }

            let good_right = sum_good - good_left;
            let weighted = count_left as f64 * gini(count_left as f64, good_left as f64)
                + count_right as f64 * gini(count_right as f64, good_right as f64);

            if best.map_or(true, |b| weighted < b.impurity) {
                best = Some(SplitCandidate {
                    index,
                    impurity: weighted,
                });
            }
        }

        Ok(best.map(|b| SplitCandidate {
            index: b.index,
            impurity: b.impurity / n as f64,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trees::node::tests::{fixture_options, fixture_observations, TARGET};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_slice_purity() {
        let observations = fixture_observations(&[]);
        let expected = [0.0, 0.0, 0.5, 0.44444, 0.5, 0.48];
        for (n, &e) in expected.iter().enumerate() {
            let got = Gini.slice_purity(&observations[..n], TARGET).unwrap();
            assert_abs_diff_eq!(got, e, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_slice_purity_empty_for_any_target() {
        assert_eq!(Gini.slice_purity(&[], "anything").unwrap(), 0.0);
    }

    #[test]
    fn test_slice_purity_bounds_and_zero_iff_homogeneous() {
        let labels: [&[f64]; 5] = [
            &[1.0, 1.0, 1.0],
            &[0.0],
            &[1.0, 0.0, 0.0, 0.0],
            &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
            &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
        ];
        for set in labels {
            let observations = set
                .iter()
                .map(|&t| Observation::new().with(TARGET, t))
                .collect::<Vec<_>>();
            let purity = Gini.slice_purity(&observations, TARGET).unwrap();
            assert!((0.0..=0.5).contains(&purity));
            let homogeneous = set.iter().all(|&t| t == set[0]);
            assert_eq!(purity == 0.0, homogeneous);
        }
    }

    #[test]
    fn test_signed_zero_labels_are_one_class() {
        let observations = [0.0, -0.0, 0.0, -0.0]
            .iter()
            .map(|&t| Observation::new().with(TARGET, t))
            .collect::<Vec<_>>();
        assert_eq!(Gini.slice_purity(&observations, TARGET).unwrap(), 0.0);
    }

    #[test]
    fn test_slice_purity_type_mismatch() {
        let observations = vec![
            Observation::new().with(TARGET, 1.0),
            Observation::new().with(TARGET, "1"),
        ];
        assert!(matches!(
            Gini.slice_purity(&observations, TARGET),
            Err(TreeError::Comparison { .. })
        ));
    }

    #[test]
    fn test_cumulative_good_counts() {
        let observations = fixture_observations(&[]);
        let goods = Gini.cumulative_good_counts(&observations, TARGET).unwrap();
        assert_eq!(goods, vec![0, 1, 1, 1, 2, 3]);
        assert!(Gini.cumulative_good_counts(&[], TARGET).unwrap().is_empty());
    }

    fn split_case(excluded: &[&str], predictor: &str, index: usize, impurity: f64) {
        let mut options = fixture_options();
        options.set_predictors(
            ["feature1", "feature2", "feature3"]
                .into_iter()
                .filter(|p| !excluded.contains(p)),
        );
        let mut node = DecisionTree::init_root(options, fixture_observations(excluded)).unwrap();
        let split = Gini.split_purity(predictor, TARGET, &mut node).unwrap().unwrap();
        assert_eq!(split.index, index);
        assert_abs_diff_eq!(split.impurity, impurity, epsilon = 1e-3);
    }

    #[test]
    fn test_split_purity_per_predictor() {
        split_case(&[], "feature1", 3, 0.26667);
        split_case(&[], "feature3", 3, 0.0);
        split_case(&["feature1", "feature3"], "feature2", 3, 0.26667);
        split_case(&["feature2", "feature3"], "feature1", 3, 0.26667);
        split_case(&["feature1", "feature2"], "feature3", 3, 0.0);
    }

    #[test]
    fn test_split_purity_sorts_node() {
        let mut node = DecisionTree::init_root(fixture_options(), fixture_observations(&[])).unwrap();
        Gini.split_purity("feature3", TARGET, &mut node).unwrap();
        let sorted = node
            .observations()
            .iter()
            .map(|o| o.get("feature3").and_then(|v| v.as_f64()).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(sorted, vec![-0.5, 7.47, 10.55, 15.0, 20.0]);
    }

    #[test]
    fn test_split_purity_not_worse_than_parent() {
        let mut node = DecisionTree::init_root(fixture_options(), fixture_observations(&[])).unwrap();
        let parent = Gini.slice_purity(node.observations(), TARGET).unwrap();
        for predictor in ["feature1", "feature2", "feature3"] {
            let split = Gini.split_purity(predictor, TARGET, &mut node).unwrap().unwrap();
            assert!(split.impurity <= parent);
        }
    }

    #[test]
    fn test_split_purity_skips_runs() {
        // the only boundary between distinct values leaves one observation on the right
        let observations = vec![
            Observation::new().with("x", 1.0).with(TARGET, 1.0),
            Observation::new().with("x", 1.0).with(TARGET, 0.0),
            Observation::new().with("x", 1.0).with(TARGET, 1.0),
            Observation::new().with("x", 2.0).with(TARGET, 0.0),
        ];
        let mut options = crate::trees::params::GrowOptions::new(TARGET, ["x"]);
        options.set_min_split_size(1).unwrap();
        let mut node = DecisionTree::init_root(options, observations).unwrap();
        let split = Gini.split_purity("x", TARGET, &mut node).unwrap().unwrap();
        assert_eq!(split.index, 3);

        let mut options = crate::trees::params::GrowOptions::new(TARGET, ["x"]);
        options.set_min_split_size(2).unwrap();
        let observations = node.observations().to_vec();
        let mut node = DecisionTree::init_root(options, observations).unwrap();
        assert_eq!(Gini.split_purity("x", TARGET, &mut node).unwrap(), None);
    }

    #[test]
    fn test_split_purity_min_split_size_filter() {
        let mut options = fixture_options();
        options.set_min_split_size(3).unwrap();
        let mut node = DecisionTree::init_root(options, fixture_observations(&[])).unwrap();
        assert_eq!(Gini.split_purity("feature3", TARGET, &mut node).unwrap(), None);
    }
}
