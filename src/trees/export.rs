//! Tree export
//!
//! A grown tree can be exported as a nested [`SerializedTree`] record (and from
//! there as JSON), or rendered as a human-readable dump for diagnostics.
use crate::data::{Observation, Value};
use crate::errors::TreeError;
use crate::trees::node::DecisionTree;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter, Write};

/// Nested record form of a tree.
///
/// Internal nodes carry `splitOn` and `splitValue`, leaves carry
/// `classification`. Fields that do not apply to a node are omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedTree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_less_or_equal: Option<Box<SerializedTree>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_greater: Option<Box<SerializedTree>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Value>,
}

impl SerializedTree {
    /// Classifies an observation with the same rule as [`DecisionTree::classify`].
    pub fn classify(&self, observation: &Observation) -> Result<Value, TreeError> {
        let mut node = self;
        let mut depth = 0;
        loop {
            let next = match (
                node.split_on.as_deref(),
                node.split_value.as_ref(),
                node.if_less_or_equal.as_deref(),
                node.if_greater.as_deref(),
            ) {
                (Some(predictor), Some(split_value), Some(left), Some(right)) => {
                    if observation.value(predictor)?.lt(split_value)? {
                        left
                    } else {
                        right
                    }
                }
                _ => {
                    return node
                        .classification
                        .clone()
                        .ok_or(TreeError::UnexpandedNode { depth })
                }
            };
            node = next;
            depth += 1;
        }
    }

    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl DecisionTree {
    pub fn to_serialized(&self) -> SerializedTree {
        let mut model = SerializedTree::default();
        if self.is_leaf() {
            model.classification = self.classification().cloned();
        } else {
            model.split_on = self.split_predictor().map(str::to_string);
            model.split_value = self.split_value().cloned();
        }
        model.if_less_or_equal = self.left().map(|left| Box::new(left.to_serialized()));
        model.if_greater = self.right().map(|right| Box::new(right.to_serialized()));
        model
    }

    /// The serialized model as a JSON string.
    pub fn serialized_model(&self) -> Result<String, TreeError> {
        Ok(serde_json::to_string(&self.to_serialized())?)
    }

    /// Renders the split rules and leaf classifications down to `max_depth`
    /// levels below this node. With `verbose`, each node also lists its
    /// observations.
    pub fn print_tree(&self, max_depth: usize, verbose: bool) -> String {
        TreeDump {
            tree: self,
            max_depth,
            verbose,
        }
        .to_string()
    }

    fn write_tree(
        &self,
        out: &mut impl Write,
        level: usize,
        max_depth: usize,
        verbose: bool,
    ) -> fmt::Result {
        if level > max_depth {
            return Ok(());
        }
        let prefix = "--|".repeat(level + 1);

        match (self.split_predictor(), self.split_value(), self.classification()) {
            (Some(predictor), Some(value), _) => {
                write!(out, "{} (rule: {} < {})", prefix, predictor, value)?
            }
            (_, _, Some(classification)) => write!(
                out,
                "{} Classification={} [{} observations",
                prefix,
                classification,
                self.n_observations()
            )?,
            _ => write!(out, "{} Unexpanded [{} observations", prefix, self.n_observations())?,
        }

        let is_internal = self.split_predictor().is_some();
        match (is_internal, verbose) {
            (true, false) => writeln!(out)?,
            (true, true) => writeln!(
                out,
                "[{} observations: [{}]]",
                self.n_observations(),
                serialize_observations(&self.all_observations())
            )?,
            (false, false) => writeln!(out, "]")?,
            (false, true) => writeln!(
                out,
                ": [{}]]",
                serialize_observations(&self.all_observations())
            )?,
        }

        for child in [self.left(), self.right()].into_iter().flatten() {
            child.write_tree(out, level + 1, max_depth, verbose)?;
        }
        Ok(())
    }
}

struct TreeDump<'a> {
    tree: &'a DecisionTree,
    max_depth: usize,
    verbose: bool,
}

impl Display for TreeDump<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.tree.write_tree(f, 0, self.max_depth, self.verbose)
    }
}

impl Display for DecisionTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0, usize::MAX, false)
    }
}

/// `attr=value,` pairs (attributes sorted by name), observations separated by `];`.
pub fn serialize_observations(observations: &[&Observation]) -> String {
    let mut out = String::new();
    for obs in observations {
        for attribute in obs.attributes() {
            if let Some(value) = obs.get(attribute) {
                out.push_str(&format!("{}={},", attribute, value));
            }
        }
        out.push_str("];");
    }
    out
}
