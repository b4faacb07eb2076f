//! Gradient-boosted regression trees
//!
//! Trees are stored as flat node arrays with the root at index 0. A split
//! sends a row to `yes` when its feature is strictly below `threshold`, to
//! `no` otherwise, and to `missing` when the feature is `NaN`. The prediction
//! is `base_score` plus the sum of the reached leaves.

use super::models::{check_shape, RegressionModel};
use super::{FeatureVector, ModelMetadata};
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
        missing: usize,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Children must point forward so evaluation always terminates
    fn validate(&self, n_features: usize, tree_idx: usize) -> Result<()> {
        if self.nodes.is_empty() {
            anyhow::bail!("tree {} has no nodes", tree_idx);
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                yes,
                no,
                missing,
                ..
            } = node
            {
                if *feature >= n_features {
                    anyhow::bail!(
                        "tree {} node {} splits on feature {} but the model has {}",
                        tree_idx,
                        idx,
                        feature,
                        n_features
                    );
                }
                for child in [yes, no, missing] {
                    if *child <= idx || *child >= self.nodes.len() {
                        anyhow::bail!(
                            "tree {} node {} has invalid child index {}",
                            tree_idx,
                            idx,
                            child
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { leaf } => return *leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let x = features[*feature];
                    idx = if x.is_nan() {
                        *missing
                    } else if x < *threshold {
                        *yes
                    } else {
                        *no
                    };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    pub metadata: ModelMetadata,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    pub fn new(metadata: ModelMetadata, base_score: f64, trees: Vec<RegressionTree>) -> Result<Self> {
        let model = Self {
            metadata,
            base_score,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        let n_features = self.metadata.feature_names.len();
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features, idx)?;
        }
        Ok(())
    }
}

impl RegressionModel for GradientBoostedTrees {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        check_shape(&self.metadata, features)?;

        Ok(self.base_score
            + self
                .trees
                .iter()
                .map(|tree| tree.evaluate(&features.features))
                .sum::<f64>())
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
