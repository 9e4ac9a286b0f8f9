//! Canonical, language-agnostic parameter sets per model family
//!
//! Every model is reduced to plain vectors and matrices of `f64`/indices.
//! `CanonicalModel::validate` enforces that the set is fully populated and
//! internally consistent before anything is rendered or evaluated.

use crate::error::{PorterError, Result};
use crate::models::Family;
use serde::Serialize;

/// A fully-populated snapshot of a trained classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalModel {
    /// Class labels, indexed by class position
    pub classes: Vec<i64>,
    pub n_features: usize,
    pub params: Parameters,
}

/// Family-specific parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Parameters {
    DecisionTree(Tree),
    TreeEnsemble(Ensemble),
    Svm(Svm),
    Knn(Knn),
    NaiveBayesGaussian(GaussianNb),
    NaiveBayesBernoulli(BernoulliNb),
    NeuralNet(NeuralNet),
}

/// Decision tree, root at index 0, children always after their parent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    /// `None` for leaves
    pub split: Option<Split>,
    /// Per-class sample counts (or weights) reaching this node
    pub distribution: Vec<f64>,
}

/// Internal node test: go left when `features[feature] <= threshold`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Split {
    pub feature: usize,
    pub threshold: f64,
    pub left: usize,
    pub right: usize,
}

impl TreeNode {
    /// Majority class of the leaf distribution, lowest index on ties
    pub fn majority_class(&self) -> usize {
        argmax(&self.distribution)
    }

    /// Leaf distribution normalized to sum to one
    pub fn probabilities(&self) -> Vec<f64> {
        let total: f64 = self.distribution.iter().sum();
        if total > 0.0 {
            self.distribution.iter().map(|v| v / total).collect()
        } else {
            let n = self.distribution.len() as f64;
            vec![1.0 / n; self.distribution.len()]
        }
    }
}

/// How the trees of an ensemble are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Mean of every tree's normalized leaf distribution (bagging)
    Average,
    /// Per-class sum of the weights of the trees predicting that class (SAMME boosting)
    Boost,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ensemble {
    /// Trees in training order
    pub trees: Vec<Tree>,
    /// Per-tree weight, parallel to `trees`
    pub weights: Vec<f64>,
    pub aggregation: Aggregation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Poly { gamma: f64, coef0: f64, degree: f64 },
    Rbf { gamma: f64 },
    Sigmoid { gamma: f64, coef0: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decomposition {
    /// libsvm pairwise decomposition: one binary decision per class pair
    OneVsOne {
        /// Support vectors grouped by class
        support_vectors: Vec<Vec<f64>>,
        /// Number of support vectors per class
        n_support: Vec<usize>,
        /// `(n_classes - 1) x n_sv` dual coefficients
        dual_coef: Vec<Vec<f64>>,
        /// One intercept per pair, pairs ordered (0,1), (0,2), ..., (1,2), ...
        intercepts: Vec<f64>,
    },
    /// Linear one-vs-rest scores; a single row means a binary problem
    OneVsRest {
        coef: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Svm {
    pub kernel: Kernel,
    pub decomposition: Decomposition,
}

impl Svm {
    /// Class pairs in libsvm order
    pub fn pairs(n_classes: usize) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for i in 0..n_classes {
            for j in (i + 1)..n_classes {
                pairs.push((i, j));
            }
        }
        pairs
    }

    /// Start offset of each class's support vectors
    pub fn support_offsets(n_support: &[usize]) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(n_support.len());
        let mut acc = 0;
        for n in n_support {
            offsets.push(acc);
            acc += n;
        }
        offsets
    }
}

/// Distance used for neighbour search. Values are compared without the final
/// root, which preserves the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metric {
    Euclidean,
    Manhattan,
    Chebyshev,
    Minkowski { p: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Knn {
    pub samples: Vec<Vec<f64>>,
    /// Class index of each training sample
    pub labels: Vec<usize>,
    pub k: usize,
    pub metric: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaussianNb {
    pub priors: Vec<f64>,
    pub means: Vec<Vec<f64>>,
    pub variances: Vec<Vec<f64>>,
}

impl GaussianNb {
    /// Per-class `ln(prior) - 0.5 * sum(ln(2 * pi * var))`
    pub fn offsets(&self) -> Vec<f64> {
        self.priors
            .iter()
            .zip(&self.variances)
            .map(|(prior, vars)| {
                let norm: f64 = vars
                    .iter()
                    .map(|v| (2.0 * std::f64::consts::PI * v).ln())
                    .sum();
                prior.ln() - 0.5 * norm
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BernoulliNb {
    pub class_log_prior: Vec<f64>,
    /// `ln(p)` of each feature being set, per class
    pub feature_log_prob: Vec<Vec<f64>>,
    /// `ln(1 - p)`, per class
    pub feature_log_neg_prob: Vec<Vec<f64>>,
    /// Features strictly above this value count as set
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Identity,
    Logistic,
    Tanh,
    Relu,
    Softmax,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    /// `n_inputs x n_outputs`
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    pub activation: Activation,
}

impl Layer {
    pub fn n_inputs(&self) -> usize {
        self.weights.len()
    }

    pub fn n_outputs(&self) -> usize {
        self.biases.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeuralNet {
    pub layers: Vec<Layer>,
}

/// Index of the largest value, lowest index on ties
pub fn argmax<T: PartialOrd + Copy>(values: &[T]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

impl CanonicalModel {
    pub fn family(&self) -> Family {
        match &self.params {
            Parameters::DecisionTree(_) => Family::DecisionTree,
            Parameters::TreeEnsemble(_) => Family::TreeEnsemble,
            Parameters::Svm(_) => Family::Svm,
            Parameters::Knn(_) => Family::Knn,
            Parameters::NaiveBayesGaussian(_) => Family::NaiveBayesGaussian,
            Parameters::NaiveBayesBernoulli(_) => Family::NaiveBayesBernoulli,
            Parameters::NeuralNet(_) => Family::NeuralNet,
        }
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Check that every parameter is present, finite and consistently shaped
    pub fn validate(&self, estimator: &str) -> Result<()> {
        let check = Checker {
            estimator,
            n_classes: self.classes.len(),
            n_features: self.n_features,
        };
        if self.classes.len() < 2 {
            return Err(check.fail("classes_ must hold at least two labels"));
        }
        // generated code stores labels in 32-bit integers
        if self.classes.iter().any(|c| i32::try_from(*c).is_err()) {
            return Err(check.fail("classes_ labels must fit in 32-bit integers"));
        }
        if self.n_features == 0 {
            return Err(check.fail("the model must have at least one feature"));
        }
        match &self.params {
            Parameters::DecisionTree(tree) => check.tree(tree, "tree_"),
            Parameters::TreeEnsemble(ensemble) => check.ensemble(ensemble),
            Parameters::Svm(svm) => check.svm(svm),
            Parameters::Knn(knn) => check.knn(knn),
            Parameters::NaiveBayesGaussian(nb) => check.gaussian(nb),
            Parameters::NaiveBayesBernoulli(nb) => check.bernoulli(nb),
            Parameters::NeuralNet(net) => check.neural_net(net),
        }
    }
}

struct Checker<'a> {
    estimator: &'a str,
    n_classes: usize,
    n_features: usize,
}

impl Checker<'_> {
    fn fail(&self, reason: impl Into<String>) -> PorterError {
        PorterError::incomplete(self.estimator, reason)
    }

    fn finite(&self, values: &[f64], what: &str) -> Result<()> {
        if values.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(self.fail(format!("{} contains non-finite values", what)))
        }
    }

    fn matrix(&self, rows: &[Vec<f64>], n_rows: usize, n_cols: usize, what: &str) -> Result<()> {
        if rows.len() != n_rows {
            return Err(self.fail(format!("{} has {} rows, expected {}", what, rows.len(), n_rows)));
        }
        for row in rows {
            if row.len() != n_cols {
                return Err(self.fail(format!(
                    "{} has a row of length {}, expected {}",
                    what,
                    row.len(),
                    n_cols
                )));
            }
            self.finite(row, what)?;
        }
        Ok(())
    }

    fn tree(&self, tree: &Tree, what: &str) -> Result<()> {
        if tree.nodes.is_empty() {
            return Err(self.fail(format!("{} has no nodes", what)));
        }
        for (i, node) in tree.nodes.iter().enumerate() {
            if node.distribution.len() != self.n_classes {
                return Err(self.fail(format!(
                    "{} node {} has {} class values, expected {}",
                    what,
                    i,
                    node.distribution.len(),
                    self.n_classes
                )));
            }
            self.finite(&node.distribution, what)?;
            if let Some(split) = &node.split {
                if split.feature >= self.n_features {
                    return Err(self.fail(format!(
                        "{} node {} splits on feature {} of {}",
                        what, i, split.feature, self.n_features
                    )));
                }
                if !split.threshold.is_finite() {
                    return Err(self.fail(format!("{} node {} has a non-finite threshold", what, i)));
                }
                let n = tree.nodes.len();
                if split.left <= i || split.right <= i || split.left >= n || split.right >= n {
                    return Err(self.fail(format!("{} node {} has invalid children", what, i)));
                }
            }
        }
        Ok(())
    }

    fn ensemble(&self, ensemble: &Ensemble) -> Result<()> {
        if ensemble.trees.is_empty() {
            return Err(self.fail("estimators_ is empty"));
        }
        if ensemble.weights.len() != ensemble.trees.len() {
            return Err(self.fail("one weight per estimator is required"));
        }
        self.finite(&ensemble.weights, "estimator weights")?;
        for (i, tree) in ensemble.trees.iter().enumerate() {
            self.tree(tree, &format!("estimators_[{}]", i))?;
        }
        Ok(())
    }

    fn svm(&self, svm: &Svm) -> Result<()> {
        let scalars = match svm.kernel {
            Kernel::Linear => vec![],
            Kernel::Poly { gamma, coef0, degree } => vec![gamma, coef0, degree],
            Kernel::Rbf { gamma } => vec![gamma],
            Kernel::Sigmoid { gamma, coef0 } => vec![gamma, coef0],
        };
        self.finite(&scalars, "kernel parameters")?;
        match &svm.decomposition {
            Decomposition::OneVsOne {
                support_vectors,
                n_support,
                dual_coef,
                intercepts,
            } => {
                if n_support.len() != self.n_classes {
                    return Err(self.fail("n_support_ must have one entry per class"));
                }
                let n_sv: usize = n_support.iter().sum();
                if n_sv == 0 {
                    return Err(self.fail("support_vectors_ is empty"));
                }
                self.matrix(support_vectors, n_sv, self.n_features, "support_vectors_")?;
                self.matrix(dual_coef, self.n_classes - 1, n_sv, "dual_coef_")?;
                let n_pairs = self.n_classes * (self.n_classes - 1) / 2;
                if intercepts.len() != n_pairs {
                    return Err(self.fail(format!(
                        "intercept_ has {} values, expected {}",
                        intercepts.len(),
                        n_pairs
                    )));
                }
                self.finite(intercepts, "intercept_")
            }
            Decomposition::OneVsRest { coef, intercepts } => {
                let n_rows = if self.n_classes == 2 { 1 } else { self.n_classes };
                self.matrix(coef, n_rows, self.n_features, "coef_")?;
                if intercepts.len() != n_rows {
                    return Err(self.fail("intercept_ must have one value per coef_ row"));
                }
                self.finite(intercepts, "intercept_")
            }
        }
    }

    fn knn(&self, knn: &Knn) -> Result<()> {
        if knn.samples.is_empty() {
            return Err(self.fail("_fit_X is empty"));
        }
        self.matrix(&knn.samples, knn.samples.len(), self.n_features, "_fit_X")?;
        if knn.labels.len() != knn.samples.len() {
            return Err(self.fail("_y must have one label per sample"));
        }
        if knn.labels.iter().any(|&l| l >= self.n_classes) {
            return Err(self.fail("_y references an unknown class"));
        }
        if knn.k == 0 || knn.k > knn.samples.len() {
            return Err(self.fail(format!(
                "n_neighbors = {} must be within 1..={}",
                knn.k,
                knn.samples.len()
            )));
        }
        if let Metric::Minkowski { p } = knn.metric {
            if !(p.is_finite() && p >= 1.0) {
                return Err(self.fail("minkowski p must be a finite value >= 1"));
            }
        }
        Ok(())
    }

    fn gaussian(&self, nb: &GaussianNb) -> Result<()> {
        if nb.priors.len() != self.n_classes {
            return Err(self.fail("class_prior_ must have one value per class"));
        }
        self.finite(&nb.priors, "class_prior_")?;
        if nb.priors.iter().any(|p| *p <= 0.0) {
            return Err(self.fail("class_prior_ must be strictly positive"));
        }
        self.matrix(&nb.means, self.n_classes, self.n_features, "theta_")?;
        self.matrix(&nb.variances, self.n_classes, self.n_features, "var_")?;
        if nb.variances.iter().flatten().any(|v| *v <= 0.0) {
            return Err(self.fail("var_ must be strictly positive"));
        }
        Ok(())
    }

    fn bernoulli(&self, nb: &BernoulliNb) -> Result<()> {
        if nb.class_log_prior.len() != self.n_classes {
            return Err(self.fail("class_log_prior_ must have one value per class"));
        }
        self.finite(&nb.class_log_prior, "class_log_prior_")?;
        self.matrix(&nb.feature_log_prob, self.n_classes, self.n_features, "feature_log_prob_")?;
        self.matrix(
            &nb.feature_log_neg_prob,
            self.n_classes,
            self.n_features,
            "feature_log_prob_ complement",
        )?;
        self.finite(&[nb.threshold], "binarize")
    }

    fn neural_net(&self, net: &NeuralNet) -> Result<()> {
        let Some(last) = net.layers.last() else {
            return Err(self.fail("coefs_ is empty"));
        };
        let mut n_inputs = self.n_features;
        for (i, layer) in net.layers.iter().enumerate() {
            let what = format!("coefs_[{}]", i);
            self.matrix(&layer.weights, n_inputs, layer.n_outputs(), &what)?;
            self.finite(&layer.biases, &format!("intercepts_[{}]", i))?;
            if layer.n_outputs() == 0 {
                return Err(self.fail(format!("{} has no outputs", what)));
            }
            let is_last = i + 1 == net.layers.len();
            if !is_last && layer.activation == Activation::Softmax {
                return Err(self.fail("softmax is only valid on the output layer"));
            }
            n_inputs = layer.n_outputs();
        }
        match last.activation {
            Activation::Softmax if last.n_outputs() == self.n_classes => Ok(()),
            Activation::Logistic if last.n_outputs() == 1 && self.n_classes == 2 => Ok(()),
            _ => Err(self.fail(format!(
                "output layer with {} units and {:?} activation does not fit {} classes",
                last.n_outputs(),
                last.activation,
                self.n_classes
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree {
            nodes: vec![
                TreeNode {
                    split: Some(Split {
                        feature: 0,
                        threshold: 0.5,
                        left: 1,
                        right: 2,
                    }),
                    distribution: vec![5.0, 5.0],
                },
                TreeNode {
                    split: None,
                    distribution: vec![5.0, 0.0],
                },
                TreeNode {
                    split: None,
                    distribution: vec![0.0, 5.0],
                },
            ],
        }
    }

    #[test]
    fn test_argmax_prefers_lowest_index() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(&[2, 2, 2]), 0);
        assert_eq!(argmax(&[0.0, -1.0, 4.0]), 2);
    }

    #[test]
    fn test_leaf_probabilities() {
        let node = TreeNode {
            split: None,
            distribution: vec![1.0, 3.0],
        };
        assert_eq!(node.probabilities(), vec![0.25, 0.75]);
        assert_eq!(node.majority_class(), 1);
    }

    #[test]
    fn test_valid_tree_accepted() {
        let model = CanonicalModel {
            classes: vec![0, 1],
            n_features: 1,
            params: Parameters::DecisionTree(stump()),
        };
        assert!(model.validate("DecisionTreeClassifier").is_ok());
        assert_eq!(model.family(), Family::DecisionTree);
    }

    #[test]
    fn test_tree_child_cycle_rejected() {
        let mut tree = stump();
        if let Some(split) = tree.nodes[0].split.as_mut() {
            split.left = 0;
        }
        let model = CanonicalModel {
            classes: vec![0, 1],
            n_features: 1,
            params: Parameters::DecisionTree(tree),
        };
        assert!(matches!(
            model.validate("DecisionTreeClassifier"),
            Err(PorterError::IncompleteModel { .. })
        ));
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        let mut tree = stump();
        if let Some(split) = tree.nodes[0].split.as_mut() {
            split.threshold = f64::NAN;
        }
        let model = CanonicalModel {
            classes: vec![0, 1],
            n_features: 1,
            params: Parameters::DecisionTree(tree),
        };
        assert!(model.validate("DecisionTreeClassifier").is_err());
    }

    #[test]
    fn test_svm_pairs_order() {
        assert_eq!(Svm::pairs(3), vec![(0, 1), (0, 2), (1, 2)]);
        assert_eq!(Svm::support_offsets(&[2, 3, 1]), vec![0, 2, 5]);
    }

    #[test]
    fn test_gaussian_offsets() {
        let nb = GaussianNb {
            priors: vec![0.5, 0.5],
            means: vec![vec![0.0], vec![1.0]],
            variances: vec![vec![1.0], vec![1.0]],
        };
        let offsets = nb.offsets();
        let expected = 0.5f64.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln();
        assert_eq!(offsets, vec![expected, expected]);
    }
}
