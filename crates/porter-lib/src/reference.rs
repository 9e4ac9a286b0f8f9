//! Native evaluation of canonical models
//!
//! This is the source side of every equivalence check. Each family is
//! evaluated with the same operation order as the generated code so label
//! decisions agree exactly and probabilities agree to the last few ulps.

use crate::error::{PorterError, Result};
use crate::introspect::canonical::*;
use crate::models::{Method, Prediction};

/// Anything that can classify a feature vector
pub trait Classifier {
    /// Predicted class label
    fn predict(&self, features: &[f64]) -> Result<i64>;

    /// Per-class probabilities, ordered like the model's classes
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>>;

    fn evaluate(&self, method: Method, features: &[f64]) -> Result<Prediction> {
        match method {
            Method::Predict => self.predict(features).map(Prediction::Label),
            Method::PredictProba => self.predict_proba(features).map(Prediction::Probabilities),
        }
    }
}

impl Classifier for CanonicalModel {
    fn predict(&self, features: &[f64]) -> Result<i64> {
        self.check_features(features)?;
        let index = match &self.params {
            Parameters::DecisionTree(tree) => tree_leaf(tree, features).majority_class(),
            Parameters::TreeEnsemble(ensemble) => match ensemble.aggregation {
                Aggregation::Average => argmax(&mean_leaf_probabilities(ensemble, self.n_classes(), features)),
                Aggregation::Boost => argmax(&boost_scores(ensemble, self.n_classes(), features)),
            },
            Parameters::Svm(svm) => svm_class(svm, self.n_classes(), features),
            Parameters::Knn(knn) => argmax(&knn_votes(knn, self.n_classes(), features)),
            Parameters::NaiveBayesGaussian(nb) => argmax(&gaussian_jll(nb, features)),
            Parameters::NaiveBayesBernoulli(nb) => argmax(&bernoulli_jll(nb, features)),
            Parameters::NeuralNet(net) => {
                let z = forward(net, features);
                if z.len() == 1 {
                    usize::from(logistic(z[0]) > 0.5)
                } else {
                    argmax(&z)
                }
            }
        };
        Ok(self.classes[index])
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        self.check_features(features)?;
        match &self.params {
            Parameters::DecisionTree(tree) => Ok(tree_leaf(tree, features).probabilities()),
            Parameters::TreeEnsemble(ensemble) if ensemble.aggregation == Aggregation::Average => {
                Ok(mean_leaf_probabilities(ensemble, self.n_classes(), features))
            }
            Parameters::Knn(knn) => {
                let k = knn.k as f64;
                Ok(knn_votes(knn, self.n_classes(), features)
                    .into_iter()
                    .map(|v| v / k)
                    .collect())
            }
            Parameters::NaiveBayesGaussian(nb) => Ok(softmax(&gaussian_jll(nb, features))),
            Parameters::NaiveBayesBernoulli(nb) => Ok(softmax(&bernoulli_jll(nb, features))),
            Parameters::NeuralNet(net) => {
                let z = forward(net, features);
                if z.len() == 1 {
                    let p = logistic(z[0]);
                    Ok(vec![1.0 - p, p])
                } else {
                    Ok(softmax(&z))
                }
            }
            _ => Err(PorterError::UnsupportedMethod {
                method: Method::PredictProba.to_string(),
                estimator: self.family().to_string(),
            }),
        }
    }
}

impl CanonicalModel {
    fn check_features(&self, features: &[f64]) -> Result<()> {
        PorterError::check_row(self.n_features, features)
    }
}

fn tree_leaf<'t>(tree: &'t Tree, features: &[f64]) -> &'t TreeNode {
    let mut node = &tree.nodes[0];
    while let Some(split) = &node.split {
        node = if features[split.feature] <= split.threshold {
            &tree.nodes[split.left]
        } else {
            &tree.nodes[split.right]
        };
    }
    node
}

/// Per-class sum of leaf probabilities in tree order, divided by the tree count
fn mean_leaf_probabilities(ensemble: &Ensemble, n_classes: usize, features: &[f64]) -> Vec<f64> {
    let mut sums = vec![0.0; n_classes];
    for tree in &ensemble.trees {
        let proba = tree_leaf(tree, features).probabilities();
        for (sum, p) in sums.iter_mut().zip(proba) {
            *sum += p;
        }
    }
    let n = ensemble.trees.len() as f64;
    sums.into_iter().map(|v| v / n).collect()
}

/// Summed weights of the trees predicting each class
fn boost_scores(ensemble: &Ensemble, n_classes: usize, features: &[f64]) -> Vec<f64> {
    let mut scores = vec![0.0; n_classes];
    for (tree, weight) in ensemble.trees.iter().zip(&ensemble.weights) {
        scores[tree_leaf(tree, features).majority_class()] += weight;
    }
    scores
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    let mut acc = 0.0;
    for (x, y) in a.iter().zip(b) {
        acc += x * y;
    }
    acc
}

pub(crate) fn kernel(kernel: &Kernel, sv: &[f64], features: &[f64]) -> f64 {
    match *kernel {
        Kernel::Linear => dot(sv, features),
        Kernel::Poly { gamma, coef0, degree } => (gamma * dot(sv, features) + coef0).powf(degree),
        Kernel::Rbf { gamma } => {
            let mut acc = 0.0;
            for (s, x) in sv.iter().zip(features) {
                let d = s - x;
                acc += d * d;
            }
            (-gamma * acc).exp()
        }
        Kernel::Sigmoid { gamma, coef0 } => (gamma * dot(sv, features) + coef0).tanh(),
    }
}

fn svm_class(svm: &Svm, n_classes: usize, features: &[f64]) -> usize {
    match &svm.decomposition {
        Decomposition::OneVsOne {
            support_vectors,
            n_support,
            dual_coef,
            intercepts,
        } => {
            let kernels: Vec<f64> = support_vectors
                .iter()
                .map(|sv| kernel(&svm.kernel, sv, features))
                .collect();
            let offsets = Svm::support_offsets(n_support);
            let mut votes = vec![0usize; n_classes];
            for (p, (i, j)) in Svm::pairs(n_classes).into_iter().enumerate() {
                let mut decision = 0.0;
                for s in offsets[i]..offsets[i] + n_support[i] {
                    decision += dual_coef[j - 1][s] * kernels[s];
                }
                for s in offsets[j]..offsets[j] + n_support[j] {
                    decision += dual_coef[i][s] * kernels[s];
                }
                decision += intercepts[p];
                if decision > 0.0 {
                    votes[i] += 1;
                } else {
                    votes[j] += 1;
                }
            }
            argmax(&votes)
        }
        Decomposition::OneVsRest { coef, intercepts } => {
            let scores: Vec<f64> = coef
                .iter()
                .zip(intercepts)
                .map(|(row, b)| dot(row, features) + b)
                .collect();
            if scores.len() == 1 {
                usize::from(scores[0] > 0.0)
            } else {
                argmax(&scores)
            }
        }
    }
}

pub(crate) fn distance(metric: &Metric, sample: &[f64], features: &[f64]) -> f64 {
    let mut acc: f64 = 0.0;
    for (s, x) in sample.iter().zip(features) {
        let d = s - x;
        match *metric {
            Metric::Euclidean => acc += d * d,
            Metric::Manhattan => acc += d.abs(),
            Metric::Chebyshev => acc = acc.max(d.abs()),
            Metric::Minkowski { p } => acc += d.abs().powf(p),
        }
    }
    acc
}

/// Votes of the k nearest samples; ties in distance go to the lower sample index
fn knn_votes(knn: &Knn, n_classes: usize, features: &[f64]) -> Vec<f64> {
    let distances: Vec<f64> = knn
        .samples
        .iter()
        .map(|s| distance(&knn.metric, s, features))
        .collect();
    let mut taken = vec![false; distances.len()];
    let mut votes = vec![0.0; n_classes];
    for _ in 0..knn.k {
        let mut nearest: Option<usize> = None;
        for (i, d) in distances.iter().enumerate() {
            if taken[i] {
                continue;
            }
            if nearest.map_or(true, |n| *d < distances[n]) {
                nearest = Some(i);
            }
        }
        if let Some(n) = nearest {
            taken[n] = true;
            votes[knn.labels[n]] += 1.0;
        }
    }
    votes
}

fn gaussian_jll(nb: &GaussianNb, features: &[f64]) -> Vec<f64> {
    nb.offsets()
        .into_iter()
        .enumerate()
        .map(|(c, offset)| {
            let mut acc = 0.0;
            for (f, x) in features.iter().enumerate() {
                let diff = x - nb.means[c][f];
                acc += diff * diff / nb.variances[c][f];
            }
            offset - 0.5 * acc
        })
        .collect()
}

fn bernoulli_jll(nb: &BernoulliNb, features: &[f64]) -> Vec<f64> {
    nb.class_log_prior
        .iter()
        .enumerate()
        .map(|(c, prior)| {
            let mut acc = *prior;
            for (f, x) in features.iter().enumerate() {
                if *x > nb.threshold {
                    acc += nb.feature_log_prob[c][f];
                } else {
                    acc += nb.feature_log_neg_prob[c][f];
                }
            }
            acc
        })
        .collect()
}

fn logistic(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

fn activate(activation: Activation, v: f64) -> f64 {
    match activation {
        Activation::Identity | Activation::Softmax => v,
        Activation::Logistic => logistic(v),
        Activation::Tanh => v.tanh(),
        Activation::Relu => v.max(0.0),
    }
}

/// Forward pass; the output layer is left as pre-activations
fn forward(net: &NeuralNet, features: &[f64]) -> Vec<f64> {
    let mut input = features.to_vec();
    for (l, layer) in net.layers.iter().enumerate() {
        let is_last = l + 1 == net.layers.len();
        let mut output = Vec::with_capacity(layer.n_outputs());
        for o in 0..layer.n_outputs() {
            let mut acc = 0.0;
            for (i, x) in input.iter().enumerate() {
                acc += x * layer.weights[i][o];
            }
            acc += layer.biases[o];
            output.push(if is_last { acc } else { activate(layer.activation, acc) });
        }
        input = output;
    }
    input
}

/// Normalized exponentials, shifted by the maximum
fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values[argmax(values)];
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let mut total = 0.0;
    for e in &exps {
        total += e;
    }
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(distribution: Vec<f64>) -> TreeNode {
        TreeNode {
            split: None,
            distribution,
        }
    }

    fn stump(feature: usize, threshold: f64, left: Vec<f64>, right: Vec<f64>) -> Tree {
        let total: Vec<f64> = left.iter().zip(&right).map(|(a, b)| a + b).collect();
        Tree {
            nodes: vec![
                TreeNode {
                    split: Some(Split {
                        feature,
                        threshold,
                        left: 1,
                        right: 2,
                    }),
                    distribution: total,
                },
                leaf(left),
                leaf(right),
            ],
        }
    }

    fn model(classes: Vec<i64>, n_features: usize, params: Parameters) -> CanonicalModel {
        CanonicalModel {
            classes,
            n_features,
            params,
        }
    }

    #[test]
    fn test_tree_threshold_goes_left_when_equal() {
        let m = model(
            vec![10, 20],
            1,
            Parameters::DecisionTree(stump(0, 0.5, vec![3.0, 1.0], vec![0.0, 2.0])),
        );
        assert_eq!(m.predict(&[0.5]).unwrap(), 10);
        assert_eq!(m.predict(&[0.5000000000000001]).unwrap(), 20);
        assert_eq!(m.predict_proba(&[0.0]).unwrap(), vec![0.75, 0.25]);
    }

    #[test]
    fn test_feature_count_checked() {
        let m = model(
            vec![0, 1],
            2,
            Parameters::DecisionTree(stump(0, 0.5, vec![1.0, 0.0], vec![0.0, 1.0])),
        );
        assert!(matches!(
            m.predict(&[1.0]),
            Err(PorterError::FeatureCountMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_non_finite_features_rejected() {
        let m = model(
            vec![0, 1],
            2,
            Parameters::DecisionTree(stump(0, 0.5, vec![1.0, 0.0], vec![0.0, 1.0])),
        );
        assert!(matches!(
            m.predict(&[f64::NEG_INFINITY, 0.0]),
            Err(PorterError::NonFiniteFeature { feature: 0, .. })
        ));
        assert!(matches!(
            m.predict_proba(&[0.0, f64::NAN]),
            Err(PorterError::NonFiniteFeature { feature: 1, .. })
        ));
    }

    #[test]
    fn test_average_ensemble_ties_to_lowest_class() {
        let ensemble = Ensemble {
            trees: vec![
                stump(0, 0.0, vec![1.0, 0.0], vec![0.0, 1.0]),
                stump(0, 0.0, vec![0.0, 1.0], vec![1.0, 0.0]),
            ],
            weights: vec![1.0, 1.0],
            aggregation: Aggregation::Average,
        };
        let m = model(vec![0, 1], 1, Parameters::TreeEnsemble(ensemble));
        assert_eq!(m.predict(&[1.0]).unwrap(), 0);
        assert_eq!(m.predict_proba(&[1.0]).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_single_tree_forest_matches_tree() {
        let tree = stump(0, 0.0, vec![5.0, 1.0], vec![1.0, 2.0]);
        let single = model(vec![0, 1], 1, Parameters::DecisionTree(tree.clone()));
        let forest = model(
            vec![0, 1],
            1,
            Parameters::TreeEnsemble(Ensemble {
                trees: vec![tree],
                weights: vec![1.0],
                aggregation: Aggregation::Average,
            }),
        );
        for x in [-1.0, 0.0, 1.0] {
            assert_eq!(forest.predict_proba(&[x]).unwrap(), single.predict_proba(&[x]).unwrap());
            assert_eq!(forest.predict(&[x]).unwrap(), single.predict(&[x]).unwrap());
        }
        assert_eq!(forest.predict_proba(&[0.0]).unwrap(), vec![5.0 / 6.0, 1.0 / 6.0]);
    }

    #[test]
    fn test_forest_predict_follows_mean_probability() {
        // two weak trees for class 0 lose to one confident tree for class 1
        let ensemble = Ensemble {
            trees: vec![
                stump(0, 0.0, vec![1.0, 1.0], vec![0.6, 0.4]),
                stump(0, 0.0, vec![1.0, 1.0], vec![0.6, 0.4]),
                stump(0, 0.0, vec![1.0, 1.0], vec![0.0, 1.0]),
            ],
            weights: vec![1.0, 1.0, 1.0],
            aggregation: Aggregation::Average,
        };
        let m = model(vec![0, 1], 1, Parameters::TreeEnsemble(ensemble));
        let proba = m.predict_proba(&[1.0]).unwrap();
        assert!((proba[0] - 0.4).abs() < 1e-12);
        assert!((proba[1] - 0.6).abs() < 1e-12);
        assert_eq!(m.predict(&[1.0]).unwrap(), 1);
    }

    #[test]
    fn test_boost_ensemble_uses_weights() {
        let ensemble = Ensemble {
            trees: vec![
                stump(0, 0.0, vec![1.0, 0.0], vec![0.0, 1.0]),
                stump(0, 0.0, vec![0.0, 1.0], vec![1.0, 0.0]),
                stump(0, 0.0, vec![0.0, 1.0], vec![1.0, 0.0]),
            ],
            weights: vec![2.0, 0.5, 0.5],
            aggregation: Aggregation::Boost,
        };
        let m = model(vec![0, 1], 1, Parameters::TreeEnsemble(ensemble));
        assert_eq!(m.predict(&[1.0]).unwrap(), 1);
        assert!(m.predict_proba(&[1.0]).is_err());
    }

    #[test]
    fn test_knn_equal_distances_prefer_lower_index() {
        let knn = Knn {
            samples: vec![vec![1.0], vec![-1.0], vec![5.0]],
            labels: vec![1, 0, 0],
            k: 1,
            metric: Metric::Euclidean,
        };
        let m = model(vec![0, 1], 1, Parameters::Knn(knn));
        assert_eq!(m.predict(&[0.0]).unwrap(), 1);
    }

    #[test]
    fn test_knn_vote_tie_prefers_lowest_class() {
        let knn = Knn {
            samples: vec![vec![1.0], vec![-1.0], vec![5.0]],
            labels: vec![1, 0, 0],
            k: 2,
            metric: Metric::Manhattan,
        };
        let m = model(vec![0, 1], 1, Parameters::Knn(knn));
        assert_eq!(m.predict(&[0.0]).unwrap(), 0);
        assert_eq!(m.predict_proba(&[0.0]).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_ovo_three_way_tie_prefers_lowest_class() {
        // decisions: (0,1) -> 0, (0,2) -> 2, (1,2) -> 1
        let svm = Svm {
            kernel: Kernel::Linear,
            decomposition: Decomposition::OneVsOne {
                support_vectors: vec![vec![0.0], vec![0.0], vec![0.0]],
                n_support: vec![1, 1, 1],
                dual_coef: vec![vec![0.0; 3], vec![0.0; 3]],
                intercepts: vec![1.0, -1.0, 1.0],
            },
        };
        let m = model(vec![0, 1, 2], 1, Parameters::Svm(svm));
        assert_eq!(m.predict(&[0.0]).unwrap(), 0);
    }

    #[test]
    fn test_ovr_binary_sign() {
        let svm = Svm {
            kernel: Kernel::Linear,
            decomposition: Decomposition::OneVsRest {
                coef: vec![vec![1.0, -1.0]],
                intercepts: vec![0.0],
            },
        };
        let m = model(vec![-1, 1], 2, Parameters::Svm(svm));
        assert_eq!(m.predict(&[2.0, 1.0]).unwrap(), 1);
        assert_eq!(m.predict(&[1.0, 1.0]).unwrap(), -1);
    }

    #[test]
    fn test_gaussian_nb_picks_nearest_mean() {
        let nb = GaussianNb {
            priors: vec![0.5, 0.5],
            means: vec![vec![0.0], vec![4.0]],
            variances: vec![vec![1.0], vec![1.0]],
        };
        let m = model(vec![0, 1], 1, Parameters::NaiveBayesGaussian(nb));
        assert_eq!(m.predict(&[1.0]).unwrap(), 0);
        assert_eq!(m.predict(&[3.0]).unwrap(), 1);
        let p = m.predict_proba(&[2.0]).unwrap();
        assert!((p[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bernoulli_threshold_is_strict() {
        let nb = BernoulliNb {
            class_log_prior: vec![0.5f64.ln(), 0.5f64.ln()],
            feature_log_prob: vec![vec![0.1f64.ln()], vec![0.9f64.ln()]],
            feature_log_neg_prob: vec![vec![0.9f64.ln()], vec![0.1f64.ln()]],
            threshold: 0.0,
        };
        let m = model(vec![0, 1], 1, Parameters::NaiveBayesBernoulli(nb));
        assert_eq!(m.predict(&[0.0]).unwrap(), 0);
        assert_eq!(m.predict(&[0.1]).unwrap(), 1);
    }

    #[test]
    fn test_binary_logistic_network() {
        let net = NeuralNet {
            layers: vec![Layer {
                weights: vec![vec![1.0]],
                biases: vec![0.0],
                activation: Activation::Logistic,
            }],
        };
        let m = model(vec![0, 1], 1, Parameters::NeuralNet(net));
        assert_eq!(m.predict(&[0.0]).unwrap(), 0);
        assert_eq!(m.predict(&[0.1]).unwrap(), 1);
        assert_eq!(m.predict_proba(&[0.0]).unwrap(), vec![0.5, 0.5]);
        // positive, but the probability still rounds to exactly one half
        assert_eq!(m.predict_proba(&[1e-17]).unwrap(), vec![0.5, 0.5]);
        assert_eq!(m.predict(&[1e-17]).unwrap(), 0);
    }

    #[test]
    fn test_softmax_network_with_hidden_relu() {
        let net = NeuralNet {
            layers: vec![
                Layer {
                    weights: vec![vec![1.0, -1.0]],
                    biases: vec![0.0, 0.0],
                    activation: Activation::Relu,
                },
                Layer {
                    weights: vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
                    biases: vec![0.0, 0.0, 0.5],
                    activation: Activation::Softmax,
                },
            ],
        };
        let m = model(vec![0, 1, 2], 1, Parameters::NeuralNet(net));
        assert_eq!(m.predict(&[2.0]).unwrap(), 0);
        assert_eq!(m.predict(&[-2.0]).unwrap(), 1);
        assert_eq!(m.predict(&[0.0]).unwrap(), 2);
        let p = m.predict_proba(&[0.0]).unwrap();
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
