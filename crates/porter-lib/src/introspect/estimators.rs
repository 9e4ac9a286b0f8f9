//! Extraction of canonical parameters from scikit-learn style fitted attributes

use super::attributes::Attributes;
use super::canonical::*;
use crate::error::{PorterError, Result};

fn unsupported(attrs: &Attributes<'_>, detail: impl std::fmt::Display) -> PorterError {
    PorterError::UnsupportedAlgorithm(format!("{}({})", attrs.estimator(), detail))
}

fn n_features(attrs: &Attributes<'_>) -> Result<usize> {
    let value = attrs.get_any(&["n_features_in_", "n_features_"])?;
    let n = value
        .as_u64()
        .ok_or_else(|| PorterError::incomplete(attrs.estimator(), "`n_features_in_` must be a count"))?;
    Ok(n as usize)
}

/// Read a `tree_` object: parallel node arrays, leaves marked by child -1
fn tree(attrs: &Attributes<'_>, n_classes: usize) -> Result<Tree> {
    let t = attrs.object("tree_")?;
    let left = t.get("children_left")?;
    let right = t.get("children_right")?;
    let feature = t.get("feature")?;
    let threshold = t.vec_f64("threshold")?;
    let value = t.to_array(t.get("value")?, "value")?;

    let left = int_array(&t, left, "children_left")?;
    let right = int_array(&t, right, "children_right")?;
    let feature = int_array(&t, feature, "feature")?;

    let n = left.len();
    if right.len() != n || feature.len() != n || threshold.len() != n || value.len() != n {
        return Err(PorterError::incomplete(
            attrs.estimator(),
            "tree_ node arrays differ in length",
        ));
    }

    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let distribution = node_value(&t, &value[i], n_classes)?;
        let split = if left[i] < 0 || right[i] < 0 {
            None
        } else {
            if feature[i] < 0 {
                return Err(PorterError::incomplete(
                    attrs.estimator(),
                    format!("tree_ node {} splits on an undefined feature", i),
                ));
            }
            Some(Split {
                feature: feature[i] as usize,
                threshold: threshold[i],
                left: left[i] as usize,
                right: right[i] as usize,
            })
        };
        nodes.push(TreeNode {
            split,
            distribution,
        });
    }
    Ok(Tree { nodes })
}

fn int_array(t: &Attributes<'_>, value: &serde_json::Value, name: &str) -> Result<Vec<i64>> {
    t.to_vec_f64(value, name)?
        .into_iter()
        .map(|v| {
            if v.fract() == 0.0 {
                Ok(v as i64)
            } else {
                Err(PorterError::incomplete(
                    t.estimator(),
                    format!("`{}` must hold integers", name),
                ))
            }
        })
        .collect()
}

/// Node values come as `[n_outputs][n_classes]` or already flat `[n_classes]`
fn node_value(t: &Attributes<'_>, value: &serde_json::Value, n_classes: usize) -> Result<Vec<f64>> {
    let outputs = t.to_array(value, "value")?;
    if outputs.first().map(|v| v.is_array()).unwrap_or(false) {
        if outputs.len() != 1 {
            return Err(PorterError::UnsupportedAlgorithm(format!(
                "{}(n_outputs={})",
                t.estimator(),
                outputs.len()
            )));
        }
        let row = t.to_vec_f64(&outputs[0], "value")?;
        check_width(t, row, n_classes)
    } else {
        let row = t.to_vec_f64(value, "value")?;
        check_width(t, row, n_classes)
    }
}

fn check_width(t: &Attributes<'_>, row: Vec<f64>, n_classes: usize) -> Result<Vec<f64>> {
    if row.len() == n_classes {
        Ok(row)
    } else {
        Err(PorterError::incomplete(
            t.estimator(),
            format!("tree_ value has {} classes, expected {}", row.len(), n_classes),
        ))
    }
}

pub fn decision_tree(attrs: &Attributes<'_>) -> Result<CanonicalModel> {
    let classes = attrs.labels("classes_")?;
    let tree = tree(attrs, classes.len())?;
    Ok(CanonicalModel {
        n_features: n_features(attrs)?,
        classes,
        params: Parameters::DecisionTree(tree),
    })
}

fn ensemble_trees(attrs: &Attributes<'_>, n_classes: usize) -> Result<Vec<Tree>> {
    attrs
        .objects("estimators_")?
        .iter()
        .map(|estimator| tree(estimator, n_classes))
        .collect()
}

/// Random forests and extra trees: mean of the trees' leaf probabilities
pub fn forest(attrs: &Attributes<'_>) -> Result<CanonicalModel> {
    let classes = attrs.labels("classes_")?;
    let trees = ensemble_trees(attrs, classes.len())?;
    let weights = vec![1.0; trees.len()];
    Ok(CanonicalModel {
        n_features: n_features(attrs)?,
        classes,
        params: Parameters::TreeEnsemble(Ensemble {
            trees,
            weights,
            aggregation: Aggregation::Average,
        }),
    })
}

/// Discrete AdaBoost (SAMME): weighted class votes
pub fn adaboost(attrs: &Attributes<'_>) -> Result<CanonicalModel> {
    let algorithm = attrs.string_or("algorithm", "SAMME")?;
    if algorithm != "SAMME" {
        return Err(unsupported(attrs, format!("algorithm={}", algorithm)));
    }
    let classes = attrs.labels("classes_")?;
    let trees = ensemble_trees(attrs, classes.len())?;
    let mut weights = attrs.vec_f64("estimator_weights_")?;
    if weights.len() < trees.len() {
        return Err(PorterError::incomplete(
            attrs.estimator(),
            "estimator_weights_ is shorter than estimators_",
        ));
    }
    // boosting may stop early, leaving unused trailing weights
    weights.truncate(trees.len());
    Ok(CanonicalModel {
        n_features: n_features(attrs)?,
        classes,
        params: Parameters::TreeEnsemble(Ensemble {
            trees,
            weights,
            aggregation: Aggregation::Boost,
        }),
    })
}

fn gamma(attrs: &Attributes<'_>) -> Result<f64> {
    // `_gamma` holds the resolved value when gamma was 'scale' or 'auto'
    let value = attrs.get_any(&["_gamma", "gamma"])?;
    value.as_f64().ok_or_else(|| {
        PorterError::incomplete(attrs.estimator(), "gamma must be resolved to a number (`_gamma`)")
    })
}

/// SVC and NuSVC: kernel one-vs-one decomposition
pub fn svc(attrs: &Attributes<'_>) -> Result<CanonicalModel> {
    let classes = attrs.labels("classes_")?;
    let kernel = match attrs.string_or("kernel", "rbf")? {
        "linear" => Kernel::Linear,
        "poly" => Kernel::Poly {
            gamma: gamma(attrs)?,
            coef0: attrs.f64("coef0")?,
            degree: attrs.f64("degree")?,
        },
        "rbf" => Kernel::Rbf {
            gamma: gamma(attrs)?,
        },
        "sigmoid" => Kernel::Sigmoid {
            gamma: gamma(attrs)?,
            coef0: attrs.f64("coef0")?,
        },
        other => return Err(unsupported(attrs, format!("kernel={}", other))),
    };
    let support_vectors = attrs.matrix("support_vectors_")?;
    let n_support = attrs
        .get_any(&["n_support_", "_n_support"])
        .and_then(|v| attrs.to_vec_usize(v, "n_support_"))?;
    // libsvm's own signs; the public binary attributes are negated
    let (dual_coef, intercepts) = if attrs.has("_dual_coef_") && attrs.has("_intercept_") {
        (attrs.matrix("_dual_coef_")?, attrs.vec_f64("_intercept_")?)
    } else {
        let mut dual_coef = attrs.matrix("dual_coef_")?;
        let mut intercepts = attrs.vec_f64("intercept_")?;
        if classes.len() == 2 {
            dual_coef.iter_mut().flatten().for_each(|c| *c = -*c);
            intercepts.iter_mut().for_each(|b| *b = -*b);
        }
        (dual_coef, intercepts)
    };
    let n_features = support_vectors
        .first()
        .map(|sv| sv.len())
        .unwrap_or_default();
    Ok(CanonicalModel {
        n_features,
        classes,
        params: Parameters::Svm(Svm {
            kernel,
            decomposition: Decomposition::OneVsOne {
                support_vectors,
                n_support,
                dual_coef,
                intercepts,
            },
        }),
    })
}

/// LinearSVC: linear one-vs-rest scores
pub fn linear_svc(attrs: &Attributes<'_>) -> Result<CanonicalModel> {
    let classes = attrs.labels("classes_")?;
    let coef = attrs.matrix("coef_")?;
    let intercepts = attrs.vec_f64("intercept_")?;
    let n_features = coef.first().map(|c| c.len()).unwrap_or_default();
    Ok(CanonicalModel {
        n_features,
        classes,
        params: Parameters::Svm(Svm {
            kernel: Kernel::Linear,
            decomposition: Decomposition::OneVsRest { coef, intercepts },
        }),
    })
}

pub fn k_neighbors(attrs: &Attributes<'_>) -> Result<CanonicalModel> {
    let weights = attrs.string_or("weights", "uniform")?;
    if weights != "uniform" {
        return Err(unsupported(attrs, format!("weights={}", weights)));
    }
    let classes = attrs.labels("classes_")?;
    let samples = attrs.matrix("_fit_X")?;
    let labels = attrs.vec_usize("_y")?;
    let k = attrs.usize("n_neighbors")?;
    let metric_name = if attrs.has("effective_metric_") {
        attrs.string("effective_metric_")?
    } else {
        attrs.string_or("metric", "minkowski")?
    };
    let metric = match metric_name {
        "euclidean" | "l2" => Metric::Euclidean,
        "manhattan" | "cityblock" | "l1" => Metric::Manhattan,
        "chebyshev" | "infinity" => Metric::Chebyshev,
        "minkowski" => {
            let p = if attrs.has("p") { attrs.f64("p")? } else { 2.0 };
            if p == 2.0 {
                Metric::Euclidean
            } else if p == 1.0 {
                Metric::Manhattan
            } else {
                Metric::Minkowski { p }
            }
        }
        other => return Err(unsupported(attrs, format!("metric={}", other))),
    };
    let n_features = samples.first().map(|s| s.len()).unwrap_or_default();
    Ok(CanonicalModel {
        n_features,
        classes,
        params: Parameters::Knn(Knn {
            samples,
            labels,
            k,
            metric,
        }),
    })
}

pub fn gaussian_nb(attrs: &Attributes<'_>) -> Result<CanonicalModel> {
    let classes = attrs.labels("classes_")?;
    let priors = attrs.vec_f64("class_prior_")?;
    let means = attrs.matrix("theta_")?;
    let variances = attrs.to_matrix(attrs.get_any(&["var_", "sigma_"])?, "var_")?;
    let n_features = means.first().map(|m| m.len()).unwrap_or_default();
    Ok(CanonicalModel {
        n_features,
        classes,
        params: Parameters::NaiveBayesGaussian(GaussianNb {
            priors,
            means,
            variances,
        }),
    })
}

pub fn bernoulli_nb(attrs: &Attributes<'_>) -> Result<CanonicalModel> {
    let classes = attrs.labels("classes_")?;
    let class_log_prior = attrs.vec_f64("class_log_prior_")?;
    let feature_log_prob = attrs.matrix("feature_log_prob_")?;
    // binarize=None means the inputs are already 0/1
    let threshold = if attrs.has("binarize") {
        attrs.f64("binarize")?
    } else {
        0.0
    };
    let feature_log_neg_prob = feature_log_prob
        .iter()
        .map(|row| row.iter().map(|lp| (1.0 - lp.exp()).ln()).collect())
        .collect();
    let n_features = feature_log_prob.first().map(|r| r.len()).unwrap_or_default();
    Ok(CanonicalModel {
        n_features,
        classes,
        params: Parameters::NaiveBayesBernoulli(BernoulliNb {
            class_log_prior,
            feature_log_prob,
            feature_log_neg_prob,
            threshold,
        }),
    })
}

fn activation(attrs: &Attributes<'_>, name: &str) -> Result<Activation> {
    match name {
        "identity" => Ok(Activation::Identity),
        "logistic" => Ok(Activation::Logistic),
        "tanh" => Ok(Activation::Tanh),
        "relu" => Ok(Activation::Relu),
        "softmax" => Ok(Activation::Softmax),
        other => Err(unsupported(attrs, format!("activation={}", other))),
    }
}

pub fn mlp(attrs: &Attributes<'_>) -> Result<CanonicalModel> {
    let classes = attrs.labels("classes_")?;
    let coefs = attrs.matrices("coefs_")?;
    let intercepts = attrs.vectors("intercepts_")?;
    if coefs.len() != intercepts.len() {
        return Err(PorterError::incomplete(
            attrs.estimator(),
            "coefs_ and intercepts_ differ in length",
        ));
    }
    let hidden = activation(attrs, attrs.string_or("activation", "relu")?)?;
    let output = activation(attrs, attrs.string("out_activation_")?)?;
    if output == Activation::Logistic && classes.len() > 2 {
        return Err(unsupported(attrs, "multilabel output"));
    }
    let n_layers = coefs.len();
    let layers = coefs
        .into_iter()
        .zip(intercepts)
        .enumerate()
        .map(|(i, (weights, biases))| Layer {
            weights,
            biases,
            activation: if i + 1 == n_layers { output } else { hidden },
        })
        .collect::<Vec<_>>();
    let n_features = layers.first().map(|l| l.n_inputs()).unwrap_or_default();
    Ok(CanonicalModel {
        n_features,
        classes,
        params: Parameters::NeuralNet(NeuralNet { layers }),
    })
}
