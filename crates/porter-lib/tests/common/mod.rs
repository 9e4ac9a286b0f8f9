//! Shared fixtures: hand-built dumps of fitted estimators

#![allow(dead_code)]

use porter_lib::harness::{dependencies, PathProbe, ToolchainProbe};
use porter_lib::{Estimator, Language};
use serde_json::{json, Value};

pub const N_FEATURES: usize = 3;

/// Deterministic rows spread over [-2, 2] in every feature
pub fn rows(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            (0..N_FEATURES)
                .map(|j| ((i * 37 + j * 11 + i * j * 5) % 41) as f64 / 10.0 - 2.0)
                .collect()
        })
        .collect()
}

/// Whether this machine can build and run `language`
pub fn toolchain_available(language: Language) -> bool {
    dependencies(language)
        .iter()
        .all(|exe| PathProbe.is_available(exe))
}

/// Depth-2 tree over three classes; the last leaf ties classes 1 and 2
fn tree(root: (i64, f64), left: (i64, f64), right: (i64, f64)) -> Value {
    json!({
        "children_left": [1, 3, 5, -1, -1, -1, -1],
        "children_right": [2, 4, 6, -1, -1, -1, -1],
        "feature": [root.0, left.0, right.0, -2, -2, -2, -2],
        "threshold": [root.1, left.1, right.1, -2.0, -2.0, -2.0, -2.0],
        "value": [
            [[8.0, 8.0, 10.0]],
            [[5.0, 5.0, 1.0]],
            [[3.0, 3.0, 9.0]],
            [[5.0, 1.0, 0.0]],
            [[0.0, 4.0, 1.0]],
            [[1.0, 0.0, 6.0]],
            [[2.0, 3.0, 3.0]]
        ]
    })
}

pub fn decision_tree() -> Estimator {
    estimator(json!({
        "estimator": "DecisionTreeClassifier",
        "classes_": [0, 1, 2],
        "n_features_in_": N_FEATURES,
        "tree_": tree((0, 0.3), (2, -0.75), (1, 1.1))
    }))
}

fn trees() -> Value {
    json!([
        {"tree_": tree((0, 0.3), (2, -0.75), (1, 1.1))},
        {"tree_": tree((1, -0.2), (0, -1.05), (2, 0.45))},
        {"tree_": tree((2, 0.8), (1, 0.15), (0, -0.6))},
        {"tree_": tree((1, 0.55), (2, 1.35), (0, 0.05))}
    ])
}

pub fn random_forest() -> Estimator {
    estimator(json!({
        "estimator": "RandomForestClassifier",
        "classes_": [0, 1, 2],
        "n_features_in_": N_FEATURES,
        "estimators_": trees()
    }))
}

pub fn extra_trees() -> Estimator {
    estimator(json!({
        "estimator": "ExtraTreesClassifier",
        "classes_": [0, 1, 2],
        "n_features_in_": N_FEATURES,
        "estimators_": trees()
    }))
}

pub fn adaboost() -> Estimator {
    estimator(json!({
        "estimator": "AdaBoostClassifier",
        "algorithm": "SAMME",
        "classes_": [0, 1, 2],
        "n_features_in_": N_FEATURES,
        "estimators_": trees(),
        "estimator_weights_": [1.2, 0.7, 0.95, 0.4, 0.0]
    }))
}

pub fn svc() -> Estimator {
    estimator(json!({
        "estimator": "SVC",
        "kernel": "rbf",
        "gamma": "scale",
        "_gamma": 0.35,
        "classes_": [0, 1, 2],
        "n_features_in_": N_FEATURES,
        "support_vectors_": [
            [-1.0, -0.5, 0.2],
            [-1.5, 0.3, -0.8],
            [0.4, 1.2, 0.9],
            [1.6, -1.1, 0.0],
            [1.1, 0.6, -1.4]
        ],
        "n_support_": [2, 1, 2],
        "dual_coef_": [
            [0.8, 1.0, -0.6, -0.9, -0.3],
            [0.5, 0.2, 1.0, -1.0, -0.7]
        ],
        "intercept_": [0.1, -0.25, 0.05]
    }))
}

pub fn nu_svc() -> Estimator {
    estimator(json!({
        "estimator": "NuSVC",
        "kernel": "poly",
        "_gamma": 0.5,
        "coef0": 1.0,
        "degree": 3,
        "classes_": [-1, 1],
        "n_features_in_": N_FEATURES,
        "support_vectors_": [
            [-1.0, -0.5, 0.2],
            [0.4, 1.2, 0.9],
            [1.6, -1.1, 0.0]
        ],
        "n_support_": [1, 2],
        "dual_coef_": [[-0.6, 0.25, 0.35]],
        "intercept_": [0.15]
    }))
}

pub fn linear_svc() -> Estimator {
    estimator(json!({
        "estimator": "LinearSVC",
        "classes_": [10, 20, 30],
        "n_features_in_": N_FEATURES,
        "coef_": [[0.9, -0.4, 0.1], [-0.3, 0.8, -0.5], [-0.6, -0.2, 0.7]],
        "intercept_": [0.05, -0.1, 0.2]
    }))
}

pub fn k_neighbors() -> Estimator {
    estimator(json!({
        "estimator": "KNeighborsClassifier",
        "classes_": [0, 1, 2],
        "n_neighbors": 3,
        "weights": "uniform",
        "metric": "minkowski",
        "p": 2,
        "_fit_X": [
            [-1.5, -1.0, 0.5],
            [-1.0, 1.0, -0.5],
            [0.0, 0.0, 0.0],
            [0.5, -1.5, 1.5],
            [1.0, 1.0, 1.0],
            [1.5, -0.5, -1.0],
            [-0.5, 1.5, 1.0],
            [2.0, 0.5, -1.5]
        ],
        "_y": [0, 1, 2, 0, 1, 2, 1, 0]
    }))
}

pub fn gaussian_nb() -> Estimator {
    estimator(json!({
        "estimator": "GaussianNB",
        "classes_": [0, 1, 2],
        "n_features_in_": N_FEATURES,
        "class_prior_": [0.3, 0.45, 0.25],
        "theta_": [[-1.0, 0.5, 0.0], [0.5, -0.5, 1.0], [1.2, 1.0, -0.8]],
        "var_": [[0.6, 1.1, 0.9], [1.4, 0.7, 0.5], [0.8, 0.9, 1.3]]
    }))
}

pub fn bernoulli_nb() -> Estimator {
    estimator(json!({
        "estimator": "BernoulliNB",
        "classes_": [0, 1],
        "n_features_in_": N_FEATURES,
        "binarize": 0.5,
        "class_log_prior_": [0.4f64.ln(), 0.6f64.ln()],
        "feature_log_prob_": [
            [0.2f64.ln(), 0.7f64.ln(), 0.45f64.ln()],
            [0.65f64.ln(), 0.3f64.ln(), 0.55f64.ln()]
        ]
    }))
}

pub fn mlp() -> Estimator {
    estimator(json!({
        "estimator": "MLPClassifier",
        "activation": "relu",
        "out_activation_": "softmax",
        "classes_": [0, 1, 2],
        "n_features_in_": N_FEATURES,
        "coefs_": [
            [[0.5, -0.8, 0.3, 1.1], [-0.4, 0.9, 0.7, -0.2], [1.0, 0.1, -0.6, 0.4]],
            [[0.7, -0.5, 0.2], [-0.3, 0.8, -0.9], [0.6, 0.4, -0.1], [-1.0, 0.2, 0.9]]
        ],
        "intercepts_": [[0.1, -0.2, 0.05, 0.0], [0.0, 0.1, -0.1]]
    }))
}

pub fn binary_mlp() -> Estimator {
    estimator(json!({
        "estimator": "MLPClassifier",
        "activation": "tanh",
        "out_activation_": "logistic",
        "classes_": [0, 1],
        "n_features_in_": N_FEATURES,
        "coefs_": [
            [[0.5, -0.8], [-0.4, 0.9], [1.0, 0.1]],
            [[1.3], [-0.7]]
        ],
        "intercepts_": [[0.1, -0.2], [0.05]]
    }))
}

/// One fixture per supported estimator, plus a binary network
pub fn all() -> Vec<(&'static str, Estimator)> {
    vec![
        ("decision_tree", decision_tree()),
        ("random_forest", random_forest()),
        ("extra_trees", extra_trees()),
        ("adaboost", adaboost()),
        ("svc", svc()),
        ("nu_svc", nu_svc()),
        ("linear_svc", linear_svc()),
        ("k_neighbors", k_neighbors()),
        ("gaussian_nb", gaussian_nb()),
        ("bernoulli_nb", bernoulli_nb()),
        ("mlp", mlp()),
        ("binary_mlp", binary_mlp()),
    ]
}

fn estimator(value: Value) -> Estimator {
    Estimator::from_value(value).unwrap()
}
