//! Model introspection
//!
//! Turns a JSON dump of a fitted estimator into an `AlgorithmDescriptor`
//! and a validated `CanonicalModel`. Supported estimators are listed in a
//! static registry; anything else is `UnsupportedAlgorithm`.

mod attributes;
pub mod canonical;
mod estimators;

pub use canonical::*;

use crate::error::{PorterError, Result};
use crate::models::{AlgorithmDescriptor, Category, Family, Method};
use attributes::Attributes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// A fitted estimator as dumped from its training environment
///
/// ```json
/// {"estimator": "GaussianNB", "classes_": [0, 1], "theta_": [[...]], ...}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimator {
    /// Estimator class name, e.g. `DecisionTreeClassifier`
    #[serde(rename = "estimator")]
    pub name: String,
    /// Fitted attributes keyed by their scikit-learn names
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Estimator {
    pub fn new(name: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| PorterError::workspace(path, e))?;
        Self::from_json(&text)
    }
}

type Extract = fn(&Attributes<'_>) -> Result<CanonicalModel>;

/// One supported estimator type
struct Entry {
    name: &'static str,
    family: Family,
    methods: &'static [Method],
    extract: Extract,
}

const BOTH: &[Method] = &[Method::Predict, Method::PredictProba];
const PREDICT: &[Method] = &[Method::Predict];

static REGISTRY: &[Entry] = &[
    Entry {
        name: "DecisionTreeClassifier",
        family: Family::DecisionTree,
        methods: BOTH,
        extract: estimators::decision_tree,
    },
    Entry {
        name: "RandomForestClassifier",
        family: Family::TreeEnsemble,
        methods: BOTH,
        extract: estimators::forest,
    },
    Entry {
        name: "ExtraTreesClassifier",
        family: Family::TreeEnsemble,
        methods: BOTH,
        extract: estimators::forest,
    },
    Entry {
        name: "AdaBoostClassifier",
        family: Family::TreeEnsemble,
        methods: PREDICT,
        extract: estimators::adaboost,
    },
    Entry {
        name: "SVC",
        family: Family::Svm,
        methods: PREDICT,
        extract: estimators::svc,
    },
    Entry {
        name: "NuSVC",
        family: Family::Svm,
        methods: PREDICT,
        extract: estimators::svc,
    },
    Entry {
        name: "LinearSVC",
        family: Family::Svm,
        methods: PREDICT,
        extract: estimators::linear_svc,
    },
    Entry {
        name: "KNeighborsClassifier",
        family: Family::Knn,
        methods: BOTH,
        extract: estimators::k_neighbors,
    },
    Entry {
        name: "GaussianNB",
        family: Family::NaiveBayesGaussian,
        methods: BOTH,
        extract: estimators::gaussian_nb,
    },
    Entry {
        name: "BernoulliNB",
        family: Family::NaiveBayesBernoulli,
        methods: BOTH,
        extract: estimators::bernoulli_nb,
    },
    Entry {
        name: "MLPClassifier",
        family: Family::NeuralNet,
        methods: BOTH,
        extract: estimators::mlp,
    },
];

/// Names and families of every supported estimator
pub fn supported_estimators() -> Vec<(&'static str, Family)> {
    REGISTRY.iter().map(|e| (e.name, e.family)).collect()
}

/// Descriptor of a supported estimator name, without extracting anything
pub fn describe(name: &str) -> Result<AlgorithmDescriptor> {
    REGISTRY
        .iter()
        .find(|e| e.name == name)
        .map(descriptor)
        .ok_or_else(|| PorterError::UnsupportedAlgorithm(name.to_string()))
}

fn descriptor(entry: &Entry) -> AlgorithmDescriptor {
    AlgorithmDescriptor {
        estimator: entry.name.to_string(),
        family: entry.family,
        category: Category::Classifier,
        methods: entry.methods.to_vec(),
    }
}

/// Extract and validate the canonical parameters of a fitted estimator
///
/// Pure: reads the dump, never modifies it.
pub fn introspect(estimator: &Estimator) -> Result<(AlgorithmDescriptor, CanonicalModel)> {
    let entry = REGISTRY
        .iter()
        .find(|e| e.name == estimator.name)
        .ok_or_else(|| PorterError::UnsupportedAlgorithm(estimator.name.clone()))?;

    let attrs = Attributes::new(entry.name, &estimator.attributes);
    let model = (entry.extract)(&attrs)?;
    model.validate(entry.name)?;

    tracing::debug!(
        estimator = entry.name,
        family = %entry.family,
        classes = model.n_classes(),
        features = model.n_features,
        "Introspected estimator"
    );
    Ok((descriptor(entry), model))
}
