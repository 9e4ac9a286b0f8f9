//! Core data models shared by the introspector, renderer and harness

use crate::error::{PorterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Structural category of a model, selecting the rendering routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    DecisionTree,
    TreeEnsemble,
    Svm,
    Knn,
    NaiveBayesGaussian,
    NaiveBayesBernoulli,
    NeuralNet,
}

impl Family {
    pub const ALL: [Family; 7] = [
        Family::DecisionTree,
        Family::TreeEnsemble,
        Family::Svm,
        Family::Knn,
        Family::NaiveBayesGaussian,
        Family::NaiveBayesBernoulli,
        Family::NeuralNet,
    ];
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::DecisionTree => "DecisionTree",
            Family::TreeEnsemble => "TreeEnsemble",
            Family::Svm => "SVM",
            Family::Knn => "KNN",
            Family::NaiveBayesGaussian => "NaiveBayesGaussian",
            Family::NaiveBayesBernoulli => "NaiveBayesBernoulli",
            Family::NeuralNet => "NeuralNet",
        };
        f.write_str(name)
    }
}

/// Target prediction method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Predict,
    PredictProba,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Predict => "predict",
            Method::PredictProba => "predict_proba",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = PorterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "predict" => Ok(Method::Predict),
            "predict_proba" => Ok(Method::PredictProba),
            other => Err(PorterError::UnsupportedMethod {
                method: other.to_string(),
                estimator: "any".to_string(),
            }),
        }
    }
}

/// Algorithm category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Classifier,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("classifier")
    }
}

/// Target programming language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Go,
    Java,
    #[serde(rename = "js")]
    JavaScript,
    Php,
    Ruby,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::C,
        Language::Go,
        Language::Java,
        Language::JavaScript,
        Language::Php,
        Language::Ruby,
    ];

    /// Short identifier, as accepted by `FromStr`
    pub fn id(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Go => "go",
            Language::Java => "java",
            Language::JavaScript => "js",
            Language::Php => "php",
            Language::Ruby => "ruby",
        }
    }

    /// Source file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Ruby => "rb",
            other => other.id(),
        }
    }

    /// File stem for a class name: lower-cased, except Java which also
    /// capitalizes the first letter so the file matches its public class
    pub fn file_stem(&self, class_name: &str) -> String {
        let lower = class_name.to_lowercase();
        match self {
            Language::Java => capitalize(&lower),
            _ => lower,
        }
    }

    /// Source file name for a class name, e.g. `Brain.java` or `brain.c`
    pub fn filename(&self, class_name: &str) -> String {
        format!("{}.{}", self.file_stem(class_name), self.extension())
    }
}

/// Upper-case the first character, leaving the rest untouched
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Language {
    type Err = PorterError;

    fn from_str(s: &str) -> Result<Self> {
        let id = s.trim().to_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|l| l.id() == id)
            .ok_or(PorterError::UnsupportedLanguage {
                language: id,
                family: None,
            })
    }
}

/// Description of an introspected algorithm, fixed at introspection time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlgorithmDescriptor {
    /// Estimator class name, e.g. `RandomForestClassifier`
    pub estimator: String,
    pub family: Family,
    pub category: Category,
    pub methods: Vec<Method>,
}

impl AlgorithmDescriptor {
    pub fn supports(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    /// Fail with `UnsupportedMethod` unless `method` is supported
    pub fn require(&self, method: Method) -> Result<()> {
        if self.supports(method) {
            Ok(())
        } else {
            Err(PorterError::UnsupportedMethod {
                method: method.to_string(),
                estimator: self.estimator.clone(),
            })
        }
    }
}

/// Output of one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    Label(i64),
    Probabilities(Vec<f64>),
}

impl Prediction {
    pub fn label(&self) -> Option<i64> {
        match self {
            Prediction::Label(label) => Some(*label),
            Prediction::Probabilities(_) => None,
        }
    }

    pub fn probabilities(&self) -> Option<&[f64]> {
        match self {
            Prediction::Label(_) => None,
            Prediction::Probabilities(p) => Some(p),
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Label(label) => write!(f, "{}", label),
            Prediction::Probabilities(p) => {
                let parts: Vec<String> = p.iter().map(|v| format!("{:.6}", v)).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// A single feature vector or an `(m, f)` batch
#[derive(Debug, Clone, PartialEq)]
pub enum Features {
    Single(Vec<f64>),
    Batch(Vec<Vec<f64>>),
}

impl Features {
    /// View as rows, a single vector being a batch of one
    pub fn rows(&self) -> Vec<&[f64]> {
        match self {
            Features::Single(row) => vec![row.as_slice()],
            Features::Batch(rows) => rows.iter().map(|r| r.as_slice()).collect(),
        }
    }
}

/// Predictions shaped like the input `Features`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    Single(Prediction),
    Batch(Vec<Prediction>),
}

impl PredictionOutput {
    pub fn into_vec(self) -> Vec<Prediction> {
        match self {
            PredictionOutput::Single(p) => vec![p],
            PredictionOutput::Batch(ps) => ps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("java".parse::<Language>().unwrap(), Language::Java);
        assert_eq!(" JS ".parse::<Language>().unwrap(), Language::JavaScript);
        assert!(matches!(
            "cobol".parse::<Language>(),
            Err(PorterError::UnsupportedLanguage { .. })
        ));
    }

    #[test]
    fn test_filename_rule() {
        assert_eq!(Language::Java.filename("Brain"), "Brain.java");
        assert_eq!(Language::Java.filename("MyModel"), "Mymodel.java");
        assert_eq!(Language::C.filename("Brain"), "brain.c");
        assert_eq!(Language::JavaScript.filename("Brain"), "brain.js");
        assert_eq!(Language::Ruby.filename("Brain"), "brain.rb");
        assert_eq!(Language::Go.file_stem("Brain"), "brain");
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("predict_proba".parse::<Method>().unwrap(), Method::PredictProba);
        assert!(matches!(
            "decision_function".parse::<Method>(),
            Err(PorterError::UnsupportedMethod { .. })
        ));
    }

    #[test]
    fn test_descriptor_require() {
        let descriptor = AlgorithmDescriptor {
            estimator: "SVC".to_string(),
            family: Family::Svm,
            category: Category::Classifier,
            methods: vec![Method::Predict],
        };
        assert!(descriptor.require(Method::Predict).is_ok());
        assert!(descriptor.require(Method::PredictProba).is_err());
    }

    #[test]
    fn test_features_rows() {
        let single = Features::Single(vec![1.0, 2.0]);
        assert_eq!(single.rows().len(), 1);

        let batch = Features::Batch(vec![vec![1.0], vec![2.0], vec![3.0]]);
        assert_eq!(batch.rows().len(), 3);
    }
}
