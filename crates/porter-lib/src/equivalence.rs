//! Equivalence checking
//!
//! Runs the source classifier and the ported artifact over the same rows
//! and compares them sample by sample. Labels must match exactly;
//! probabilities must agree within a relative tolerance.

use crate::error::{PorterError, Result};
use crate::models::{Family, Language, Method, Prediction};
use crate::observability::StructuredLogger;
use crate::porter::{PredictOptions, Porter};
use crate::reference::Classifier;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default relative tolerance for probabilities
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Comparison of one sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleOutcome {
    pub index: usize,
    pub features: Vec<f64>,
    pub expected: Prediction,
    pub actual: Prediction,
    pub matched: bool,
}

/// Per-sample outcomes of one equivalence check
#[derive(Debug, Clone, Serialize)]
pub struct EquivalenceReport {
    pub estimator: String,
    pub family: Family,
    pub language: Language,
    pub method: Method,
    pub tolerance: f64,
    pub outcomes: Vec<SampleOutcome>,
    pub checked_at: DateTime<Utc>,
}

impl EquivalenceReport {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.matched)
    }

    pub fn divergences(&self) -> Vec<&SampleOutcome> {
        self.outcomes.iter().filter(|o| !o.matched).collect()
    }

    /// Fraction of matching samples; 1.0 for an empty check
    pub fn match_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 1.0;
        }
        let matched = self.outcomes.iter().filter(|o| o.matched).count();
        matched as f64 / self.outcomes.len() as f64
    }

    /// `DivergentPrediction` unless every sample matched
    pub fn into_result(self) -> Result<Self> {
        match self.outcomes.iter().find(|o| !o.matched) {
            None => Ok(self),
            Some(first) => Err(PorterError::DivergentPrediction {
                diverged: self.divergences().len(),
                total: self.outcomes.len(),
                first: first.index,
            }),
        }
    }
}

/// Compares a `Porter`'s generated code against a source classifier
pub struct EquivalenceChecker<'p> {
    porter: &'p Porter,
    tolerance: f64,
    logger: StructuredLogger,
}

impl<'p> EquivalenceChecker<'p> {
    pub fn new(porter: &'p Porter) -> Self {
        Self {
            porter,
            tolerance: DEFAULT_TOLERANCE,
            logger: StructuredLogger::new("equivalence"),
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Evaluate `source` and the ported artifact on every row
    ///
    /// Divergences are reported, not raised; use `into_result` to gate on them.
    pub fn check(
        &self,
        source: &dyn Classifier,
        rows: &[Vec<f64>],
        options: &PredictOptions,
    ) -> Result<EquivalenceReport> {
        let method = self.porter.method();
        let expected = rows
            .iter()
            .map(|row| source.evaluate(method, row))
            .collect::<Result<Vec<_>>>()?;

        let views: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let actual = self.porter.predict_rows(&views, options)?;

        let language = self.porter.language();
        let outcomes: Vec<SampleOutcome> = rows
            .iter()
            .zip(expected)
            .zip(actual)
            .enumerate()
            .map(|(index, ((row, expected), actual))| {
                let matched = agrees(&expected, &actual, self.tolerance);
                if !matched {
                    self.logger
                        .log_prediction_diverged(language, index, &expected, &actual);
                }
                SampleOutcome {
                    index,
                    features: row.clone(),
                    expected,
                    actual,
                    matched,
                }
            })
            .collect();

        let descriptor = self.porter.descriptor();
        let report = EquivalenceReport {
            estimator: descriptor.estimator.clone(),
            family: descriptor.family,
            language,
            method,
            tolerance: self.tolerance,
            outcomes,
            checked_at: Utc::now(),
        };
        self.logger.log_equivalence_checked(
            report.family,
            report.language,
            report.outcomes.len(),
            report.divergences().len(),
        );
        Ok(report)
    }
}

/// Exact labels; probabilities within `tolerance` relative to max(1, |a|, |b|)
pub fn agrees(expected: &Prediction, actual: &Prediction, tolerance: f64) -> bool {
    match (expected, actual) {
        (Prediction::Label(a), Prediction::Label(b)) => a == b,
        (Prediction::Probabilities(a), Prediction::Probabilities(b)) => {
            a.len() == b.len()
                && a.iter().zip(b).all(|(x, y)| {
                    let scale = 1.0f64.max(x.abs()).max(y.abs());
                    (x - y).abs() <= tolerance * scale
                })
        }
        _ => false,
    }
}

/// Replays outputs recorded from the original model
///
/// Lets predictions produced elsewhere, e.g. by the training library,
/// serve as the source side of a check.
#[derive(Debug, Clone, Default)]
pub struct RecordedClassifier {
    records: Vec<(Vec<f64>, Prediction)>,
}

impl RecordedClassifier {
    pub fn new(rows: Vec<Vec<f64>>, outputs: Vec<Prediction>) -> Self {
        Self {
            records: rows.into_iter().zip(outputs).collect(),
        }
    }

    pub fn record(&mut self, features: Vec<f64>, output: Prediction) {
        self.records.push((features, output));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn lookup(&self, features: &[f64]) -> Result<&Prediction> {
        self.records
            .iter()
            .find(|(row, _)| row.as_slice() == features)
            .map(|(_, output)| output)
            .ok_or_else(|| PorterError::incomplete("recorded", "no recorded output for sample"))
    }

    fn wrong_kind(method: Method) -> PorterError {
        PorterError::UnsupportedMethod {
            method: method.to_string(),
            estimator: "recorded".to_string(),
        }
    }
}

impl Classifier for RecordedClassifier {
    fn predict(&self, features: &[f64]) -> Result<i64> {
        self.lookup(features)?
            .label()
            .ok_or_else(|| Self::wrong_kind(Method::Predict))
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        self.lookup(features)?
            .probabilities()
            .map(|p| p.to_vec())
            .ok_or_else(|| Self::wrong_kind(Method::PredictProba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn outcome(index: usize, matched: bool) -> SampleOutcome {
        SampleOutcome {
            index,
            features: vec![index as f64],
            expected: Prediction::Label(1),
            actual: Prediction::Label(if matched { 1 } else { 0 }),
            matched,
        }
    }

    fn report(outcomes: Vec<SampleOutcome>) -> EquivalenceReport {
        EquivalenceReport {
            estimator: "GaussianNB".to_string(),
            family: Family::NaiveBayesGaussian,
            language: Language::C,
            method: Method::Predict,
            tolerance: DEFAULT_TOLERANCE,
            outcomes,
            checked_at: Utc::now(),
        }
    }

    #[test]
    fn test_labels_compare_exactly() {
        assert!(agrees(&Prediction::Label(3), &Prediction::Label(3), 0.5));
        assert!(!agrees(&Prediction::Label(3), &Prediction::Label(4), 10.0));
        assert!(!agrees(
            &Prediction::Label(1),
            &Prediction::Probabilities(vec![1.0]),
            1.0
        ));
    }

    #[test]
    fn test_probabilities_within_relative_tolerance() {
        let a = Prediction::Probabilities(vec![0.25, 0.75]);
        let close = Prediction::Probabilities(vec![0.25 + 1e-12, 0.75 - 1e-12]);
        let far = Prediction::Probabilities(vec![0.2501, 0.7499]);
        let short = Prediction::Probabilities(vec![0.25]);
        assert!(agrees(&a, &close, DEFAULT_TOLERANCE));
        assert!(!agrees(&a, &far, DEFAULT_TOLERANCE));
        assert!(!agrees(&a, &short, DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_report_summary() {
        let r = report(vec![outcome(0, true), outcome(1, false), outcome(2, true), outcome(3, false)]);
        assert!(!r.passed());
        assert_eq!(r.divergences().len(), 2);
        assert_eq!(r.match_rate(), 0.5);
        assert!(r.checked_at <= Utc::now() + Duration::seconds(1));

        match r.into_result() {
            Err(PorterError::DivergentPrediction {
                diverged,
                total,
                first,
            }) => {
                assert_eq!((diverged, total, first), (2, 4, 1));
            }
            other => panic!("unexpected {:?}", other.map(|r| r.outcomes.len())),
        }
    }

    #[test]
    fn test_empty_report_passes() {
        let r = report(Vec::new());
        assert!(r.passed());
        assert_eq!(r.match_rate(), 1.0);
        assert!(r.into_result().is_ok());
    }

    #[test]
    fn test_recorded_classifier_replays() {
        let mut recorded = RecordedClassifier::new(
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
            vec![Prediction::Label(7), Prediction::Label(-2)],
        );
        recorded.record(vec![5.0, 5.0], Prediction::Probabilities(vec![0.5, 0.5]));
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded.predict(&[1.0, 0.0]).unwrap(), -2);
        assert_eq!(
            recorded.evaluate(Method::Predict, &[0.0, 1.0]).unwrap(),
            Prediction::Label(7)
        );
        assert_eq!(recorded.predict_proba(&[5.0, 5.0]).unwrap(), vec![0.5, 0.5]);
        assert!(matches!(
            recorded.predict_proba(&[0.0, 1.0]),
            Err(PorterError::UnsupportedMethod { .. })
        ));
        assert!(matches!(
            recorded.predict(&[9.0, 9.0]),
            Err(PorterError::IncompleteModel { .. })
        ));
    }
}
