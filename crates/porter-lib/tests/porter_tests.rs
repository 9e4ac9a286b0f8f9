//! End-to-end export and prediction through the `Porter` facade

mod common;

use porter_lib::{
    Classifier, EquivalenceChecker, Estimator, Features, Language, Method, PorterError, PredictOptions,
    Porter, Prediction, PredictionOutput,
};
use serde_json::json;

/// First installed language from a preference order, if any
fn any_language() -> Option<Language> {
    [
        Language::C,
        Language::JavaScript,
        Language::Ruby,
        Language::Php,
        Language::Go,
        Language::Java,
    ]
    .into_iter()
    .find(|l| common::toolchain_available(*l))
}

fn stump(threshold: f64) -> Estimator {
    Estimator::from_value(json!({
        "estimator": "DecisionTreeClassifier",
        "classes_": [0, 1],
        "n_features_in_": 1,
        "tree_": {
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [0, -2, -2],
            "threshold": [threshold, -2.0, -2.0],
            "value": [[[3.0, 3.0]], [[3.0, 0.0]], [[0.0, 3.0]]]
        }
    }))
    .unwrap()
}

/// `path` spelled relative to the current directory
#[cfg(unix)]
fn relative_to_cwd(path: &std::path::Path) -> std::path::PathBuf {
    let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
    let path = path.canonicalize().unwrap();
    let mut relative = std::path::PathBuf::new();
    for _ in cwd.components().skip(1) {
        relative.push("..");
    }
    relative.push(path.strip_prefix("/").unwrap());
    relative
}

fn four_decimals(value: f64) -> String {
    format!("{:.4}", value)
}

#[test]
fn test_filename_rule() {
    let estimator = common::decision_tree();
    let java = Porter::new(&estimator, Language::Java, Method::Predict).unwrap();
    assert_eq!(java.export_details("Brain", "predict").unwrap().filename, "Brain.java");
    let c = Porter::new(&estimator, Language::C, Method::Predict).unwrap();
    assert_eq!(c.export_details("Brain", "predict").unwrap().filename, "brain.c");
}

#[test]
fn test_unsupported_method_fails_before_any_work() {
    let err = Porter::new(&common::linear_svc(), Language::C, Method::PredictProba).unwrap_err();
    assert!(matches!(err, PorterError::UnsupportedMethod { .. }));
    assert!(err.is_configuration_error());
}

#[test]
fn test_batch_matches_single_rows() {
    let Some(language) = any_language() else {
        eprintln!("skipping: no toolchain installed");
        return;
    };
    let porter = Porter::new(&common::random_forest(), language, Method::Predict).unwrap();
    let rows = common::rows(8);
    let options = PredictOptions::default();

    let batch = porter
        .predict(&Features::Batch(rows.clone()), &options)
        .unwrap()
        .into_vec();
    assert_eq!(batch.len(), rows.len());

    for (row, expected) in rows.iter().zip(&batch) {
        match porter.predict(&Features::Single(row.clone()), &options).unwrap() {
            PredictionOutput::Single(single) => assert_eq!(&single, expected),
            other => panic!("expected a single prediction, got {:?}", other),
        }
    }
}

#[test]
fn test_kept_workspace_holds_artifact() {
    let Some(language) = any_language() else {
        eprintln!("skipping: no toolchain installed");
        return;
    };
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("kept");
    let porter = Porter::new(&common::gaussian_nb(), language, Method::PredictProba).unwrap();
    let options = PredictOptions::default()
        .with_workspace(&target)
        .keep_workspace(true);

    let output = porter
        .predict(&Features::Single(vec![0.5, -0.25, 1.0]), &options)
        .unwrap();
    match output {
        PredictionOutput::Single(Prediction::Probabilities(p)) => {
            assert_eq!(p.len(), 3);
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
        other => panic!("unexpected output {:?}", other),
    }
    assert!(target.join(language.filename("Brain")).exists());
}

#[test]
fn test_workspace_removed_after_failure() {
    let Some(language) = any_language() else {
        eprintln!("skipping: no toolchain installed");
        return;
    };
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("failed");
    let porter = Porter::new(&common::decision_tree(), language, Method::Predict).unwrap();
    let options = PredictOptions::default()
        .with_workspace(&target)
        .keep_workspace(true);

    // "-" is not an identifier, caught before the workspace exists
    let err = porter
        .predict(
            &Features::Single(vec![0.0; 3]),
            &PredictOptions {
                class_name: "my-brain".to_string(),
                ..options.clone()
            },
        )
        .unwrap_err();
    assert!(matches!(err, PorterError::InvalidName { .. }));
    assert!(!target.exists());

    let err = porter
        .predict(&Features::Single(vec![0.0; 2]), &options)
        .unwrap_err();
    assert!(matches!(err, PorterError::FeatureCountMismatch { .. }));
    assert!(!target.exists());
}

#[test]
fn test_lossy_threshold_literal_diverges() {
    if !common::toolchain_available(Language::C) {
        eprintln!("skipping: gcc not installed");
        return;
    }
    let estimator = stump(0.12345678);
    // just above the threshold, below its 4-decimal rounding
    let rows = vec![vec![0.12349], vec![-1.0], vec![1.0], vec![0.1234]];

    let exact = Porter::new(&estimator, Language::C, Method::Predict).unwrap();
    let report = EquivalenceChecker::new(&exact)
        .check(exact.reference(), &rows, &PredictOptions::default())
        .unwrap();
    assert!(report.passed());

    let lossy = Porter::new(&estimator, Language::C, Method::Predict)
        .unwrap()
        .with_number_format(four_decimals);
    let report = EquivalenceChecker::new(&lossy)
        .check(lossy.reference(), &rows, &PredictOptions::default())
        .unwrap();
    let divergences = report.divergences();
    assert_eq!(divergences.len(), 1);
    assert_eq!(divergences[0].index, 0);
    assert!(matches!(
        report.into_result(),
        Err(PorterError::DivergentPrediction { first: 0, .. })
    ));
}

#[cfg(unix)]
#[test]
fn test_relative_workspace_runs_compiled_code() {
    let Some(language) = [Language::C, Language::Go]
        .into_iter()
        .find(|l| common::toolchain_available(*l))
    else {
        eprintln!("skipping: no compiled toolchain installed");
        return;
    };
    let root = tempfile::tempdir().unwrap();
    let target = relative_to_cwd(root.path()).join("tmp");
    assert!(target.is_relative());

    let porter = Porter::new(&common::decision_tree(), language, Method::Predict).unwrap();
    let features = vec![0.0, 0.0, 0.0];
    let expected = porter.reference().evaluate(Method::Predict, &features).unwrap();
    let output = porter
        .predict(
            &Features::Single(features),
            &PredictOptions::default().with_workspace(&target),
        )
        .unwrap();
    assert_eq!(output.into_vec(), vec![expected]);
    assert!(!root.path().join("tmp").exists());
}

#[test]
fn test_single_tree_forest_matches_tree() {
    let tree_ = json!({
        "children_left": [1, -1, -1],
        "children_right": [2, -1, -1],
        "feature": [0, -2, -2],
        "threshold": [0.5, -2.0, -2.0],
        "value": [[[5.0, 4.0]], [[5.0, 1.0]], [[0.0, 3.0]]]
    });
    let tree = Estimator::from_value(json!({
        "estimator": "DecisionTreeClassifier",
        "classes_": [0, 1],
        "n_features_in_": 1,
        "tree_": tree_.clone()
    }))
    .unwrap();
    let forest = Estimator::from_value(json!({
        "estimator": "RandomForestClassifier",
        "classes_": [0, 1],
        "n_features_in_": 1,
        "estimators_": [{"tree_": tree_}]
    }))
    .unwrap();
    let tree = Porter::new(&tree, Language::JavaScript, Method::PredictProba).unwrap();
    let forest = Porter::new(&forest, Language::JavaScript, Method::PredictProba).unwrap();

    for x in [0.0, 1.0] {
        assert_eq!(
            forest.reference().predict_proba(&[x]).unwrap(),
            tree.reference().predict_proba(&[x]).unwrap()
        );
    }
    let proba = forest.reference().predict_proba(&[0.0]).unwrap();
    assert_eq!(proba, vec![5.0 / 6.0, 1.0 / 6.0]);

    if common::toolchain_available(Language::JavaScript) {
        let ported = forest
            .predict(&Features::Single(vec![0.0]), &PredictOptions::default())
            .unwrap();
        assert_eq!(ported.into_vec(), vec![Prediction::Probabilities(proba)]);
    }
}

#[test]
fn test_non_finite_features_rejected() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("ws");
    let porter = Porter::new(&common::decision_tree(), Language::JavaScript, Method::Predict).unwrap();
    let err = porter
        .predict(
            &Features::Batch(vec![vec![0.0, 0.0, 0.0], vec![f64::NEG_INFINITY, 0.0, 0.0]]),
            &PredictOptions::default().with_workspace(&target),
        )
        .unwrap_err();
    assert!(matches!(err, PorterError::NonFiniteFeature { feature: 0, .. }));
    assert!(err.is_configuration_error());
    assert!(!target.exists());
}
