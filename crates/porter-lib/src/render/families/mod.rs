//! Family builders: `CanonicalModel` + method -> `Program`
//!
//! Each builder mirrors the operation order of `reference::Classifier` so
//! label decisions in the generated code match the native evaluation.

mod bayes;
mod ensemble;
mod knn;
mod mlp;
mod svm;
mod tree;

use super::ir::*;
use crate::error::{PorterError, Result};
use crate::introspect::CanonicalModel;
use crate::models::{Family, Method};

/// Lowers one family of models into a program
pub type Builder = fn(&CanonicalModel, Method) -> Result<Program>;

/// The builder for a family
pub fn builder(family: Family) -> Builder {
    match family {
        Family::DecisionTree => tree::build,
        Family::TreeEnsemble => ensemble::build,
        Family::Svm => svm::build,
        Family::Knn => knn::build,
        Family::NaiveBayesGaussian => bayes::build_gaussian,
        Family::NaiveBayesBernoulli => bayes::build_bernoulli,
        Family::NeuralNet => mlp::build,
    }
}

fn mismatch(model: &CanonicalModel, expected: Family) -> PorterError {
    PorterError::UnsupportedAlgorithm(format!(
        "{} parameters given to the {} renderer",
        model.family(),
        expected
    ))
}

fn unsupported_method(method: Method, family: Family) -> PorterError {
    PorterError::UnsupportedMethod {
        method: method.to_string(),
        estimator: family.to_string(),
    }
}

fn classes(model: &CanonicalModel) -> Global {
    Global::ints("CLASSES", model.classes.clone())
}

/// Program shell with the class labels and the output shape filled in
fn program(model: &CanonicalModel, method: Method) -> Program {
    let (output, n_outputs) = match method {
        Method::Predict => (Output::Label, 1),
        Method::PredictProba => (Output::Probabilities, model.n_classes()),
    };
    Program {
        globals: vec![classes(model)],
        helpers: Vec::new(),
        entry: Vec::new(),
        output,
        n_features: model.n_features,
        n_outputs,
    }
}

fn features() -> Expr {
    local("features")
}

/// `target = target + by`
fn increment(target: Expr, by: Expr) -> Stmt {
    assign(target.clone(), target + by)
}

/// Index of the largest value of `array` into `best`, lowest index on ties
fn argmax_into(array: &str, n: usize) -> Vec<Stmt> {
    vec![
        declare_int("best", int(0)),
        for_range(
            "c",
            1,
            n,
            vec![if_then(
                local(array).at(local("c")).gt(local(array).at(local("best"))),
                vec![assign(local("best"), local("c"))],
            )],
        ),
    ]
}

/// Return the label of the largest value of `array`
fn return_argmax_label(array: &str, n: usize) -> Vec<Stmt> {
    let mut body = argmax_into(array, n);
    body.push(ret(global("CLASSES").at(local("best"))));
    body
}

/// Normalize `array` in place by a max-shifted softmax and return it
fn return_softmax(array: &str, n: usize) -> Vec<Stmt> {
    let at = |name: &str| local(array).at(local(name));
    let mut body = argmax_into(array, n);
    body.extend([
        declare_double("top", local(array).at(local("best"))),
        declare_double("total", num(0.0)),
        for_range(
            "c",
            0,
            n,
            vec![
                assign(at("c"), math(MathFn::Exp, vec![at("c") - local("top")])),
                increment(local("total"), at("c")),
            ],
        ),
        for_range("c", 0, n, vec![assign(at("c"), at("c") / local("total"))]),
        ret(local(array)),
    ]);
    body
}

/// `1 / (1 + exp(-value))`
fn logistic(value: Expr) -> Expr {
    num(1.0) / (num(1.0) + math(MathFn::Exp, vec![-value]))
}

/// Binary decision on a single score: positive picks the second class
fn return_sign_label(score: Expr) -> Stmt {
    if_else(
        score.gt(num(0.0)),
        vec![ret(global("CLASSES").at(int(1)))],
        vec![ret(global("CLASSES").at(int(0)))],
    )
}
