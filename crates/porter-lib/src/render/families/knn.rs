//! Nearest neighbours over the embedded training set
//!
//! Neighbours are selected one round at a time: the untaken sample with the
//! strictly smallest distance wins, so equal distances go to the lower
//! training index.

use super::*;
use crate::introspect::{Metric, Parameters};

/// `distance(features, i)` to training sample `i`, without the final root
fn distance(metric: Metric, n_features: usize) -> Function {
    let d = || local("d");
    let abs_d = || math(MathFn::Abs, vec![d()]);
    let accumulate = match metric {
        Metric::Euclidean => increment(local("acc"), d() * d()),
        Metric::Manhattan => increment(local("acc"), abs_d()),
        Metric::Chebyshev => assign(local("acc"), math(MathFn::Max, vec![local("acc"), abs_d()])),
        Metric::Minkowski { p } => {
            increment(local("acc"), math(MathFn::Pow, vec![abs_d(), num(p)]))
        }
    };
    let body = vec![
        declare_double("acc", num(0.0)),
        for_range(
            "f",
            0,
            n_features,
            vec![
                declare_double(
                    "d",
                    global("SAMPLES").at(local("i")).at(local("f")) - features().at(local("f")),
                ),
                accumulate,
            ],
        ),
        ret(local("acc")),
    ];
    Function::indexed("distance", Ty::Double, body)
}

pub(super) fn build(model: &CanonicalModel, method: Method) -> Result<Program> {
    let Parameters::Knn(knn) = &model.params else {
        return Err(mismatch(model, Family::Knn));
    };
    let n_classes = model.n_classes();
    let n_samples = knn.samples.len();
    let mut program = program(model, method);
    program.globals.extend([
        Global::matrix("SAMPLES", knn.samples.clone()),
        Global::ints("LABELS", knn.labels.iter().map(|l| *l as i64).collect()),
    ]);
    program.helpers.push(distance(knn.metric, model.n_features));

    let dist = |e: Expr| local("distances").at(e);
    let untaken = local("taken").at(local("i")).equals(num(0.0));
    let closer = local("nearest")
        .lt(int(0))
        .or(dist(local("i")).lt(dist(local("nearest"))));
    let label = global("LABELS").at(local("nearest"));

    let mut entry = vec![
        alloc("distances", n_samples),
        for_range(
            "i",
            0,
            n_samples,
            vec![assign(
                dist(local("i")),
                call("distance", vec![features(), local("i")]),
            )],
        ),
        alloc("taken", n_samples),
        alloc("votes", n_classes),
        for_range(
            "r",
            0,
            knn.k,
            vec![
                declare_int("nearest", int(-1)),
                for_range(
                    "i",
                    0,
                    n_samples,
                    vec![if_then(
                        untaken.and(closer),
                        vec![assign(local("nearest"), local("i"))],
                    )],
                ),
                assign(local("taken").at(local("nearest")), num(1.0)),
                increment(local("votes").at(label), num(1.0)),
            ],
        ),
    ];

    match method {
        Method::Predict => entry.extend(return_argmax_label("votes", n_classes)),
        Method::PredictProba => {
            let k = int(knn.k as i64).to_double();
            entry.push(for_range(
                "c",
                0,
                n_classes,
                vec![assign(
                    local("votes").at(local("c")),
                    local("votes").at(local("c")) / k,
                )],
            ));
            entry.push(ret(local("votes")));
        }
    }
    program.entry = entry;
    Ok(program)
}
