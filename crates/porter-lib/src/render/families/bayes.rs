//! Naive Bayes: per-class joint log-likelihoods, then argmax or softmax

use super::*;
use crate::introspect::Parameters;

fn finish(entry: &mut Vec<Stmt>, method: Method, n_classes: usize) {
    match method {
        Method::Predict => entry.extend(return_argmax_label("jll", n_classes)),
        Method::PredictProba => entry.extend(return_softmax("jll", n_classes)),
    }
}

/// `jll[c] = OFFSETS[c] - 0.5 * sum((x - mean)^2 / var)`
pub(super) fn build_gaussian(model: &CanonicalModel, method: Method) -> Result<Program> {
    let Parameters::NaiveBayesGaussian(nb) = &model.params else {
        return Err(mismatch(model, Family::NaiveBayesGaussian));
    };
    let n_classes = model.n_classes();
    let mut program = program(model, method);
    program.globals.extend([
        Global::doubles("OFFSETS", nb.offsets()),
        Global::matrix("MEANS", nb.means.clone()),
        Global::matrix("VARIANCES", nb.variances.clone()),
    ]);

    let cf = |name: &str| global(name).at(local("c")).at(local("f"));
    let mut entry = vec![
        alloc("jll", n_classes),
        for_range(
            "c",
            0,
            n_classes,
            vec![
                declare_double("acc", num(0.0)),
                for_range(
                    "f",
                    0,
                    model.n_features,
                    vec![
                        declare_double("diff", features().at(local("f")) - cf("MEANS")),
                        increment(
                            local("acc"),
                            local("diff") * local("diff") / cf("VARIANCES"),
                        ),
                    ],
                ),
                assign(
                    local("jll").at(local("c")),
                    global("OFFSETS").at(local("c")) - num(0.5) * local("acc"),
                ),
            ],
        ),
    ];
    finish(&mut entry, method, n_classes);
    program.entry = entry;
    Ok(program)
}

/// `jll[c] = LOG_PRIOR[c] + sum(x > threshold ? LOG_PROB : LOG_NEG_PROB)`
pub(super) fn build_bernoulli(model: &CanonicalModel, method: Method) -> Result<Program> {
    let Parameters::NaiveBayesBernoulli(nb) = &model.params else {
        return Err(mismatch(model, Family::NaiveBayesBernoulli));
    };
    let n_classes = model.n_classes();
    let mut program = program(model, method);
    program.globals.extend([
        Global::doubles("LOG_PRIOR", nb.class_log_prior.clone()),
        Global::matrix("LOG_PROB", nb.feature_log_prob.clone()),
        Global::matrix("LOG_NEG_PROB", nb.feature_log_neg_prob.clone()),
    ]);

    let jll = || local("jll").at(local("c"));
    let cf = |name: &str| global(name).at(local("c")).at(local("f"));
    let mut entry = vec![
        alloc("jll", n_classes),
        for_range(
            "c",
            0,
            n_classes,
            vec![
                assign(jll(), global("LOG_PRIOR").at(local("c"))),
                for_range(
                    "f",
                    0,
                    model.n_features,
                    vec![if_else(
                        features().at(local("f")).gt(num(nb.threshold)),
                        vec![increment(jll(), cf("LOG_PROB"))],
                        vec![increment(jll(), cf("LOG_NEG_PROB"))],
                    )],
                ),
            ],
        ),
    ];
    finish(&mut entry, method, n_classes);
    program.entry = entry;
    Ok(program)
}
