//! Support vector machines
//!
//! Kernel models evaluate every support vector once, then run one binary
//! decision per class pair and vote. Linear one-vs-rest models score each
//! class directly.

use super::*;
use crate::introspect::{Decomposition, Kernel, Parameters, Svm};

/// `kernel(features, i)` against support vector `i`
fn kernel(kernel: &Kernel, n_features: usize) -> Function {
    let sv = |f: &str| global("SUPPORT_VECTORS").at(local("i")).at(local(f));
    let mut body = vec![declare_double("acc", num(0.0))];
    let result = match *kernel {
        Kernel::Rbf { gamma } => {
            body.push(for_range(
                "f",
                0,
                n_features,
                vec![
                    declare_double("d", sv("f") - features().at(local("f"))),
                    increment(local("acc"), local("d") * local("d")),
                ],
            ));
            math(MathFn::Exp, vec![num(-gamma) * local("acc")])
        }
        _ => {
            body.push(for_range(
                "f",
                0,
                n_features,
                vec![increment(local("acc"), sv("f") * features().at(local("f")))],
            ));
            match *kernel {
                Kernel::Poly { gamma, coef0, degree } => math(
                    MathFn::Pow,
                    vec![num(gamma) * local("acc") + num(coef0), num(degree)],
                ),
                Kernel::Sigmoid { gamma, coef0 } => {
                    math(MathFn::Tanh, vec![num(gamma) * local("acc") + num(coef0)])
                }
                _ => local("acc"),
            }
        }
    };
    body.push(ret(result));
    Function::indexed("kernel", Ty::Double, body)
}

pub(super) fn build(model: &CanonicalModel, method: Method) -> Result<Program> {
    let Parameters::Svm(svm) = &model.params else {
        return Err(mismatch(model, Family::Svm));
    };
    if method != Method::Predict {
        return Err(unsupported_method(method, Family::Svm));
    }
    let n_classes = model.n_classes();
    let mut program = program(model, method);

    match &svm.decomposition {
        Decomposition::OneVsOne {
            support_vectors,
            n_support,
            dual_coef,
            intercepts,
        } => {
            program.globals.extend([
                Global::matrix("SUPPORT_VECTORS", support_vectors.clone()),
                Global::matrix("DUAL_COEF", dual_coef.clone()),
                Global::doubles("INTERCEPTS", intercepts.clone()),
            ]);
            program.helpers.push(kernel(&svm.kernel, model.n_features));

            let n_sv = support_vectors.len();
            let offsets = Svm::support_offsets(n_support);
            let mut entry = vec![
                alloc("kernels", n_sv),
                for_range(
                    "s",
                    0,
                    n_sv,
                    vec![assign(
                        local("kernels").at(local("s")),
                        call("kernel", vec![features(), local("s")]),
                    )],
                ),
                alloc("votes", n_classes),
            ];
            for (p, (i, j)) in Svm::pairs(n_classes).into_iter().enumerate() {
                let decision = format!("decision_{}", p);
                let term = |row: usize| {
                    increment(
                        local(&decision),
                        global("DUAL_COEF").at(idx(row)).at(local("s"))
                            * local("kernels").at(local("s")),
                    )
                };
                entry.extend([
                    declare_double(&decision, num(0.0)),
                    for_range("s", offsets[i], offsets[i] + n_support[i], vec![term(j - 1)]),
                    for_range("s", offsets[j], offsets[j] + n_support[j], vec![term(i)]),
                    increment(local(&decision), global("INTERCEPTS").at(idx(p))),
                    if_else(
                        local(&decision).gt(num(0.0)),
                        vec![increment(local("votes").at(idx(i)), num(1.0))],
                        vec![increment(local("votes").at(idx(j)), num(1.0))],
                    ),
                ]);
            }
            entry.extend(return_argmax_label("votes", n_classes));
            program.entry = entry;
        }
        Decomposition::OneVsRest { coef, intercepts } => {
            let n_rows = coef.len();
            program.globals.extend([
                Global::matrix("COEF", coef.clone()),
                Global::doubles("INTERCEPTS", intercepts.clone()),
            ]);
            let score = || local("scores").at(local("r"));
            let mut entry = vec![
                alloc("scores", n_rows),
                for_range(
                    "r",
                    0,
                    n_rows,
                    vec![
                        for_range(
                            "f",
                            0,
                            model.n_features,
                            vec![increment(
                                score(),
                                global("COEF").at(local("r")).at(local("f"))
                                    * features().at(local("f")),
                            )],
                        ),
                        increment(score(), global("INTERCEPTS").at(local("r"))),
                    ],
                ),
            ];
            if n_rows == 1 {
                entry.push(return_sign_label(local("scores").at(int(0))));
            } else {
                entry.extend(return_argmax_label("scores", n_rows));
            }
            program.entry = entry;
        }
    }
    Ok(program)
}
