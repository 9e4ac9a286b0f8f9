//! Feed-forward networks, one loop nest per layer

use super::*;
use crate::introspect::{Activation, Parameters};

fn activate(activation: Activation, value: Expr) -> Expr {
    match activation {
        Activation::Identity | Activation::Softmax => value,
        Activation::Logistic => logistic(value),
        Activation::Tanh => math(MathFn::Tanh, vec![value]),
        Activation::Relu => math(MathFn::Max, vec![value, num(0.0)]),
    }
}

pub(super) fn build(model: &CanonicalModel, method: Method) -> Result<Program> {
    let Parameters::NeuralNet(net) = &model.params else {
        return Err(mismatch(model, Family::NeuralNet));
    };
    let mut program = program(model, method);
    let mut entry = Vec::new();
    let mut input = "features".to_string();

    for (l, layer) in net.layers.iter().enumerate() {
        let weights = format!("WEIGHTS_{}", l);
        let biases = format!("BIASES_{}", l);
        let output = format!("layer_{}", l);
        let acc = format!("acc_{}", l);
        program.globals.extend([
            Global::matrix(&weights, layer.weights.clone()),
            Global::doubles(&biases, layer.biases.clone()),
        ]);

        // the output layer keeps its pre-activations
        let is_last = l + 1 == net.layers.len();
        let value = if is_last {
            local(&acc)
        } else {
            activate(layer.activation, local(&acc))
        };
        entry.extend([
            alloc(&output, layer.n_outputs()),
            for_range(
                "o",
                0,
                layer.n_outputs(),
                vec![
                    declare_double(&acc, num(0.0)),
                    for_range(
                        "i",
                        0,
                        layer.n_inputs(),
                        vec![increment(
                            local(&acc),
                            local(&input).at(local("i"))
                                * global(&weights).at(local("i")).at(local("o")),
                        )],
                    ),
                    increment(local(&acc), global(&biases).at(local("o"))),
                    assign(local(&output).at(local("o")), value),
                ],
            ),
        ]);
        input = output;
    }

    let n_classes = model.n_classes();
    let binary = net.layers.last().map(|l| l.n_outputs() == 1).unwrap_or(false);
    match (method, binary) {
        // thresholding the probability itself: logistic(z) rounds to 0.5 for tiny z > 0
        (Method::Predict, true) => entry.push(if_else(
            logistic(local(&input).at(int(0))).gt(num(0.5)),
            vec![ret(global("CLASSES").at(int(1)))],
            vec![ret(global("CLASSES").at(int(0)))],
        )),
        (Method::Predict, false) => entry.extend(return_argmax_label(&input, n_classes)),
        (Method::PredictProba, true) => entry.extend([
            alloc("proba", 2),
            declare_double("p", logistic(local(&input).at(int(0)))),
            assign(local("proba").at(int(0)), num(1.0) - local("p")),
            assign(local("proba").at(int(1)), local("p")),
            ret(local("proba")),
        ]),
        (Method::PredictProba, false) => entry.extend(return_softmax(&input, n_classes)),
    }
    program.entry = entry;
    Ok(program)
}
