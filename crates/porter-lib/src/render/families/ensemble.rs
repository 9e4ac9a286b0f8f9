//! Tree ensembles: one function per tree plus an aggregator

use super::tree::branches;
use super::*;
use crate::introspect::{Aggregation, Ensemble, Parameters, Tree};

pub(super) fn build(model: &CanonicalModel, method: Method) -> Result<Program> {
    let Parameters::TreeEnsemble(ensemble) = &model.params else {
        return Err(mismatch(model, Family::TreeEnsemble));
    };
    match ensemble.aggregation {
        Aggregation::Average => Ok(average(model, ensemble, method)),
        Aggregation::Boost if method == Method::Predict => Ok(boost(model, ensemble, method)),
        Aggregation::Boost => Err(unsupported_method(method, Family::TreeEnsemble)),
    }
}

/// Leaf ordinal of every node, `None` for internal nodes
fn leaf_ordinals(tree: &Tree) -> Vec<Option<usize>> {
    let mut next = 0;
    tree.nodes
        .iter()
        .map(|node| {
            node.split.is_none().then(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

/// Each tree returns the row of its leaf in `TREE_<t>_PROBA`; the rows are
/// summed in tree order and divided by the tree count.
fn average(model: &CanonicalModel, ensemble: &Ensemble, method: Method) -> Program {
    let n_classes = model.n_classes();
    let mut program = program(model, method);

    for (t, tree) in ensemble.trees.iter().enumerate() {
        let ordinals = leaf_ordinals(tree);
        let rows = tree
            .nodes
            .iter()
            .filter(|node| node.split.is_none())
            .map(|node| node.probabilities())
            .collect();
        program
            .globals
            .push(Global::matrix(&format!("TREE_{}_PROBA", t), rows));

        let body = branches(tree, 0, &|i, _| vec![ret(idx(ordinals[i].unwrap_or(0)))]);
        program
            .helpers
            .push(Function::unary(&format!("tree_{}", t), Ty::Int, body));
    }

    let mut entry = vec![alloc("scores", n_classes)];
    for t in 0..ensemble.trees.len() {
        let leaf = format!("leaf_{}", t);
        entry.push(declare_int(&leaf, call(&format!("tree_{}", t), vec![features()])));
        entry.push(for_range(
            "c",
            0,
            n_classes,
            vec![increment(
                local("scores").at(local("c")),
                global(&format!("TREE_{}_PROBA", t))
                    .at(local(&leaf))
                    .at(local("c")),
            )],
        ));
    }
    let n_trees = int(ensemble.trees.len() as i64).to_double();
    entry.push(for_range(
        "c",
        0,
        n_classes,
        vec![assign(
            local("scores").at(local("c")),
            local("scores").at(local("c")) / n_trees,
        )],
    ));

    match method {
        Method::Predict => entry.extend(return_argmax_label("scores", n_classes)),
        Method::PredictProba => entry.push(ret(local("scores"))),
    }
    program.entry = entry;
    program
}

/// SAMME: each tree votes for its majority class with its weight
fn boost(model: &CanonicalModel, ensemble: &Ensemble, method: Method) -> Program {
    let n_classes = model.n_classes();
    let mut program = program(model, method);

    for (t, tree) in ensemble.trees.iter().enumerate() {
        let body = branches(tree, 0, &|_, node| vec![ret(idx(node.majority_class()))]);
        program
            .helpers
            .push(Function::unary(&format!("tree_{}", t), Ty::Int, body));
    }

    let mut entry = vec![alloc("scores", n_classes)];
    for (t, weight) in ensemble.weights.iter().enumerate() {
        let class = format!("class_{}", t);
        entry.push(declare_int(
            &class,
            call(&format!("tree_{}", t), vec![features()]),
        ));
        entry.push(increment(local("scores").at(local(&class)), num(*weight)));
    }
    entry.extend(return_argmax_label("scores", n_classes));
    program.entry = entry;
    program
}
