//! Decision trees as nested conditionals

use super::*;
use crate::introspect::{Parameters, Tree, TreeNode};

/// Nested `if features[f] <= threshold` mirroring the node indices; `leaf`
/// gets the node index and node of every leaf reached
pub(super) fn branches(
    tree: &Tree,
    node: usize,
    leaf: &dyn Fn(usize, &TreeNode) -> Vec<Stmt>,
) -> Vec<Stmt> {
    let current = &tree.nodes[node];
    match &current.split {
        Some(split) => vec![if_else(
            features().at(idx(split.feature)).le(num(split.threshold)),
            branches(tree, split.left, leaf),
            branches(tree, split.right, leaf),
        )],
        None => leaf(node, current),
    }
}

pub(super) fn build(model: &CanonicalModel, method: Method) -> Result<Program> {
    let Parameters::DecisionTree(tree) = &model.params else {
        return Err(mismatch(model, Family::DecisionTree));
    };
    let mut program = program(model, method);
    program.entry = match method {
        Method::Predict => branches(tree, 0, &|_, node| {
            vec![ret(global("CLASSES").at(idx(node.majority_class())))]
        }),
        Method::PredictProba => {
            let mut body = vec![alloc("proba", model.n_classes())];
            body.extend(branches(tree, 0, &|_, node| {
                node.probabilities()
                    .into_iter()
                    .enumerate()
                    .map(|(c, p)| assign(local("proba").at(idx(c)), num(p)))
                    .collect()
            }));
            body.push(ret(local("proba")));
            body
        }
    };
    Ok(program)
}
