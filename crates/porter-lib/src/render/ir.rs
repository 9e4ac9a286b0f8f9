//! Typed imperative intermediate representation of a ported model
//!
//! Family builders lower a `CanonicalModel` into a `Program`; language
//! printers turn the same `Program` into source text. The IR only has the
//! constructs every target shares: literal arrays, functions, local scalars,
//! zero-filled double arrays, assignment, `if`, counted `for` and `return`.

use std::ops::{Add, Div, Mul, Neg, Sub};

/// Scalar and array types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    Int,
    Double,
    /// Array of doubles
    Doubles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Eq,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Eq => "==",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Math intrinsics available in every target runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    Exp,
    Log,
    Sqrt,
    Tanh,
    Pow,
    Abs,
    Max,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Double(f64),
    Local(String),
    Global(String),
    Index(Box<Expr>, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Call(String, Vec<Expr>),
    Math(MathFn, Vec<Expr>),
    /// Integer to double conversion
    ToDouble(Box<Expr>),
}

pub fn local(name: &str) -> Expr {
    Expr::Local(name.to_string())
}

pub fn global(name: &str) -> Expr {
    Expr::Global(name.to_string())
}

pub fn int(value: i64) -> Expr {
    Expr::Int(value)
}

/// Index from a `usize` position
pub fn idx(value: usize) -> Expr {
    Expr::Int(value as i64)
}

pub fn num(value: f64) -> Expr {
    Expr::Double(value)
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call(name.to_string(), args)
}

pub fn math(f: MathFn, args: Vec<Expr>) -> Expr {
    Expr::Math(f, args)
}

impl Expr {
    pub fn at(self, index: Expr) -> Expr {
        Expr::Index(Box::new(self), Box::new(index))
    }

    fn binary(self, op: BinOp, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(self), Box::new(rhs))
    }

    pub fn lt(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Lt, rhs)
    }

    pub fn le(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Le, rhs)
    }

    pub fn gt(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Gt, rhs)
    }

    pub fn equals(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Eq, rhs)
    }

    pub fn and(self, rhs: Expr) -> Expr {
        self.binary(BinOp::And, rhs)
    }

    pub fn or(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Or, rhs)
    }

    pub fn to_double(self) -> Expr {
        Expr::ToDouble(Box::new(self))
    }

    /// True when this expression or any sub-expression calls a math intrinsic
    pub fn uses_math(&self) -> bool {
        match self {
            Expr::Math(..) => true,
            Expr::Int(_) | Expr::Double(_) | Expr::Local(_) | Expr::Global(_) => false,
            Expr::Index(a, b) | Expr::Binary(_, a, b) => a.uses_math() || b.uses_math(),
            Expr::Neg(e) | Expr::ToDouble(e) => e.uses_math(),
            Expr::Call(_, args) => args.iter().any(Expr::uses_math),
        }
    }
}

impl Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Add, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Sub, rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Mul, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Div, rhs)
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Scalar local with an initial value
    Declare { name: String, ty: Ty, init: Expr },
    /// Zero-filled local array of doubles
    Alloc { name: String, len: usize },
    Assign { target: Expr, value: Expr },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    /// `for var in start..end`, counting up by one
    For {
        var: String,
        start: Expr,
        end: Expr,
        body: Vec<Stmt>,
    },
    Return(Expr),
}

pub fn declare_int(name: &str, init: Expr) -> Stmt {
    Stmt::Declare {
        name: name.to_string(),
        ty: Ty::Int,
        init,
    }
}

pub fn declare_double(name: &str, init: Expr) -> Stmt {
    Stmt::Declare {
        name: name.to_string(),
        ty: Ty::Double,
        init,
    }
}

pub fn alloc(name: &str, len: usize) -> Stmt {
    Stmt::Alloc {
        name: name.to_string(),
        len,
    }
}

pub fn assign(target: Expr, value: Expr) -> Stmt {
    Stmt::Assign { target, value }
}

pub fn if_else(cond: Expr, then: Vec<Stmt>, otherwise: Vec<Stmt>) -> Stmt {
    Stmt::If {
        cond,
        then,
        otherwise,
    }
}

pub fn if_then(cond: Expr, then: Vec<Stmt>) -> Stmt {
    if_else(cond, then, Vec::new())
}

pub fn for_range(var: &str, start: usize, end: usize, body: Vec<Stmt>) -> Stmt {
    Stmt::For {
        var: var.to_string(),
        start: idx(start),
        end: idx(end),
        body,
    }
}

pub fn ret(value: Expr) -> Stmt {
    Stmt::Return(value)
}

impl Stmt {
    pub fn uses_math(&self) -> bool {
        match self {
            Stmt::Declare { init, .. } => init.uses_math(),
            Stmt::Alloc { .. } => false,
            Stmt::Assign { target, value } => target.uses_math() || value.uses_math(),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => cond.uses_math() || then.iter().chain(otherwise).any(Stmt::uses_math),
            Stmt::For {
                start, end, body, ..
            } => start.uses_math() || end.uses_math() || body.iter().any(Stmt::uses_math),
            Stmt::Return(e) => e.uses_math(),
        }
    }
}

/// Literal data embedded as a global constant
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Ints(Vec<i64>),
    Doubles(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    /// UPPER_CASE name
    pub name: String,
    pub data: Data,
}

impl Global {
    pub fn ints(name: &str, values: Vec<i64>) -> Self {
        Self {
            name: name.to_string(),
            data: Data::Ints(values),
        }
    }

    pub fn doubles(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            data: Data::Doubles(values),
        }
    }

    pub fn matrix(name: &str, rows: Vec<Vec<f64>>) -> Self {
        Self {
            name: name.to_string(),
            data: Data::Matrix(rows),
        }
    }
}

/// A private helper function
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<(String, Ty)>,
    pub ret: Ty,
    pub body: Vec<Stmt>,
}

impl Function {
    /// Helper taking `(features, i)` where `i` selects a row of embedded data
    pub fn indexed(name: &str, ret: Ty, body: Vec<Stmt>) -> Self {
        Self {
            name: name.to_string(),
            params: vec![
                ("features".to_string(), Ty::Doubles),
                ("i".to_string(), Ty::Int),
            ],
            ret,
            body,
        }
    }

    /// Helper taking only `(features)`
    pub fn unary(name: &str, ret: Ty, body: Vec<Stmt>) -> Self {
        Self {
            name: name.to_string(),
            params: vec![("features".to_string(), Ty::Doubles)],
            ret,
            body,
        }
    }
}

/// What the entry point returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// One class label
    Label,
    /// One probability per class
    Probabilities,
}

impl Output {
    pub fn ty(&self) -> Ty {
        match self {
            Output::Label => Ty::Int,
            Output::Probabilities => Ty::Doubles,
        }
    }
}

/// A complete ported model, independent of the target language
///
/// The entry point takes `features` and is named by the caller's method name
/// at print time.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub globals: Vec<Global>,
    /// Helpers, each defined before anything that calls it
    pub helpers: Vec<Function>,
    pub entry: Vec<Stmt>,
    pub output: Output,
    pub n_features: usize,
    /// Number of printed values: 1 for labels, the class count for probabilities
    pub n_outputs: usize,
}

impl Program {
    pub fn uses_math(&self) -> bool {
        self.helpers
            .iter()
            .flat_map(|f| f.body.iter())
            .chain(self.entry.iter())
            .any(Stmt::uses_math)
    }

    /// Names taken by generated globals and helpers
    pub fn reserved_names(&self) -> impl Iterator<Item = &str> {
        self.globals
            .iter()
            .map(|g| g.name.as_str())
            .chain(self.helpers.iter().map(|f| f.name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_overloads_build_binaries() {
        let e = local("a") + num(1.0) * global("W").at(idx(2));
        match e {
            Expr::Binary(BinOp::Add, lhs, rhs) => {
                assert_eq!(*lhs, local("a"));
                assert!(matches!(*rhs, Expr::Binary(BinOp::Mul, _, _)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_uses_math_walks_nested_statements() {
        let plain = for_range(
            "i",
            0,
            3,
            vec![assign(local("acc"), local("acc") + num(1.0))],
        );
        assert!(!plain.uses_math());

        let nested = if_then(
            local("x").gt(num(0.0)),
            vec![ret(math(MathFn::Exp, vec![local("x")]))],
        );
        assert!(nested.uses_math());
    }
}
