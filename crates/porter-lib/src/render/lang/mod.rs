//! Language printers
//!
//! Every printer shares one statement walker (`Emitter`) and supplies only
//! the syntax that differs between targets through `Syntax`. Each printer
//! then lays out its own file: globals, helpers, the entry point and a
//! command-line `main` reading features from the process arguments.

mod c;
mod go;
mod java;
mod js;
mod php;
mod ruby;

use super::ir::*;
use super::{NumberFormat, RenderOptions};
use crate::models::Language;

/// Prints a program as source text in one language
pub type Printer = fn(&Program, &RenderOptions) -> String;

pub fn printer(language: Language) -> Printer {
    match language {
        Language::C => c::print,
        Language::Go => go::print,
        Language::Java => java::print,
        Language::JavaScript => js::print,
        Language::Php => php::print,
        Language::Ruby => ruby::print,
    }
}

/// Per-language syntax hooks used by the shared walker
pub(crate) trait Syntax {
    fn indent(&self) -> &'static str {
        "    "
    }

    fn local(&self, name: &str) -> String {
        name.to_string()
    }

    fn global(&self, name: &str) -> String {
        name.to_string()
    }

    fn call(&self, name: &str, args: &[String]) -> String {
        format!("{}({})", name, args.join(", "))
    }

    fn math(&self, f: MathFn, args: &[String]) -> String;

    fn to_double(&self, value: &str) -> String;

    fn declare(&self, name: &str, ty: Ty, init: &str) -> String;

    fn alloc(&self, name: &str, len: usize) -> String;

    fn assign(&self, target: &str, value: &str) -> String {
        format!("{} = {};", target, value)
    }

    fn ret(&self, value: &str) -> String {
        format!("return {};", value)
    }

    fn if_open(&self, cond: &str) -> String {
        format!("if ({}) {{", cond)
    }

    fn else_open(&self) -> String {
        "} else {".to_string()
    }

    fn close(&self) -> String {
        "}".to_string()
    }

    fn for_open(&self, var: &str, start: &str, end: &str) -> String;
}

/// Accumulates source lines for one file
pub(crate) struct Emitter<'a> {
    syntax: &'a dyn Syntax,
    format: NumberFormat,
    out: String,
}

impl<'a> Emitter<'a> {
    pub fn new(syntax: &'a dyn Syntax, format: NumberFormat) -> Self {
        Self {
            syntax,
            format,
            out: String::new(),
        }
    }

    pub fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(self.syntax.indent());
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// A double literal as it appears inside array data (never parenthesized)
    pub fn number(&self, value: f64) -> String {
        (self.format)(value)
    }

    pub fn numbers(&self, values: &[f64]) -> Vec<String> {
        values.iter().map(|v| self.number(*v)).collect()
    }

    pub fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Int(i) if *i < 0 => format!("({})", i),
            Expr::Int(i) => i.to_string(),
            Expr::Double(x) => {
                let text = self.number(*x);
                if text.starts_with('-') {
                    format!("({})", text)
                } else {
                    text
                }
            }
            Expr::Local(name) => self.syntax.local(name),
            Expr::Global(name) => self.syntax.global(name),
            Expr::Index(array, index) => format!("{}[{}]", self.expr(array), self.expr(index)),
            Expr::Binary(op, lhs, rhs) => {
                format!("({} {} {})", self.expr(lhs), op.symbol(), self.expr(rhs))
            }
            Expr::Neg(inner) => format!("(-{})", self.expr(inner)),
            Expr::Call(name, args) => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                self.syntax.call(name, &args)
            }
            Expr::Math(f, args) => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                self.syntax.math(*f, &args)
            }
            Expr::ToDouble(inner) => self.syntax.to_double(&self.expr(inner)),
        }
    }

    pub fn body(&mut self, stmts: &[Stmt], depth: usize) {
        for stmt in stmts {
            self.stmt(stmt, depth);
        }
    }

    fn stmt(&mut self, stmt: &Stmt, depth: usize) {
        let syntax = self.syntax;
        match stmt {
            Stmt::Declare { name, ty, init } => {
                let text = syntax.declare(name, *ty, &self.expr(init));
                self.line(depth, &text);
            }
            Stmt::Alloc { name, len } => {
                let text = syntax.alloc(name, *len);
                self.line(depth, &text);
            }
            Stmt::Assign { target, value } => {
                let text = syntax.assign(&self.expr(target), &self.expr(value));
                self.line(depth, &text);
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                let open = syntax.if_open(&self.expr(cond));
                self.line(depth, &open);
                self.body(then, depth + 1);
                if !otherwise.is_empty() {
                    self.line(depth, &syntax.else_open());
                    self.body(otherwise, depth + 1);
                }
                self.line(depth, &syntax.close());
            }
            Stmt::For {
                var,
                start,
                end,
                body,
            } => {
                let open = syntax.for_open(&syntax.local(var), &self.expr(start), &self.expr(end));
                self.line(depth, &open);
                self.body(body, depth + 1);
                self.line(depth, &syntax.close());
            }
            Stmt::Return(value) => {
                let text = syntax.ret(&self.expr(value));
                self.line(depth, &text);
            }
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Comma-separated items wrapped in `open`/`close`
pub(crate) fn list(items: Vec<String>, open: &str, close: &str) -> String {
    format!("{}{}{}", open, items.join(", "), close)
}

/// Entry point type and name for a program
pub(crate) fn entry_function(program: &Program, options: &RenderOptions) -> Function {
    Function::unary(&options.method_name, program.output.ty(), program.entry.clone())
}
