//! Code rendering
//!
//! Rendering is pure and happens in two stages:
//! - a family builder lowers a `CanonicalModel` into an `ir::Program`
//! - a language printer turns the program into self-contained source text
//!
//! `dispatch` binds one builder and one printer into a `Renderer`.

pub mod families;
pub mod ir;
pub mod lang;


use crate::error::{PorterError, Result};
use ir::Program;

/// Formats a double as a source literal
pub type NumberFormat = fn(f64) -> String;

/// Shortest decimal representation that parses back to the identical `f64`
pub fn round_trip(value: f64) -> String {
    format!("{:?}", value)
}

/// Names the caller chooses for the generated code
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub class_name: String,
    pub method_name: String,
    pub number_format: NumberFormat,
}

impl RenderOptions {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            number_format: round_trip,
        }
    }

    pub fn with_number_format(mut self, number_format: NumberFormat) -> Self {
        self.number_format = number_format;
        self
    }

    /// Check both names are usable in every target language and do not
    /// collide with anything the program generates
    pub fn validate(&self, program: &Program) -> Result<()> {
        validate_identifier(&self.class_name)?;
        validate_identifier(&self.method_name)?;
        // becomes a type name (Java file stem, Ruby constant)
        if !self.class_name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(invalid(&self.class_name, "class names must start with a letter"));
        }
        for name in [&self.class_name, &self.method_name] {
            if program.reserved_names().any(|r| r.eq_ignore_ascii_case(name)) {
                return Err(invalid(name, "collides with a generated name"));
            }
        }
        if self.class_name == self.method_name {
            return Err(invalid(&self.method_name, "must differ from the class name"));
        }
        Ok(())
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new("Brain", "predict")
    }
}

/// Words that are keywords, builtins or generated locals in at least one target
const RESERVED: &[&str] = &[
    // shared keywords
    "if", "else", "for", "while", "do", "return", "break", "continue", "switch", "case",
    "default", "goto", "true", "false", "null", "nil", "new", "class", "function", "static",
    "const", "var", "int", "double", "float", "long", "short", "char", "void", "struct",
    "union", "enum", "extern", "sizeof", "typedef", "unsigned", "signed", "auto", "register",
    "volatile", "inline", "restrict", "public", "private", "protected", "final", "abstract",
    "interface", "extends", "implements", "import", "package", "this", "self", "super", "try",
    "catch", "finally", "throw", "throws", "instanceof", "typeof", "delete", "in", "of", "let",
    "yield", "await", "async", "export", "with", "boolean", "byte", "native",
    "synchronized", "transient", "strictfp", "assert", "func", "go", "defer", "chan", "map",
    "range", "select", "type", "fallthrough", "def", "end", "elsif", "unless", "until", "then",
    "begin", "rescue", "ensure", "module", "not", "and", "or", "echo", "print", "array",
    "list", "global", "include", "require", "namespace", "use", "trait", "clone", "declare",
    "foreach", "elseif", "endif", "match", "fn", "undef", "alias", "redo", "retry", "when",
    "string", "object", "main", "undefined", "arguments", "eval",
    // runtime functions the generated code calls
    "exp", "log", "sqrt", "tanh", "pow", "fabs", "fmax", "abs", "max", "printf", "fprintf",
    "atof", "calloc", "math", "fmt", "os", "strconv", "process", "console", "parseFloat",
    "floatval", "system", "kernel", "len", "make", "append", "copy", "cap", "panic",
    "float64",
    // generated locals
    "features", "proba", "clf", "line", "args", "argv", "argc", "value", "err", "arg",
];

fn invalid(name: &str, reason: &str) -> PorterError {
    PorterError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`, not reserved
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid(name, "must not be empty")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(invalid(name, "must start with a letter or underscore"))
        }
        Some(_) => {}
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(name, "may only contain letters, digits and underscores"));
    }
    if RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name)) {
        return Err(invalid(name, "is a reserved word in a target language"));
    }
    Ok(())
}
