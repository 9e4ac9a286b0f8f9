//! C99, built with `gcc -std=c99 ... -lm`

use super::*;

struct C;

impl Syntax for C {
    fn math(&self, f: MathFn, args: &[String]) -> String {
        let name = match f {
            MathFn::Exp => "exp",
            MathFn::Log => "log",
            MathFn::Sqrt => "sqrt",
            MathFn::Tanh => "tanh",
            MathFn::Pow => "pow",
            MathFn::Abs => "fabs",
            MathFn::Max => "fmax",
        };
        format!("{}({})", name, args.join(", "))
    }

    fn to_double(&self, value: &str) -> String {
        format!("(double) {}", value)
    }

    fn declare(&self, name: &str, ty: Ty, init: &str) -> String {
        format!("{} {} = {};", c_type(ty), name, init)
    }

    fn alloc(&self, name: &str, len: usize) -> String {
        format!("double *{} = calloc({}, sizeof(double));", name, len)
    }

    fn for_open(&self, var: &str, start: &str, end: &str) -> String {
        format!("for (int {v} = {}; {v} < {}; {v}++) {{", start, end, v = var)
    }
}

fn c_type(ty: Ty) -> &'static str {
    match ty {
        Ty::Int => "int",
        Ty::Double => "double",
        Ty::Doubles => "double *",
    }
}

fn signature(function: &Function, qualifier: &str) -> String {
    let params: Vec<String> = function
        .params
        .iter()
        .map(|(name, ty)| match ty {
            Ty::Doubles => format!("double *{}", name),
            other => format!("{} {}", c_type(*other), name),
        })
        .collect();
    let ret = match function.ret {
        Ty::Doubles => "double *".to_string(),
        other => format!("{} ", c_type(other)),
    };
    format!("{}{}{}({}) {{", qualifier, ret, function.name, params.join(", "))
}

fn global(e: &Emitter<'_>, global: &Global) -> String {
    match &global.data {
        Data::Ints(values) => format!(
            "static const int {}[{}] = {};",
            global.name,
            values.len(),
            list(values.iter().map(|v| v.to_string()).collect(), "{", "}")
        ),
        Data::Doubles(values) => format!(
            "static const double {}[{}] = {};",
            global.name,
            values.len(),
            list(e.numbers(values), "{", "}")
        ),
        Data::Matrix(rows) => {
            let n_cols = rows.first().map(|r| r.len()).unwrap_or_default();
            let rows: Vec<String> = rows.iter().map(|r| list(e.numbers(r), "{", "}")).collect();
            format!(
                "static const double {}[{}][{}] = {};",
                global.name,
                rows.len(),
                n_cols,
                list(rows, "{", "}")
            )
        }
    }
}

pub(super) fn print(program: &Program, options: &RenderOptions) -> String {
    let mut e = Emitter::new(&C, options.number_format);
    e.line(0, "#include <stdio.h>");
    e.line(0, "#include <stdlib.h>");
    e.line(0, "#include <math.h>");
    e.blank();

    for g in &program.globals {
        let text = global(&e, g);
        e.line(0, &text);
    }
    e.blank();

    for helper in &program.helpers {
        e.line(0, &signature(helper, "static "));
        e.body(&helper.body, 1);
        e.line(0, "}");
        e.blank();
    }

    let entry = entry_function(program, options);
    e.line(0, &signature(&entry, ""));
    e.body(&entry.body, 1);
    e.line(0, "}");
    e.blank();

    let n = program.n_features;
    e.line(0, "int main(int argc, const char *argv[]) {");
    e.line(1, &format!("if (argc - 1 != {}) {{", n));
    e.line(
        2,
        &format!("fprintf(stderr, \"expected {} features, got %d\\n\", argc - 1);", n),
    );
    e.line(2, "return 1;");
    e.line(1, "}");
    e.line(1, &format!("double features[{}];", n));
    e.line(1, "for (int i = 1; i < argc; i++) {");
    e.line(2, "features[i - 1] = atof(argv[i]);");
    e.line(1, "}");
    match program.output {
        Output::Label => {
            e.line(1, &format!("printf(\"%d\\n\", {}(features));", options.method_name));
        }
        Output::Probabilities => {
            e.line(1, &format!("double *proba = {}(features);", options.method_name));
            e.line(1, &format!("for (int i = 0; i < {}; i++) {{", program.n_outputs));
            e.line(2, "printf(i > 0 ? \" %.17g\" : \"%.17g\", proba[i]);");
            e.line(1, "}");
            e.line(1, "printf(\"\\n\");");
        }
    }
    e.line(1, "return 0;");
    e.line(0, "}");
    e.finish()
}
