//! Java, one public class per file

use super::*;
use crate::models::Language;

struct Java;

impl Syntax for Java {
    fn math(&self, f: MathFn, args: &[String]) -> String {
        let name = match f {
            MathFn::Exp => "exp",
            MathFn::Log => "log",
            MathFn::Sqrt => "sqrt",
            MathFn::Tanh => "tanh",
            MathFn::Pow => "pow",
            MathFn::Abs => "abs",
            MathFn::Max => "max",
        };
        format!("Math.{}({})", name, args.join(", "))
    }

    fn to_double(&self, value: &str) -> String {
        format!("(double) {}", value)
    }

    fn declare(&self, name: &str, ty: Ty, init: &str) -> String {
        format!("{} {} = {};", java_type(ty), name, init)
    }

    fn alloc(&self, name: &str, len: usize) -> String {
        format!("double[] {} = new double[{}];", name, len)
    }

    fn for_open(&self, var: &str, start: &str, end: &str) -> String {
        format!("for (int {v} = {}; {v} < {}; {v}++) {{", start, end, v = var)
    }
}

fn java_type(ty: Ty) -> &'static str {
    match ty {
        Ty::Int => "int",
        Ty::Double => "double",
        Ty::Doubles => "double[]",
    }
}

fn signature(function: &Function, visibility: &str) -> String {
    let params: Vec<String> = function
        .params
        .iter()
        .map(|(name, ty)| format!("{} {}", java_type(*ty), name))
        .collect();
    format!(
        "{} static {} {}({}) {{",
        visibility,
        java_type(function.ret),
        function.name,
        params.join(", ")
    )
}

fn global(e: &Emitter<'_>, global: &Global) -> String {
    match &global.data {
        Data::Ints(values) => format!(
            "private static final int[] {} = {};",
            global.name,
            list(values.iter().map(|v| v.to_string()).collect(), "{", "}")
        ),
        Data::Doubles(values) => format!(
            "private static final double[] {} = {};",
            global.name,
            list(e.numbers(values), "{", "}")
        ),
        Data::Matrix(rows) => {
            let rows: Vec<String> = rows.iter().map(|r| list(e.numbers(r), "{", "}")).collect();
            format!(
                "private static final double[][] {} = {};",
                global.name,
                list(rows, "{", "}")
            )
        }
    }
}

pub(super) fn print(program: &Program, options: &RenderOptions) -> String {
    // the type name must match the file stem
    let class = Language::Java.file_stem(&options.class_name);
    let mut e = Emitter::new(&Java, options.number_format);
    e.line(0, &format!("public class {} {{", class));
    e.blank();

    for g in &program.globals {
        let text = global(&e, g);
        e.line(1, &text);
    }
    e.blank();

    for helper in &program.helpers {
        e.line(1, &signature(helper, "private"));
        e.body(&helper.body, 2);
        e.line(1, "}");
        e.blank();
    }

    let entry = entry_function(program, options);
    e.line(1, &signature(&entry, "public"));
    e.body(&entry.body, 2);
    e.line(1, "}");
    e.blank();

    let n = program.n_features;
    let method = &options.method_name;
    e.line(1, "public static void main(String[] args) {");
    e.line(2, &format!("if (args.length != {}) {{", n));
    e.line(
        3,
        &format!(
            "System.err.println(\"expected {} features, got \" + args.length);",
            n
        ),
    );
    e.line(3, "System.exit(1);");
    e.line(2, "}");
    e.line(2, "double[] features = new double[args.length];");
    e.line(2, "for (int i = 0; i < args.length; i++) {");
    e.line(3, "features[i] = Double.parseDouble(args[i]);");
    e.line(2, "}");
    match program.output {
        Output::Label => {
            e.line(2, &format!("System.out.println({}.{}(features));", class, method));
        }
        Output::Probabilities => {
            e.line(2, &format!("double[] proba = {}.{}(features);", class, method));
            e.line(2, "StringBuilder line = new StringBuilder();");
            e.line(2, "for (int i = 0; i < proba.length; i++) {");
            e.line(3, "if (i > 0) {");
            e.line(4, "line.append(' ');");
            e.line(3, "}");
            e.line(3, "line.append(Double.toString(proba[i]));");
            e.line(2, "}");
            e.line(2, "System.out.println(line);");
        }
    }
    e.line(1, "}");
    e.blank();
    e.line(0, "}");
    e.finish()
}
