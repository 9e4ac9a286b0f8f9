//! JavaScript (ES5), runnable with node

use super::*;

struct Js;

impl Syntax for Js {
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
        value.to_string()
    }

    fn declare(&self, name: &str, _ty: Ty, init: &str) -> String {
        format!("var {} = {};", name, init)
    }

    fn alloc(&self, name: &str, len: usize) -> String {
        format!("var {} = new Array({}).fill(0);", name, len)
    }

    fn for_open(&self, var: &str, start: &str, end: &str) -> String {
        format!("for (var {v} = {}; {v} < {}; {v}++) {{", start, end, v = var)
    }
}

fn global(e: &Emitter<'_>, global: &Global) -> String {
    let literal = match &global.data {
        Data::Ints(values) => list(values.iter().map(|v| v.to_string()).collect(), "[", "]"),
        Data::Doubles(values) => list(e.numbers(values), "[", "]"),
        Data::Matrix(rows) => list(
            rows.iter().map(|r| list(e.numbers(r), "[", "]")).collect(),
            "[",
            "]",
        ),
    };
    format!("var {} = {};", global.name, literal)
}

fn params(function: &Function) -> String {
    function
        .params
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn print(program: &Program, options: &RenderOptions) -> String {
    let class = &options.class_name;
    let method = &options.method_name;
    let mut e = Emitter::new(&Js, options.number_format);
    e.line(0, &format!("var {} = function() {{", class));
    e.blank();

    for g in &program.globals {
        let text = global(&e, g);
        e.line(1, &text);
    }
    e.blank();

    for helper in &program.helpers {
        e.line(1, &format!("var {} = function({}) {{", helper.name, params(helper)));
        e.body(&helper.body, 2);
        e.line(1, "};");
        e.blank();
    }

    let entry = entry_function(program, options);
    e.line(1, &format!("this.{} = function({}) {{", method, params(&entry)));
    e.body(&entry.body, 2);
    e.line(1, "};");
    e.blank();
    e.line(0, "};");
    e.blank();

    let n = program.n_features;
    e.line(
        0,
        "if (typeof process !== 'undefined' && typeof process.argv !== 'undefined') {",
    );
    e.line(1, "var features = process.argv.slice(2).map(parseFloat);");
    e.line(1, &format!("if (features.length !== {}) {{", n));
    e.line(
        2,
        &format!(
            "console.error('expected {} features, got ' + features.length);",
            n
        ),
    );
    e.line(2, "process.exit(1);");
    e.line(1, "}");
    e.line(1, &format!("var clf = new {}();", class));
    match program.output {
        Output::Label => e.line(1, &format!("console.log(clf.{}(features));", method)),
        Output::Probabilities => {
            e.line(1, &format!("console.log(clf.{}(features).join(' '));", method))
        }
    }
    e.line(0, "}");
    e.finish()
}
