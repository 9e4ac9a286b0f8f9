//! PHP 7+, run with the CLI interpreter

use super::*;

struct Php;

impl Syntax for Php {
    fn local(&self, name: &str) -> String {
        format!("${}", name)
    }

    fn global(&self, name: &str) -> String {
        format!("self::${}", name)
    }

    fn call(&self, name: &str, args: &[String]) -> String {
        format!("self::{}({})", name, args.join(", "))
    }

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
        format!("{}({})", name, args.join(", "))
    }

    fn to_double(&self, value: &str) -> String {
        format!("(float) {}", value)
    }

    fn declare(&self, name: &str, _ty: Ty, init: &str) -> String {
        format!("{} = {};", self.local(name), init)
    }

    fn alloc(&self, name: &str, len: usize) -> String {
        format!("{} = array_fill(0, {}, 0.0);", self.local(name), len)
    }

    fn for_open(&self, var: &str, start: &str, end: &str) -> String {
        format!("for ({v} = {}; {v} < {}; {v}++) {{", start, end, v = var)
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
    format!("private static ${} = {};", global.name, literal)
}

fn signature(function: &Function, visibility: &str) -> String {
    let params: Vec<String> = function
        .params
        .iter()
        .map(|(name, _)| Php.local(name))
        .collect();
    format!(
        "{} static function {}({}) {{",
        visibility,
        function.name,
        params.join(", ")
    )
}

pub(super) fn print(program: &Program, options: &RenderOptions) -> String {
    let class = &options.class_name;
    let method = &options.method_name;
    let mut e = Emitter::new(&Php, options.number_format);
    e.line(0, "<?php");
    e.blank();
    e.line(0, &format!("class {} {{", class));
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
    e.line(0, "}");
    e.blank();

    let n = program.n_features;
    e.line(0, "if (isset($argv) && realpath($argv[0]) === __FILE__) {");
    e.line(1, "$features = array_map('floatval', array_slice($argv, 1));");
    e.line(1, &format!("if (count($features) != {}) {{", n));
    e.line(
        2,
        &format!(
            "fwrite(STDERR, 'expected {} features, got ' . count($features) . PHP_EOL);",
            n
        ),
    );
    e.line(2, "exit(1);");
    e.line(1, "}");
    match program.output {
        Output::Label => {
            e.line(1, &format!("echo {}::{}($features), PHP_EOL;", class, method));
        }
        Output::Probabilities => {
            e.line(1, &format!("$proba = {}::{}($features);", class, method));
            e.line(
                1,
                "echo implode(' ', array_map(function ($v) { return var_export($v, true); }, $proba)), PHP_EOL;",
            );
        }
    }
    e.line(0, "}");
    e.finish()
}
