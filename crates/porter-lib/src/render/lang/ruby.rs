//! Ruby, class methods on a class holding the data as constants

use super::*;
use crate::models::capitalize;

struct Ruby;

impl Syntax for Ruby {
    fn indent(&self) -> &'static str {
        "  "
    }

    fn math(&self, f: MathFn, args: &[String]) -> String {
        match f {
            MathFn::Exp => format!("Math.exp({})", args.join(", ")),
            MathFn::Log => format!("Math.log({})", args.join(", ")),
            MathFn::Sqrt => format!("Math.sqrt({})", args.join(", ")),
            MathFn::Tanh => format!("Math.tanh({})", args.join(", ")),
            MathFn::Pow => format!("({} ** {})", args[0], args[1]),
            MathFn::Abs => format!("{}.abs", args[0]),
            MathFn::Max => format!("[{}].max", args.join(", ")),
        }
    }

    fn to_double(&self, value: &str) -> String {
        format!("{}.to_f", value)
    }

    fn declare(&self, name: &str, _ty: Ty, init: &str) -> String {
        format!("{} = {}", name, init)
    }

    fn alloc(&self, name: &str, len: usize) -> String {
        format!("{} = Array.new({}, 0.0)", name, len)
    }

    fn assign(&self, target: &str, value: &str) -> String {
        format!("{} = {}", target, value)
    }

    fn ret(&self, value: &str) -> String {
        format!("return {}", value)
    }

    fn if_open(&self, cond: &str) -> String {
        format!("if {}", cond)
    }

    fn else_open(&self) -> String {
        "else".to_string()
    }

    fn close(&self) -> String {
        "end".to_string()
    }

    fn for_open(&self, var: &str, start: &str, end: &str) -> String {
        format!("for {} in {}...{}", var, start, end)
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
    format!("{} = {}", global.name, literal)
}

fn signature(function: &Function) -> String {
    let params: Vec<&str> = function.params.iter().map(|(name, _)| name.as_str()).collect();
    format!("def self.{}({})", function.name, params.join(", "))
}

pub(super) fn print(program: &Program, options: &RenderOptions) -> String {
    // class names are constants
    let class = capitalize(&options.class_name);
    let method = &options.method_name;
    let mut e = Emitter::new(&Ruby, options.number_format);
    e.line(0, &format!("class {}", class));

    for g in &program.globals {
        let text = global(&e, g);
        e.line(1, &text);
    }
    e.blank();

    for helper in &program.helpers {
        e.line(1, &signature(helper));
        e.body(&helper.body, 2);
        e.line(1, "end");
        e.blank();
    }

    let entry = entry_function(program, options);
    e.line(1, &signature(&entry));
    e.body(&entry.body, 2);
    e.line(1, "end");
    e.line(0, "end");
    e.blank();

    let n = program.n_features;
    e.line(0, "if __FILE__ == $0");
    e.line(1, &format!("if ARGV.length != {}", n));
    e.line(
        2,
        &format!("$stderr.puts \"expected {} features, got #{{ARGV.length}}\"", n),
    );
    e.line(2, "exit 1");
    e.line(1, "end");
    e.line(1, "features = ARGV.map(&:to_f)");
    match program.output {
        Output::Label => e.line(1, &format!("puts {}.{}(features)", class, method)),
        Output::Probabilities => {
            e.line(1, &format!("puts {}.{}(features).join(' ')", class, method))
        }
    }
    e.line(0, "end");
    e.finish()
}
