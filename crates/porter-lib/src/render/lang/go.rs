//! Go, a single `main` package built with `go build`

use super::*;

struct Go;

impl Syntax for Go {
    fn indent(&self) -> &'static str {
        "\t"
    }

    fn math(&self, f: MathFn, args: &[String]) -> String {
        let name = match f {
            MathFn::Exp => "Exp",
            MathFn::Log => "Log",
            MathFn::Sqrt => "Sqrt",
            MathFn::Tanh => "Tanh",
            MathFn::Pow => "Pow",
            MathFn::Abs => "Abs",
            MathFn::Max => "Max",
        };
        format!("math.{}({})", name, args.join(", "))
    }

    fn to_double(&self, value: &str) -> String {
        format!("float64({})", value)
    }

    fn declare(&self, name: &str, ty: Ty, init: &str) -> String {
        format!("var {} {} = {}", name, go_type(ty), init)
    }

    fn alloc(&self, name: &str, len: usize) -> String {
        format!("{} := make([]float64, {})", name, len)
    }

    fn assign(&self, target: &str, value: &str) -> String {
        format!("{} = {}", target, value)
    }

    fn ret(&self, value: &str) -> String {
        format!("return {}", value)
    }

    fn if_open(&self, cond: &str) -> String {
        format!("if {} {{", cond)
    }

    fn for_open(&self, var: &str, start: &str, end: &str) -> String {
        format!("for {v} := {}; {v} < {}; {v}++ {{", start, end, v = var)
    }
}

fn go_type(ty: Ty) -> &'static str {
    match ty {
        Ty::Int => "int",
        Ty::Double => "float64",
        Ty::Doubles => "[]float64",
    }
}

fn global(e: &Emitter<'_>, global: &Global) -> String {
    let literal = match &global.data {
        Data::Ints(values) => list(values.iter().map(|v| v.to_string()).collect(), "[]int{", "}"),
        Data::Doubles(values) => list(e.numbers(values), "[]float64{", "}"),
        Data::Matrix(rows) => list(
            rows.iter().map(|r| list(e.numbers(r), "{", "}")).collect(),
            "[][]float64{",
            "}",
        ),
    };
    format!("var {} = {}", global.name, literal)
}

fn signature(function: &Function) -> String {
    let params: Vec<String> = function
        .params
        .iter()
        .map(|(name, ty)| format!("{} {}", name, go_type(*ty)))
        .collect();
    format!(
        "func {}({}) {} {{",
        function.name,
        params.join(", "),
        go_type(function.ret)
    )
}

pub(super) fn print(program: &Program, options: &RenderOptions) -> String {
    let method = &options.method_name;
    let mut e = Emitter::new(&Go, options.number_format);
    e.line(0, "package main");
    e.blank();
    e.line(0, "import (");
    e.line(1, "\"fmt\"");
    if program.uses_math() {
        e.line(1, "\"math\"");
    }
    e.line(1, "\"os\"");
    e.line(1, "\"strconv\"");
    e.line(0, ")");
    e.blank();

    for g in &program.globals {
        let text = global(&e, g);
        e.line(0, &text);
    }
    e.blank();

    for helper in &program.helpers {
        e.line(0, &signature(helper));
        e.body(&helper.body, 1);
        e.line(0, "}");
        e.blank();
    }

    let entry = entry_function(program, options);
    e.line(0, &signature(&entry));
    e.body(&entry.body, 1);
    e.line(0, "}");
    e.blank();

    let n = program.n_features;
    e.line(0, "func main() {");
    e.line(1, &format!("if len(os.Args)-1 != {} {{", n));
    e.line(
        2,
        &format!(
            "fmt.Fprintf(os.Stderr, \"expected {} features, got %d\\n\", len(os.Args)-1)",
            n
        ),
    );
    e.line(2, "os.Exit(1)");
    e.line(1, "}");
    e.line(1, "features := make([]float64, len(os.Args)-1)");
    e.line(1, "for i, arg := range os.Args[1:] {");
    e.line(2, "value, err := strconv.ParseFloat(arg, 64)");
    e.line(2, "if err != nil {");
    e.line(3, "fmt.Fprintln(os.Stderr, err)");
    e.line(3, "os.Exit(1)");
    e.line(2, "}");
    e.line(2, "features[i] = value");
    e.line(1, "}");
    match program.output {
        Output::Label => e.line(1, &format!("fmt.Println({}(features))", method)),
        Output::Probabilities => {
            e.line(1, &format!("proba := {}(features)", method));
            e.line(1, "for i, p := range proba {");
            e.line(2, "if i > 0 {");
            e.line(3, "fmt.Print(\" \")");
            e.line(2, "}");
            e.line(2, "fmt.Print(strconv.FormatFloat(p, 'g', -1, 64))");
            e.line(1, "}");
            e.line(1, "fmt.Println()");
        }
    }
    e.line(0, "}");
    e.finish()
}
