//! Compile and execute command table

use crate::models::Language;
use serde::Serialize;
use std::fmt;

/// An external command as an argv vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// The same command with extra trailing arguments
    pub fn with_args<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut command = self.clone();
        command.args.extend(extra.into_iter().map(Into::into));
        command
    }

    /// Whether the program lives in the workspace rather than on `PATH`
    pub fn is_local(&self) -> bool {
        self.program.starts_with("./")
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Compile step, `None` for interpreted languages
pub fn compile_command(language: Language, class_name: &str) -> Option<CommandLine> {
    let file = language.filename(class_name);
    let stem = language.file_stem(class_name);
    match language {
        Language::C => Some(CommandLine::new(
            "gcc",
            &[&file, "-std=c99", "-o", &stem, "-lm"],
        )),
        Language::Go => Some(CommandLine::new("go", &["build", "-o", &stem, &file])),
        Language::Java => Some(CommandLine::new("javac", &[&file])),
        Language::JavaScript | Language::Php | Language::Ruby => None,
    }
}

/// Execute step; feature values are appended as arguments
pub fn execute_command(language: Language, class_name: &str) -> CommandLine {
    let file = language.filename(class_name);
    let stem = language.file_stem(class_name);
    match language {
        Language::C | Language::Go => CommandLine::new(format!("./{}", stem), &[]),
        Language::Java => CommandLine::new("java", &["-classpath", ".", &stem]),
        Language::JavaScript => CommandLine::new("node", &[&file]),
        Language::Php => CommandLine::new("php", &[&file]),
        Language::Ruby => CommandLine::new("ruby", &[&file]),
    }
}

/// Executables that must be on `PATH` before anything is compiled or run
pub fn dependencies(language: Language) -> &'static [&'static str] {
    match language {
        Language::C => &["gcc"],
        Language::Go => &["go"],
        Language::Java => &["javac", "java"],
        Language::JavaScript => &["node"],
        Language::Php => &["php"],
        Language::Ruby => &["ruby"],
    }
}
