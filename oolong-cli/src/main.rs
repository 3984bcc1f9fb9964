use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use oolong_compiler::{
    render_namespace, CompileOptions, Compiler, Error, SourceFile, SourceId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    Ast,
}

#[derive(Parser)]
#[command(
    name = "oolong",
    version,
    about = "Check oolong source files.",
    long_about = "Run the oolong compiler front end over a source file and report diagnostics."
)]
struct Cli {
    /// Path to an oolong source file.
    input: PathBuf,

    /// Dump the token stream produced by the lexer.
    #[arg(long)]
    dump_tokens: bool,

    /// Emit additional compiler output (e.g. `ast`).
    #[arg(long, value_enum)]
    emit: Vec<Emit>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let contents = fs::read_to_string(&cli.input)
        .with_context(|| format!("could not open file `{}`", cli.input.display()))?;
    let source = SourceFile::new(SourceId(0), cli.input.clone(), contents);

    let mut compiler = Compiler::new(CompileOptions {
        dump_tokens: cli.dump_tokens,
    });

    match compiler.compile(&source) {
        Ok(compilation) => {
            if cli.emit.contains(&Emit::Ast) {
                print!("{}", render_namespace(&compilation.namespace));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => {
            let lines: Vec<&str> = source.contents.lines().collect();
            for diagnostic in compiler.diagnostics().entries() {
                print_diagnostic(&source, &lines, diagnostic);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_diagnostic(source: &SourceFile, lines: &[&str], diagnostic: &Error) {
    eprintln!("error: {}", diagnostic.message);

    let span = diagnostic.span;
    if span.line == 0 {
        return;
    }
    eprintln!(
        "  --> {}:{}:{}",
        source.path.display(),
        span.line,
        span.column
    );

    if let Some(raw_line) = lines.get(span.line.saturating_sub(1)) {
        let display_line = raw_line.replace('\t', "    ");
        eprintln!("    {}", display_line);

        let mut caret_line = String::from("    ");
        let mut current_column = 1usize;
        for ch in raw_line.chars() {
            if current_column >= span.column {
                break;
            }
            match ch {
                '\t' => caret_line.push_str("    "),
                _ => caret_line.push(' '),
            }
            current_column += 1;
        }
        caret_line.push_str(&"^".repeat(span.length.max(1)));
        eprintln!("{}", caret_line);
    }
}
