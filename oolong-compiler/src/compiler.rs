use anyhow::{bail, Result};

use crate::ast::{ParsedNamespace, Span};
use crate::diagnostics::{Diagnostics, Error};
use crate::lexer::{normalize, Lexer, LexerError};
use crate::parser::Parser;
use crate::project::Project;
use crate::source::SourceFile;
use crate::typechecker::Typechecker;

#[derive(Debug, Default)]
pub struct CompileOptions {
    pub dump_tokens: bool,
}

/// The populated result of a successful run: the parsed tree plus the
/// project registries codegen consumes through integer handles.
pub struct Compilation {
    pub namespace: ParsedNamespace,
    pub project: Project,
}

pub struct Compiler {
    diagnostics: Diagnostics,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            diagnostics: Diagnostics::new(),
            options,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn compile(&mut self, source: &SourceFile) -> Result<Compilation> {
        let mut lexer = Lexer::new(source);
        let (tokens, lex_errors) = match lexer.tokenize() {
            Ok(result) => result,
            Err(err) => {
                if let Some(lexer_error) = err.downcast_ref::<LexerError>() {
                    let span = Span::new(lexer_error.line(), lexer_error.column(), 1);
                    self.diagnostics
                        .push(Error::new(lexer_error.to_string(), span));
                } else {
                    self.diagnostics.push(Error::new(err.to_string(), Span::default()));
                }
                bail!("Lexing failed");
            }
        };

        if self.options.dump_tokens {
            for token in &tokens {
                println!("{token:?}");
            }
        }

        if !lex_errors.is_empty() {
            self.diagnostics.extend(lex_errors);
            bail!("Lexing failed");
        }

        let tokens = normalize(tokens);

        let mut parser = Parser::new(&tokens);
        let namespace = match parser.parse() {
            Ok(namespace) => namespace,
            Err(error) => {
                self.diagnostics.push(error);
                bail!("Parsing failed");
            }
        };

        let mut project = Project::new();
        let mut typechecker = Typechecker::new(&mut project);
        if let Some(error) = typechecker.typecheck_namespace(&namespace, 0) {
            self.diagnostics.push(error);
            bail!("Type checking failed");
        }

        Ok(Compilation { namespace, project })
    }
}
