mod ast;
mod compiler;
mod diagnostics;
mod lexer;
mod parser;
mod printer;
mod project;
mod source;
mod typechecker;

pub use crate::ast::{
    BinaryExpression, BinaryOperator, CallArgument, CallExpression, IfExpression, ParsedBlock,
    ParsedExpression, ParsedFunction, ParsedNamespace, ParsedParameter, ParsedRecord,
    ParsedStatement, ParsedType, ParsedVarDecl, Span, Spanned, UnaryExpression, UnaryOperator,
};
pub use crate::compiler::{Compilation, CompileOptions, Compiler};
pub use crate::diagnostics::{Diagnostics, Error};
pub use crate::lexer::{normalize, Lexer, LexerError, Token, TokenKind};
pub use crate::parser::Parser;
pub use crate::printer::render_namespace;
pub use crate::project::{
    CheckedBlock, CheckedExpression, CheckedFunction, CheckedParameter, CheckedRecord,
    CheckedStatement, CheckedType, CheckedUnaryOperator, CheckedVarDecl, CheckedVariable,
    FunctionId, Project, RecordId, SafetyContext, Scope, ScopeId, TypeId, BOOL_TYPE_ID,
    FLOAT_TYPE_ID, INT_TYPE_ID, STRING_TYPE_ID, UINT_TYPE_ID, UNIT_TYPE_ID, UNKNOWN_TYPE_ID,
};
pub use crate::source::{SourceFile, SourceId};
pub use crate::typechecker::{Inferences, Typechecker};
