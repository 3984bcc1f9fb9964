use std::path::PathBuf;

use oolong_compiler::{
    normalize, Lexer, ParsedExpression, ParsedNamespace, ParsedStatement, ParsedType, Parser,
    SourceFile, SourceId, Token, TokenKind,
};

fn lex(source: &str) -> (Vec<Token>, Vec<oolong_compiler::Error>) {
    let file = SourceFile::new(SourceId(0), PathBuf::from("test.oo"), source.to_string());
    let mut lexer = Lexer::new(&file);
    lexer.tokenize().expect("lexing should not fail outright")
}

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|token| token.kind).collect()
}

fn parse(source: &str) -> ParsedNamespace {
    let (tokens, errors) = lex(source);
    assert!(errors.is_empty(), "unexpected lexer errors: {errors:?}");
    let tokens = normalize(tokens);
    Parser::new(&tokens).parse().expect("parse should succeed")
}

fn parse_error(source: &str) -> oolong_compiler::Error {
    let (tokens, errors) = lex(source);
    assert!(errors.is_empty(), "unexpected lexer errors: {errors:?}");
    let tokens = normalize(tokens);
    Parser::new(&tokens)
        .parse()
        .expect_err("expected a parse error")
}

#[test]
fn lexes_indentation_as_block_tokens() {
    let (tokens, errors) = lex("object Point:\n    int x\n");
    assert!(errors.is_empty());
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Object,
            TokenKind::Id,
            TokenKind::Colon,
            TokenKind::Indent,
            TokenKind::IntType,
            TokenKind::Id,
            TokenKind::Dedent,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn blank_lines_between_siblings_normalize_to_newlines() {
    let (tokens, errors) = lex("object A:\n    int x\n\n    int y\n");
    assert!(errors.is_empty());
    let tokens = normalize(tokens);
    let kinds = kinds(&tokens);
    assert!(!kinds
        .windows(2)
        .any(|pair| pair[0] == TokenKind::Dedent && pair[1] == TokenKind::Indent));
    assert!(kinds.contains(&TokenKind::Newline));
}

#[test]
fn closes_every_open_block_at_end_of_input() {
    let (tokens, errors) = lex("object A:\n    fun m():\n        return 1");
    assert!(errors.is_empty());
    let dedents = tokens
        .iter()
        .filter(|token| token.kind == TokenKind::Dedent)
        .count();
    assert_eq!(dedents, 2);
}

#[test]
fn lexes_string_escapes() {
    let (tokens, errors) = lex("fun s() > str:\n    return \"a\\nb\\tc\"\n");
    assert!(errors.is_empty());
    let string = tokens
        .iter()
        .find(|token| token.kind == TokenKind::String)
        .expect("string token");
    assert_eq!(string.lexeme.as_deref(), Some("a\nb\tc"));
}

#[test]
fn rejects_unescaped_braces_in_strings() {
    let (_, errors) = lex("fun s() > str:\n    return \"{oops}\"\n");
    assert!(errors
        .iter()
        .any(|error| error.message.contains("must be escaped")));
}

#[test]
fn lexes_escaped_braces_in_strings() {
    let (tokens, errors) = lex("fun s() > str:\n    return \"{{x}}\"\n");
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    let string = tokens
        .iter()
        .find(|token| token.kind == TokenKind::String)
        .expect("string token");
    assert_eq!(string.lexeme.as_deref(), Some("{x}"));
}

#[test]
fn lexes_number_radixes_and_ranges() {
    let (tokens, errors) = lex("fun n():\n    return 0x1f\n");
    assert!(errors.is_empty());
    let number = tokens
        .iter()
        .find(|token| token.kind == TokenKind::Int)
        .expect("int token");
    assert_eq!(number.lexeme.as_deref(), Some("0x1f"));

    let (tokens, _) = lex("fun n():\n    return 1..2\n");
    let kinds = kinds(&tokens);
    assert!(kinds.contains(&TokenKind::Range));

    let (tokens, _) = lex("fun n():\n    return 3.25\n");
    assert!(tokens.iter().any(|token| token.kind == TokenKind::Float
        && token.lexeme.as_deref() == Some("3.25")));
}

#[test]
fn reports_unexpected_characters_but_keeps_lexing() {
    let (tokens, errors) = lex("fun n() > int:\n    return 1 @\n");
    assert!(errors
        .iter()
        .any(|error| error.message == "unexpected character `@`"));
    assert!(tokens.iter().any(|token| token.kind == TokenKind::Int));
}

#[test]
fn parses_object_header_with_generics_interfaces_and_parent() {
    let namespace = parse("object Dog[T](Walks, Barks) > Animal:\n    int age\n");
    assert_eq!(namespace.records.len(), 1);

    let record = &namespace.records[0];
    assert_eq!(record.name.value, "Dog");
    assert_eq!(record.generic_parameters.len(), 1);
    assert_eq!(record.generic_parameters[0].value, "T");
    assert_eq!(record.interfaces.len(), 2);
    assert_eq!(record.parent.as_ref().unwrap().value, "Animal");
    assert_eq!(record.fields.len(), 1);
    assert_eq!(record.fields[0].name.value, "age");
}

#[test]
fn parses_fields_with_defaults_and_methods() {
    let source = "object Counter:\n    int count = 0\n    fun bump() > int:\n        return 1\n";
    let namespace = parse(source);
    let record = &namespace.records[0];
    assert_eq!(record.fields.len(), 1);
    assert!(record.fields[0].default_value.is_some());
    assert_eq!(record.methods.len(), 1);
    assert_eq!(record.methods[0].name.value, "bump");
}

#[test]
fn parses_function_signature_and_body() {
    let namespace = parse("unsafe fun poke[T](raw T p, int n) > T?:\n    return *p\n");
    let function = &namespace.functions[0];
    assert!(function.is_unsafe);
    assert_eq!(function.generic_parameters.len(), 1);
    assert_eq!(function.parameters.len(), 2);
    assert!(matches!(function.parameters[0].ty, ParsedType::RawPtr(..)));
    assert!(matches!(
        function.return_type,
        Some(ParsedType::Optional(..))
    ));
    assert_eq!(function.body.statements.len(), 1);
}

#[test]
fn parses_labeled_call_arguments() {
    let namespace = parse("fun make() > Point:\n    return Point(x: 1, y: 2)\n");
    let function = &namespace.functions[0];
    let ParsedStatement::Return {
        value: Some(ParsedExpression::Call(call)),
        ..
    } = &function.body.statements[0]
    else {
        panic!("expected a return of a call");
    };
    assert_eq!(call.arguments.len(), 2);
    assert_eq!(call.arguments[0].label.as_ref().unwrap().value, "x");
    assert_eq!(call.arguments[1].label.as_ref().unwrap().value, "y");
}

#[test]
fn parses_if_then_else_expressions() {
    let namespace = parse("fun pick() > int:\n    return if 1 == 1 then 1 else 2\n");
    let function = &namespace.functions[0];
    let ParsedStatement::Return {
        value: Some(ParsedExpression::If(if_expr)),
        ..
    } = &function.body.statements[0]
    else {
        panic!("expected a return of an if expression");
    };
    assert!(matches!(
        if_expr.condition.as_ref(),
        ParsedExpression::Binary(_)
    ));
    assert!(if_expr.else_branch.is_some());
}

#[test]
fn parses_array_and_generic_instance_types() {
    let namespace = parse("fun head([int] items, Box[str] box) > int:\n    return 1\n");
    let function = &namespace.functions[0];
    assert!(matches!(function.parameters[0].ty, ParsedType::Array(..)));
    assert!(matches!(
        function.parameters[1].ty,
        ParsedType::GenericInstance(..)
    ));
}

#[test]
fn rejects_unexpected_top_level_statements() {
    let error = parse_error("return 1\n");
    assert_eq!(
        error.message,
        "expected `object`, or `fun`, but got `return` instead"
    );
}

#[test]
fn rejects_missing_object_name() {
    let error = parse_error("object:\n    int x\n");
    assert_eq!(
        error.message,
        "expected `identifier`, but got `:` instead"
    );
}

#[test]
fn rejects_malformed_expressions() {
    let error = parse_error("fun f() > int:\n    return ,\n");
    assert!(error
        .message
        .starts_with("expected an expression (such as an integer or a string)"));
}
