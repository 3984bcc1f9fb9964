use anyhow::Result;

use crate::ast::Span;
use crate::diagnostics::Error;
use crate::source::SourceFile;

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Option<String>,
    pub span: Span,
}

impl Token {
    fn new(kind: TokenKind, lexeme: Option<String>, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Id,
    Int,
    Float,
    String,

    If,
    Elif,
    Else,
    Then,
    Guard,
    True,
    False,
    Null,
    Object,
    Fun,
    Return,
    Switch,
    Case,
    Default,
    Unsafe,
    Var,
    Raw,
    Weak,

    StrType,
    IntType,

    Minus,
    Equals,
    EqualsEquals,
    GreaterThan,
    LessThan,
    Star,
    Ampersand,
    Question,

    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Colon,
    Comma,
    Dot,
    Range,

    Indent,
    Dedent,
    Newline,
    Eof,
}

impl TokenKind {
    pub fn repr(self) -> &'static str {
        match self {
            TokenKind::Id => "identifier",
            TokenKind::Int => "integer",
            TokenKind::Float => "float",
            TokenKind::String => "string",
            TokenKind::If => "if",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::Then => "then",
            TokenKind::Guard => "guard",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Object => "object",
            TokenKind::Fun => "fun",
            TokenKind::Return => "return",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Unsafe => "unsafe",
            TokenKind::Var => "var",
            TokenKind::Raw => "raw",
            TokenKind::Weak => "weak",
            TokenKind::StrType => "str",
            TokenKind::IntType => "int",
            TokenKind::Minus => "-",
            TokenKind::Equals => "=",
            TokenKind::EqualsEquals => "==",
            TokenKind::GreaterThan => ">",
            TokenKind::LessThan => "<",
            TokenKind::Star => "*",
            TokenKind::Ampersand => "&",
            TokenKind::Question => "?",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Range => "..",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of file",
        }
    }
}

fn keyword_kind(identifier: &str) -> TokenKind {
    match identifier {
        "if" => TokenKind::If,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "then" => TokenKind::Then,
        "guard" => TokenKind::Guard,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "object" => TokenKind::Object,
        "fun" => TokenKind::Fun,
        "return" => TokenKind::Return,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "unsafe" => TokenKind::Unsafe,
        "var" => TokenKind::Var,
        "raw" => TokenKind::Raw,
        "weak" => TokenKind::Weak,
        "str" => TokenKind::StrType,
        "int" => TokenKind::IntType,
        _ => TokenKind::Id,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LexerError {
    #[error("unterminated string literal")]
    UnterminatedString { line: usize, column: usize },
}

impl LexerError {
    pub fn line(&self) -> usize {
        match self {
            LexerError::UnterminatedString { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            LexerError::UnterminatedString { column, .. } => *column,
        }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    /// Inside parentheses or brackets a line break does not open or close a
    /// block; the indentation machinery is suspended until the group closes.
    continues: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a SourceFile) -> Self {
        Self {
            input: &source.contents,
            position: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            continues: false,
        }
    }

    pub fn tokenize(&mut self) -> Result<(Vec<Token>, Vec<Error>)> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        while let Some(ch) = self.peek_char() {
            match ch {
                '\0' => break,
                ' ' | '\r' => {
                    self.advance_char();
                }
                '\n' => {
                    self.lex_newline(&mut tokens);
                }
                '/' => {
                    if self.peek_ahead(1) == Some('/') {
                        while let Some(comment_ch) = self.peek_char() {
                            if comment_ch == '\n' {
                                break;
                            }
                            self.advance_char();
                        }
                    } else {
                        errors.push(Error::new(
                            "unexpected character `/`",
                            Span::new(self.line, self.column, 1),
                        ));
                        self.advance_char();
                    }
                }
                '=' => {
                    if self.peek_ahead(1) == Some('=') {
                        tokens.push(self.multi_char_token(TokenKind::EqualsEquals, 2));
                    } else {
                        tokens.push(self.simple_token(TokenKind::Equals));
                    }
                }
                '>' => tokens.push(self.simple_token(TokenKind::GreaterThan)),
                '<' => tokens.push(self.simple_token(TokenKind::LessThan)),
                '-' => tokens.push(self.simple_token(TokenKind::Minus)),
                '*' => tokens.push(self.simple_token(TokenKind::Star)),
                '&' => tokens.push(self.simple_token(TokenKind::Ampersand)),
                '?' => tokens.push(self.simple_token(TokenKind::Question)),
                '(' => {
                    tokens.push(self.simple_token(TokenKind::OpenParen));
                    self.continues = true;
                }
                ')' => {
                    tokens.push(self.simple_token(TokenKind::CloseParen));
                    self.continues = false;
                }
                '[' => {
                    tokens.push(self.simple_token(TokenKind::OpenBracket));
                    self.continues = true;
                }
                ']' => {
                    tokens.push(self.simple_token(TokenKind::CloseBracket));
                    self.continues = false;
                }
                ',' => tokens.push(self.simple_token(TokenKind::Comma)),
                ':' => tokens.push(self.simple_token(TokenKind::Colon)),
                '.' => tokens.push(self.lex_dot_variants()),
                '"' => {
                    let token = self.lex_string(&mut errors)?;
                    tokens.push(token);
                }
                'a'..='z' | 'A'..='Z' | '_' => {
                    tokens.push(self.lex_identifier_or_keyword());
                }
                '0'..='9' => {
                    tokens.push(self.lex_number());
                }
                other => {
                    errors.push(Error::new(
                        format!("unexpected character `{}`", other),
                        Span::new(self.line, self.column, 1),
                    ));
                    self.advance_char();
                }
            }
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            tokens.push(Token::new(
                TokenKind::Dedent,
                None,
                Span::new(self.line, self.column, 1),
            ));
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            None,
            Span::new(self.line, self.column, 1),
        ));

        Ok((tokens, errors))
    }

    fn lex_newline(&mut self, tokens: &mut Vec<Token>) {
        self.position += 1;

        let mut indent = 0;
        while self.peek_char() == Some(' ') {
            indent += 1;
            self.position += 1;
        }

        self.line += 1;
        self.column = indent + 1;

        if self.continues {
            return;
        }

        let span = Span::new(self.line, 1, indent.max(1));
        let current = *self.indent_stack.last().unwrap_or(&0);
        if indent > current {
            tokens.push(Token::new(TokenKind::Indent, None, span));
            self.indent_stack.push(indent);
        } else if indent < current {
            while self
                .indent_stack
                .last()
                .map(|level| indent < *level)
                .unwrap_or(false)
            {
                tokens.push(Token::new(TokenKind::Dedent, None, span));
                self.indent_stack.pop();
            }
        } else {
            tokens.push(Token::new(TokenKind::Newline, None, span));
        }
    }

    fn lex_dot_variants(&mut self) -> Token {
        if self
            .peek_ahead(1)
            .map(|ch| ch.is_ascii_digit())
            .unwrap_or(false)
        {
            let start_column = self.column;
            let mut value = String::from(".");
            self.advance_char();
            while let Some(digit) = self.peek_char() {
                if !digit.is_ascii_digit() {
                    break;
                }
                value.push(digit);
                self.advance_char();
            }
            let length = value.len();
            return Token::new(
                TokenKind::Float,
                Some(value),
                Span::new(self.line, start_column, length),
            );
        }

        if self.peek_ahead(1) == Some('.') {
            return self.multi_char_token(TokenKind::Range, 2);
        }

        self.simple_token(TokenKind::Dot)
    }

    fn lex_string(&mut self, errors: &mut Vec<Error>) -> Result<Token> {
        let start_line = self.line;
        let start_column = self.column;
        self.advance_char();

        let mut value = String::new();
        loop {
            let Some(ch) = self.peek_char() else {
                return Err(LexerError::UnterminatedString {
                    line: start_line,
                    column: start_column,
                }
                .into());
            };

            match ch {
                '"' => break,
                '\\' => {
                    self.advance_char();
                    match self.peek_char() {
                        Some('\\') => value.push('\\'),
                        Some('t') => value.push('\t'),
                        Some('n') => value.push('\n'),
                        Some('r') => value.push('\r'),
                        Some(other) => {
                            errors.push(Error::new(
                                format!("invalid escape sequence `{}`", other),
                                Span::new(self.line, self.column, 1),
                            ));
                        }
                        None => {
                            return Err(LexerError::UnterminatedString {
                                line: start_line,
                                column: start_column,
                            }
                            .into());
                        }
                    }
                    self.advance_char();
                }
                '{' => {
                    if self.peek_ahead(1) == Some('{') {
                        value.push('{');
                        self.advance_char();
                    } else {
                        errors.push(Error::new(
                            "open braces (`{`) must be escaped (`{{`)",
                            Span::new(self.line, self.column, 1),
                        ));
                    }
                    self.advance_char();
                }
                '}' => {
                    if self.peek_ahead(1) == Some('}') {
                        value.push('}');
                        self.advance_char();
                    } else {
                        errors.push(Error::new(
                            "closing braces (`}`) must be escaped (`}}`)",
                            Span::new(self.line, self.column, 1),
                        ));
                    }
                    self.advance_char();
                }
                other => {
                    value.push(other);
                    self.advance_char();
                }
            }
        }
        self.advance_char();

        let length = value.len().max(1);
        Ok(Token::new(
            TokenKind::String,
            Some(value),
            Span::new(start_line, start_column, length),
        ))
    }

    fn lex_identifier_or_keyword(&mut self) -> Token {
        let start_column = self.column;
        let mut value = String::new();
        while let Some(ch) = self.peek_char() {
            if !ch.is_ascii_alphanumeric() && ch != '_' {
                break;
            }
            value.push(ch);
            self.advance_char();
        }

        let kind = keyword_kind(&value);
        let length = value.len();
        Token::new(
            kind,
            Some(value),
            Span::new(self.line, start_column, length),
        )
    }

    fn lex_number(&mut self) -> Token {
        let start_column = self.column;
        let mut value = String::new();
        let mut is_float = false;

        if self.peek_char() == Some('0') {
            match self.peek_ahead(1) {
                Some('x') => {
                    value.push_str("0x");
                    self.advance_char();
                    self.advance_char();
                    while let Some(ch) = self.peek_char() {
                        if !ch.is_ascii_hexdigit() {
                            break;
                        }
                        value.push(ch);
                        self.advance_char();
                    }
                    return self.number_token(value, false, start_column);
                }
                Some('b') => {
                    value.push_str("0b");
                    self.advance_char();
                    self.advance_char();
                    while let Some(ch) = self.peek_char() {
                        if ch != '0' && ch != '1' {
                            break;
                        }
                        value.push(ch);
                        self.advance_char();
                    }
                    return self.number_token(value, false, start_column);
                }
                _ => {}
            }
        }

        while let Some(ch) = self.peek_char() {
            if !ch.is_ascii_digit() {
                break;
            }
            value.push(ch);
            self.advance_char();
        }

        if self.peek_char() == Some('.') && self.peek_ahead(1) != Some('.') {
            self.advance_char();
            value.push('.');
            is_float = true;
            while let Some(ch) = self.peek_char() {
                if !ch.is_ascii_digit() {
                    break;
                }
                value.push(ch);
                self.advance_char();
            }
        }

        self.number_token(value, is_float, start_column)
    }

    fn number_token(&self, value: String, is_float: bool, start_column: usize) -> Token {
        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        let length = value.len();
        Token::new(
            kind,
            Some(value),
            Span::new(self.line, start_column, length),
        )
    }

    fn simple_token(&mut self, kind: TokenKind) -> Token {
        let span = Span::new(self.line, self.column, 1);
        self.advance_char();
        Token::new(kind, None, span)
    }

    fn multi_char_token(&mut self, kind: TokenKind, length: usize) -> Token {
        let span = Span::new(self.line, self.column, length);
        for _ in 0..length {
            self.advance_char();
        }
        Token::new(kind, None, span)
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input[self.position..].chars().nth(offset)
    }

    fn advance_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.position += ch.len_utf8();
            self.column += 1;
        }
    }
}

/// Rewrites each `Dedent` immediately followed by `Indent` into a single
/// `Newline`, so a sibling block at the same depth reads as a line break
/// instead of a close-then-open pair.
pub fn normalize(tokens: Vec<Token>) -> Vec<Token> {
    let mut normalized = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        if token.kind == TokenKind::Dedent
            && iter
                .peek()
                .map(|next| next.kind == TokenKind::Indent)
                .unwrap_or(false)
        {
            normalized.push(Token::new(TokenKind::Newline, None, token.span));
            iter.next();
        } else {
            normalized.push(token);
        }
    }

    normalized
}
