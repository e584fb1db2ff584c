use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Token types for the constrained JS/JSX subset used by view and logic files
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token<'src> {
    // Keywords
    #[token("import")]
    Import,

    #[token("export")]
    Export,

    #[token("default")]
    Default,

    #[token("function")]
    Function,

    #[token("return")]
    Return,

    #[token("const")]
    Const,

    #[token("let")]
    Let,

    #[token("var")]
    Var,

    #[token("from")]
    From,

    #[token("async")]
    Async,

    #[token("await")]
    Await,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,

    // Identifiers
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    // String literals (raw slice, quotes included)
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| lex.slice())]
    String(&'src str),

    // Template literals are kept opaque; their contents are never classified
    #[regex(r"`([^`\\]|\\.)*`", |lex| lex.slice())]
    TemplateString(&'src str),

    // Numbers
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),

    // Comments are semantic input here: the bindings block and logic-file
    // descriptions both live in them
    #[regex(r"//[^\n]*", |lex| lex.slice())]
    LineComment(&'src str),

    #[regex(r"/\*([^*]|\*[^/])*\*/", |lex| lex.slice())]
    BlockComment(&'src str),

    // Punctuation
    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("/")]
    Slash,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("=>")]
    Arrow,

    #[token("=")]
    Eq,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token("?")]
    Question,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("&")]
    Amp,

    #[token("|")]
    Pipe,

    #[token("!")]
    Bang,

    // Anything the lexer cannot classify (JSX text runs, stray punctuation).
    // The parser skips these in child position and rejects them elsewhere.
    #[regex(r".", priority = 0)]
    Unknown,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) | Token::String(s) | Token::Number(s) => write!(f, "{}", s),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Tokenize source text into (token, byte range) pairs.
///
/// Unknown characters become `Token::Unknown` spans rather than hard errors;
/// whether they are tolerable depends on where they appear.
pub fn tokenize(source: &str) -> Vec<(Token<'_>, Range<usize>)> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => tokens.push((Token::Unknown, span)),
        }
    }

    tokens
}

/// Unquote and unescape a string literal token slice
pub fn string_value(raw: &str) -> String {
    let inner = if raw.len() >= 2 {
        &raw[1..raw.len() - 1]
    } else {
        raw
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => break,
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a byte offset to (line, column): line is 1-based, column 0-based
pub fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1;
    let mut col = 0;
    let mut current = 0;

    for ch in source.chars() {
        if current >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
        current += ch.len_utf8();
    }

    (line, col)
}
