use logos::Logos;
use std::ops::Range;

/// Token types for application source files
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token<'src> {
    // Keywords
    #[token("const")]
    Const,

    #[token("let")]
    Let,

    #[token("var")]
    Var,

    #[token("function")]
    Function,

    #[token("return")]
    Return,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("export")]
    Export,

    #[token("default")]
    Default,

    #[token("import")]
    Import,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,

    #[token("undefined")]
    Undefined,

    #[token("new")]
    New,

    #[token("throw")]
    Throw,

    #[token("try")]
    Try,

    #[token("catch")]
    Catch,

    #[token("finally")]
    Finally,

    #[token("for")]
    For,

    #[token("while")]
    While,

    #[token("break")]
    Break,

    #[token("continue")]
    Continue,

    #[token("typeof")]
    Typeof,

    // Identifiers. Contextual words (`type`, `as`, `from`, `of`, ...) stay identifiers.
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"\.[0-9]+", |lex| lex.slice())]
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| lex.slice())]
    Number(&'src str),

    // String literals keep their quotes; the parser unescapes them
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| lex.slice())]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, |lex| lex.slice())]
    String(&'src str),

    #[regex(r"`([^`\\]|\\.)*`", |lex| lex.slice())]
    Template(&'src str),

    // Operators
    #[token("===")]
    StrictEq,

    #[token("!==")]
    StrictNotEq,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<=")]
    LtEq,

    #[token(">=")]
    GtEq,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    #[token("??")]
    Nullish,

    #[token("?.")]
    QuestionDot,

    #[token("?")]
    Question,

    #[token("=>")]
    Arrow,

    #[token("=")]
    Eq,

    #[token("+=")]
    PlusEq,

    #[token("-=")]
    MinusEq,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("!")]
    Bang,

    #[token("|")]
    Pipe,

    #[token("&")]
    Amp,

    // Punctuation
    #[token("...")]
    Ellipsis,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,
}

impl<'src> Token<'src> {
    /// Source text of keyword tokens, used where keywords are valid
    /// property names (`obj.default`, `{ new: true }`).
    pub fn keyword_text(&self) -> Option<&'static str> {
        Some(match self {
            Token::Const => "const",
            Token::Let => "let",
            Token::Var => "var",
            Token::Function => "function",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::Export => "export",
            Token::Default => "default",
            Token::Import => "import",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::Undefined => "undefined",
            Token::New => "new",
            Token::Throw => "throw",
            Token::Try => "try",
            Token::Catch => "catch",
            Token::Finally => "finally",
            Token::For => "for",
            Token::While => "while",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Typeof => "typeof",
            _ => return None,
        })
    }

    /// Human readable form for error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier '{}'", s),
            Token::Number(n) => format!("number {}", n),
            Token::String(s) => format!("string {}", s),
            Token::Template(_) => "template literal".to_string(),
            other => match other.keyword_text() {
                Some(kw) => format!("keyword '{}'", kw),
                None => format!("'{}'", other.punctuation_text()),
            },
        }
    }

    fn punctuation_text(&self) -> &'static str {
        match self {
            Token::StrictEq => "===",
            Token::StrictNotEq => "!==",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Nullish => "??",
            Token::QuestionDot => "?.",
            Token::Question => "?",
            Token::Arrow => "=>",
            Token::Eq => "=",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::Pipe => "|",
            Token::Amp => "&",
            Token::Ellipsis => "...",
            Token::Dot => ".",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            _ => "?",
        }
    }
}

/// Result of lexing a single token at a byte offset
#[derive(Debug, Clone, PartialEq)]
pub enum Lexed<'src> {
    Token(Token<'src>, Range<usize>),
    /// Unrecognised input starting at the given range
    Error(Range<usize>),
    Eof(usize),
}

/// Lex the first token of `source[pos..end]`, reporting absolute offsets.
///
/// Markup text is not tokenizable with the expression grammar, so the parser
/// lexes on demand from its current position instead of from a token vector.
pub fn lex_at(source: &str, pos: usize, end: usize) -> Lexed<'_> {
    let mut lexer = Token::lexer(&source[pos..end]);
    match lexer.next() {
        Some(Ok(token)) => {
            let span = lexer.span();
            Lexed::Token(token, pos + span.start..pos + span.end)
        }
        Some(Err(())) => {
            let span = lexer.span();
            Lexed::Error(pos + span.start..pos + span.end)
        }
        None => Lexed::Eof(end),
    }
}

/// Tokenize a whole source text. Stops at the first lexer error.
pub fn tokenize(source: &str) -> Vec<(Token<'_>, Range<usize>)> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => break,
        }
    }
    tokens
}
