//! logos-based tokenizer for property values.
//!
//! Longest match wins, so `**` beats `*`, `>=` beats `>`, and `50%` lexes as
//! one [`Token::Number`] rather than a number followed by [`Token::Percent`].
//! A remainder operator therefore needs surrounding whitespace: `10 % 3`.

use logos::Logos;

/// Value token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // ── Multi-character operators ────────────────────────────────────
    #[token("**")]
    StarStar,

    #[token(">=")]
    GreaterEq,

    #[token("<=")]
    LessEq,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    // ── Literals ─────────────────────────────────────────────────────
    /// Number with an optional unit suffix: `10`, `1.6`, `100px`, `50%`.
    #[regex(r"[0-9]+(\.[0-9]+)?(%|[a-zA-Z]+)?")]
    Number,

    /// Double-quoted string literal.
    #[regex(r#""[^"]*""#)]
    StringLiteral,

    /// Single-quoted string literal.
    #[regex(r"'[^']*'")]
    StringLiteralSingle,

    /// Identifier: property names, tag names, keywords, var groups.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    // ── Single-character punctuation ─────────────────────────────────
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

    #[token(">")]
    Greater,

    #[token("<")]
    Less,

    #[token("?")]
    Question,

    #[token(":")]
    Colon,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token(".")]
    Dot,

    #[token("#")]
    Hash,
}

/// A token with its source text and byte offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub text: String,
    pub offset: usize,
}

/// Tokenize a property value.
///
/// Fails with the byte offset of the first character that starts no token.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, usize> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push(Spanned {
                token,
                text: input[span.clone()].to_owned(),
                offset: span.start,
            }),
            Err(()) => return Err(span.start),
        }
    }
    Ok(tokens)
}
