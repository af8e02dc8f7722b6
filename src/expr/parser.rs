//! Recursive descent parser for property values.
//!
//! Precedence, lowest first:
//!
//! ```text
//! conditional   cond ? a : b          (right-assoc)
//! or            ||
//! and           &&
//! equality      == !=
//! relational    > >= < <=
//! additive      + -
//! multiplicative * / %
//! power         **                    (right-assoc)
//! unary         -x
//! primary       number, string, (expr), Group(var), [selector.]property
//! ```

use crate::ast::{BinaryOp, ExprAst, Selector};

use super::tokenizer::{tokenize, Spanned, Token};

/// Errors from value parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected token at position {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    #[error("unrecognized character at byte {0}")]
    InvalidCharacter(usize),
    #[error("empty value")]
    Empty,
}

/// Parse a property value into an expression.
pub fn parse_value(input: &str) -> Result<ExprAst, ParseError> {
    let tokens = tokenize(input).map_err(ParseError::InvalidCharacter)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser { tokens, cursor: 0 };
    let expr = parser.parse_conditional()?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(ParseError::UnexpectedToken {
            position: parser.cursor,
            message: format!("trailing {:?} '{}'", tok.token, tok.text),
        }),
    }
}

/// Parse a property value, keeping values outside the expression grammar
/// (`1px solid black`, `rgb(0, 0, 0)`, `#fff`) as a verbatim literal.
pub fn parse_value_lossy(input: &str) -> ExprAst {
    parse_value(input).unwrap_or_else(|_| ExprAst::Literal(input.trim().to_owned()))
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.cursor)
    }

    fn peek_token(&self) -> Option<Token> {
        self.peek().map(|t| t.token)
    }

    fn peek_token_at(&self, offset: usize) -> Option<Token> {
        self.tokens.get(self.cursor + offset).map(|t| t.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn eat(&mut self, expected: Token) -> bool {
        if self.peek_token() == Some(expected) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<Spanned, ParseError> {
        let position = self.cursor;
        match self.advance() {
            Some(tok) if tok.token == expected => Ok(tok),
            Some(tok) => Err(ParseError::UnexpectedToken {
                position,
                message: format!("expected {:?}, got {:?} '{}'", expected, tok.token, tok.text),
            }),
            None => Err(ParseError::UnexpectedEof(format!("expected {expected:?}"))),
        }
    }

    fn parse_conditional(&mut self) -> Result<ExprAst, ParseError> {
        let cond = self.parse_or()?;
        if !self.eat(Token::Question) {
            return Ok(cond);
        }
        let if_true = self.parse_conditional()?;
        self.expect(Token::Colon)?;
        let if_false = self.parse_conditional()?;
        Ok(ExprAst::conditional(cond, if_true, if_false))
    }

    /// Parse one left-associative precedence level.
    fn parse_left_assoc(
        &mut self,
        operators: &[(Token, BinaryOp)],
        next: fn(&mut Self) -> Result<ExprAst, ParseError>,
    ) -> Result<ExprAst, ParseError> {
        let mut left = next(self)?;
        'outer: loop {
            for &(token, op) in operators {
                if self.eat(token) {
                    let right = next(self)?;
                    left = ExprAst::binary(op, left, right);
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn parse_or(&mut self) -> Result<ExprAst, ParseError> {
        self.parse_left_assoc(&[(Token::OrOr, BinaryOp::Or)], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<ExprAst, ParseError> {
        self.parse_left_assoc(&[(Token::AndAnd, BinaryOp::And)], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<ExprAst, ParseError> {
        self.parse_left_assoc(
            &[(Token::EqEq, BinaryOp::Eq), (Token::NotEq, BinaryOp::Ne)],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> Result<ExprAst, ParseError> {
        self.parse_left_assoc(
            &[
                (Token::GreaterEq, BinaryOp::Ge),
                (Token::Greater, BinaryOp::Gt),
                (Token::LessEq, BinaryOp::Le),
                (Token::Less, BinaryOp::Lt),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<ExprAst, ParseError> {
        self.parse_left_assoc(
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<ExprAst, ParseError> {
        self.parse_left_assoc(
            &[
                (Token::Star, BinaryOp::Mul),
                (Token::Slash, BinaryOp::Div),
                (Token::Percent, BinaryOp::Rem),
            ],
            Self::parse_power,
        )
    }

    fn parse_power(&mut self) -> Result<ExprAst, ParseError> {
        let base = self.parse_unary()?;
        if self.eat(Token::StarStar) {
            let exponent = self.parse_power()?;
            return Ok(ExprAst::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<ExprAst, ParseError> {
        if !self.eat(Token::Minus) {
            return self.parse_primary();
        }
        match self.parse_unary()? {
            ExprAst::Dimension(value, unit) => Ok(ExprAst::Dimension(-value, unit)),
            operand => Ok(ExprAst::binary(BinaryOp::Sub, ExprAst::number(0.0), operand)),
        }
    }

    fn parse_primary(&mut self) -> Result<ExprAst, ParseError> {
        let position = self.cursor;
        let tok = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof("expected a value".into()))?;

        match tok.token {
            Token::Number => Ok(split_dimension(&tok.text)),
            Token::StringLiteral | Token::StringLiteralSingle => {
                Ok(ExprAst::literal(&tok.text[1..tok.text.len() - 1]))
            }
            Token::ParenOpen => {
                let inner = self.parse_conditional()?;
                self.expect(Token::ParenClose)?;
                Ok(inner)
            }
            Token::Hash => {
                let name = self.expect(Token::Ident)?;
                let selector = Selector::id(name.text);
                self.parse_selector_property(selector)
            }
            Token::Dot => {
                let name = self.expect(Token::Ident)?;
                let selector = Selector::class(name.text);
                self.parse_selector_property(selector)
            }
            Token::Ident => self.parse_ident(tok.text),
            other => Err(ParseError::UnexpectedToken {
                position,
                message: format!("expected a value, got {:?} '{}'", other, tok.text),
            }),
        }
    }

    /// After an identifier: `Group(var)`, `tag.prop`, `tag[n].prop` or a bare
    /// property name.
    fn parse_ident(&mut self, name: String) -> Result<ExprAst, ParseError> {
        match self.peek_token() {
            Some(Token::ParenOpen) => {
                self.advance();
                let var = self.expect(Token::Ident)?;
                self.expect(Token::ParenClose)?;
                Ok(ExprAst::var(name, var.text))
            }
            Some(Token::BracketOpen) => self.parse_selector_property(Selector::tag(name)),
            Some(Token::Dot) if self.peek_token_at(1) == Some(Token::Ident) => {
                self.parse_selector_property(Selector::tag(name))
            }
            _ => Ok(ExprAst::prop(name)),
        }
    }

    /// `[n]? . property` following a selector.
    fn parse_selector_property(&mut self, mut selector: Selector) -> Result<ExprAst, ParseError> {
        if self.eat(Token::BracketOpen) {
            let position = self.cursor;
            let index = self.expect(Token::Number)?;
            selector.index = Some(index.text.parse().map_err(|_| ParseError::UnexpectedToken {
                position,
                message: format!("expected an element index, got '{}'", index.text),
            })?);
            self.expect(Token::BracketClose)?;
        }
        self.expect(Token::Dot)?;
        let property = self.expect(Token::Ident)?;
        Ok(ExprAst::prop_of(selector, property.text))
    }
}

/// Split `100px` into `Dimension(100, Some("px"))`.
fn split_dimension(text: &str) -> ExprAst {
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    // The tokenizer only emits well-formed numbers here.
    let value = number.parse::<f64>().unwrap_or_default();
    ExprAst::dim(value, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dimension_and_number() {
        assert_eq!(parse_value("100px").unwrap(), ExprAst::dim(100.0, "px"));
        assert_eq!(parse_value("1.6").unwrap(), ExprAst::number(1.6));
        assert_eq!(parse_value("50%").unwrap(), ExprAst::dim(50.0, "%"));
    }

    #[test]
    fn strings_unquoted() {
        assert_eq!(parse_value("\"red\"").unwrap(), ExprAst::literal("red"));
        assert_eq!(parse_value("'a b'").unwrap(), ExprAst::literal("a b"));
    }

    #[test]
    fn bare_ident_is_local_ref() {
        assert_eq!(parse_value("width").unwrap(), ExprAst::prop("width"));
    }

    #[test]
    fn cross_references() {
        assert_eq!(
            parse_value("#box.width").unwrap(),
            ExprAst::prop_of(Selector::id("box"), "width")
        );
        assert_eq!(
            parse_value(".card.height").unwrap(),
            ExprAst::prop_of(Selector::class("card"), "height")
        );
        assert_eq!(
            parse_value("div.width").unwrap(),
            ExprAst::prop_of(Selector::tag("div"), "width")
        );
        assert_eq!(
            parse_value("li[2].margin-top").unwrap(),
            ExprAst::prop_of(Selector::tag("li").with_index(2), "margin-top")
        );
    }

    #[test]
    fn var_ref() {
        assert_eq!(
            parse_value("Theme(primary)").unwrap(),
            ExprAst::var("Theme", "primary")
        );
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert_eq!(
            parse_value("1px + 2px * 3").unwrap(),
            ExprAst::binary(
                BinaryOp::Add,
                ExprAst::dim(1.0, "px"),
                ExprAst::binary(BinaryOp::Mul, ExprAst::dim(2.0, "px"), ExprAst::number(3.0)),
            )
        );
    }

    #[test]
    fn subtraction_is_left_assoc() {
        assert_eq!(
            parse_value("10 - 3 - 2").unwrap(),
            ExprAst::binary(
                BinaryOp::Sub,
                ExprAst::binary(BinaryOp::Sub, ExprAst::number(10.0), ExprAst::number(3.0)),
                ExprAst::number(2.0),
            )
        );
    }

    #[test]
    fn power_is_right_assoc() {
        assert_eq!(
            parse_value("2 ** 3 ** 2").unwrap(),
            ExprAst::binary(
                BinaryOp::Pow,
                ExprAst::number(2.0),
                ExprAst::binary(BinaryOp::Pow, ExprAst::number(3.0), ExprAst::number(2.0)),
            )
        );
    }

    #[test]
    fn conditional_lowest_and_right_assoc() {
        let expr = parse_value("a > 1 ? 1 : b > 2 ? 2 : 3").unwrap();
        let expected = ExprAst::conditional(
            ExprAst::binary(BinaryOp::Gt, ExprAst::prop("a"), ExprAst::number(1.0)),
            ExprAst::number(1.0),
            ExprAst::conditional(
                ExprAst::binary(BinaryOp::Gt, ExprAst::prop("b"), ExprAst::number(2.0)),
                ExprAst::number(2.0),
                ExprAst::number(3.0),
            ),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn logical_precedence() {
        assert_eq!(
            parse_value("a || b && c").unwrap(),
            ExprAst::binary(
                BinaryOp::Or,
                ExprAst::prop("a"),
                ExprAst::binary(BinaryOp::And, ExprAst::prop("b"), ExprAst::prop("c")),
            )
        );
    }

    #[test]
    fn unary_minus() {
        assert_eq!(parse_value("-5px").unwrap(), ExprAst::dim(-5.0, "px"));
        assert_eq!(
            parse_value("-width").unwrap(),
            ExprAst::binary(BinaryOp::Sub, ExprAst::number(0.0), ExprAst::prop("width"))
        );
    }

    #[test]
    fn parentheses() {
        assert_eq!(
            parse_value("(1 + 2) * 3").unwrap(),
            ExprAst::binary(
                BinaryOp::Mul,
                ExprAst::binary(BinaryOp::Add, ExprAst::number(1.0), ExprAst::number(2.0)),
                ExprAst::number(3.0),
            )
        );
    }

    #[test]
    fn errors() {
        assert_eq!(parse_value("   "), Err(ParseError::Empty));
        assert!(matches!(parse_value("1px solid black"), Err(ParseError::UnexpectedToken { .. })));
        assert!(matches!(parse_value("(1 + 2"), Err(ParseError::UnexpectedEof(_))));
        assert!(matches!(parse_value("a ; b"), Err(ParseError::InvalidCharacter(2))));
    }

    #[test]
    fn lossy_fallback_keeps_source() {
        assert_eq!(parse_value_lossy(" 1px solid black "), ExprAst::literal("1px solid black"));
        assert_eq!(parse_value_lossy("rgb(0, 0, 0)"), ExprAst::literal("rgb(0, 0, 0)"));
        assert_eq!(parse_value_lossy("#fff"), ExprAst::literal("#fff"));
        assert_eq!(parse_value_lossy("black"), ExprAst::prop("black"));
    }
}
