//! `XPath` 1.0 expression tokenizer.
//!
//! Converts an expression string into [`Token`]s following the lexical
//! structure of <https://www.w3.org/TR/xpath-10/#exprlex>.
//!
//! # Disambiguation
//!
//! The rules of `XPath` 1.0 section 3.7 are applied while scanning, using
//! the previous token:
//!
//! - After a token that can end an operand, `*` is multiplication and the
//!   names `and`, `or`, `div`, `mod` are operators.
//! - A name followed by `(` is a function name or a node type.
//! - A name followed by `::` is an axis name.

use std::fmt;

use crate::util::qname::{is_name_char, is_name_start_char};

use super::types::XPathError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Dot,
    DotDot,
    At,
    Comma,
    ColonColon,
    Slash,
    DoubleSlash,
    Pipe,
    Plus,
    Minus,
    /// `*` as the multiplication operator.
    Multiply,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    And,
    Or,
    Div,
    Mod,
    Number(f64),
    Literal(String),
    /// A name test: `*`, `prefix:*`, `name` or `prefix:name`.
    NameTest(String),
    /// A variable reference, without the `$`.
    Variable(String),
    FunctionName(String),
    NodeType(String),
    AxisName(String),
}

impl Token {
    /// Whether this token can end an operand, which turns a following `*`
    /// or operator name into an operator.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Self::RightParen
                | Self::RightBracket
                | Self::Dot
                | Self::DotDot
                | Self::Number(_)
                | Self::Literal(_)
                | Self::NameTest(_)
                | Self::Variable(_)
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBracket => "[",
            Self::RightBracket => "]",
            Self::Dot => ".",
            Self::DotDot => "..",
            Self::At => "@",
            Self::Comma => ",",
            Self::ColonColon => "::",
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Pipe => "|",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
            Self::And => "and",
            Self::Or => "or",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::Number(n) => return write!(f, "{n}"),
            Self::Literal(s) => return write!(f, "\"{s}\""),
            Self::Variable(name) => return write!(f, "${name}"),
            Self::NameTest(s) | Self::FunctionName(s) | Self::NodeType(s) | Self::AxisName(s) => s,
        };
        f.write_str(symbol)
    }
}

/// Tokenizes an expression.
///
/// # Errors
///
/// Returns [`XPathError::InvalidExpression`] for unterminated literals and
/// characters that cannot start a token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, XPathError> {
    let mut lexer = Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> Result<(), XPathError> {
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else {
                return Ok(());
            };
            let token = self.next_token(c)?;
            self.tokens.push(token);
        }
    }

    fn next_token(&mut self, c: char) -> Result<Token, XPathError> {
        let token = match c {
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            '@' => self.single(Token::At),
            ',' => self.single(Token::Comma),
            '|' => self.single(Token::Pipe),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '=' => self.single(Token::Equal),
            '/' => self.either("//", Token::DoubleSlash, Token::Slash),
            '<' => self.either("<=", Token::LessThanEqual, Token::LessThan),
            '>' => self.either(">=", Token::GreaterThanEqual, Token::GreaterThan),
            '!' if self.rest().starts_with("!=") => {
                self.pos += 2;
                Token::NotEqual
            }
            ':' if self.rest().starts_with("::") => {
                self.pos += 2;
                Token::ColonColon
            }
            '.' => match self.rest().as_bytes().get(1) {
                Some(b'.') => {
                    self.pos += 2;
                    Token::DotDot
                }
                Some(b) if b.is_ascii_digit() => self.number(),
                _ => self.single(Token::Dot),
            },
            '0'..='9' => self.number(),
            '"' | '\'' => self.literal(c)?,
            '$' => {
                self.pos += 1;
                let name = self.qname();
                if name.is_empty() {
                    return Err(self.error("expected variable name after '$'"));
                }
                Token::Variable(name.to_string())
            }
            '*' => {
                self.pos += 1;
                if self.operator_expected() {
                    Token::Multiply
                } else {
                    Token::NameTest("*".to_string())
                }
            }
            c if c != ':' && is_name_start_char(c) => self.name(),
            other => return Err(self.error(&format!("unexpected character '{other}'"))),
        };
        Ok(token)
    }

    fn name(&mut self) -> Token {
        let mut name = self.qname().to_string();
        if !name.contains(':') && self.rest().starts_with(":*") {
            self.pos += 2;
            name.push_str(":*");
        }

        if self.operator_expected() {
            match name.as_str() {
                "and" => return Token::And,
                "or" => return Token::Or,
                "div" => return Token::Div,
                "mod" => return Token::Mod,
                _ => {}
            }
        }

        let after = self.rest().trim_start();
        if after.starts_with("::") {
            Token::AxisName(name)
        } else if after.starts_with('(') {
            if matches!(
                name.as_str(),
                "comment" | "text" | "node" | "processing-instruction"
            ) {
                Token::NodeType(name)
            } else {
                Token::FunctionName(name)
            }
        } else {
            Token::NameTest(name)
        }
    }

    /// Scans an `NCName` optionally followed by `:NCName`.
    fn qname(&mut self) -> &'a str {
        let input = self.input;
        let start = self.pos;
        self.ncname();
        if self.pos > start && self.rest().starts_with(':') {
            let colon = self.pos;
            self.pos += 1;
            if self.peek().is_some_and(|c| c != ':' && is_name_start_char(c)) {
                self.ncname();
            } else {
                self.pos = colon;
            }
        }
        &input[start..self.pos]
    }

    fn ncname(&mut self) {
        if self.peek().is_some_and(|c| is_name_start_char(c) && c != ':') {
            while let Some(c) = self.peek().filter(|&c| is_name_char(c) && c != ':') {
                self.pos += c.len_utf8();
            }
        }
    }

    fn number(&mut self) -> Token {
        let start = self.pos;
        let digits = |s: &str| s.bytes().take_while(u8::is_ascii_digit).count();
        let integer = digits(self.rest());
        self.pos += integer;
        if self.rest().starts_with('.') {
            self.pos += 1;
            let fraction = digits(self.rest());
            self.pos += fraction;
        }
        Token::Number(self.input[start..self.pos].parse().unwrap_or(f64::NAN))
    }

    fn literal(&mut self, quote: char) -> Result<Token, XPathError> {
        let body = &self.rest()[1..];
        let end = body
            .find(quote)
            .ok_or_else(|| self.error("unterminated string literal"))?;
        let value = body[..end].to_string();
        self.pos += end + 2;
        Ok(Token::Literal(value))
    }

    fn operator_expected(&self) -> bool {
        self.tokens.last().is_some_and(Token::ends_operand)
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    fn either(&mut self, long: &str, long_token: Token, short_token: Token) -> Token {
        if self.rest().starts_with(long) {
            self.pos += long.len();
            long_token
        } else {
            self.pos += 1;
            short_token
        }
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let skip = rest.len() - rest.trim_start_matches([' ', '\t', '\r', '\n']).len();
        self.pos += skip;
    }

    fn error(&self, message: &str) -> XPathError {
        XPathError::InvalidExpression {
            message: format!("{message} at offset {}", self.pos),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(s: &str) -> Token {
        Token::NameTest(s.to_string())
    }

    #[test]
    fn test_tokenize_abbreviated_path() {
        assert_eq!(
            tokenize("//a/@b").unwrap(),
            vec![Token::DoubleSlash, name("a"), Token::Slash, Token::At, name("b")]
        );
    }

    #[test]
    fn test_star_is_name_test_or_multiply() {
        assert_eq!(
            tokenize("* * *").unwrap(),
            vec![name("*"), Token::Multiply, name("*")]
        );
        assert_eq!(
            tokenize("2*3").unwrap(),
            vec![Token::Number(2.0), Token::Multiply, Token::Number(3.0)]
        );
    }

    #[test]
    fn test_operator_names_depend_on_context() {
        assert_eq!(
            tokenize("div div div").unwrap(),
            vec![name("div"), Token::Div, name("div")]
        );
        assert_eq!(
            tokenize("a and b or c").unwrap(),
            vec![name("a"), Token::And, name("b"), Token::Or, name("c")]
        );
    }

    #[test]
    fn test_function_node_type_and_axis() {
        assert_eq!(
            tokenize("count (child::text())").unwrap(),
            vec![
                Token::FunctionName("count".to_string()),
                Token::LeftParen,
                Token::AxisName("child".to_string()),
                Token::ColonColon,
                Token::NodeType("text".to_string()),
                Token::LeftParen,
                Token::RightParen,
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_qualified_names_and_prefix_wildcard() {
        assert_eq!(
            tokenize("p:a/p:*").unwrap(),
            vec![name("p:a"), Token::Slash, name("p:*")]
        );
    }

    #[test]
    fn test_numbers_and_literals() {
        assert_eq!(
            tokenize(".5 1. 'x\"y' \"z\"").unwrap(),
            vec![
                Token::Number(0.5),
                Token::Number(1.0),
                Token::Literal("x\"y".to_string()),
                Token::Literal("z".to_string()),
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            tokenize("1<=2!=3>=4").unwrap(),
            vec![
                Token::Number(1.0),
                Token::LessThanEqual,
                Token::Number(2.0),
                Token::NotEqual,
                Token::Number(3.0),
                Token::GreaterThanEqual,
                Token::Number(4.0),
            ]
        );
    }

    #[test]
    fn test_variable_reference() {
        assert_eq!(
            tokenize("$ns:v").unwrap(),
            vec![Token::Variable("ns:v".to_string())]
        );
    }

    #[test]
    fn test_unterminated_literal() {
        let err = tokenize("'abc").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_unexpected_character() {
        assert!(tokenize("a ! b").is_err());
        assert!(tokenize("#").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("  ").unwrap().is_empty());
    }
}
