//! Recursive descent parser for `XPath` 1.0 expressions.
//!
//! Each grammar production of <https://www.w3.org/TR/xpath-10/> is a method
//! on [`Parser`]. Operators of one precedence level are left-associative.
//!
//! ```text
//! Expr           ::= OrExpr
//! OrExpr         ::= AndExpr ('or' AndExpr)*
//! AndExpr        ::= EqualityExpr ('and' EqualityExpr)*
//! EqualityExpr   ::= RelationalExpr (('=' | '!=') RelationalExpr)*
//! RelationalExpr ::= AdditiveExpr (('<' | '>' | '<=' | '>=') AdditiveExpr)*
//! AdditiveExpr   ::= MultiplicativeExpr (('+' | '-') MultiplicativeExpr)*
//! MultiplicativeExpr ::= UnaryExpr (('*' | 'div' | 'mod') UnaryExpr)*
//! UnaryExpr      ::= '-'* UnionExpr
//! UnionExpr      ::= PathExpr ('|' PathExpr)*
//! PathExpr       ::= LocationPath | FilterExpr (('/' | '//') RelativeLocationPath)?
//! ```

use super::ast::{Axis, BinaryOp, Expr, LocationPath, NodeTest, Step};
use super::lexer::{tokenize, Token};
use super::types::XPathError;

/// Compiles an expression string into an [`Expr`].
///
/// # Errors
///
/// Returns [`XPathError::InvalidExpression`] if the expression is empty or
/// malformed.
///
/// # Examples
///
/// ```
/// use xmldom::xpath::parser::parse;
///
/// assert!(parse("//book[@price > 10]/title").is_ok());
/// assert!(parse("//book[").is_err());
/// ```
pub fn parse(input: &str) -> Result<Expr, XPathError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(XPathError::InvalidExpression {
            message: "empty expression".to_string(),
        });
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error(&format!("unexpected '{token}' after expression")));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), XPathError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{token}', found {}", self.describe())))
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn describe(&self) -> String {
        self.peek()
            .map_or_else(|| "end of expression".to_string(), |t| format!("'{t}'"))
    }

    fn error(&self, message: &str) -> XPathError {
        XPathError::InvalidExpression {
            message: format!("{message} (token {})", self.pos),
        }
    }

    // --- Operators ---

    fn expr(&mut self) -> Result<Expr, XPathError> {
        self.binary_level(0)
    }

    /// Parses one left-associative precedence level, lowest first.
    fn binary_level(&mut self, level: usize) -> Result<Expr, XPathError> {
        const LEVELS: [&[(Token, BinaryOp)]; 6] = [
            &[(Token::Or, BinaryOp::Or)],
            &[(Token::And, BinaryOp::And)],
            &[(Token::Equal, BinaryOp::Eq), (Token::NotEqual, BinaryOp::Neq)],
            &[
                (Token::LessThan, BinaryOp::Lt),
                (Token::LessThanEqual, BinaryOp::Lte),
                (Token::GreaterThan, BinaryOp::Gt),
                (Token::GreaterThanEqual, BinaryOp::Gte),
            ],
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            &[
                (Token::Multiply, BinaryOp::Mul),
                (Token::Div, BinaryOp::Div),
                (Token::Mod, BinaryOp::Mod),
            ],
        ];

        let Some(operators) = LEVELS.get(level) else {
            return self.unary();
        };
        let mut lhs = self.binary_level(level + 1)?;
        while let Some(op) = operators
            .iter()
            .find(|(token, _)| self.peek() == Some(token))
            .map(|&(_, op)| op)
        {
            self.pos += 1;
            let rhs = self.binary_level(level + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, XPathError> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Negate(Box::new(self.unary()?)));
        }
        self.union()
    }

    fn union(&mut self) -> Result<Expr, XPathError> {
        let mut lhs = self.path_expr()?;
        while self.eat(&Token::Pipe) {
            let rhs = self.path_expr()?;
            lhs = Expr::Union(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // --- Paths ---

    fn path_expr(&mut self) -> Result<Expr, XPathError> {
        match self.peek() {
            Some(
                Token::Variable(_)
                | Token::Literal(_)
                | Token::Number(_)
                | Token::LeftParen
                | Token::FunctionName(_),
            ) => {
                let start = self.filter_expr()?;
                let mut steps = Vec::new();
                if self.eat(&Token::DoubleSlash) {
                    steps.push(Step::descendant_or_self());
                } else if !self.eat(&Token::Slash) {
                    return Ok(start);
                }
                self.relative_path(&mut steps)?;
                Ok(Expr::PathFrom {
                    start: Box::new(start),
                    steps,
                })
            }
            Some(_) => self.location_path().map(Expr::Path),
            None => Err(self.error("expected expression, found end of expression")),
        }
    }

    fn filter_expr(&mut self) -> Result<Expr, XPathError> {
        let primary = self.primary()?;
        let predicates = self.predicates()?;
        if predicates.is_empty() {
            Ok(primary)
        } else {
            Ok(Expr::Filter {
                primary: Box::new(primary),
                predicates,
            })
        }
    }

    fn primary(&mut self) -> Result<Expr, XPathError> {
        match self.next() {
            Some(Token::Variable(name)) => Ok(Expr::Variable(name)),
            Some(Token::Literal(value)) => Ok(Expr::Literal(value)),
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::LeftParen) => {
                let inner = self.expr()?;
                self.expect(&Token::RightParen)?;
                Ok(inner)
            }
            Some(Token::FunctionName(name)) => {
                self.expect(&Token::LeftParen)?;
                let mut args = Vec::new();
                if !self.eat(&Token::RightParen) {
                    loop {
                        args.push(self.expr()?);
                        if self.eat(&Token::RightParen) {
                            break;
                        }
                        self.expect(&Token::Comma)?;
                    }
                }
                Ok(Expr::Call { name, args })
            }
            other => {
                if other.is_some() {
                    self.pos -= 1;
                }
                Err(self.error(&format!("expected primary expression, found {}", self.describe())))
            }
        }
    }

    fn location_path(&mut self) -> Result<LocationPath, XPathError> {
        let mut steps = Vec::new();
        if self.eat(&Token::Slash) {
            // A lone `/` selects the root.
            if self.at_step_start() {
                self.relative_path(&mut steps)?;
            }
            return Ok(LocationPath {
                absolute: true,
                steps,
            });
        }
        let absolute = self.eat(&Token::DoubleSlash);
        if absolute {
            steps.push(Step::descendant_or_self());
        }
        self.relative_path(&mut steps)?;
        Ok(LocationPath { absolute, steps })
    }

    fn relative_path(&mut self, steps: &mut Vec<Step>) -> Result<(), XPathError> {
        steps.push(self.step()?);
        loop {
            if self.eat(&Token::Slash) {
                steps.push(self.step()?);
            } else if self.eat(&Token::DoubleSlash) {
                steps.push(Step::descendant_or_self());
                steps.push(self.step()?);
            } else {
                return Ok(());
            }
        }
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Dot
                    | Token::DotDot
                    | Token::At
                    | Token::NameTest(_)
                    | Token::NodeType(_)
                    | Token::AxisName(_)
            )
        )
    }

    fn step(&mut self) -> Result<Step, XPathError> {
        let abbreviated = |axis| Step {
            axis,
            test: NodeTest::Node,
            predicates: Vec::new(),
        };
        if self.eat(&Token::Dot) {
            return Ok(abbreviated(Axis::SelfAxis));
        }
        if self.eat(&Token::DotDot) {
            return Ok(abbreviated(Axis::Parent));
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let Some(Token::AxisName(name)) = self.peek() {
            let axis = Axis::from_name(name)
                .ok_or_else(|| self.error(&format!("unknown axis '{name}'")))?;
            self.pos += 1;
            self.expect(&Token::ColonColon)?;
            axis
        } else {
            Axis::Child
        };

        let test = self.node_test()?;
        let predicates = self.predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn node_test(&mut self) -> Result<NodeTest, XPathError> {
        match self.next() {
            Some(Token::NameTest(name)) => Ok(name_test(&name)),
            Some(Token::NodeType(kind)) => {
                self.expect(&Token::LeftParen)?;
                let test = match kind.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => match self.peek_at(0) {
                        Some(Token::Literal(target)) => {
                            let target = target.clone();
                            self.pos += 1;
                            NodeTest::ProcessingInstruction(Some(target))
                        }
                        _ => NodeTest::ProcessingInstruction(None),
                    },
                };
                self.expect(&Token::RightParen)?;
                Ok(test)
            }
            other => {
                if other.is_some() {
                    self.pos -= 1;
                }
                Err(self.error(&format!("expected node test, found {}", self.describe())))
            }
        }
    }

    fn predicates(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LeftBracket) {
            predicates.push(self.expr()?);
            self.expect(&Token::RightBracket)?;
        }
        Ok(predicates)
    }
}

fn name_test(name: &str) -> NodeTest {
    if name == "*" {
        return NodeTest::AnyName;
    }
    if let Some(prefix) = name.strip_suffix(":*") {
        return NodeTest::AnyLocalName(prefix.to_string());
    }
    match name.split_once(':') {
        Some((prefix, local)) => NodeTest::Name {
            prefix: Some(prefix.to_string()),
            local: local.to_string(),
        },
        None => NodeTest::Name {
            prefix: None,
            local: name.to_string(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn child(local: &str) -> Step {
        Step {
            axis: Axis::Child,
            test: NodeTest::Name {
                prefix: None,
                local: local.to_string(),
            },
            predicates: Vec::new(),
        }
    }

    #[test]
    fn test_parse_root_only() {
        assert_eq!(
            parse("/").unwrap(),
            Expr::Path(LocationPath {
                absolute: true,
                steps: Vec::new()
            })
        );
    }

    #[test]
    fn test_parse_double_slash_inserts_step() {
        assert_eq!(
            parse("//a").unwrap(),
            Expr::Path(LocationPath {
                absolute: true,
                steps: vec![Step::descendant_or_self(), child("a")]
            })
        );
        assert_eq!(
            parse("a//b").unwrap(),
            Expr::Path(LocationPath {
                absolute: false,
                steps: vec![child("a"), Step::descendant_or_self(), child("b")]
            })
        );
    }

    #[test]
    fn test_parse_abbreviations() {
        let Expr::Path(path) = parse("../@id").unwrap() else {
            panic!("expected path");
        };
        assert_eq!(path.steps[0].axis, Axis::Parent);
        assert_eq!(path.steps[1].axis, Axis::Attribute);
    }

    #[test]
    fn test_parse_explicit_axis_and_pi_test() {
        let Expr::Path(path) = parse("following-sibling::processing-instruction('x')").unwrap()
        else {
            panic!("expected path");
        };
        assert_eq!(path.steps[0].axis, Axis::FollowingSibling);
        assert_eq!(
            path.steps[0].test,
            NodeTest::ProcessingInstruction(Some("x".to_string()))
        );
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 = 7 parses as 1 + (2 * 3) = 7
        let Expr::Binary { op, lhs, .. } = parse("1 + 2 * 3 = 7").unwrap() else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Eq);
        let Expr::Binary { op, rhs, .. } = *lhs else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_left_associative_subtraction() {
        let Expr::Binary { lhs, rhs, .. } = parse("5 - 2 - 1").unwrap() else {
            panic!("expected binary");
        };
        assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Sub, .. }));
        assert_eq!(*rhs, Expr::Number(1.0));
    }

    #[test]
    fn test_filter_with_path_continuation() {
        let expr = parse("(//a)[1]/b").unwrap();
        let Expr::PathFrom { start, steps } = expr else {
            panic!("expected path continuation");
        };
        assert!(matches!(*start, Expr::Filter { .. }));
        assert_eq!(steps, vec![child("b")]);
    }

    #[test]
    fn test_function_call_arguments() {
        assert_eq!(
            parse("concat('a', $v, 1)").unwrap(),
            Expr::Call {
                name: "concat".to_string(),
                args: vec![
                    Expr::Literal("a".to_string()),
                    Expr::Variable("v".to_string()),
                    Expr::Number(1.0)
                ]
            }
        );
    }

    #[test]
    fn test_union_and_negation() {
        assert!(matches!(parse("a | b").unwrap(), Expr::Union(..)));
        assert!(matches!(parse("--1").unwrap(), Expr::Negate(_)));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "/a/", "a[", "f(1,", "1 +", "a b", "bogus::x", "@"] {
            assert!(parse(bad).is_err(), "{bad:?} should not parse");
        }
    }
}
