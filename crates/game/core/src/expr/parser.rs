//! Recursive-descent parser producing [`Node`] trees.

use std::str::FromStr;

use super::error::EvalErrorKind;
use super::lexer::{Token, TokenKind, tokenize};
use super::{BinaryOp, Function, FunctionWhitelist, MAX_DEPTH, Node, UnaryOp};

pub(crate) fn parse(source: &str, whitelist: &FunctionWhitelist) -> Result<Node, EvalErrorKind> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        whitelist,
    };

    let node = parser.conditional()?;
    let trailing = parser.peek();
    if trailing.kind != TokenKind::Eof {
        return Err(EvalErrorKind::syntax(
            trailing.offset,
            format!("unexpected {}", trailing.kind.describe()),
        ));
    }
    Ok(node)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    whitelist: &'a FunctionWhitelist,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        // The token list always ends with Eof and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, EvalErrorKind> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(EvalErrorKind::syntax(
                token.offset,
                format!("expected {what}, found {}", token.kind.describe()),
            ))
        }
    }

    fn enter(&mut self) -> Result<(), EvalErrorKind> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(EvalErrorKind::TooDeep { limit: MAX_DEPTH })
        } else {
            Ok(())
        }
    }

    fn leave(&mut self, levels: usize) {
        self.depth -= levels;
    }

    // ========================================================================
    // Grammar
    // ========================================================================

    /// `or ( '?' conditional ':' conditional )?`
    fn conditional(&mut self) -> Result<Node, EvalErrorKind> {
        self.enter()?;
        let condition = self.or()?;

        let node = if self.peek().kind == TokenKind::Question {
            self.advance();
            let then = self.conditional()?;
            self.expect(TokenKind::Colon, "':'")?;
            let otherwise = self.conditional()?;
            Node::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }
        } else {
            condition
        };

        self.leave(1);
        Ok(node)
    }

    fn or(&mut self) -> Result<Node, EvalErrorKind> {
        self.left_assoc(Self::and, |kind| match kind {
            TokenKind::OrOr => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn and(&mut self) -> Result<Node, EvalErrorKind> {
        self.left_assoc(Self::comparison, |kind| match kind {
            TokenKind::AndAnd => Some(BinaryOp::And),
            _ => None,
        })
    }

    /// Comparisons do not chain: `a < b < c` is rejected.
    fn comparison(&mut self) -> Result<Node, EvalErrorKind> {
        let lhs = self.additive()?;

        let Some(op) = comparison_op(&self.peek().kind) else {
            return Ok(lhs);
        };
        self.advance();
        self.enter()?;
        let rhs = self.additive()?;
        self.leave(1);

        let next = self.peek();
        if comparison_op(&next.kind).is_some() {
            return Err(EvalErrorKind::syntax(
                next.offset,
                "comparison operators cannot be chained",
            ));
        }

        Ok(Node::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn additive(&mut self) -> Result<Node, EvalErrorKind> {
        self.left_assoc(Self::term, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn term(&mut self) -> Result<Node, EvalErrorKind> {
        self.left_assoc(Self::unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::SlashSlash => Some(BinaryOp::FloorDiv),
            TokenKind::Percent => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn unary(&mut self) -> Result<Node, EvalErrorKind> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.advance();

        self.enter()?;
        let operand = self.unary()?;
        self.leave(1);

        Ok(Node::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn primary(&mut self) -> Result<Node, EvalErrorKind> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(value) => Ok(Node::Number(value)),
            TokenKind::Ident(name) => {
                if self.peek().kind == TokenKind::LParen {
                    self.call(name, token.offset)
                } else {
                    Ok(Node::Variable(name))
                }
            }
            TokenKind::LParen => {
                let inner = self.conditional()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(EvalErrorKind::syntax(
                token.offset,
                format!("expected a value, found {}", other.describe()),
            )),
        }
    }

    /// `IDENT '(' ( conditional ( ',' conditional )* )? ')'`
    fn call(&mut self, name: String, offset: usize) -> Result<Node, EvalErrorKind> {
        let Ok(function) = Function::from_str(&name) else {
            return Err(EvalErrorKind::UnknownFunction { name });
        };
        if !self.whitelist.allows(function) {
            return Err(EvalErrorKind::FunctionNotAllowed { name });
        }

        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.peek().kind != TokenKind::RParen {
            loop {
                args.push(self.conditional()?);
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')' or ','")?;

        if !function.accepts(args.len()) {
            tracing::trace!(offset, function = function.name(), "arity mismatch");
            return Err(EvalErrorKind::Arity {
                name: function.name(),
                expected: function.expected_arity(),
                found: args.len(),
            });
        }

        Ok(Node::Call { function, args })
    }

    /// Parses `next ( op next )*` into a left-deep tree.
    ///
    /// Each extra operand deepens the tree by one, so the chain is charged
    /// against the depth limit as it grows.
    fn left_assoc(
        &mut self,
        next: fn(&mut Self) -> Result<Node, EvalErrorKind>,
        op_for: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Node, EvalErrorKind> {
        let mut lhs = next(self)?;
        let mut levels = 0;

        while let Some(op) = op_for(&self.peek().kind) {
            self.advance();
            self.enter()?;
            levels += 1;
            let rhs = next(self)?;
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        self.leave(levels);
        Ok(lhs)
    }
}

fn comparison_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::Le => Some(BinaryOp::Le),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::Ge => Some(BinaryOp::Ge),
        TokenKind::EqEq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::Ne),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(source: &str) -> Result<Node, EvalErrorKind> {
        parse(source, &FunctionWhitelist::all())
    }

    fn var(name: &str) -> Box<Node> {
        Box::new(Node::Variable(name.into()))
    }

    fn num(value: f64) -> Box<Node> {
        Box::new(Node::Number(value))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse_all("a + b * 2").unwrap(),
            Node::Binary {
                op: BinaryOp::Add,
                lhs: var("a"),
                rhs: Box::new(Node::Binary {
                    op: BinaryOp::Mul,
                    lhs: var("b"),
                    rhs: num(2.0),
                }),
            }
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            parse_all("10 - 3 - 2").unwrap(),
            Node::Binary {
                op: BinaryOp::Sub,
                lhs: Box::new(Node::Binary {
                    op: BinaryOp::Sub,
                    lhs: num(10.0),
                    rhs: num(3.0),
                }),
                rhs: num(2.0),
            }
        );
    }

    #[test]
    fn conditional_is_right_associative() {
        let node = parse_all("a ? 1 : b ? 2 : 3").unwrap();
        let Node::Conditional { otherwise, .. } = node else {
            panic!("expected conditional");
        };
        assert!(matches!(*otherwise, Node::Conditional { .. }));
    }

    #[test]
    fn rejects_chained_comparisons() {
        assert!(matches!(
            parse_all("1 < 2 < 3"),
            Err(EvalErrorKind::Syntax { offset: 6, .. })
        ));
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert!(matches!(
            parse_all("1 2"),
            Err(EvalErrorKind::Syntax { offset: 2, .. })
        ));
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        assert!(matches!(
            parse_all("(1 + 2"),
            Err(EvalErrorKind::Syntax { offset: 6, .. })
        ));
        assert!(parse_all("1 + 2)").is_err());
        assert!(parse_all("").is_err());
    }

    #[test]
    fn rejects_unknown_and_disallowed_functions() {
        assert_eq!(
            parse_all("open(1)"),
            Err(EvalErrorKind::UnknownFunction {
                name: "open".into()
            })
        );
        assert_eq!(
            parse("max(1, 2)", &FunctionWhitelist::none()),
            Err(EvalErrorKind::FunctionNotAllowed { name: "max".into() })
        );
    }

    #[test]
    fn checks_arity_at_parse_time() {
        assert_eq!(
            parse_all("clamp(1, 2)"),
            Err(EvalErrorKind::Arity {
                name: "clamp",
                expected: "3",
                found: 2,
            })
        );
        assert!(parse_all("min()").is_err());
        assert!(parse_all("max(1, 2, 3, 4)").is_ok());
    }

    #[test]
    fn limits_parenthesis_nesting() {
        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert!(parse_all(&shallow).is_ok());

        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(
            parse_all(&deep),
            Err(EvalErrorKind::TooDeep { limit: MAX_DEPTH })
        );
    }

    #[test]
    fn limits_unary_and_chain_length() {
        assert!(parse_all(&"-".repeat(200)).is_err());

        let chain = vec!["1"; 200].join(" + ");
        assert_eq!(
            parse_all(&chain),
            Err(EvalErrorKind::TooDeep { limit: MAX_DEPTH })
        );
    }
}
