use super::ast::{CompareOp, Expr, Literal, LogicalOp, Operand};
use super::lexer::{tokenize, Token, TokenKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at position {position}: {message} (found {found:?})")]
pub struct SyntaxError {
    pub position: usize,
    pub found: String,
    pub message: String,
}

/// Recursive-descent parser over a token slice. `pos` is the only state.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Fails without reading when the slice does not end in an `Eof` token.
    pub fn parse(mut self) -> Result<Expr, SyntaxError> {
        if self.tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let position = self.tokens.last().map_or(0, |t| t.offset + t.text.len());
            return Err(SyntaxError {
                position,
                found: String::new(),
                message: "token stream is not terminated".to_string(),
            });
        }
        if self.peek().kind == TokenKind::Eof {
            return Err(self.error("empty query"));
        }
        let expr = self.parse_or()?;
        if self.peek().kind != TokenKind::Eof {
            return Err(self.error("unexpected input after expression"));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_and()?;
        while self.match_token(TokenKind::Logical, "OR") {
            let right = self.parse_and()?;
            left = Expr::Logical {
                left: Box::new(left),
                op: LogicalOp::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_not()?;
        while self.match_token(TokenKind::Logical, "AND") {
            let right = self.parse_not()?;
            left = Expr::Logical {
                left: Box::new(left),
                op: LogicalOp::And,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, SyntaxError> {
        if self.match_token(TokenKind::Keyword, "not") {
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let op_start = self.pos;
        let left = self.parse_term()?;

        let Some(op) = self.parse_operator()? else {
            return Ok(left);
        };

        let Expr::Field(field) = left else {
            let start = &self.tokens[op_start];
            return Err(SyntaxError {
                position: start.offset,
                found: start.text.clone(),
                message: format!("left side of '{}' must be a field name", op.as_str()),
            });
        };

        let value = self.parse_operand(op)?;
        Ok(Expr::Comparison { field, op, value })
    }

    /// Consumes a comparison operator if one is next. `not` directly
    /// followed by `contains`, `in` or `has` is fused into one operator.
    fn parse_operator(&mut self) -> Result<Option<CompareOp>, SyntaxError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Operator => {
                let op = CompareOp::from_operator(&token.text)
                    .ok_or_else(|| self.error("unknown operator"))?;
                self.pos += 1;
                Ok(Some(op))
            }
            TokenKind::Keyword if token.text == "not" => {
                let next = self.peek_at(1);
                let fused = (next.kind == TokenKind::Keyword)
                    .then(|| CompareOp::from_keyword(&next.text))
                    .flatten()
                    .and_then(CompareOp::negated);
                match fused {
                    Some(op) => {
                        self.pos += 2;
                        Ok(Some(op))
                    }
                    None => Err(self.error_at(1, "expected contains, in or has after NOT")),
                }
            }
            TokenKind::Keyword => {
                let op = CompareOp::from_keyword(&token.text)
                    .ok_or_else(|| self.error("unknown keyword"))?;
                self.pos += 1;
                Ok(Some(op))
            }
            _ => Ok(None),
        }
    }

    /// A right-hand operand reduces to a literal or a call placeholder. A
    /// bare identifier is read as a string.
    fn parse_operand(&mut self, op: CompareOp) -> Result<Operand, SyntaxError> {
        let token = self.peek();
        match token.kind {
            TokenKind::LParen => Err(self.error(&format!(
                "right side of '{}' must be a value, not a sub-expression",
                op.as_str()
            ))),
            TokenKind::Eof => Err(self.error(&format!("expected value after '{}'", op.as_str()))),
            _ => match self.parse_term()? {
                Expr::Literal(lit) => Ok(Operand::Literal(lit)),
                Expr::Field(name) => Ok(Operand::Literal(Literal::String(name))),
                Expr::FunctionCall { name, args } => Ok(Operand::Call { name, args }),
                _ => Err(self.error("invalid right operand")),
            },
        }
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier => {
                self.pos += 1;
                Ok(Expr::Field(token.text))
            }
            TokenKind::String => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::String(token.text)))
            }
            TokenKind::Number => {
                self.pos += 1;
                Ok(Expr::Literal(number_literal(token.text)))
            }
            TokenKind::Boolean => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Boolean(token.text == "true")))
            }
            TokenKind::Function => {
                self.pos += 1;
                self.parse_call(token.text)
            }
            TokenKind::LParen => {
                self.pos += 1;
                let expr = self.parse_or()?;
                self.expect(TokenKind::RParen, "expected ')'")?;
                Ok(expr)
            }
            TokenKind::Eof => Err(self.error("unexpected end of query")),
            _ => Err(self.error("unexpected token")),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr, SyntaxError> {
        self.expect(TokenKind::LParen, "expected '(' after function name")?;
        let mut args = Vec::new();
        if self.peek().kind != TokenKind::RParen {
            args.push(self.parse_or()?);
            while self.peek().kind == TokenKind::Comma {
                self.pos += 1;
                args.push(self.parse_or()?);
            }
        }
        self.expect(TokenKind::RParen, "expected ')' to close function call")?;
        Ok(Expr::FunctionCall { name, args })
    }

    fn peek(&self) -> &'t Token {
        self.peek_at(0)
    }

    /// Only called once `parse` has checked the stream ends in `Eof`, so
    /// looking past the end yields `Eof`.
    fn peek_at(&self, n: usize) -> &'t Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + n).min(last)]
    }

    fn match_token(&mut self, kind: TokenKind, text: &str) -> bool {
        if self.peek().is(kind, text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<(), SyntaxError> {
        if self.peek().kind == kind {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn error(&self, message: &str) -> SyntaxError {
        self.error_at(0, message)
    }

    fn error_at(&self, n: usize, message: &str) -> SyntaxError {
        let token = self.peek_at(n);
        SyntaxError {
            position: token.offset,
            found: token.text.clone(),
            message: message.to_string(),
        }
    }
}

fn number_literal(text: String) -> Literal {
    if let Ok(i) = text.parse::<i64>() {
        return Literal::Integer(i);
    }
    match text.parse::<f64>() {
        Ok(x) => Literal::Float(x),
        Err(_) => Literal::String(text),
    }
}

pub fn parse_tokens(tokens: &[Token]) -> Result<Expr, SyntaxError> {
    Parser::new(tokens).parse()
}

pub fn parse(input: &str) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(input);
    let expr = parse_tokens(&tokens)?;
    tracing::debug!(query = input, parsed = %expr, "parsed query");
    Ok(expr)
}
