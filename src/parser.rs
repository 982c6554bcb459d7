use crate::ast::{BinaryOp, BoolOp, CmpOp, Index, Node, Slice, UnaryOp};
use crate::error::{ExprError, ExprResult};
use crate::lexer::{Span, Token, TokenKind, is_name, lex};
use crate::literal::Literal;

/// Deepest nesting of parentheses, brackets and prefix operators the parser accepts.
const MAX_DEPTH: usize = 100;

/// Parses canonical expression text (as produced by rendering) back into a tree.
#[tracing::instrument(level = "trace")]
pub fn parse_node(src: &str) -> ExprResult<Node> {
    let tokens = lex(src)?;
    let mut p = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let node = p.parse_or()?;
    p.expect(TokenKind::Eof)?;
    Ok(node)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        let i = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[i].kind
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn expect(&mut self, kind: TokenKind) -> ExprResult<()> {
        if self.peek().kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(ExprError::parse(
                self.span().start,
                format!("expected {kind:?}, found {:?}", self.peek().kind),
            ))
        }
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ExprResult<T>) -> ExprResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::parse(
                self.span().start,
                format!("expression nested deeper than {MAX_DEPTH} levels"),
            ));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn parse_or(&mut self) -> ExprResult<Node> {
        self.nested(Self::parse_or_chain)
    }

    fn parse_or_chain(&mut self) -> ExprResult<Node> {
        let first = self.parse_and()?;
        let mut values = vec![first];
        while self.consume(TokenKind::Or) {
            values.push(self.parse_and()?);
        }
        Ok(bool_op(BoolOp::Or, values))
    }

    fn parse_and(&mut self) -> ExprResult<Node> {
        let first = self.parse_not()?;
        let mut values = vec![first];
        while self.consume(TokenKind::And) {
            values.push(self.parse_not()?);
        }
        Ok(bool_op(BoolOp::And, values))
    }

    fn parse_not(&mut self) -> ExprResult<Node> {
        if self.consume(TokenKind::Not) {
            let operand = self.nested(Self::parse_not)?;
            return Ok(Node::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ExprResult<Node> {
        let left = self.parse_term()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => CmpOp::Eq,
                TokenKind::Ne => CmpOp::NotEq,
                TokenKind::Lt => CmpOp::Lt,
                TokenKind::Le => CmpOp::LtE,
                TokenKind::Gt => CmpOp::Gt,
                TokenKind::Ge => CmpOp::GtE,
                _ => break,
            };
            self.bump();
            ops.push(op);
            comparators.push(self.parse_term()?);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        Ok(Node::Compare {
            left: Box::new(left),
            ops,
            comparators,
        })
    }

    fn parse_term(&mut self) -> ExprResult<Node> {
        let mut e = self.parse_factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let r = self.parse_factor()?;
            e = Node::Binary {
                op,
                left: Box::new(e),
                right: Box::new(r),
            };
        }
        Ok(e)
    }

    fn parse_factor(&mut self) -> ExprResult<Node> {
        let mut e = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.bump();
            let r = self.parse_unary()?;
            e = Node::Binary {
                op,
                left: Box::new(e),
                right: Box::new(r),
            };
        }
        Ok(e)
    }

    fn parse_unary(&mut self) -> ExprResult<Node> {
        if !self.consume(TokenKind::Minus) {
            return self.parse_postfix();
        }

        // i64::MIN has no positive counterpart, so its magnitude only parses here.
        if let TokenKind::Int(magnitude) = *self.peek_at(0) {
            if magnitude == i64::MIN.unsigned_abs() && !is_postfix_start(self.peek_at(1)) {
                self.bump();
                return Ok(Node::lit(i64::MIN));
            }
        }

        let operand = self.nested(Self::parse_unary)?;
        Ok(match operand {
            Node::Lit {
                value: Literal::Int(i),
            } if i != i64::MIN => Node::lit(-i),
            Node::Lit {
                value: Literal::Float(x),
            } => Node::lit(-x),
            other => Node::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(other),
            },
        })
    }

    fn parse_postfix(&mut self) -> ExprResult<Node> {
        let mut e = self.parse_primary()?;

        loop {
            if self.consume(TokenKind::Dot) {
                let t = self.bump();
                let attr = match t.kind {
                    TokenKind::Ident(s) => s,
                    ref other => match other.keyword_text() {
                        Some(kw) => kw.to_owned(),
                        None => {
                            return Err(ExprError::parse(
                                t.span.start,
                                format!("expected ident after '.', found {other:?}"),
                            ));
                        }
                    },
                };
                e = Node::Attribute {
                    value: Box::new(e),
                    attr,
                };
                continue;
            }

            if self.consume(TokenKind::LBracket) {
                let index = self.parse_index()?;
                self.expect(TokenKind::RBracket)?;
                e = Node::Subscript {
                    value: Box::new(e),
                    index,
                };
                continue;
            }

            if self.peek().kind == TokenKind::LParen {
                let at = self.span().start;
                self.bump();
                let args = self.parse_args()?;
                e = match e {
                    Node::Name { id } if id == "set" && args.is_empty() => {
                        Node::lit(Literal::Set(Vec::new()))
                    }
                    Node::Name { id } if id == "getattr" => getattr_or_call(id, args),
                    Node::Name { id } => Node::Call { func: id, args },
                    _ => {
                        return Err(ExprError::parse(at, "call target must be an identifier"));
                    }
                };
                continue;
            }

            break;
        }

        Ok(e)
    }

    fn parse_index(&mut self) -> ExprResult<Index> {
        let start = if self.peek().kind == TokenKind::Colon {
            None
        } else {
            let at = self.span().start;
            let key = self.parse_or()?;
            if self.peek().kind != TokenKind::Colon {
                return match key {
                    Node::Lit {
                        value: Literal::Int(i),
                    } => Ok(Index::Int(i)),
                    Node::Lit {
                        value: Literal::Str(s),
                    } => Ok(Index::Str(s)),
                    other => Err(ExprError::parse(
                        at,
                        format!(
                            "subscript key must be an int or str literal, got {}",
                            other.kind_name()
                        ),
                    )),
                };
            }
            Some(int_bound(key, at)?)
        };

        self.expect(TokenKind::Colon)?;
        let stop = self.parse_slice_bound()?;
        let step = if self.consume(TokenKind::Colon) {
            self.parse_slice_bound()?
        } else {
            None
        };
        Ok(Index::Slice(Slice::new(start, stop, step)))
    }

    fn parse_slice_bound(&mut self) -> ExprResult<Option<i64>> {
        if matches!(self.peek().kind, TokenKind::Colon | TokenKind::RBracket) {
            return Ok(None);
        }
        let at = self.span().start;
        let bound = self.parse_or()?;
        int_bound(bound, at).map(Some)
    }

    fn parse_args(&mut self) -> ExprResult<Vec<Node>> {
        let mut args = Vec::new();
        if self.consume(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            if self.consume(TokenKind::Comma) {
                if self.consume(TokenKind::RParen) {
                    return Ok(args);
                }
                continue;
            }
            self.expect(TokenKind::RParen)?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> ExprResult<Node> {
        let t = self.bump();
        match t.kind {
            TokenKind::Int(v) => match i64::try_from(v) {
                Ok(i) => Ok(Node::lit(i)),
                Err(_) => Err(ExprError::parse(t.span.start, "integer literal out of range")),
            },
            TokenKind::Float(v) => Ok(Node::lit(v)),
            TokenKind::Str(s) => Ok(Node::lit(s)),
            TokenKind::True => Ok(Node::lit(true)),
            TokenKind::False => Ok(Node::lit(false)),
            TokenKind::None => Ok(Node::lit(Literal::None)),
            TokenKind::Ident(s) => Ok(Node::name(s)),
            TokenKind::LParen => {
                let e = self.parse_or()?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            TokenKind::LBracket => {
                let items = self.parse_literal_items(TokenKind::RBracket)?;
                Ok(Node::lit(Literal::List(items)))
            }
            TokenKind::LBrace => self.parse_braced(),
            other => Err(ExprError::parse(
                t.span.start,
                format!("unexpected token {other:?}"),
            )),
        }
    }

    /// Parses the rest of a `{...}` literal: a dict when the first entry has a `:`, else a set.
    fn parse_braced(&mut self) -> ExprResult<Node> {
        if self.consume(TokenKind::RBrace) {
            return Ok(Node::lit(Literal::Map(Vec::new())));
        }

        let first = self.parse_literal()?;
        if !self.consume(TokenKind::Colon) {
            let mut members = vec![first];
            if self.consume(TokenKind::Comma) {
                members.extend(self.parse_literal_items(TokenKind::RBrace)?);
            } else {
                self.expect(TokenKind::RBrace)?;
            }
            return Ok(Node::lit(Literal::set(members)));
        }

        let mut entries = vec![(first, self.parse_literal()?)];
        loop {
            if self.consume(TokenKind::RBrace) {
                break;
            }
            self.expect(TokenKind::Comma)?;
            if self.consume(TokenKind::RBrace) {
                break;
            }
            let k = self.parse_literal()?;
            self.expect(TokenKind::Colon)?;
            let v = self.parse_literal()?;
            entries.push((k, v));
        }
        Ok(Node::lit(Literal::map(entries)))
    }

    fn parse_literal_items(&mut self, close: TokenKind) -> ExprResult<Vec<Literal>> {
        let mut items = Vec::new();
        loop {
            if self.consume(close.clone()) {
                return Ok(items);
            }
            items.push(self.parse_literal()?);
            if !self.consume(TokenKind::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn parse_literal(&mut self) -> ExprResult<Literal> {
        let at = self.span().start;
        match self.parse_or()? {
            Node::Lit { value } => Ok(value),
            other => Err(ExprError::parse(
                at,
                format!(
                    "container elements must be literals, got {}",
                    other.kind_name()
                ),
            )),
        }
    }
}

/// `getattr(base, 'name')` with a non-identifier name is how fields like `total sales` render.
fn getattr_or_call(func: String, args: Vec<Node>) -> Node {
    match <[Node; 2]>::try_from(args) {
        Ok(
            [
                value,
                Node::Lit {
                    value: Literal::Str(attr),
                },
            ],
        ) if !is_name(&attr) => Node::Attribute {
            value: Box::new(value),
            attr,
        },
        Ok(pair) => Node::Call {
            func,
            args: pair.into(),
        },
        Err(args) => Node::Call { func, args },
    }
}

fn bool_op(op: BoolOp, mut values: Vec<Node>) -> Node {
    if values.len() == 1 {
        return values.remove(0);
    }
    Node::BoolOp { op, values }
}

fn int_bound(node: Node, at: usize) -> ExprResult<i64> {
    match node {
        Node::Lit {
            value: Literal::Int(i),
        } => Ok(i),
        other => Err(ExprError::parse(
            at,
            format!("slice bounds must be int literals, got {}", other.kind_name()),
        )),
    }
}

fn is_postfix_start(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen
    )
}
