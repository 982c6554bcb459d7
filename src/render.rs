//! Canonical text form of expression trees.
//!
//! The output is Python expression syntax: dotted attributes, bracketed keys and slices,
//! `name(arg, ...)` calls, infix comparisons and single-quoted strings. Field names that are not
//! identifiers are written `getattr(base, 'name')`. Parentheses are inserted
//! only where operator precedence requires them, so rendering is a pure function of the tree.

use std::fmt::{self, Write as _};

use crate::ast::{BinaryOp, BoolOp, CmpOp, Index, Node, UnaryOp};
use crate::lexer::is_name;
use crate::literal::Literal;

const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_NOT: u8 = 3;
const PREC_CMP: u8 = 4;
const PREC_ADD: u8 = 5;
const PREC_MUL: u8 = 6;
const PREC_NEG: u8 = 7;
const PREC_ATOM: u8 = 8;

// astunparse spells infinity this way; it overflows back to inf when parsed.
const INF_TEXT: &str = "1e309";

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "not ",
        }
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => PREC_ADD,
            Self::Mul | Self::Div | Self::Mod => PREC_MUL,
        }
    }
}

impl BoolOp {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Self::And => PREC_AND,
            Self::Or => PREC_OR,
        }
    }
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtE => "<=",
            Self::Gt => ">",
            Self::GtE => ">=",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write_float(f, *x),
            Self::Str(s) => write_quoted(f, s),
            Self::List(items) => {
                f.write_char('[')?;
                write_joined(f, items)?;
                f.write_char(']')
            }
            // `{}` is an empty dict, so the empty set needs the constructor spelling.
            Self::Set(items) if items.is_empty() => f.write_str("set()"),
            Self::Set(items) => {
                f.write_char('{')?;
                write_joined(f, items)?;
                f.write_char('}')
            }
            Self::Map(entries) => {
                f.write_char('{')?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_char('}')
            }
        }
    }
}

fn precedence(node: &Node) -> u8 {
    match node {
        Node::Lit { value } if is_negative_number(value) => PREC_NEG,
        Node::Lit { .. }
        | Node::Name { .. }
        | Node::Call { .. }
        | Node::Attribute { .. }
        | Node::Subscript { .. } => PREC_ATOM,
        Node::Unary {
            op: UnaryOp::Neg, ..
        } => PREC_NEG,
        Node::Unary {
            op: UnaryOp::Not, ..
        } => PREC_NOT,
        Node::Binary { op, .. } => op.precedence(),
        Node::BoolOp { op, .. } => op.precedence(),
        Node::Compare { .. } => PREC_CMP,
    }
}

fn is_negative_number(lit: &Literal) -> bool {
    match lit {
        Literal::Int(i) => *i < 0,
        Literal::Float(x) => x.is_sign_negative() && !x.is_nan(),
        _ => false,
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, min_prec: u8) -> fmt::Result {
    let paren = precedence(node) < min_prec;
    if paren {
        f.write_char('(')?;
    }
    write_bare(f, node)?;
    if paren {
        f.write_char(')')?;
    }
    Ok(())
}

fn write_bare(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    match node {
        Node::Lit { value } => write!(f, "{value}"),
        Node::Name { id } => f.write_str(id),
        Node::Unary { op, operand } => {
            f.write_str(op.symbol())?;
            let min = match op {
                UnaryOp::Neg => PREC_NEG,
                UnaryOp::Not => PREC_NOT,
            };
            write_node(f, operand, min)
        }
        Node::Binary { op, left, right } => {
            let p = op.precedence();
            write_node(f, left, p)?;
            write!(f, " {} ", op.symbol())?;
            write_node(f, right, p + 1)
        }
        Node::BoolOp { op, values } => {
            let p = op.precedence();
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op.keyword())?;
                }
                write_node(f, v, p + 1)?;
            }
            Ok(())
        }
        Node::Compare {
            left,
            ops,
            comparators,
        } => {
            // Comparisons chain rather than nest, so a nested compare must be parenthesized.
            write_node(f, left, PREC_CMP + 1)?;
            for (op, right) in ops.iter().zip(comparators) {
                write!(f, " {} ", op.symbol())?;
                write_node(f, right, PREC_CMP + 1)?;
            }
            Ok(())
        }
        Node::Call { func, args } => {
            f.write_str(func)?;
            f.write_char('(')?;
            for (i, a) in args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_node(f, a, PREC_OR)?;
            }
            f.write_char(')')
        }
        Node::Attribute { value, attr } if is_name(attr) => {
            write_postfix_base(f, value)?;
            write!(f, ".{attr}")
        }
        Node::Attribute { value, attr } => {
            f.write_str("getattr(")?;
            write_node(f, value, PREC_OR)?;
            f.write_str(", ")?;
            write_quoted(f, attr)?;
            f.write_char(')')
        }
        Node::Subscript { value, index } => {
            write_postfix_base(f, value)?;
            f.write_char('[')?;
            write_index(f, index)?;
            f.write_char(']')
        }
    }
}

fn write_postfix_base(f: &mut fmt::Formatter<'_>, base: &Node) -> fmt::Result {
    // `3.x` would lex as a float, so numeric bases always get parentheses.
    if let Node::Lit {
        value: Literal::Int(_) | Literal::Float(_),
    } = base
    {
        f.write_char('(')?;
        write_bare(f, base)?;
        return f.write_char(')');
    }
    write_node(f, base, PREC_ATOM)
}

fn write_index(f: &mut fmt::Formatter<'_>, index: &Index) -> fmt::Result {
    match index {
        Index::Int(i) => write!(f, "{i}"),
        Index::Str(s) => write_quoted(f, s),
        Index::Slice(s) => {
            if let Some(start) = s.start {
                write!(f, "{start}")?;
            }
            f.write_char(':')?;
            if let Some(stop) = s.stop {
                write!(f, "{stop}")?;
            }
            if let Some(step) = s.step {
                write!(f, ":{step}")?;
            }
            Ok(())
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Literal]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        write!(f, "({INF_TEXT} - {INF_TEXT})")
    } else if x.is_infinite() {
        if x.is_sign_negative() {
            f.write_char('-')?;
        }
        f.write_str(INF_TEXT)
    } else {
        // Debug always keeps a `.` or an exponent, so the text never reads back as an int.
        write!(f, "{x:?}")
    }
}

/// Writes `s` as a Python string literal, preferring single quotes.
fn write_quoted(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            // Every control character sits below U+0100.
            c if c.is_control() => write!(f, "\\x{:02x}", u32::from(c))?,
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}
