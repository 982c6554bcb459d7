use crate::literal::Literal;

/// One node of an expression tree.
///
/// Children are owned exclusively; trees are built bottom-up and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Lit {
        value: Literal,
    },
    /// A bare identifier. The builders only ever produce the root sentinel `it`; the parser
    /// also produces names for call targets it cannot resolve otherwise.
    Name {
        id: String,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// `a and b and c`: two or more operands joined by one operator.
    BoolOp {
        op: BoolOp,
        values: Vec<Node>,
    },
    /// `left op0 r0 op1 r1 ...`; `ops` and `comparators` always have the same non-zero length.
    Compare {
        left: Box<Node>,
        ops: Vec<CmpOp>,
        comparators: Vec<Node>,
    },
    Call {
        func: String,
        args: Vec<Node>,
    },
    Attribute {
        value: Box<Node>,
        attr: String,
    },
    Subscript {
        value: Box<Node>,
        index: Index,
    },
}

impl Node {
    pub fn lit(value: impl Into<Literal>) -> Self {
        Self::Lit {
            value: value.into(),
        }
    }

    pub fn name(id: impl Into<String>) -> Self {
        Self::Name { id: id.into() }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Lit { .. } => "lit",
            Self::Name { .. } => "name",
            Self::Unary { .. } => "unary",
            Self::Binary { .. } => "binary",
            Self::BoolOp { .. } => "bool_op",
            Self::Compare { .. } => "compare",
            Self::Call { .. } => "call",
            Self::Attribute { .. } => "attribute",
            Self::Subscript { .. } => "subscript",
        }
    }

    /// Checks the shape constraints the type system cannot express.
    pub(crate) fn is_well_formed(&self) -> bool {
        match self {
            Self::Lit { .. } | Self::Name { .. } => true,
            Self::Unary { operand, .. } => operand.is_well_formed(),
            Self::Binary { left, right, .. } => left.is_well_formed() && right.is_well_formed(),
            Self::BoolOp { values, .. } => {
                values.len() >= 2 && values.iter().all(Self::is_well_formed)
            }
            Self::Compare {
                left,
                ops,
                comparators,
            } => {
                !ops.is_empty()
                    && ops.len() == comparators.len()
                    && left.is_well_formed()
                    && comparators.iter().all(Self::is_well_formed)
            }
            Self::Call { args, .. } => args.iter().all(Self::is_well_formed),
            Self::Attribute { value, .. } | Self::Subscript { value, .. } => value.is_well_formed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

/// The bracketed part of a subscript.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Index {
    Int(i64),
    Str(String),
    Slice(Slice),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }
}

impl From<i64> for Index {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Index {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Index {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Index {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Slice> for Index {
    fn from(v: Slice) -> Self {
        Self::Slice(v)
    }
}

impl From<std::ops::Range<i64>> for Index {
    fn from(r: std::ops::Range<i64>) -> Self {
        Self::Slice(Slice::new(Some(r.start), Some(r.end), None))
    }
}

impl From<std::ops::RangeFrom<i64>> for Index {
    fn from(r: std::ops::RangeFrom<i64>) -> Self {
        Self::Slice(Slice::new(Some(r.start), None, None))
    }
}

impl From<std::ops::RangeTo<i64>> for Index {
    fn from(r: std::ops::RangeTo<i64>) -> Self {
        Self::Slice(Slice::new(None, Some(r.end), None))
    }
}

impl From<std::ops::RangeFull> for Index {
    fn from(_: std::ops::RangeFull) -> Self {
        Self::Slice(Slice::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_become_slices() {
        assert_eq!(
            Index::from(1..5),
            Index::Slice(Slice::new(Some(1), Some(5), None))
        );
        assert_eq!(Index::from(2..), Index::Slice(Slice::new(Some(2), None, None)));
        assert_eq!(Index::from(..3), Index::Slice(Slice::new(None, Some(3), None)));
        assert_eq!(Index::from(..), Index::Slice(Slice::default()));
    }

    #[test]
    fn node_json_is_tagged_by_kind() {
        let n = Node::Attribute {
            value: Box::new(Node::name("it")),
            attr: "sales".to_owned(),
        };
        let v = serde_json::to_value(&n).unwrap();
        assert_eq!(v["kind"], "attribute");
        assert_eq!(v["value"]["kind"], "name");
        assert_eq!(v["attr"], "sales");

        let back: Node = serde_json::from_value(v).unwrap();
        assert_eq!(back, n);
    }

    #[test]
    fn malformed_compare_is_detected() {
        let n = Node::Compare {
            left: Box::new(Node::name("it")),
            ops: vec![CmpOp::Eq],
            comparators: vec![],
        };
        assert!(!n.is_well_formed());
        assert!(Node::lit(1).is_well_formed());
    }
}
