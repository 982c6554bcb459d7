use std::fmt;
use std::sync::LazyLock;

use crate::ast::{CmpOp, Index, Node, Slice};
use crate::error::{ExprError, ExprResult};
use crate::literal::Literal;
use crate::parser::parse_node;

/// Symbol bound to the root sentinel.
pub const IT: &str = "it";

static ROOT: LazyLock<Expr> = LazyLock::new(|| Expr::from_node(Node::name(IT)));

/// The current record or group: the starting point of every expression.
pub fn it() -> &'static Expr {
    &ROOT
}

/// An immutable expression tree.
///
/// Every builder method borrows `self` and returns a new tree that embeds a copy of it, so an
/// expression stays usable after it has been extended.
///
/// # Equality
///
/// `==` between two expressions is structural and never builds a node; use [`Expr::equals`] for
/// the `a == b` expression. Comparing an expression with a plain value (`it().field("x") == 5`)
/// is always `false`: a tree is never equal to the constant it might evaluate to.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    node: Node,
}

impl Expr {
    pub fn from_node(node: Node) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    /// Parses rendered text back into an expression.
    pub fn parse(src: &str) -> ExprResult<Self> {
        parse_node(src.trim()).map(Self::from_node)
    }

    /// `self.name`. Any string is accepted as a field name; names that are not identifiers
    /// render as `getattr(self, 'name')`.
    pub fn field(&self, name: impl Into<String>) -> Self {
        Self::from_node(Node::Attribute {
            value: Box::new(self.node.clone()),
            attr: name.into(),
        })
    }

    /// `self[key]` for an int, a str, a [`Slice`] or an `i64` range.
    pub fn index(&self, key: impl Into<Index>) -> Self {
        Self::from_node(Node::Subscript {
            value: Box::new(self.node.clone()),
            index: key.into(),
        })
    }

    /// `self[key]` for a key only known at runtime; anything but an int or str is a type error.
    pub fn try_index(&self, key: impl Into<Literal>) -> ExprResult<Self> {
        let index = match key.into() {
            Literal::Int(i) => Index::Int(i),
            Literal::Str(s) => Index::Str(s),
            other => {
                return Err(ExprError::type_error(format!(
                    "expected int, str, or slice, got {}",
                    other.kind_name()
                )));
            }
        };
        Ok(self.index(index))
    }

    pub fn slice(&self, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        self.index(Slice::new(start, stop, step))
    }

    /// `self == other`.
    pub fn equals(&self, other: &Expr) -> Self {
        self.compare(CmpOp::Eq, other)
    }

    /// `self >= other`.
    pub fn greater_or_equal(&self, other: &Expr) -> Self {
        self.compare(CmpOp::GtE, other)
    }

    pub fn compare(&self, op: CmpOp, other: &Expr) -> Self {
        Self::from_node(Node::Compare {
            left: Box::new(self.node.clone()),
            ops: vec![op],
            comparators: vec![other.node.clone()],
        })
    }

    /// Always fails: an expression has no truth value until something evaluates it.
    pub fn to_bool(&self) -> ExprResult<bool> {
        Err(ExprError::usage(format!(
            "cannot convert expression e1=`{self}` to bool; \
             instead of `e1 and e2`, collect the expressions into a list: `vec![e1, e2]`"
        )))
    }
}

/// `a == b` as an expression.
pub fn equals(a: &Expr, b: &Expr) -> Expr {
    a.equals(b)
}

/// `a >= b` as an expression.
pub fn greater_or_equal(a: &Expr, b: &Expr) -> Expr {
    a.greater_or_equal(b)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.node, f)
    }
}

impl From<Node> for Expr {
    fn from(node: Node) -> Self {
        Self::from_node(node)
    }
}

impl From<Expr> for Node {
    fn from(e: Expr) -> Self {
        e.node
    }
}

impl TryFrom<&Expr> for bool {
    type Error = ExprError;

    fn try_from(e: &Expr) -> ExprResult<bool> {
        e.to_bool()
    }
}

macro_rules! never_equal_to_plain_values {
    ($($t:ty),* $(,)?) => {
        $(
            impl PartialEq<$t> for Expr {
                fn eq(&self, _: &$t) -> bool {
                    false
                }
            }
        )*
    };
}

never_equal_to_plain_values!(i32, i64, f64, bool, &str, String, Literal);

impl serde::Serialize for Expr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Expr {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let src = String::deserialize(deserializer)?;
        Self::parse(&src).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_shared() {
        assert!(std::ptr::eq(it(), it()));
        assert_eq!(it().to_string(), "it");
        assert_eq!(it().node(), &Node::name("it"));
    }

    #[test]
    fn fields_chain_left_to_right() {
        assert_eq!(it().field("foo").field("bar").to_string(), "it.foo.bar");
        // Names that would collide with methods in other hosts are plain fields here.
        assert_eq!(it().field("equals").field("index").to_string(), "it.equals.index");
    }

    #[test]
    fn odd_field_names_round_trip_through_text() {
        for name in ["total sales", "1x", "", "café", "it's"] {
            let e = it().field("row").field(name).index(0);
            let text = e.to_string();
            let back = Expr::parse(&text).unwrap_or_else(|err| panic!("reparse '{text}': {err}"));
            assert_eq!(back, e);
            assert_eq!(back.to_string(), text);
        }
        assert_eq!(
            it().field("total sales").to_string(),
            "getattr(it, 'total sales')"
        );
    }

    #[test]
    fn builders_leave_operands_untouched() {
        let base = it().field("x");
        let before = base.clone();
        let _ = base.field("y");
        let _ = base.index(0);
        let _ = base.equals(&it().field("z"));
        assert_eq!(base, before);
        assert_eq!(base.to_string(), "it.x");
    }

    #[test]
    fn indexing_variants() {
        let col = it().field("col");
        assert_eq!(col.index(0).to_string(), "it.col[0]");
        assert_eq!(col.index("k").to_string(), "it.col['k']");
        assert_eq!(col.index(1..5).to_string(), "it.col[1:5]");
        assert_eq!(col.slice(None, None, Some(2)).to_string(), "it.col[::2]");
        match col.index(1..5).node() {
            Node::Subscript {
                index: Index::Slice(s),
                ..
            } => assert_eq!(*s, Slice::new(Some(1), Some(5), None)),
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn dynamic_index_rejects_other_kinds() {
        assert_eq!(it().try_index(2).unwrap().to_string(), "it[2]");
        assert_eq!(it().try_index("a").unwrap().to_string(), "it['a']");
        let err = it().try_index(1.5).unwrap_err();
        assert!(matches!(err, ExprError::Type(_)));
        assert!(err.to_string().contains("got float"));
        assert!(it().try_index(Literal::None).is_err());
    }

    #[test]
    fn comparisons_build_nodes() {
        let e = it().field("x").equals(&it().field("y"));
        assert_eq!(e.to_string(), "it.x == it.y");
        assert_eq!(
            greater_or_equal(&it().field("a"), &it().field("b")).to_string(),
            "it.a >= it.b"
        );
        assert_eq!(
            it().field("a").compare(CmpOp::Lt, &it().field("b")).to_string(),
            "it.a < it.b"
        );
    }

    #[test]
    fn plain_value_comparison_is_false() {
        let x = it().field("x");
        assert!(!(x == 5));
        assert!(x != 5);
        assert!(!(x == "x"));
        assert!(!(x == Literal::Int(5)));
        assert!(!(Expr::parse("5").unwrap() == 5));
    }

    #[test]
    fn bool_coercion_always_fails() {
        for e in [
            it().clone(),
            it().field("x"),
            it().field("x").equals(&it().field("y")),
            Expr::parse("True").unwrap(),
        ] {
            let err = e.to_bool().unwrap_err();
            assert!(matches!(err, ExprError::Usage(_)));
            assert!(err.to_string().contains("vec![e1, e2]"));
            assert!(bool::try_from(&e).is_err());
        }
    }

    #[test]
    fn serializes_as_text() {
        let e = it().field("sales").index("2020");
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, r#""it.sales['2020']""#);
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
        assert!(serde_json::from_str::<Expr>(r#""it.""#).is_err());
    }
}
