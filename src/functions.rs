//! Named constructors for call expressions.
//!
//! Each function here builds a `Call` node whose function name is the constructor's own name.
//! Nothing is evaluated; an execution engine downstream gives the names their meaning.

use crate::ast::Node;
use crate::error::{ExprError, ExprResult};
use crate::expr::Expr;
use crate::lexer::is_name;
use crate::literal::Literal;

/// A call operand before it is embedded in a tree.
#[derive(Debug, Clone)]
pub enum Arg {
    Node(Node),
    /// A tree in its JSON form; checked against the known node kinds when embedded.
    Raw(serde_json::Value),
}

impl Arg {
    pub fn raw(value: serde_json::Value) -> Self {
        Self::Raw(value)
    }

    pub fn into_node(self) -> ExprResult<Node> {
        match self {
            Self::Node(node) => Ok(node),
            Self::Raw(value) => {
                let kind = value
                    .get("kind")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("untagged value")
                    .to_owned();
                let node: Node = serde_json::from_value(value).map_err(|e| {
                    ExprError::type_error(format!("expected an expression node, got {kind}: {e}"))
                })?;
                if !node.is_well_formed() {
                    return Err(ExprError::type_error(format!("malformed {kind} node")));
                }
                Ok(node)
            }
        }
    }
}

impl From<Expr> for Arg {
    fn from(e: Expr) -> Self {
        Self::Node(e.into_node())
    }
}

impl From<&Expr> for Arg {
    fn from(e: &Expr) -> Self {
        Self::Node(e.node().clone())
    }
}

impl From<Node> for Arg {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Literal> for Arg {
    fn from(value: Literal) -> Self {
        Self::Node(Node::Lit { value })
    }
}

macro_rules! lift_literal_args {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Self::Node(Node::lit(v))
                }
            }
        )*
    };
}

lift_literal_args!(bool, i32, i64, f64, &str, String);

/// Builds `func(args...)`, coercing every operand into a node.
pub fn call<A: Into<Arg>>(func: &str, args: impl IntoIterator<Item = A>) -> ExprResult<Expr> {
    if !is_identifier(func) {
        return Err(ExprError::validation(format!(
            "function name '{func}' is not an identifier"
        )));
    }
    let args = args
        .into_iter()
        .map(|a| a.into().into_node())
        .collect::<ExprResult<Vec<_>>>()?;
    Ok(make_call(func, args))
}

fn make_call(func: &str, args: Vec<Node>) -> Expr {
    tracing::trace!(func, argc = args.len(), "build call expression");
    Expr::from_node(Node::Call {
        func: func.to_owned(),
        args,
    })
}

fn is_identifier(s: &str) -> bool {
    is_name(s) && !matches!(s, "and" | "or" | "not" | "True" | "False" | "None")
}

macro_rules! aggregations {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(group: &Expr) -> Expr {
                make_call(stringify!($name), vec![group.node().clone()])
            }
        )*
    };
}

aggregations! {
    /// Number of rows in the group.
    count,
    mean,
    variance,
    /// Number of distinct values in the group.
    distinct_count,
    max,
    min,
    sum,
    trend,
}

macro_rules! temporal_extractions {
    ($($name:ident),* $(,)?) => {
        $(
            /// Extracts a date/time component. With `fmt`, the subject is a string to be parsed
            /// with that format; the call then carries two arguments instead of one.
            pub fn $name(subject: &Expr, fmt: Option<&str>) -> Expr {
                let mut args = vec![subject.node().clone()];
                if let Some(fmt) = fmt {
                    args.push(Node::lit(fmt));
                }
                make_call(stringify!($name), args)
            }
        )*
    };
}

temporal_extractions!(day_of_month, day_of_week, day_of_year, hour, minute, month);

/// `item(group, value)`: the value of `group` at key `value`, which must be an int or a str.
pub fn item(group: &Expr, value: impl Into<Literal>) -> ExprResult<Expr> {
    let value = value.into();
    if !matches!(value, Literal::Int(_) | Literal::Str(_)) {
        return Err(ExprError::type_error(format!(
            "expected int or str value, got {}",
            value.kind_name()
        )));
    }
    Ok(make_call("item", vec![group.node().clone(), Node::Lit { value }]))
}

/// `replace(subject, {old: new, ...})`.
///
/// The mapping is embedded as a map literal in canonical key order, so the result does not
/// depend on the iteration order of the collection passed in.
pub fn replace<K, V>(subject: &Expr, old2new: impl IntoIterator<Item = (K, V)>) -> Expr
where
    K: Into<Literal>,
    V: Into<Literal>,
{
    make_call(
        "replace",
        vec![subject.node().clone(), Node::lit(Literal::map(old2new))],
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::expr::it;

    #[test]
    fn aggregations_wrap_one_operand() {
        let sales = it().field("sales");
        for (e, text) in [
            (count(&sales), "count(it.sales)"),
            (mean(&sales), "mean(it.sales)"),
            (variance(&sales), "variance(it.sales)"),
            (distinct_count(&sales), "distinct_count(it.sales)"),
            (max(&sales), "max(it.sales)"),
            (min(&sales), "min(it.sales)"),
            (sum(&sales), "sum(it.sales)"),
            (trend(&sales), "trend(it.sales)"),
        ] {
            assert_eq!(e.to_string(), text);
        }
    }

    #[test]
    fn temporal_format_is_optional() {
        let date = it().field("date");
        match month(&date, None).node() {
            Node::Call { func, args } => {
                assert_eq!(func, "month");
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected ast: {other:?}"),
        }
        assert_eq!(month(&date, Some("%m")).to_string(), "month(it.date, '%m')");
        assert_eq!(hour(&date, None).to_string(), "hour(it.date)");
        assert_eq!(
            day_of_week(&date, Some("%Y-%m-%d")).to_string(),
            "day_of_week(it.date, '%Y-%m-%d')"
        );
    }

    #[test]
    fn item_accepts_only_int_or_str() {
        let g = it().field("group");
        assert_eq!(item(&g, 3).unwrap().to_string(), "item(it.group, 3)");
        assert_eq!(item(&g, "k").unwrap().to_string(), "item(it.group, 'k')");
        let err = item(&g, 3.5).unwrap_err();
        assert!(matches!(err, ExprError::Type(_)));
        assert!(err.to_string().contains("got float"));
        assert!(item(&g, true).is_err());
    }

    #[test]
    fn replace_is_independent_of_input_order() {
        let col = it().field("col");
        let mut m = HashMap::new();
        m.insert(2, "b");
        m.insert(1, "a");
        let e = replace(&col, m);
        assert_eq!(e.to_string(), "replace(it.col, {1: 'a', 2: 'b'})");
        assert_eq!(e, replace(&col, [(1, "a"), (2, "b")]));
    }

    #[test]
    fn call_coerces_operands() {
        let e = call(
            "f",
            [
                Arg::from(it().field("x")),
                Arg::from(2),
                Arg::from(2.5),
                Arg::from("s"),
                Arg::from(Literal::list([1, 2])),
            ],
        )
        .unwrap();
        assert_eq!(e.to_string(), "f(it.x, 2, 2.5, 's', [1, 2])");
    }

    #[test]
    fn raw_operands_are_type_checked() {
        let raw = serde_json::to_value(it().field("x").node()).unwrap();
        let e = call("g", [Arg::raw(raw)]).unwrap();
        assert_eq!(e.to_string(), "g(it.x)");

        let err = call("g", [Arg::raw(serde_json::json!({"kind": "lambda"}))]).unwrap_err();
        assert!(matches!(err, ExprError::Type(_)));
        assert!(err.to_string().contains("lambda"));

        let malformed = serde_json::json!({
            "kind": "compare",
            "left": {"kind": "name", "id": "it"},
            "ops": ["eq"],
            "comparators": []
        });
        assert!(call("g", [Arg::raw(malformed)]).is_err());
    }

    #[test]
    fn call_rejects_bad_names() {
        assert!(call("not", [1]).is_err());
        assert!(call("2f", [1]).is_err());
        assert!(call("a.b", [1]).is_err());
        assert_eq!(call("_f2", Vec::<Arg>::new()).unwrap().to_string(), "_f2()");
    }

    #[test]
    fn constructors_are_pure() {
        let x = it().field("x");
        assert_eq!(mean(&x), mean(&x));
        assert_eq!(x.to_string(), "it.x");
    }
}
