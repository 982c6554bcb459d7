use std::collections::BTreeMap;

use lale_expr::{
    Expr, ExprError, Literal, Node, count, day_of_month, day_of_week, day_of_year,
    distinct_count, greater_or_equal, hour, it, item, max, mean, min, minute, month, replace,
    sum, trend, variance,
};

fn sample_trees() -> Vec<Expr> {
    let sales = it().field("sales");
    let date = it().field("date");
    let group = it().field("group");
    vec![
        it().clone(),
        it().field("foo").field("bar"),
        count(&sales),
        mean(&sales),
        variance(&sales),
        distinct_count(&sales),
        max(&sales),
        min(&sales),
        sum(&sales),
        trend(&sales),
        day_of_month(&date, None),
        day_of_week(&date, Some("%Y-%m-%d")),
        day_of_year(&date, None),
        hour(&date, Some("%H")),
        minute(&date, None),
        month(&date, Some("%m")),
        item(&group, 3).unwrap(),
        item(&group, "k").unwrap(),
        item(&group, -7).unwrap(),
        replace(&it().field("col"), [(1, "a"), (2, "b")]),
        replace(&it().field("col"), [("it's", Literal::None), ("x", Literal::Float(-0.5))]),
        it().field("col").index(0),
        it().field("col").index("k"),
        it().field("col").index(1..5),
        it().field("col").slice(None, Some(-1), Some(2)),
        it().field("x").equals(&it().field("y")),
        greater_or_equal(&mean(&sales), &it().field("threshold")),
        mean(&it().field("a").index("b").field("c")),
    ]
}

#[test]
fn rendering_is_deterministic() {
    for t in sample_trees() {
        assert_eq!(t.to_string(), t.to_string());
        assert_eq!(t.to_string(), t.clone().to_string());
    }
}

#[test]
fn rendered_text_reparses_to_the_same_text() {
    for t in sample_trees() {
        let text = t.to_string();
        let back = Expr::parse(&text).unwrap_or_else(|e| panic!("reparse '{text}': {e}"));
        assert_eq!(back.to_string(), text);
    }
}

#[test]
fn rendered_text_has_no_surrounding_whitespace() {
    for t in sample_trees() {
        let text = t.to_string();
        assert_eq!(text.trim(), text);
    }
}

#[test]
fn attribute_round_trip() {
    assert_eq!(it().field("foo").field("bar").to_string(), "it.foo.bar");
}

#[test]
fn aggregation_call_shape() {
    assert_eq!(mean(&it().field("sales")).to_string(), "mean(it.sales)");
    assert_eq!(sum(&it().field("x")).to_string(), "sum(it.x)");
}

#[test]
fn optional_format_temporal_calls() {
    let date = it().field("date");
    assert_eq!(month(&date, None).to_string(), "month(it.date)");
    assert_eq!(month(&date, Some("%m")).to_string(), "month(it.date, '%m')");

    let Node::Call { args, .. } = month(&date, Some("%m")).into_node() else {
        panic!("expected call node");
    };
    assert_eq!(args.len(), 2);
}

#[test]
fn item_access() {
    let g = it().field("group");
    assert_eq!(item(&g, 3).unwrap().to_string(), "item(it.group, 3)");
    assert_eq!(item(&g, "k").unwrap().to_string(), "item(it.group, 'k')");
    assert!(matches!(item(&g, 3.5), Err(ExprError::Type(_))));
}

#[test]
fn comparison_degradation() {
    let x = it().field("x");
    assert!(!(x == 5));
    let e = x.equals(&it().field("y"));
    assert_eq!(e.to_string(), "it.x == it.y");
}

#[test]
fn boolean_coercion_fails_for_every_node_kind() {
    for t in sample_trees() {
        assert!(matches!(t.to_bool(), Err(ExprError::Usage(_))));
    }
}

#[test]
fn indexing_variants() {
    let col = it().field("col");
    assert_eq!(col.index(0).to_string(), "it.col[0]");
    assert_eq!(col.index("k").to_string(), "it.col['k']");
    assert_eq!(col.index(1..5).to_string(), "it.col[1:5]");
    assert!(matches!(col.try_index(2.0), Err(ExprError::Type(_))));
}

#[test]
fn replace_with_nested_literal() {
    let mut m = BTreeMap::new();
    m.insert(2, "b");
    m.insert(1, "a");
    let e = replace(&it().field("col"), m);
    assert_eq!(e.to_string(), "replace(it.col, {1: 'a', 2: 'b'})");

    let Node::Call { func, args } = Expr::parse(&e.to_string()).unwrap().into_node() else {
        panic!("expected call node");
    };
    assert_eq!(func, "replace");
    assert_eq!(args[0], it().field("col").into_node());
    assert_eq!(args[1], Node::lit(Literal::map([(1, "a"), (2, "b")])));
}

#[test]
fn replace_accepts_nested_containers() {
    let e = replace(
        &it().field("col"),
        [
            (Literal::from("xs"), Literal::list([1, 2])),
            (Literal::from("s"), Literal::set(["b", "a"])),
        ],
    );
    assert_eq!(e.to_string(), "replace(it.col, {'s': {'a', 'b'}, 'xs': [1, 2]})");
    assert_eq!(Expr::parse(&e.to_string()).unwrap(), e);
}

#[test]
fn operations_do_not_alter_operands() {
    let base = it().field("sales");
    let text = base.to_string();
    let _ = mean(&base);
    let _ = base.index(1..2);
    let _ = replace(&base, [(0, 1)]);
    assert_eq!(base.to_string(), text);
    assert_eq!(it().to_string(), "it");
}
