use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A constant embedded in an expression tree.
///
/// Sets and maps keep their members in canonical order (see [`Literal::canonical_cmp`]), so two
/// literals built from the same members compare and render identically no matter which
/// collection they came from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Set(Vec<Literal>),
    Map(Vec<(Literal, Literal)>),
}

impl Literal {
    pub fn list<T: Into<Literal>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a set literal; duplicate members collapse to one.
    pub fn set<T: Into<Literal>>(items: impl IntoIterator<Item = T>) -> Self {
        let mut members: Vec<Literal> = items.into_iter().map(Into::into).collect();
        members.sort_by(Self::canonical_cmp);
        members.dedup_by(|a, b| Self::canonical_cmp(a, b) == Ordering::Equal);
        Self::Set(members)
    }

    /// Builds a map literal. When a key repeats, the last value wins.
    pub fn map<K: Into<Literal>, V: Into<Literal>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut entries: Vec<(Literal, Literal)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        // Stable sort: equal keys stay in insertion order, so the last one is the newest.
        entries.sort_by(|a, b| Self::canonical_cmp(&a.0, &b.0));

        let mut out: Vec<(Literal, Literal)> = Vec::with_capacity(entries.len());
        for (k, v) in entries {
            match out.last_mut() {
                Some(last) if Self::canonical_cmp(&last.0, &k) == Ordering::Equal => last.1 = v,
                _ => out.push((k, v)),
            }
        }
        Self::Map(out)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Set(_) | Self::Map(_))
    }

    /// Total order used for set members and map keys.
    ///
    /// Kinds are ranked none < bool < number < str < list < set < map. Ints and floats share
    /// the number rank and compare numerically; within other kinds the natural order applies,
    /// containers lexicographically.
    pub fn canonical_cmp(a: &Self, b: &Self) -> Ordering {
        match (a, b) {
            (Self::Bool(x), Self::Bool(y)) => x.cmp(y),
            (Self::Int(x), Self::Int(y)) => x.cmp(y),
            (Self::Float(x), Self::Float(y)) => x.total_cmp(y),
            (Self::Int(x), Self::Float(y)) => int_float_cmp(*x, *y),
            (Self::Float(x), Self::Int(y)) => int_float_cmp(*y, *x).reverse(),
            (Self::Str(x), Self::Str(y)) => x.cmp(y),
            (Self::List(x), Self::List(y)) | (Self::Set(x), Self::Set(y)) => cmp_seq(x, y),
            (Self::Map(x), Self::Map(y)) => {
                for ((xk, xv), (yk, yv)) in x.iter().zip(y) {
                    let ord = Self::canonical_cmp(xk, yk).then_with(|| Self::canonical_cmp(xv, yv));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                x.len().cmp(&y.len())
            }
            _ => a.rank().cmp(&b.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::Str(_) => 3,
            Self::List(_) => 4,
            Self::Set(_) => 5,
            Self::Map(_) => 6,
        }
    }
}

fn cmp_seq(x: &[Literal], y: &[Literal]) -> Ordering {
    for (a, b) in x.iter().zip(y) {
        let ord = Literal::canonical_cmp(a, b);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    x.len().cmp(&y.len())
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Literal {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f32> for Literal {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&String> for Literal {
    fn from(v: &String) -> Self {
        Self::Str(v.clone())
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(v: Vec<T>) -> Self {
        Self::list(v)
    }
}

impl<T: Into<Literal>> From<BTreeSet<T>> for Literal {
    fn from(v: BTreeSet<T>) -> Self {
        Self::set(v)
    }
}

impl<T: Into<Literal>, S> From<HashSet<T, S>> for Literal {
    fn from(v: HashSet<T, S>) -> Self {
        Self::set(v)
    }
}

impl<K: Into<Literal>, V: Into<Literal>> From<BTreeMap<K, V>> for Literal {
    fn from(v: BTreeMap<K, V>) -> Self {
        Self::map(v)
    }
}

impl<K: Into<Literal>, V: Into<Literal>, S> From<HashMap<K, V, S>> for Literal {
    fn from(v: HashMap<K, V, S>) -> Self {
        Self::map(v)
    }
}

impl From<serde_json::Value> for Literal {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => Self::None,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::list(items),
            Value::Object(fields) => Self::map(fields),
        }
    }
}

/// Orders an int against a float exactly; `as f64` would merge ints above 2^53.
fn int_float_cmp(i: i64, x: f64) -> Ordering {
    // 2^63, the first float past i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if x.is_nan() {
        return if x.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if x >= LIMIT {
        return Ordering::Less;
    }
    if x < -LIMIT {
        return Ordering::Greater;
    }
    let whole = x.trunc();
    // In range and integral, so the cast is exact.
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&x).unwrap_or(Ordering::Equal),
        other => other,
    }
}
