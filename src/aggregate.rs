use crate::ast::Node;
use crate::error::{ExprError, ExprResult};
use crate::expr::Expr;

/// One output column of an aggregation: `name = expr`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Assignment {
    pub name: String,
    pub expr: Expr,
}

/// Configuration of the relational aggregate operator.
///
/// Columns keep the order they were declared in. In JSON the expressions are stored as text:
/// `{"columns": [{"name": "avg_sales", "expr": "mean(it.sales)"}]}`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Aggregate {
    pub columns: Vec<Assignment>,
}

impl Aggregate {
    pub fn builder() -> AggregateBuilder {
        AggregateBuilder::default()
    }

    /// Parses and validates a JSON document.
    pub fn from_json(src: &str) -> ExprResult<Self> {
        let agg: Self = serde_json::from_str(src)?;
        agg.validate()?;
        Ok(agg)
    }

    pub fn validate(&self) -> ExprResult<()> {
        for (i, col) in self.columns.iter().enumerate() {
            if col.name.trim().is_empty() {
                return Err(ExprError::validation(format!(
                    "column {i} has an empty name"
                )));
            }
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(ExprError::validation(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Expr> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.expr)
    }

    /// Hyperparameters as handed to the operator layer: column name to rendered expression,
    /// in declaration order.
    pub fn hyperparams(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .map(|c| (c.name.clone(), serde_json::Value::String(c.expr.to_string())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }

    /// Short multi-line label for pipeline visualizations, e.g. `"Aggregate:\nmean sales"`.
    pub fn viz_label(&self) -> String {
        let mut out = String::from("Aggregate:");
        for col in &self.columns {
            out.push('\n');
            out.push_str(&column_label(&col.expr));
        }
        out
    }
}

fn column_label(expr: &Expr) -> String {
    if let Node::Call { func, args } = expr.node() {
        if let Some(Node::Attribute { attr, .. }) = args.first() {
            return format!("{func} {attr}");
        }
    }
    expr.to_string()
}

#[derive(Debug, Default)]
pub struct AggregateBuilder {
    columns: Vec<Assignment>,
}

impl AggregateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>, expr: Expr) -> ExprResult<Self> {
        let name = name.into();
        if self.columns.iter().any(|c| c.name == name) {
            return Err(ExprError::validation(format!(
                "duplicate column name '{name}'"
            )));
        }
        self.columns.push(Assignment { name, expr });
        Ok(self)
    }

    pub fn build(self) -> ExprResult<Aggregate> {
        let agg = Aggregate {
            columns: self.columns,
        };
        agg.validate()?;
        tracing::debug!(columns = agg.columns.len(), "built aggregate configuration");
        Ok(agg)
    }
}
