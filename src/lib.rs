//! Symbolic expressions for relational feature aggregation in ML pipelines.
//!
//! Start from the root sentinel [`it`], select fields and items, wrap the result in a named
//! function, and render it to canonical text:
//!
//! ```
//! use lale_expr::{it, mean, month};
//!
//! assert_eq!(mean(&it().field("sales")).to_string(), "mean(it.sales)");
//! assert_eq!(month(&it().field("date"), Some("%m")).to_string(), "month(it.date, '%m')");
//! ```
//!
//! Expressions are never evaluated here; the text (or the [`Node`] tree) is handed to whatever
//! engine executes the pipeline.
#![forbid(unsafe_code)]

pub mod aggregate;
pub mod ast;
pub mod error;
pub mod expr;
pub mod functions;
mod lexer;
pub mod literal;
pub mod parser;
mod render;

pub use aggregate::{Aggregate, AggregateBuilder, Assignment};
pub use ast::{BinaryOp, BoolOp, CmpOp, Index, Node, Slice, UnaryOp};
pub use error::{ExprError, ExprResult};
pub use expr::{Expr, IT, equals, greater_or_equal, it};
pub use functions::{
    Arg, call, count, day_of_month, day_of_week, day_of_year, distinct_count, hour, item, max,
    mean, min, minute, month, replace, sum, trend, variance,
};
pub use literal::Literal;
pub use parser::parse_node;
