//! Query constraint types
//!
//! The constraint builder in the api crate accumulates these and renders a
//! `QuerySpec` per execution. A `QuerySpec` is the full unexecuted read plan
//! handed to the datastore: filters, sort keys, row limit, cursor bounds.
//!
//! Constraints are plain data. Nothing here touches the network.

use crate::error::{Error, Result};
use crate::path::CollectionPath;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;
use std::str::FromStr;

/// Filter operator accepted by `where` constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterOp {
    /// `==`
    Eq,
    /// `!=`
    Neq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// `in`
    In,
    /// `not-in`
    NotIn,
    /// `array-contains`
    ArrayContains,
    /// `array-contains-any`
    ArrayContainsAny,
}

impl FilterOp {
    /// The wire spelling of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Neq => "!=",
            FilterOp::Gt => ">",
            FilterOp::Lt => "<",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
            FilterOp::In => "in",
            FilterOp::NotIn => "not-in",
            FilterOp::ArrayContains => "array-contains",
            FilterOp::ArrayContainsAny => "array-contains-any",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "==" => Ok(FilterOp::Eq),
            "!=" => Ok(FilterOp::Neq),
            ">" => Ok(FilterOp::Gt),
            "<" => Ok(FilterOp::Lt),
            ">=" => Ok(FilterOp::Gte),
            "<=" => Ok(FilterOp::Lte),
            "in" => Ok(FilterOp::In),
            "not-in" => Ok(FilterOp::NotIn),
            "array-contains" => Ok(FilterOp::ArrayContains),
            "array-contains-any" => Ok(FilterOp::ArrayContainsAny),
            other => Err(Error::invalid_argument(format!(
                "unknown filter operator {other:?}"
            ))),
        }
    }
}

/// One filter predicate: field, operator, operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field name the predicate applies to
    pub field: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Operand value
    pub value: Json,
}

impl Filter {
    /// Build a filter predicate
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Json>) -> Self {
        Filter {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Ascending order
    #[default]
    Asc,
    /// Descending order
    Desc,
}

impl Direction {
    /// The opposite direction
    pub fn reversed(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }
}

/// One sort key with direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Field name to sort by
    pub field: String,
    /// Sort direction
    pub direction: Direction,
}

impl OrderBy {
    /// Build a sort key
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        OrderBy {
            field: field.into(),
            direction,
        }
    }
}

/// A cursor position in a query's sort order
///
/// Carries the values of the query's sort keys at the cursor document, plus
/// the document id as the final tiebreak. Built by resolving a document id
/// back to its stored order-key values with an extra read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorBound {
    /// One value per sort key of the query, in order
    pub order_values: Vec<Json>,
    /// Normalized id of the cursor document (tiebreak)
    pub doc_id: String,
}

/// An unexecuted read plan against one collection or subcollection
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Target collection path
    pub collection: CollectionPath,
    /// Filter predicates, in accumulation order (conjunctive)
    pub filters: Vec<Filter>,
    /// Sort keys, in accumulation order; the document id is always an
    /// implicit final ascending tiebreak
    pub orders: Vec<OrderBy>,
    /// Optional row limit
    pub limit: Option<usize>,
    /// Take the limit from the end of the sorted window instead of the start
    pub limit_to_last: bool,
    /// Results start strictly after this position
    pub start_after: Option<CursorBound>,
    /// Results end strictly before this position
    pub end_before: Option<CursorBound>,
}

impl QuerySpec {
    /// Unconstrained read plan over a collection
    pub fn all(collection: CollectionPath) -> Self {
        QuerySpec {
            collection,
            filters: Vec::new(),
            orders: Vec::new(),
            limit: None,
            limit_to_last: false,
            start_after: None,
            end_before: None,
        }
    }
}
