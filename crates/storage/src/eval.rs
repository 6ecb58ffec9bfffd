//! Query evaluation over JSON documents
//!
//! `MemoryStore` delegates filter matching, ordering, cursor windows, and
//! limits to this module. A hosted backend would push all of this to the
//! service; here it runs over materialized documents.
//!
//! ## Value ordering
//!
//! Cross-type comparisons use a fixed type rank
//! (null < bool < number < string < array < object); range filters only
//! match operands of the same rank. A missing field sorts as null. The
//! document id is always the final ascending tiebreak, which keeps every
//! ordering total and every cursor position unambiguous.

use loam_core::{CursorBound, Direction, Document, Filter, FilterOp, OrderBy, QuerySpec};
use serde_json::Value as Json;
use std::cmp::Ordering;

/// Fixed cross-type rank
fn type_rank(value: &Json) -> u8 {
    match value {
        Json::Null => 0,
        Json::Bool(_) => 1,
        Json::Number(_) => 2,
        Json::String(_) => 3,
        Json::Array(_) => 4,
        Json::Object(_) => 5,
    }
}

/// Total order over JSON values
pub fn compare_values(a: &Json, b: &Json) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Json::Null, Json::Null) => Ordering::Equal,
        (Json::Bool(x), Json::Bool(y)) => x.cmp(y),
        (Json::Number(x), Json::Number(y)) => {
            let xf = x.as_f64().unwrap_or(f64::NAN);
            let yf = y.as_f64().unwrap_or(f64::NAN);
            xf.partial_cmp(&yf).unwrap_or(Ordering::Equal)
        }
        (Json::String(x), Json::String(y)) => x.cmp(y),
        (Json::Array(x), Json::Array(y)) => {
            for (xi, yi) in x.iter().zip(y.iter()) {
                let ord = compare_values(xi, yi);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Json::Object(x), Json::Object(y)) => {
            let mut xs: Vec<_> = x.iter().collect();
            let mut ys: Vec<_> = y.iter().collect();
            xs.sort_by(|l, r| l.0.cmp(r.0));
            ys.sort_by(|l, r| l.0.cmp(r.0));
            for ((xk, xv), (yk, yv)) in xs.iter().zip(ys.iter()) {
                let key_ord = xk.cmp(yk);
                if key_ord != Ordering::Equal {
                    return key_ord;
                }
                let val_ord = compare_values(xv, yv);
                if val_ord != Ordering::Equal {
                    return val_ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        _ => Ordering::Equal,
    }
}

/// Does one document match one filter predicate?
///
/// A missing field never matches; range operators additionally require the
/// operand and field to share a type rank.
pub fn matches_filter(doc: &Document, filter: &Filter) -> bool {
    let Some(value) = doc.get(&filter.field) else {
        return false;
    };
    let operand = &filter.value;
    match filter.op {
        FilterOp::Eq => value == operand,
        FilterOp::Neq => value != operand,
        FilterOp::Gt | FilterOp::Lt | FilterOp::Gte | FilterOp::Lte => {
            if type_rank(value) != type_rank(operand) {
                return false;
            }
            let ord = compare_values(value, operand);
            match filter.op {
                FilterOp::Gt => ord == Ordering::Greater,
                FilterOp::Lt => ord == Ordering::Less,
                FilterOp::Gte => ord != Ordering::Less,
                FilterOp::Lte => ord != Ordering::Greater,
                _ => unreachable!(),
            }
        }
        FilterOp::In => match operand {
            Json::Array(items) => items.contains(value),
            _ => false,
        },
        FilterOp::NotIn => match operand {
            Json::Array(items) => !items.contains(value),
            _ => false,
        },
        FilterOp::ArrayContains => match value {
            Json::Array(items) => items.contains(operand),
            _ => false,
        },
        FilterOp::ArrayContainsAny => match (value, operand) {
            (Json::Array(items), Json::Array(candidates)) => {
                candidates.iter().any(|c| items.contains(c))
            }
            _ => false,
        },
    }
}

/// Values of the query's sort keys for one document (missing fields as null)
pub fn order_key_values(doc: &Document, orders: &[OrderBy]) -> Vec<Json> {
    orders
        .iter()
        .map(|order| doc.get(&order.field).cloned().unwrap_or(Json::Null))
        .collect()
}

/// Compare two (order values, id) positions in the query's sort sequence
fn compare_positions(
    a_values: &[Json],
    a_id: &str,
    b_values: &[Json],
    b_id: &str,
    orders: &[OrderBy],
) -> Ordering {
    for (i, order) in orders.iter().enumerate() {
        let av = a_values.get(i).unwrap_or(&Json::Null);
        let bv = b_values.get(i).unwrap_or(&Json::Null);
        let mut ord = compare_values(av, bv);
        if order.direction == Direction::Desc {
            ord = ord.reverse();
        }
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a_id.cmp(b_id)
}

/// Sequence position of a document relative to a cursor bound
fn compare_to_bound(doc: &Document, bound: &CursorBound, orders: &[OrderBy]) -> Ordering {
    let values = order_key_values(doc, orders);
    compare_positions(&values, &doc.id, &bound.order_values, &bound.doc_id, orders)
}

/// Apply a full read plan to a set of documents
///
/// Filters, sorts (with the implicit id tiebreak), applies cursor bounds,
/// then the row limit (from the start, or from the end when the plan says
/// `limit_to_last`). Results always come back in forward sort order.
pub fn apply_query(mut docs: Vec<Document>, spec: &QuerySpec) -> Vec<Document> {
    docs.retain(|doc| spec.filters.iter().all(|f| matches_filter(doc, f)));

    docs.sort_by(|a, b| {
        let av = order_key_values(a, &spec.orders);
        let bv = order_key_values(b, &spec.orders);
        compare_positions(&av, &a.id, &bv, &b.id, &spec.orders)
    });

    if let Some(bound) = &spec.start_after {
        docs.retain(|doc| compare_to_bound(doc, bound, &spec.orders) == Ordering::Greater);
    }
    if let Some(bound) = &spec.end_before {
        docs.retain(|doc| compare_to_bound(doc, bound, &spec.orders) == Ordering::Less);
    }

    if let Some(limit) = spec.limit {
        if spec.limit_to_last {
            if docs.len() > limit {
                docs.drain(..docs.len() - limit);
            }
        } else {
            docs.truncate(limit);
        }
    }
    docs
}
