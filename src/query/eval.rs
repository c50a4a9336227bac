//! Local evaluation of the filter subset used by the façade.
//!
//! Lets callers check that records returned by the server satisfy the filter
//! that was sent, and orders records the way a `sort` stage would.

use bson::{Bson, Document};
use std::cmp::Ordering;

use super::types::{Order, SortSpec};

const MAX_PATH_DEPTH: usize = 32;

/// Does `doc` satisfy `filter`?
///
/// Supports implicit equality, `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`,
/// `$nin`, `$exists`, and top-level `$and`/`$or`. Unknown operators never match.
#[must_use]
pub fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, cond)| match key.as_str() {
        "$and" => clauses(cond).is_some_and(|cs| cs.iter().all(|c| matches_filter(doc, c))),
        "$or" => clauses(cond).is_some_and(|cs| cs.iter().any(|c| matches_filter(doc, c))),
        path => matches_condition(get_path(doc, path), cond),
    })
}

fn clauses(v: &Bson) -> Option<Vec<&Document>> {
    v.as_array()?.iter().map(Bson::as_document).collect()
}

fn is_operator_doc(d: &Document) -> bool {
    !d.is_empty() && d.keys().all(|k| k.starts_with('$'))
}

fn matches_condition(value: Option<&Bson>, cond: &Bson) -> bool {
    match cond {
        Bson::Document(ops) if is_operator_doc(ops) => {
            ops.iter().all(|(op, operand)| apply_op(value, op, operand))
        }
        literal => value.is_some_and(|v| equals(v, literal)),
    }
}

fn apply_op(value: Option<&Bson>, op: &str, operand: &Bson) -> bool {
    match op {
        "$eq" => value.is_some_and(|v| equals(v, operand)),
        "$ne" => !value.is_some_and(|v| equals(v, operand)),
        "$gt" => value.is_some_and(|v| comparable(v, operand) && compare_bson(v, operand).is_gt()),
        "$gte" => value.is_some_and(|v| comparable(v, operand) && compare_bson(v, operand).is_ge()),
        "$lt" => value.is_some_and(|v| comparable(v, operand) && compare_bson(v, operand).is_lt()),
        "$lte" => value.is_some_and(|v| comparable(v, operand) && compare_bson(v, operand).is_le()),
        "$in" => value.is_some_and(|v| in_set(v, operand)),
        "$nin" => !value.is_some_and(|v| in_set(v, operand)),
        "$exists" => value.is_some() == truthy(operand),
        _ => false,
    }
}

fn in_set(v: &Bson, set: &Bson) -> bool {
    set.as_array().is_some_and(|xs| xs.iter().any(|x| equals(v, x)))
}

fn truthy(v: &Bson) -> bool {
    match v {
        Bson::Boolean(b) => *b,
        Bson::Null => false,
        other => as_f64(other).is_none_or(|f| f != 0.0),
    }
}

fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.split('.').count() > MAX_PATH_DEPTH {
        return None;
    }
    let mut parts = path.split('.').peekable();
    let mut cur = doc;
    while let Some(part) = parts.next() {
        let v = cur.get(part)?;
        if parts.peek().is_none() {
            return Some(v);
        }
        cur = v.as_document()?;
    }
    None
}

fn as_f64(x: &Bson) -> Option<f64> {
    match x {
        Bson::Int32(i) => Some(f64::from(*i)),
        #[allow(clippy::cast_precision_loss)]
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

/// Range operators only compare within the same type class, as the server does.
fn comparable(a: &Bson, b: &Bson) -> bool {
    type_rank(a) == type_rank(b)
}

fn equals(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Total order over BSON values: numbers compare by value across integer and double,
/// otherwise by type rank first.
#[must_use]
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.total_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

// Server sort order of the BSON types.
fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::DbPointer(_) | Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => 12,
        Bson::MaxKey => 255,
    }
}

/// Compare two records on one sort key. Missing fields sort like null.
#[must_use]
pub fn compare_docs(a: &Document, b: &Document, sort: &SortSpec) -> Ordering {
    let ord = match (get_path(a, &sort.field), get_path(b, &sort.field)) {
        (Some(x), Some(y)) => compare_bson(x, y),
        (Some(x), None) => compare_bson(x, &Bson::Null),
        (None, Some(y)) => compare_bson(&Bson::Null, y),
        (None, None) => Ordering::Equal,
    };
    match sort.order {
        Order::Asc => ord,
        Order::Desc => ord.reverse(),
    }
}

#[must_use]
pub fn is_sorted_by(docs: &[Document], sort: &SortSpec) -> bool {
    docs.windows(2).all(|w| compare_docs(&w[0], &w[1], sort) != Ordering::Greater)
}
