//! BSON value comparison in server sort order.

use std::cmp::Ordering;

use bson::{Bson, Document};

use crate::path;

/// Rank of a value's type in cross-type comparisons.
///
/// All numeric types share one rank, as do strings and symbols.
pub(super) const fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Double(_) | Bson::Int32(_) | Bson::Int64(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::DbPointer(_) => 12,
        Bson::JavaScriptCode(_) => 13,
        Bson::JavaScriptCodeWithScope(_) => 14,
        Bson::MaxKey => 15,
    }
}

/// Compare two values the way the server orders them in indexes and sorts.
pub(super) fn compare(left: &Bson, right: &Bson) -> Ordering {
    let rank = type_rank(left).cmp(&type_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    match (left, right) {
        (Bson::Int32(a), Bson::Int32(b)) => a.cmp(b),
        (Bson::Int64(a), Bson::Int64(b)) => a.cmp(b),
        (Bson::Int32(a), Bson::Int64(b)) => i64::from(*a).cmp(b),
        (Bson::Int64(a), Bson::Int32(b)) => a.cmp(&i64::from(*b)),
        (Bson::Decimal128(a), Bson::Decimal128(b)) => a.bytes().cmp(&b.bytes()),
        (a, b) if type_rank(a) == 2 => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
        (a, b) if type_rank(a) == 3 => string_value(a).cmp(string_value(b)),
        (Bson::Document(a), Bson::Document(b)) => compare_documents(a, b),
        (Bson::Array(a), Bson::Array(b)) => compare_sequences(a, b),
        (Bson::Binary(a), Bson::Binary(b)) => a
            .bytes
            .len()
            .cmp(&b.bytes.len())
            .then_with(|| u8::from(a.subtype).cmp(&u8::from(b.subtype)))
            .then_with(|| a.bytes.cmp(&b.bytes)),
        (Bson::ObjectId(a), Bson::ObjectId(b)) => a.bytes().cmp(&b.bytes()),
        (Bson::Boolean(a), Bson::Boolean(b)) => a.cmp(b),
        (Bson::DateTime(a), Bson::DateTime(b)) => a.cmp(b),
        (Bson::Timestamp(a), Bson::Timestamp(b)) => {
            (a.time, a.increment).cmp(&(b.time, b.increment))
        }
        (Bson::RegularExpression(a), Bson::RegularExpression(b)) => {
            (&a.pattern, &a.options).cmp(&(&b.pattern, &b.options))
        }
        (Bson::JavaScriptCode(a), Bson::JavaScriptCode(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        #[allow(clippy::cast_precision_loss)]
        Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}

fn string_value(value: &Bson) -> &str {
    match value {
        Bson::String(s) | Bson::Symbol(s) => s,
        _ => "",
    }
}

fn compare_documents(left: &Document, right: &Document) -> Ordering {
    let mut rhs = right.iter();
    for (lkey, lvalue) in left {
        let Some((rkey, rvalue)) = rhs.next() else {
            return Ordering::Greater;
        };
        let ord = type_rank(lvalue)
            .cmp(&type_rank(rvalue))
            .then_with(|| lkey.cmp(rkey))
            .then_with(|| compare(lvalue, rvalue));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    if rhs.next().is_some() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

fn compare_sequences(left: &[Bson], right: &[Bson]) -> Ordering {
    left.iter()
        .zip(right)
        .map(|(a, b)| compare(a, b))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or_else(|| left.len().cmp(&right.len()))
}

/// Compare two documents by a key pattern such as `{ "name": 1, "_id": -1 }`.
///
/// Missing fields compare as `null`.
pub(super) fn compare_by_pattern(
    left: &Document,
    right: &Document,
    pattern: &[(String, i64)],
) -> Ordering {
    for (field, dir) in pattern {
        let a = path::lookup(left, field).unwrap_or(&Bson::Null);
        let b = path::lookup(right, field).unwrap_or(&Bson::Null);
        let ord = compare(a, b);
        let ord = if *dir < 0 { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Compare a document's key against a bound expressed in key-pattern order.
///
/// `bound` holds one value per pattern field, in pattern order.
pub(super) fn compare_to_bound(
    doc: &Document,
    bound: &[&Bson],
    pattern: &[(String, i64)],
) -> Ordering {
    for ((field, dir), limit) in pattern.iter().zip(bound) {
        let value = path::lookup(doc, field).unwrap_or(&Bson::Null);
        let ord = compare(value, limit);
        let ord = if *dir < 0 { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
