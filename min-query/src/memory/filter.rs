//! Query filter matching.

use std::cmp::Ordering;

use bson::{Bson, Document};

use super::order::{compare, type_rank};
use super::{bad_value, failed_to_parse};
use crate::error::CommandError;
use crate::path;

/// Returns `true` if `doc` satisfies `filter`.
pub(super) fn matches(doc: &Document, filter: &Document) -> Result<bool, CommandError> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => all_match(doc, &clauses(key, condition)?)?,
            "$or" => any_match(doc, &clauses(key, condition)?)?,
            "$nor" => !any_match(doc, &clauses(key, condition)?)?,
            op if op.starts_with('$') => {
                return Err(bad_value(format!("unknown top level operator: {op}")));
            }
            field => field_matches(path::lookup(doc, field), condition)?,
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn all_match(doc: &Document, clauses: &[&Document]) -> Result<bool, CommandError> {
    for clause in clauses {
        if !matches(doc, clause)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_match(doc: &Document, clauses: &[&Document]) -> Result<bool, CommandError> {
    for clause in clauses {
        if matches(doc, clause)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn clauses<'a>(op: &str, condition: &'a Bson) -> Result<Vec<&'a Document>, CommandError> {
    let Bson::Array(items) = condition else {
        return Err(failed_to_parse(format!("{op} must be an array")));
    };
    if items.is_empty() {
        return Err(bad_value(format!("{op} argument must be a non-empty array")));
    }
    items
        .iter()
        .map(|item| match item {
            Bson::Document(clause) => Ok(clause),
            _ => Err(bad_value(format!("{op} argument's entries must be objects"))),
        })
        .collect()
}

/// An operator document is one whose first key starts with `$`.
fn operators(condition: &Bson) -> Option<&Document> {
    match condition {
        Bson::Document(ops) if ops.keys().next().is_some_and(|k| k.starts_with('$')) => Some(ops),
        _ => None,
    }
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> Result<bool, CommandError> {
    let Some(ops) = operators(condition) else {
        return Ok(equals(value, condition));
    };

    for (op, operand) in ops {
        let matched = match op.as_str() {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$gt" => ordered(value, operand, Ordering::is_gt),
            "$gte" => ordered(value, operand, Ordering::is_ge),
            "$lt" => ordered(value, operand, Ordering::is_lt),
            "$lte" => ordered(value, operand, Ordering::is_le),
            "$in" => set(op, operand)?.iter().any(|item| equals(value, item)),
            "$nin" => !set(op, operand)?.iter().any(|item| equals(value, item)),
            "$exists" => value.is_some() == truthy(operand),
            other => return Err(bad_value(format!("unknown operator: {other}"))),
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn set<'a>(op: &str, operand: &'a Bson) -> Result<&'a [Bson], CommandError> {
    match operand {
        Bson::Array(items) => Ok(items),
        _ => Err(bad_value(format!("{op} needs an array"))),
    }
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(v) => *v != 0,
        Bson::Int64(v) => *v != 0,
        Bson::Double(v) => *v != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

/// Equality with array membership: `{tags: "a"}` matches `tags: ["a", "b"]`.
/// A missing field equals `null`.
fn equals(value: Option<&Bson>, operand: &Bson) -> bool {
    let value = value.unwrap_or(&Bson::Null);
    if compare(value, operand) == Ordering::Equal {
        return true;
    }
    match value {
        Bson::Array(items) => items.iter().any(|item| compare(item, operand) == Ordering::Equal),
        _ => false,
    }
}

/// Range comparison, only between values of the same type bracket.
fn ordered(value: Option<&Bson>, operand: &Bson, accept: fn(Ordering) -> bool) -> bool {
    let check = |v: &Bson| type_rank(v) == type_rank(operand) && accept(compare(v, operand));

    match value {
        None => matches!(operand, Bson::Null) && accept(Ordering::Equal),
        Some(Bson::Array(items)) if !matches!(operand, Bson::Array(_)) => items.iter().any(check),
        Some(v) => check(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn user() -> Document {
        doc! {
            "_id": 4,
            "name": "Ed",
            "country": "US",
            "age": 31,
            "tags": ["admin", "ops"],
            "boss": { "name": "Fae" },
        }
    }

    fn check(filter: Document) -> bool {
        matches(&user(), &filter).unwrap()
    }

    #[test]
    fn test_equality() {
        assert!(check(doc! {}));
        assert!(check(doc! { "country": "US" }));
        assert!(check(doc! { "country": "US", "name": "Ed" }));
        assert!(!check(doc! { "country": "US", "name": "Fae" }));
        assert!(check(doc! { "age": 31.0 }));
        assert!(check(doc! { "boss.name": "Fae" }));
        assert!(check(doc! { "tags": "ops" }));
        assert!(check(doc! { "missing": null }));
    }

    #[test]
    fn test_comparison_operators() {
        assert!(check(doc! { "age": { "$gt": 30 } }));
        assert!(check(doc! { "age": { "$gte": 31, "$lte": 31 } }));
        assert!(!check(doc! { "age": { "$lt": 31 } }));
        assert!(check(doc! { "name": { "$gte": "A", "$lt": "F" } }));
        assert!(check(doc! { "name": { "$ne": "Fae" } }));
        assert!(!check(doc! { "name": { "$eq": "Fae" } }));
        // No cross-type matches
        assert!(!check(doc! { "name": { "$gt": 5 } }));
        assert!(!check(doc! { "missing": { "$gt": 0 } }));
    }

    #[test]
    fn test_set_operators() {
        assert!(check(doc! { "country": { "$in": ["US", "CA"] } }));
        assert!(!check(doc! { "country": { "$nin": ["US", "CA"] } }));
        assert!(check(doc! { "tags": { "$in": ["ops"] } }));
        assert!(check(doc! { "missing": { "$nin": ["x"] } }));
    }

    #[test]
    fn test_exists() {
        assert!(check(doc! { "name": { "$exists": true } }));
        assert!(check(doc! { "missing": { "$exists": false } }));
        assert!(!check(doc! { "boss.name": { "$exists": 0 } }));
    }

    #[test]
    fn test_logical_operators() {
        assert!(check(doc! { "$or": [{ "name": "Fae" }, { "age": 31 }] }));
        assert!(!check(doc! { "$and": [{ "name": "Ed" }, { "age": 30 }] }));
        assert!(check(doc! { "$nor": [{ "name": "Fae" }] }));
    }

    #[test]
    fn test_unknown_operator_is_bad_value() {
        let err = matches(&user(), &doc! { "age": { "$near": 3 } }).unwrap_err();
        assert_eq!(err.code, Some(2));

        let err = matches(&user(), &doc! { "$where": "true" }).unwrap_err();
        assert!(err.message.contains("$where"));

        let err = matches(&user(), &doc! { "$or": [] }).unwrap_err();
        assert_eq!(err.code_name.as_deref(), Some("BadValue"));
    }
}
