//! Inclusion and exclusion projections.

use bson::{Bson, Document};

use crate::constants::CODE_PROJECTION_MIX;
use crate::error::CommandError;

/// A parsed projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Projection {
    /// Keep only these paths (plus `_id` unless excluded).
    Include(Vec<String>),
    /// Drop these paths.
    Exclude(Vec<String>),
}

impl Projection {
    pub(super) fn parse(spec: &Document) -> Result<Self, CommandError> {
        let mut include: Vec<String> = Vec::new();
        let mut exclude: Vec<String> = Vec::new();
        let mut keep_id = true;

        for (field, value) in spec {
            let on = match value {
                Bson::Boolean(b) => *b,
                Bson::Int32(v) => *v != 0,
                Bson::Int64(v) => *v != 0,
                Bson::Double(v) => *v != 0.0,
                other => {
                    return Err(super::bad_value(format!(
                        "unsupported projection value for {field}: {other}"
                    )));
                }
            };

            if field == "_id" {
                keep_id = on;
                continue;
            }
            if on {
                if let Some(excluded) = exclude.first() {
                    return Err(mixed("inclusion", field, "exclusion", excluded));
                }
                include.push(field.clone());
            } else {
                if let Some(included) = include.first() {
                    return Err(mixed("exclusion", field, "inclusion", included));
                }
                exclude.push(field.clone());
            }
        }

        if !include.is_empty() || (keep_id && spec.contains_key("_id")) {
            if keep_id {
                include.insert(0, "_id".to_string());
            }
            Ok(Self::Include(include))
        } else {
            if !keep_id {
                exclude.push("_id".to_string());
            }
            Ok(Self::Exclude(exclude))
        }
    }

    pub(super) fn apply(&self, doc: &Document) -> Document {
        match self {
            Self::Include(paths) => include(doc, &as_strs(paths)),
            Self::Exclude(paths) => exclude(doc, &as_strs(paths)),
        }
    }
}

fn mixed(kind: &str, field: &str, other: &str, seen: &str) -> CommandError {
    CommandError::new(format!(
        "Cannot do {kind} on field {field} in {other} projection (already saw {seen})"
    ))
    .with_code(CODE_PROJECTION_MIX)
    .with_code_name(format!("Location{CODE_PROJECTION_MIX}"))
}

fn as_strs(paths: &[String]) -> Vec<&str> {
    paths.iter().map(String::as_str).collect()
}

/// Paths below `key`, with the `key.` prefix removed.
fn below<'a>(paths: &[&'a str], key: &str) -> Vec<&'a str> {
    paths
        .iter()
        .filter_map(|path| path.strip_prefix(key)?.strip_prefix('.'))
        .collect()
}

fn include(doc: &Document, paths: &[&str]) -> Document {
    let mut out = Document::new();
    for (key, value) in doc {
        if paths.contains(&key.as_str()) {
            out.insert(key, value.clone());
            continue;
        }
        let nested = below(paths, key);
        if nested.is_empty() {
            continue;
        }
        match value {
            Bson::Document(inner) => {
                out.insert(key, include(inner, &nested));
            }
            Bson::Array(items) => {
                let kept: Vec<Bson> = items
                    .iter()
                    .filter_map(|item| match item {
                        Bson::Document(inner) => Some(Bson::Document(include(inner, &nested))),
                        _ => None,
                    })
                    .collect();
                out.insert(key, kept);
            }
            _ => {}
        }
    }
    out
}

fn exclude(doc: &Document, paths: &[&str]) -> Document {
    let mut out = Document::new();
    for (key, value) in doc {
        if paths.contains(&key.as_str()) {
            continue;
        }
        let nested = below(paths, key);
        match value {
            Bson::Document(inner) if !nested.is_empty() => {
                out.insert(key, exclude(inner, &nested));
            }
            _ => {
                out.insert(key, value.clone());
            }
        }
    }
    out
}
