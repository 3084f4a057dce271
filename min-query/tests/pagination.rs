//! End-to-end pagination against the in-memory database.
//!
//! These tests walk whole result sets page by page and check page
//! boundaries, continuation flags and cursor stability.
//!
//! Needs the `memory` feature: `cargo test -p min-query --features memory`.

use bson::{Bson, Document, doc};
use min_query::memory::MemoryDatabase;
use min_query::{
    Base64Codec, CursorCodec, CursorError, HexCodec, IndexEntry, MinQuery, QueryError, SignedCodec,
};
use serde::{Deserialize, Serialize};

const CURSOR_FIELDS: [&str; 2] = ["name", "_id"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    #[serde(rename = "_id")]
    id: i32,
    name: String,
    country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Boss {
    name: String,
    country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Company {
    #[serde(rename = "_id")]
    id: i32,
    name: String,
    boss: Boss,
    subsidiaries: Vec<String>,
}

fn user(id: i32, name: &str, country: &str) -> User {
    User {
        id,
        name: name.to_string(),
        country: country.to_string(),
    }
}

/// Eight users, seven of them in the US, already in `(name, _id)` order.
fn users() -> Vec<User> {
    vec![
        user(1, "Aaron", "UK"),
        user(2, "Alice", "US"),
        user(3, "Alice", "US"),
        user(4, "Chloe", "US"),
        user(5, "Dakota", "US"),
        user(6, "Ed", "US"),
        user(7, "Fae", "US"),
        user(8, "Glan", "US"),
    ]
}

fn seeded_users() -> MemoryDatabase {
    let mut db = MemoryDatabase::new();
    // Reverse insertion order so results cannot come back in natural order
    for u in users().iter().rev() {
        db.insert("users", bson::to_document(u).unwrap());
    }
    db.create_index("users", doc! { "name": 1, "_id": 1 });
    db.create_index("users", doc! { "name": 1, "_id": -1 });
    db
}

fn companies() -> Vec<Company> {
    let company = |id: i32, name: &str, boss: &str, country: &str, subs: [&str; 2]| Company {
        id,
        name: name.to_string(),
        boss: Boss {
            name: boss.to_string(),
            country: country.to_string(),
        },
        subsidiaries: subs.iter().map(|s| (*s).to_string()).collect(),
    };
    vec![
        company(10, "amazon", "Dakota", "US", ["ama", "zon"]),
        company(11, "apple", "Fae", "US", ["app", "le"]),
        company(12, "facebook", "Chloe", "UK", ["face", "book"]),
        company(13, "google", "Aaron", "UK", ["goo", "gle"]),
        company(14, "honer", "Ed", "US", ["hon", "er"]),
        company(15, "videos", "Glan", "US", ["video", "s"]),
        company(16, "zMind", "len", "US", ["zm", "ind"]),
    ]
}

fn seeded_companies() -> MemoryDatabase {
    let mut db = MemoryDatabase::new();
    for c in companies().iter().rev() {
        db.insert("company", bson::to_document(c).unwrap());
    }
    db
}

/// Drain a query page by page, returning every page.
fn drain<T>(query: &mut MinQuery<'_, MemoryDatabase>, fields: &[&str]) -> Vec<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    let mut pages = Vec::new();
    loop {
        let mut page = Vec::new();
        let info = query.all(&mut page, fields).unwrap();
        let done = !info.has_more;
        pages.push(page);
        if done {
            return pages;
        }
        query.cursor(&info.next_cursor);
    }
}

#[test]
fn test_us_users_in_pages_of_three() {
    let db = seeded_users();
    let all = users();
    let mut query = MinQuery::with_hint(
        &db,
        "users",
        doc! { "country": "US" },
        doc! { "name": 1, "_id": 1 },
    );
    query.sort(&["name", "_id"]).limit(3);

    let mut result: Vec<User> = Vec::new();

    let info = query.all(&mut result, &CURSOR_FIELDS).unwrap();
    assert_eq!(result, all[1..4]);
    assert!(info.has_more);

    let info = query.cursor(&info.next_cursor).all(&mut result, &CURSOR_FIELDS).unwrap();
    assert_eq!(result, all[4..7]);
    assert!(info.has_more);

    let info = query.cursor(&info.next_cursor).all(&mut result, &CURSOR_FIELDS).unwrap();
    assert_eq!(result, all[7..]);
    assert!(!info.has_more);

    // Exhausted: empty page, same token, as often as asked
    let last = info.next_cursor;
    for _ in 0..2 {
        let info = query.cursor(&last).all(&mut result, &CURSOR_FIELDS).unwrap();
        assert!(result.is_empty());
        assert!(info.is_empty());
        assert!(!info.has_more);
        assert_eq!(info.next_cursor, last);
    }
}

#[test]
fn test_cursor_holds_last_visible_document() {
    let db = seeded_users();
    let mut query = MinQuery::new(&db, "users", doc! { "country": "US" });
    query.sort(&["name", "_id"]).limit(3);

    let mut result: Vec<User> = Vec::new();
    let info = query.all(&mut result, &CURSOR_FIELDS).unwrap();

    let entry = Base64Codec::default().decode(&info.next_cursor).unwrap();
    assert_eq!(entry.keys().collect::<Vec<_>>(), vec!["name", "_id"]);
    assert_eq!(entry, doc! { "name": "Chloe", "_id": 4 });
}

#[test]
fn test_exact_limit_reports_no_more() {
    let db = seeded_users();
    let mut query = MinQuery::new(&db, "users", doc! { "country": "US", "_id": { "$lte": 7 } });
    query.sort(&["name", "_id"]).limit(3);

    // Six matches: two full pages, the second one exactly at the limit
    let pages: Vec<Vec<User>> = drain(&mut query, &CURSOR_FIELDS);
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1].len(), 3);

    let ids: Vec<i32> = pages.concat().iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![2, 3, 4, 5, 6, 7]);
}

#[test]
fn test_projection_descending_id() {
    let db = seeded_users();
    let mut query = MinQuery::with_hint(
        &db,
        "users",
        doc! { "country": "US" },
        doc! { "name": 1, "_id": -1 },
    );
    query
        .sort(&["+name", "-_id", ""])
        .select(doc! { "name": 1, "_id": 1 })
        .limit(2);

    let mut result: Vec<Document> = Vec::new();
    let info = query.all(&mut result, &CURSOR_FIELDS).unwrap();
    assert_eq!(
        result,
        vec![
            doc! { "_id": 3, "name": "Alice" },
            doc! { "_id": 2, "name": "Alice" },
        ]
    );
    assert!(info.has_more);

    let info = query.cursor(&info.next_cursor).all(&mut result, &CURSOR_FIELDS).unwrap();
    assert_eq!(
        result,
        vec![
            doc! { "_id": 4, "name": "Chloe" },
            doc! { "_id": 5, "name": "Dakota" },
        ]
    );
    assert!(info.has_more);
}

#[test]
fn test_hex_codec_tokens() {
    let db = seeded_users();
    let mut query = MinQuery::new(&db, "users", doc! { "country": "US" });
    query
        .sort(&["+name", "-_id"])
        .select(doc! { "name": 1, "_id": 1 })
        .limit(2)
        .codec(HexCodec);

    let mut result: Vec<Document> = Vec::new();
    let info = query.all(&mut result, &CURSOR_FIELDS).unwrap();
    assert_eq!(result.len(), 2);
    assert!(info.next_cursor.bytes().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(
        HexCodec.decode(&info.next_cursor).unwrap(),
        doc! { "name": "Alice", "_id": 2 }
    );

    // Tokens from one codec mean nothing to another
    let mut base64 = query.clone();
    base64.codec(Base64Codec::default()).cursor(&info.next_cursor);
    let err = base64.all(&mut result, &CURSOR_FIELDS).unwrap_err();
    assert!(err.is_cursor_error());
}

#[test]
fn test_invalid_cursor_reported_on_execute() {
    let db = seeded_users();
    let mut query = MinQuery::new(&db, "users", doc! {});

    let mut result: Vec<Document> = Vec::new();
    let err = query.cursor("(INVALID)").all(&mut result, &CURSOR_FIELDS).unwrap_err();
    assert!(err.is_cursor_error());
    assert!(matches!(err, QueryError::CursorDecoding(CursorError::InvalidEncoding)));

    let err = query
        .cursor("ValidBase64ButNotACursor")
        .all(&mut result, &CURSOR_FIELDS)
        .unwrap_err();
    assert!(matches!(err, QueryError::CursorDecoding(CursorError::InvalidDocument(_))));

    query.cursor("");
    assert_eq!(query.all(&mut result, &CURSOR_FIELDS).unwrap().count, 8);
}

#[test]
fn test_signed_cursor_rejects_other_keys() {
    let db = seeded_users();
    let mut query = MinQuery::new(&db, "users", doc! {});
    query
        .sort(&["name", "_id"])
        .limit(4)
        .codec(SignedCodec::new(Base64Codec::default(), b"server-key"));

    let mut result: Vec<User> = Vec::new();
    let info = query.all(&mut result, &CURSOR_FIELDS).unwrap();

    let mut other = query.clone();
    other.codec(SignedCodec::new(Base64Codec::default(), b"other-key"));
    let err = other.cursor(&info.next_cursor).all(&mut result, &CURSOR_FIELDS).unwrap_err();
    assert!(matches!(err, QueryError::CursorDecoding(CursorError::InvalidSignature)));

    let info = query.cursor(&info.next_cursor).all(&mut result, &CURSOR_FIELDS).unwrap();
    assert_eq!(result.len(), 4);
    assert!(!info.has_more);
}

#[test]
fn test_command_failure_leaves_results() {
    let db = seeded_users();
    let mut query = MinQuery::new(&db, "users", doc! {});
    query.select(doc! { "name": 1, "country": 0 });

    let mut result = vec![user(99, "Zed", "NZ")];
    let err = query.all(&mut result, &CURSOR_FIELDS).unwrap_err();
    assert!(err.is_command_error());
    match &err {
        QueryError::Command(cause) => {
            assert_eq!(cause.code, Some(min_query::constants::CODE_PROJECTION_MIX));
        }
        other => panic!("expected command error, got {other:?}"),
    }
    assert_eq!(result, vec![user(99, "Zed", "NZ")]);

    query.select(None);
    assert!(query.all(&mut result, &CURSOR_FIELDS).is_ok());
}

#[test]
fn test_cursor_encoding_failure() {
    #[derive(Debug)]
    struct Unavailable;

    impl CursorCodec for Unavailable {
        fn encode(&self, _entry: &IndexEntry) -> Result<String, CursorError> {
            Err(CursorError::Custom("key service unavailable".to_string()))
        }

        fn decode(&self, token: &str) -> Result<IndexEntry, CursorError> {
            HexCodec.decode(token)
        }
    }

    let db = seeded_users();
    let mut query = MinQuery::new(&db, "users", doc! { "country": "US" });
    query.sort(&["name", "_id"]).limit(2).codec(Unavailable);

    let mut result: Vec<User> = Vec::new();
    let err = query.all(&mut result, &CURSOR_FIELDS).unwrap_err();
    assert!(matches!(err, QueryError::CursorEncoding(_)));
    assert!(err.to_string().contains("key service unavailable"));
    // The page itself was decoded before the cursor failed
    assert_eq!(result.len(), 2);
}

#[test]
fn test_result_decoding_failure() {
    #[derive(Debug, Deserialize)]
    struct NumericName {
        #[allow(dead_code)]
        name: i64,
    }

    let db = seeded_users();
    let query = MinQuery::new(&db, "users", doc! {});

    let mut result: Vec<NumericName> = Vec::new();
    let err = query.all(&mut result, &CURSOR_FIELDS).unwrap_err();
    assert!(err.is_decode_error());
    assert!(result.is_empty());
}

#[test]
fn test_projection_without_cursor_field_stores_null() {
    let db = seeded_users();
    let mut query = MinQuery::new(&db, "users", doc! {});
    query
        .sort(&["name", "_id"])
        .select(doc! { "name": 1, "_id": 0 })
        .limit(2);

    let mut result: Vec<Document> = Vec::new();
    let info = query.all(&mut result, &CURSOR_FIELDS).unwrap();
    assert_eq!(result[1], doc! { "name": "Alice" });

    let entry = Base64Codec::default().decode(&info.next_cursor).unwrap();
    assert_eq!(entry, doc! { "name": "Alice", "_id": Bson::Null });
}

#[test]
fn test_unbounded_query_returns_everything() {
    let db = seeded_users();
    let mut query = MinQuery::new(&db, "users", doc! { "country": "US" });
    query.sort(&["name", "_id"]);

    let mut result: Vec<User> = Vec::new();
    let info = query.all(&mut result, &CURSOR_FIELDS).unwrap();
    assert_eq!(result, users()[1..]);
    assert!(!info.has_more);
    assert_eq!(
        Base64Codec::default().decode(&info.next_cursor).unwrap(),
        doc! { "name": "Glan", "_id": 8 }
    );

    // Without a limit the seek starts at the boundary itself
    let info = query.cursor(&info.next_cursor).all(&mut result, &CURSOR_FIELDS).unwrap();
    assert_eq!(result, users()[7..]);
    assert!(!info.has_more);
}

#[test]
fn test_paginate_past_long_cursor() {
    let mut db = MemoryDatabase::new();
    for id in 1..=3 {
        let name = format!("{}{id}", "x".repeat(3200));
        db.insert("users", doc! { "_id": id, "name": name, "country": "US" });
    }
    let mut query = MinQuery::new(&db, "users", doc! {});
    query.sort(&["name", "_id"]).limit(1);

    let mut result: Vec<User> = Vec::new();
    let info = query.all(&mut result, &CURSOR_FIELDS).unwrap();
    assert!(info.next_cursor.len() > 4096);
    assert!(info.has_more);

    let pages: Vec<Vec<User>> = drain(query.cursor(&info.next_cursor), &CURSOR_FIELDS);
    let ids: Vec<i32> = pages.concat().iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_size_limited_codec_fails_on_encode() {
    let db = seeded_users();
    let mut query = MinQuery::new(&db, "users", doc! {});
    query
        .sort(&["name", "_id"])
        .limit(2)
        .codec(Base64Codec::with_max_size(8));

    let mut result: Vec<User> = Vec::new();
    let err = query.all(&mut result, &CURSOR_FIELDS).unwrap_err();
    assert!(matches!(err, QueryError::CursorEncoding(CursorError::TooLarge { max: 8, .. })));
    assert_eq!(result.len(), 2);
}

#[test]
fn test_cursor_on_embedded_document() {
    let db = seeded_companies();
    let mut query = MinQuery::new(&db, "company", doc! {});
    query.sort(&["name", "boss"]).limit(3);

    let pages: Vec<Vec<Company>> = drain(&mut query, &["name", "boss"]);
    let all = companies();
    assert_eq!(pages, vec![all[0..3].to_vec(), all[3..6].to_vec(), all[6..].to_vec()]);
}

#[test]
fn test_cursor_on_embedded_field() {
    let db = seeded_companies();
    let mut query = MinQuery::new(&db, "company", doc! {});
    query.sort(&["name", "boss.name"]).limit(3);

    let pages: Vec<Vec<Company>> = drain(&mut query, &["name", "boss.name"]);
    let all = companies();
    assert_eq!(pages, vec![all[0..3].to_vec(), all[3..6].to_vec(), all[6..].to_vec()]);
}

#[test]
fn test_cursor_on_array_member() {
    let mut db = seeded_companies();
    db.create_index("company", doc! { "subsidiaries.0": 1 });

    let mut query = MinQuery::with_hint(&db, "company", doc! {}, "subsidiaries.0_1");
    query.sort(&["subsidiaries.0"]).limit(3);

    let mut result: Vec<Company> = Vec::new();
    let info = query.all(&mut result, &["subsidiaries.0"]).unwrap();
    let firsts: Vec<&str> = result.iter().map(|c| c.subsidiaries[0].as_str()).collect();
    assert_eq!(firsts, vec!["ama", "app", "face"]);

    let entry = Base64Codec::default().decode(&info.next_cursor).unwrap();
    assert_eq!(entry, doc! { "subsidiaries.0": "face" });

    let info = query.cursor(&info.next_cursor).all(&mut result, &["subsidiaries.0"]).unwrap();
    let firsts: Vec<&str> = result.iter().map(|c| c.subsidiaries[0].as_str()).collect();
    assert_eq!(firsts, vec!["goo", "hon", "video"]);
    assert!(info.has_more);
}

#[test]
fn test_pages_partition_result_set() {
    let names = ["Bo", "Al", "Cy", "Al", "Bo", "Di", "Al", "Ed", "Cy", "Bo"];

    for n in 0..=names.len() {
        let mut db = MemoryDatabase::new();
        for (id, name) in names.iter().take(n).enumerate() {
            db.insert("people", doc! { "_id": id as i32, "name": *name });
        }

        let mut expected: Vec<(String, i32)> = names
            .iter()
            .take(n)
            .enumerate()
            .map(|(id, name)| ((*name).to_string(), id as i32))
            .collect();
        expected.sort();

        for limit in 1..=4_usize {
            let mut query = MinQuery::new(&db, "people", doc! {});
            query.sort(&["name", "_id"]).limit(limit as i64);

            let pages: Vec<Vec<Document>> = drain(&mut query, &CURSOR_FIELDS);
            let seen: Vec<(String, i32)> = pages
                .iter()
                .flatten()
                .map(|d| (d.get_str("name").unwrap().to_string(), d.get_i32("_id").unwrap()))
                .collect();
            assert_eq!(seen, expected, "n={n} limit={limit}");

            for (i, page) in pages.iter().enumerate() {
                let is_last = i + 1 == pages.len();
                if is_last {
                    assert!(page.len() <= limit, "n={n} limit={limit}");
                } else {
                    assert_eq!(page.len(), limit, "n={n} limit={limit}");
                }
            }
        }
    }
}
