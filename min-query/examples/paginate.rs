//! Walk a collection page by page, printing each page and its cursor.
//!
//! Run with: RUST_LOG=min_query=debug cargo run -p min-query --features memory --example paginate

use anyhow::Result;
use bson::doc;
use min_query::prelude::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct User {
    #[serde(rename = "_id")]
    id: i32,
    name: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("min_query=info".parse()?),
        )
        .with_target(true)
        .init();

    let mut db = MemoryDatabase::new();
    let names = ["Aaron", "Alice", "Alice", "Chloe", "Dakota", "Ed", "Fae", "Glan"];
    for (i, name) in names.iter().enumerate() {
        let id = i32::try_from(i)? + 1;
        let country = if i == 0 { "UK" } else { "US" };
        db.insert("users", doc! { "_id": id, "name": *name, "country": country });
    }
    let index = db.create_index("users", doc! { "name": 1, "_id": 1 });

    let mut query = MinQuery::with_hint(&db, "users", doc! { "country": "US" }, index.as_str());
    query.sort(&["name", "_id"]).limit(3);

    let mut users: Vec<User> = Vec::new();
    for page in 1.. {
        let info = query.all(&mut users, &["name", "_id"])?;
        println!("page {page}: {} user(s), has_more={}", users.len(), info.has_more);
        for user in &users {
            println!("  {:>2} {}", user.id, user.name);
        }
        println!("  next cursor: {}", info.cursor().unwrap_or("-"));

        match info.cursor() {
            Some(next) if info.has_more => query.cursor(next),
            _ => break,
        };
    }

    Ok(())
}
