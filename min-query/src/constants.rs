//! Centralized limits and configuration for the min-query crate.
//!
//! # Environment Variables
//!
//! | Variable                   | Default      | Description                          |
//! |----------------------------|--------------|--------------------------------------|
//! | `MINQUERY_MAX_CURSOR_SIZE` | unlimited    | Longest cursor token the default codec encodes or decodes |
//!
//! ```bash
//! # Cap cursor tokens at 4KB
//! MINQUERY_MAX_CURSOR_SIZE=4096
//! ```

use std::sync::OnceLock;

// ============================================================================
// CURSOR LIMITS
// ============================================================================

/// Environment variable capping the default codec's token length.
pub const MAX_CURSOR_SIZE_ENV: &str = "MINQUERY_MAX_CURSOR_SIZE";

static MAX_CURSOR_SIZE_CACHE: OnceLock<Option<usize>> = OnceLock::new();

/// Returns the maximum cursor token length of the default codec.
///
/// Reads `MINQUERY_MAX_CURSOR_SIZE` on first call and caches the result for
/// the lifetime of the process. `None` (no limit) if unset, unparsable or zero.
#[inline]
pub fn max_cursor_size() -> Option<usize> {
    *MAX_CURSOR_SIZE_CACHE
        .get_or_init(|| parse_max_cursor_size(std::env::var(MAX_CURSOR_SIZE_ENV).ok()))
}

fn parse_max_cursor_size(raw: Option<String>) -> Option<usize> {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
}

// ============================================================================
// FIND COMMAND
// ============================================================================

/// Number of documents skipped past the seek boundary.
///
/// The boundary itself is the last document of the previous page.
pub const SEEK_SKIP: i64 = 1;

/// Extra documents requested beyond the page size to detect a next page.
pub const LOOK_AHEAD: i64 = 1;

// ============================================================================
// SERVER ERROR CODES
// ============================================================================

/// `BadValue`: malformed command argument.
pub const CODE_BAD_VALUE: i32 = 2;

/// `FailedToParse`: argument of the wrong BSON type.
pub const CODE_FAILED_TO_PARSE: i32 = 9;

/// `CommandNotFound`: unknown command name.
pub const CODE_COMMAND_NOT_FOUND: i32 = 59;

/// Projection mixes inclusion and exclusion.
pub const CODE_PROJECTION_MIX: i32 = 31254;

/// `min` does not match the key pattern of the index in use.
pub const CODE_MIN_PATTERN_MISMATCH: i32 = 51174;
