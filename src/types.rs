//! Core domain types for the full-text pipeline.
//!
//! Rows, owner references, and the two pagination strategies shared by the
//! query builder, the row sources, and the result assembler.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// ASCII word characters only, anchored at both ends.
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?-u:\w)+$").expect("word pattern is valid"));

/// True when `s` is non-empty and made only of `[A-Za-z0-9_]`.
///
/// This is the single gate for anything that ends up as a structural SQL
/// fragment (table names) or as an owner type name.
pub fn is_word(s: &str) -> bool {
    WORD_RE.is_match(s)
}

/// Canonicalize a type name the way owner types are stored: `blog_post`
/// becomes `BlogPost`, `BlogPost` stays as is.
///
/// A leading lowercase run is capitalized; every run of ASCII letters and
/// digits after an underscore is capitalized with the rest lowercased, so
/// `blog_POST` is `BlogPost`. Underscores are dropped.
pub fn canonical_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segments = name.split('_');
    if let Some(first) = segments.next() {
        let run = first
            .bytes()
            .take_while(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
            .count();
        out.push_str(&capitalize(&first[..run]));
        out.push_str(&first[run..]);
    }
    for segment in segments {
        let run = segment.bytes().take_while(u8::is_ascii_alphanumeric).count();
        out.push_str(&capitalize(&segment[..run]));
        out.push_str(&segment[run..]);
    }
    out
}

/// ASCII-only: first letter upper, the rest lower.
fn capitalize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One row of the shared searchable table.
///
/// At most one row exists per `(owner_type, owner_id)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchableRow {
    pub owner_type: String,
    pub owner_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    pub value: String,
}

impl SearchableRow {
    pub fn new(owner_type: impl Into<String>, owner_id: i64, value: impl Into<String>) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id,
            parent_id: None,
            value: value.into(),
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// A ranked hit as returned by a row source, in relevance order.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRow {
    pub owner_type: String,
    pub owner_id: i64,
    pub relevancy: f64,
}

/// A `(type, id)` pair identifying an indexed record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub owner_type: String,
    pub owner_id: i64,
}

impl OwnerRef {
    pub fn new(owner_type: impl Into<String>, owner_id: i64) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id,
        }
    }
}

impl From<&SearchRow> for OwnerRef {
    fn from(row: &SearchRow) -> Self {
        Self::new(row.owner_type.clone(), row.owner_id)
    }
}

impl std::fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.owner_type, self.owner_id)
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// How a search is windowed. Exactly one strategy is active per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Plain `LIMIT`/`OFFSET`; `limit: None` means unbounded.
    Window { limit: Option<u64>, offset: u64 },
    /// Page-based; 1-indexed page, reports the total match count.
    Page { page: u64, per_page: u64 },
}

impl Pagination {
    /// The `(limit, offset)` pair this strategy translates to.
    pub fn limit_offset(&self) -> (Option<u64>, u64) {
        match *self {
            Pagination::Window { limit, offset } => (limit, offset),
            Pagination::Page { page, per_page } => {
                (Some(per_page), page.saturating_sub(1).saturating_mul(per_page))
            }
        }
    }

    pub fn is_paged(&self) -> bool {
        matches!(self, Pagination::Page { .. })
    }
}

/// Pagination metadata returned alongside page-based results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u64,
    pub per_page: u64,
    pub total_entries: u64,
}

impl PageInfo {
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total_entries.div_ceil(self.per_page)
    }
}
