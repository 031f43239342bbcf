//! Per-call search options and their normalization.
//!
//! Invalid values are coerced to safe defaults rather than rejected:
//! negative limits fall back to the default, a zero limit means "no limit",
//! negative offsets clamp to zero, and non-numeric parent ids become 0.

use crate::types::{canonical_type_name, Pagination};

/// Default number of rows when no limit is given.
pub const DEFAULT_LIMIT: u64 = 10;

/// Default page size for page-based searches.
pub const DEFAULT_PER_PAGE: u64 = 30;

// ---------------------------------------------------------------------------
// ParentFilter
// ---------------------------------------------------------------------------

/// Restricts hits to rows whose `parent_id` matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentFilter {
    /// `parent_id = ?`
    One(i64),
    /// `parent_id IN (?, ...)`, entries used as given.
    Many(Vec<i64>),
}

impl ParentFilter {
    /// Build a scalar filter from untyped input using leading-integer
    /// coercion: `"12abc"` is 12, `"abc"` is 0. Never fails.
    pub fn coerce(input: &str) -> Self {
        Self::One(leading_int(input))
    }
}

impl From<i64> for ParentFilter {
    fn from(id: i64) -> Self {
        Self::One(id)
    }
}

impl From<Vec<i64>> for ParentFilter {
    fn from(ids: Vec<i64>) -> Self {
        Self::Many(ids)
    }
}

impl From<&[i64]> for ParentFilter {
    fn from(ids: &[i64]) -> Self {
        Self::Many(ids.to_vec())
    }
}

/// Parse the leading integer of `s`, ignoring leading whitespace and
/// accepting one sign. Anything unparseable yields 0; overflow saturates.
pub fn leading_int(s: &str) -> i64 {
    let trimmed = s.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(b - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }
    value
}

// ---------------------------------------------------------------------------
// SearchOptions
// ---------------------------------------------------------------------------

/// Options accepted by [`FulltextSearch::search`](crate::search::engine::FulltextSearch::search).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Maximum rows; default 10, negative resets to default, 0 means unbounded.
    pub limit: Option<i64>,
    /// Rows to skip; default 0, negative clamps to 0.
    pub offset: Option<i64>,
    /// Page number. When set, `limit` and `offset` are ignored entirely.
    pub page: Option<i64>,
    /// Return loaded records (`true`) or bare `(type, id)` pairs.
    pub materialize: bool,
    /// Restrict to these owner types.
    pub only: Vec<String>,
    /// Restrict to these parent ids.
    pub parent: Option<ParentFilter>,
    /// Type whose registered page size drives page-based searches.
    pub search_class: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: None,
            offset: None,
            page: None,
            materialize: true,
            only: Vec::new(),
            parent: None,
            search_class: None,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    /// Return `(type, id)` pairs instead of loaded records.
    pub fn pairs(mut self) -> Self {
        self.materialize = false;
        self
    }

    pub fn only<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn only_type(self, owner_type: impl Into<String>) -> Self {
        self.only([owner_type.into()])
    }

    pub fn parent(mut self, parent: impl Into<ParentFilter>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn search_class(mut self, owner_type: impl Into<String>) -> Self {
        self.search_class = Some(owner_type.into());
        self
    }

    /// The pagination strategy for this call.
    ///
    /// `per_page` is only consulted when `page` is set; the caller resolves
    /// it from `search_class` beforehand.
    pub fn pagination(&self, default_limit: u64, per_page: u64) -> Pagination {
        match self.page {
            Some(page) => Pagination::Page {
                page: page.max(1) as u64,
                per_page,
            },
            None => Pagination::Window {
                limit: normalize_limit(self.limit, default_limit),
                offset: normalize_offset(self.offset),
            },
        }
    }

    /// Canonical, deduplicated type names from `only`, in first-seen order.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.only.len());
        for candidate in &self.only {
            let canonical = canonical_type_name(candidate);
            if !names.contains(&canonical) {
                names.push(canonical);
            }
        }
        names
    }
}

/// Negative limits reset to the default before the zero check; zero means
/// unbounded.
pub fn normalize_limit(limit: Option<i64>, default_limit: u64) -> Option<u64> {
    let effective = match limit {
        Some(l) if l < 0 => default_limit,
        Some(l) => l as u64,
        None => default_limit,
    };
    (effective != 0).then_some(effective)
}

pub fn normalize_offset(offset: Option<i64>) -> u64 {
    offset.unwrap_or(0).max(0) as u64
}
