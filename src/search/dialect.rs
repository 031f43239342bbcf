//! SQL dialects for the database's native full-text engine.
//!
//! The query builder produces engine-neutral [`MatchExpr`] values and
//! asks a [`Dialect`] for three things: the boolean query string to bind,
//! the predicate that selects matching rows, and the relevance expression.
//! Every fragment a dialect returns carries exactly one `?` placeholder so
//! user text is always bound, never interpolated.
//!
//! - [`MySql`] targets `MATCH(value) AGAINST(? IN BOOLEAN MODE)`.
//! - [`Sqlite`] targets an FTS5 external-content table named `<table>_fts`,
//!   scored with `-bm25()` so that higher means more relevant.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Match expressions
// ---------------------------------------------------------------------------

/// A single search word, optionally expanded as a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub word: String,
    pub prefix: bool,
}

impl Term {
    pub fn exact(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            prefix: false,
        }
    }

    pub fn prefix(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            prefix: true,
        }
    }
}

/// Engine-neutral boolean match expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchExpr {
    /// Any of the terms may match (OR).
    AnyOf(Vec<Term>),
    /// Every term must match (AND).
    AllOf(Vec<Term>),
    /// The text must appear as a contiguous phrase.
    Phrase(String),
}

impl MatchExpr {
    pub fn is_empty(&self) -> bool {
        match self {
            MatchExpr::AnyOf(terms) | MatchExpr::AllOf(terms) => terms.is_empty(),
            MatchExpr::Phrase(text) => text.trim().is_empty(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dialect trait
// ---------------------------------------------------------------------------

/// Rendering rules for one database engine.
///
/// The searchable table is always aliased `r` in generated SQL.
pub trait Dialect: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Render `expr` into the engine's boolean query syntax. The result is
    /// bound as a parameter. An empty string means "matches nothing".
    fn render(&self, expr: &MatchExpr) -> String;

    /// Predicate selecting rows of `r` that match the bound query.
    fn match_condition(&self, table: &str) -> String;

    /// Relevance of row `r` against the bound query; higher is better.
    fn relevance(&self, table: &str) -> String;

    /// Windowing clause and its parameters. `limit: None` is unbounded.
    fn limit_clause(&self, limit: Option<u64>, offset: u64) -> (String, Vec<Value>);
}

/// Which built-in dialect to use, as named in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Sqlite,
    #[serde(alias = "mariadb")]
    Mysql,
}

impl DialectKind {
    pub fn build(self) -> Box<dyn Dialect> {
        match self {
            DialectKind::Sqlite => Box::new(Sqlite),
            DialectKind::Mysql => Box::new(MySql),
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" | "fts5" => Some(Self::Sqlite),
            "mysql" | "mariadb" => Some(Self::Mysql),
            _ => None,
        }
    }
}

fn bind_u64(n: u64) -> Value {
    Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

// ---------------------------------------------------------------------------
// MySQL
// ---------------------------------------------------------------------------

/// MySQL / MariaDB `FULLTEXT` in boolean mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

/// MySQL's documented idiom for "offset without a limit".
const MYSQL_UNBOUNDED: &str = "18446744073709551615";

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn render(&self, expr: &MatchExpr) -> String {
        let render_term = |required: bool, term: &Term| {
            format!(
                "{}{}{}",
                if required { "+" } else { "" },
                term.word,
                if term.prefix { "*" } else { "" }
            )
        };
        match expr {
            MatchExpr::AnyOf(terms) => terms
                .iter()
                .map(|t| render_term(false, t))
                .collect::<Vec<_>>()
                .join(" "),
            MatchExpr::AllOf(terms) => terms
                .iter()
                .map(|t| render_term(true, t))
                .collect::<Vec<_>>()
                .join(" "),
            MatchExpr::Phrase(text) => format!("\"{text}\""),
        }
    }

    fn match_condition(&self, _table: &str) -> String {
        "MATCH(r.value) AGAINST(? IN BOOLEAN MODE)".to_string()
    }

    fn relevance(&self, _table: &str) -> String {
        "MATCH(r.value) AGAINST(? IN BOOLEAN MODE)".to_string()
    }

    fn limit_clause(&self, limit: Option<u64>, offset: u64) -> (String, Vec<Value>) {
        match (limit, offset) {
            (Some(limit), offset) => (
                "LIMIT ? OFFSET ?".to_string(),
                vec![bind_u64(limit), bind_u64(offset)],
            ),
            (None, 0) => (String::new(), Vec::new()),
            (None, offset) => (
                format!("LIMIT {MYSQL_UNBOUNDED} OFFSET ?"),
                vec![bind_u64(offset)],
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// SQLite FTS5
// ---------------------------------------------------------------------------

/// SQLite FTS5 over an external-content table `<table>_fts`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

/// Name of the FTS5 shadow index for `table`.
pub fn fts_table(table: &str) -> String {
    format!("{table}_fts")
}

/// Quote a word as an FTS5 string so operators and punctuation in user
/// input are treated as text.
fn fts5_quote(word: &str) -> String {
    format!("\"{}\"", word.replace('"', "\"\""))
}

/// The unicode61 tokenizer drops words with no letters or digits; quoting
/// them would only yield an empty phrase.
fn has_token(word: &str) -> bool {
    word.chars().any(char::is_alphanumeric)
}

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn render(&self, expr: &MatchExpr) -> String {
        let render_terms = |terms: &[Term], joiner: &str| {
            terms
                .iter()
                .filter(|t| has_token(&t.word))
                .map(|t| {
                    let quoted = fts5_quote(&t.word);
                    if t.prefix {
                        format!("{quoted}*")
                    } else {
                        quoted
                    }
                })
                .collect::<Vec<_>>()
                .join(joiner)
        };
        match expr {
            MatchExpr::AnyOf(terms) => render_terms(terms, " OR "),
            MatchExpr::AllOf(terms) => render_terms(terms, " AND "),
            MatchExpr::Phrase(text) if has_token(text) => fts5_quote(text),
            MatchExpr::Phrase(_) => String::new(),
        }
    }

    fn match_condition(&self, table: &str) -> String {
        let fts = fts_table(table);
        format!("r.id IN (SELECT rowid FROM {fts} WHERE {fts} MATCH ?)")
    }

    fn relevance(&self, table: &str) -> String {
        let fts = fts_table(table);
        format!("COALESCE((SELECT -bm25({fts}) FROM {fts} WHERE {fts} MATCH ? AND rowid = r.id), 0.0)")
    }

    fn limit_clause(&self, limit: Option<u64>, offset: u64) -> (String, Vec<Value>) {
        match limit {
            Some(limit) => (
                "LIMIT ? OFFSET ?".to_string(),
                vec![bind_u64(limit), bind_u64(offset)],
            ),
            None => ("LIMIT -1 OFFSET ?".to_string(), vec![bind_u64(offset)]),
        }
    }
}
