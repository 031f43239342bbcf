//! Query builder: raw text + mode + filters into one ranked SQL query.
//!
//! The builder never interpolates user input. The transformed query
//! strings, type names and parent ids are all bound parameters; the only
//! generated SQL comes from the validated table name, placeholder lists,
//! and the fixed weight literals of advanced scoring.

use rusqlite::types::Value;

use crate::error::{FulltextError, Result};
use crate::search::dialect::{Dialect, MatchExpr, Sqlite, Term};
use crate::search::mode::{EffectiveMode, SearchMode};
use crate::search::options::ParentFilter;
use crate::types::is_word;

/// Ordering applied to every search: relevance first, then the indexed
/// text itself for a deterministic tie-break.
pub const ORDER_CLAUSE: &str = "relevancy DESC, r.value ASC";

// ---------------------------------------------------------------------------
// Advanced-mode weights
// ---------------------------------------------------------------------------

const WEIGHT_ALL_EXACT: f64 = 5.0;
const WEIGHT_SOME_WILDCARD: f64 = 0.5;

fn weight_all_wildcard(word_count: usize) -> f64 {
    if word_count > 3 {
        2.0
    } else {
        1.0
    }
}

fn weight_some_exact(word_count: usize) -> f64 {
    if word_count <= 3 {
        2.5
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One relevance term. `weight: None` means the raw native score.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedMatch {
    pub expr: MatchExpr,
    pub weight: Option<f64>,
}

/// The mode-dependent rewrite of the user's query text.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Expression used to select matching rows.
    pub filter: MatchExpr,
    /// Expressions summed into the relevance score.
    pub scores: Vec<WeightedMatch>,
}

/// Type names split into those that passed the `^\w+$` gate and those that
/// were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeFilter {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

/// A fully parameterized search query, ready for a row source.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub table: String,
    pub dialect: &'static str,
    pub mode: EffectiveMode,
    /// Rendered filter expression; empty when nothing can match.
    pub match_query: String,
    /// `WHERE` body: match predicate plus type and parent restrictions.
    pub condition: String,
    pub condition_params: Vec<Value>,
    /// Relevance expression selected `AS relevancy`.
    pub score: String,
    pub score_params: Vec<Value>,
    pub order: &'static str,
    /// Type names dropped by sanitization, so callers can tell a filter was ignored.
    pub rejected_types: Vec<String>,
}

impl BuiltQuery {
    /// True when the rendered filter expression is empty and the engine
    /// cannot match anything.
    pub fn matches_nothing(&self) -> bool {
        self.match_query.trim().is_empty()
    }

    /// The ranked `SELECT`, without any windowing clause.
    pub fn select_sql(&self) -> String {
        format!(
            "SELECT r.owner_type, r.owner_id, {} AS relevancy FROM {} AS r WHERE {} ORDER BY {}",
            self.score, self.table, self.condition, self.order
        )
    }

    /// Parameters for [`select_sql`](Self::select_sql), in placeholder order.
    pub fn params(&self) -> Vec<Value> {
        self.score_params
            .iter()
            .chain(self.condition_params.iter())
            .cloned()
            .collect()
    }

    /// Counts every matching row; parameters are `condition_params`.
    pub fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {} AS r WHERE {}",
            self.table, self.condition
        )
    }
}

// ---------------------------------------------------------------------------
// QueryBuilder
// ---------------------------------------------------------------------------

/// Builds [`BuiltQuery`] values for one table, one mode and one dialect.
#[derive(Debug)]
pub struct QueryBuilder {
    table: String,
    mode: SearchMode,
    dialect: Box<dyn Dialect>,
}

impl QueryBuilder {
    /// Create a builder. The table name becomes part of the SQL text, so it
    /// must pass the word-character gate.
    pub fn new(table: &str, mode: SearchMode, dialect: Box<dyn Dialect>) -> Result<Self> {
        if !is_word(table) {
            return Err(FulltextError::InvalidTableName(table.to_string()));
        }
        Ok(Self {
            table: table.to_string(),
            mode,
            dialect,
        })
    }

    /// Builder for the SQLite FTS5 backend.
    pub fn sqlite(table: &str, mode: SearchMode) -> Result<Self> {
        Self::new(table, mode, Box::new(Sqlite))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Translate query text and filters into a ranked, parameterized query.
    pub fn build(&self, query: &str, only: &[String], parent: Option<&ParentFilter>) -> BuiltQuery {
        let mode = self.mode.effective();
        let plan = transform_query(query, mode);
        let match_query = self.dialect.render(&plan.filter);

        let mut condition = self.dialect.match_condition(&self.table);
        let mut condition_params = vec![Value::Text(match_query.clone())];

        let types = sanitize_type_filter(only);
        if !types.rejected.is_empty() {
            tracing::warn!(
                rejected = ?types.rejected,
                "dropping type names that are not plain identifiers"
            );
        }
        if let Some((sql, params)) = type_condition(&types.accepted) {
            condition.push_str(&sql);
            condition_params.extend(params);
        }
        if let Some(parent) = parent {
            let (sql, params) = parent_condition(parent);
            condition.push_str(&sql);
            condition_params.extend(params);
        }

        let (score, score_params) = self.score_expression(&plan.scores);

        tracing::debug!(
            %mode,
            dialect = self.dialect.name(),
            match_query = %match_query,
            "built full-text query"
        );

        BuiltQuery {
            table: self.table.clone(),
            dialect: self.dialect.name(),
            mode,
            match_query,
            condition,
            condition_params,
            score,
            score_params,
            order: ORDER_CLAUSE,
            rejected_types: types.rejected,
        }
    }

    /// Sum of `relevance * weight` over the weighted terms, or the bare
    /// relevance for a single unweighted term.
    fn score_expression(&self, scores: &[WeightedMatch]) -> (String, Vec<Value>) {
        let relevance = self.dialect.relevance(&self.table);
        let mut parts = Vec::with_capacity(scores.len());
        let mut params = Vec::with_capacity(scores.len());
        for term in scores {
            params.push(Value::Text(self.dialect.render(&term.expr)));
            parts.push(match term.weight {
                Some(weight) => format!("({relevance} * {weight})"),
                None => relevance.clone(),
            });
        }
        (parts.join(" + "), params)
    }
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Rewrite the user's text for the effective mode.
///
/// Control characters count as whitespace; FTS5 rejects a NUL inside a
/// quoted string.
pub fn transform_query(query: &str, mode: EffectiveMode) -> QueryPlan {
    let query: String = query
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let query = query.as_str();
    match mode {
        EffectiveMode::Simple => {
            let filter = MatchExpr::AnyOf(query.split_whitespace().map(Term::prefix).collect());
            QueryPlan {
                scores: vec![WeightedMatch {
                    expr: filter.clone(),
                    weight: None,
                }],
                filter,
            }
        }
        EffectiveMode::Phrase => {
            let filter = MatchExpr::Phrase(query.to_string());
            QueryPlan {
                scores: vec![WeightedMatch {
                    expr: filter.clone(),
                    weight: None,
                }],
                filter,
            }
        }
        EffectiveMode::Advanced {
            require_all,
            some_wildcard,
        } => {
            let cleaned = query.replace(['*', '+', '-'], "");
            let words: Vec<&str> = cleaned.split_whitespace().collect();
            let n = words.len();
            let exact = || words.iter().copied().map(Term::exact).collect::<Vec<_>>();
            let prefixed = || words.iter().copied().map(Term::prefix).collect::<Vec<_>>();

            let mut scores = vec![WeightedMatch {
                expr: MatchExpr::AllOf(exact()),
                weight: Some(WEIGHT_ALL_EXACT),
            }];
            let filter = if require_all {
                let all_wildcard = MatchExpr::AllOf(prefixed());
                scores.push(WeightedMatch {
                    expr: all_wildcard.clone(),
                    weight: Some(weight_all_wildcard(n)),
                });
                all_wildcard
            } else {
                let some_exact = MatchExpr::AnyOf(exact());
                scores.push(WeightedMatch {
                    expr: some_exact.clone(),
                    weight: Some(weight_some_exact(n)),
                });
                some_exact
            };
            if some_wildcard {
                scores.push(WeightedMatch {
                    expr: MatchExpr::AnyOf(prefixed()),
                    weight: Some(WEIGHT_SOME_WILDCARD),
                });
            }
            QueryPlan { filter, scores }
        }
    }
}

/// Keep only names matching `^\w+$`, deduplicated in first-seen order.
pub fn sanitize_type_filter(candidates: &[String]) -> TypeFilter {
    let mut filter = TypeFilter::default();
    for candidate in candidates {
        let bucket = if is_word(candidate) {
            &mut filter.accepted
        } else {
            &mut filter.rejected
        };
        if !bucket.contains(candidate) {
            bucket.push(candidate.clone());
        }
    }
    filter
}

/// `AND r.owner_type IN (?, ...)`, or `None` for an empty list (no restriction).
pub fn type_condition(types: &[String]) -> Option<(String, Vec<Value>)> {
    if types.is_empty() {
        return None;
    }
    let sql = format!(" AND r.owner_type IN ({})", placeholders(types.len()));
    let params = types.iter().cloned().map(Value::Text).collect();
    Some((sql, params))
}

/// `AND r.parent_id = ?` or `AND r.parent_id IN (?, ...)`.
///
/// An empty list yields `IN (NULL)`, which matches no row.
pub fn parent_condition(parent: &ParentFilter) -> (String, Vec<Value>) {
    match parent {
        ParentFilter::One(id) => (" AND r.parent_id = ?".to_string(), vec![Value::Integer(*id)]),
        ParentFilter::Many(ids) if ids.is_empty() => {
            (" AND r.parent_id IN (NULL)".to_string(), Vec::new())
        }
        ParentFilter::Many(ids) => (
            format!(" AND r.parent_id IN ({})", placeholders(ids.len())),
            ids.iter().copied().map(Value::Integer).collect(),
        ),
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
