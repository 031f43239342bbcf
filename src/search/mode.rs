//! Search mode flags and their precedence.
//!
//! A [`SearchMode`] is a plain value bound into a
//! [`QueryBuilder`](crate::search::builder::QueryBuilder) at construction,
//! so two builders with different modes can run side by side.

use serde::{Deserialize, Serialize};

/// Independent mode flags. Advanced overrides phrase; `and_search` only
/// matters when advanced is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchMode {
    /// Weighted combination of several match expressions.
    pub advanced: bool,
    /// Require every term (advanced only).
    pub and_search: bool,
    /// Wrap the whole query in quotes (ignored when advanced).
    pub phrase: bool,
    /// Add the match-some-wildcard term (weight 0.5) to advanced scoring.
    /// Off by default.
    pub some_wildcard: bool,
}

impl SearchMode {
    pub fn use_advanced_search(mut self) -> Self {
        self.advanced = true;
        self
    }

    pub fn use_and_search(mut self) -> Self {
        self.and_search = true;
        self
    }

    pub fn use_phrase_search(mut self) -> Self {
        self.phrase = true;
        self
    }

    pub fn with_some_wildcard_term(mut self) -> Self {
        self.some_wildcard = true;
        self
    }

    /// Resolve the flags into the single mode that will actually run.
    pub fn effective(&self) -> EffectiveMode {
        if self.advanced {
            EffectiveMode::Advanced {
                require_all: self.and_search,
                some_wildcard: self.some_wildcard,
            }
        } else if self.phrase {
            EffectiveMode::Phrase
        } else {
            EffectiveMode::Simple
        }
    }
}

/// The resolved mode after applying flag precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveMode {
    /// OR-style matching with a trailing wildcard on every token.
    Simple,
    /// The whole query as one quoted phrase.
    Phrase,
    /// Weighted sum of exact and wildcard match expressions.
    Advanced {
        require_all: bool,
        some_wildcard: bool,
    },
}

impl std::fmt::Display for EffectiveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectiveMode::Simple => f.write_str("simple"),
            EffectiveMode::Phrase => f.write_str("phrase"),
            EffectiveMode::Advanced {
                require_all: true, ..
            } => f.write_str("advanced-and"),
            EffectiveMode::Advanced { .. } => f.write_str("advanced"),
        }
    }
}
