//! Registry mapping owner type names to bulk record lookups.
//!
//! Populated once at startup. The result assembler consults it instead of
//! resolving type names at runtime.

use std::collections::HashMap;

use crate::error::{BoxError, FulltextError, Result};
use crate::types::{is_word, SearchableRow};

/// A record that can be matched back to its search row by id.
pub trait Record {
    fn record_id(&self) -> i64;
}

/// Stored rows stand in for records when no application types are at hand.
impl Record for SearchableRow {
    fn record_id(&self) -> i64 {
        self.owner_id
    }
}

/// Loads every record of one type whose id is in `ids`.
///
/// Implementations may return records in any order and may omit ids that
/// no longer exist.
pub trait RecordLookup<R>: Send + Sync {
    fn find_all_by_id(&self, ids: &[i64]) -> std::result::Result<Vec<R>, BoxError>;
}

impl<R, F> RecordLookup<R> for F
where
    F: Fn(&[i64]) -> std::result::Result<Vec<R>, BoxError> + Send + Sync,
{
    fn find_all_by_id(&self, ids: &[i64]) -> std::result::Result<Vec<R>, BoxError> {
        self(ids)
    }
}

struct RegisteredType<R> {
    lookup: Box<dyn RecordLookup<R>>,
    per_page: Option<u64>,
}

/// Owner type name → lookup capability and optional page size.
pub struct TypeRegistry<R> {
    types: HashMap<String, RegisteredType<R>>,
}

impl<R> std::fmt::Debug for TypeRegistry<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

impl<R> Default for TypeRegistry<R> {
    fn default() -> Self {
        Self {
            types: HashMap::new(),
        }
    }
}

impl<R> TypeRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `lookup` under `owner_type`, replacing any earlier entry.
    pub fn register(
        &mut self,
        owner_type: &str,
        lookup: impl RecordLookup<R> + 'static,
    ) -> Result<&mut Self> {
        self.insert(owner_type, Box::new(lookup), None)
    }

    /// Register with a type-specific page size for page-based searches.
    /// The size must be at least 1.
    pub fn register_with_per_page(
        &mut self,
        owner_type: &str,
        per_page: u64,
        lookup: impl RecordLookup<R> + 'static,
    ) -> Result<&mut Self> {
        if per_page == 0 {
            return Err(FulltextError::Config(format!(
                "per_page for {owner_type} must be at least 1"
            )));
        }
        self.insert(owner_type, Box::new(lookup), Some(per_page))
    }

    fn insert(
        &mut self,
        owner_type: &str,
        lookup: Box<dyn RecordLookup<R>>,
        per_page: Option<u64>,
    ) -> Result<&mut Self> {
        if !is_word(owner_type) {
            return Err(FulltextError::InvalidTypeName(owner_type.to_string()));
        }
        self.types
            .insert(owner_type.to_string(), RegisteredType { lookup, per_page });
        Ok(self)
    }

    pub fn contains(&self, owner_type: &str) -> bool {
        self.types.contains_key(owner_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Page size registered for `owner_type`, if any.
    pub fn per_page(&self, owner_type: &str) -> Option<u64> {
        self.types.get(owner_type).and_then(|t| t.per_page)
    }

    /// Bulk lookup through the registered capability.
    pub fn find_all_by_id(&self, owner_type: &str, ids: &[i64]) -> Result<Vec<R>> {
        let registered = self
            .types
            .get(owner_type)
            .ok_or_else(|| FulltextError::UnregisteredType(owner_type.to_string()))?;
        registered
            .lookup
            .find_all_by_id(ids)
            .map_err(|source| FulltextError::Lookup {
                owner_type: owner_type.to_string(),
                source,
            })
    }
}
