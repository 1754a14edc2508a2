//! In-memory resolution caches.
//!
//! A resolver owns two of these: one mapping keys to formatted CSS text and
//! one mapping keys to JSON property objects. Entries are append-only for
//! the lifetime of the owner; there is no eviction and no TTL.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::key::CacheKey;

pub type JsonObject = Map<String, Value>;
pub type CssCache = ResolutionCache<String>;
pub type JsonCache = ResolutionCache<JsonObject>;

#[derive(Debug, Clone)]
pub struct ResolutionCache<T> {
    entries: HashMap<CacheKey, T>,
    hits: u64,
    misses: u64,
}

impl<T> Default for ResolutionCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<T: Clone> ResolutionCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `key` and records the hit or miss.
    pub fn lookup(&mut self, key: &CacheKey) -> Option<T> {
        match self.entries.get(key) {
            Some(value) => {
                self.hits += 1;
                Some(value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: CacheKey, value: T) {
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub css_entries: u64,
    pub json_entries: u64,
    pub css_hits: u64,
    pub css_misses: u64,
    pub json_hits: u64,
    pub json_misses: u64,
}

impl CacheStats {
    pub fn collect(css: &CssCache, json: &JsonCache) -> Self {
        Self {
            css_entries: css.len() as u64,
            json_entries: json.len() as u64,
            css_hits: css.hits(),
            css_misses: css.misses(),
            json_hits: json.hits(),
            json_misses: json.misses(),
        }
    }
}
