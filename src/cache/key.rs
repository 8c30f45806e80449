//! Cache key generation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub hash: String,
    pub namespace: Option<String>,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into(), namespace: None }
    }
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self { self.namespace = Some(ns.into()); self }
    pub fn as_str(&self) -> &str { &self.hash }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}:{}", ns, self.hash.chars().take(12).collect::<String>()),
            None => write!(f, "{}", self.hash),
        }
    }
}

impl From<&str> for CacheKey { fn from(s: &str) -> Self { Self::new(s) } }
impl From<String> for CacheKey { fn from(s: String) -> Self { Self::new(s) } }

/// Collapse runs of whitespace and trim, so cosmetic edits to a query hit the same entry.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds request fingerprints: normalized query, optional data snapshot, model and namespace.
pub struct CacheKeyGenerator {
    include_model: bool,
    case_sensitive: bool,
    salt: Option<String>,
}

impl CacheKeyGenerator {
    pub fn new() -> Self { Self { include_model: true, case_sensitive: true, salt: None } }
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self { self.salt = Some(salt.into()); self }
    pub fn with_include_model(mut self, include: bool) -> Self { self.include_model = include; self }
    pub fn case_insensitive(mut self) -> Self { self.case_sensitive = false; self }

    pub fn generate(&self, namespace: &str, model: Option<&str>, query: &str, snapshot: Option<&str>) -> CacheKey {
        let mut query = normalize_query(query);
        if !self.case_sensitive { query = query.to_lowercase(); }

        let mut parts: BTreeMap<&str, String> = BTreeMap::new();
        parts.insert("namespace", namespace.to_string());
        parts.insert("query", query);
        if self.include_model { if let Some(m) = model { parts.insert("model", m.to_string()); } }
        if let Some(s) = snapshot { parts.insert("snapshot", s.to_string()); }
        if let Some(ref s) = self.salt { parts.insert("salt", s.clone()); }
        // BTreeMap keeps field order stable, so the canonical form is deterministic.
        let canonical = serde_json::to_string(&parts).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        CacheKey::new(hash).with_namespace(namespace)
    }
}

impl Default for CacheKeyGenerator { fn default() -> Self { Self::new() } }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_normalization_shares_key() {
        let g = CacheKeyGenerator::new();
        let a = g.generate("ask", Some("gemini"), "What is  safety stock?", None);
        let b = g.generate("ask", Some("gemini"), "  What is safety stock?\n", None);
        assert_eq!(a, b);
        assert_eq!(a.hash.len(), 64);
    }

    #[test]
    fn test_snapshot_and_namespace_change_key() {
        let g = CacheKeyGenerator::new();
        let base = g.generate("plan", None, "85123A", Some("units=10"));
        assert_ne!(base, g.generate("plan", None, "85123A", Some("units=11")));
        assert_ne!(base.hash, g.generate("ask", None, "85123A", Some("units=10")).hash);
    }

    #[test]
    fn test_case_sensitivity() {
        let sensitive = CacheKeyGenerator::new();
        assert_ne!(
            sensitive.generate("ask", None, "EOQ", None),
            sensitive.generate("ask", None, "eoq", None)
        );
        let insensitive = CacheKeyGenerator::new().case_insensitive();
        assert_eq!(
            insensitive.generate("ask", None, "EOQ", None),
            insensitive.generate("ask", None, "eoq", None)
        );
    }

    #[test]
    fn test_model_toggle() {
        let with_model = CacheKeyGenerator::new();
        let without = CacheKeyGenerator::new().with_include_model(false);
        assert_ne!(
            with_model.generate("ask", Some("a"), "q", None),
            with_model.generate("ask", Some("b"), "q", None)
        );
        assert_eq!(
            without.generate("ask", Some("a"), "q", None),
            without.generate("ask", Some("b"), "q", None)
        );
    }
}
