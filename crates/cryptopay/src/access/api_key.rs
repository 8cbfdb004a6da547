use std::collections::HashSet;

/// Header carrying the caller's key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Issued API keys. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyRegistry {
    keys: HashSet<String>,
}

impl ApiKeyRegistry {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether `key` was issued. A missing key is never valid.
    pub fn is_valid(&self, key: Option<&str>) -> bool {
        key.is_some_and(|key| self.keys.contains(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_key_is_valid() {
        let registry = ApiKeyRegistry::new(["key-a", "key-b"]);
        assert!(registry.is_valid(Some("key-a")));
        assert!(registry.is_valid(Some("key-b")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unknown_or_missing_key_is_invalid() {
        let registry = ApiKeyRegistry::new(["key-a"]);
        assert!(!registry.is_valid(Some("key-c")));
        assert!(!registry.is_valid(Some("")));
        assert!(!registry.is_valid(None));
    }

    #[test]
    fn test_empty_registry_rejects_everything() {
        let registry = ApiKeyRegistry::default();
        assert!(registry.is_empty());
        assert!(!registry.is_valid(Some("anything")));
    }
}
