//! Branded identifiers for files and symbols.

use std::fmt;
use std::sync::Arc;

/// The path of a source file, as reported by the front end.
///
/// `FilePath` is a thin wrapper over a shared string. It exists so that
/// file paths cannot be accidentally mixed with other text values (symbol
/// names, scope keys) while keeping clones and comparisons cheap.
#[derive(Clone, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilePath(Arc<str>);

impl FilePath {
    /// Create a new FilePath.
    #[inline]
    pub fn new(path: impl Into<Arc<str>>) -> Self {
        Self(path.into())
    }

    /// Get the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilePath({})", self.0)
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FilePath {
    #[inline]
    fn from(path: &str) -> Self {
        Self(Arc::from(path))
    }
}

impl From<String> for FilePath {
    #[inline]
    fn from(path: String) -> Self {
        Self(Arc::from(path.as_str()))
    }
}

impl AsRef<str> for FilePath {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A unique identifier for a declared entity.
///
/// Derived from the encoded qualifying scope and the declared name, so two
/// distinct declarations never share an id within a run. Stable for the
/// duration of a single analysis run; not meaningful across runs.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolId(Arc<str>);

impl SymbolId {
    /// Build a SymbolId from a qualifying scope key and a declared name.
    pub fn from_scope_and_name(scope_key: &str, name: &str) -> Self {
        Self(Arc::from(format!("{scope_key}::{name}")))
    }

    /// Create a SymbolId from a pre-derived key.
    ///
    /// Intended for callers that persist ids from a previous pass; new ids
    /// should go through [`SymbolId::from_scope_and_name`].
    #[inline]
    pub fn from_raw(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Get the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_equality() {
        let a = FilePath::from("src/a.ts");
        let b = FilePath::from("src/a.ts");
        let c = FilePath::from("src/b.ts");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_file_path_cheap_clone() {
        let a = FilePath::from("src/a.ts");
        let b = a.clone();
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_symbol_id_derivation() {
        let a = SymbolId::from_scope_and_name("global@@a.ts:0:0:9:0", "foo");
        let b = SymbolId::from_scope_and_name("global@@a.ts:0:0:9:0", "foo");
        let c = SymbolId::from_scope_and_name("global@@a.ts:0:0:9:0", "bar");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_symbol_id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(SymbolId::from_raw("s::foo"));
        set.insert(SymbolId::from_raw("s::bar"));
        set.insert(SymbolId::from_raw("s::foo")); // duplicate

        assert_eq!(set.len(), 2);
    }
}
