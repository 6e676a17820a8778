//! Hierarchical scope identity.

use std::fmt;

use smol_str::SmolStr;

use super::Location;

/// The kind of lexical region a scope represents.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Class,
    Block,
    Parameter,
    Local,
}

impl ScopeKind {
    /// The stable textual tag used in scope encodings.
    pub const fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Module => "module",
            ScopeKind::Function => "function",
            ScopeKind::Class => "class",
            ScopeKind::Block => "block",
            ScopeKind::Parameter => "parameter",
            ScopeKind::Local => "local",
        }
    }

    /// Parse a tag produced by [`ScopeKind::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "global" => Some(ScopeKind::Global),
            "module" => Some(ScopeKind::Module),
            "function" => Some(ScopeKind::Function),
            "class" => Some(ScopeKind::Class),
            "block" => Some(ScopeKind::Block),
            "parameter" => Some(ScopeKind::Parameter),
            "local" => Some(ScopeKind::Local),
            _ => None,
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one lexical scope: kind, enclosing location, optional name.
///
/// Scopes nest: a child scope's location is always contained in its
/// parent's, and the global scope's location is the whole file. `ScopeId`
/// encodes to a single string key ([`ScopeId::encode`]) and decodes back
/// losslessly ([`ScopeId::decode`]), which is what lets maps across the
/// resolver be keyed by scope.
#[derive(Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScopeId {
    /// What kind of region this scope is.
    pub kind: ScopeKind,
    /// The region the scope covers.
    pub location: Location,
    /// Declared name, for named scopes (functions, classes, modules).
    pub name: Option<SmolStr>,
}

impl ScopeId {
    /// Create a scope identifier.
    pub fn new(kind: ScopeKind, location: Location, name: Option<SmolStr>) -> Self {
        Self {
            kind,
            location,
            name,
        }
    }

    /// Shorthand for the file-wide global scope.
    pub fn global(location: Location) -> Self {
        Self::new(ScopeKind::Global, location, None)
    }

    /// Encode this scope into its string key.
    ///
    /// Format: `kind@name@location-key`, where `name` is empty for unnamed
    /// scopes. The location key is the final, unbounded segment, so file
    /// paths containing separators survive the round trip. Names are
    /// identifiers and never contain `@`.
    pub fn encode(&self) -> String {
        format!(
            "{}@{}@{}",
            self.kind,
            self.name.as_deref().unwrap_or(""),
            self.location.key()
        )
    }

    /// Decode a key produced by [`ScopeId::encode`].
    pub fn decode(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, '@');
        let kind = ScopeKind::parse(parts.next()?)?;
        let name = match parts.next()? {
            "" => None,
            n => Some(SmolStr::new(n)),
        };
        let location = Location::from_key(parts.next()?)?;
        Some(Self {
            kind,
            location,
            name,
        })
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "ScopeId({} {} {:?})", self.kind, name, self.location),
            None => write!(f, "ScopeId({} {:?})", self.kind, self.location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(start_line: u32, end_line: u32) -> Location {
        Location::new("test.ts", start_line, 0, end_line, 0)
    }

    #[test]
    fn test_encode_decode_named() {
        let scope = ScopeId::new(
            ScopeKind::Function,
            loc(4, 12),
            Some(SmolStr::new("processOrder")),
        );
        let decoded = ScopeId::decode(&scope.encode()).unwrap();

        assert_eq!(decoded, scope);
        assert_eq!(decoded.kind, ScopeKind::Function);
        assert_eq!(decoded.name.as_deref(), Some("processOrder"));
    }

    #[test]
    fn test_encode_decode_unnamed() {
        let scope = ScopeId::new(ScopeKind::Block, loc(7, 9), None);
        let decoded = ScopeId::decode(&scope.encode()).unwrap();

        assert_eq!(decoded, scope);
        assert!(decoded.name.is_none());
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        assert!(ScopeId::decode("mystery@@test.ts:0:0:1:0").is_none());
    }

    #[test]
    fn test_decode_path_with_separators() {
        let scope = ScopeId::new(
            ScopeKind::Module,
            Location::new("C:/pkg/mod.ts", 0, 0, 50, 0),
            Some(SmolStr::new("mod")),
        );
        assert_eq!(ScopeId::decode(&scope.encode()).unwrap(), scope);
    }

    #[test]
    fn test_scope_kind_round_trip() {
        for kind in [
            ScopeKind::Global,
            ScopeKind::Module,
            ScopeKind::Function,
            ScopeKind::Class,
            ScopeKind::Block,
            ScopeKind::Parameter,
            ScopeKind::Local,
        ] {
            assert_eq!(ScopeKind::parse(kind.as_str()), Some(kind));
        }
    }
}
