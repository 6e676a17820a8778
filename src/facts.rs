//! Raw per-file facts handed over by language front ends.
//!
//! Front ends tokenize and parse on their own; what crosses into this crate
//! is the flat record types below, bundled per file as [`FileFacts`]. The
//! records carry no behavior; indexing, resolution, and graph construction
//! all happen downstream.

use smol_str::SmolStr;

use crate::base::{FilePath, Location, ScopeId};

/// The kind of a declared entity.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolKind {
    Variable,
    Function,
    Class,
    Method,
    Property,
    Parameter,
    Type,
    Interface,
    Enum,
    Import,
    Export,
    Namespace,
    Module,
    Global,
}

impl SymbolKind {
    /// Kinds that can be the target of a call: functions, methods, and
    /// classes (a resolved call to a class is a constructor call).
    pub const fn is_callable(self) -> bool {
        matches!(
            self,
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Class
        )
    }

    /// Kinds that name a type.
    pub const fn is_type_like(self) -> bool {
        matches!(
            self,
            SymbolKind::Class | SymbolKind::Type | SymbolKind::Interface | SymbolKind::Enum
        )
    }
}

/// How a reference uses the symbol it denotes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UsageKind {
    Call,
    Reference,
    Import,
    TypeReference,
}

impl UsageKind {
    /// Whether a definition of `kind` can satisfy this usage.
    ///
    /// `Call` needs a callable target, `TypeReference` a type-like one;
    /// plain references and import mentions accept any kind. An
    /// incompatible nearest match is weak evidence rather than a
    /// non-match: the resolver grades it down instead of discarding it.
    pub fn is_compatible_with(self, kind: SymbolKind) -> bool {
        match self {
            UsageKind::Call => kind.is_callable() || kind == SymbolKind::Import,
            UsageKind::TypeReference => kind.is_type_like() || kind == SymbolKind::Import,
            UsageKind::Reference | UsageKind::Import => true,
        }
    }
}

/// Which region an observed variable type is visible in.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeScope {
    /// Visible only within the current function.
    Local,
    /// Visible across the file (e.g. a module-level assignment).
    File,
}

/// A raw definition record: something the front end saw declared.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawDef {
    /// Declared name.
    pub name: SmolStr,
    /// What was declared.
    pub kind: SymbolKind,
    /// The declaration's extent (for functions/classes, the whole body).
    pub location: Location,
    /// Owning class, for methods and properties.
    pub qualifier: Option<SmolStr>,
    /// Whether the declaration is exported from its file.
    pub exported: bool,
}

impl RawDef {
    /// Create a definition record.
    pub fn new(name: impl Into<SmolStr>, kind: SymbolKind, location: Location) -> Self {
        Self {
            name: name.into(),
            kind,
            location,
            qualifier: None,
            exported: false,
        }
    }

    /// Set the owning class qualifier.
    pub fn with_qualifier(mut self, qualifier: impl Into<SmolStr>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Mark the definition as exported.
    pub fn exported(mut self) -> Self {
        self.exported = true;
        self
    }
}

/// A raw reference record: a name used at a location.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawRef {
    /// The referenced name (for `object.member`, the member).
    pub name: SmolStr,
    /// The receiver variable, when the reference is a member access.
    pub receiver: Option<SmolStr>,
    /// How the name is used.
    pub kind: UsageKind,
    /// Where the reference occurs.
    pub location: Location,
}

impl RawRef {
    /// Create a reference record.
    pub fn new(name: impl Into<SmolStr>, kind: UsageKind, location: Location) -> Self {
        Self {
            name: name.into(),
            receiver: None,
            kind,
            location,
        }
    }

    /// Mark this reference as a member access on `receiver`.
    pub fn with_receiver(mut self, receiver: impl Into<SmolStr>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }
}

/// A raw import record: a local name bound to another file's export.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawImport {
    /// The name as visible in the importing file.
    pub local_name: SmolStr,
    /// The name as exported by the source file.
    pub external_name: SmolStr,
    /// The file the import pulls from.
    pub source: FilePath,
    /// Default-import flag (`import x from ...`).
    pub is_default: bool,
    /// Type-only import flag (`import type { T } ...`).
    pub is_type_only: bool,
    /// Where the import statement sits.
    pub location: Location,
}

impl RawImport {
    /// Create an import record binding `local_name` to `external_name` in `source`.
    pub fn new(
        local_name: impl Into<SmolStr>,
        external_name: impl Into<SmolStr>,
        source: impl Into<FilePath>,
        location: Location,
    ) -> Self {
        Self {
            local_name: local_name.into(),
            external_name: external_name.into(),
            source: source.into(),
            is_default: false,
            is_type_only: false,
            location,
        }
    }

    /// Mark as a default import.
    pub fn default_import(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Mark as a type-only import.
    pub fn type_only(mut self) -> Self {
        self.is_type_only = true;
        self
    }
}

/// A raw export record: a name made visible outside its file.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawExport {
    /// The exported name.
    pub name: SmolStr,
    /// Where the export is declared.
    pub location: Location,
    /// Whether this re-exports a name imported from elsewhere.
    pub is_reexport: bool,
}

impl RawExport {
    /// Create an export record.
    pub fn new(name: impl Into<SmolStr>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            is_reexport: false,
        }
    }

    /// Mark as a re-export.
    pub fn reexport(mut self) -> Self {
        self.is_reexport = true;
        self
    }
}

/// An assignment-like observation: `variable = new ClassName(...)` or the
/// per-language equivalent.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawAssignment {
    /// The assigned variable.
    pub variable: SmolStr,
    /// The class observed on the right-hand side.
    pub class_name: SmolStr,
    /// Visibility of the observation.
    pub scope: TypeScope,
    /// Where the assignment occurs.
    pub location: Location,
}

impl RawAssignment {
    /// Create an assignment observation.
    pub fn new(
        variable: impl Into<SmolStr>,
        class_name: impl Into<SmolStr>,
        scope: TypeScope,
        location: Location,
    ) -> Self {
        Self {
            variable: variable.into(),
            class_name: class_name.into(),
            scope,
            location,
        }
    }
}

/// Everything one front end extracted from one file.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileFacts {
    /// The file these facts describe.
    pub file: FilePath,
    /// Declarations.
    pub defs: Vec<RawDef>,
    /// Name uses, including calls.
    pub refs: Vec<RawRef>,
    /// Import bindings.
    pub imports: Vec<RawImport>,
    /// Exported names.
    pub exports: Vec<RawExport>,
    /// Assignment observations for type discovery.
    pub assignments: Vec<RawAssignment>,
    /// The file's lexical scopes. A global scope covering the whole file is
    /// synthesized at indexing time if the front end did not provide one.
    pub scopes: Vec<ScopeId>,
}

impl FileFacts {
    /// Create an empty fact set for a file.
    pub fn new(file: impl Into<FilePath>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_compatibility() {
        assert!(UsageKind::Call.is_compatible_with(SymbolKind::Function));
        assert!(UsageKind::Call.is_compatible_with(SymbolKind::Method));
        assert!(UsageKind::Call.is_compatible_with(SymbolKind::Class));
        assert!(!UsageKind::Call.is_compatible_with(SymbolKind::Variable));
        assert!(!UsageKind::Call.is_compatible_with(SymbolKind::Interface));
    }

    #[test]
    fn test_type_reference_compatibility() {
        assert!(UsageKind::TypeReference.is_compatible_with(SymbolKind::Interface));
        assert!(UsageKind::TypeReference.is_compatible_with(SymbolKind::Enum));
        assert!(!UsageKind::TypeReference.is_compatible_with(SymbolKind::Function));
    }

    #[test]
    fn test_plain_reference_accepts_anything() {
        assert!(UsageKind::Reference.is_compatible_with(SymbolKind::Variable));
        assert!(UsageKind::Reference.is_compatible_with(SymbolKind::Namespace));
    }

    #[test]
    fn test_raw_def_builders() {
        let loc = Location::new("a.ts", 3, 0, 5, 1);
        let def = RawDef::new("save", SymbolKind::Method, loc)
            .with_qualifier("User")
            .exported();

        assert_eq!(def.qualifier.as_deref(), Some("User"));
        assert!(def.exported);
    }
}
