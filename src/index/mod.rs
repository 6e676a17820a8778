//! Per-file symbol indexing.
//!
//! [`FileIndexer`] consumes one file's [`FileFacts`] and produces a frozen
//! [`SymbolIndex`]: what is declared, where each declaration's owning scope
//! sits, which usages matched which definitions, and which names matched
//! nothing at all. Indexes for different files are independent; the engine
//! builds them on parallel workers and only ever reads them afterwards.

mod scope_tree;

pub use scope_tree::ScopeTree;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::base::{FilePath, Location, ScopeId, ScopeKind, SymbolId};
use crate::diagnostics::{AnalysisError, AnalysisPhase};
use crate::facts::{FileFacts, SymbolKind, UsageKind};

/// A declared entity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolDefinition {
    /// Declared name.
    pub name: SmolStr,
    /// Owning class, for methods and properties.
    pub qualifier: Option<SmolStr>,
    /// What was declared.
    pub kind: SymbolKind,
    /// The declaration's extent.
    pub location: Location,
    /// Whether the declaration is visible outside its file.
    pub exported: bool,
}

/// A reference to a definition, as matched at index time.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolUsage {
    /// The definition this usage was matched to.
    pub symbol: SymbolId,
    /// Where the usage occurs.
    pub location: Location,
    /// How the symbol is used.
    pub kind: UsageKind,
}

/// Per-file catalog of definitions, usages, and unresolved names.
///
/// Immutable once returned by [`FileIndexer::run`]; safe to share across
/// readers without copying.
#[derive(Clone, Debug)]
pub struct SymbolIndex {
    file: FilePath,
    definitions: IndexMap<SymbolId, SymbolDefinition>,
    usages: IndexMap<SymbolId, Vec<SymbolUsage>>,
    owner_scope: IndexMap<SymbolId, ScopeId>,
    unresolved: IndexSet<SmolStr>,
    by_name: FxHashMap<SmolStr, SmallVec<[SymbolId; 2]>>,
    scope_tree: ScopeTree,
}

impl SymbolIndex {
    /// The file this index describes.
    pub fn file(&self) -> &FilePath {
        &self.file
    }

    /// All definitions, in source order of declaration.
    pub fn definitions(&self) -> impl Iterator<Item = (&SymbolId, &SymbolDefinition)> {
        self.definitions.iter()
    }

    /// Look up one definition.
    pub fn definition(&self, id: &SymbolId) -> Option<&SymbolDefinition> {
        self.definitions.get(id)
    }

    /// Usages matched to a definition, in source order.
    pub fn usages_of(&self, id: &SymbolId) -> &[SymbolUsage] {
        self.usages.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The scope a definition is declared in.
    pub fn scope_of(&self, id: &SymbolId) -> Option<&ScopeId> {
        self.owner_scope.get(id)
    }

    /// Names that matched no definition in any visible scope.
    ///
    /// Not an error by itself: input to later diagnostic reporting, and a
    /// cross-file resolution may still claim the name.
    pub fn unresolved_symbols(&self) -> impl Iterator<Item = &SmolStr> {
        self.unresolved.iter()
    }

    /// Whether `name` was recorded as unresolved.
    pub fn is_unresolved(&self, name: &str) -> bool {
        self.unresolved.contains(name)
    }

    /// The file's scope tree.
    pub fn scope_tree(&self) -> &ScopeTree {
        &self.scope_tree
    }

    /// All definitions with a given name, in source order.
    pub fn defs_named(&self, name: &str) -> impl Iterator<Item = (&SymbolId, &SymbolDefinition)> {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|id| self.definitions.get_key_value(id))
    }

    /// Definitions with `name` declared directly in `scope`, in source order.
    pub fn candidates_in_scope(
        &self,
        scope: &ScopeId,
        name: &str,
    ) -> Vec<(&SymbolId, &SymbolDefinition)> {
        let mut found: Vec<_> = self
            .defs_named(name)
            .filter(|(id, _)| self.owner_scope.get(*id) == Some(scope))
            .collect();
        found.sort_by_key(|(_, def)| def.location.start());
        found
    }

    /// A member (method or property) declared by class `class_name`.
    ///
    /// Matches on the recorded qualifier first, then on declarations whose
    /// owning scope is the class's scope.
    pub fn member_of(
        &self,
        class_name: &str,
        member: &str,
    ) -> Option<(&SymbolId, &SymbolDefinition)> {
        self.defs_named(member).find(|(id, def)| {
            if !matches!(def.kind, SymbolKind::Method | SymbolKind::Property) {
                return false;
            }
            if def.qualifier.as_deref() == Some(class_name) {
                return true;
            }
            self.owner_scope.get(*id).is_some_and(|scope| {
                scope.kind == ScopeKind::Class && scope.name.as_deref() == Some(class_name)
            })
        })
    }

    /// Whether this index declares a class with the given name.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.defs_named(class_name)
            .any(|(_, def)| def.kind == SymbolKind::Class)
    }

    /// The innermost callable definition whose extent contains `loc`.
    ///
    /// This is the function a call site at `loc` belongs to; `None` for
    /// top-level call sites.
    pub fn function_at(&self, loc: &Location) -> Option<(&SymbolId, &SymbolDefinition)> {
        let mut best: Option<(&SymbolId, &SymbolDefinition)> = None;
        for (id, def) in &self.definitions {
            if !matches!(def.kind, SymbolKind::Function | SymbolKind::Method) {
                continue;
            }
            if !def.location.contains(loc) {
                continue;
            }
            best = match best {
                Some((_, b)) if !b.location.contains(&def.location) => best,
                _ => Some((id, def)),
            };
        }
        best
    }

    /// An exported definition with the given name, if any.
    pub fn exported_def(&self, name: &str) -> Option<(&SymbolId, &SymbolDefinition)> {
        self.defs_named(name).find(|(_, def)| def.exported)
    }
}

/// Builds one file's [`SymbolIndex`] from raw facts. Consumed by [`FileIndexer::run`].
pub struct FileIndexer<'a> {
    facts: &'a FileFacts,
    diagnostics: Vec<AnalysisError>,
}

impl<'a> FileIndexer<'a> {
    /// Create an indexer over one file's facts.
    pub fn new(facts: &'a FileFacts) -> Self {
        Self {
            facts,
            diagnostics: Vec::new(),
        }
    }

    /// Build the index. Returns the frozen index and any diagnostics
    /// gathered along the way (duplicate definitions, dangling exports).
    pub fn run(mut self) -> (SymbolIndex, Vec<AnalysisError>) {
        let scope_tree = ScopeTree::build(self.file_extent(), &self.facts.scopes);

        let mut definitions: IndexMap<SymbolId, SymbolDefinition> = IndexMap::new();
        let mut owner_scope: IndexMap<SymbolId, ScopeId> = IndexMap::new();
        let mut by_name: FxHashMap<SmolStr, SmallVec<[SymbolId; 2]>> = FxHashMap::default();

        for def in &self.facts.defs {
            let owner = Self::owning_scope(&scope_tree, &def.location);
            let mut id = SymbolId::from_scope_and_name(&owner.encode(), &def.name);

            if definitions.contains_key(&id) {
                // Same-scope name collision: keep both, disambiguate the id,
                // and leave the ambiguity to the resolver's confidence tiers.
                self.diagnostics.push(
                    AnalysisError::warning(
                        AnalysisPhase::ScopeAnalysis,
                        format!("duplicate definition of '{}' in the same scope", def.name),
                    )
                    .at(def.location.clone()),
                );
                id = SymbolId::from_raw(format!(
                    "{}#{}:{}",
                    id.as_str(),
                    def.location.start_line,
                    def.location.start_col
                ));
            }

            definitions.insert(
                id.clone(),
                SymbolDefinition {
                    name: def.name.clone(),
                    qualifier: def.qualifier.clone(),
                    kind: def.kind,
                    location: def.location.clone(),
                    exported: def.exported,
                },
            );
            owner_scope.insert(id.clone(), owner.clone());
            by_name.entry(def.name.clone()).or_default().push(id);
        }

        // Import bindings become Import-kind definitions at file scope; the
        // resolver upgrades them through the cross-file linkage table.
        let root = scope_tree.root().clone();
        for import in &self.facts.imports {
            let id = SymbolId::from_scope_and_name(&root.encode(), &import.local_name);
            if definitions.contains_key(&id) {
                self.diagnostics.push(
                    AnalysisError::warning(
                        AnalysisPhase::ImportResolution,
                        format!("import '{}' shadows a local definition", import.local_name),
                    )
                    .at(import.location.clone()),
                );
                continue;
            }
            definitions.insert(
                id.clone(),
                SymbolDefinition {
                    name: import.local_name.clone(),
                    qualifier: None,
                    kind: SymbolKind::Import,
                    location: import.location.clone(),
                    exported: false,
                },
            );
            owner_scope.insert(id.clone(), root.clone());
            by_name
                .entry(import.local_name.clone())
                .or_default()
                .push(id);
        }

        // Export records flip the exported flag on matching definitions.
        for export in &self.facts.exports {
            let ids: SmallVec<[SymbolId; 2]> = by_name
                .get(&export.name)
                .map(|ids| ids.clone())
                .unwrap_or_default();
            if ids.is_empty() {
                self.diagnostics.push(
                    AnalysisError::warning(
                        AnalysisPhase::ExportDetection,
                        format!("export '{}' names no known definition", export.name),
                    )
                    .at(export.location.clone()),
                );
                continue;
            }
            for id in ids {
                if let Some(def) = definitions.get_mut(&id) {
                    def.exported = true;
                }
            }
        }

        // Match usages against visible definitions; names that match nothing
        // in any visible scope land in unresolved_symbols.
        let mut usages: IndexMap<SymbolId, Vec<SymbolUsage>> = IndexMap::new();
        let mut unresolved: IndexSet<SmolStr> = IndexSet::new();

        for r in &self.facts.refs {
            let mut matched = None;
            for scope in scope_tree.chain_at(&r.location) {
                if let Some(ids) = by_name.get(&r.name) {
                    let mut in_scope: Vec<&SymbolId> = ids
                        .iter()
                        .filter(|id| owner_scope.get(*id).is_some_and(|owner| owner == scope))
                        .collect();
                    in_scope.sort_by_key(|id| definitions[*id].location.start());
                    if let Some(first) = in_scope.first() {
                        matched = Some((*first).clone());
                        break;
                    }
                }
            }

            match matched {
                Some(id) => {
                    usages.entry(id.clone()).or_default().push(SymbolUsage {
                        symbol: id,
                        location: r.location.clone(),
                        kind: r.kind,
                    });
                }
                None => {
                    unresolved.insert(r.name.clone());
                }
            }
        }

        let index = SymbolIndex {
            file: self.facts.file.clone(),
            definitions,
            usages,
            owner_scope,
            unresolved,
            by_name,
            scope_tree,
        };
        (index, self.diagnostics)
    }

    /// The file extent used when synthesizing the global scope: the widest
    /// span covering every recorded fact.
    fn file_extent(&self) -> Location {
        let mut end_line = 0u32;
        let mut end_col = 0u32;
        let locations = self
            .facts
            .scopes
            .iter()
            .map(|s| &s.location)
            .chain(self.facts.defs.iter().map(|d| &d.location))
            .chain(self.facts.refs.iter().map(|r| &r.location));
        for loc in locations {
            if (loc.end_line, loc.end_col) > (end_line, end_col) {
                end_line = loc.end_line;
                end_col = loc.end_col;
            }
        }
        Location::new(self.facts.file.clone(), 0, 0, end_line, end_col)
    }

    /// The scope a definition is declared in: the innermost scope containing
    /// its extent, stepping out once when that scope IS the definition's own
    /// body (a function's name lives in the parent, not in itself).
    fn owning_scope<'t>(tree: &'t ScopeTree, def_location: &Location) -> &'t ScopeId {
        let innermost = tree.innermost_at(def_location);
        if innermost.location == *def_location {
            tree.parent_of(innermost).unwrap_or_else(|| tree.root())
        } else {
            innermost
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{RawDef, RawExport, RawImport, RawRef};

    fn loc(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Location {
        Location::new("a.ts", start_line, start_col, end_line, end_col)
    }

    fn facts_with_function() -> FileFacts {
        let mut facts = FileFacts::new("a.ts");
        facts.scopes.push(ScopeId::new(
            ScopeKind::Function,
            loc(2, 0, 8, 1),
            Some(SmolStr::new("foo")),
        ));
        facts.defs.push(RawDef::new(
            "foo",
            SymbolKind::Function,
            loc(2, 0, 8, 1),
        ));
        facts.defs.push(RawDef::new(
            "counter",
            SymbolKind::Variable,
            loc(3, 4, 3, 20),
        ));
        facts
    }

    #[test]
    fn test_function_owned_by_global() {
        let (index, diags) = FileIndexer::new(&facts_with_function()).run();
        assert!(diags.is_empty());

        let (id, _) = index.defs_named("foo").next().unwrap();
        assert_eq!(index.scope_of(id).unwrap().kind, ScopeKind::Global);
    }

    #[test]
    fn test_local_owned_by_function() {
        let (index, _) = FileIndexer::new(&facts_with_function()).run();

        let (id, _) = index.defs_named("counter").next().unwrap();
        assert_eq!(index.scope_of(id).unwrap().kind, ScopeKind::Function);
    }

    #[test]
    fn test_usage_matches_nearest_definition() {
        let mut facts = facts_with_function();
        facts
            .refs
            .push(RawRef::new("counter", UsageKind::Reference, loc(5, 8, 5, 15)));

        let (index, _) = FileIndexer::new(&facts).run();

        let (id, _) = index.defs_named("counter").next().unwrap();
        assert_eq!(index.usages_of(id).len(), 1);
        assert!(!index.is_unresolved("counter"));
    }

    #[test]
    fn test_unmatched_usage_recorded() {
        let mut facts = facts_with_function();
        facts
            .refs
            .push(RawRef::new("ghost", UsageKind::Call, loc(5, 8, 5, 13)));

        let (index, _) = FileIndexer::new(&facts).run();
        assert!(index.is_unresolved("ghost"));
    }

    #[test]
    fn test_import_becomes_definition() {
        let mut facts = FileFacts::new("a.ts");
        facts.imports.push(RawImport::new(
            "bar",
            "bar",
            "b.ts",
            loc(0, 0, 0, 30),
        ));
        facts
            .refs
            .push(RawRef::new("bar", UsageKind::Call, loc(4, 0, 4, 5)));

        let (index, _) = FileIndexer::new(&facts).run();

        let (_, def) = index.defs_named("bar").next().unwrap();
        assert_eq!(def.kind, SymbolKind::Import);
        assert!(!index.is_unresolved("bar"));
    }

    #[test]
    fn test_export_flips_flag() {
        let mut facts = facts_with_function();
        facts
            .exports
            .push(RawExport::new("foo", loc(10, 0, 10, 12)));

        let (index, _) = FileIndexer::new(&facts).run();
        assert!(index.exported_def("foo").is_some());
    }

    #[test]
    fn test_dangling_export_warns() {
        let mut facts = FileFacts::new("a.ts");
        facts
            .exports
            .push(RawExport::new("nothing", loc(0, 0, 0, 10)));

        let (_, diags) = FileIndexer::new(&facts).run();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].phase, AnalysisPhase::ExportDetection);
    }

    #[test]
    fn test_duplicate_definition_kept_and_warned() {
        let mut facts = FileFacts::new("a.ts");
        facts
            .defs
            .push(RawDef::new("twice", SymbolKind::Function, loc(1, 0, 2, 1)));
        facts
            .defs
            .push(RawDef::new("twice", SymbolKind::Function, loc(4, 0, 5, 1)));

        let (index, diags) = FileIndexer::new(&facts).run();

        assert_eq!(index.defs_named("twice").count(), 2);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].phase, AnalysisPhase::ScopeAnalysis);
    }

    #[test]
    fn test_member_of() {
        let mut facts = FileFacts::new("a.ts");
        facts.defs.push(RawDef::new(
            "User",
            SymbolKind::Class,
            loc(1, 0, 10, 1),
        ));
        facts.defs.push(
            RawDef::new("save", SymbolKind::Method, loc(3, 4, 5, 5)).with_qualifier("User"),
        );

        let (index, _) = FileIndexer::new(&facts).run();

        assert!(index.member_of("User", "save").is_some());
        assert!(index.member_of("User", "load").is_none());
        assert!(index.member_of("Account", "save").is_none());
    }

    #[test]
    fn test_function_at() {
        let (index, _) = FileIndexer::new(&facts_with_function()).run();

        let inside = loc(5, 2, 5, 10);
        let (_, def) = index.function_at(&inside).unwrap();
        assert_eq!(def.name.as_str(), "foo");

        let outside = loc(20, 0, 20, 4);
        assert!(index.function_at(&outside).is_none());
    }
}
