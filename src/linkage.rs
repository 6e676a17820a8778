//! Cross-file import/export linkage.
//!
//! A pure lookup table mapping `(importing file, local name)` to the
//! definition an import binds to. Built exactly once per run, in a merge
//! phase that sees every per-file index: this is the synchronization
//! point of the pipeline, because an import may name a file whose index
//! was produced by another worker. Never mutated afterwards.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::debug;

use crate::base::{FilePath, SymbolId};
use crate::diagnostics::{AnalysisError, AnalysisPhase, DiagnosticSink};
use crate::facts::{FileFacts, RawImport, SymbolKind};
use crate::index::{SymbolDefinition, SymbolIndex};

/// How faithfully an import link preserves the exported name.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkKind {
    /// Un-renamed, value-level import of a directly exported definition.
    Direct,
    /// Imported under a different local name.
    Renamed,
    /// Type-only import.
    TypeOnly,
    /// Reached through one or more re-export hops.
    Reexported,
}

impl LinkKind {
    /// Direct links resolve at full confidence; everything else degrades.
    pub const fn is_direct(self) -> bool {
        matches!(self, LinkKind::Direct)
    }

    /// The reason tag attached to degraded resolutions.
    pub const fn reason(self) -> &'static str {
        match self {
            LinkKind::Direct => "direct_import",
            LinkKind::Renamed => "renamed_import",
            LinkKind::TypeOnly => "type_only_import",
            LinkKind::Reexported => "reexported_import",
        }
    }
}

/// The definition an import ultimately binds to.
#[derive(Clone, Debug)]
pub struct LinkTarget {
    /// The file that really declares the definition.
    pub source_file: FilePath,
    /// The name it is exported under there.
    pub exported_name: SmolStr,
    /// The definition's id in its home index.
    pub symbol: SymbolId,
    /// The definition itself.
    pub definition: SymbolDefinition,
    /// How the link was established.
    pub kind: LinkKind,
}

/// The per-run import/export lookup table.
#[derive(Clone, Debug, Default)]
pub struct ImportLinkage {
    links: FxHashMap<(FilePath, SmolStr), LinkTarget>,
}

impl ImportLinkage {
    /// Build the table over every file's import records and indexes.
    ///
    /// Unresolved imports are reported to `sink` as warnings and left out
    /// of the table; they degrade resolution confidence later rather than
    /// failing the run.
    pub fn build(
        files: &[FileFacts],
        indexes: &IndexMap<FilePath, SymbolIndex>,
        sink: &mut DiagnosticSink,
    ) -> Self {
        let imports_by_file: FxHashMap<&FilePath, &[RawImport]> = files
            .iter()
            .map(|f| (&f.file, f.imports.as_slice()))
            .collect();

        let mut links = FxHashMap::default();

        for facts in files {
            for import in &facts.imports {
                let mut visited = FxHashSet::default();
                match follow_import(import, &imports_by_file, indexes, &mut visited) {
                    Some(mut target) => {
                        if import.is_type_only {
                            target.kind = LinkKind::TypeOnly;
                        } else if import.local_name != import.external_name && !import.is_default {
                            target.kind = LinkKind::Renamed;
                        }
                        links.insert((facts.file.clone(), import.local_name.clone()), target);
                    }
                    None => {
                        debug!(
                            file = %facts.file,
                            name = %import.local_name,
                            source = %import.source,
                            "import did not link to any exported definition"
                        );
                        sink.push(
                            AnalysisError::warning(
                                AnalysisPhase::ImportResolution,
                                format!(
                                    "cannot resolve import '{}' from '{}'",
                                    import.external_name, import.source
                                ),
                            )
                            .at(import.location.clone()),
                        );
                    }
                }
            }
        }

        Self { links }
    }

    /// Look up the link for a local name in a file.
    pub fn lookup(&self, file: &FilePath, local_name: &str) -> Option<&LinkTarget> {
        // Keyed clone-free lookup would need a borrowed pair; links are few
        // enough that the owned probe key is fine.
        self.links
            .get(&(file.clone(), SmolStr::new(local_name)))
    }

    /// Number of established links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether no link was established.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Chase an import to the definition it binds, following re-export hops.
///
/// Each hop looks for an exported definition of the external name in the
/// source file; an `Import`-kind definition there means the name is
/// re-exported, so the chase continues through that file's own import
/// record. The visited set cuts import cycles.
fn follow_import(
    import: &RawImport,
    imports_by_file: &FxHashMap<&FilePath, &[RawImport]>,
    indexes: &IndexMap<FilePath, SymbolIndex>,
    visited: &mut FxHashSet<(FilePath, SmolStr)>,
) -> Option<LinkTarget> {
    if !visited.insert((import.source.clone(), import.external_name.clone())) {
        return None;
    }

    let source_index = indexes.get(&import.source)?;
    let (id, def) = source_index.exported_def(&import.external_name)?;

    if def.kind != SymbolKind::Import {
        return Some(LinkTarget {
            source_file: import.source.clone(),
            exported_name: import.external_name.clone(),
            symbol: id.clone(),
            definition: def.clone(),
            kind: LinkKind::Direct,
        });
    }

    // Re-exported: the source file imported the name itself.
    let hop = imports_by_file
        .get(&import.source)?
        .iter()
        .find(|i| i.local_name == import.external_name)?;
    let mut target = follow_import(hop, imports_by_file, indexes, visited)?;
    target.kind = LinkKind::Reexported;
    Some(target)
}
