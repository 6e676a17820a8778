//! Analysis orchestration.
//!
//! Runs the whole pipeline over a corpus of per-file facts:
//!
//! 1. Per-file indexing and type collection, independent across files and
//!    fanned out over rayon workers.
//! 2. Import/export linkage: the synchronization point, since it needs
//!    every per-file index.
//! 3. Reference resolution and call graph construction, single-threaded
//!    over the frozen inputs.
//! 4. Call chain analysis over the frozen graph.
//!
//! The run always completes: resolution failures become diagnostics and
//! excluded edges, never a top-level error. Every returned structure is
//! immutable and safe to share.

use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, debug_span};

use crate::base::{FilePath, SymbolId};
use crate::chain::{CallChainAnalysisResult, CallChainAnalyzer, DEFAULT_MAX_DEPTH};
use crate::diagnostics::{AnalysisError, AnalysisPhase, DiagnosticSink};
use crate::facts::{FileFacts, UsageKind};
use crate::graph::{CallGraph, CallGraphBuilder, CallSite};
use crate::index::{FileIndexer, SymbolIndex};
use crate::linkage::ImportLinkage;
use crate::resolve::{Confidence, Resolver};
use crate::types::TypeTracker;

/// Knobs for one analysis run.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Bound on call chain traversal depth.
    pub max_chain_depth: u32,
    /// Explicitly designated analysis roots; entry points regardless of
    /// who calls them.
    pub roots: Vec<SymbolId>,
    /// Fan per-file indexing out over rayon workers. Turning this off
    /// makes runs easier to step through; results are identical either way.
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: DEFAULT_MAX_DEPTH,
            roots: Vec::new(),
            parallel: true,
        }
    }
}

/// Everything one run produced.
#[derive(Clone, Debug)]
pub struct AnalysisResult {
    /// Per-file symbol indexes, in input file order.
    pub indexes: IndexMap<FilePath, SymbolIndex>,
    /// The whole-program call graph.
    pub graph: Arc<CallGraph>,
    /// Call chains derived from the graph's entry points.
    pub chains: CallChainAnalysisResult,
    /// Best-effort diagnostic trail, all phases.
    pub errors: Vec<AnalysisError>,
}

/// Run the full pipeline over `files`.
pub fn analyze(files: Vec<FileFacts>, config: &AnalysisConfig) -> AnalysisResult {
    let mut sink = DiagnosticSink::new();

    // Phase 1: per-file work, independent and order-preserving.
    let per_file = {
        let _span = debug_span!("index_files", files = files.len()).entered();
        index_files(&files, config.parallel)
    };

    let mut indexes: IndexMap<FilePath, SymbolIndex> = IndexMap::with_capacity(per_file.len());
    let mut type_parts = Vec::with_capacity(per_file.len());
    for (file, index, diags, discoveries) in per_file {
        for d in diags {
            sink.push(d);
        }
        type_parts.push((file.clone(), discoveries));
        indexes.insert(file, index);
    }
    let types = TypeTracker::from_parts(type_parts);

    // Phase 2: the cross-file merge barrier.
    let linkage = {
        let _span = debug_span!("link_imports").entered();
        ImportLinkage::build(&files, &indexes, &mut sink)
    };
    debug!(links = linkage.len(), "import linkage built");

    // Phase 3: resolve call usages and materialize the graph.
    let graph = {
        let _span = debug_span!("build_graph").entered();
        build_graph(&files, &indexes, &types, &linkage, config, &mut sink)
    };
    let graph = Arc::new(graph);
    debug!(
        nodes = graph.node_count(),
        edges = graph.edges().len(),
        entry_points = graph.entry_points().len(),
        "call graph built"
    );

    // Phase 4: chains over the frozen graph.
    let chains = {
        let _span = debug_span!("analyze_chains").entered();
        CallChainAnalyzer::new(Arc::clone(&graph))
            .with_max_depth(config.max_chain_depth)
            .analyze()
    };
    debug!(chains = chains.chains.len(), "call chains derived");

    AnalysisResult {
        indexes,
        graph,
        chains,
        errors: sink.take(),
    }
}

type PerFileOutput = (
    FilePath,
    SymbolIndex,
    Vec<AnalysisError>,
    Vec<crate::types::TypeDiscovery>,
);

fn index_one(facts: &FileFacts) -> PerFileOutput {
    let (index, diags) = FileIndexer::new(facts).run();
    let discoveries = TypeTracker::collect_file(facts);
    (facts.file.clone(), index, diags, discoveries)
}

fn index_files(files: &[FileFacts], parallel: bool) -> Vec<PerFileOutput> {
    if parallel {
        files.par_iter().map(index_one).collect()
    } else {
        files.iter().map(index_one).collect()
    }
}

/// Resolve every call usage and fold the trustworthy ones into the graph.
fn build_graph(
    files: &[FileFacts],
    indexes: &IndexMap<FilePath, SymbolIndex>,
    types: &TypeTracker,
    linkage: &ImportLinkage,
    config: &AnalysisConfig,
    sink: &mut DiagnosticSink,
) -> CallGraph {
    let mut builder = CallGraphBuilder::new();

    for index in indexes.values() {
        for (id, def) in index.definitions() {
            builder.add_function(id.clone(), def);
        }
    }
    for root in &config.roots {
        builder.designate_root(root.clone());
    }

    let resolver = Resolver::new(indexes, types, linkage);

    for facts in files {
        let Some(index) = indexes.get(&facts.file) else {
            continue;
        };
        for usage in &facts.refs {
            if usage.kind != UsageKind::Call {
                continue;
            }

            let resolution = resolver.resolve(&facts.file, usage);
            match resolution.confidence() {
                Confidence::High | Confidence::Medium => {
                    let target = resolution
                        .into_value()
                        .expect("resolved tiers carry a value");
                    if !builder.has_node(&target.symbol) {
                        sink.push(
                            AnalysisError::info(
                                AnalysisPhase::CallGraph,
                                format!("call target '{}' is not callable", usage.name),
                            )
                            .at(usage.location.clone()),
                        );
                        continue;
                    }
                    let source = index
                        .function_at(&usage.location)
                        .map(|(id, _)| id.clone());
                    if source.is_none() {
                        sink.push(
                            AnalysisError::info(
                                AnalysisPhase::CallGraph,
                                format!("call to '{}' outside any function", usage.name),
                            )
                            .at(usage.location.clone()),
                        );
                    }
                    let site = CallSite::new(usage.location.clone(), usage.name.clone());
                    builder.record_call(source.as_ref(), &target.symbol, site);
                }
                Confidence::Low | Confidence::Failed => {
                    // Not trustworthy enough to graph; keep the trail.
                    sink.push(
                        AnalysisError::info(
                            AnalysisPhase::CallGraph,
                            format!(
                                "call to '{}' excluded from graph ({})",
                                usage.name,
                                resolution.reason().unwrap_or("unknown")
                            ),
                        )
                        .at(usage.location.clone()),
                    );
                }
            }
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Location;
    use crate::facts::{RawDef, RawImport, RawRef, SymbolKind};

    fn loc(file: &str, start_line: u32, end_line: u32) -> Location {
        Location::new(file, start_line, 0, end_line, 40)
    }

    /// a.ts: foo() calls bar (imported); b.ts: exports bar.
    fn cross_file_corpus() -> Vec<FileFacts> {
        let mut a = FileFacts::new("a.ts");
        a.scopes.push(crate::base::ScopeId::new(
            crate::base::ScopeKind::Function,
            loc("a.ts", 2, 6),
            Some(smol_str::SmolStr::new("foo")),
        ));
        a.defs
            .push(RawDef::new("foo", SymbolKind::Function, loc("a.ts", 2, 6)));
        a.imports
            .push(RawImport::new("bar", "bar", "b.ts", loc("a.ts", 0, 0)));
        a.refs
            .push(RawRef::new("bar", UsageKind::Call, loc("a.ts", 4, 4)));

        let mut b = FileFacts::new("b.ts");
        b.defs
            .push(RawDef::new("bar", SymbolKind::Function, loc("b.ts", 1, 3)).exported());

        vec![a, b]
    }

    #[test]
    fn test_cross_file_edge() {
        let result = analyze(cross_file_corpus(), &AnalysisConfig::default());

        assert_eq!(result.graph.edges().len(), 1);
        let edge = &result.graph.edges()[0];
        assert_eq!(edge.call_site.callee_name.as_str(), "bar");

        let target = result.graph.node(&edge.target).unwrap();
        assert_eq!(target.file, FilePath::from("b.ts"));
        assert!(!target.is_entry_point);
    }

    #[test]
    fn test_ghost_call_is_not_fatal() {
        let mut a = FileFacts::new("a.ts");
        a.refs
            .push(RawRef::new("ghost", UsageKind::Call, loc("a.ts", 1, 1)));

        let result = analyze(vec![a], &AnalysisConfig::default());

        assert!(result.graph.edges().is_empty());
        assert!(
            result.indexes[&FilePath::from("a.ts")].is_unresolved("ghost")
        );
        assert!(result.errors.iter().all(|e| e.severity != crate::diagnostics::Severity::Error));
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let parallel = analyze(cross_file_corpus(), &AnalysisConfig::default());
        let sequential = analyze(
            cross_file_corpus(),
            &AnalysisConfig {
                parallel: false,
                ..AnalysisConfig::default()
            },
        );

        assert_eq!(
            parallel.graph.edges().len(),
            sequential.graph.edges().len()
        );
        assert_eq!(
            parallel.graph.entry_points(),
            sequential.graph.entry_points()
        );
        assert_eq!(parallel.chains.chains.len(), sequential.chains.chains.len());
    }
}
