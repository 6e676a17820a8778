//! # skein-base
//!
//! Core library for multi-language reference resolution, call graph
//! construction, and call chain analysis.
//!
//! Language front ends hand over per-file syntactic facts (definitions,
//! references, imports/exports, assignment observations); this crate
//! resolves every reference to the definition it denotes with a graded
//! confidence, links files through import/export semantics, materializes
//! the whole-program call graph, and derives execution chains (including
//! recursion) from the graph's entry points.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! engine      → orchestration: parallel indexing, merge, graph, chains
//!   ↓
//! chain       → call chain enumeration over the frozen graph
//! graph       → call graph construction from resolved calls
//!   ↓
//! resolve     → graded scope-walking reference resolution
//!   ↓
//! linkage     → cross-file import/export lookup table (merge phase)
//! index       → per-file symbol index + scope tree
//! types       → assignment-based type discovery
//!   ↓
//! facts       → raw front-end input records
//! diagnostics → phases, severities, diagnostic sink
//!   ↓
//! base        → primitives (FilePath, Location, ScopeId, SymbolId)
//! ```
//!
//! Everything produced is immutable once returned: indexes, linkage,
//! graph, and chains are built once, frozen, and safe to share across
//! readers without copying.

/// Foundation types: paths, locations, scope and symbol identity
pub mod base;

/// Raw per-file facts from language front ends
pub mod facts;

/// Diagnostics: phases, severities, collecting sink
pub mod diagnostics;

/// Per-file symbol indexing and scope trees
pub mod index;

/// Assignment-based type discovery
pub mod types;

/// Cross-file import/export linkage
pub mod linkage;

/// Graded reference resolution
pub mod resolve;

/// Call graph construction
pub mod graph;

/// Call chain analysis
pub mod chain;

/// Analysis orchestration
pub mod engine;

// Re-export the types most callers touch.
pub use base::{FilePath, LineCol, LineIndex, Location, ScopeId, ScopeKind, SymbolId};
pub use chain::{CallChain, CallChainAnalysisResult, CallChainAnalyzer, CallChainNode};
pub use diagnostics::{AnalysisError, AnalysisPhase, DiagnosticSink, Severity};
pub use engine::{AnalysisConfig, AnalysisResult, analyze};
pub use facts::{
    FileFacts, RawAssignment, RawDef, RawExport, RawImport, RawRef, SymbolKind, TypeScope,
    UsageKind,
};
pub use graph::{CallEdge, CallGraph, CallGraphBuilder, CallSite, FunctionNode};
pub use index::{FileIndexer, ScopeTree, SymbolDefinition, SymbolIndex, SymbolUsage};
pub use linkage::{ImportLinkage, LinkKind, LinkTarget};
pub use resolve::{Confidence, Resolution, ResolvedSymbol, Resolver};
pub use types::{TypeDiscovery, TypeTracker};
