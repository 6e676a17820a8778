//! Call graph construction.
//!
//! Materializes resolved call usages into an immutable node/edge graph.
//! Only `High` and `Medium` resolutions become edges; a call whose target
//! is not trustworthy enough to graph stays out of the graph and in the
//! diagnostics. The builder is consumed by [`CallGraphBuilder::build`],
//! which derives node degrees, computes entry points, and fail-fast checks
//! the no-dangling-edges invariant.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::{FilePath, Location, SymbolId};
use crate::chain::CallChain;
use crate::index::SymbolDefinition;

/// One call occurrence in source.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallSite {
    /// Where the call expression sits.
    pub location: Location,
    /// The callee name as written at the site.
    pub callee_name: SmolStr,
}

impl CallSite {
    /// Create a call site record.
    pub fn new(location: Location, callee_name: impl Into<SmolStr>) -> Self {
        Self {
            location,
            callee_name: callee_name.into(),
        }
    }
}

/// A function, method, or constructor in the call graph.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionNode {
    /// The definition's id.
    pub symbol: SymbolId,
    /// Declared name.
    pub name: SmolStr,
    /// The definition's extent.
    pub location: Location,
    /// The file declaring it.
    pub file: FilePath,
    /// Whether the definition is exported.
    pub exported: bool,
    /// Whether the node is an entry point (derived at build time).
    pub is_entry_point: bool,
    /// Number of outgoing calls, counting edge multiplicity.
    pub outgoing_calls: u32,
    /// Number of incoming calls, counting edge multiplicity.
    pub incoming_calls: u32,
}

/// An aggregated call relationship between two nodes.
///
/// Multiple call sites between the same ordered pair collapse into one
/// edge: `count` is incremented per occurrence, `call_site` keeps the
/// first occurrence in source order.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallEdge {
    /// The calling function.
    pub source: SymbolId,
    /// The called function.
    pub target: SymbolId,
    /// First call site encountered in source order.
    pub call_site: CallSite,
    /// How many call sites the edge aggregates (>= 1).
    pub count: u32,
}

/// The whole-program call graph, frozen after [`CallGraphBuilder::build`].
#[derive(Clone, Debug)]
pub struct CallGraph {
    nodes: IndexMap<SymbolId, FunctionNode>,
    edges: Vec<CallEdge>,
    entry_points: Vec<SymbolId>,
    /// Edge indices per source node, sorted by call-site source order.
    adjacency: FxHashMap<SymbolId, Vec<usize>>,
    chains: Option<Vec<CallChain>>,
}

impl CallGraph {
    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &FunctionNode> {
        self.nodes.values()
    }

    /// Look up one node.
    pub fn node(&self, id: &SymbolId) -> Option<&FunctionNode> {
        self.nodes.get(id)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All edges, ordered by first occurrence.
    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    /// Entry points, in node insertion order.
    pub fn entry_points(&self) -> &[SymbolId] {
        &self.entry_points
    }

    /// Outgoing edges of a node, in call-site source order.
    pub fn outgoing(&self, id: &SymbolId) -> impl Iterator<Item = &CallEdge> {
        self.adjacency
            .get(id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// Sum of all edge counts: every graphed call occurrence.
    pub fn total_call_count(&self) -> u32 {
        self.edges.iter().map(|e| e.count).sum()
    }

    /// Precomputed call chains, when attached via [`CallGraph::with_chains`].
    pub fn chains(&self) -> Option<&[CallChain]> {
        self.chains.as_deref()
    }

    /// Attach precomputed call chains, consuming the graph.
    pub fn with_chains(mut self, chains: Vec<CallChain>) -> Self {
        self.chains = Some(chains);
        self
    }
}

/// Accumulates nodes and call occurrences, then freezes into a [`CallGraph`].
#[derive(Debug, Default)]
pub struct CallGraphBuilder {
    nodes: IndexMap<SymbolId, FunctionNode>,
    edges: IndexMap<(SymbolId, SymbolId), CallEdge>,
    /// Targets of call sites outside any function; they are called within
    /// the unit even though no edge carries the call.
    called_from_top_level: FxHashSet<SymbolId>,
    roots: Vec<SymbolId>,
}

impl CallGraphBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Designate an analysis root: an entry point regardless of callers.
    pub fn designate_root(&mut self, id: SymbolId) {
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
    }

    /// Add a node for a callable definition.
    ///
    /// Definitions of other kinds are ignored: only functions, methods,
    /// and classes (constructors) become nodes.
    pub fn add_function(&mut self, id: SymbolId, def: &SymbolDefinition) {
        if !def.kind.is_callable() {
            return;
        }
        self.nodes.entry(id.clone()).or_insert(FunctionNode {
            symbol: id,
            name: def.name.clone(),
            location: def.location.clone(),
            file: def.location.file.clone(),
            exported: def.exported,
            is_entry_point: false,
            outgoing_calls: 0,
            incoming_calls: 0,
        });
    }

    /// Whether a node exists for `id`.
    pub fn has_node(&self, id: &SymbolId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Record one resolved call occurrence.
    ///
    /// `source` is the enclosing function's node, or `None` for a call at
    /// file top level (no edge is created, but the target is remembered so
    /// entry-point computation sees it as called).
    ///
    /// # Panics
    /// Panics if either endpoint has no node. Edges into or out of
    /// nothing are a programming defect, caught here rather than
    /// propagated into traversal.
    pub fn record_call(&mut self, source: Option<&SymbolId>, target: &SymbolId, site: CallSite) {
        assert!(
            self.nodes.contains_key(target),
            "call edge target {target} has no node"
        );

        let Some(source) = source else {
            self.called_from_top_level.insert(target.clone());
            return;
        };

        assert!(
            self.nodes.contains_key(source),
            "call edge source {source} has no node"
        );

        self.edges
            .entry((source.clone(), target.clone()))
            .and_modify(|edge| {
                edge.count += 1;
                // Keep the call site that comes first in source order even
                // if occurrences arrive out of order.
                if site.location.start() < edge.call_site.location.start()
                    && site.location.file == edge.call_site.location.file
                {
                    edge.call_site = site.clone();
                }
            })
            .or_insert_with(|| CallEdge {
                source: source.clone(),
                target: target.clone(),
                call_site: site,
                count: 1,
            });
    }

    /// Freeze into a [`CallGraph`]: derive node degrees, sort adjacency by
    /// call-site source order, and compute entry points.
    pub fn build(self) -> CallGraph {
        let mut nodes = self.nodes;
        let edges: Vec<CallEdge> = self.edges.into_values().collect();

        // Incoming calls from other functions; a self-edge makes a function
        // recursive, not "called from elsewhere", so it does not disqualify
        // an entry point.
        let mut external_incoming: FxHashMap<&SymbolId, u32> = FxHashMap::default();

        for edge in &edges {
            // record_call checked both endpoints; re-assert on the frozen
            // set so a defective builder extension cannot slip through.
            assert!(
                nodes.contains_key(&edge.source) && nodes.contains_key(&edge.target),
                "dangling call edge {} -> {}",
                edge.source,
                edge.target
            );
            nodes[&edge.source].outgoing_calls += edge.count;
            nodes[&edge.target].incoming_calls += edge.count;
            if edge.source != edge.target {
                *external_incoming.entry(&edge.target).or_default() += edge.count;
            }
        }

        let mut adjacency: FxHashMap<SymbolId, Vec<usize>> = FxHashMap::default();
        for (i, edge) in edges.iter().enumerate() {
            adjacency.entry(edge.source.clone()).or_default().push(i);
        }
        for indices in adjacency.values_mut() {
            indices.sort_by_key(|&i| edges[i].call_site.location.start());
        }

        let mut entry_points: Vec<SymbolId> = Vec::new();
        for (id, node) in nodes.iter_mut() {
            let designated = self.roots.contains(id);
            let externally_reachable = node.exported;
            let uncalled = external_incoming.get(id).copied().unwrap_or(0) == 0
                && !self.called_from_top_level.contains(id);
            if designated || (externally_reachable && uncalled) {
                node.is_entry_point = true;
                entry_points.push(id.clone());
            }
        }

        CallGraph {
            nodes,
            edges,
            entry_points,
            adjacency,
            chains: None,
        }
    }
}
