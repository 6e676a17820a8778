//! Call chain analysis.
//!
//! Enumerates execution paths through the call graph from each entry
//! point. Traversal is depth-first with an explicit frame stack, so depth
//! is bounded by configuration, never by the thread's call stack. A chain
//! ends at a leaf, at the configured depth bound, or at a recursion point:
//! the second occurrence of a symbol on the current path, which is flagged
//! and never followed further.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::base::{Location, SymbolId};
use crate::graph::{CallGraph, CallSite};

/// Default bound on traversal depth. Deep enough for real call stacks,
/// bounded against pathological graphs.
pub const DEFAULT_MAX_DEPTH: u32 = 64;

/// One step of an execution path.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallChainNode {
    /// The function at this step.
    pub symbol: SymbolId,
    /// The function's location.
    pub location: Location,
    /// 0-based distance from the chain's entry point.
    pub depth: u32,
    /// Whether this step closes a cycle on the current path.
    pub is_recursive: bool,
    /// The call that reached this step; `None` for the entry point.
    pub call: Option<CallSite>,
}

/// One execution path from an entry point to a leaf or recursion point.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallChain {
    /// The entry point the chain starts from.
    pub entry_point: SymbolId,
    /// The steps, entry point first.
    pub nodes: Vec<CallChainNode>,
    /// Depth of the deepest step.
    pub max_depth: u32,
    /// Whether the chain ends at a recursion point.
    pub has_recursion: bool,
    /// The ordered symbol ids forming the path.
    pub execution_path: Vec<SymbolId>,
}

/// Everything the chain analysis produced.
#[derive(Clone, Debug)]
pub struct CallChainAnalysisResult {
    /// Every chain found, grouped by entry point in entry-point order.
    pub chains: Vec<CallChain>,
    /// The subset of chains flagged recursive.
    pub recursive_chains: Vec<CallChain>,
    /// Maximum depth reached across all chains.
    pub max_depth: u32,
    /// Sum of all edge counts in the graph, counting every graphed call,
    /// not just those on a found chain.
    pub total_call_count: u32,
    /// The graph the chains were derived from.
    pub graph: Arc<CallGraph>,
}

/// Depth-first chain enumerator over a frozen call graph.
pub struct CallChainAnalyzer {
    graph: Arc<CallGraph>,
    max_depth: u32,
}

/// One level of the explicit DFS stack: a node and the index of the next
/// outgoing edge to try.
struct Frame {
    symbol: SymbolId,
    next_edge: usize,
}

impl CallChainAnalyzer {
    /// Create an analyzer with the default depth bound.
    pub fn new(graph: Arc<CallGraph>) -> Self {
        Self {
            graph,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the traversal depth bound.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enumerate chains from every entry point.
    pub fn analyze(&self) -> CallChainAnalysisResult {
        let mut chains = Vec::new();
        for entry in self.graph.entry_points() {
            self.walk(entry, &mut chains);
        }

        let recursive_chains: Vec<CallChain> = chains
            .iter()
            .filter(|c| c.has_recursion)
            .cloned()
            .collect();
        let max_depth = chains.iter().map(|c| c.max_depth).max().unwrap_or(0);

        CallChainAnalysisResult {
            recursive_chains,
            max_depth,
            total_call_count: self.graph.total_call_count(),
            graph: Arc::clone(&self.graph),
            chains,
        }
    }

    /// Depth-first enumeration from one entry point.
    fn walk(&self, entry: &SymbolId, chains: &mut Vec<CallChain>) {
        let Some(entry_node) = self.graph.node(entry) else {
            return;
        };

        let mut path: Vec<CallChainNode> = vec![CallChainNode {
            symbol: entry.clone(),
            location: entry_node.location.clone(),
            depth: 0,
            is_recursive: false,
            call: None,
        }];
        let mut on_path: FxHashSet<SymbolId> = FxHashSet::default();
        on_path.insert(entry.clone());

        if self.out_degree(entry) == 0 || self.max_depth == 0 {
            chains.push(snapshot(entry, &path, false));
            return;
        }

        let mut frames: SmallVec<[Frame; 16]> = SmallVec::new();
        frames.push(Frame {
            symbol: entry.clone(),
            next_edge: 0,
        });

        while let Some(frame) = frames.last_mut() {
            let Some(edge) = self.graph.outgoing(&frame.symbol).nth(frame.next_edge) else {
                frames.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(&done.symbol);
                }
                continue;
            };
            frame.next_edge += 1;

            let depth = path.len() as u32;
            let target = &edge.target;
            let target_node = self
                .graph
                .node(target)
                .expect("graph construction rejects dangling edges");
            let step = CallChainNode {
                symbol: target.clone(),
                location: target_node.location.clone(),
                depth,
                is_recursive: on_path.contains(target),
                call: Some(edge.call_site.clone()),
            };

            if step.is_recursive {
                // Second occurrence on the path: flag, emit, do not follow.
                path.push(step);
                chains.push(snapshot(entry, &path, true));
                path.pop();
            } else if self.out_degree(target) == 0 || depth >= self.max_depth {
                // Leaf, or truncated at the configured bound.
                path.push(step);
                chains.push(snapshot(entry, &path, false));
                path.pop();
            } else {
                on_path.insert(target.clone());
                path.push(step);
                frames.push(Frame {
                    symbol: target.clone(),
                    next_edge: 0,
                });
            }
        }
    }

    fn out_degree(&self, id: &SymbolId) -> usize {
        self.graph.outgoing(id).count()
    }
}

/// Freeze the current path into a chain.
fn snapshot(entry: &SymbolId, path: &[CallChainNode], has_recursion: bool) -> CallChain {
    CallChain {
        entry_point: entry.clone(),
        nodes: path.to_vec(),
        max_depth: (path.len() as u32).saturating_sub(1),
        has_recursion,
        execution_path: path.iter().map(|n| n.symbol.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::SymbolKind;
    use crate::graph::CallGraphBuilder;
    use crate::index::SymbolDefinition;
    use smol_str::SmolStr;

    fn id(name: &str) -> SymbolId {
        SymbolId::from_scope_and_name("global@@a.ts:0:0:99:0", name)
    }

    fn def(name: &str, line: u32) -> SymbolDefinition {
        SymbolDefinition {
            name: SmolStr::new(name),
            qualifier: None,
            kind: SymbolKind::Function,
            location: Location::new("a.ts", line, 0, line + 2, 1),
            exported: true,
        }
    }

    fn site(line: u32, callee: &str) -> CallSite {
        CallSite::new(Location::new("a.ts", line, 4, line, 20), callee)
    }

    /// main -> helper -> leaf, with helper also calling leaf2.
    fn diamond_free_graph() -> Arc<CallGraph> {
        let mut b = CallGraphBuilder::new();
        b.add_function(id("main"), &def("main", 1));
        b.add_function(id("helper"), &def("helper", 10));
        b.add_function(id("leaf"), &def("leaf", 20));
        b.add_function(id("leaf2"), &def("leaf2", 30));
        b.record_call(Some(&id("main")), &id("helper"), site(2, "helper"));
        b.record_call(Some(&id("helper")), &id("leaf"), site(11, "leaf"));
        b.record_call(Some(&id("helper")), &id("leaf2"), site(12, "leaf2"));
        Arc::new(b.build())
    }

    #[test]
    fn test_branching_produces_one_chain_per_leaf() {
        let result = CallChainAnalyzer::new(diamond_free_graph()).analyze();

        assert_eq!(result.chains.len(), 2);
        let paths: Vec<Vec<&str>> = result
            .chains
            .iter()
            .map(|c| {
                c.execution_path
                    .iter()
                    .map(|s| s.as_str().rsplit("::").next().unwrap())
                    .collect()
            })
            .collect();
        // Sibling order follows call-site source order.
        assert_eq!(paths[0], vec!["main", "helper", "leaf"]);
        assert_eq!(paths[1], vec!["main", "helper", "leaf2"]);
        assert_eq!(result.max_depth, 2);
        assert!(result.recursive_chains.is_empty());
    }

    #[test]
    fn test_depths_are_zero_based() {
        let result = CallChainAnalyzer::new(diamond_free_graph()).analyze();
        let chain = &result.chains[0];

        let depths: Vec<u32> = chain.nodes.iter().map(|n| n.depth).collect();
        assert_eq!(depths, vec![0, 1, 2]);
        assert!(chain.nodes[0].call.is_none());
        assert!(chain.nodes[1].call.is_some());
    }

    #[test]
    fn test_self_recursion() {
        // function f() { f(); }
        let mut b = CallGraphBuilder::new();
        b.add_function(id("f"), &def("f", 1));
        b.record_call(Some(&id("f")), &id("f"), site(2, "f"));
        let result = CallChainAnalyzer::new(Arc::new(b.build())).analyze();

        assert_eq!(result.chains.len(), 1);
        let chain = &result.chains[0];
        assert!(chain.has_recursion);
        assert_eq!(chain.max_depth, 1);
        assert_eq!(chain.execution_path, vec![id("f"), id("f")]);
        assert!(chain.nodes[1].is_recursive);
    }

    #[test]
    fn test_mutual_recursion_stops_at_second_occurrence() {
        // a -> b -> a: flagged, not followed past the second a. Both
        // functions receive calls, so `a` is designated as the root.
        let mut b = CallGraphBuilder::new();
        b.add_function(id("a"), &def("a", 1));
        b.add_function(id("b"), &def("b", 10));
        b.record_call(Some(&id("a")), &id("b"), site(2, "b"));
        b.record_call(Some(&id("b")), &id("a"), site(11, "a"));
        b.designate_root(id("a"));
        let result = CallChainAnalyzer::new(Arc::new(b.build())).analyze();

        assert_eq!(result.chains.len(), 1);
        let chain = &result.chains[0];
        assert!(chain.has_recursion);
        assert_eq!(chain.execution_path, vec![id("a"), id("b"), id("a")]);
    }

    #[test]
    fn test_entry_with_no_calls_yields_single_node_chain() {
        let mut b = CallGraphBuilder::new();
        b.add_function(id("lonely"), &def("lonely", 1));
        let result = CallChainAnalyzer::new(Arc::new(b.build())).analyze();

        assert_eq!(result.chains.len(), 1);
        assert_eq!(result.chains[0].max_depth, 0);
        assert!(!result.chains[0].has_recursion);
    }

    #[test]
    fn test_depth_bound_truncates() {
        // chain of 5, bounded at depth 2.
        let mut b = CallGraphBuilder::new();
        for (i, name) in ["f0", "f1", "f2", "f3", "f4"].iter().enumerate() {
            b.add_function(id(name), &def(name, (i as u32) * 10 + 1));
        }
        for (i, pair) in [("f0", "f1"), ("f1", "f2"), ("f2", "f3"), ("f3", "f4")]
            .iter()
            .enumerate()
        {
            b.record_call(
                Some(&id(pair.0)),
                &id(pair.1),
                site((i as u32) * 10 + 2, pair.1),
            );
        }
        let result = CallChainAnalyzer::new(Arc::new(b.build()))
            .with_max_depth(2)
            .analyze();

        assert_eq!(result.chains.len(), 1);
        let chain = &result.chains[0];
        assert_eq!(chain.max_depth, 2);
        assert_eq!(chain.execution_path.len(), 3);
        assert!(!chain.has_recursion);
    }

    #[test]
    fn test_total_call_count_covers_whole_graph() {
        // leaf2's edge count contributes even when multiplicity > 1.
        let mut b = CallGraphBuilder::new();
        b.add_function(id("main"), &def("main", 1));
        b.add_function(id("helper"), &def("helper", 10));
        b.record_call(Some(&id("main")), &id("helper"), site(2, "helper"));
        b.record_call(Some(&id("main")), &id("helper"), site(3, "helper"));
        let result = CallChainAnalyzer::new(Arc::new(b.build())).analyze();

        assert_eq!(result.total_call_count, 2);
    }
}
