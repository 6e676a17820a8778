//! Graded reference resolution.
//!
//! Turns a raw usage (a name, at a location, possibly with a receiver)
//! into a [`Resolution`] carrying both the resolved definition and how much
//! the evidence supports it. Resolution is a pure function of the frozen
//! per-file indexes, the type tracker, and the import linkage: it mutates
//! nothing and can run over any subset of usages in any order.
//!
//! The algorithm, nearest evidence first:
//!
//! 1. Walk the scope chain outward from the usage's innermost scope; the
//!    nearest scope with any same-name candidate decides the lexical
//!    outcome (shadowing).
//! 2. A single, kind-compatible candidate there resolves `High`.
//! 3. Member accesses (`object.member`) consult type discovery for the
//!    receiver and dispatch into the inferred class at `Medium("inferred")`.
//! 4. Names bound by imports follow the cross-file linkage at the link's
//!    own confidence.
//! 5. Same-depth ambiguity resolves `Low("partial_match")` to the lexically
//!    first candidate; an incompatible single match `Low("kind_mismatch")`.
//! 6. Otherwise `Failed("not_found")`.

use indexmap::IndexMap;

use crate::base::{FilePath, SymbolId};
use crate::facts::{RawRef, SymbolKind};
use crate::index::{SymbolDefinition, SymbolIndex};
use crate::linkage::{ImportLinkage, LinkTarget};
use crate::types::TypeTracker;

/// Graded trust in a resolution, totally ordered.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Confidence {
    Failed,
    Low,
    Medium,
    High,
}

/// A graded lookup result.
///
/// Exactly one of four tiers; the tier is fixed at creation and there is
/// deliberately no API for raising it afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Resolution<T> {
    /// Exact, unambiguous match.
    High(T),
    /// Resolved with a caveat (e.g. `"inferred"`).
    Medium(T, &'static str),
    /// Resolved on weak evidence (e.g. `"partial_match"`).
    Low(T, &'static str),
    /// Nothing found (e.g. `"not_found"`).
    Failed(&'static str),
}

impl<T> Resolution<T> {
    /// The tier of this resolution.
    pub fn confidence(&self) -> Confidence {
        match self {
            Resolution::High(_) => Confidence::High,
            Resolution::Medium(..) => Confidence::Medium,
            Resolution::Low(..) => Confidence::Low,
            Resolution::Failed(_) => Confidence::Failed,
        }
    }

    /// The resolved value, unless the lookup failed.
    pub fn value(&self) -> Option<&T> {
        match self {
            Resolution::High(v) | Resolution::Medium(v, _) | Resolution::Low(v, _) => Some(v),
            Resolution::Failed(_) => None,
        }
    }

    /// Consume into the resolved value.
    pub fn into_value(self) -> Option<T> {
        match self {
            Resolution::High(v) | Resolution::Medium(v, _) | Resolution::Low(v, _) => Some(v),
            Resolution::Failed(_) => None,
        }
    }

    /// The reason tag, for every tier below `High`.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Resolution::High(_) => None,
            Resolution::Medium(_, r) | Resolution::Low(_, r) | Resolution::Failed(r) => Some(*r),
        }
    }

    /// Whether a value was resolved at any tier.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Failed(_))
    }

    /// Map the resolved value, preserving tier and reason.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::High(v) => Resolution::High(f(v)),
            Resolution::Medium(v, r) => Resolution::Medium(f(v), r),
            Resolution::Low(v, r) => Resolution::Low(f(v), r),
            Resolution::Failed(r) => Resolution::Failed(r),
        }
    }
}

/// A resolved reference target: the definition plus its id.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedSymbol {
    /// The target's id in its home index.
    pub symbol: SymbolId,
    /// The target definition.
    pub definition: SymbolDefinition,
}

impl ResolvedSymbol {
    fn new(symbol: &SymbolId, definition: &SymbolDefinition) -> Self {
        Self {
            symbol: symbol.clone(),
            definition: definition.clone(),
        }
    }

    fn from_link(link: &LinkTarget) -> Self {
        Self {
            symbol: link.symbol.clone(),
            definition: link.definition.clone(),
        }
    }
}

/// Scope-walking resolver over the frozen analysis state.
pub struct Resolver<'a> {
    indexes: &'a IndexMap<FilePath, SymbolIndex>,
    types: &'a TypeTracker,
    linkage: &'a ImportLinkage,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over the run's indexes, type tracker, and linkage.
    pub fn new(
        indexes: &'a IndexMap<FilePath, SymbolIndex>,
        types: &'a TypeTracker,
        linkage: &'a ImportLinkage,
    ) -> Self {
        Self {
            indexes,
            types,
            linkage,
        }
    }

    /// Resolve one raw usage occurring in `file`.
    pub fn resolve(&self, file: &FilePath, usage: &RawRef) -> Resolution<ResolvedSymbol> {
        let Some(index) = self.indexes.get(file) else {
            return Resolution::Failed("unknown_file");
        };

        // Steps 1-2: the nearest populated scope decides the lexical outcome.
        let mut weak: Option<Resolution<ResolvedSymbol>> = None;
        for scope in index.scope_tree().chain_at(&usage.location) {
            let candidates = index.candidates_in_scope(scope, &usage.name);
            if candidates.is_empty() {
                continue;
            }

            if candidates.len() == 1 {
                let (id, def) = candidates[0];
                if def.kind == SymbolKind::Import {
                    // The name is an import binding: its real target lives in
                    // another file, at the link's own confidence.
                    match self.linkage.lookup(file, &usage.name) {
                        Some(link) if link.kind.is_direct() => {
                            return Resolution::High(ResolvedSymbol::from_link(link));
                        }
                        Some(link) => {
                            return Resolution::Medium(
                                ResolvedSymbol::from_link(link),
                                link.kind.reason(),
                            );
                        }
                        None => {
                            weak = Some(Resolution::Low(
                                ResolvedSymbol::new(id, def),
                                "unresolved_import",
                            ));
                        }
                    }
                } else if usage.kind.is_compatible_with(def.kind) {
                    return Resolution::High(ResolvedSymbol::new(id, def));
                } else {
                    weak = Some(Resolution::Low(ResolvedSymbol::new(id, def), "kind_mismatch"));
                }
            } else {
                // Ambiguity is preserved as reduced confidence, not dropped:
                // deterministic tie-break on the lexically first candidate.
                let (id, def) = candidates[0];
                weak = Some(Resolution::Low(ResolvedSymbol::new(id, def), "partial_match"));
            }
            break;
        }

        // Step 3: member access through the receiver's discovered type.
        if let Some(receiver) = &usage.receiver {
            let enclosing_fn = index
                .scope_tree()
                .enclosing_function(&usage.location)
                .map(|s| s.location.clone());
            if let Some(class_name) =
                self.types
                    .type_of(file, receiver, &usage.location, enclosing_fn.as_ref())
            {
                let class_name = class_name.clone();
                if let Some(member) = self.find_member(file, &class_name, &usage.name) {
                    return Resolution::Medium(member, "inferred");
                }
            }
        }

        // Step 4: import linkage for names with no local binding at all
        // (covers linkage built outside the indexer's conventions).
        if weak.is_none() {
            if let Some(link) = self.linkage.lookup(file, &usage.name) {
                return if link.kind.is_direct() {
                    Resolution::High(ResolvedSymbol::from_link(link))
                } else {
                    Resolution::Medium(ResolvedSymbol::from_link(link), link.kind.reason())
                };
            }
        }

        // Steps 5-6.
        weak.unwrap_or(Resolution::Failed("not_found"))
    }

    /// Find `class_name`'s member `member`, searching the usage's own file
    /// first, then the rest of the corpus in index order.
    fn find_member(
        &self,
        home: &FilePath,
        class_name: &str,
        member: &str,
    ) -> Option<ResolvedSymbol> {
        if let Some(index) = self.indexes.get(home) {
            if let Some((id, def)) = index.member_of(class_name, member) {
                return Some(ResolvedSymbol::new(id, def));
            }
        }
        self.indexes
            .iter()
            .filter(|(file, _)| *file != home)
            .find_map(|(_, index)| {
                index
                    .member_of(class_name, member)
                    .map(|(id, def)| ResolvedSymbol::new(id, def))
            })
    }
}
