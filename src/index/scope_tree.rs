//! Lexical scope tree for one file.
//!
//! Scopes arrive from the front end as flat [`ScopeId`] records; the tree
//! recovers their nesting from location containment. Parent links drive the
//! resolver's outward scope walk, `innermost_at` anchors a reference to the
//! scope it occurs in.

use rustc_hash::FxHashMap;

use crate::base::{Location, ScopeId, ScopeKind};

/// Nesting rank used to order scopes whose locations coincide (a
/// parameter scope typically spans exactly its function's extent).
/// Lower rank is the outer scope.
fn nesting_rank(kind: ScopeKind) -> u8 {
    match kind {
        ScopeKind::Global => 0,
        ScopeKind::Module => 1,
        ScopeKind::Class => 2,
        ScopeKind::Function => 3,
        ScopeKind::Parameter => 4,
        ScopeKind::Block => 5,
        ScopeKind::Local => 6,
    }
}

/// The scope hierarchy of a single file, frozen after construction.
#[derive(Clone, Debug)]
pub struct ScopeTree {
    scopes: Vec<ScopeId>,
    parents: Vec<Option<usize>>,
    by_key: FxHashMap<String, usize>,
    root: usize,
}

impl ScopeTree {
    /// Build the tree from a file's scope records.
    ///
    /// A global scope spanning `file_extent` is synthesized if the front
    /// end did not provide one. Duplicate records (same encoded key) are
    /// collapsed.
    pub fn build(file_extent: Location, raw_scopes: &[ScopeId]) -> Self {
        let mut scopes: Vec<ScopeId> = Vec::with_capacity(raw_scopes.len() + 1);
        let mut by_key = FxHashMap::default();

        for scope in raw_scopes {
            let key = scope.encode();
            if !by_key.contains_key(&key) {
                by_key.insert(key, scopes.len());
                scopes.push(scope.clone());
            }
        }

        let root = match scopes.iter().position(|s| s.kind == ScopeKind::Global) {
            Some(idx) => idx,
            None => {
                let global = ScopeId::global(file_extent);
                by_key.insert(global.encode(), scopes.len());
                scopes.push(global);
                scopes.len() - 1
            }
        };

        let parents = scopes
            .iter()
            .enumerate()
            .map(|(i, scope)| {
                if i == root {
                    return None;
                }
                let mut best: Option<usize> = None;
                for (j, candidate) in scopes.iter().enumerate() {
                    if i == j || !encloses(candidate, scope) {
                        continue;
                    }
                    best = match best {
                        None => Some(j),
                        Some(b) if encloses(&scopes[b], candidate) => Some(j),
                        Some(b) => Some(b),
                    };
                }
                best.or(Some(root))
            })
            .collect();

        Self {
            scopes,
            parents,
            by_key,
            root,
        }
    }

    /// The file-wide global scope.
    pub fn root(&self) -> &ScopeId {
        &self.scopes[self.root]
    }

    /// All scopes in the tree.
    pub fn scopes(&self) -> impl Iterator<Item = &ScopeId> {
        self.scopes.iter()
    }

    /// The narrowest scope whose location contains `loc`.
    ///
    /// Falls back to the global scope for locations outside every recorded
    /// scope (the global scope notionally covers the whole file).
    pub fn innermost_at(&self, loc: &Location) -> &ScopeId {
        let mut best = self.root;
        for (i, scope) in self.scopes.iter().enumerate() {
            if !scope.location.contains(loc) {
                continue;
            }
            if encloses(&self.scopes[best], scope) {
                best = i;
            }
        }
        &self.scopes[best]
    }

    /// The parent of `scope`, or `None` for the global scope or a scope
    /// not in this tree.
    pub fn parent_of(&self, scope: &ScopeId) -> Option<&ScopeId> {
        let idx = *self.by_key.get(&scope.encode())?;
        self.parents[idx].map(|p| &self.scopes[p])
    }

    /// The scope chain at `loc`, innermost first, ending at the global scope.
    pub fn chain_at(&self, loc: &Location) -> Vec<&ScopeId> {
        let mut chain = Vec::new();
        let mut idx = *self
            .by_key
            .get(&self.innermost_at(loc).encode())
            .expect("innermost scope is in the tree");
        loop {
            chain.push(&self.scopes[idx]);
            match self.parents[idx] {
                Some(p) => idx = p,
                None => break,
            }
        }
        chain
    }

    /// The narrowest function scope containing `loc`, if any.
    pub fn enclosing_function(&self, loc: &Location) -> Option<&ScopeId> {
        self.chain_at(loc)
            .into_iter()
            .find(|s| s.kind == ScopeKind::Function)
    }
}

/// Whether `outer` encloses `inner`: strict location containment, with the
/// nesting rank breaking ties between scopes that share an extent.
fn encloses(outer: &ScopeId, inner: &ScopeId) -> bool {
    if !outer.location.contains(&inner.location) {
        return false;
    }
    if inner.location.contains(&outer.location) {
        // Same extent: rank decides which is the outer scope.
        return nesting_rank(outer.kind) < nesting_rank(inner.kind);
    }
    true
}
