//! Assignment-based type discovery.
//!
//! The front end reports assignment-like facts (`cart = new ShoppingCart()`
//! or the per-language equivalent); this module records them and answers
//! "what class did `cart` most recently hold at this point?" for the
//! resolver's method dispatch. Deliberately conservative: last write wins,
//! no merging across branches, no flow across function boundaries. A
//! heuristic aid, not a type checker.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{FilePath, Location};
use crate::facts::{FileFacts, TypeScope};

/// One observation: a variable was seen holding a value of a named class.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeDiscovery {
    /// The observed variable.
    pub variable: SmolStr,
    /// The class it was seen holding.
    pub class_name: SmolStr,
    /// Where the observation is visible.
    pub scope: TypeScope,
    /// Where the observation was made.
    pub location: Location,
}

/// All type observations for a run, queryable per file.
///
/// Built from per-file collections (independent across files, safe to
/// gather on parallel workers) and frozen before resolution starts.
#[derive(Clone, Debug, Default)]
pub struct TypeTracker {
    by_file: FxHashMap<FilePath, Vec<TypeDiscovery>>,
}

impl TypeTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract one file's observations from its facts.
    pub fn collect_file(facts: &FileFacts) -> Vec<TypeDiscovery> {
        let mut discoveries: Vec<TypeDiscovery> = facts
            .assignments
            .iter()
            .map(|a| TypeDiscovery {
                variable: a.variable.clone(),
                class_name: a.class_name.clone(),
                scope: a.scope,
                location: a.location.clone(),
            })
            .collect();
        discoveries.sort_by_key(|d| d.location.start());
        discoveries
    }

    /// Assemble a tracker from per-file collections.
    pub fn from_parts(parts: impl IntoIterator<Item = (FilePath, Vec<TypeDiscovery>)>) -> Self {
        Self {
            by_file: parts.into_iter().collect(),
        }
    }

    /// All observations recorded for a file, in source order.
    pub fn discoveries_in(&self, file: &FilePath) -> &[TypeDiscovery] {
        self.by_file.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The class `variable` most recently held at `at`, or `None`.
    ///
    /// Only observations at or before `at` count. `Local` observations
    /// apply when they fall inside `enclosing_fn` (the function extent the
    /// query site sits in); `File` observations apply anywhere in the file.
    /// `Local` beats `File`; within the same scope class the latest
    /// observation in source order wins.
    pub fn type_of(
        &self,
        file: &FilePath,
        variable: &str,
        at: &Location,
        enclosing_fn: Option<&Location>,
    ) -> Option<&SmolStr> {
        let mut local: Option<&TypeDiscovery> = None;
        let mut file_wide: Option<&TypeDiscovery> = None;

        for d in self.discoveries_in(file) {
            if d.variable != variable || d.location.start() > at.start() {
                continue;
            }
            match d.scope {
                TypeScope::Local => {
                    if enclosing_fn.is_some_and(|f| f.contains(&d.location)) {
                        local = Some(d); // later observations overwrite
                    }
                }
                TypeScope::File => {
                    file_wide = Some(d);
                }
            }
        }

        local.or(file_wide).map(|d| &d.class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::RawAssignment;

    fn loc(line: u32) -> Location {
        Location::new("a.ts", line, 0, line, 30)
    }

    fn tracker(assignments: Vec<RawAssignment>) -> TypeTracker {
        let mut facts = FileFacts::new("a.ts");
        facts.assignments = assignments;
        let discoveries = TypeTracker::collect_file(&facts);
        TypeTracker::from_parts([(FilePath::from("a.ts"), discoveries)])
    }

    #[test]
    fn test_last_write_wins() {
        let t = tracker(vec![
            RawAssignment::new("x", "Dog", TypeScope::File, loc(1)),
            RawAssignment::new("x", "Cat", TypeScope::File, loc(5)),
        ]);

        let found = t.type_of(&FilePath::from("a.ts"), "x", &loc(9), None);
        assert_eq!(found.map(SmolStr::as_str), Some("Cat"));
    }

    #[test]
    fn test_only_observations_at_or_before() {
        let t = tracker(vec![
            RawAssignment::new("x", "Dog", TypeScope::File, loc(1)),
            RawAssignment::new("x", "Cat", TypeScope::File, loc(8)),
        ]);

        let found = t.type_of(&FilePath::from("a.ts"), "x", &loc(4), None);
        assert_eq!(found.map(SmolStr::as_str), Some("Dog"));
    }

    #[test]
    fn test_local_preferred_over_file() {
        let fn_extent = Location::new("a.ts", 3, 0, 10, 1);
        let t = tracker(vec![
            RawAssignment::new("x", "Global", TypeScope::File, loc(1)),
            RawAssignment::new("x", "Narrow", TypeScope::Local, loc(4)),
        ]);

        let found = t.type_of(&FilePath::from("a.ts"), "x", &loc(6), Some(&fn_extent));
        assert_eq!(found.map(SmolStr::as_str), Some("Narrow"));
    }

    #[test]
    fn test_local_outside_function_ignored() {
        // The local observation sits in another function's extent.
        let fn_extent = Location::new("a.ts", 20, 0, 30, 1);
        let t = tracker(vec![
            RawAssignment::new("x", "Global", TypeScope::File, loc(1)),
            RawAssignment::new("x", "Narrow", TypeScope::Local, loc(4)),
        ]);

        let found = t.type_of(&FilePath::from("a.ts"), "x", &loc(25), Some(&fn_extent));
        assert_eq!(found.map(SmolStr::as_str), Some("Global"));
    }

    #[test]
    fn test_unknown_variable() {
        let t = tracker(vec![RawAssignment::new(
            "x",
            "Dog",
            TypeScope::File,
            loc(1),
        )]);

        assert!(t.type_of(&FilePath::from("a.ts"), "y", &loc(5), None).is_none());
    }
}
