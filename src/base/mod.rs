//! Foundation types for the skein resolution core.
//!
//! This module provides fundamental types used throughout the analysis:
//! - [`FilePath`], [`SymbolId`] - Branded identifiers
//! - [`Location`], [`LineCol`], [`LineIndex`] - Source positions and containment
//! - [`ScopeKind`], [`ScopeId`] - Hierarchical scope identity
//!
//! This module has NO dependencies on other skein modules.

mod ids;
mod location;
mod scope;

pub use ids::{FilePath, SymbolId};
pub use location::{LineCol, LineIndex, Location};
pub use scope::{ScopeId, ScopeKind};
