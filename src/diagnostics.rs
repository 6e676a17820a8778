//! Analysis diagnostics: phases, severities, and the collecting sink.
//!
//! Resolution failures are data, not errors: a failed lookup becomes an
//! unresolved symbol or an excluded edge, and the run always completes.
//! What lands here is the best-effort trail of everything worth reporting,
//! for callers to filter by severity.

use std::fmt;

use thiserror::Error;

use crate::base::Location;

/// The analysis phase a diagnostic originated from.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnalysisPhase {
    Parsing,
    ScopeAnalysis,
    ImportResolution,
    ExportDetection,
    TypeTracking,
    CallGraph,
    ClassDetection,
    ReturnTypeInference,
}

impl fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            AnalysisPhase::Parsing => "parsing",
            AnalysisPhase::ScopeAnalysis => "scope_analysis",
            AnalysisPhase::ImportResolution => "import_resolution",
            AnalysisPhase::ExportDetection => "export_detection",
            AnalysisPhase::TypeTracking => "type_tracking",
            AnalysisPhase::CallGraph => "call_graph",
            AnalysisPhase::ClassDetection => "class_detection",
            AnalysisPhase::ReturnTypeInference => "return_type_inference",
        };
        f.write_str(tag)
    }
}

/// Severity level of a diagnostic.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(tag)
    }
}

/// A diagnostic produced during analysis.
#[derive(Clone, Debug, Error)]
#[error("{phase} {severity}: {message}")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisError {
    /// Human-readable description.
    pub message: String,
    /// Where the problem was observed, when it has a location.
    pub location: Option<Location>,
    /// Which phase reported it.
    pub phase: AnalysisPhase,
    /// How serious it is.
    pub severity: Severity,
}

impl AnalysisError {
    /// Create an error-severity diagnostic.
    pub fn error(phase: AnalysisPhase, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            phase,
            severity: Severity::Error,
        }
    }

    /// Create a warning-severity diagnostic.
    pub fn warning(phase: AnalysisPhase, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            phase,
            severity: Severity::Warning,
        }
    }

    /// Create an info-severity diagnostic.
    pub fn info(phase: AnalysisPhase, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            phase,
            severity: Severity::Info,
        }
    }

    /// Attach a location.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// Collects diagnostics during analysis.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<AnalysisError>,
}

impl DiagnosticSink {
    /// Create a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn push(&mut self, diagnostic: AnalysisError) {
        self.diagnostics.push(diagnostic);
    }

    /// Absorb every diagnostic from another sink.
    pub fn extend(&mut self, other: DiagnosticSink) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// All diagnostics collected so far.
    pub fn diagnostics(&self) -> &[AnalysisError] {
        &self.diagnostics
    }

    /// Diagnostics reported by one phase.
    pub fn for_phase(&self, phase: AnalysisPhase) -> impl Iterator<Item = &AnalysisError> {
        self.diagnostics.iter().filter(move |d| d.phase == phase)
    }

    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Number of warning-severity diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Whether any error-severity diagnostic was collected.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Take all diagnostics, leaving the sink empty.
    pub fn take(&mut self) -> Vec<AnalysisError> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_phase_and_severity() {
        let err = AnalysisError::warning(AnalysisPhase::ImportResolution, "unresolved import 'x'");
        assert_eq!(
            err.to_string(),
            "import_resolution warning: unresolved import 'x'"
        );
    }

    #[test]
    fn test_sink_counts() {
        let mut sink = DiagnosticSink::new();
        sink.push(AnalysisError::error(AnalysisPhase::CallGraph, "a"));
        sink.push(AnalysisError::error(AnalysisPhase::ScopeAnalysis, "b"));
        sink.push(AnalysisError::warning(AnalysisPhase::TypeTracking, "c"));
        sink.push(AnalysisError::info(AnalysisPhase::CallGraph, "d"));

        assert_eq!(sink.error_count(), 2);
        assert_eq!(sink.warning_count(), 1);
        assert!(sink.has_errors());
    }

    #[test]
    fn test_sink_for_phase() {
        let mut sink = DiagnosticSink::new();
        sink.push(AnalysisError::info(AnalysisPhase::CallGraph, "a"));
        sink.push(AnalysisError::info(AnalysisPhase::TypeTracking, "b"));
        sink.push(AnalysisError::info(AnalysisPhase::CallGraph, "c"));

        assert_eq!(sink.for_phase(AnalysisPhase::CallGraph).count(), 2);
    }

    #[test]
    fn test_take_empties_sink() {
        let mut sink = DiagnosticSink::new();
        sink.push(AnalysisError::error(AnalysisPhase::Parsing, "boom"));

        let taken = sink.take();
        assert_eq!(taken.len(), 1);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_error_location() {
        let loc = crate::base::Location::new("a.ts", 1, 0, 1, 10);
        let err = AnalysisError::error(AnalysisPhase::ScopeAnalysis, "dup").at(loc.clone());
        assert_eq!(err.location, Some(loc));
    }
}
