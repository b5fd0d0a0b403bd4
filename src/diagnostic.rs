//! Audit trail of silent per-source exclusions
//!
//! Per-source defects never fail a request. Each one is logged at `debug`
//! level through the `log` facade and, when
//! [`FusionConfig::diagnostics`](crate::FusionConfig) is set, also returned
//! in the report. Recording a diagnostic never changes a fused value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a source (or one of its values) was left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Entry was null or an empty object.
    EmptyEntry,
    /// Status is not one of success, fallback, simulated.
    StatusExcluded { status: String },
    /// Value outside the metric's valid range.
    OutOfRange { value: f64 },
    /// Value is NaN or infinite.
    NonFinite,
    /// Field present with the wrong type.
    Malformed { field: String },
}

/// One recorded exclusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Source the exclusion applies to.
    pub source_id: String,
    /// Metric concerned; `None` when the whole source was affected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    /// What went wrong.
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Source-level diagnostic.
    pub fn source(source_id: &str, kind: DiagnosticKind) -> Self {
        Self {
            source_id: source_id.to_string(),
            metric: None,
            kind,
        }
    }

    /// Metric-level diagnostic.
    pub fn metric(source_id: &str, metric: &str, kind: DiagnosticKind) -> Self {
        Self {
            source_id: source_id.to_string(),
            metric: Some(metric.to_string()),
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source={}", self.source_id)?;
        if let Some(metric) = &self.metric {
            write!(f, " metric={}", metric)?;
        }
        match &self.kind {
            DiagnosticKind::EmptyEntry => write!(f, " - empty entry"),
            DiagnosticKind::StatusExcluded { status } => {
                write!(f, " - status '{}' not fusable", status)
            }
            DiagnosticKind::OutOfRange { value } => write!(f, " - value {} out of range", value),
            DiagnosticKind::NonFinite => write!(f, " - non-finite value"),
            DiagnosticKind::Malformed { field } => write!(f, " - malformed field '{}'", field),
        }
    }
}

/// Per-request collector.
#[derive(Debug)]
pub(crate) struct DiagnosticLog {
    keep: bool,
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub(crate) fn new(keep: bool) -> Self {
        Self {
            keep,
            entries: Vec::new(),
        }
    }

    /// Log only, keep nothing.
    pub(crate) fn disabled() -> Self {
        Self::new(false)
    }

    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        log::debug!("excluded: {}", diagnostic);
        if self.keep {
            self.entries.push(diagnostic);
        }
    }

    /// Drain what has been kept so far.
    pub(crate) fn take_entries(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    #[cfg(test)]
    pub(crate) fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic::metric("irs", "ndvi", DiagnosticKind::OutOfRange { value: 1.7 });
        assert_eq!(d.to_string(), "source=irs metric=ndvi - value 1.7 out of range");

        let d = Diagnostic::source(
            "risat",
            DiagnosticKind::StatusExcluded {
                status: "error".to_string(),
            },
        );
        assert_eq!(d.to_string(), "source=risat - status 'error' not fusable");
    }

    #[test]
    fn test_log_keeps_only_when_enabled() {
        let mut kept = DiagnosticLog::new(true);
        kept.record(Diagnostic::source("a", DiagnosticKind::EmptyEntry));
        assert_eq!(kept.into_entries().len(), 1);

        let mut dropped = DiagnosticLog::disabled();
        dropped.record(Diagnostic::source("a", DiagnosticKind::EmptyEntry));
        assert!(dropped.into_entries().is_empty());
    }

    #[test]
    fn test_serialization_shape() {
        let d = Diagnostic::metric("landsat8", "temperature", DiagnosticKind::OutOfRange { value: 75.0 });
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["source_id"], "landsat8");
        assert_eq!(json["metric"], "temperature");
        assert_eq!(json["kind"], "out_of_range");
        assert_eq!(json["value"], 75.0);

        let restored: Diagnostic = serde_json::from_value(json).unwrap();
        assert_eq!(restored, d);
    }
}
