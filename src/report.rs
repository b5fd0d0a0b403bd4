// SatFuse - Multi-source remote-sensing fusion
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! FusionReport - output structure consumed by the presentation layer.

use crate::aggregate::{ConsensusLevel, QualityTier};
use crate::config::FusionMethod;
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::fusion::{CrossValidation, MetricFusion};
use crate::metric::Agreement;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Message attached to `no_valid_data` reports.
pub const NO_VALID_DATA_MESSAGE: &str = "No valid satellite data available for fusion";

/// Outcome of a fusion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStatus {
    /// Fusion ran (some metrics may still be absent).
    Success,
    /// Every source was filtered out. A valid outcome, not worth retrying.
    NoValidData,
    /// The request itself was structurally invalid.
    Error,
}

impl FusionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionStatus::Success => "success",
            FusionStatus::NoValidData => "no_valid_data",
            FusionStatus::Error => "error",
        }
    }
}

/// Complete fusion report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionReport {
    /// Outcome.
    pub status: FusionStatus,
    /// Explanation for non-success outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// RFC 3339 generation time, present only on stamped reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Opaque location passthrough.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub location: Value,
    /// Sources that passed filtering, in input order.
    pub data_sources: Vec<String>,
    /// Fused value per metric.
    pub fused_metrics: BTreeMap<String, f64>,
    /// Confidence per metric.
    pub confidence_scores: BTreeMap<String, f64>,
    /// Cross-validation detail per metric.
    pub cross_validation: BTreeMap<String, CrossValidation>,
    /// Mean of the per-metric confidences.
    pub overall_confidence: f64,
    /// Summary of agreement tiers.
    pub consensus_level: ConsensusLevel,
    /// Quality tier.
    pub overall_quality: QualityTier,
    /// Combination rule used.
    pub fusion_method: FusionMethod,
    /// Exclusion audit trail (only when enabled in the configuration).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl FusionReport {
    /// Empty report with the given status.
    fn empty(status: FusionStatus, location: Value, method: FusionMethod) -> Self {
        Self {
            status,
            message: None,
            timestamp: None,
            location,
            data_sources: Vec::new(),
            fused_metrics: BTreeMap::new(),
            confidence_scores: BTreeMap::new(),
            cross_validation: BTreeMap::new(),
            overall_confidence: 0.0,
            consensus_level: ConsensusLevel::Unknown,
            overall_quality: QualityTier::Unknown,
            fusion_method: method,
            diagnostics: Vec::new(),
        }
    }

    /// Successful report skeleton; metrics are added with [`insert_metric`](Self::insert_metric).
    pub(crate) fn success(location: Value, method: FusionMethod, data_sources: Vec<String>) -> Self {
        Self {
            data_sources,
            ..Self::empty(FusionStatus::Success, location, method)
        }
    }

    /// Every source was filtered out.
    pub(crate) fn no_valid_data(location: Value, method: FusionMethod) -> Self {
        Self {
            message: Some(NO_VALID_DATA_MESSAGE.to_string()),
            ..Self::empty(FusionStatus::NoValidData, location, method)
        }
    }

    /// Structurally invalid request.
    pub(crate) fn error(message: impl Into<String>, method: FusionMethod) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::empty(FusionStatus::Error, Value::Null, method)
        }
    }

    pub(crate) fn insert_metric(&mut self, name: &str, fusion: MetricFusion) {
        self.fused_metrics.insert(name.to_string(), fusion.value);
        self.confidence_scores
            .insert(name.to_string(), fusion.confidence);
        self.cross_validation
            .insert(name.to_string(), fusion.cross_validation);
    }

    /// Check if fusion ran.
    pub fn is_success(&self) -> bool {
        self.status == FusionStatus::Success
    }

    /// Fused value for a metric.
    pub fn fused(&self, metric: &str) -> Option<f64> {
        self.fused_metrics.get(metric).copied()
    }

    /// Confidence for a metric.
    pub fn confidence(&self, metric: &str) -> Option<f64> {
        self.confidence_scores.get(metric).copied()
    }

    /// Agreement tier for a metric.
    pub fn agreement(&self, metric: &str) -> Option<Agreement> {
        self.cross_validation.get(metric).map(|cv| cv.agreement)
    }

    /// Number of fused metrics.
    pub fn metric_count(&self) -> usize {
        self.fused_metrics.len()
    }

    /// Attach a generation timestamp.
    #[cfg(feature = "timestamps")]
    pub fn stamped(mut self, at: chrono::DateTime<chrono::Utc>) -> Self {
        self.timestamp = Some(at.to_rfc3339());
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to a JSON value.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
