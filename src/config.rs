// SatFuse - Multi-source remote-sensing fusion
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Fusion engine configuration.
//!
//! Defaults carry the calibrated constants. Every value is tunable and the
//! whole configuration round-trips through JSON.

use crate::aggregate::QualityTier;
use crate::error::{FusionError, Result};
use crate::metric::MetricSpec;
use crate::weights::ReliabilityWeights;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Master configuration for the fusion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Per-source reliability weights.
    pub weights: ReliabilityWeights,

    /// Metrics to fuse, in evaluation order.
    pub metrics: Vec<MetricSpec>,

    /// How contributing values are combined.
    pub method: FusionMethod,

    /// Confidence scoring.
    pub confidence: ConfidenceConfig,

    /// Consensus classification.
    pub consensus: ConsensusConfig,

    /// Quality tier table.
    pub quality: QualityConfig,

    /// Return the exclusion audit trail in reports (default: false).
    pub diagnostics: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: ReliabilityWeights::default(),
            metrics: MetricSpec::standard_catalogue(),
            method: FusionMethod::WeightedAverage,
            confidence: ConfidenceConfig::default(),
            consensus: ConsensusConfig::default(),
            quality: QualityConfig::default(),
            diagnostics: false,
        }
    }
}

impl FusionConfig {
    /// Builder: select the fusion method.
    pub fn with_method(mut self, method: FusionMethod) -> Self {
        self.method = method;
        self
    }

    /// Builder: replace the weight table.
    pub fn with_weights(mut self, weights: ReliabilityWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Builder: add a metric to the catalogue.
    pub fn with_metric(mut self, spec: MetricSpec) -> Self {
        self.metrics.push(spec);
        self
    }

    /// Builder: keep the exclusion audit trail in reports.
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Parse from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every constant the engine divides by or compares against.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        let mut names = BTreeSet::new();
        for spec in &self.metrics {
            spec.validate()?;
            if !names.insert(spec.name.as_str()) {
                return Err(FusionError::InvalidConfig(format!(
                    "duplicate metric '{}'",
                    spec.name
                )));
            }
        }

        self.confidence.validate()?;
        self.consensus.validate()?;
        self.quality.validate()
    }
}

/// Combination rule for contributing values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    /// Reliability-weighted arithmetic mean.
    #[default]
    WeightedAverage,
    /// Value of the most reliable contributor.
    MaxConfidence,
    /// Median of contributing values.
    Consensus,
}

impl FusionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionMethod::WeightedAverage => "weighted_average",
            FusionMethod::MaxConfidence => "max_confidence",
            FusionMethod::Consensus => "consensus",
        }
    }
}

/// Confidence = `source_share * min(n / saturation_sources, 1) + variance_share * max(0, 1 - var / max_var)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    /// Contributor count at which the source term saturates.
    pub saturation_sources: u32,
    /// Weight of the source-count term.
    pub source_share: f64,
    /// Weight of the variance term.
    pub variance_share: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            saturation_sources: 4,
            source_share: 0.6,
            variance_share: 0.4,
        }
    }
}

impl ConfidenceConfig {
    fn validate(&self) -> Result<()> {
        if self.saturation_sources == 0 {
            return Err(FusionError::InvalidConfig(
                "saturation_sources must be at least 1".to_string(),
            ));
        }
        for (name, share) in [
            ("source_share", self.source_share),
            ("variance_share", self.variance_share),
        ] {
            if !(share.is_finite() && share >= 0.0) {
                return Err(FusionError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, share
                )));
            }
        }
        Ok(())
    }
}

/// Consensus classification over per-metric agreement tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Share of metrics a tier needs to carry the consensus.
    pub majority_ratio: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            majority_ratio: 0.7,
        }
    }
}

impl ConsensusConfig {
    fn validate(&self) -> Result<()> {
        if self.majority_ratio.is_finite() && self.majority_ratio > 0.0 && self.majority_ratio <= 1.0 {
            Ok(())
        } else {
            Err(FusionError::InvalidConfig(format!(
                "majority_ratio must be in (0, 1], got {}",
                self.majority_ratio
            )))
        }
    }
}

/// One row of the quality decision table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRule {
    pub tier: QualityTier,
    pub min_confidence: f64,
    pub min_sources: usize,
}

impl QualityRule {
    pub fn new(tier: QualityTier, min_confidence: f64, min_sources: usize) -> Self {
        Self {
            tier,
            min_confidence,
            min_sources,
        }
    }
}

/// Quality decision table; first matching rule wins, otherwise `fallback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    pub rules: Vec<QualityRule>,
    pub fallback: QualityTier,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                QualityRule::new(QualityTier::Excellent, 0.8, 4),
                QualityRule::new(QualityTier::Good, 0.7, 3),
                QualityRule::new(QualityTier::Fair, 0.5, 2),
            ],
            fallback: QualityTier::Limited,
        }
    }
}

impl QualityConfig {
    fn validate(&self) -> Result<()> {
        match self.rules.iter().find(|r| !r.min_confidence.is_finite()) {
            Some(rule) => Err(FusionError::InvalidConfig(format!(
                "quality rule for {} has non-finite min_confidence",
                rule.tier.as_str()
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{MetricSpec, NDVI};

    #[test]
    fn test_default_config() {
        let config = FusionConfig::default();
        assert_eq!(config.metrics.len(), 4);
        assert_eq!(config.method, FusionMethod::WeightedAverage);
        assert!(!config.diagnostics);
        assert_eq!(config.confidence.saturation_sources, 4);
        assert!((config.consensus.majority_ratio - 0.7).abs() < 1e-12);
        assert_eq!(config.quality.rules.len(), 3);
        assert_eq!(config.quality.fallback, QualityTier::Limited);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = FusionConfig::default()
            .with_method(FusionMethod::Consensus)
            .with_diagnostics(true);
        let json = config.to_json().unwrap();
        assert!(json.contains("\"consensus\""));

        let parsed = FusionConfig::from_json(&json).unwrap();
        assert_eq!(parsed.method, FusionMethod::Consensus);
        assert!(parsed.diagnostics);
        assert_eq!(parsed.metrics.len(), config.metrics.len());
        assert_eq!(parsed.metrics[0].name, config.metrics[0].name);
        assert_eq!(parsed.weights.len(), config.weights.len());
        assert!((parsed.weights.weight("sentinel2") - 0.95).abs() < 1e-12);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed = FusionConfig::from_json(r#"{"method": "max_confidence"}"#).unwrap();
        assert_eq!(parsed.method, FusionMethod::MaxConfidence);
        assert_eq!(parsed.metrics.len(), 4);
        assert_eq!(parsed.weights, ReliabilityWeights::default());
    }

    #[test]
    fn test_duplicate_metric_rejected() {
        let config = FusionConfig::default().with_metric(MetricSpec::ndvi());
        match config.validate() {
            Err(FusionError::InvalidConfig(msg)) => assert!(msg.contains(NDVI)),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_scoring_constants() {
        let mut config = FusionConfig::default();
        config.confidence.saturation_sources = 0;
        assert!(config.validate().is_err());

        let mut config = FusionConfig::default();
        config.confidence.variance_share = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = FusionConfig::default();
        config.consensus.majority_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = FusionConfig::default();
        config.quality.rules[0].min_confidence = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_method_names() {
        assert_eq!(FusionMethod::WeightedAverage.as_str(), "weighted_average");
        assert_eq!(FusionMethod::MaxConfidence.as_str(), "max_confidence");
        assert_eq!(FusionMethod::Consensus.as_str(), "consensus");
        assert_eq!(FusionMethod::default(), FusionMethod::WeightedAverage);
    }
}
