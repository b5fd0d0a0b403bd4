// SatFuse - Multi-source remote-sensing fusion
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Metric catalogue.
//!
//! Every fused quantity is described by a [`MetricSpec`]: which sources may
//! contribute, how to pull the raw value out of a reading, the physically
//! valid range and the variance calibration. Per-metric behaviour lives
//! here as data; the fusion routine itself is shared.

use crate::error::{FusionError, Result};
use crate::input::SourceReading;
use serde::{Deserialize, Serialize};

/// Metric key for the Normalized Difference Vegetation Index.
pub const NDVI: &str = "ndvi";
/// Metric key for the Enhanced Vegetation Index.
pub const EVI: &str = "evi";
/// Metric key for surface temperature (°C).
pub const TEMPERATURE: &str = "temperature";
/// Metric key for soil moisture (%).
pub const SOIL_MOISTURE: &str = "soil_moisture";

const OPTICAL: [&str; 3] = ["sentinel2", "landsat8", "irs"];
const THERMAL: [&str; 3] = ["landsat8", "modis", "irs"];
const SAR: [&str; 2] = ["sentinel1", "risat"];

/// Qualitative agreement between sources on one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Agreement {
    High,
    Medium,
    Low,
}

impl Agreement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Agreement::High => "High",
            Agreement::Medium => "Medium",
            Agreement::Low => "Low",
        }
    }
}

/// Which sources may contribute to a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSelector {
    /// Any fusable source.
    Any,
    /// Only the listed source ids.
    Only(Vec<String>),
}

impl SourceSelector {
    /// Selector over a fixed list of ids.
    pub fn only(ids: &[&str]) -> Self {
        SourceSelector::Only(ids.iter().map(|s| s.to_string()).collect())
    }

    pub fn accepts(&self, source_id: &str) -> bool {
        match self {
            SourceSelector::Any => true,
            SourceSelector::Only(ids) => ids.iter().any(|id| id == source_id),
        }
    }
}

/// Where a metric's raw value lives in a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueExtractor {
    /// `indices.<name>`.
    Index(String),
    /// `temperature`, scalar or profile.
    Temperature,
    /// `soil_moisture_estimate`.
    SoilMoisture,
}

impl ValueExtractor {
    /// Raw value, if the reading carries one.
    pub fn extract(&self, reading: &SourceReading) -> Option<f64> {
        match self {
            ValueExtractor::Index(name) => reading.indices.get(name).copied(),
            ValueExtractor::Temperature => reading.temperature.and_then(|t| t.to_scalar()),
            ValueExtractor::SoilMoisture => reading.soil_moisture_estimate,
        }
    }
}

/// Inclusive physically valid range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// False for NaN.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Variance cut-offs for the agreement tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgreementThresholds {
    /// Variance below this is `High`.
    pub high_below: f64,
    /// Variance below this (and not `High`) is `Medium`.
    pub medium_below: f64,
}

impl AgreementThresholds {
    pub const fn new(high_below: f64, medium_below: f64) -> Self {
        Self {
            high_below,
            medium_below,
        }
    }

    pub fn classify(&self, variance: f64) -> Agreement {
        if variance < self.high_below {
            Agreement::High
        } else if variance < self.medium_below {
            Agreement::Medium
        } else {
            Agreement::Low
        }
    }
}

/// Full description of one fused metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Report key.
    pub name: String,
    /// Contributing sources.
    pub eligible: SourceSelector,
    /// Value location.
    pub extractor: ValueExtractor,
    /// Accepted input range.
    pub valid_range: ValidRange,
    /// Variance at which the variance term of the confidence reaches zero.
    pub max_variance: f64,
    /// Agreement tiers.
    pub agreement: AgreementThresholds,
}

impl MetricSpec {
    /// NDVI from the optical sources.
    pub fn ndvi() -> Self {
        Self::vegetation_index(NDVI)
    }

    /// EVI from the optical sources.
    pub fn evi() -> Self {
        Self::vegetation_index(EVI)
    }

    /// Any spectral index on the [-1, 1] scale, taken from the optical sources.
    pub fn vegetation_index(name: &str) -> Self {
        Self {
            name: name.to_string(),
            eligible: SourceSelector::only(&OPTICAL),
            extractor: ValueExtractor::Index(name.to_string()),
            valid_range: ValidRange::new(-1.0, 1.0),
            max_variance: 0.04,
            agreement: AgreementThresholds::new(0.02, 0.05),
        }
    }

    /// Land surface temperature in °C from the thermal-capable sources.
    pub fn temperature() -> Self {
        Self {
            name: TEMPERATURE.to_string(),
            eligible: SourceSelector::only(&THERMAL),
            extractor: ValueExtractor::Temperature,
            valid_range: ValidRange::new(0.0, 60.0),
            max_variance: 4.0, // (2°C)²
            agreement: AgreementThresholds::new(1.0, 3.0),
        }
    }

    /// Soil moisture percentage from the SAR sources.
    pub fn soil_moisture() -> Self {
        Self {
            name: SOIL_MOISTURE.to_string(),
            eligible: SourceSelector::only(&SAR),
            extractor: ValueExtractor::SoilMoisture,
            valid_range: ValidRange::new(0.0, 100.0),
            max_variance: 100.0,
            agreement: AgreementThresholds::new(25.0, 50.0),
        }
    }

    /// The four standard metrics.
    pub fn standard_catalogue() -> Vec<Self> {
        vec![Self::ndvi(), Self::temperature(), Self::soil_moisture(), Self::evi()]
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| {
            Err(FusionError::InvalidConfig(format!(
                "metric '{}': {}",
                self.name, reason
            )))
        };

        if self.name.is_empty() {
            return Err(FusionError::InvalidConfig(
                "metric name must not be empty".to_string(),
            ));
        }
        if !(self.valid_range.min.is_finite() && self.valid_range.max.is_finite())
            || self.valid_range.min > self.valid_range.max
        {
            return invalid(format!(
                "invalid range [{}, {}]",
                self.valid_range.min, self.valid_range.max
            ));
        }
        if !(self.max_variance.is_finite() && self.max_variance > 0.0) {
            return invalid(format!("max_variance must be positive, got {}", self.max_variance));
        }
        let t = &self.agreement;
        if !(t.high_below.is_finite() && t.medium_below.is_finite())
            || t.high_below < 0.0
            || t.high_below > t.medium_below
        {
            return invalid(format!(
                "agreement thresholds must satisfy 0 <= high ({}) <= medium ({})",
                t.high_below, t.medium_below
            ));
        }
        if let SourceSelector::Only(ids) = &self.eligible {
            if ids.is_empty() {
                return invalid("eligible source list is empty".to_string());
            }
        }
        Ok(())
    }
}
