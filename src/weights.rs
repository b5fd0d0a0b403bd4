//! Per-source reliability weights
//!
//! Weights reflect sensor resolution and trust. The table is an immutable
//! value injected into the engine through [`FusionConfig`](crate::FusionConfig);
//! nothing mutates it once the engine is built.

use crate::error::{FusionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight used for sources absent from the table.
pub const DEFAULT_FALLBACK_WEIGHT: f64 = 0.5;

/// Immutable source_id -> weight table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityWeights {
    /// Known sources.
    weights: BTreeMap<String, f64>,
    /// Weight for any source not in `weights`.
    fallback: f64,
}

impl Default for ReliabilityWeights {
    fn default() -> Self {
        Self::empty()
            .with_weight("cartosat", 1.0) // 0.25m PAN
            .with_weight("sentinel2", 0.95) // 10m optical
            .with_weight("irs", 0.90) // 23.5m optical
            .with_weight("landsat8", 0.85) // 30m optical + thermal
            .with_weight("sentinel1", 0.80) // 10m SAR
            .with_weight("risat", 0.80) // 25m SAR
            .with_weight("oceansat", 0.70) // 360m
            .with_weight("modis", 0.60) // 1km
    }
}

impl ReliabilityWeights {
    /// Create an empty table using [`DEFAULT_FALLBACK_WEIGHT`] for every source.
    pub fn empty() -> Self {
        Self {
            weights: BTreeMap::new(),
            fallback: DEFAULT_FALLBACK_WEIGHT,
        }
    }

    /// Builder: set the weight for one source.
    pub fn with_weight(mut self, source_id: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(source_id.into(), weight);
        self
    }

    /// Builder: set the weight used for unknown sources.
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Weight for a source, falling back for unknown ids.
    pub fn weight(&self, source_id: &str) -> f64 {
        self.weights.get(source_id).copied().unwrap_or(self.fallback)
    }

    /// Weight for a source only if it is listed.
    pub fn get(&self, source_id: &str) -> Option<f64> {
        self.weights.get(source_id).copied()
    }

    /// Weight used for unknown sources.
    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    /// Number of listed sources.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Check if no source is listed.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterate listed sources in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(id, w)| (id.as_str(), *w))
    }

    /// Every weight, fallback included, must lie in (0, 1].
    pub fn validate(&self) -> Result<()> {
        let check = |name: &str, w: f64| {
            if w.is_finite() && w > 0.0 && w <= 1.0 {
                Ok(())
            } else {
                Err(FusionError::InvalidConfig(format!(
                    "weight for {} must be in (0, 1], got {}",
                    name, w
                )))
            }
        };

        for (id, w) in self.iter() {
            check(id, w)?;
        }
        check("unknown sources", self.fallback)
    }
}
