//! Feature-level fusion
//!
//! Unweighted averaging of named feature vectors. Unlike metric fusion
//! there is no eligibility, range or reliability weighting here.
//! Feature names are the union over all sources, not just the first source's names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Method tag carried by every feature fusion result.
pub const FEATURE_AVERAGE: &str = "feature_average";

/// Per-source feature maps, keyed by source id.
pub type SourceFeatures = BTreeMap<String, BTreeMap<String, f64>>;

/// Result of feature-level fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFusion {
    /// Mean of each feature over the sources reporting it.
    pub fused_features: BTreeMap<String, f64>,
    /// Number of input sources.
    pub num_sources: usize,
    /// Always [`FEATURE_AVERAGE`].
    pub method: String,
}

impl FeatureFusion {
    /// Fused value for one feature.
    pub fn get(&self, feature: &str) -> Option<f64> {
        self.fused_features.get(feature).copied()
    }
}

/// Average every feature over the sources that report it as a finite number.
pub fn fuse_features(features: &SourceFeatures) -> FeatureFusion {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for (source_id, values) in features {
        for (name, &value) in values {
            if !value.is_finite() {
                log::debug!("excluded: source={} feature={} - non-finite value", source_id, name);
                continue;
            }
            let slot = sums.entry(name.as_str()).or_insert((0.0, 0));
            slot.0 += value;
            slot.1 += 1;
        }
    }

    FeatureFusion {
        fused_features: sums
            .into_iter()
            .map(|(name, (sum, count))| (name.to_string(), sum / count as f64))
            .collect(),
        num_sources: features.len(),
        method: FEATURE_AVERAGE.to_string(),
    }
}
