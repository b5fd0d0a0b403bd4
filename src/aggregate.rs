//! Report-wide aggregates
//!
//! Turns per-metric results into the overall confidence, consensus level
//! and quality tier.

use crate::config::{ConsensusConfig, QualityConfig};
use crate::metric::Agreement;
use serde::{Deserialize, Serialize};

/// Report-wide summary of agreement tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsensusLevel {
    High,
    Medium,
    Low,
    /// No metric was fused.
    #[default]
    Unknown,
}

impl ConsensusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusLevel::High => "High",
            ConsensusLevel::Medium => "Medium",
            ConsensusLevel::Low => "Low",
            ConsensusLevel::Unknown => "Unknown",
        }
    }
}

/// Overall data quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Excellent,
    Good,
    Fair,
    Limited,
    /// Fusion did not run (no valid data or invalid input).
    #[default]
    Unknown,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Excellent => "Excellent",
            QualityTier::Good => "Good",
            QualityTier::Fair => "Fair",
            QualityTier::Limited => "Limited",
            QualityTier::Unknown => "Unknown",
        }
    }
}

/// Arithmetic mean of the per-metric confidences; 0.0 when there are none.
pub fn overall_confidence<I>(confidences: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = confidences
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), c| (sum + c, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Classify the multiset of agreement tiers.
pub fn consensus_level<I>(agreements: I, config: &ConsensusConfig) -> ConsensusLevel
where
    I: IntoIterator<Item = Agreement>,
{
    let mut high = 0usize;
    let mut medium = 0usize;
    let mut total = 0usize;
    for agreement in agreements {
        total += 1;
        match agreement {
            Agreement::High => high += 1,
            Agreement::Medium => medium += 1,
            Agreement::Low => {}
        }
    }

    if total == 0 {
        return ConsensusLevel::Unknown;
    }

    let needed = total as f64 * config.majority_ratio;
    if high as f64 >= needed {
        ConsensusLevel::High
    } else if (high + medium) as f64 >= needed {
        ConsensusLevel::Medium
    } else {
        ConsensusLevel::Low
    }
}

/// First rule whose confidence and source-count floors are both met.
pub fn overall_quality(confidence: f64, num_sources: usize, config: &QualityConfig) -> QualityTier {
    config
        .rules
        .iter()
        .find(|rule| confidence >= rule.min_confidence && num_sources >= rule.min_sources)
        .map(|rule| rule.tier)
        .unwrap_or(config.fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_overall_confidence() {
        assert_eq!(overall_confidence(Vec::<f64>::new()), 0.0);
        assert_relative_eq!(overall_confidence(vec![0.55]), 0.55);
        assert_relative_eq!(overall_confidence(vec![0.9, 0.7, 0.5]), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_consensus_unknown_when_empty() {
        let config = ConsensusConfig::default();
        assert_eq!(consensus_level(vec![], &config), ConsensusLevel::Unknown);
    }

    #[test]
    fn test_consensus_levels() {
        use Agreement::*;
        let config = ConsensusConfig::default();

        assert_eq!(consensus_level(vec![High, High, High, High], &config), ConsensusLevel::High);
        // 3/4 = 0.75 >= 0.7
        assert_eq!(consensus_level(vec![High, High, High, Low], &config), ConsensusLevel::High);
        // 2/4 High, 3/4 High+Medium
        assert_eq!(consensus_level(vec![High, High, Medium, Low], &config), ConsensusLevel::Medium);
        // 2/4 High+Medium
        assert_eq!(consensus_level(vec![High, Medium, Low, Low], &config), ConsensusLevel::Low);
        // 2/3 = 0.667 < 0.7
        assert_eq!(consensus_level(vec![High, High, Medium], &config), ConsensusLevel::Medium);
        assert_eq!(consensus_level(vec![Low], &config), ConsensusLevel::Low);
    }

    #[test]
    fn test_quality_table() {
        let config = QualityConfig::default();
        assert_eq!(overall_quality(0.85, 4, &config), QualityTier::Excellent);
        assert_eq!(overall_quality(0.85, 3, &config), QualityTier::Good);
        assert_eq!(overall_quality(0.75, 5, &config), QualityTier::Good);
        assert_eq!(overall_quality(0.8, 2, &config), QualityTier::Fair);
        assert_eq!(overall_quality(0.55, 2, &config), QualityTier::Fair);
        assert_eq!(overall_quality(0.95, 1, &config), QualityTier::Limited);
        assert_eq!(overall_quality(0.4, 8, &config), QualityTier::Limited);
    }

    #[test]
    fn test_as_str() {
        assert_eq!(ConsensusLevel::Unknown.as_str(), "Unknown");
        assert_eq!(QualityTier::Excellent.as_str(), "Excellent");
        assert_eq!(
            serde_json::to_value(QualityTier::Limited).unwrap(),
            serde_json::json!("Limited")
        );
    }
}
