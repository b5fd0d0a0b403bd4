// SatFuse - Multi-source remote-sensing fusion
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-metric fusion routine.
//!
//! One routine serves every metric: collect in-range contributions from
//! eligible sources, combine them, then score variance, confidence and
//! agreement. What differs between metrics comes from the [`MetricSpec`].

use crate::config::{ConfidenceConfig, FusionConfig, FusionMethod};
use crate::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticLog};
use crate::input::SourceReading;
use crate::metric::{Agreement, MetricSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cross-validation detail for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    /// Raw value used from each contributing source.
    pub sources: BTreeMap<String, f64>,
    /// Fused value (same as [`MetricFusion::value`]).
    pub fused: f64,
    /// Population variance of the raw values.
    pub variance: f64,
    /// Agreement tier.
    pub agreement: Agreement,
    /// Number of contributing sources.
    pub num_sources: usize,
}

/// Result of fusing one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFusion {
    /// Fused value, inside the metric's valid range.
    pub value: f64,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Per-source detail behind the fused value.
    pub cross_validation: CrossValidation,
}

/// One accepted value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution<'a> {
    pub source_id: &'a str,
    pub value: f64,
    pub weight: f64,
}

/// Fuse one metric over the filtered sources.
///
/// Returns `None` when no eligible source carries a usable value; the
/// metric is then left out of the report.
pub(crate) fn fuse_metric(
    spec: &MetricSpec,
    sources: &[&SourceReading],
    config: &FusionConfig,
    log: &mut DiagnosticLog,
) -> Option<MetricFusion> {
    let contributions = collect_contributions(spec, sources, config, log);
    if contributions.is_empty() {
        log::trace!("metric {}: no contributing source", spec.name);
        return None;
    }

    let combined = combine(&contributions, config.method)?;
    // Guards float rounding only; inputs are already in range.
    let value = combined.clamp(spec.valid_range.min, spec.valid_range.max);

    let values: Vec<f64> = contributions.iter().map(|c| c.value).collect();
    let variance = population_variance(&values);
    let confidence = confidence_score(
        contributions.len(),
        variance,
        spec.max_variance,
        &config.confidence,
    );
    let agreement = spec.agreement.classify(variance);

    log::trace!(
        "metric {}: fused={} variance={} confidence={} agreement={} sources={}",
        spec.name,
        value,
        variance,
        confidence,
        agreement.as_str(),
        contributions.len()
    );

    Some(MetricFusion {
        value,
        confidence,
        cross_validation: CrossValidation {
            sources: contributions
                .iter()
                .map(|c| (c.source_id.to_string(), c.value))
                .collect(),
            fused: value,
            variance,
            agreement,
            num_sources: contributions.len(),
        },
    })
}

/// Accepted (value, weight) pairs in source order.
pub(crate) fn collect_contributions<'a>(
    spec: &MetricSpec,
    sources: &[&'a SourceReading],
    config: &FusionConfig,
    log: &mut DiagnosticLog,
) -> Vec<Contribution<'a>> {
    let mut contributions = Vec::new();

    for reading in sources {
        if !spec.eligible.accepts(&reading.source_id) {
            continue;
        }
        let value = match spec.extractor.extract(reading) {
            Some(v) => v,
            None => continue,
        };

        if !value.is_finite() {
            log.record(Diagnostic::metric(
                &reading.source_id,
                &spec.name,
                DiagnosticKind::NonFinite,
            ));
            continue;
        }
        if !spec.valid_range.contains(value) {
            log.record(Diagnostic::metric(
                &reading.source_id,
                &spec.name,
                DiagnosticKind::OutOfRange { value },
            ));
            continue;
        }

        contributions.push(Contribution {
            source_id: reading.source_id.as_str(),
            value,
            weight: config.weights.weight(&reading.source_id),
        });
    }

    contributions
}

/// Combine contributions with the selected method.
pub fn combine(contributions: &[Contribution<'_>], method: FusionMethod) -> Option<f64> {
    match method {
        FusionMethod::WeightedAverage => weighted_mean(contributions),
        FusionMethod::MaxConfidence => most_reliable(contributions),
        FusionMethod::Consensus => {
            let values: Vec<f64> = contributions.iter().map(|c| c.value).collect();
            median(&values)
        }
    }
}

/// `Σ(value·weight) / Σ(weight)`, accumulated as a running weighted mean.
///
/// The running form returns a lone value, or a set of identical values,
/// bit-for-bit unchanged.
pub fn weighted_mean(contributions: &[Contribution<'_>]) -> Option<f64> {
    let mut mean = 0.0;
    let mut total_weight = 0.0;
    for c in contributions {
        total_weight += c.weight;
        mean += (c.weight / total_weight) * (c.value - mean);
    }
    if total_weight > 0.0 {
        Some(mean)
    } else {
        None
    }
}

/// Value of the highest-weight contributor; the first one wins ties.
pub fn most_reliable(contributions: &[Contribution<'_>]) -> Option<f64> {
    contributions
        .iter()
        .fold(None, |best: Option<&Contribution>, c| match best {
            Some(b) if b.weight >= c.weight => Some(b),
            _ => Some(c),
        })
        .map(|c| c.value)
}

/// Median; mean of the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Population variance; 0 for fewer than two values.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Confidence from contributor count and spread, clamped to [0, 1].
pub fn confidence_score(
    num_sources: usize,
    variance: f64,
    max_variance: f64,
    config: &ConfidenceConfig,
) -> f64 {
    let source_confidence = (num_sources as f64 / config.saturation_sources as f64).min(1.0);
    let variance_confidence = (1.0 - variance / max_variance).max(0.0);
    let confidence =
        source_confidence * config.source_share + variance_confidence * config.variance_share;
    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::SourceStatus;
    use crate::metric::{ValidRange, NDVI};
    use approx::assert_relative_eq;

    fn contribution(source_id: &str, value: f64, weight: f64) -> Contribution<'_> {
        Contribution {
            source_id,
            value,
            weight,
        }
    }

    fn optical(id: &str, ndvi: f64) -> SourceReading {
        SourceReading::new(id, SourceStatus::Success).with_index(NDVI, ndvi)
    }

    #[test]
    fn test_weighted_mean() {
        let c = [
            contribution("sentinel2", 0.65, 0.95),
            contribution("landsat8", 0.63, 0.85),
            contribution("irs", 0.64, 0.90),
        ];
        let expected = (0.65 * 0.95 + 0.63 * 0.85 + 0.64 * 0.90) / 2.7;
        assert_relative_eq!(weighted_mean(&c).unwrap(), expected, epsilon = 1e-12);
        assert!(weighted_mean(&[]).is_none());
    }

    #[test]
    fn test_most_reliable() {
        let c = [
            contribution("landsat8", 0.63, 0.85),
            contribution("sentinel2", 0.65, 0.95),
            contribution("cartosat", 0.70, 0.95),
        ];
        // Tie at 0.95 keeps the earlier source.
        assert_eq!(most_reliable(&c), Some(0.65));
        assert_eq!(most_reliable(&[]), None);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0]), Some(3.0));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_population_variance() {
        assert_eq!(population_variance(&[]), 0.0);
        assert_eq!(population_variance(&[0.7]), 0.0);
        assert_relative_eq!(population_variance(&[1.0, 3.0]), 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            population_variance(&[0.65, 0.63, 0.64]),
            0.0002 / 3.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_confidence_score() {
        let config = ConfidenceConfig::default();
        // Single source, no spread: 0.6 * 0.25 + 0.4 * 1.0
        assert_relative_eq!(confidence_score(1, 0.0, 0.04, &config), 0.55, epsilon = 1e-12);
        // Saturated count, no spread.
        assert_relative_eq!(confidence_score(6, 0.0, 4.0, &config), 1.0, epsilon = 1e-12);
        // Spread beyond max_variance zeroes the variance term.
        assert_relative_eq!(confidence_score(2, 10.0, 4.0, &config), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_fuse_metric_scenario() {
        let readings = vec![
            optical("sentinel2", 0.65),
            optical("landsat8", 0.63),
            optical("irs", 0.64),
        ];
        let refs: Vec<&SourceReading> = readings.iter().collect();
        let config = FusionConfig::default();
        let mut log = DiagnosticLog::disabled();

        let result = fuse_metric(&MetricSpec::ndvi(), &refs, &config, &mut log).unwrap();
        assert_relative_eq!(result.value, 1.729 / 2.7, epsilon = 1e-9);
        assert_relative_eq!(result.cross_validation.variance, 0.0002 / 3.0, epsilon = 1e-12);
        assert_eq!(result.cross_validation.agreement, Agreement::High);
        assert_eq!(result.cross_validation.num_sources, 3);
        assert_eq!(result.cross_validation.fused, result.value);
        assert_relative_eq!(
            result.confidence,
            0.6 * 0.75 + 0.4 * (1.0 - (0.0002 / 3.0) / 0.04),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_ineligible_and_out_of_range_skipped() {
        let readings = vec![
            optical("modis", 0.5),     // not optical
            optical("sentinel2", 1.4), // out of range
            optical("landsat8", f64::NAN),
            optical("irs", 0.6),
        ];
        let refs: Vec<&SourceReading> = readings.iter().collect();
        let mut log = DiagnosticLog::new(true);

        let result =
            fuse_metric(&MetricSpec::ndvi(), &refs, &FusionConfig::default(), &mut log).unwrap();
        assert_eq!(result.value, 0.6);
        assert_eq!(result.cross_validation.sources.len(), 1);
        assert!(result.cross_validation.sources.contains_key("irs"));

        let entries = log.into_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, DiagnosticKind::OutOfRange { value: 1.4 });
        assert_eq!(entries[1].kind, DiagnosticKind::NonFinite);
    }

    #[test]
    fn test_no_contributor_returns_none() {
        let readings = vec![SourceReading::new("sentinel1", SourceStatus::Success).with_soil_moisture(40.0)];
        let refs: Vec<&SourceReading> = readings.iter().collect();
        let mut log = DiagnosticLog::disabled();
        assert!(fuse_metric(&MetricSpec::ndvi(), &refs, &FusionConfig::default(), &mut log).is_none());
    }

    #[test]
    fn test_fused_value_stays_in_range_at_boundary() {
        let readings = vec![optical("sentinel2", 1.0), optical("landsat8", 1.0), optical("irs", 1.0)];
        let refs: Vec<&SourceReading> = readings.iter().collect();
        let mut log = DiagnosticLog::disabled();
        let result =
            fuse_metric(&MetricSpec::ndvi(), &refs, &FusionConfig::default(), &mut log).unwrap();
        assert!(ValidRange::new(-1.0, 1.0).contains(result.value));
        assert_eq!(result.cross_validation.agreement, Agreement::High);
    }

    #[test]
    fn test_methods_share_scoring() {
        let readings = vec![
            optical("sentinel2", 0.2),
            optical("landsat8", 0.8),
            optical("irs", 0.3),
        ];
        let refs: Vec<&SourceReading> = readings.iter().collect();

        let mut results = Vec::new();
        for method in [
            FusionMethod::WeightedAverage,
            FusionMethod::MaxConfidence,
            FusionMethod::Consensus,
        ] {
            let config = FusionConfig::default().with_method(method);
            let mut log = DiagnosticLog::disabled();
            results.push(fuse_metric(&MetricSpec::ndvi(), &refs, &config, &mut log).unwrap());
        }

        assert_eq!(results[1].value, 0.2); // sentinel2 has the top weight
        assert_eq!(results[2].value, 0.3); // median
        for r in &results[1..] {
            assert_eq!(r.confidence, results[0].confidence);
            assert_eq!(r.cross_validation.variance, results[0].cross_validation.variance);
            assert_eq!(r.cross_validation.agreement, results[0].cross_validation.agreement);
        }
    }
}
