// SatFuse - Multi-source remote-sensing fusion
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! FusionEngine - main orchestration for multi-source fusion.

use crate::aggregate::{consensus_level, overall_confidence, overall_quality};
use crate::config::FusionConfig;
use crate::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticLog};
use crate::error::Result;
use crate::features::{self, FeatureFusion, SourceFeatures};
use crate::fusion::fuse_metric;
use crate::input::{parse_request, FusionRequest, SourceReading};
use crate::report::FusionReport;
use serde_json::Value;

/// Stateless fusion engine.
///
/// Holds only its validated configuration, so one engine can be shared
/// across threads behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    /// Create an engine, validating the configuration first.
    pub fn new(config: FusionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuse a typed request.
    pub fn fuse(&self, request: &FusionRequest) -> FusionReport {
        let mut log = DiagnosticLog::new(self.config.diagnostics);
        self.fuse_request(request, &mut log)
    }

    /// Fuse a request in the data gathering layer's JSON shape.
    ///
    /// Structural problems (no `satellites` mapping, non-object input)
    /// yield a report with `status = error` instead of an `Err`.
    pub fn fuse_value(&self, value: &Value) -> FusionReport {
        let mut log = DiagnosticLog::new(self.config.diagnostics);
        match parse_request(value, &mut log) {
            Ok(request) => self.fuse_request(&request, &mut log),
            Err(e) => {
                log::warn!("rejecting fusion request: {}", e);
                FusionReport::error(e.to_string(), self.config.method)
            }
        }
    }

    /// Fuse a request from JSON text. Only unparseable text is an `Err`.
    pub fn fuse_json(&self, json: &str) -> Result<FusionReport> {
        let value: Value = serde_json::from_str(json)?;
        Ok(self.fuse_value(&value))
    }

    /// Feature-level fusion: unweighted mean per feature name.
    pub fn fuse_features(&self, features: &SourceFeatures) -> FeatureFusion {
        features::fuse_features(features)
    }

    /// Like [`fuse`](Self::fuse), stamped with the current UTC time.
    #[cfg(feature = "timestamps")]
    pub fn fuse_stamped(&self, request: &FusionRequest) -> FusionReport {
        self.fuse(request).stamped(chrono::Utc::now())
    }

    fn fuse_request(&self, request: &FusionRequest, log: &mut DiagnosticLog) -> FusionReport {
        let method = self.config.method;
        let sources = filter_sources(&request.sources, log);

        if sources.is_empty() {
            log::debug!("no fusable source in request");
            let mut report = FusionReport::no_valid_data(request.location.clone(), method);
            report.diagnostics = log.take_entries();
            return report;
        }

        let data_sources = sources.iter().map(|s| s.source_id.clone()).collect();
        let mut report = FusionReport::success(request.location.clone(), method, data_sources);

        for spec in &self.config.metrics {
            if let Some(fusion) = fuse_metric(spec, &sources, &self.config, log) {
                report.insert_metric(&spec.name, fusion);
            }
        }

        report.overall_confidence = overall_confidence(report.confidence_scores.values().copied());
        report.consensus_level = consensus_level(
            report.cross_validation.values().map(|cv| cv.agreement),
            &self.config.consensus,
        );
        report.overall_quality = overall_quality(
            report.overall_confidence,
            sources.len(),
            &self.config.quality,
        );
        report.diagnostics = log.take_entries();

        log::debug!(
            "fused {} metrics from {} sources, confidence={:.3} quality={}",
            report.metric_count(),
            sources.len(),
            report.overall_confidence,
            report.overall_quality.as_str()
        );

        report
    }
}

/// Fusable readings in input order; a later reading with a repeated id
/// replaces the earlier one in place.
fn filter_sources<'a>(readings: &'a [SourceReading], log: &mut DiagnosticLog) -> Vec<&'a SourceReading> {
    let mut kept: Vec<&SourceReading> = Vec::with_capacity(readings.len());

    for reading in readings {
        let slot = kept.iter().position(|s| s.source_id == reading.source_id);

        if !reading.status.is_fusable() {
            log.record(Diagnostic::source(
                &reading.source_id,
                DiagnosticKind::StatusExcluded {
                    status: reading.status.as_str().to_string(),
                },
            ));
            if let Some(i) = slot {
                kept.remove(i);
            }
            continue;
        }

        match slot {
            Some(i) => kept[i] = reading,
            None => kept.push(reading),
        }
    }

    kept
}
