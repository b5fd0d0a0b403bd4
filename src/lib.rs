//! # SatFuse - Multi-source remote-sensing fusion
//!
//! Combines per-source satellite observations (spectral indices, surface
//! temperature, soil moisture) into one fused estimate per metric, with a
//! confidence score and a cross-validation record of how well the sources
//! agreed.
//!
//! ## Key Features
//!
//! - **Reliability weighting**: each source carries a weight in (0, 1]
//! - **Data-driven metrics**: eligibility, valid range and variance
//!   calibration are configuration, the fusion routine is shared
//! - **Lenient input**: per-source defects exclude one value, never the request
//! - **Audit trail**: every exclusion is logged and can be returned in the report
//!
//! ## Quick Start
//!
//! ```rust
//! use satfuse::{FusionEngine, FusionRequest, SourceReading, SourceStatus, Agreement};
//!
//! let engine = FusionEngine::default();
//!
//! let request = FusionRequest::new()
//!     .with_source(SourceReading::new("sentinel2", SourceStatus::Success).with_index("ndvi", 0.65))
//!     .with_source(SourceReading::new("landsat8", SourceStatus::Success).with_index("ndvi", 0.63))
//!     .with_source(SourceReading::new("irs", SourceStatus::Fallback).with_index("ndvi", 0.64));
//!
//! let report = engine.fuse(&request);
//! assert!(report.is_success());
//!
//! let ndvi = report.fused("ndvi").unwrap();
//! assert!((ndvi - 0.6404).abs() < 1e-3);
//! assert_eq!(report.agreement("ndvi"), Some(Agreement::High));
//! ```
//!
//! JSON in the data gathering layer's shape goes through
//! [`FusionEngine::fuse_json`]:
//!
//! ```rust
//! use satfuse::{FusionEngine, FusionStatus};
//!
//! let engine = FusionEngine::default();
//! let report = engine
//!     .fuse_json(r#"{"satellites": {"sentinel1": {"status": "success", "soil_moisture_estimate": 45.0}}}"#)
//!     .unwrap();
//!
//! assert_eq!(report.status, FusionStatus::Success);
//! assert_eq!(report.fused("soil_moisture"), Some(45.0));
//! assert!((report.confidence("soil_moisture").unwrap() - 0.55).abs() < 1e-9);
//! ```
//!
//! ## Modules
//!
//! - [`input`]: Request model and lenient JSON adapter
//! - [`weights`]: Source reliability table
//! - [`metric`]: Metric catalogue
//! - [`fusion`]: Per-metric fusion routine
//! - [`aggregate`]: Overall confidence, consensus and quality
//! - [`engine`]: Orchestration
//! - [`report`]: Output structure
//! - [`features`]: Feature-level fusion

// Modules
pub mod aggregate;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod features;
pub mod fusion;
pub mod input;
pub mod metric;
pub mod report;
pub mod weights;

// Re-exports for convenient access
pub use aggregate::{ConsensusLevel, QualityTier};
pub use config::{
    ConfidenceConfig, ConsensusConfig, FusionConfig, FusionMethod, QualityConfig, QualityRule,
};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use engine::FusionEngine;
pub use error::{FusionError, Result};
pub use features::{FeatureFusion, SourceFeatures};
pub use fusion::CrossValidation;
pub use input::{FusionRequest, SourceReading, SourceStatus, TemperatureProfile, TemperatureReading};
pub use metric::{Agreement, MetricSpec, SourceSelector, ValidRange, ValueExtractor};
pub use report::{FusionReport, FusionStatus};
pub use weights::ReliabilityWeights;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
