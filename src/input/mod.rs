// SatFuse - Multi-source remote-sensing fusion
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Input model for the fusion engine.
//!
//! A request can be built in Rust with the builders below or parsed from
//! the JSON produced by the data gathering layer (see [`FusionRequest::from_json`]).
//! JSON parsing is lenient: malformed per-source fields are dropped with a
//! diagnostic instead of failing the whole request.

mod json;

pub(crate) use json::{parse_request, SATELLITES_KEY};

use crate::diagnostic::DiagnosticLog;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Status tag reported by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// Live data.
    Success,
    /// Substitute data after a live fetch failed.
    Fallback,
    /// Simulated data.
    Simulated,
    /// Source failed.
    Error,
    /// Missing or unrecognised tag.
    #[serde(other)]
    Unknown,
}

impl SourceStatus {
    /// Parse a status tag; anything unrecognised maps to `Unknown`.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "success" => SourceStatus::Success,
            "fallback" => SourceStatus::Fallback,
            "simulated" => SourceStatus::Simulated,
            "error" => SourceStatus::Error,
            _ => SourceStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Success => "success",
            SourceStatus::Fallback => "fallback",
            SourceStatus::Simulated => "simulated",
            SourceStatus::Error => "error",
            SourceStatus::Unknown => "unknown",
        }
    }

    /// Only success, fallback and simulated readings take part in fusion.
    pub fn is_fusable(&self) -> bool {
        matches!(
            self,
            SourceStatus::Success | SourceStatus::Fallback | SourceStatus::Simulated
        )
    }
}

/// Temperature as reported by a source: a flat scalar or a day/night profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TemperatureReading {
    /// Single surface temperature (°C).
    Scalar(f64),
    /// Nested temperature profile (°C).
    Profile(TemperatureProfile),
}

/// Nested temperature structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TemperatureProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub night: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_surface: Option<f64>,
    /// Day/night spread. Never used as a temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>,
}

impl TemperatureReading {
    /// Normalize to one scalar.
    ///
    /// Profiles resolve to `land_surface`, then `mean`, then `day`.
    pub fn to_scalar(&self) -> Option<f64> {
        match self {
            TemperatureReading::Scalar(t) => Some(*t),
            TemperatureReading::Profile(p) => p.land_surface.or(p.mean).or(p.day),
        }
    }
}

/// One source's contribution to a fusion request.
///
/// Serializes to one `satellites` entry; the id is the entry's key, not a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReading {
    /// Source identifier (e.g. "sentinel2").
    #[serde(skip)]
    pub source_id: String,
    /// Reported status.
    pub status: SourceStatus,
    /// Spectral indices (ndvi, evi, ...).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub indices: BTreeMap<String, f64>,
    /// Surface temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<TemperatureReading>,
    /// Backscatter-derived soil moisture (%).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_moisture_estimate: Option<f64>,
}

impl SourceReading {
    /// Create a reading with no metrics.
    pub fn new(source_id: impl Into<String>, status: SourceStatus) -> Self {
        Self {
            source_id: source_id.into(),
            status,
            indices: BTreeMap::new(),
            temperature: None,
            soil_moisture_estimate: None,
        }
    }

    /// Builder: add a spectral index.
    pub fn with_index(mut self, name: &str, value: f64) -> Self {
        self.indices.insert(name.to_string(), value);
        self
    }

    /// Builder: set a scalar temperature.
    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(TemperatureReading::Scalar(celsius));
        self
    }

    /// Builder: set a temperature profile.
    pub fn with_temperature_profile(mut self, profile: TemperatureProfile) -> Self {
        self.temperature = Some(TemperatureReading::Profile(profile));
        self
    }

    /// Builder: set the soil moisture estimate.
    pub fn with_soil_moisture(mut self, percent: f64) -> Self {
        self.soil_moisture_estimate = Some(percent);
        self
    }

    /// Check if the reading carries no metric at all.
    pub fn has_no_metrics(&self) -> bool {
        self.indices.is_empty()
            && self.temperature.is_none()
            && self.soil_moisture_estimate.is_none()
    }

    /// Render in the data gathering layer's JSON shape (without `source_id`).
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A full fusion request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FusionRequest {
    /// Opaque location passthrough.
    pub location: Value,
    /// Readings in input order.
    pub sources: Vec<SourceReading>,
}

impl FusionRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: attach an opaque location.
    pub fn with_location(mut self, location: Value) -> Self {
        self.location = location;
        self
    }

    /// Builder: add a reading. A reading with an existing id replaces it in place.
    pub fn with_source(mut self, reading: SourceReading) -> Self {
        match self
            .sources
            .iter_mut()
            .find(|s| s.source_id == reading.source_id)
        {
            Some(existing) => *existing = reading,
            None => self.sources.push(reading),
        }
        self
    }

    /// Look up a reading by id.
    pub fn source(&self, source_id: &str) -> Option<&SourceReading> {
        self.sources.iter().find(|s| s.source_id == source_id)
    }

    /// Parse from a JSON value, dropping malformed per-source fields.
    pub fn from_value(value: &Value) -> Result<Self> {
        parse_request(value, &mut DiagnosticLog::disabled())
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Render in the data gathering layer's JSON shape.
    pub fn to_value(&self) -> Result<Value> {
        let mut satellites = Map::new();
        for reading in &self.sources {
            satellites.insert(reading.source_id.clone(), reading.to_value()?);
        }

        let mut root = Map::new();
        if !self.location.is_null() {
            root.insert("location".to_string(), self.location.clone());
        }
        root.insert(SATELLITES_KEY.to_string(), Value::Object(satellites));
        Ok(Value::Object(root))
    }
}
