// SatFuse - Multi-source remote-sensing fusion
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Lenient JSON input adapter.
//!
//! Example JSON:
//! ```json
//! {
//!   "location": {"lat": 28.6139, "lon": 77.2090},
//!   "satellites": {
//!     "sentinel2": {"status": "success", "indices": {"ndvi": 0.65, "evi": 0.52}},
//!     "landsat8": {"status": "success", "temperature": 28.5, "indices": {"ndvi": 0.63}},
//!     "modis": {"status": "fallback", "temperature": {"day": 31.0, "night": 18.0}},
//!     "sentinel1": {"status": "success", "soil_moisture_estimate": 45.0}
//!   }
//! }
//! ```
//!
//! Only the top level is strict. Inside a source entry every field is
//! optional and a field of the wrong type is dropped with a `Malformed`
//! diagnostic.

use super::{FusionRequest, SourceReading, SourceStatus, TemperatureProfile, TemperatureReading};
use crate::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticLog};
use crate::error::{FusionError, Result};
use serde_json::{Map, Value};

/// Top-level key holding the per-source map.
pub const SATELLITES_KEY: &str = "satellites";

/// Parse a request, recording per-source defects into `log`.
pub(crate) fn parse_request(value: &Value, log: &mut DiagnosticLog) -> Result<FusionRequest> {
    let root = value.as_object().ok_or_else(|| {
        FusionError::InvalidInput("expected a JSON object at top level".to_string())
    })?;

    let satellites = match root.get(SATELLITES_KEY) {
        None => return Err(FusionError::MissingField(SATELLITES_KEY.to_string())),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(FusionError::InvalidInput(format!(
                "'{}' must be an object",
                SATELLITES_KEY
            )))
        }
    };

    let mut request = FusionRequest::new()
        .with_location(root.get("location").cloned().unwrap_or(Value::Null));

    for (source_id, entry) in satellites {
        let fields = match entry {
            Value::Object(fields) if !fields.is_empty() => fields,
            Value::Null | Value::Object(_) => {
                log.record(Diagnostic::source(source_id, DiagnosticKind::EmptyEntry));
                continue;
            }
            _ => {
                log.record(Diagnostic::source(
                    source_id,
                    DiagnosticKind::Malformed {
                        field: "entry".to_string(),
                    },
                ));
                continue;
            }
        };

        request.sources.push(parse_source(source_id, fields, log));
    }

    Ok(request)
}

fn parse_source(source_id: &str, fields: &Map<String, Value>, log: &mut DiagnosticLog) -> SourceReading {
    let status = fields
        .get("status")
        .and_then(Value::as_str)
        .map(SourceStatus::parse)
        .unwrap_or(SourceStatus::Unknown);

    let mut reading = SourceReading::new(source_id, status);

    match fields.get("indices") {
        None | Some(Value::Null) => {}
        Some(Value::Object(indices)) => {
            for (name, raw) in indices {
                if let Some(v) = number(source_id, &format!("indices.{}", name), raw, log) {
                    reading.indices.insert(name.clone(), v);
                }
            }
        }
        Some(_) => malformed(source_id, "indices", log),
    }

    reading.temperature = match fields.get("temperature") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64().map(TemperatureReading::Scalar),
        Some(Value::Object(profile)) => {
            let mut field = |key: &str| {
                profile
                    .get(key)
                    .and_then(|raw| number(source_id, &format!("temperature.{}", key), raw, log))
            };
            Some(TemperatureReading::Profile(TemperatureProfile {
                day: field("day"),
                night: field("night"),
                mean: field("mean"),
                land_surface: field("land_surface"),
                range: field("range"),
            }))
        }
        Some(_) => {
            malformed(source_id, "temperature", log);
            None
        }
    };

    reading.soil_moisture_estimate = fields
        .get("soil_moisture_estimate")
        .and_then(|raw| number(source_id, "soil_moisture_estimate", raw, log));

    reading
}

/// Numeric field; `null` counts as absent, anything else non-numeric is malformed.
fn number(source_id: &str, field: &str, raw: &Value, log: &mut DiagnosticLog) -> Option<f64> {
    match raw {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        _ => {
            malformed(source_id, field, log);
            None
        }
    }
}

fn malformed(source_id: &str, field: &str, log: &mut DiagnosticLog) {
    log.record(Diagnostic::source(
        source_id,
        DiagnosticKind::Malformed {
            field: field.to_string(),
        },
    ));
}
