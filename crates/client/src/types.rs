//! Wire types for the simulation service's JSON API.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use simbridge_types::{PointCatalog, Snapshot, Value};
use std::collections::HashMap;

/// Response to a test case selection.
#[derive(Debug, Deserialize)]
pub(crate) struct SelectResponse {
    pub testid: String,
}

/// Request body for case initialization.
#[derive(Debug, Serialize)]
pub(crate) struct InitializeRequest {
    pub start_time: u64,
    pub warmup_period: u64,
}

/// Request body for a step change.
#[derive(Debug, Serialize)]
pub(crate) struct StepRequest {
    pub step: u64,
}

/// Standard response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: String,
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Envelopes may carry their own status independent of the HTTP one.
    pub fn is_success(&self) -> bool {
        self.status.map_or(true, |s| (200..300).contains(&s))
    }
}

/// Outcome of decoding a body: either the payload or a reason it was refused.
#[derive(Debug, PartialEq)]
pub(crate) enum Decoded<T> {
    Payload(T),
    Rejected { status: u16, message: String },
}

/// Decode an enveloped payload.
pub(crate) fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<Decoded<T>, String> {
    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|e| e.to_string())?;
    if envelope.is_success() {
        Ok(Decoded::Payload(envelope.payload))
    } else {
        Ok(Decoded::Rejected {
            status: envelope.status.unwrap_or_default(),
            message: envelope.message,
        })
    }
}

/// Decode an enveloped snapshot, dropping points that carry no value.
pub(crate) fn decode_snapshot(body: &str) -> Result<Decoded<Snapshot>, String> {
    Ok(
        match decode_envelope::<HashMap<String, Option<Value>>>(body)? {
            Decoded::Payload(points) => Decoded::Payload(
                points
                    .into_iter()
                    .filter_map(|(name, value)| value.map(|v| (name, v)))
                    .collect(),
            ),
            Decoded::Rejected { status, message } => Decoded::Rejected { status, message },
        },
    )
}

/// Decode an enveloped point catalog.
pub(crate) fn decode_catalog(body: &str) -> Result<Decoded<PointCatalog>, String> {
    decode_envelope(body)
}

/// Decode an enveloped step size, rounding fractional seconds.
pub(crate) fn decode_step(body: &str) -> Result<Decoded<u64>, String> {
    Ok(match decode_envelope::<f64>(body)? {
        Decoded::Payload(step) if step.is_finite() && step >= 0.0 => {
            Decoded::Payload(step.round() as u64)
        }
        Decoded::Payload(step) => return Err(format!("invalid step {}", step)),
        Decoded::Rejected { status, message } => Decoded::Rejected { status, message },
    })
}

/// Interpret a status body.
///
/// The service answers with a bare string, an object with a `status` field,
/// or an envelope whose payload is either of those.
pub(crate) fn decode_running(body: &str) -> Result<bool, String> {
    let json: serde_json::Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) => return Ok(body.trim().eq_ignore_ascii_case("running")),
    };
    fn running(json: &serde_json::Value) -> Option<bool> {
        match json {
            serde_json::Value::String(s) => Some(s.trim().eq_ignore_ascii_case("running")),
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::Object(map) => map
                .get("payload")
                .and_then(running)
                .or_else(|| map.get("status").and_then(running)),
            _ => None,
        }
    }
    running(&json).ok_or_else(|| format!("unrecognized status body: {}", body))
}

/// Best-effort human readable reason from an error body.
pub(crate) fn rejection_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Message {
        message: String,
    }
    match serde_json::from_str::<Message>(body) {
        Ok(m) if !m.message.is_empty() => m.message,
        _ => body.trim().to_string(),
    }
}
