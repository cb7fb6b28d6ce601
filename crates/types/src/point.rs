//! Point metadata.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata the simulation publishes for a measurement or input point.
///
/// Field names follow the remote service's capitalized JSON keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointProperties {
    #[serde(rename = "Unit", default)]
    pub unit: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Minimum", default)]
    pub minimum: Option<f64>,
    #[serde(rename = "Maximum", default)]
    pub maximum: Option<f64>,
}

/// Point name to metadata.
pub type PointCatalog = HashMap<String, PointProperties>;
