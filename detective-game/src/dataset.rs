//! Tabular mission data: shipments, warehouses, delay reports and anomalies.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::anomaly::detect_anomalies;
use crate::constants::DEFAULT_CONTAMINATION;
use crate::numbers::i64_to_f64;

/// A single shipment leg from a warehouse to a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: String,
    pub warehouse_id: String,
    pub supplier: String,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub expected_time: DateTime<Utc>,
    pub actual_time: DateTime<Utc>,
    pub cost: f64,
    pub sku_count: u32,
    pub traffic_index: f64,
}

impl Shipment {
    /// Signed delay in minutes; negative when the shipment arrived early.
    #[must_use]
    pub fn delay_minutes(&self) -> f64 {
        i64_to_f64((self.actual_time - self.expected_time).num_seconds()) / 60.0
    }

    #[must_use]
    pub fn is_late(&self) -> bool {
        self.actual_time > self.expected_time
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub warehouse_id: String,
    pub warehouse_name: String,
    pub location: String,
    pub capacity: u32,
    #[serde(default)]
    pub current_load: Option<u32>,
}

/// Delay report filed against a late shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayRecord {
    pub shipment_id: String,
    pub delay_minutes: f64,
    pub delay_category: DelayCategory,
    pub reported_reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayCategory {
    Minor,
    Moderate,
    Severe,
}

impl DelayCategory {
    #[must_use]
    pub fn from_minutes(minutes: f64) -> Self {
        if minutes < 60.0 {
            Self::Minor
        } else if minutes < 240.0 {
            Self::Moderate
        } else {
            Self::Severe
        }
    }

    /// Case-insensitive label lookup.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "minor" => Some(Self::Minor),
            "moderate" => Some(Self::Moderate),
            "severe" => Some(Self::Severe),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

/// Anomaly detector output for one shipment. Higher scores are more unusual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub shipment_id: String,
    pub anomaly_score: f64,
    pub anomaly_flag: bool,
}

/// Everything the dashboard and investigation screens show for one mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Dataset {
    #[serde(default)]
    pub mission_index: usize,
    #[serde(default)]
    pub seed: u64,
    pub shipments: Vec<Shipment>,
    pub warehouses: Vec<Warehouse>,
    #[serde(default)]
    pub delays: Vec<DelayRecord>,
    #[serde(default)]
    pub anomalies: Vec<AnomalyRecord>,
}

/// Schema violations found while validating a dataset.
#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("dataset has no shipments")]
    NoShipments,
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("shipment {shipment} references unknown warehouse {warehouse}")]
    UnknownWarehouse { shipment: String, warehouse: String },
    #[error("{kind} references unknown shipment {shipment}")]
    UnknownShipment { kind: &'static str, shipment: String },
    #[error("{field} on {id} must be finite and non-negative (got {value})")]
    InvalidNumber {
        field: &'static str,
        id: String,
        value: f64,
    },
    #[error("warehouse {0} must have a positive capacity")]
    ZeroCapacity(String),
}

impl Dataset {
    /// Load a dataset from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the data is inconsistent.
    pub fn from_json(json: &str) -> Result<Self, DatasetLoadError> {
        let dataset: Self = serde_json::from_str(json)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Check referential integrity and numeric sanity.
    ///
    /// # Errors
    ///
    /// Returns the first violation encountered.
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.shipments.is_empty() {
            return Err(DatasetError::NoShipments);
        }

        let mut warehouse_ids = HashSet::with_capacity(self.warehouses.len());
        for wh in &self.warehouses {
            if !warehouse_ids.insert(wh.warehouse_id.as_str()) {
                return Err(DatasetError::DuplicateId {
                    kind: "warehouse",
                    id: wh.warehouse_id.clone(),
                });
            }
            if wh.capacity == 0 {
                return Err(DatasetError::ZeroCapacity(wh.warehouse_id.clone()));
            }
        }

        let mut shipment_ids = HashSet::with_capacity(self.shipments.len());
        for s in &self.shipments {
            if !shipment_ids.insert(s.shipment_id.as_str()) {
                return Err(DatasetError::DuplicateId {
                    kind: "shipment",
                    id: s.shipment_id.clone(),
                });
            }
            if !warehouse_ids.contains(s.warehouse_id.as_str()) {
                return Err(DatasetError::UnknownWarehouse {
                    shipment: s.shipment_id.clone(),
                    warehouse: s.warehouse_id.clone(),
                });
            }
            for (field, value) in [
                ("distance_km", s.distance_km),
                ("cost", s.cost),
                ("traffic_index", s.traffic_index),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(DatasetError::InvalidNumber {
                        field,
                        id: s.shipment_id.clone(),
                        value,
                    });
                }
            }
        }

        for delay in &self.delays {
            if !shipment_ids.contains(delay.shipment_id.as_str()) {
                return Err(DatasetError::UnknownShipment {
                    kind: "delay record",
                    shipment: delay.shipment_id.clone(),
                });
            }
            if !delay.delay_minutes.is_finite() || delay.delay_minutes < 0.0 {
                return Err(DatasetError::InvalidNumber {
                    field: "delay_minutes",
                    id: delay.shipment_id.clone(),
                    value: delay.delay_minutes,
                });
            }
        }

        for anomaly in &self.anomalies {
            if !shipment_ids.contains(anomaly.shipment_id.as_str()) {
                return Err(DatasetError::UnknownShipment {
                    kind: "anomaly record",
                    shipment: anomaly.shipment_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Run the anomaly detector when the source carried no anomaly records.
    ///
    /// Returns `true` when records were computed.
    pub fn fill_missing_anomalies(&mut self) -> bool {
        if !self.anomalies.is_empty() {
            return false;
        }
        self.anomalies = detect_anomalies(&self.shipments, DEFAULT_CONTAMINATION);
        true
    }

    #[must_use]
    pub fn warehouse(&self, id: &str) -> Option<&Warehouse> {
        self.warehouses.iter().find(|w| w.warehouse_id == id)
    }

    /// Flagged shipments, most anomalous first.
    #[must_use]
    pub fn flagged_anomalies(&self) -> Vec<&AnomalyRecord> {
        let mut flagged: Vec<&AnomalyRecord> =
            self.anomalies.iter().filter(|a| a.anomaly_flag).collect();
        flagged.sort_by(|a, b| b.anomaly_score.total_cmp(&a.anomaly_score));
        flagged
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.shipments.len() + self.warehouses.len() + self.delays.len()
    }
}

#[derive(Debug, Error)]
pub enum DatasetLoadError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
    #[error("{table} table is missing required columns: {}", columns.join(", "))]
    MissingColumns {
        table: &'static str,
        columns: Vec<String>,
    },
    #[error("{table} table has an unreadable timestamp: {value}")]
    Timestamp { table: &'static str, value: String },
    #[error("invalid dataset: {0}")]
    Invalid(#[from] DatasetError),
}
