//! CSV tables: `shipments.csv`, `warehouses.csv` and `delays.csv`.
//!
//! Each table must carry its required columns; extra columns are ignored.
//! Timestamps accept RFC 3339 or naive `YYYY-MM-DD HH:MM[:SS]` values read
//! as UTC.
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::dataset::{Dataset, DatasetLoadError, DelayCategory, DelayRecord, Shipment, Warehouse};

pub const SHIPMENT_COLUMNS: [&str; 11] = [
    "shipment_id",
    "warehouse_id",
    "supplier",
    "origin",
    "destination",
    "distance_km",
    "expected_time",
    "actual_time",
    "cost",
    "sku_count",
    "traffic_index",
];

pub const WAREHOUSE_COLUMNS: [&str; 4] = ["warehouse_id", "warehouse_name", "location", "capacity"];

pub const DELAY_COLUMNS: [&str; 5] = [
    "shipment_id",
    "delay_minutes",
    "delay_category",
    "reported_reason",
    "timestamp",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Deserialize)]
struct ShipmentRow {
    shipment_id: String,
    warehouse_id: String,
    supplier: String,
    origin: String,
    destination: String,
    distance_km: f64,
    expected_time: String,
    actual_time: String,
    cost: f64,
    sku_count: u32,
    traffic_index: f64,
}

#[derive(Debug, Deserialize)]
struct DelayRow {
    shipment_id: String,
    delay_minutes: f64,
    delay_category: String,
    reported_reason: String,
    timestamp: String,
}

fn parse_timestamp(table: &'static str, value: &str) -> Result<DateTime<Utc>, DatasetLoadError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DatasetLoadError::Timestamp {
            table,
            value: value.to_string(),
        })
}

fn read_table<T: DeserializeOwned>(
    table: &'static str,
    required: &[&str],
    text: &str,
) -> Result<Vec<T>, DatasetLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let missing: Vec<String> = required
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| (*column).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetLoadError::MissingColumns {
            table,
            columns: missing,
        });
    }
    let rows = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
    log::debug!("read {} {table} rows", rows.len());
    Ok(rows)
}

/// Parse `shipments.csv`.
///
/// # Errors
///
/// Returns an error on missing columns, malformed rows or bad timestamps.
pub fn read_shipments(text: &str) -> Result<Vec<Shipment>, DatasetLoadError> {
    read_table::<ShipmentRow>("shipments", &SHIPMENT_COLUMNS, text)?
        .into_iter()
        .map(|row| {
            Ok(Shipment {
                expected_time: parse_timestamp("shipments", &row.expected_time)?,
                actual_time: parse_timestamp("shipments", &row.actual_time)?,
                shipment_id: row.shipment_id,
                warehouse_id: row.warehouse_id,
                supplier: row.supplier,
                origin: row.origin,
                destination: row.destination,
                distance_km: row.distance_km,
                cost: row.cost,
                sku_count: row.sku_count,
                traffic_index: row.traffic_index,
            })
        })
        .collect()
}

/// Parse `warehouses.csv`. An optional `current_load` column is honoured.
///
/// # Errors
///
/// Returns an error on missing columns or malformed rows.
pub fn read_warehouses(text: &str) -> Result<Vec<Warehouse>, DatasetLoadError> {
    read_table("warehouses", &WAREHOUSE_COLUMNS, text)
}

/// Parse `delays.csv`. Unknown category labels are re-derived from the
/// delay length.
///
/// # Errors
///
/// Returns an error on missing columns, malformed rows or bad timestamps.
pub fn read_delays(text: &str) -> Result<Vec<DelayRecord>, DatasetLoadError> {
    read_table::<DelayRow>("delays", &DELAY_COLUMNS, text)?
        .into_iter()
        .map(|row| {
            let delay_category = DelayCategory::from_label(&row.delay_category)
                .unwrap_or_else(|| DelayCategory::from_minutes(row.delay_minutes));
            Ok(DelayRecord {
                timestamp: parse_timestamp("delays", &row.timestamp)?,
                shipment_id: row.shipment_id,
                delay_minutes: row.delay_minutes,
                delay_category,
                reported_reason: row.reported_reason,
            })
        })
        .collect()
}

impl Dataset {
    /// Build a dataset from CSV tables and validate it.
    ///
    /// Anomaly records are left empty; see [`Dataset::fill_missing_anomalies`].
    ///
    /// # Errors
    ///
    /// Returns an error if any table fails to parse or the data is inconsistent.
    pub fn from_csv(
        shipments: &str,
        warehouses: &str,
        delays: Option<&str>,
    ) -> Result<Self, DatasetLoadError> {
        let dataset = Self {
            shipments: read_shipments(shipments)?,
            warehouses: read_warehouses(warehouses)?,
            delays: delays.map(read_delays).transpose()?.unwrap_or_default(),
            ..Self::default()
        };
        dataset.validate()?;
        log::info!("loaded {} records from CSV tables", dataset.total_rows());
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetError;

    const SHIPMENTS: &str = "\
shipment_id,warehouse_id,supplier,origin,destination,distance_km,expected_time,actual_time,cost,sku_count,traffic_index
S1,WH-01,Acme,Rotterdam,Berlin,600,2024-03-01 08:00:00,2024-03-01 09:30:00,410.5,12,0.4
S2,WH-01,Globex,Rotterdam,Munich,800,2024-03-01T10:00:00Z,2024-03-01T09:45:00Z,520,8,0.3
";
    const WAREHOUSES: &str = "\
warehouse_id,warehouse_name,location,capacity,current_load
WH-01,North Hub,Rotterdam,500,
";
    const DELAYS: &str = "\
shipment_id,delay_minutes,delay_category,reported_reason,timestamp
S1,90,Moderate,Carrier late,2024-03-01 09:30
";

    #[test]
    fn tables_load_into_a_valid_dataset() {
        let data = Dataset::from_csv(SHIPMENTS, WAREHOUSES, Some(DELAYS)).unwrap();
        assert_eq!(data.shipments.len(), 2);
        assert!((data.shipments[0].delay_minutes() - 90.0).abs() < 1e-9);
        assert!((data.shipments[1].delay_minutes() + 15.0).abs() < 1e-9);
        assert_eq!(data.warehouses[0].current_load, None);
        assert_eq!(data.delays[0].delay_category, DelayCategory::Moderate);
        assert!(data.anomalies.is_empty());

        let without_delays = Dataset::from_csv(SHIPMENTS, WAREHOUSES, None).unwrap();
        assert!(without_delays.delays.is_empty());
    }

    #[test]
    fn missing_required_column_is_reported() {
        let trimmed = "warehouse_id,warehouse_name,location\nWH-01,North Hub,Rotterdam\n";
        let err = Dataset::from_csv(SHIPMENTS, trimmed, None).unwrap_err();
        match &err {
            DatasetLoadError::MissingColumns { table, columns } => {
                assert_eq!(*table, "warehouses");
                assert_eq!(columns, &vec!["capacity".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("capacity"), "{err}");
    }

    #[test]
    fn bad_cells_are_errors() {
        let bad_time = SHIPMENTS.replace("2024-03-01 08:00:00", "yesterday");
        assert!(matches!(
            Dataset::from_csv(&bad_time, WAREHOUSES, None),
            Err(DatasetLoadError::Timestamp { table: "shipments", .. })
        ));

        let bad_cost = SHIPMENTS.replace("410.5", "lots");
        assert!(matches!(
            Dataset::from_csv(&bad_cost, WAREHOUSES, None),
            Err(DatasetLoadError::Csv(_))
        ));

        let orphan = DELAYS.replace("S1,", "S9,");
        assert!(matches!(
            Dataset::from_csv(SHIPMENTS, WAREHOUSES, Some(&orphan)),
            Err(DatasetLoadError::Invalid(DatasetError::UnknownShipment { .. }))
        ));
    }

    #[test]
    fn unknown_category_falls_back_to_delay_length() {
        let delays = DELAYS.replace("Moderate", "weather");
        let records = read_delays(&delays).unwrap();
        assert_eq!(records[0].delay_category, DelayCategory::Moderate);
    }
}
