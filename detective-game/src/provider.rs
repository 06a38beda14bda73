//! Seeded synthetic datasets with a planted root-cause signal.
use chrono::{DateTime, TimeDelta, Utc};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::convert::Infallible;

use crate::DatasetProvider;
use crate::anomaly::detect_anomalies;
use crate::constants::{
    AVERAGE_SPEED_KMH, DATASET_EPOCH_TS, DEFAULT_BASE_SEED, DEFAULT_CONTAMINATION,
    DELAY_NOISE_MAX_MINUTES, DESTINATIONS, EQUIPMENT_FAILURE_SHARE, MINUTES_PER_HOUR,
    PLANTED_DELAY_MAX_MINUTES, PLANTED_DELAY_MIN_MINUTES, PLANTED_SHARE, ROUTE_CORRIDOR,
    SHIPMENTS_PER_MISSION, SUPPLIERS, WAREHOUSES,
};
use crate::dataset::{Dataset, DelayCategory, DelayRecord, Shipment, Warehouse};
use crate::missions::Mission;
use crate::numbers::{round_f64_to_i64, round_to, usize_to_f64};
use crate::seed::mission_seed;

const SIGNAL_SUPPLIER: &str = "Globex Materials";
const OVERLOADED_WAREHOUSE: &str = "WH-02";
const FAULTY_WAREHOUSE: &str = "WH-03";
const GENERIC_REASONS: [&str; 5] = [
    "Traffic",
    "Paperwork",
    "Weather",
    "Loading backlog",
    "Carrier late",
];
const EQUIPMENT_REASONS: [&str; 2] = ["Conveyor fault", "Scanner outage"];

/// Root causes the generator knows how to plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    SupplierDelay,
    WarehouseOverload,
    RouteCongestion,
    EquipmentFailure,
    DemandSurge,
}

impl Signal {
    /// Map a root-cause token to its signal; unknown tokens plant nothing.
    #[must_use]
    pub fn from_root_cause(cause: &str) -> Option<Self> {
        match cause {
            "supplier_delay" => Some(Self::SupplierDelay),
            "warehouse_overload" => Some(Self::WarehouseOverload),
            "route_congestion" => Some(Self::RouteCongestion),
            "equipment_failure" => Some(Self::EquipmentFailure),
            "demand_surge" => Some(Self::DemandSurge),
            _ => None,
        }
    }
}

/// Generates a deterministic dataset per mission index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticProvider {
    base_seed: u64,
    shipments: usize,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_SEED)
    }
}

struct Leg {
    shipment: Shipment,
    reason: Option<&'static str>,
}

impl SyntheticProvider {
    #[must_use]
    pub const fn new(base_seed: u64) -> Self {
        Self {
            base_seed,
            shipments: SHIPMENTS_PER_MISSION,
        }
    }

    #[must_use]
    pub const fn with_shipments(mut self, shipments: usize) -> Self {
        self.shipments = shipments;
        self
    }

    #[must_use]
    pub const fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Build the dataset for `mission_index`, planting `signal` if given.
    #[must_use]
    pub fn generate(&self, mission_index: usize, signal: Option<Signal>) -> Dataset {
        let seed = mission_seed(self.base_seed, mission_index);
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let epoch = DateTime::<Utc>::from_timestamp(DATASET_EPOCH_TS, 0).unwrap_or_default();

        let warehouses = build_warehouses(&mut rng, signal);
        let legs: Vec<Leg> = (0..self.shipments)
            .map(|i| build_leg(&mut rng, epoch, mission_index, i, signal))
            .collect();

        let delays = legs
            .iter()
            .filter(|leg| leg.shipment.is_late())
            .map(|leg| {
                let minutes = leg.shipment.delay_minutes();
                DelayRecord {
                    shipment_id: leg.shipment.shipment_id.clone(),
                    delay_minutes: minutes,
                    delay_category: DelayCategory::from_minutes(minutes),
                    reported_reason: leg
                        .reason
                        .or_else(|| GENERIC_REASONS.choose(&mut rng).copied())
                        .unwrap_or("Unknown")
                        .to_string(),
                    timestamp: leg.shipment.actual_time,
                }
            })
            .collect();

        let shipments: Vec<Shipment> = legs.into_iter().map(|leg| leg.shipment).collect();
        let anomalies = detect_anomalies(&shipments, DEFAULT_CONTAMINATION);
        log::info!(
            "generated synthetic dataset for mission index {mission_index} ({} shipments, seed {seed:#018x})",
            shipments.len()
        );

        Dataset {
            mission_index,
            seed,
            shipments,
            warehouses,
            delays,
            anomalies,
        }
    }
}

fn load_for(capacity: u32, ratio: f64) -> u32 {
    u32::try_from(round_f64_to_i64(f64::from(capacity) * ratio)).unwrap_or(0)
}

fn build_warehouses(rng: &mut ChaCha20Rng, signal: Option<Signal>) -> Vec<Warehouse> {
    WAREHOUSES
        .iter()
        .map(|(id, name, location, capacity)| {
            let ratio = match signal {
                Some(Signal::WarehouseOverload) if *id == OVERLOADED_WAREHOUSE => {
                    rng.gen_range(1.3..1.5)
                }
                Some(Signal::DemandSurge) => rng.gen_range(0.9..0.98),
                _ => rng.gen_range(0.45..0.8),
            };
            Warehouse {
                warehouse_id: (*id).to_string(),
                warehouse_name: (*name).to_string(),
                location: (*location).to_string(),
                capacity: *capacity,
                current_load: Some(load_for(*capacity, ratio)),
            }
        })
        .collect()
}

fn planted_delay(rng: &mut ChaCha20Rng) -> f64 {
    rng.gen_range(PLANTED_DELAY_MIN_MINUTES..PLANTED_DELAY_MAX_MINUTES)
}

fn build_leg(
    rng: &mut ChaCha20Rng,
    epoch: DateTime<Utc>,
    mission_index: usize,
    i: usize,
    signal: Option<Signal>,
) -> Leg {
    let supplier = SUPPLIERS[rng.gen_range(0..SUPPLIERS.len())];
    let (warehouse_id, _, origin, _) = WAREHOUSES[rng.gen_range(0..WAREHOUSES.len())];
    let destination = DESTINATIONS[rng.gen_range(0..DESTINATIONS.len())];
    let distance_km = round_to(rng.gen_range(200.0..4_500.0), 1);
    let mut sku_count: u32 = rng.gen_range(5..=60);
    let mut traffic_index = round_to(rng.gen_range(0.1..0.7), 2);
    let cost = round_to(
        distance_km * rng.gen_range(0.8..1.4) + f64::from(sku_count) * 2.5,
        2,
    );
    let mut delay = rng.gen_range(-30.0..DELAY_NOISE_MAX_MINUTES);
    let mut reason = None;

    match signal {
        Some(Signal::SupplierDelay) if supplier == SIGNAL_SUPPLIER => {
            if rng.gen_bool(PLANTED_SHARE) {
                delay += planted_delay(rng);
                reason = Some("Late handover from supplier");
            }
        }
        Some(Signal::WarehouseOverload) if warehouse_id == OVERLOADED_WAREHOUSE => {
            if rng.gen_bool(PLANTED_SHARE) {
                delay += planted_delay(rng);
                reason = Some("Dock congestion");
            }
        }
        Some(Signal::RouteCongestion) if destination == ROUTE_CORRIDOR => {
            traffic_index = round_to(rng.gen_range(0.85..0.98), 2);
            if rng.gen_bool(PLANTED_SHARE) {
                delay += planted_delay(rng);
                reason = Some("Traffic");
            }
        }
        Some(Signal::EquipmentFailure) if warehouse_id == FAULTY_WAREHOUSE => {
            if rng.gen_bool(EQUIPMENT_FAILURE_SHARE) {
                delay += planted_delay(rng);
                reason = EQUIPMENT_REASONS.choose(rng).copied();
            }
        }
        Some(Signal::DemandSurge) => {
            sku_count *= 3;
            delay += f64::from(sku_count) * rng.gen_range(2.0..4.0);
            reason = Some("Loading backlog");
        }
        _ => {}
    }

    let transit_minutes = distance_km / AVERAGE_SPEED_KMH * MINUTES_PER_HOUR;
    let dispatch_offset = usize_to_f64(i) * 37.0;
    let expected_time =
        epoch + TimeDelta::minutes(round_f64_to_i64(dispatch_offset + transit_minutes));
    let actual_time = expected_time + TimeDelta::minutes(round_f64_to_i64(delay));

    Leg {
        shipment: Shipment {
            shipment_id: format!("SHP-{:02}-{i:04}", mission_index + 1),
            warehouse_id: warehouse_id.to_string(),
            supplier: supplier.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            distance_km,
            expected_time,
            actual_time,
            cost,
            sku_count,
            traffic_index,
        },
        reason,
    }
}

impl DatasetProvider for SyntheticProvider {
    type Error = Infallible;

    fn load_mission_dataset(
        &self,
        mission_index: usize,
        mission: &Mission,
    ) -> Result<Dataset, Self::Error> {
        let signal = Signal::from_root_cause(&mission.expected_root_cause);
        if signal.is_none() {
            log::warn!(
                "no planted signal for root cause '{}'; generating baseline data",
                mission.expected_root_cause
            );
        }
        Ok(self.generate(mission_index, signal))
    }
}
