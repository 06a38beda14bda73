//! Centralized scoring and tuning constants for Supply Chain Detective.
//!
//! These values define the deterministic math for scoring and dataset
//! generation. Keeping them together ensures that gameplay can only be
//! adjusted via code changes reviewed in version control.

// Scoring ------------------------------------------------------------------
pub const BASE_SCORE_CORRECT: i32 = 100;
pub const BASE_SCORE_INCORRECT: i32 = 0;
pub const TIME_PENALTY_PER_SECOND: f64 = 0.1;
pub const HINT_PENALTY_POINTS: i32 = 10;

pub const RATING_EXCELLENT_MIN: f64 = 90.0;
pub const RATING_GREAT_MIN: f64 = 75.0;
pub const RATING_GOOD_MIN: f64 = 60.0;
pub const RATING_FAIR_MIN: f64 = 40.0;

// Submission ---------------------------------------------------------------
/// Minimum number of characters (after trimming) a conclusion must have.
pub const MIN_GUESS_CHARS: usize = 10;

// Dataset generation -------------------------------------------------------
pub const DEFAULT_BASE_SEED: u64 = 42;
pub(crate) const SHIPMENTS_PER_MISSION: usize = 120;
pub(crate) const SUPPLIERS: [&str; 5] = [
    "Northwind Components",
    "Acme Industrial",
    "Globex Materials",
    "Initech Supply",
    "Umbrella Logistics",
];
pub(crate) const WAREHOUSES: [(&str, &str, &str, u32); 4] = [
    ("WH-01", "Riverside Hub", "Rotterdam", 900),
    ("WH-02", "Lakeside Depot", "Chicago", 750),
    ("WH-03", "Harbor Point", "Singapore", 1_100),
    ("WH-04", "Canyon Yard", "Phoenix", 600),
];
pub(crate) const DESTINATIONS: [&str; 6] = [
    "Berlin", "Toronto", "Osaka", "Madrid", "Denver", "Sydney",
];
pub(crate) const ROUTE_CORRIDOR: &str = "Denver";
pub(crate) const DATASET_EPOCH_TS: i64 = 1_704_067_200;
pub(crate) const MINUTES_PER_HOUR: f64 = 60.0;
pub(crate) const AVERAGE_SPEED_KMH: f64 = 65.0;
pub(crate) const EQUIPMENT_FAILURE_SHARE: f64 = 0.35;
pub(crate) const DELAY_NOISE_MAX_MINUTES: f64 = 45.0;
pub(crate) const PLANTED_DELAY_MIN_MINUTES: f64 = 240.0;
pub(crate) const PLANTED_DELAY_MAX_MINUTES: f64 = 720.0;
pub(crate) const PLANTED_SHARE: f64 = 0.7;

// Models -------------------------------------------------------------------
pub const DEFAULT_CONTAMINATION: f64 = 0.1;
pub const MOST_ANOMALOUS_LIMIT: usize = 5;
pub const MIN_TRAINING_ROWS: usize = 10;
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
pub(crate) const MAD_NORMAL_SCALE: f64 = 1.4826;
pub(crate) const DEFAULT_WAREHOUSE_LOAD_PCT: f64 = 65.0;

#[cfg(test)]
pub(crate) const FLOAT_EPSILON: f64 = 1e-9;
