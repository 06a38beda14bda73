//! Supply Chain Detective game engine
//!
//! Platform-agnostic core for the Supply Chain Detective analytics puzzle:
//! mission catalog, scoring, session state and the screen state machine,
//! plus the dataset types and simple analytics the screens display.
//! This crate has no UI or platform-specific dependencies.

pub mod anomaly;
pub mod clock;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod format;
pub mod kpi;
pub mod machine;
pub mod missions;
pub mod numbers;
pub mod predictor;
pub mod provider;
pub mod scoring;
pub mod seed;
pub mod session;
pub mod tables;

// Re-export commonly used types
pub use anomaly::{AnomalyInsights, FeatureInsight, anomaly_insights, detect_anomalies};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dataset::{
    AnomalyRecord, Dataset, DatasetError, DatasetLoadError, DelayCategory, DelayRecord, Shipment,
    Warehouse,
};
pub use error::GameError;
pub use format::{format_currency, format_percentage, format_time, percentage_change, safe_divide};
pub use kpi::{Kpis, compute_kpis};
pub use machine::{Action, GameSession, ScreenMachine};
pub use missions::{CatalogError, Difficulty, Mission, MissionCatalog};
pub use predictor::{DelayModel, ModelError, ModelMetrics, TrainedModel, train_delay_model};
pub use provider::{Signal, SyntheticProvider};
pub use scoring::{PerformanceRating, ScoreBreakdown, score};
pub use seed::mission_seed;
pub use session::{AttemptRecord, Screen, Session};

/// Source of per-mission datasets.
/// Platform-specific implementations may read files; the core ships a
/// synthetic generator.
pub trait DatasetProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the dataset for the mission at `mission_index`.
    ///
    /// Implementations must be deterministic per index.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be produced.
    fn load_mission_dataset(
        &self,
        mission_index: usize,
        mission: &Mission,
    ) -> Result<Dataset, Self::Error>;
}

impl<T: DatasetProvider + ?Sized> DatasetProvider for &T {
    type Error = T::Error;

    fn load_mission_dataset(
        &self,
        mission_index: usize,
        mission: &Mission,
    ) -> Result<Dataset, Self::Error> {
        (**self).load_mission_dataset(mission_index, mission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Arc;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("fixture offline")]
    struct Offline;

    /// Serves a tiny dataset and can be switched off.
    #[derive(Default)]
    struct FixtureProvider {
        offline: Cell<bool>,
        calls: Cell<usize>,
    }

    impl DatasetProvider for FixtureProvider {
        type Error = Offline;

        fn load_mission_dataset(
            &self,
            mission_index: usize,
            _mission: &Mission,
        ) -> Result<Dataset, Self::Error> {
            self.calls.set(self.calls.get() + 1);
            if self.offline.get() {
                return Err(Offline);
            }
            Ok(SyntheticProvider::default()
                .with_shipments(12)
                .generate(mission_index, None))
        }
    }

    fn catalog() -> Arc<MissionCatalog> {
        Arc::new(MissionCatalog::load_from_static().unwrap())
    }

    #[test]
    fn dataset_is_loaded_once_per_mission() {
        let provider = FixtureProvider::default();
        let clock = ManualClock::at_epoch();
        let machine = ScreenMachine::new(catalog(), &provider, &clock);
        let mut session = Session::new();

        machine.apply(&mut session, Action::StartPlaying).unwrap();
        machine.apply(&mut session, Action::StartInvestigation).unwrap();
        machine.apply(&mut session, Action::GoHome).unwrap();
        machine.apply(&mut session, Action::Resume).unwrap();
        assert_eq!(provider.calls.get(), 1);
    }

    #[test]
    fn provider_failure_blocks_progression_without_side_effects() {
        let provider = FixtureProvider::default();
        provider.offline.set(true);
        let clock = ManualClock::at_epoch();
        let machine = ScreenMachine::new(catalog(), &provider, &clock);
        let mut session = Session::new();

        let err = machine
            .apply(&mut session, Action::StartPlaying)
            .unwrap_err();
        assert!(matches!(err, GameError::DataUnavailable(_)));
        assert_eq!(session.screen(), Screen::Home);
        assert!(!session.has_started());

        provider.offline.set(false);
        assert_eq!(
            machine.apply(&mut session, Action::StartPlaying).unwrap(),
            Screen::Dashboard
        );
    }

    #[test]
    fn synthetic_provider_is_a_dataset_provider() {
        let catalog = catalog();
        let mission = catalog.get_mission(0).unwrap();
        let data = SyntheticProvider::default()
            .load_mission_dataset(0, mission)
            .unwrap();
        assert_eq!(data.mission_index, 0);
        assert_eq!(data.seed, mission_seed(constants::DEFAULT_BASE_SEED, 0));
    }
}
