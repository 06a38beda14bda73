//! Dataset providers available to the terminal front end.
use std::fs;
use std::path::{Path, PathBuf};

use detective_game::{Dataset, DatasetLoadError, DatasetProvider, Mission, SyntheticProvider};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        source: DatasetLoadError,
    },
}

/// Reads mission data from a directory.
///
/// A `mission_<id>/` folder holding `shipments.csv`, `warehouses.csv` and an
/// optional `delays.csv` takes precedence over a `mission_<id>.json` file.
/// Anomalies are computed on load when the source has none.
#[derive(Debug, Clone)]
pub struct FileDatasetProvider {
    dir: PathBuf,
}

impl FileDatasetProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, mission: &Mission) -> PathBuf {
        self.dir.join(format!("mission_{}.json", mission.id))
    }

    pub fn table_dir_for(&self, mission: &Mission) -> PathBuf {
        self.dir.join(format!("mission_{}", mission.id))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(path: &Path) -> Result<String, DatasetFileError> {
        fs::read_to_string(path).map_err(|source| DatasetFileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn load_tables(dir: &Path) -> Result<Dataset, DatasetFileError> {
        let shipments = Self::read(&dir.join("shipments.csv"))?;
        let warehouses = Self::read(&dir.join("warehouses.csv"))?;
        let delays_path = dir.join("delays.csv");
        let delays = if delays_path.is_file() {
            Some(Self::read(&delays_path)?)
        } else {
            None
        };
        Dataset::from_csv(&shipments, &warehouses, delays.as_deref()).map_err(|source| {
            DatasetFileError::Parse {
                path: dir.to_path_buf(),
                source,
            }
        })
    }

    fn load_json(path: &Path) -> Result<Dataset, DatasetFileError> {
        let text = Self::read(path)?;
        Dataset::from_json(&text).map_err(|source| DatasetFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl DatasetProvider for FileDatasetProvider {
    type Error = DatasetFileError;

    fn load_mission_dataset(
        &self,
        mission_index: usize,
        mission: &Mission,
    ) -> Result<Dataset, Self::Error> {
        let tables = self.table_dir_for(mission);
        let (mut dataset, source) = if tables.is_dir() {
            (Self::load_tables(&tables)?, tables)
        } else {
            let path = self.path_for(mission);
            (Self::load_json(&path)?, path)
        };
        dataset.mission_index = mission_index;
        if dataset.fill_missing_anomalies() {
            log::debug!("computed anomalies for {}", source.display());
        }
        log::debug!(
            "read {} shipments from {}",
            dataset.shipments.len(),
            source.display()
        );
        Ok(dataset)
    }
}

/// Provider chosen on the command line.
#[derive(Debug, Clone)]
pub enum CliProvider {
    Synthetic(SyntheticProvider),
    Files(FileDatasetProvider),
}

impl CliProvider {
    pub fn from_args(data_dir: Option<&Path>, seed: u64) -> Self {
        data_dir.map_or_else(
            || Self::Synthetic(SyntheticProvider::new(seed)),
            |dir| Self::Files(FileDatasetProvider::new(dir)),
        )
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Synthetic(p) => format!("synthetic data (seed {})", p.base_seed()),
            Self::Files(p) => format!("files in {}", p.dir().display()),
        }
    }
}

impl DatasetProvider for CliProvider {
    type Error = DatasetFileError;

    fn load_mission_dataset(
        &self,
        mission_index: usize,
        mission: &Mission,
    ) -> Result<Dataset, Self::Error> {
        match self {
            Self::Synthetic(p) => match p.load_mission_dataset(mission_index, mission) {
                Ok(dataset) => Ok(dataset),
                Err(never) => match never {},
            },
            Self::Files(p) => p.load_mission_dataset(mission_index, mission),
        }
    }
}
