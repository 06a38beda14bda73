//! Mission catalog: the immutable table of investigative scenarios.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::constants::MIN_GUESS_CHARS;
use crate::error::GameError;
use crate::scoring::check_answer;

static ROOT_CAUSE_TOKEN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").ok());

fn is_root_cause_token(value: &str) -> bool {
    ROOT_CAUSE_TOKEN
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Difficulty tier shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Expert => "Expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Hints = SmallVec<[String; 4]>;

/// A fixed investigative scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub briefing: String,
    pub description: String,
    pub expected_root_cause: String,
    #[serde(default)]
    pub hints: Hints,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub explanation: String,
}

impl Mission {
    /// Case-insensitive, whitespace-trimmed comparison against the root cause.
    #[must_use]
    pub fn is_correct_answer(&self, answer: &str) -> bool {
        check_answer(answer, &self.expected_root_cause)
    }
}

/// Errors raised while loading or validating a mission catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mission catalog is empty")]
    Empty,
    #[error("mission ids must start at 1 (got {0})")]
    InvalidId(u32),
    #[error("duplicate mission id {0}")]
    DuplicateId(u32),
    #[error("mission {id}: root cause '{cause}' must be a lowercase token")]
    InvalidRootCause { id: u32, cause: String },
    #[error("mission {id}: root cause '{cause}' is shorter than {min} characters")]
    RootCauseTooShort { id: u32, cause: String, min: usize },
    #[error("mission {0} has no hints")]
    NoHints(u32),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    missions: Vec<Mission>,
}

/// Immutable, ordered table of missions. Index 0 is the first mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissionCatalog {
    missions: Vec<Mission>,
}

impl MissionCatalog {
    /// Build a catalog from pre-parsed missions, validating every entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog is empty or any mission is malformed.
    pub fn new(missions: Vec<Mission>) -> Result<Self, CatalogError> {
        validate_missions(&missions)?;
        Ok(Self { missions })
    }

    /// Load a catalog from JSON (`{"missions": [...]}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.missions)
    }

    /// Load the reference missions bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset is malformed.
    pub fn load_from_static() -> Result<Self, CatalogError> {
        Self::from_json(include_str!("../assets/missions.json"))
    }

    #[must_use]
    pub const fn get_mission_count(&self) -> usize {
        self.missions.len()
    }

    /// Look up a mission by 0-based position.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when `index` is out of range.
    pub fn get_mission(&self, index: usize) -> Result<&Mission, GameError> {
        self.missions
            .get(index)
            .ok_or_else(|| GameError::mission_index(index))
    }

    /// Look up a mission by its 1-based id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub fn load_mission(&self, id: u32) -> Result<&Mission, GameError> {
        self.missions
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| GameError::mission_id(id))
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub fn get_correct_answer(&self, id: u32) -> Result<&str, GameError> {
        self.load_mission(id)
            .map(|m| m.expected_root_cause.as_str())
    }

    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub fn get_mission_hints(&self, id: u32) -> Result<&[String], GameError> {
        self.load_mission(id).map(|m| m.hints.as_slice())
    }

    /// Whether `answer` names the root cause of mission `id`. Unknown ids never match.
    #[must_use]
    pub fn validate_mission_answer(&self, id: u32, answer: &str) -> bool {
        self.load_mission(id)
            .is_ok_and(|m| m.is_correct_answer(answer))
    }

    /// Position of a mission id within the catalog.
    #[must_use]
    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.missions.iter().position(|m| m.id == id)
    }

    pub fn all_missions(&self) -> std::slice::Iter<'_, Mission> {
        self.missions.iter()
    }
}

impl<'a> IntoIterator for &'a MissionCatalog {
    type Item = &'a Mission;
    type IntoIter = std::slice::Iter<'a, Mission>;

    fn into_iter(self) -> Self::IntoIter {
        self.all_missions()
    }
}

fn validate_missions(missions: &[Mission]) -> Result<(), CatalogError> {
    if missions.is_empty() {
        return Err(CatalogError::Empty);
    }
    let mut seen = HashSet::with_capacity(missions.len());
    for mission in missions {
        if mission.id == 0 {
            return Err(CatalogError::InvalidId(mission.id));
        }
        if !seen.insert(mission.id) {
            return Err(CatalogError::DuplicateId(mission.id));
        }
        if !is_root_cause_token(&mission.expected_root_cause) {
            return Err(CatalogError::InvalidRootCause {
                id: mission.id,
                cause: mission.expected_root_cause.clone(),
            });
        }
        // A root cause shorter than the submission minimum could never be entered.
        if mission.expected_root_cause.chars().count() < MIN_GUESS_CHARS {
            return Err(CatalogError::RootCauseTooShort {
                id: mission.id,
                cause: mission.expected_root_cause.clone(),
                min: MIN_GUESS_CHARS,
            });
        }
        if mission.hints.is_empty() {
            return Err(CatalogError::NoHints(mission.id));
        }
    }
    Ok(())
}
