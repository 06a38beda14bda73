//! Per-player session state. Only the screen machine mutates it.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::dataset::Dataset;
use crate::scoring::{PerformanceRating, ScoreBreakdown};

/// Which screen the player is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    #[default]
    Home,
    Dashboard,
    Investigation,
    Results,
}

impl Screen {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Dashboard => "dashboard",
            Self::Investigation => "investigation",
            Self::Results => "results",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scored submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub mission_id: u32,
    pub mission_index: usize,
    pub correct: bool,
    pub final_score: f64,
    pub rating: PerformanceRating,
    pub hints_used: u32,
    pub time_taken: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub(crate) screen: Screen,
    pub(crate) mission_index: usize,
    pub(crate) timer_start: Option<DateTime<Utc>>,
    pub(crate) revealed_hints: BTreeSet<usize>,
    pub(crate) hints_used: u32,
    pub(crate) user_guess: String,
    pub(crate) final_score: f64,
    pub(crate) score_breakdown: Option<ScoreBreakdown>,
    pub(crate) mission_data_cache: Option<Arc<Dataset>>,
    pub(crate) started: bool,
    pub(crate) history: Vec<AttemptRecord>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub const fn mission_index(&self) -> usize {
        self.mission_index
    }

    #[must_use]
    pub const fn timer_start(&self) -> Option<DateTime<Utc>> {
        self.timer_start
    }

    #[must_use]
    pub const fn hints_used(&self) -> u32 {
        self.hints_used
    }

    /// Revealed hint indices in ascending order.
    pub fn revealed_hints(&self) -> impl Iterator<Item = usize> + '_ {
        self.revealed_hints.iter().copied()
    }

    #[must_use]
    pub fn is_hint_revealed(&self, index: usize) -> bool {
        self.revealed_hints.contains(&index)
    }

    #[must_use]
    pub fn user_guess(&self) -> &str {
        &self.user_guess
    }

    #[must_use]
    pub const fn final_score(&self) -> f64 {
        self.final_score
    }

    #[must_use]
    pub const fn score_breakdown(&self) -> Option<&ScoreBreakdown> {
        self.score_breakdown.as_ref()
    }

    /// Cached dataset for the current mission, if loaded.
    #[must_use]
    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        self.mission_data_cache
            .as_ref()
            .filter(|data| data.mission_index == self.mission_index)
    }

    /// Whether a mission has been entered, which enables resuming from Home.
    #[must_use]
    pub const fn has_started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn history(&self) -> &[AttemptRecord] {
        &self.history
    }

    /// Sum over missions of the best score achieved on each.
    #[must_use]
    pub fn total_score(&self) -> f64 {
        let mut best: BTreeMap<u32, f64> = BTreeMap::new();
        for attempt in &self.history {
            let entry = best.entry(attempt.mission_id).or_insert(0.0);
            *entry = entry.max(attempt.final_score);
        }
        best.values().sum()
    }

    /// Number of distinct missions solved correctly at least once.
    #[must_use]
    pub fn missions_solved(&self) -> usize {
        self.history
            .iter()
            .filter(|a| a.correct)
            .map(|a| a.mission_id)
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub(crate) fn reset_attempt(&mut self) {
        self.revealed_hints.clear();
        self.hints_used = 0;
    }

    pub(crate) fn clear_mission(&mut self) {
        self.timer_start = None;
        self.reset_attempt();
        self.user_guess.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(mission_id: u32, correct: bool, final_score: f64) -> AttemptRecord {
        AttemptRecord {
            mission_id,
            mission_index: 0,
            correct,
            final_score,
            rating: PerformanceRating::from_score(final_score),
            hints_used: 0,
            time_taken: 0.0,
        }
    }

    #[test]
    fn defaults_match_a_fresh_player() {
        let session = Session::new();
        assert_eq!(session.screen(), Screen::Home);
        assert_eq!(session.mission_index(), 0);
        assert_eq!(session.hints_used(), 0);
        assert!(session.timer_start().is_none());
        assert!(session.dataset().is_none());
        assert!(!session.has_started());
        assert!(session.final_score().abs() < f64::EPSILON);
    }

    #[test]
    fn total_score_keeps_best_per_mission() {
        let mut session = Session::new();
        session.history = vec![
            attempt(1, false, 0.0),
            attempt(1, true, 80.0),
            attempt(1, true, 60.0),
            attempt(2, true, 95.0),
        ];
        assert!((session.total_score() - 175.0).abs() < f64::EPSILON);
        assert_eq!(session.missions_solved(), 2);
    }

    #[test]
    fn stale_cache_is_hidden() {
        let mut session = Session::new();
        session.mission_data_cache = Some(Arc::new(Dataset {
            mission_index: 3,
            ..Dataset::default()
        }));
        assert!(session.dataset().is_none());
        session.mission_index = 3;
        assert!(session.dataset().is_some());
    }

    #[test]
    fn screen_names_are_lowercase() {
        assert_eq!(Screen::Investigation.to_string(), "investigation");
    }
}
