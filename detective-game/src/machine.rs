//! The screen state machine: Home → Dashboard → Investigation → Results.
//!
//! Every action is validated and all fallible work (mission lookup, dataset
//! loading) happens before the session is touched, so a rejected action
//! leaves the session exactly as it was.
use std::sync::Arc;

use crate::DatasetProvider;
use crate::clock::{Clock, SystemClock};
use crate::constants::MIN_GUESS_CHARS;
use crate::dataset::Dataset;
use crate::error::GameError;
use crate::missions::{Mission, MissionCatalog};
use crate::numbers::{i64_to_f64, non_negative};
use crate::scoring;
use crate::session::{AttemptRecord, Screen, Session};

/// Player intents the machine understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartPlaying,
    Resume,
    StartInvestigation,
    /// Reveal the hint at this 0-based index.
    RevealHint(usize),
    Submit(String),
    NextMission,
    RetryMission,
    ReturnToDashboard,
    GoHome,
}

impl Action {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartPlaying => "start playing",
            Self::Resume => "resume",
            Self::StartInvestigation => "start investigation",
            Self::RevealHint(_) => "reveal hint",
            Self::Submit(_) => "submit",
            Self::NextMission => "next mission",
            Self::RetryMission => "retry mission",
            Self::ReturnToDashboard => "return to dashboard",
            Self::GoHome => "go home",
        }
    }

    /// Whether the action is listed for `screen` at all.
    #[must_use]
    pub const fn allowed_on(&self, screen: Screen) -> bool {
        matches!(
            (screen, self),
            (_, Self::GoHome)
                | (Screen::Home, Self::StartPlaying | Self::Resume)
                | (Screen::Dashboard, Self::StartInvestigation)
                | (Screen::Investigation, Self::RevealHint(_) | Self::Submit(_))
                | (
                    Screen::Results,
                    Self::NextMission | Self::RetryMission | Self::ReturnToDashboard
                )
        )
    }
}

/// Stateless rules engine shared by any number of sessions.
#[derive(Debug, Clone)]
pub struct ScreenMachine<P, C = SystemClock> {
    catalog: Arc<MissionCatalog>,
    provider: P,
    clock: C,
}

impl<P: DatasetProvider> ScreenMachine<P, SystemClock> {
    pub const fn with_system_clock(catalog: Arc<MissionCatalog>, provider: P) -> Self {
        Self::new(catalog, provider, SystemClock)
    }
}

impl<P: DatasetProvider, C: Clock> ScreenMachine<P, C> {
    pub const fn new(catalog: Arc<MissionCatalog>, provider: P, clock: C) -> Self {
        Self {
            catalog,
            provider,
            clock,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &MissionCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// The mission the session currently points at.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the index is outside the catalog.
    pub fn current_mission(&self, session: &Session) -> Result<&Mission, GameError> {
        self.catalog.get_mission(session.mission_index)
    }

    fn load_dataset(&self, mission_index: usize) -> Result<Arc<Dataset>, GameError> {
        let mission = self.catalog.get_mission(mission_index)?;
        match self.provider.load_mission_dataset(mission_index, mission) {
            Ok(mut data) => {
                data.mission_index = mission_index;
                log::info!(
                    "loaded dataset for mission {} ({} rows)",
                    mission.id,
                    data.total_rows()
                );
                Ok(Arc::new(data))
            }
            Err(err) => {
                log::warn!("dataset provider failed for mission {}: {err}", mission.id);
                Err(GameError::DataUnavailable(format!(
                    "mission {}: {err}",
                    mission.id
                )))
            }
        }
    }

    /// Cached dataset for the session's mission, loading it if absent.
    fn ensure_dataset(&self, session: &Session) -> Result<Arc<Dataset>, GameError> {
        match session.dataset() {
            Some(data) => Ok(Arc::clone(data)),
            None => self.load_dataset(session.mission_index),
        }
    }

    /// Apply one action, returning the screen the session ends on.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` for actions not available on the current screen,
    /// `Validation` for short submissions, `NotFound` for bad hint or mission
    /// indices and `DataUnavailable` when the provider fails. The session is
    /// unchanged whenever an error is returned.
    pub fn apply(&self, session: &mut Session, action: Action) -> Result<Screen, GameError> {
        let from = session.screen;
        if !action.allowed_on(from) {
            return Err(GameError::InvalidTransition {
                action: action.name(),
                screen: from,
            });
        }
        let name = action.name();

        match action {
            Action::StartPlaying => self.start_playing(session)?,
            Action::Resume => self.resume(session)?,
            Action::StartInvestigation => self.start_investigation(session)?,
            Action::RevealHint(index) => self.reveal_hint(session, index)?,
            Action::Submit(guess) => self.submit(session, &guess)?,
            Action::NextMission => self.next_mission(session)?,
            Action::RetryMission => self.retry_mission(session)?,
            Action::ReturnToDashboard => {
                let data = self.ensure_dataset(session)?;
                session.mission_data_cache = Some(data);
                session.screen = Screen::Dashboard;
            }
            Action::GoHome => session.screen = Screen::Home,
        }

        log::debug!("{from} --[{name}]--> {}", session.screen);
        Ok(session.screen)
    }

    fn start_playing(&self, session: &mut Session) -> Result<(), GameError> {
        let data = if session.mission_index == 0 {
            self.ensure_dataset(session)?
        } else {
            self.load_dataset(0)?
        };
        if session.mission_index != 0 {
            session.mission_index = 0;
            session.clear_mission();
        }
        session.mission_data_cache = Some(data);
        session.started = true;
        session.screen = Screen::Dashboard;
        Ok(())
    }

    fn resume(&self, session: &mut Session) -> Result<(), GameError> {
        if !session.started {
            return Err(GameError::InvalidTransition {
                action: Action::Resume.name(),
                screen: session.screen,
            });
        }
        let data = self.ensure_dataset(session)?;
        session.mission_data_cache = Some(data);
        session.screen = Screen::Dashboard;
        Ok(())
    }

    fn start_investigation(&self, session: &mut Session) -> Result<(), GameError> {
        self.current_mission(session)?;
        let data = self.ensure_dataset(session)?;
        session.mission_data_cache = Some(data);
        session.timer_start = Some(self.clock.now());
        session.reset_attempt();
        session.screen = Screen::Investigation;
        Ok(())
    }

    fn reveal_hint(&self, session: &mut Session, index: usize) -> Result<(), GameError> {
        let mission = self.current_mission(session)?;
        if index >= mission.hints.len() {
            return Err(GameError::hint(index));
        }
        if session.revealed_hints.insert(index) {
            session.hints_used = u32::try_from(session.revealed_hints.len()).unwrap_or(u32::MAX);
            log::debug!(
                "revealed hint {} of {} for mission {}",
                index + 1,
                mission.hints.len(),
                mission.id
            );
        }
        Ok(())
    }

    fn submit(&self, session: &mut Session, guess: &str) -> Result<(), GameError> {
        let trimmed = guess.trim();
        if trimmed.chars().count() < MIN_GUESS_CHARS {
            return Err(GameError::Validation(format!(
                "describe the root cause in at least {MIN_GUESS_CHARS} characters"
            )));
        }
        let mission = self.current_mission(session)?;
        let started_at = session.timer_start.ok_or_else(|| GameError::NotFound {
            what: "active investigation".to_string(),
        })?;
        if session.dataset().is_none() {
            return Err(GameError::DataUnavailable(format!(
                "mission {} has no loaded data",
                mission.id
            )));
        }

        let elapsed_ms = (self.clock.now() - started_at).num_milliseconds();
        let time_taken = non_negative(i64_to_f64(elapsed_ms) / 1000.0);
        let (final_score, breakdown) = scoring::score(
            trimmed,
            &mission.expected_root_cause,
            time_taken,
            session.hints_used,
        );
        log::info!(
            "mission {} scored {final_score:.1} ({}) after {time_taken:.1}s with {} hints",
            mission.id,
            breakdown.performance_rating,
            session.hints_used
        );

        session.history.push(AttemptRecord {
            mission_id: mission.id,
            mission_index: session.mission_index,
            correct: breakdown.correct,
            final_score,
            rating: breakdown.performance_rating,
            hints_used: breakdown.hints_used,
            time_taken,
        });
        session.user_guess = trimmed.to_string();
        session.final_score = final_score;
        session.score_breakdown = Some(breakdown);
        session.screen = Screen::Results;
        Ok(())
    }

    fn next_mission(&self, session: &mut Session) -> Result<(), GameError> {
        let count = self.catalog.get_mission_count();
        let next = (session.mission_index + 1) % count.max(1);
        let data = self.load_dataset(next)?;
        session.mission_index = next;
        session.clear_mission();
        session.mission_data_cache = Some(data);
        session.screen = Screen::Dashboard;
        Ok(())
    }

    fn retry_mission(&self, session: &mut Session) -> Result<(), GameError> {
        let data = self.ensure_dataset(session)?;
        session.mission_data_cache = Some(data);
        session.timer_start = Some(self.clock.now());
        session.reset_attempt();
        session.screen = Screen::Investigation;
        Ok(())
    }
}

/// A machine bundled with one player's session.
#[derive(Debug, Clone)]
pub struct GameSession<P, C = SystemClock> {
    machine: ScreenMachine<P, C>,
    session: Session,
}

impl<P: DatasetProvider, C: Clock> GameSession<P, C> {
    #[must_use]
    pub fn new(machine: ScreenMachine<P, C>) -> Self {
        Self {
            machine,
            session: Session::new(),
        }
    }

    /// Apply an action to the owned session.
    ///
    /// # Errors
    ///
    /// See [`ScreenMachine::apply`].
    pub fn dispatch(&mut self, action: Action) -> Result<Screen, GameError> {
        self.machine.apply(&mut self.session, action)
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn machine(&self) -> &ScreenMachine<P, C> {
        &self.machine
    }

    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.session.screen
    }

    /// Mission shown on the current screen, if any.
    #[must_use]
    pub fn current_mission(&self) -> Option<&Mission> {
        self.machine.current_mission(&self.session).ok()
    }

    /// Consume the wrapper, returning the session.
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }
}
