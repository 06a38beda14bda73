//! Scripted play-throughs with fixed player profiles.
use std::sync::Arc;

use detective_game::{
    Action, AttemptRecord, DatasetProvider, GameSession, ManualClock, MissionCatalog,
    ScreenMachine,
};
use serde::Serialize;

/// Submitted by the guesser profile; never a valid root cause in the bundled catalog.
const BLIND_GUESS: &str = "inconclusive_data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Names every root cause without hints.
    Perfect,
    /// Reveals every hint before answering correctly.
    Hinted,
    /// Always submits the same wrong answer.
    Guesser,
}

impl Profile {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "perfect" => Some(Self::Perfect),
            "hinted" => Some(Self::Hinted),
            "guesser" => Some(Self::Guesser),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Perfect => "perfect",
            Self::Hinted => "hinted",
            Self::Guesser => "guesser",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoplayResult {
    pub profile: Profile,
    pub mission_count: usize,
    pub attempts: Vec<AttemptRecord>,
    pub total_score: f64,
    pub missions_solved: usize,
    /// Whether the run came back around to the first mission.
    pub wrapped: bool,
    pub errors: Vec<String>,
}

impl AutoplayResult {
    pub fn passed(&self) -> bool {
        self.errors.is_empty() && self.wrapped
    }
}

/// Play every mission once with `profile`, spending `think_secs` on each.
pub fn run_profile<P: DatasetProvider>(
    catalog: &Arc<MissionCatalog>,
    provider: &P,
    profile: Profile,
    think_secs: i64,
) -> AutoplayResult {
    let clock = ManualClock::at_epoch();
    let mut game = GameSession::new(ScreenMachine::new(Arc::clone(catalog), provider, &clock));
    let mission_count = catalog.get_mission_count();
    let mut errors = Vec::new();

    let mut step = |game: &mut GameSession<&P, &ManualClock>, action: Action| {
        game.dispatch(action).map_err(|err| {
            log::warn!("{} autoplay stopped: {err}", profile.as_str());
            errors.push(err.to_string());
        })
    };

    'missions: {
        if step(&mut game, Action::StartPlaying).is_err() {
            break 'missions;
        }
        for index in 0..mission_count {
            let Ok(mission) = catalog.get_mission(index) else {
                break;
            };
            if step(&mut game, Action::StartInvestigation).is_err() {
                break;
            }
            if profile == Profile::Hinted {
                for hint in 0..mission.hints.len() {
                    if step(&mut game, Action::RevealHint(hint)).is_err() {
                        break 'missions;
                    }
                }
            }
            clock.advance_secs(think_secs.max(0));
            let guess = match profile {
                Profile::Perfect | Profile::Hinted => mission.expected_root_cause.clone(),
                Profile::Guesser => BLIND_GUESS.to_string(),
            };
            if step(&mut game, Action::Submit(guess)).is_err() {
                break;
            }
            if step(&mut game, Action::NextMission).is_err() {
                break;
            }
        }
    }

    let session = game.session();
    AutoplayResult {
        profile,
        mission_count,
        attempts: session.history().to_vec(),
        total_score: session.total_score(),
        missions_solved: session.missions_solved(),
        wrapped: session.history().len() == mission_count && session.mission_index() == 0,
        errors,
    }
}
