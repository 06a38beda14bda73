use std::sync::Arc;

use detective_game::{
    Action, Clock, Dataset, DatasetProvider, GameError, GameSession, ManualClock, Mission,
    MissionCatalog, PerformanceRating, Screen, ScreenMachine, Session, SyntheticProvider,
};
use std::cell::RefCell;
use std::collections::BTreeSet;

fn catalog() -> Arc<MissionCatalog> {
    Arc::new(MissionCatalog::load_from_static().unwrap())
}

fn provider() -> SyntheticProvider {
    SyntheticProvider::default().with_shipments(40)
}

fn root_cause(session: &Session, catalog: &MissionCatalog) -> String {
    catalog
        .get_mission(session.mission_index())
        .unwrap()
        .expected_root_cause
        .clone()
}

#[test]
fn full_campaign_wraps_back_to_first_mission() {
    let catalog = catalog();
    let clock = ManualClock::at_epoch();
    let machine = ScreenMachine::new(Arc::clone(&catalog), provider(), &clock);
    let mut session = Session::new();

    assert_eq!(
        machine.apply(&mut session, Action::StartPlaying).unwrap(),
        Screen::Dashboard
    );
    for expected_index in 0..catalog.get_mission_count() {
        assert_eq!(session.mission_index(), expected_index);
        assert!(session.dataset().is_some());
        machine
            .apply(&mut session, Action::StartInvestigation)
            .unwrap();
        clock.advance_secs(30);
        let answer = root_cause(&session, &catalog);
        assert_eq!(
            machine.apply(&mut session, Action::Submit(answer)).unwrap(),
            Screen::Results
        );
        assert!((session.final_score() - 97.0).abs() < 1e-9);
        assert_eq!(
            session.score_breakdown().unwrap().performance_rating,
            PerformanceRating::Excellent
        );
        machine.apply(&mut session, Action::NextMission).unwrap();
        assert_eq!(session.screen(), Screen::Dashboard);
        assert!(session.timer_start().is_none());
        assert!(session.user_guess().is_empty());
    }

    assert_eq!(session.mission_index(), 0);
    assert_eq!(session.history().len(), 5);
    assert_eq!(session.missions_solved(), 5);
    assert!((session.total_score() - 485.0).abs() < 1e-9);
}

#[test]
fn short_guesses_never_reach_results_or_history() {
    let clock = ManualClock::at_epoch();
    let machine = ScreenMachine::new(catalog(), provider(), &clock);
    let mut session = Session::new();
    machine.apply(&mut session, Action::StartPlaying).unwrap();
    machine
        .apply(&mut session, Action::StartInvestigation)
        .unwrap();

    for guess in ["", "         ", "supplier", "  too short  ", "ünïcødé"] {
        let err = machine
            .apply(&mut session, Action::Submit(guess.to_string()))
            .unwrap_err();
        assert!(matches!(err, GameError::Validation(_)), "{guess:?}");
        assert_eq!(session.screen(), Screen::Investigation);
        assert!(session.score_breakdown().is_none());
        assert!(session.history().is_empty());
    }
}

#[test]
fn hints_count_once_and_reset_on_restart() {
    let clock = ManualClock::at_epoch();
    let machine = ScreenMachine::new(catalog(), provider(), &clock);
    let mut session = Session::new();
    machine.apply(&mut session, Action::StartPlaying).unwrap();
    machine
        .apply(&mut session, Action::StartInvestigation)
        .unwrap();

    for _ in 0..3 {
        machine.apply(&mut session, Action::RevealHint(0)).unwrap();
    }
    machine.apply(&mut session, Action::RevealHint(2)).unwrap();
    assert_eq!(session.hints_used(), 2);

    machine
        .apply(&mut session, Action::Submit("supplier_delay".into()))
        .unwrap();
    assert!((session.final_score() - 80.0).abs() < 1e-9);

    machine.apply(&mut session, Action::RetryMission).unwrap();
    assert_eq!(session.screen(), Screen::Investigation);
    assert_eq!(session.hints_used(), 0);
    assert_eq!(session.user_guess(), "supplier_delay");
    assert!((session.final_score() - 80.0).abs() < 1e-9);
}

#[test]
fn retry_restarts_the_timer() {
    let clock = ManualClock::at_epoch();
    let machine = ScreenMachine::new(catalog(), provider(), &clock);
    let mut session = Session::new();
    machine.apply(&mut session, Action::StartPlaying).unwrap();
    machine
        .apply(&mut session, Action::StartInvestigation)
        .unwrap();
    clock.advance_secs(400);
    machine
        .apply(&mut session, Action::Submit("supplier_delay".into()))
        .unwrap();
    assert!((session.final_score() - 60.0).abs() < 1e-9);

    machine.apply(&mut session, Action::RetryMission).unwrap();
    assert_eq!(session.timer_start(), Some(clock.now()));
    clock.advance_secs(100);
    machine
        .apply(&mut session, Action::Submit("supplier_delay".into()))
        .unwrap();
    assert!((session.final_score() - 90.0).abs() < 1e-9);
    assert!((session.total_score() - 90.0).abs() < 1e-9);
}

#[test]
fn disallowed_actions_leave_session_untouched() {
    let clock = ManualClock::at_epoch();
    let machine = ScreenMachine::new(catalog(), provider(), &clock);
    let mut session = Session::new();

    for action in [
        Action::StartInvestigation,
        Action::RevealHint(0),
        Action::Submit("supplier_delay".into()),
        Action::NextMission,
        Action::RetryMission,
        Action::ReturnToDashboard,
    ] {
        let err = machine.apply(&mut session, action).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidTransition {
                screen: Screen::Home,
                ..
            }
        ));
        assert_eq!(session.screen(), Screen::Home);
    }

    machine.apply(&mut session, Action::StartPlaying).unwrap();
    assert!(machine.apply(&mut session, Action::StartPlaying).is_err());
    assert!(machine.apply(&mut session, Action::NextMission).is_err());
    assert_eq!(session.screen(), Screen::Dashboard);
    assert_eq!(session.mission_index(), 0);
}

#[test]
fn go_home_freezes_state_and_return_to_dashboard_keeps_mission() {
    let clock = ManualClock::at_epoch();
    let machine = ScreenMachine::new(catalog(), provider(), &clock);
    let mut session = Session::new();
    machine.apply(&mut session, Action::StartPlaying).unwrap();
    machine
        .apply(&mut session, Action::StartInvestigation)
        .unwrap();
    machine.apply(&mut session, Action::RevealHint(1)).unwrap();
    let started = session.timer_start();

    machine.apply(&mut session, Action::GoHome).unwrap();
    assert_eq!(session.screen(), Screen::Home);
    assert_eq!(session.hints_used(), 1);
    assert_eq!(session.timer_start(), started);

    machine.apply(&mut session, Action::Resume).unwrap();
    machine
        .apply(&mut session, Action::StartInvestigation)
        .unwrap();
    machine
        .apply(&mut session, Action::Submit("warehouse_overload".into()))
        .unwrap();
    assert!(!session.score_breakdown().unwrap().correct);

    let cached = Arc::clone(session.dataset().unwrap());
    machine
        .apply(&mut session, Action::ReturnToDashboard)
        .unwrap();
    assert_eq!(session.mission_index(), 0);
    assert!(Arc::ptr_eq(session.dataset().unwrap(), &cached));
}

#[test]
fn start_playing_after_progress_returns_to_first_mission() {
    let clock = ManualClock::at_epoch();
    let mut game = GameSession::new(ScreenMachine::new(catalog(), provider(), &clock));
    game.dispatch(Action::StartPlaying).unwrap();
    game.dispatch(Action::StartInvestigation).unwrap();
    game.dispatch(Action::Submit("not the answer at all".into()))
        .unwrap();
    game.dispatch(Action::NextMission).unwrap();
    assert_eq!(game.session().mission_index(), 1);

    game.dispatch(Action::GoHome).unwrap();
    game.dispatch(Action::StartPlaying).unwrap();
    assert_eq!(game.session().mission_index(), 0);
    assert_eq!(game.session().dataset().unwrap().mission_index, 0);
    assert_eq!(game.session().history().len(), 1);
}

/// Fails on chosen mission indices and records every request.
struct FlakyProvider {
    failing: BTreeSet<usize>,
    requests: RefCell<Vec<usize>>,
}

#[derive(Debug, thiserror::Error)]
#[error("warehouse feed timed out")]
struct FeedTimeout;

impl DatasetProvider for FlakyProvider {
    type Error = FeedTimeout;

    fn load_mission_dataset(
        &self,
        mission_index: usize,
        mission: &Mission,
    ) -> Result<Dataset, Self::Error> {
        self.requests.borrow_mut().push(mission_index);
        if self.failing.contains(&mission_index) {
            return Err(FeedTimeout);
        }
        Ok(provider().load_mission_dataset(mission_index, mission).unwrap())
    }
}

#[test]
fn provider_failure_on_next_mission_keeps_results() {
    let clock = ManualClock::at_epoch();
    let flaky = FlakyProvider {
        failing: BTreeSet::from([1]),
        requests: RefCell::new(Vec::new()),
    };
    let machine = ScreenMachine::new(catalog(), &flaky, &clock);
    let mut session = Session::new();
    machine.apply(&mut session, Action::StartPlaying).unwrap();
    machine
        .apply(&mut session, Action::StartInvestigation)
        .unwrap();
    machine
        .apply(&mut session, Action::Submit("supplier_delay".into()))
        .unwrap();
    let before = session.clone();

    let err = machine
        .apply(&mut session, Action::NextMission)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "mission data unavailable: mission 2: warehouse feed timed out"
    );
    assert_eq!(session.screen(), Screen::Results);
    assert_eq!(session.mission_index(), before.mission_index());
    assert_eq!(session.user_guess(), before.user_guess());
    assert_eq!(session.score_breakdown(), before.score_breakdown());
    assert_eq!(*flaky.requests.borrow(), vec![0, 1]);

    // Other actions on the Results screen still work.
    machine.apply(&mut session, Action::RetryMission).unwrap();
    assert_eq!(session.screen(), Screen::Investigation);
}
