//! Interactive play loop: read a command, apply it, redraw.
use std::io::{self, BufRead, Write};

use detective_game::{Clock, DatasetProvider, GameError, GameSession};

use crate::commands::{Command, parse_command};
use crate::render::{render_error, render_help, render_screen};

/// What happened during an interactive run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaySummary {
    pub actions: usize,
    pub rejected: usize,
    pub attempts: usize,
    pub total_score: f64,
}

fn prompt<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}

/// Drive `game` from `input` until EOF or `quit`.
///
/// # Errors
///
/// Returns an error only when reading input or writing output fails; game
/// errors are shown to the player and the loop continues.
pub fn run_interactive<P, C, R, W>(
    game: &mut GameSession<P, C>,
    input: R,
    out: &mut W,
) -> io::Result<PlaySummary>
where
    P: DatasetProvider,
    C: Clock,
    R: BufRead,
    W: Write + ?Sized,
{
    let mut actions = 0;
    let mut rejected = 0;
    render_screen(out, game)?;
    prompt(out)?;

    for line in input.lines() {
        let line = line?;
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(Command::Help)) => render_help(out)?,
            Ok(Some(Command::Act(action))) => match game.dispatch(action) {
                Ok(_) => {
                    actions += 1;
                    render_screen(out, game)?;
                }
                Err(err) => {
                    rejected += 1;
                    if matches!(err, GameError::DataUnavailable(_)) {
                        log::warn!("{err}");
                    } else {
                        log::debug!("rejected action: {err}");
                    }
                    render_error(out, &err)?;
                }
            },
            Err(err) => render_error(out, &err)?,
        }
        prompt(out)?;
    }

    let session = game.session();
    writeln!(out)?;
    writeln!(
        out,
        "Thanks for playing. Total score {:.1} across {} submissions.",
        session.total_score(),
        session.history().len()
    )?;
    Ok(PlaySummary {
        actions,
        rejected,
        attempts: session.history().len(),
        total_score: session.total_score(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use detective_game::{ManualClock, MissionCatalog, Screen, ScreenMachine, SyntheticProvider};
    use std::io::Cursor;
    use std::sync::Arc;

    fn play(script: &str) -> (PlaySummary, String, Screen) {
        colored::control::set_override(false);
        let clock = ManualClock::at_epoch();
        let catalog = Arc::new(MissionCatalog::load_from_static().unwrap());
        let provider = SyntheticProvider::default().with_shipments(30);
        let mut game = GameSession::new(ScreenMachine::new(catalog, provider, &clock));
        let mut out = Vec::new();
        let summary = run_interactive(&mut game, Cursor::new(script.to_string()), &mut out).unwrap();
        (summary, String::from_utf8(out).unwrap(), game.screen())
    }

    #[test]
    fn scripted_session_scores_a_mission() {
        let (summary, out, screen) = play(
            "start\ninvestigate\nhint 1\nhint 1\nsubmit too short\nsubmit supplier_delay\nnext\nquit\n",
        );
        assert_eq!(screen, Screen::Dashboard);
        assert_eq!(summary.attempts, 1);
        assert_eq!(summary.rejected, 1);
        assert!((summary.total_score - 90.0).abs() < 1e-9);
        assert!(out.contains("describe the root cause in at least 10 characters"));
        assert!(out.contains("Case closed!"));
        assert!(out.contains("Mission 2/5:"));
    }

    #[test]
    fn bad_input_is_reported_and_eof_ends_the_loop() {
        let (summary, out, screen) = play("dance\nsubmit supplier_delay\nhelp\n\n");
        assert_eq!(screen, Screen::Home);
        assert_eq!(summary.actions, 0);
        assert_eq!(summary.rejected, 1);
        assert!(out.contains("unknown command 'dance'"));
        assert!(out.contains("'submit' is not available on the home screen"));
        assert!(out.contains("Commands"));
        assert!(out.contains("Thanks for playing."));
    }
}
