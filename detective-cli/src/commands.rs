//! Typed player commands parsed from a line of input.
use detective_game::Action;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Act(Action),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}' (type 'help' for a list)")]
    Unknown(String),
    #[error("usage: hint <number>, counting from 1")]
    HintNumber,
    #[error("usage: submit <root cause>")]
    MissingGuess,
}

/// One line per command, shown by `help`.
pub const HELP: &[(&str, &str)] = &[
    ("start", "begin playing from the first mission"),
    ("resume", "return to the mission you left"),
    ("investigate", "start the timer and open the investigation"),
    ("hint <n>", "reveal hint n (costs points once per hint)"),
    ("submit <cause>", "submit your root-cause conclusion"),
    ("next", "move on to the next mission"),
    ("retry", "investigate the same mission again"),
    ("dashboard", "go back to the mission dashboard"),
    ("home", "go to the home screen"),
    ("help", "show this list"),
    ("quit", "leave the game"),
];

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns an error for unknown commands or malformed arguments.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(h, r)| (h, r.trim()));

    let command = match head.to_lowercase().as_str() {
        "start" | "play" => Command::Act(Action::StartPlaying),
        "resume" | "continue" => Command::Act(Action::Resume),
        "investigate" | "begin" => Command::Act(Action::StartInvestigation),
        "hint" => {
            let number: usize = rest.parse().map_err(|_| CommandError::HintNumber)?;
            let index = number.checked_sub(1).ok_or(CommandError::HintNumber)?;
            Command::Act(Action::RevealHint(index))
        }
        "submit" | "answer" => {
            if rest.is_empty() {
                return Err(CommandError::MissingGuess);
            }
            Command::Act(Action::Submit(rest.to_string()))
        }
        "next" => Command::Act(Action::NextMission),
        "retry" => Command::Act(Action::RetryMission),
        "dashboard" | "back" => Command::Act(Action::ReturnToDashboard),
        "home" => Command::Act(Action::GoHome),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}
