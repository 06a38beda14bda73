//! Submission scoring.
//!
//! `score` is a pure function over its inputs. An incorrect answer has a base
//! score of zero, so the `max(0, ...)` floor makes it score zero with an
//! `Incorrect` rating whatever the penalties are. Correct answers lose 0.1
//! points per second and 10 points per hint, without an upper bound on the
//! time penalty.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    BASE_SCORE_CORRECT, BASE_SCORE_INCORRECT, HINT_PENALTY_POINTS, RATING_EXCELLENT_MIN,
    RATING_FAIR_MIN, RATING_GOOD_MIN, RATING_GREAT_MIN, TIME_PENALTY_PER_SECOND,
};
use crate::numbers::non_negative;

/// Categorical label derived from the final numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PerformanceRating {
    Excellent,
    Great,
    Good,
    Fair,
    Poor,
    #[default]
    Incorrect,
}

impl PerformanceRating {
    /// Band a final score. Only the number matters, not correctness.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= RATING_EXCELLENT_MIN {
            Self::Excellent
        } else if score >= RATING_GREAT_MIN {
            Self::Great
        } else if score >= RATING_GOOD_MIN {
            Self::Good
        } else if score >= RATING_FAIR_MIN {
            Self::Fair
        } else if score > 0.0 {
            Self::Poor
        } else {
            Self::Incorrect
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Great => "Great",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::Incorrect => "Incorrect",
        }
    }

    /// Short feedback line for the results screen.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::Excellent => "Outstanding detective work! You cracked the case quickly and cleanly.",
            Self::Great => "Great job! A sharp investigation with only minor detours.",
            Self::Good => "Good work. You found the cause, but there is room to move faster.",
            Self::Fair => "Case closed, eventually. Try leaning on the data before the hints.",
            Self::Poor => "Correct, but slow and hint-heavy. Practice will sharpen your instincts.",
            Self::Incorrect => "Not quite. Review the evidence and try the mission again.",
        }
    }
}

impl fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed breakdown of a single submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreBreakdown {
    pub correct: bool,
    pub base_score: i32,
    pub time_taken: f64,
    pub time_penalty: f64,
    pub hints_used: u32,
    pub hint_penalty: i32,
    pub total_penalties: f64,
    pub final_score: f64,
    pub performance_rating: PerformanceRating,
}

/// Lower-case and trim an answer for comparison.
#[must_use]
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Whether a guess names the correct cause. Empty guesses never match.
#[must_use]
pub fn check_answer(user_guess: &str, correct_cause: &str) -> bool {
    let guess = normalize_answer(user_guess);
    !guess.is_empty() && guess == normalize_answer(correct_cause)
}

#[must_use]
pub fn calculate_time_penalty(time_taken: f64) -> f64 {
    non_negative(time_taken) * TIME_PENALTY_PER_SECOND
}

#[must_use]
pub fn calculate_hint_penalty(hints_used: u32) -> i32 {
    i32::try_from(hints_used)
        .unwrap_or(i32::MAX)
        .saturating_mul(HINT_PENALTY_POINTS)
}

/// Score a submission.
///
/// Negative or non-finite `time_taken` is treated as zero seconds.
#[must_use]
pub fn score(
    user_guess: &str,
    correct_cause: &str,
    time_taken: f64,
    hints_used: u32,
) -> (f64, ScoreBreakdown) {
    let correct = check_answer(user_guess, correct_cause);
    let base_score = if correct {
        BASE_SCORE_CORRECT
    } else {
        BASE_SCORE_INCORRECT
    };
    let time_taken = non_negative(time_taken);
    let time_penalty = calculate_time_penalty(time_taken);
    let hint_penalty = calculate_hint_penalty(hints_used);
    let total_penalties = time_penalty + f64::from(hint_penalty);
    let final_score = (f64::from(base_score) - total_penalties).max(0.0);

    let breakdown = ScoreBreakdown {
        correct,
        base_score,
        time_taken,
        time_penalty,
        hints_used,
        hint_penalty,
        total_penalties,
        final_score,
        performance_rating: PerformanceRating::from_score(final_score),
    };
    (final_score, breakdown)
}
