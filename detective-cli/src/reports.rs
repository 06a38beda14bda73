use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use detective_game::format_time;

use crate::autoplay::AutoplayResult;

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[AutoplayResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Autoplay Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;

    let passed = results.iter().filter(|r| r.passed()).count();
    writeln!(out, "Profiles run: {}", results.len())?;
    writeln!(out, "Completed: {}", passed.to_string().green())?;
    writeln!(out, "Stopped early: {}", (results.len() - passed).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed() {
            "✅ DONE".green()
        } else {
            "❌ STOPPED".red()
        };
        writeln!(out, "{status} {}", result.profile.as_str().bold())?;
        writeln!(
            out,
            "   Solved {}/{} · total score {:.1}",
            result.missions_solved, result.mission_count, result.total_score
        )?;
        for attempt in &result.attempts {
            writeln!(
                out,
                "   Mission {:>2}: {:>6.1}  {:10} hints {}  time {}",
                attempt.mission_id,
                attempt.final_score,
                attempt.rating.as_str(),
                attempt.hints_used,
                format_time(attempt.time_taken)
            )?;
        }
        for error in &result.errors {
            writeln!(out, "   • {}", error.red())?;
        }
        writeln!(out)?;
    }

    if let Some(best) = results
        .iter()
        .max_by(|a, b| a.total_score.total_cmp(&b.total_score))
    {
        writeln!(out, "{}", "🏆 Best profile".bright_yellow().bold())?;
        writeln!(
            out,
            "{} ({:.1} points)",
            best.profile.as_str().green(),
            best.total_score
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, results: &[AutoplayResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[AutoplayResult],
) -> Result<()> {
    writeln!(out, "# Supply Chain Detective Autoplay Results\n")?;

    let passed = results.iter().filter(|r| r.passed()).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Profiles run**: {}", results.len())?;
    writeln!(out, "- **Completed**: {passed}")?;
    writeln!(out, "- **Stopped early**: {}\n", results.len() - passed)?;

    writeln!(out, "## Profiles\n")?;
    for result in results {
        let status = if result.passed() { "✅" } else { "❌" };
        writeln!(out, "### {status} {}\n", result.profile.as_str())?;
        writeln!(
            out,
            "- **Solved**: {}/{}",
            result.missions_solved, result.mission_count
        )?;
        writeln!(out, "- **Total score**: {:.1}\n", result.total_score)?;
        if !result.attempts.is_empty() {
            writeln!(out, "| Mission | Correct | Score | Rating | Hints | Time |")?;
            writeln!(out, "|---|---|---|---|---|---|")?;
            for a in &result.attempts {
                writeln!(
                    out,
                    "| {} | {} | {:.1} | {} | {} | {} |",
                    a.mission_id,
                    if a.correct { "yes" } else { "no" },
                    a.final_score,
                    a.rating,
                    a.hints_used,
                    format_time(a.time_taken)
                )?;
            }
            writeln!(out)?;
        }
        if !result.errors.is_empty() {
            writeln!(out, "- **Errors**:")?;
            for error in &result.errors {
                writeln!(out, "  - {error}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
