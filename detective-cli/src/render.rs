//! Terminal rendering for each screen.
use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::{self, Write};

use colored::Colorize;
use detective_game::{
    Clock, Dataset, DatasetProvider, GameSession, Mission, Screen, anomaly_insights,
    compute_kpis, format_currency, format_percentage, format_time, numbers::i64_to_f64,
    train_delay_model,
};

use crate::commands::HELP;

const TOP_REASONS: usize = 5;

pub fn render_screen<P, C, W>(out: &mut W, game: &GameSession<P, C>) -> io::Result<()>
where
    P: DatasetProvider,
    C: Clock,
    W: Write + ?Sized,
{
    writeln!(out)?;
    match game.screen() {
        Screen::Home => render_home(out, game),
        Screen::Dashboard => render_dashboard(out, game),
        Screen::Investigation => render_investigation(out, game),
        Screen::Results => render_results(out, game),
    }
}

pub fn render_error<W: Write + ?Sized>(out: &mut W, err: &dyn Display) -> io::Result<()> {
    writeln!(out, "{} {}", "⚠️ ".yellow(), err.to_string().yellow())
}

pub fn render_help<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "Commands".bold())?;
    for (usage, description) in HELP {
        writeln!(out, "  {usage:16} {description}")?;
    }
    Ok(())
}

fn render_home<P, C, W>(out: &mut W, game: &GameSession<P, C>) -> io::Result<()>
where
    P: DatasetProvider,
    C: Clock,
    W: Write + ?Sized,
{
    let session = game.session();
    writeln!(out, "{}", "🔎 Supply Chain Detective".bright_cyan().bold())?;
    writeln!(out, "{}", "==========================".cyan())?;
    writeln!(
        out,
        "{} missions await. Dig through the data and name the root cause of each disruption.",
        game.machine().catalog().get_mission_count()
    )?;
    if session.has_started() {
        writeln!(
            out,
            "Total score: {:.1} · missions solved: {}",
            session.total_score(),
            session.missions_solved()
        )?;
        writeln!(out, "Type {} to continue or {} to begin again.", "resume".bold(), "start".bold())
    } else {
        writeln!(out, "Type {} to begin.", "start".bold())
    }
}

fn mission_header<W: Write + ?Sized>(out: &mut W, mission: &Mission, count: usize) -> io::Result<()> {
    writeln!(
        out,
        "{} {}  [{}]",
        format!("Mission {}/{count}:", mission.id).bright_cyan().bold(),
        mission.title.bold(),
        mission.difficulty.to_string().magenta()
    )?;
    if !mission.briefing.is_empty() {
        writeln!(out, "{}", mission.briefing.italic())?;
    }
    writeln!(out, "{}", mission.description)
}

fn kpi_value(name: &str, value: f64) -> String {
    match name {
        "average_delay_minutes" => format!("{value:.1} min"),
        "percent_delayed" | "warehouse_load_index" => format!("{value:.2}%"),
        "cost_delay_correlation" => format!("{value:+.3}"),
        _ => format!("{value:.0}"),
    }
}

fn kpi_label(name: &str) -> String {
    let mut label = name.replace('_', " ");
    if let Some(first) = label.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    label
}

fn render_dashboard<P, C, W>(out: &mut W, game: &GameSession<P, C>) -> io::Result<()>
where
    P: DatasetProvider,
    C: Clock,
    W: Write + ?Sized,
{
    let count = game.machine().catalog().get_mission_count();
    if let Some(mission) = game.current_mission() {
        mission_header(out, mission, count)?;
    }
    let Some(data) = game.session().dataset() else {
        return writeln!(out, "{}", "No data loaded for this mission.".red());
    };

    writeln!(out)?;
    writeln!(out, "{}", "📊 Key indicators".bright_yellow().bold())?;
    let kpis = compute_kpis(&data.shipments, Some(&data.warehouses));
    for (name, value) in kpis.entries() {
        writeln!(out, "  {:28} {}", kpi_label(name), kpi_value(name, value))?;
    }

    writeln!(out, "{}", "🏭 Warehouses".bright_yellow().bold())?;
    for wh in &data.warehouses {
        let load = wh
            .current_load
            .map_or_else(|| "n/a".to_string(), |l| format_percentage(f64::from(l) / f64::from(wh.capacity)));
        writeln!(
            out,
            "  {} {:16} {:12} capacity {:>5}  load {}",
            wh.warehouse_id, wh.warehouse_name, wh.location, wh.capacity, load
        )?;
    }

    writeln!(out, "{}", "🚚 Supplier reliability".bright_yellow().bold())?;
    let mut suppliers: Vec<(&String, &f64)> = kpis.supplier_reliability.iter().collect();
    suppliers.sort_by(|a, b| a.1.total_cmp(b.1));
    for (name, score) in suppliers {
        writeln!(out, "  {name:24} {score:6.1}%")?;
    }
    writeln!(out)?;
    writeln!(out, "Type {} to start the clock.", "investigate".bold())
}

fn render_anomalies<W: Write + ?Sized>(out: &mut W, data: &Dataset) -> io::Result<()> {
    let insights = anomaly_insights(&data.shipments, &data.anomalies);
    writeln!(
        out,
        "{} {} flagged ({:.1}% of shipments)",
        "🚨 Anomalies:".bright_red().bold(),
        insights.total_anomalies,
        insights.anomaly_percentage
    )?;
    for id in &insights.most_anomalous_ids {
        if let Some(s) = data.shipments.iter().find(|s| &s.shipment_id == id) {
            writeln!(
                out,
                "  {id}  {} via {} → {}  delay {:.0} min  cost {}  traffic {:.2}",
                s.supplier,
                s.warehouse_id,
                s.destination,
                s.delay_minutes(),
                format_currency(s.cost),
                s.traffic_index
            )?;
        }
    }
    for insight in &insights.insights {
        writeln!(
            out,
            "  {:14} anomalous avg {:>10.2} vs normal {:>10.2} ({:+.1}%)",
            insight.feature, insight.anomaly_avg, insight.normal_avg, insight.difference_pct
        )?;
    }
    Ok(())
}

fn render_delay_reasons<W: Write + ?Sized>(out: &mut W, data: &Dataset) -> io::Result<()> {
    let mut tally: BTreeMap<&str, usize> = BTreeMap::new();
    for delay in &data.delays {
        *tally.entry(delay.reported_reason.as_str()).or_default() += 1;
    }
    let mut reasons: Vec<(&str, usize)> = tally.into_iter().collect();
    reasons.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    writeln!(out, "{}", "📝 Reported delay reasons".bright_yellow().bold())?;
    for (reason, count) in reasons.into_iter().take(TOP_REASONS) {
        writeln!(out, "  {reason:28} {count}")?;
    }
    Ok(())
}

fn render_delay_model<W: Write + ?Sized>(out: &mut W, data: &Dataset) -> io::Result<()> {
    writeln!(out, "{}", "📈 Delay drivers".bright_yellow().bold())?;
    match train_delay_model(&data.shipments, data.seed) {
        Ok(trained) => {
            for (feature, weight) in trained.model.feature_importance() {
                writeln!(out, "  {feature:14} {}", format_percentage(weight))?;
            }
            writeln!(
                out,
                "  (MAE {:.1} min, R² {:.2})",
                trained.metrics.mae, trained.metrics.r2
            )
        }
        Err(err) => writeln!(out, "  {err}"),
    }
}

fn render_investigation<P, C, W>(out: &mut W, game: &GameSession<P, C>) -> io::Result<()>
where
    P: DatasetProvider,
    C: Clock,
    W: Write + ?Sized,
{
    let session = game.session();
    let Some(mission) = game.current_mission() else {
        return Ok(());
    };
    writeln!(
        out,
        "{} {}",
        "🕵️  Investigating:".bright_cyan().bold(),
        mission.title.bold()
    )?;
    if let Some(started) = session.timer_start() {
        let elapsed = (game.machine().clock().now() - started).num_seconds();
        writeln!(out, "Clock: {}", format_time(i64_to_f64(elapsed)))?;
    }

    if let Some(data) = session.dataset() {
        render_anomalies(out, data)?;
        render_delay_reasons(out, data)?;
        render_delay_model(out, data)?;
    }

    for index in session.revealed_hints() {
        if let Some(hint) = mission.hints.get(index) {
            writeln!(out, "💡 Hint {}: {}", index + 1, hint.bright_white())?;
        }
    }
    writeln!(
        out,
        "{} of {} hints revealed (each costs 10 points).",
        session.hints_used(),
        mission.hints.len()
    )?;
    writeln!(
        out,
        "Type {} or {}.",
        "hint <n>".bold(),
        "submit <root cause>".bold()
    )
}

fn render_results<P, C, W>(out: &mut W, game: &GameSession<P, C>) -> io::Result<()>
where
    P: DatasetProvider,
    C: Clock,
    W: Write + ?Sized,
{
    let session = game.session();
    let Some(breakdown) = session.score_breakdown() else {
        return writeln!(out, "No submission yet.");
    };
    if breakdown.correct {
        writeln!(out, "{}", "✅ Case closed!".bright_green().bold())?;
    } else {
        writeln!(out, "{}", "❌ Not quite.".bright_red().bold())?;
    }
    writeln!(out, "Your conclusion: {}", session.user_guess())?;
    writeln!(out, "  Base score     {:>8}", breakdown.base_score)?;
    writeln!(
        out,
        "  Time taken     {:>8}  (-{:.1})",
        format_time(breakdown.time_taken),
        breakdown.time_penalty
    )?;
    writeln!(
        out,
        "  Hints used     {:>8}  (-{})",
        breakdown.hints_used, breakdown.hint_penalty
    )?;
    writeln!(
        out,
        "  Final score    {:>8.1}  {}",
        breakdown.final_score,
        breakdown.performance_rating.to_string().bold()
    )?;
    writeln!(out, "{}", breakdown.performance_rating.feedback())?;
    if breakdown.correct {
        if let Some(mission) = game.current_mission() {
            if !mission.explanation.is_empty() {
                writeln!(out, "{}", mission.explanation.italic())?;
            }
        }
    }
    writeln!(out, "Session total: {:.1}", session.total_score())?;
    writeln!(
        out,
        "Type {}, {} or {}.",
        "next".bold(),
        "retry".bold(),
        "dashboard".bold()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use detective_game::{Action, ManualClock, MissionCatalog, ScreenMachine, SyntheticProvider};
    use std::sync::Arc;

    fn render(game: &GameSession<SyntheticProvider, &ManualClock>) -> String {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        render_screen(&mut buf, game).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn every_screen_renders() {
        let clock = ManualClock::at_epoch();
        let catalog = Arc::new(MissionCatalog::load_from_static().unwrap());
        let provider = SyntheticProvider::default().with_shipments(40);
        let mut game = GameSession::new(ScreenMachine::new(catalog, provider, &clock));

        assert!(render(&game).contains("Type start to begin."));

        game.dispatch(Action::StartPlaying).unwrap();
        let dashboard = render(&game);
        assert!(dashboard.contains("Mission 1/5:"));
        assert!(dashboard.contains("Percent delayed"));
        assert!(dashboard.contains("Globex Materials"));

        game.dispatch(Action::StartInvestigation).unwrap();
        game.dispatch(Action::RevealHint(0)).unwrap();
        clock.advance_secs(75);
        let investigation = render(&game);
        assert!(investigation.contains("Clock: 1m 15s"));
        assert!(investigation.contains("💡 Hint 1:"));
        assert!(investigation.contains("1 of 3 hints revealed"));
        assert!(investigation.contains("Delay drivers"));

        game.dispatch(Action::Submit("supplier_delay".into())).unwrap();
        let results = render(&game);
        assert!(results.contains("Case closed!"));
        assert!(results.contains("Final score"));
        assert!(results.contains("82.5"));
    }

    #[test]
    fn kpi_labels_are_readable() {
        assert_eq!(kpi_label("order_backlog"), "Order backlog");
        assert_eq!(kpi_value("cost_delay_correlation", 0.25), "+0.250");
        assert_eq!(kpi_value("total_shipments", 120.0), "120");
    }
}
