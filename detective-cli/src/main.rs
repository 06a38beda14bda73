mod app;
mod autoplay;
mod commands;
mod provider;
mod render;
mod reports;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdin, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use autoplay::{AutoplayResult, Profile, run_profile};
use detective_game::constants::DEFAULT_BASE_SEED;
use detective_game::{GameSession, MissionCatalog, ScreenMachine};
use provider::CliProvider;
use util::split_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Interactive game on the terminal
    Play,
    /// Scripted play-throughs with fixed player profiles
    Autoplay,
}

#[derive(Debug, Parser)]
#[command(name = "supply-chain-detective", version)]
#[command(about = "Investigate supply-chain datasets and name the root cause of each disruption")]
struct Args {
    /// Run mode: interactive play or scripted autoplay
    #[arg(long, value_enum, default_value_t = RunMode::Play)]
    mode: RunMode,

    /// Load missions from this JSON file instead of the bundled catalog
    #[arg(long)]
    missions: Option<PathBuf>,

    /// Read mission_<id>.json datasets from this directory instead of generating them
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Base seed for generated datasets
    #[arg(long, default_value_t = DEFAULT_BASE_SEED)]
    seed: u64,

    /// Autoplay profiles to run (comma-separated: perfect,hinted,guesser)
    #[arg(long, default_value = "perfect,hinted,guesser")]
    profiles: String,

    /// Simulated seconds spent on each mission during autoplay
    #[arg(long, default_value_t = 60)]
    think_secs: i64,

    /// Output report format (autoplay only)
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let catalog = Arc::new(load_catalog(args.missions.as_deref())?);
    let provider = CliProvider::from_args(args.data_dir.as_deref(), args.seed);
    log::info!(
        "loaded {} missions, datasets from {}",
        catalog.get_mission_count(),
        provider.describe()
    );

    match args.mode {
        RunMode::Play => run_play(&args, catalog, provider),
        RunMode::Autoplay => run_autoplay(&args, &catalog, &provider),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<MissionCatalog> {
    let Some(path) = path else {
        return MissionCatalog::load_from_static().context("bundled mission catalog is invalid");
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    MissionCatalog::from_json(&json)
        .with_context(|| format!("invalid mission catalog {}", path.display()))
}

fn announce_banner() {
    println!("{}", "🔎 Supply Chain Detective Autoplay".bright_cyan().bold());
    println!("{}", "==================================".cyan());
}

fn run_play(args: &Args, catalog: Arc<MissionCatalog>, provider: CliProvider) -> Result<()> {
    if args.verbose {
        println!("Using {}", provider.describe());
    }
    let mut game = GameSession::new(ScreenMachine::with_system_clock(catalog, provider));
    let mut out = stdout().lock();
    let summary = app::run_interactive(&mut game, stdin().lock(), &mut out)
        .context("terminal I/O failed")?;
    log::info!(
        "play session ended after {} actions ({} rejected)",
        summary.actions,
        summary.rejected
    );
    Ok(())
}

fn expand_profiles(profiles_arg: &str) -> Vec<Profile> {
    let mut profiles = Vec::new();
    for name in split_csv(profiles_arg) {
        if let Some(profile) = Profile::parse(&name) {
            if !profiles.contains(&profile) {
                profiles.push(profile);
            }
        } else {
            eprintln!("⚠️  Unknown profile: {}", name.yellow());
        }
    }
    profiles
}

fn run_autoplay(args: &Args, catalog: &Arc<MissionCatalog>, provider: &CliProvider) -> Result<()> {
    let announce = args.output.is_some() || args.report == "console";
    if announce {
        announce_banner();
    }
    let start_time = Instant::now();
    let profiles = expand_profiles(&args.profiles);

    let mut results = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let result = run_profile(catalog, provider, profile, args.think_secs);
        if args.verbose && announce {
            println!(
                "▶ {} finished with {:.1} points",
                profile.as_str().bold(),
                result.total_score
            );
        }
        results.push(result);
    }

    write_reports(args, &results, start_time)?;

    if results.iter().any(|r| !r.passed()) {
        std::process::exit(1);
    }
    Ok(())
}

fn write_reports(args: &Args, results: &[AutoplayResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Supply Chain Detective Autoplay Results\n\n_No profiles executed._"
                )?;
            } else {
                reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No autoplay profiles executed.")?;
            } else {
                reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
