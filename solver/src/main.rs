use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use heyawake::cuts::{Candidate, CutObserver, Stage, StructureKind};
use heyawake::{Location, SolveOptions, SolveStatus, StopFlag, Template};
use log::{info, warn};

#[derive(Parser)]
#[command(author, version, about = "Solve a Heyawake puzzle saved as a JSON template", long_about = None)]
struct Args {
    /// Template file to solve
    template: PathBuf,

    /// Give up after this many seconds
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// Log every candidate and every wall or loop found along the way
    #[arg(short, long)]
    visualise: bool,
}

/// Writes the search to the log as it happens.
#[derive(Default)]
struct LoggingObserver {
    candidates: usize,
}

impl CutObserver for LoggingObserver {
    fn on_candidate(&mut self, candidate: &Candidate) {
        self.candidates += 1;
        info!("candidate {}: {} black cells", self.candidates, candidate.black_cells().count());
    }

    fn on_structure(&mut self, kind: StructureKind, stage: Stage, cells: &[Location]) {
        let stage = match stage {
            Stage::Detected => "found",
            Stage::Purged => "purged to",
        };
        info!("  {} {}: {}", kind, stage, cells.iter().map(ToString::to_string).collect::<Vec<_>>().join(" "));
    }
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
    let args = Args::parse();

    let template = Template::load(&args.template)
        .with_context(|| format!("could not load template {}", args.template.display()))?;
    let board = template.to_board()?;
    println!("{}", board);

    let time_limit = match args.time_limit {
        Some(seconds) if !seconds.is_finite() || seconds < 0.0 => bail!("time limit must be a non-negative number of seconds"),
        Some(seconds) => Some(Duration::from_secs_f64(seconds)),
        None => None,
    };
    let options = SolveOptions { time_limit };

    let stop = StopFlag::default();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.raise())?;
    info!("Press Ctrl+C to stop solving");

    let report = if args.visualise {
        board.solve_with(&options, &stop, &mut LoggingObserver::default())?
    } else {
        board.solve_with(&options, &stop, &mut ())?
    };

    println!("{}", report);
    if let (SolveStatus::Optimal, Some(solution)) = (report.status, &report.solution) {
        println!("{}", board.render_solution(solution));

        let violations = board.violations(solution);
        if violations.is_empty() {
            info!("solution verified against every rule");
        } else {
            for violation in &violations {
                warn!("{}", violation);
            }
            bail!("solution breaks {} rule(s)", violations.len());
        }
    }

    Ok(())
}
