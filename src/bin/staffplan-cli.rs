#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use staffplan::{
    detect_weekend_violations, io,
    report::{ReportRenderer, TextReport},
    request::ScheduleRequest,
    scheduler::{Outcome, ScheduleResult, Scheduler},
    storage::{JsonStorage, Storage},
};
use clap::{Parser, Subcommand};
use std::io::Write;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification d'équipes (MILP + relaxation ordonnée)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de demande (données + ordre de relaxation + options)
    #[arg(long, global = true, default_value = "request.json")]
    request: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Calculer un planning
    Solve {
        /// Limite de temps par tentative (millisecondes)
        #[arg(long)]
        time_limit_ms: Option<u64>,
        /// Budget global (secondes)
        #[arg(long)]
        deadline: Option<u64>,
        /// Résultat complet en JSON
        #[arg(long)]
        out_json: Option<String>,
        /// Planning en CSV
        #[arg(long)]
        out_csv: Option<String>,
        /// Dépassements de week-end en CSV
        #[arg(long)]
        violations_csv: Option<String>,
    },

    /// Afficher le rapport de capacité sans résoudre
    Capacity,

    /// Lister les fenêtres de week-end de l'horizon
    Windows,

    /// Revérifier les week-ends d'un résultat sauvegardé
    Check {
        #[arg(long)]
        result: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let mut request = JsonStorage::<ScheduleRequest>::open(&cli.request).load()?;

    let code = match cli.cmd {
        Commands::Solve {
            time_limit_ms,
            deadline,
            out_json,
            out_csv,
            violations_csv,
        } => {
            if let Some(ms) = time_limit_ms {
                request.options.attempt_time_limit_ms = ms;
            }
            if deadline.is_some() {
                request.options.deadline_secs = deadline;
            }
            let result = request.run()?;
            print!("{}", TextReport.render(&result));

            if let Some(path) = out_json {
                JsonStorage::<ScheduleResult>::open(path).save(&result)?;
            }
            if let Outcome::Solved(solved) = &result.outcome {
                if let Some(path) = out_csv {
                    io::export_schedule_csv(path, &solved.schedule)?;
                }
                if let Some(path) = violations_csv {
                    io::export_violations_csv(path, &solved.violations)?;
                }
            }
            // Code 2 = aucun planning faisable
            if result.is_solved() {
                0
            } else {
                2
            }
        }
        Commands::Capacity => {
            let input = request.resolved_input()?;
            let report = Scheduler::new(request.options).capacity(&input)?;
            print!("{report}");
            if report.under_capacity().next().is_some() || !report.slot_gaps.is_empty() {
                2
            } else {
                0
            }
        }
        Commands::Windows => {
            let windows = Scheduler::new(request.options).weekend_windows(&request.input)?;
            for w in &windows {
                println!("{} → {}", w.start, w.end);
            }
            0
        }
        Commands::Check { result } => {
            let saved = JsonStorage::<ScheduleResult>::open(&result).load()?;
            let solved = saved
                .solved()
                .with_context(|| format!("{result} holds no schedule"))?;
            let windows = Scheduler::new(request.options).weekend_windows(&request.input)?;
            let violations =
                detect_weekend_violations(&solved.schedule, &windows, &request.input.workers);
            if violations.is_empty() {
                println!("OK: no weekend violations");
                0
            } else {
                eprintln!("Found {} weekend violation(s)", violations.len());
                for v in &violations {
                    println!("{v}");
                }
                // Code 2 = WARNING
                2
            }
        }
    };

    std::io::stdout().flush()?;
    std::process::exit(code);
}
