mod calc;
mod chart;
mod commands;
mod config;
mod flatfile;
mod menu;
mod report;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{OutputFormat, QueryOptions};
use crate::config::{GradebookConfig, DATA_DIR_ENV};

#[derive(Parser)]
#[command(name = "gradebook", version, about = "Course grades from flat files")]
struct Cli {
    /// Folder holding students.txt, assignments.txt and submissions/
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print query results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Overall percentage grade for a student
    Grade {
        /// Student name as it appears in the roster
        name: String,
    },

    /// Min, average and max percentage for an assignment
    Stats {
        /// Assignment name
        name: String,
    },

    /// Score distribution chart for an assignment
    Histogram {
        /// Assignment name
        name: String,
    },

    /// Class summary of every student and assignment as JSON
    Report {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gradebook=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load(config: &GradebookConfig) -> anyhow::Result<flatfile::Gradebook> {
    flatfile::load_gradebook(
        &config.students_path(),
        &config.assignments_path(),
        &config.submissions_path(),
    )
    .with_context(|| {
        format!(
            "failed to load gradebook from {}",
            config.data_dir.to_string_lossy()
        )
    })
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::resolve(
        cli.config.as_deref(),
        cli.data_dir,
        std::env::var_os(DATA_DIR_ENV),
    )?;
    let book = load(&config)?;

    let opts = QueryOptions {
        total_points: config.total_points,
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        },
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        None => {
            let stdin = io::stdin();
            menu::run_menu(&mut stdin.lock(), &mut out, &book, opts)?;
        }
        Some(Commands::Grade { name }) => {
            commands::print_student_grade(&mut out, &book, &name, opts)?
        }
        Some(Commands::Stats { name }) => {
            commands::print_assignment_stats(&mut out, &book, &name, opts)?
        }
        Some(Commands::Histogram { name }) => {
            commands::print_assignment_histogram(&mut out, &book, &name, opts)?
        }
        Some(Commands::Report { out: out_path }) => {
            let model = report::build_report(&book, config.total_points);
            report::write_report(&model, out_path.as_deref(), &mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}
