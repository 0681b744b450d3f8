//! costwise - project costing and earned-value tool.
//!
//! Batch front end: loads the economic parameters, the staff database,
//! and one or more work-package definitions, runs the costing pass,
//! folds in progress reports, and writes CSV reports.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use costwise_core::costing;
use costwise_core::loader;
use costwise_core::report::ReportSuite;
use costwise_core::{CostModel, EconomicParameters, ProgressLedger};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// costwise - project costing and earned-value tool
#[derive(Parser, Debug)]
#[command(name = "costwise")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full costing pass and write reports
    Cost {
        /// Economic-parameters file (defaults apply when omitted)
        #[arg(long)]
        params: Option<PathBuf>,

        /// Staff database CSV
        #[arg(long)]
        staff_db: PathBuf,

        /// Work-package definition CSV (repeatable)
        #[arg(long = "work-package", required = true)]
        work_packages: Vec<PathBuf>,

        /// Progress report CSV (repeatable)
        #[arg(long = "progress")]
        progress: Vec<PathBuf>,

        /// Directory to write reports into (date-stamped subdirectory);
        /// no reports are written when omitted
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Cost {
            params,
            staff_db,
            work_packages,
            progress,
            report_dir,
        } => cost(params, &staff_db, &work_packages, &progress, report_dir),
    }
}

fn cost(
    params: Option<PathBuf>,
    staff_db: &Path,
    work_packages: &[PathBuf],
    progress: &[PathBuf],
    report_dir: Option<PathBuf>,
) -> Result<()> {
    let params = match params {
        Some(path) => EconomicParameters::from_file(&path)
            .with_context(|| format!("loading economic parameters from {}", path.display()))?,
        None => EconomicParameters::default(),
    };

    let mut model = CostModel::new();
    let staff_count = loader::load_staff_database(&mut model, staff_db)
        .with_context(|| format!("loading staff database from {}", staff_db.display()))?;
    info!(staff_count, "staff database loaded");

    for path in work_packages {
        loader::load_work_package(&mut model, path)
            .with_context(|| format!("loading work-package definition {}", path.display()))?;
    }

    let pruned = costing::run(&mut model, &params).context("costing pass failed")?;
    if pruned.total() > 0 {
        info!(pruned = pruned.total(), "entries removed before costing");
    }

    let mut ledger = ProgressLedger::new();
    for path in progress {
        let loaded = loader::load_progress(&model, &mut ledger, path)
            .with_context(|| format!("loading progress report {}", path.display()))?;
        info!(loaded, path = %path.display(), "progress report loaded");
    }

    let projects: Vec<_> = model.project_entries().collect();
    if projects.is_empty() {
        bail!("no project emerged from the work-package definitions");
    }
    for (_, project) in &projects {
        println!(
            "{}: {} financial years, total cost {:.3}",
            project.name,
            project.financial_years.len(),
            project.total_cost()
        );
    }

    if let Some(base) = report_dir {
        let dated = base.join(params.issue_date.format("%Y-%m-%d").to_string());
        let suite = ReportSuite::new(dated).context("creating report directory")?;
        let written = suite
            .write_all(&model, &ledger)
            .context("writing reports")?;
        println!("{} reports written to {}", written.len(), suite.dir().display());
    }

    Ok(())
}
