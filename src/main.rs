//! Cellflow - command-line front end for the recalculation engine.

mod args;
#[cfg(feature = "chart")]
mod chart;
mod config;
mod table;

use anyhow::Context;
use args::{Action, Cli};
use cellflow_core::{CellRef, Notification, Range, Session, SessionConfig};
use cellflow_engine::engine::functions;
use std::env;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match args::parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            args::print_usage();
            return ExitCode::FAILURE;
        }
    };

    if cli.help {
        args::print_usage();
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.list_functions {
        for (name, description) in functions() {
            println!("{:<18} {}", name, description);
        }
        return Ok(());
    }

    let (settings, warnings) = if cli.no_config {
        (config::Config::default(), Vec::new())
    } else {
        config::load_config(cli.config.as_deref())
    };
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let session_config = SessionConfig::new(
        cli.rows.or(settings.grid.rows).unwrap_or(SessionConfig::default().rows),
        cli.cols.or(settings.grid.cols).unwrap_or(SessionConfig::default().cols),
    );
    let mut session = Session::with_file(&session_config, cli.file.as_deref())
        .with_context(|| match &cli.file {
            Some(path) => format!("failed to open {}", path.display()),
            None => "failed to create session".to_string(),
        })?;

    if cli.verbose {
        session.subscribe(|n: &Notification| match n {
            Notification::CellChanged { cell, display: shown } => {
                tracing::debug!(cell = %cell, display = %shown, "cell changed")
            }
            Notification::GridReplaced { rows, cols } => {
                tracing::debug!(rows, cols, "grid replaced")
            }
        });
    }

    for action in &cli.actions {
        apply(&mut session, action)?;
    }

    if let Some(path) = &cli.output {
        let saved = session
            .save_as(path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        eprintln!("Saved to {}", saved.display());
    }

    if cli.print {
        print!("{}", table::render_table(&session));
    }

    if cli.chart {
        draw_chart(&session, &settings)?;
    }

    Ok(())
}

fn apply(session: &mut Session, action: &Action) -> anyhow::Result<()> {
    match action {
        Action::Set { label, content } => session
            .set_cell_label(label, content)
            .with_context(|| format!("cannot set {}", label))?,
        Action::Fill { anchor, range } => {
            let anchor = anchor
                .parse::<CellRef>()
                .with_context(|| format!("bad fill anchor '{}'", anchor))?;
            let range =
                Range::parse(range).with_context(|| format!("bad fill range '{}'", range))?;
            session
                .fill(anchor, range)
                .with_context(|| format!("cannot fill {}", range))?;
        }
        Action::Eval(formula) => {
            let outcome = session
                .submit_formula(formula)
                .with_context(|| format!("cannot evaluate {}", formula))?;
            println!("{}", outcome.message());
        }
        Action::Clear => session.clear(),
    }
    Ok(())
}

#[cfg(feature = "chart")]
fn draw_chart(session: &Session, settings: &config::Config) -> anyhow::Result<()> {
    let snapshot = cellflow_engine::chart::ChartSnapshot::from_grid(session.grid());
    match chart::render_chart(&snapshot, settings.chart.width, settings.chart.height) {
        Some(text) => println!("{}", text),
        None => println!("No numeric data to chart."),
    }
    Ok(())
}

#[cfg(not(feature = "chart"))]
fn draw_chart(_session: &Session, _settings: &config::Config) -> anyhow::Result<()> {
    anyhow::bail!("this build has no chart support (enable the `chart` feature)")
}
