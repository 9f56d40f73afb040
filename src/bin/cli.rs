//! Command-line interface for the SBML translator
//!
//! Reads an SBML file, translates it into a reaction network and reports the result:
//! - A table of the created compartments, pools, reactions and functions
//! - The diagnostics collected during translation
//! - Optionally, the whole network as JSON
//!
//! # Usage
//!
//! ```bash
//! # Translate a model and print its summary
//! sbml-chemnet model.xml
//!
//! # Load under a different path, skip validation and dump the network
//! sbml-chemnet model.xml --path /cell --no-validate --json network.json
//! ```

use std::{fs::File, path::PathBuf, process::ExitCode};

use clap::Parser;
use colored::Colorize;
use sbml_chemnet::prelude::*;
use tabled::{builder::Builder, settings::Style};

/// Main CLI configuration struct
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SBML document
    file: PathBuf,

    /// Folder chain the model is created under
    #[arg(short, long, default_value = "/model")]
    path: String,

    /// Skip the consistency check before translating
    #[arg(long)]
    no_validate: bool,

    /// Solver recorded when the model does not name one
    #[arg(long, default_value = "ee")]
    solver: String,

    /// Write the translated network as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,
}

/// Main entry point for the CLI application
pub fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let options = match ReadOptionsBuilder::default()
        .load_path(cli.path.as_str())
        .validate(!cli.no_validate)
        .solver(cli.solver.as_str())
        .build()
    {
        Ok(options) => options,
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let translation = match read_sbml(&cli.file, &options) {
        Ok(translation) => translation,
        Err(failure) => {
            print_diagnostics(&failure.diagnostics);
            eprintln!("{} {}", "error:".red().bold(), failure.error);
            return ExitCode::FAILURE;
        }
    };

    println!("{translation}");
    println!("{}", summary_table(&translation.network.summary(translation.root)));
    print_diagnostics(&translation.diagnostics);

    if let Some(path) = &cli.json {
        let written = File::create(path)
            .map_err(|error| error.to_string())
            .and_then(|file| {
                serde_json::to_writer_pretty(file, &translation.network)
                    .map_err(|error| error.to_string())
            });
        if let Err(error) = written {
            eprintln!(
                "{} failed to write {}: {error}",
                "error:".red().bold(),
                path.display()
            );
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

fn summary_table(summary: &NetworkSummary) -> String {
    let rows = [
        ("Compartments", summary.compartments),
        ("Pools", summary.pools),
        ("Buffered pools", summary.buffered_pools),
        ("Reactions", summary.reactions),
        ("MM enzymes", summary.mm_enzymes),
        ("Enzymes", summary.enzymes),
        ("Channels", summary.channels),
        ("Functions", summary.functions),
        ("Plot tables", summary.tables),
    ];

    let mut builder = Builder::default();
    builder.push_record(vec!["Class".to_string(), "Count".to_string()]);
    for (class, count) in rows {
        builder.push_record(vec![class.to_string(), count.to_string()]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        let severity = diagnostic.severity.colored();
        eprintln!("{severity} [{}] {}", diagnostic.stage, diagnostic.message);
    }
}
