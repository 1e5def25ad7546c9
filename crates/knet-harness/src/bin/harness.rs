//! CLI entrypoint for the knet scenario harness, the Rust-native
//! analogue of `original_source/tests/knet_test.c`'s argv-driven test
//! selection.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use knet_harness::{ConformanceReport, FixtureSet, TestRunner, VerificationSummary};

#[derive(Debug, Parser)]
#[command(name = "knet-harness")]
#[command(about = "Scenario harness for knet-core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the built-in scenario fixtures and print a markdown report.
    Run {
        /// Write the report here instead of stdout.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Write the built-in fixture set to a JSON file.
    Capture {
        #[arg(long)]
        output: PathBuf,
    },
    /// Run a fixture JSON file and print a markdown report.
    Verify {
        #[arg(long)]
        fixture: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn emit_report(campaign: &str, fixture_set: &FixtureSet, report_path: Option<PathBuf>) {
    let runner = TestRunner::new(campaign);
    let results = runner.run(fixture_set);
    let summary = VerificationSummary::from_results(results);
    let report = ConformanceReport::new(campaign, summary).to_markdown();

    match report_path {
        Some(path) => fs::write(&path, report).expect("failed to write report"),
        None => print!("{report}"),
    }
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Run { report } => {
            emit_report("built-in", &FixtureSet::built_in(), report);
        }
        Command::Capture { output } => {
            let json = serde_json::to_string_pretty(&FixtureSet::built_in())
                .expect("fixture set is always serializable");
            fs::write(&output, json).expect("failed to write fixture file");
        }
        Command::Verify { fixture, report } => {
            let data = fs::read_to_string(&fixture).expect("failed to read fixture file");
            let fixture_set: FixtureSet =
                serde_json::from_str(&data).expect("fixture file is not valid JSON");
            emit_report(fixture.to_string_lossy().as_ref(), &fixture_set, report);
        }
    }
}
