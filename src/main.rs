//! CLI for c2d-receipt
//!
//! Subcommands:
//! - `run`: provision devices on the loopback hub and run the receive scenarios
//! - `settings`: print the effective settings

use std::process::ExitCode;
use std::sync::Arc;

use c2d_receipt::config::{load_config, load_credential};
use c2d_receipt::message::Protocol;
use c2d_receipt::scenario::{ReceiveSuite, SuiteReport};
use c2d_receipt::transport::LoopbackHub;
use c2d_receipt::utils::{HarnessError, logging};
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "c2d-receipt")]
enum Command {
    /// Run the receive scenarios
    Run {
        /// Protocols to exercise (default: all)
        #[arg(long = "protocol", value_parser = parse_protocol)]
        protocols: Vec<Protocol>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective settings
    Settings,
}

fn parse_protocol(value: &str) -> Result<Protocol, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = Command::parse();

    match execute(cmd).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            // logging may not be up yet when settings fail to load
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cmd: Command) -> Result<bool, HarnessError> {
    let settings = load_config()?;
    logging::init(&settings.suite.log_level);

    match cmd {
        Command::Settings => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(true)
        }
        Command::Run { protocols, json } => {
            let credential = load_credential()?;
            let hub = Arc::new(LoopbackHub::from_credential(&credential));
            info!(hub = hub.name(), "starting receive suite");

            let protocols = if protocols.is_empty() {
                Protocol::ALL.to_vec()
            } else {
                protocols
            };

            let suite = ReceiveSuite::new(hub.clone(), hub.clone(), hub, &settings);
            let report = suite.execute(&protocols).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&report);
            }
            Ok(report.all_passed())
        }
    }
}

fn print_summary(report: &SuiteReport) {
    println!("run {}", report.run_id);
    for scenario in &report.scenarios {
        let detail = scenario
            .detail
            .as_deref()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        println!(
            "  {:<6} {:<16} {:>6} ms  {}{}",
            scenario.protocol,
            format!("{:?}", scenario.result),
            scenario.elapsed_ms,
            scenario.result.description(),
            detail
        );
    }
}
