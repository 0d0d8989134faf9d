use std::path::PathBuf;
use std::time::Instant;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use probe_worker::config::load_config;
use probe_worker::health::HealthState;
use probe_worker::probe::ProberRegistry;
use probe_worker::scheduler::plan;

#[derive(Parser)]
#[command(name = "probe-cli")]
#[command(about = "Inspect and exercise a probe-worker configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which targets a configuration would schedule
    Validate {
        #[arg(default_value = "config.json")]
        config: PathBuf,
    },
    /// Probe every target once and print the outcomes
    Probe {
        #[arg(default_value = "config.json")]
        config: PathBuf,
    },
}

#[derive(Serialize)]
struct ProbeResult {
    identity: String,
    state: &'static str,
    elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let registry = ProberRegistry::with_defaults();

    match cli.command {
        Commands::Validate { config } => {
            let config = load_config(&config)?;
            let (probers, skipped) = plan(&registry, &config);
            let identities: Vec<&str> = probers.iter().map(|p| p.identity()).collect();

            let report = json!({
                "interval_secs": config.interval,
                "probe_timeout_secs": config.probe_timeout().as_secs(),
                "storage": config.storage.kind,
                "scheduled": identities,
                "skipped": skipped,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Probe { config } => {
            let config = load_config(&config)?;
            let (probers, skipped) = plan(&registry, &config);
            for entry in &skipped {
                eprintln!("skipped #{} ({} {}): {}", entry.index, entry.kind, entry.host, entry.reason);
            }

            let timeout = config.probe_timeout();
            let checks = probers.into_iter().map(|prober| async move {
                let started = Instant::now();
                let outcome = prober.check(tokio::time::Instant::now() + timeout).await;
                ProbeResult {
                    identity: prober.identity().to_string(),
                    state: HealthState::from(&outcome).as_str(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    error: outcome.err().map(|e| e.to_string()),
                }
            });

            let mut handles = Vec::new();
            for check in checks {
                handles.push(tokio::spawn(check));
            }
            let mut results = Vec::with_capacity(handles.len());
            for handle in handles {
                results.push(handle.await?);
            }

            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
