//! Vigil CLI - edit the supervisor configuration and check daemon status
//!
//! Thin shim over the shared config file; all supervision logic lives in
//! the daemon.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use sysinfo::System;
use tabled::{Table, Tabled};

use vigil_core::config::SupervisorConfig;
use vigil_core::domain::HeavyProcessRule;

const DAEMON_PROCESS_NAME: &str = "vigild";

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Vigil process supervisor CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, env = "VIGIL_CONFIG", default_value = "vigil.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List monitored heavy processes and the current settings
    List,

    /// Add a heavy process to monitor
    Add {
        /// OS process-name fragment to match (case-insensitive)
        process: String,

        /// Display name (defaults to the process fragment)
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove a heavy process by name or 1-based index
    Remove {
        /// Display name or index from `vigil list`
        name: String,
    },

    /// Change the process fragment of an existing entry
    Edit {
        /// Display name or index from `vigil list`
        name: String,

        /// New process-name fragment
        process: String,
    },

    /// Set the poll interval in seconds
    Interval {
        /// Seconds between polls (at least 1)
        secs: u64,
    },

    /// Remove all monitored heavy processes
    Clear,

    /// Show whether the daemon is running
    Status,
}

#[derive(Tabled)]
struct RuleRow {
    id: usize,
    name: String,
    process: String,
}

fn load_config(path: &Path) -> Result<SupervisorConfig> {
    if !path.exists() {
        return Ok(SupervisorConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("Invalid config in {}", path.display()))
}

fn save_config(path: &Path, config: &SupervisorConfig) -> Result<()> {
    let raw = serde_yaml::to_string(config).context("Failed to serialize config")?;
    std::fs::write(path, raw).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Resolve a rule by display name or 1-based index
fn find_rule(rules: &[HeavyProcessRule], key: &str) -> Option<usize> {
    if let Ok(id) = key.parse::<usize>() {
        if (1..=rules.len()).contains(&id) {
            return Some(id - 1);
        }
    }
    rules.iter().position(|r| r.name == key)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            let config = load_config(&cli.config)?;

            if config.heavy_processes.is_empty() {
                println!("{}", "No heavy processes monitored".yellow());
            } else {
                let rows: Vec<RuleRow> = config
                    .heavy_processes
                    .iter()
                    .enumerate()
                    .map(|(i, r)| RuleRow {
                        id: i + 1,
                        name: r.name.clone(),
                        process: r.process.clone(),
                    })
                    .collect();
                println!("{}", Table::new(rows));
            }

            println!();
            println!(
                "poll interval: {}s  ram threshold: {}%  ram safe: {}%",
                config.poll_interval_secs, config.ram_threshold, config.ram_safe
            );
        }

        Commands::Add { process, name } => {
            let mut config = load_config(&cli.config)?;
            let name = name.unwrap_or_else(|| process.clone());

            if config.heavy_processes.iter().any(|r| r.name == name) {
                anyhow::bail!("'{name}' is already monitored");
            }

            config
                .heavy_processes
                .push(HeavyProcessRule::new(name.clone(), process));
            save_config(&cli.config, &config)?;
            println!("{}", format!("✓ '{name}' added").green().bold());
        }

        Commands::Remove { name } => {
            let mut config = load_config(&cli.config)?;
            let idx = find_rule(&config.heavy_processes, &name)
                .with_context(|| format!("'{name}' not found"))?;

            let removed = config.heavy_processes.remove(idx);
            save_config(&cli.config, &config)?;
            println!("{}", format!("✓ '{}' removed", removed.name).green().bold());
        }

        Commands::Edit { name, process } => {
            let mut config = load_config(&cli.config)?;
            let idx = find_rule(&config.heavy_processes, &name)
                .with_context(|| format!("'{name}' not found"))?;

            config.heavy_processes[idx].process = process.clone();
            save_config(&cli.config, &config)?;
            println!(
                "{}",
                format!(
                    "✓ '{}' now matches '{process}'",
                    config.heavy_processes[idx].name
                )
                .green()
                .bold()
            );
        }

        Commands::Interval { secs } => {
            if secs == 0 {
                anyhow::bail!("interval must be at least 1 second");
            }
            let mut config = load_config(&cli.config)?;
            config.poll_interval_secs = secs;
            save_config(&cli.config, &config)?;
            println!(
                "{}",
                format!("✓ poll interval set to {secs}s").green().bold()
            );
        }

        Commands::Clear => {
            let mut config = load_config(&cli.config)?;
            if config.heavy_processes.is_empty() {
                println!("{}", "Nothing to clear".yellow());
            } else {
                let count = config.heavy_processes.len();
                config.heavy_processes.clear();
                save_config(&cli.config, &config)?;
                println!("{}", format!("✓ {count} entries removed").green().bold());
            }
        }

        Commands::Status => {
            let mut sys = System::new();
            sys.refresh_processes();
            let pids: Vec<u32> = sys
                .processes_by_name(DAEMON_PROCESS_NAME)
                .map(|p| p.pid().as_u32())
                .collect();

            if pids.is_empty() {
                println!("{}", "● vigild is not running".red());
            } else {
                println!("{}", "● vigild is running".green().bold());
                for pid in pids {
                    println!("  pid: {pid}");
                }
            }
        }
    }

    Ok(())
}
