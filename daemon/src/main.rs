//! AgeGate daemon: command-line entry point over the attempt log.

mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use agegate_store_lmdb::{
    check_data_dir, check_integrity, LmdbAttemptLogStore, LmdbEnvironment, DEFAULT_MAX_DBS,
};
use agegate_types::{parse_date, AttemptId, AttemptRecord, Candidate, Timestamp};
use agegate_utils::{init_logging, LogFormat};
use agegate_verification::{seed_if_empty, Verdict, VerificationEngine};

use crate::config::GateConfig;

#[derive(Parser)]
#[command(name = "agegate-daemon", about = "Age verification gate with attempt log")]
struct Cli {
    /// Data directory for the attempt log.
    #[arg(long, env = "AGEGATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "AGEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "AGEGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "AGEGATE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// LMDB map size in bytes.
    #[arg(long, env = "AGEGATE_MAP_SIZE")]
    map_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Evaluate one attempt, record it and print the verdict.
    Verify {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Date of birth as YYYY-MM-DD.
        #[arg(long)]
        dob: String,
    },
    /// Print the whole attempt history, sorted.
    List {
        #[arg(long, default_value = "SubmittedDateTime")]
        sort_field: String,
        /// Only "desc" sorts descending; anything else sorts ascending.
        #[arg(long, default_value = "desc")]
        sort_order: String,
    },
    /// Print one attempt by id.
    Show {
        #[arg(long)]
        id: u64,
    },
    /// Remove one attempt by id.
    Delete {
        #[arg(long)]
        id: u64,
    },
    /// Insert demonstration attempts into an empty log.
    Seed,
    /// Cross-check stored attempts against the failure index.
    Check,
}

/// File config as the base, CLI flags and env vars on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<GateConfig> {
    let mut config = match cli.config {
        Some(ref path) => GateConfig::from_toml_file(path)?,
        None => GateConfig::default(),
    };

    if let Some(ref data_dir) = cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(map_size) = cli.map_size {
        config.map_size = map_size;
    }
    config.validate()?;
    Ok(config)
}

fn open_environment(config: &GateConfig) -> anyhow::Result<LmdbEnvironment> {
    check_data_dir(&config.data_dir).map_err(anyhow::Error::msg)?;
    LmdbEnvironment::open(&config.data_dir, DEFAULT_MAX_DBS, config.map_size).with_context(|| {
        format!(
            "failed to open attempt log at {}",
            config.data_dir.display()
        )
    })
}

fn record_json(record: &AttemptRecord) -> serde_json::Value {
    json!({
        "id": record.id.as_u64(),
        "submitted_at": record.submitted_at.to_string(),
        "user_name": record.user_name,
        "email_address": record.email_address,
        "date_of_birth": record.date_of_birth.to_string(),
        "is_success": record.is_success,
        "is_locked_out": record.is_locked_out,
    })
}

fn verdict_json(verdict: &Verdict) -> serde_json::Value {
    json!({
        "id": verdict.id.as_u64(),
        "submitted_at": verdict.submitted_at.to_string(),
        "admitted": verdict.admitted(),
        "is_of_age": verdict.is_of_age,
        "is_locked_out": verdict.is_locked_out,
    })
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(
    command: Command,
    environment: &LmdbEnvironment,
    engine: &VerificationEngine<LmdbAttemptLogStore>,
) -> anyhow::Result<()> {
    match command {
        Command::Verify { name, email, dob } => {
            let date_of_birth = parse_date(&dob)?;
            let verdict =
                engine.evaluate_and_record_detailed(Candidate::new(name, email, date_of_birth))?;
            print_json(&verdict_json(&verdict))?;
        }
        Command::List {
            sort_field,
            sort_order,
        } => {
            let records = engine.list_sorted(&sort_field, &sort_order)?;
            let rows: Vec<_> = records.iter().map(record_json).collect();
            print_json(&serde_json::Value::Array(rows))?;
        }
        Command::Show { id } => {
            let record = engine
                .find_attempt(AttemptId::new(id))?
                .with_context(|| format!("attempt {id} not found"))?;
            print_json(&record_json(&record))?;
        }
        Command::Delete { id } => {
            if !engine.delete_attempt(AttemptId::new(id))? {
                anyhow::bail!("attempt {id} not found");
            }
            print_json(&json!({ "deleted": id }))?;
        }
        Command::Seed => {
            let inserted = seed_if_empty(engine.store(), Timestamp::now())?;
            tracing::info!(inserted, "seed finished");
            print_json(&json!({ "inserted": inserted }))?;
        }
        Command::Check => {
            let report = check_integrity(environment)?;
            print_json(&json!({
                "attempts_checked": report.attempts_checked,
                "index_entries_checked": report.index_entries_checked,
                "errors": report.errors,
            }))?;
            if !report.is_healthy() {
                anyhow::bail!("integrity check found {} error(s)", report.errors.len());
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    init_logging(config.log_format, &config.log_level);
    if let Some(ref path) = cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    let environment = open_environment(&config)?;
    let policy = config.lockout_policy();
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        window_secs = policy.window_secs,
        max_failed_attempts = policy.max_failed_attempts,
        "attempt log ready"
    );

    let engine = VerificationEngine::new(environment.attempt_log_store()).with_policy(policy);
    run(cli.command, &environment, &engine)
}
