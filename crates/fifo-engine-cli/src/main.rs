mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::path::Path;
use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use fifo_engine_core::scheduler::{ScheduleJob, ScheduleMode};
use fifo_engine_core::{AppConfig, Engine, Granularity};
use progress::CliReporter;
use tracing::error;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match fifo_engine_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let command = match args.command {
        Some(command) => command,
        None => {
            let _ = Cli::command().print_long_help();
            return Ok(());
        }
    };

    if let Commands::PrintConfig = command {
        println!("Configuration: {:?}", config);
        return Ok(());
    }

    let engine = Engine::open(&config.db_path)?;
    let granularity = Granularity::try_from(config.granularity).unwrap_or(Granularity::AssetIndexCategory);
    let root = Path::new(&config.root_path);

    let result = match command {
        Commands::Cycle => run_cycle(&engine, &config, root, granularity),
        Commands::Scan => run_scan(&engine, root, granularity),
        Commands::Forecast => run_forecast(&engine, &config, root, granularity),
        Commands::Status { json } => run_status(&engine, json),
        Commands::Cleanup { yes } => run_cleanup(&engine, &config, root, granularity, yes),
        Commands::Generate { size_gb } => run_generate(&engine, root, size_gb),
        Commands::GenerateDay { size_mb, offset } => {
            run_generate_day(&engine, root, size_mb, offset)
        }
        Commands::Schedule { at, every_minutes } => {
            run_schedule(&engine, &config, root, granularity, at, every_minutes)
        }
        Commands::Weights { days } => run_weights(&engine, days),
        Commands::Logs { limit } => run_logs(&engine, limit),
        Commands::PrintConfig => unreachable!("handled above"),
    };

    if let Err(err) = result {
        error!("Error: {}", err);
    }

    engine.shutdown();
    Ok(())
}

fn run_cycle(
    engine: &Engine,
    config: &AppConfig,
    root: &Path,
    granularity: Granularity,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = engine.execute_full(root, granularity, config.limit_mb)?;

    println!();
    println!(
        "Current: {}  Predicted: {}  Growth: {}",
        format!("{:.2} MB", report.current_mb).green(),
        format!("{:.2} MB", report.predicted_mb).cyan(),
        format!("{:+.2} MB/day", report.growth_rate).cyan(),
    );
    println!(
        "Usage: {} of {} MB limit -> action {}",
        format!("{:.1}%", report.usage_pct).yellow(),
        report.limit_mb,
        format!("{:?}", report.action).red(),
    );
    if report.files_deleted > 0 {
        println!(
            "Cleanup freed {} across {} files",
            format!("{:.2} MB", report.mb_freed).red(),
            report.files_deleted,
        );
    }
    println!("History days: {}", report.history_days);
    Ok(())
}

fn run_scan(
    engine: &Engine,
    root: &Path,
    granularity: Granularity,
) -> Result<(), Box<dyn std::error::Error>> {
    let totals = engine.scan(root, granularity)?;
    println!(
        "Scanned {}: {} files, {}",
        root.display(),
        format!("{}", totals.total_files).green(),
        format!("{:.2} MB", totals.total_mb).green(),
    );
    Ok(())
}

fn run_forecast(
    engine: &Engine,
    config: &AppConfig,
    root: &Path,
    granularity: Granularity,
) -> Result<(), Box<dyn std::error::Error>> {
    engine.scan(root, granularity)?;
    let forecast = engine.forecast()?;
    println!(
        "Tomorrow: {} (growth {}, {} days of history)",
        format!("{:.2} MB", forecast.predicted_mb).cyan(),
        format!("{:+.2} MB/day", forecast.growth_rate).cyan(),
        forecast.days_available,
    );

    if config.limit_mb > 0.0 {
        let eval = engine.evaluate(config.limit_mb);
        println!(
            "Against the {} MB limit: {} ({:.1}% projected)",
            config.limit_mb,
            format!("{:?}", eval.action).yellow(),
            eval.projected_pct,
        );
        if eval.amount_to_delete_mb > 0.0 {
            println!(
                "Cleanup would target {}",
                format!("{:.2} MB", eval.amount_to_delete_mb).red(),
            );
        }
    }
    Ok(())
}

fn run_status(engine: &Engine, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let status = engine.status()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "Scheduler: {}",
        if status.is_scheduled {
            "running".green()
        } else {
            "stopped".red()
        },
    );
    println!(
        "Schedule: daily at {:02}:{:02}",
        status.schedule_hour, status.schedule_minute,
    );
    println!("Last run: {}", or_dash(&status.last_run));
    println!("Next run: {}", or_dash(&status.next_run));
    println!(
        "Current: {:.2} MB  Predicted: {:.2} MB",
        status.current_mb, status.predicted_mb,
    );
    Ok(())
}

fn run_cleanup(
    engine: &Engine,
    config: &AppConfig,
    root: &Path,
    granularity: Granularity,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let totals = engine.scan(root, granularity)?;
    let amount = totals.total_mb - config.limit_mb * config.target_pct;
    if amount <= 0.0 {
        println!(
            "Usage {:.2} MB is already at or below the target; nothing to delete.",
            totals.total_mb,
        );
        return Ok(());
    }

    if !yes {
        let prompt = format!(
            "PERMANENTLY delete the oldest files to free about {:.2} MB?",
            amount,
        );
        if !prompt_confirm(&prompt, Some(false))? {
            process::exit(0);
        }
    }

    let outcome = engine.cleanup(config.limit_mb, config.target_pct)?;
    println!(
        "Deleted {} files, freed {} -> usage now {} ({:.1}%)",
        format!("{}", outcome.files_deleted).red(),
        format!("{:.2} MB", outcome.mb_freed).red(),
        format!("{:.2} MB", outcome.new_usage_mb).green(),
        outcome.new_usage_pct,
    );
    Ok(())
}

fn run_generate(
    engine: &Engine,
    root: &Path,
    size_gb: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let reporter = CliReporter::new();
    engine.generate_test_data(root, size_gb, &reporter)?;
    println!(
        "Generated a {:.2} GB synthetic archive under {}",
        size_gb,
        root.display(),
    );
    Ok(())
}

fn run_generate_day(
    engine: &Engine,
    root: &Path,
    size_mb: f64,
    offset: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let reporter = CliReporter::new();
    engine.generate_one_day(root, size_mb, offset, &reporter)?;
    println!("Generated {:.2} MB of data for day offset {}", size_mb, offset);
    Ok(())
}

fn run_schedule(
    engine: &Engine,
    config: &AppConfig,
    root: &Path,
    granularity: Granularity,
    at: Option<String>,
    every_minutes: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mode = if let Some(minutes) = every_minutes {
        ScheduleMode::Interval { minutes }
    } else if let Some(at) = at {
        let (hour, minute) = parse_hhmm(&at).ok_or("expected --at HH:MM")?;
        ScheduleMode::Daily { hour, minute }
    } else {
        // Fall back to the persisted schedule time.
        let status = engine.status()?;
        ScheduleMode::Daily {
            hour: status.schedule_hour,
            minute: status.schedule_minute,
        }
    };

    engine.schedule_start(ScheduleJob {
        root_path: root.to_path_buf(),
        granularity,
        limit_mb: config.limit_mb,
        target_pct: config.target_pct,
        mode,
    })?;

    let status = engine.status()?;
    println!(
        "Scheduler {} - next run at {}. Press Enter to stop.",
        "running".green(),
        or_dash(&status.next_run),
    );
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    engine.schedule_stop()?;
    println!("Scheduler {}", "stopped".red());
    Ok(())
}

fn run_weights(engine: &Engine, days: u32) -> Result<(), Box<dyn std::error::Error>> {
    let weights = engine.weights(days)?;
    if weights.is_empty() {
        println!("No history in the last {} days.", days);
        return Ok(());
    }
    println!(
        "{:<16} {:>5} {:>3} {:>12} {:>12} {:>6}",
        "ASSET", "INDEX", "CAT", "AVG MB", "TOTAL MB", "DAYS",
    );
    for w in &weights {
        println!(
            "{:<16} {:>5} {:>3} {:>12.2} {:>12.2} {:>6}",
            w.asset, w.index_val, w.category, w.avg_mb, w.total_mb, w.day_count,
        );
    }
    Ok(())
}

fn run_logs(engine: &Engine, limit: u32) -> Result<(), Box<dyn std::error::Error>> {
    let logs = engine.deletion_logs(limit)?;
    if logs.is_empty() {
        println!("Deletion ledger is empty.");
        return Ok(());
    }
    for log in &logs {
        println!(
            "{}  {:>10}  {:<20} {}",
            log.deleted_at,
            format!("{:.2} MB", log.size_mb).red(),
            log.reason,
            log.file_path,
        );
    }
    Ok(())
}

fn parse_hhmm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
