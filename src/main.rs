//! Network Speed Tester - Main CLI Application
//!
//! Picks a test server, measures latency and jitter to it, then estimates
//! download and upload throughput.

use clap::Parser;
use network_speed_tester::{
    cli::Cli,
    config::{display_config_summary, load_config, EnvManager},
    error::{AppError, ErrorReporter, Result},
    models::Config,
    output::{format_report_json, OutputFormatterFactory, ReportFormatter},
    session::{Session, SessionEvent, SessionState},
    build_info, SpeedTest,
};
use std::io::Write;
use std::path::Path;
use std::process;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.is_env_command() {
        return run_env_command(&cli);
    }

    // Diagnostics go to stderr; stdout carries only the report
    if cli.debug {
        eprintln!("{}", build_info());
        eprintln!("Debug mode enabled");
        eprintln!();
    }

    let config = load_config(cli)?;

    if config.debug {
        eprintln!("Configuration Summary:");
        eprintln!("{}", display_config_summary(&config));
        eprintln!();
    }

    let speed_test = SpeedTest::from_config(&config)?;
    let formatter = OutputFormatterFactory::from_config(&config);

    if config.interactive {
        run_interactive(&speed_test, formatter.as_ref()).await
    } else {
        run_once(&speed_test, formatter.as_ref(), &config).await
    }
}

/// `.env` maintenance: help, example file, or a check of `./.env`
fn run_env_command(cli: &Cli) -> Result<()> {
    if cli.env_help {
        println!("{}", EnvManager::display_env_help());
        return Ok(());
    }

    if let Some(path) = &cli.write_env_example {
        EnvManager::save_example_env_file(path)?;
        println!("Example configuration written to {}", path.display());
        return Ok(());
    }

    match EnvManager::check_env_file(Path::new(".env"))? {
        None => println!("No .env file found"),
        Some(warnings) if warnings.is_empty() => println!(".env file is valid"),
        Some(warnings) => {
            for warning in &warnings {
                eprintln!("{}", warning);
            }
            return Err(AppError::config(format!("{} invalid entries in .env", warnings.len())));
        }
    }
    Ok(())
}

async fn run_once(speed_test: &SpeedTest, formatter: &dyn ReportFormatter, config: &Config) -> Result<()> {
    if !config.json_output {
        println!("{}", formatter.format_banner()?);
    }

    let report = speed_test.run_benchmark().await?;

    if config.json_output {
        println!("{}", format_report_json(&report)?);
    } else {
        print!("{}", formatter.format_report(&report)?);
    }
    Ok(())
}

/// Start/retry loop driven by lines read from stdin
async fn run_interactive(speed_test: &SpeedTest, formatter: &dyn ReportFormatter) -> Result<()> {
    println!("{}", formatter.format_banner()?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = Session::new();

    loop {
        match session.state() {
            SessionState::Exit => break,
            SessionState::Running => {
                match speed_test.run_benchmark().await {
                    Ok(report) => print!("{}", formatter.format_report(&report)?),
                    Err(e) => eprintln!("{}", formatter.format_failure(&e)?),
                }
                session.apply(SessionEvent::RunFinished);
            }
            state => {
                if let Some(prompt) = state.prompt() {
                    print!("{}: ", prompt);
                    std::io::stdout().flush()?;
                }
                let line = lines.next_line().await?;
                session.apply(SessionEvent::from_input(line.as_deref()));
            }
        }
    }

    Ok(())
}
