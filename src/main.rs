mod geo;
mod navigation;
mod position;
mod replay;
mod routing;
mod web;

use clap::{Parser, Subcommand};
use replay::{Runner, Trace};
use std::fs;
use std::process::ExitCode;

use crate::web::Config;

#[derive(Parser)]
#[command(name = "navtrack")]
#[command(about = "Live navigation tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(short, long, default_value = "navtrack.yaml")]
        config: String,
    },
    /// Replay a position trace through the navigator
    Replay {
        trace: String,
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Validate a position trace file
    Validate { trace: String },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config),
        Commands::Replay { trace, config } => replay(&trace, config.as_deref()),
        Commands::Validate { trace } => validate(&trace),
    }
}

fn runtime() -> Option<tokio::runtime::Runtime> {
    match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => Some(rt),
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            None
        }
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            None
        }
    }
}

fn load_trace(path: &str) -> Option<Trace> {
    let yaml = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return None;
        }
    };

    match yaml.parse::<Trace>() {
        Ok(t) => Some(t),
        Err(e) => {
            eprintln!("Parse error: {}", e);
            None
        }
    }
}

fn serve(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let Some(rt) = runtime() else {
        return ExitCode::FAILURE;
    };

    match rt.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(trace) = load_trace(path) else {
        return ExitCode::FAILURE;
    };

    println!("Trace is valid ({} steps)", trace.steps.len());
    for (i, step) in trace.steps.iter().enumerate() {
        let time_str = match &step.time {
            Some(t) => format!("{:?}", t),
            None => "immediate".to_string(),
        };
        println!("  {}: {} @ {}", i + 1, step.action.name(), time_str);
    }
    ExitCode::SUCCESS
}

fn replay(path: &str, config_path: Option<&str>) -> ExitCode {
    let Some(trace) = load_trace(path) else {
        return ExitCode::FAILURE;
    };
    let config = match config_path {
        Some(p) => match load_config(p) {
            Some(c) => c,
            None => return ExitCode::FAILURE,
        },
        None => Config::default(),
    };
    let Some(rt) = runtime() else {
        return ExitCode::FAILURE;
    };

    println!("Replaying {} ({} steps)", path, trace.steps.len());
    let runner = Runner::new(trace, config.navigation, config.routing);
    let report = rt.block_on(runner.run());

    for (i, e) in &report.rejected {
        println!("  step {} rejected: {}", i + 1, e);
    }
    println!(
        "Replay completed: {} steps, {} events, {} rejected",
        report.steps,
        report.events.len(),
        report.rejected.len()
    );
    ExitCode::SUCCESS
}
