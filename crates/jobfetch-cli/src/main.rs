use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use jobfetch::config::{
    DEFAULT_COOKIE_FILE, DEFAULT_MAX_RETRIES, DEFAULT_OUTPUT_DIR, DEFAULT_RETRY_DELAY_SECS,
    DEFAULT_URL,
};
use jobfetch::loading::{LoadingEvent, LoadingState};
use jobfetch::report::{error_payload, success_payload};
use jobfetch::{JobPipeline, OutputMode, PipelineError, Settings};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "jobfetch")]
#[command(about = "Fetch a LinkedIn job posting and extract structured job data", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(long, help = "LinkedIn job URL to fetch (prompted for when omitted)")]
    url: Option<String>,

    #[arg(
        long = "output",
        value_name = "DIR",
        env = "JOBFETCH_OUTPUT_DIR",
        default_value = DEFAULT_OUTPUT_DIR,
        help = "Directory for the saved HTML and JSON files"
    )]
    output_dir: PathBuf,

    #[arg(
        long,
        conflicts_with = "integration_mode",
        help = "Output job data as JSON to stdout without additional text"
    )]
    json_output: bool,

    #[arg(long, help = "Output in format optimized for job tracker integration")]
    integration_mode: bool,

    #[arg(
        long,
        value_name = "PATH",
        env = "JOBFETCH_COOKIE_FILE",
        default_value = DEFAULT_COOKIE_FILE,
        help = "JSON file of cookies exported from a logged-in browser session"
    )]
    cookie_file: PathBuf,

    #[arg(
        long,
        env = "JOBFETCH_DEFAULT_URL",
        default_value = DEFAULT_URL,
        help = "URL used when the prompt is left empty"
    )]
    default_url: String,

    #[arg(
        long,
        env = "JOBFETCH_MAX_RETRIES",
        default_value_t = DEFAULT_MAX_RETRIES,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Maximum number of fetch attempts"
    )]
    max_retries: u32,

    #[arg(
        long,
        value_name = "SECS",
        env = "JOBFETCH_RETRY_DELAY",
        default_value_t = DEFAULT_RETRY_DELAY_SECS,
        help = "Seconds to wait between fetch attempts"
    )]
    retry_delay: u64,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn prompt_for_url(default_url: &str, mode: OutputMode) -> String {
    eprint!("Enter the LinkedIn job URL to fetch: ");
    let _ = io::stderr().flush();

    let mut line = String::new();
    if let Err(e) = io::stdin().read_line(&mut line) {
        log::warn!("Could not read URL from stdin: {}", e);
    }

    let url = line.trim();
    if !url.is_empty() {
        return url.to_string();
    }
    if mode == OutputMode::Text {
        println!("Using default URL: {}", default_url);
    }
    default_url.to_string()
}

fn print_loading_event(event: &LoadingEvent) {
    match event {
        LoadingEvent::Started { message } | LoadingEvent::MessageChanged { message } => {
            eprintln!("... {}", message)
        }
        LoadingEvent::Stopped => eprintln!("... done"),
    }
}

fn report_error(mode: OutputMode, error: &PipelineError) {
    match error_payload(mode, error) {
        Some(payload) => print_json(&payload),
        None => {
            println!("\nError: {}", error);
            if let Some(hint) = error.hint() {
                println!("{}", hint);
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let mode = OutputMode::from_flags(cli.json_output, cli.integration_mode);

    let settings = Settings {
        cookie_file: cli.cookie_file,
        output_dir: cli.output_dir,
        default_url: cli.default_url,
        max_retries: cli.max_retries,
        retry_delay: Duration::from_secs(cli.retry_delay),
    }
    .validate()
    .unwrap_or_else(|e| {
        log::error!("Invalid args: {e}");
        process::exit(1);
    });

    let url = match cli.url {
        Some(url) => url,
        None => prompt_for_url(&settings.default_url, mode),
    };

    let mut pipeline = JobPipeline::new(settings, mode).unwrap_or_else(|e| {
        log::error!("Error creating HTTP client: {}", e);
        process::exit(1);
    });

    let mut loading = LoadingState::new("Loading...");
    if mode == OutputMode::Text {
        loading.subscribe(print_loading_event);
        loading.attach();
    }

    loading.start(Some("Fetching job page..."));
    let result = pipeline.run(&url).await;
    loading.stop();

    match result {
        Ok(outcome) => match success_payload(mode, &outcome) {
            Some(payload) => print_json(&payload),
            None => {
                println!("\n{}", outcome);
                print!("{}", pipeline.stats().summary());
            }
        },
        Err(e) => {
            report_error(mode, &e);
            process::exit(1);
        }
    }
}
