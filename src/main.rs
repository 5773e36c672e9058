use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use vinefeeder::{Mode, Outcome, ProgressEvent, ResolveRequest, ServiceKind, Settings, run};

#[derive(Parser)]
#[command(name = "vinefeeder")]
#[command(about = "Find series and episodes on streaming services and download them with devine", long_about = None)]
struct Cli {
    /// Streaming service to use
    #[arg(value_enum, ignore_case = true)]
    service: ServiceKind,

    /// How to interpret the term: keyword, direct, greedy, category (or 3, 1, 0, 2)
    #[arg(value_parser = parse_mode)]
    mode: Mode,

    /// Search text, or a URL for the direct, greedy and category modes
    term: String,

    /// Category name shown when browsing a listing
    #[arg(long)]
    category: Option<String>,

    /// Passthrough flags for the downloader, e.g. "--quality 1080"
    #[arg(short, long, allow_hyphen_values = true)]
    options: Option<String>,

    /// Settings file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    value.parse()
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Searching { service, query } => {
            println!("Searching {} for '{}'...", service, query);
        }
        ProgressEvent::SeriesFound { count } => {
            println!("Found {} series\n", count);
        }
        ProgressEvent::NoMatches { query } => {
            println!("No matches for '{}'.", query);
        }
        ProgressEvent::NoValidData { stage, reason } => {
            println!("No valid data during {}: {}", stage, reason);
        }
        ProgressEvent::RecordSkipped { .. } => {
            // Logged by the library; nothing to show
        }
        ProgressEvent::EpisodesCollected { series, count } => {
            println!("Found {} episode(s) for '{}'\n", count, series);
        }
        ProgressEvent::NothingSelected => {
            println!("Nothing selected.");
        }
        ProgressEvent::MissingUrl { label } => {
            println!("Warning: no URL found for '{}', skipping", label);
        }
        ProgressEvent::Dispatching { url } => {
            println!("Downloading {}", url);
        }
        ProgressEvent::DispatchFailed { url, reason } => {
            eprintln!("Could not download {}: {}", url, reason);
        }
        ProgressEvent::Finished { dispatched } => {
            if dispatched > 0 {
                println!("\nDone! Handed {} download(s) to the downloader.", dispatched);
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "vinefeeder=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Some(options) = cli.options {
        settings.override_options(options);
    }

    let mut request = ResolveRequest::new(cli.mode, cli.term);
    if let Some(category) = cli.category {
        request = request.with_category(category);
    }

    match run(cli.service, &request, &settings, handle_progress_event) {
        Ok(Outcome::Aborted { .. }) => process::exit(2),
        Ok(_) => {}
        Err(e) => {
            eprintln!("\nError: {}", e);
            process::exit(1);
        }
    }
}
