use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use geoscope::config::Config;
use geoscope::lookup::{LookupPipeline, SearchController, SearchState, ViewModel};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Geoscope: where is this IP, and what time is it there?
///
/// Looks up an IP address (or a place name) via IP geolocation, enriches
/// it with country facts, and shows the local time.
///
/// Examples:
///   geoscope
///   geoscope 8.8.8.8
///   geoscope "Mountain View"
///   geoscope --json 1.1.1.1
///   geoscope --interactive
#[derive(Parser)]
#[command(name = "geoscope", version, about, long_about = None)]
struct Cli {
    /// IP address or place name. Omit to look up your own address.
    #[arg(index = 1, num_args = 0..)]
    query: Vec<String>,

    /// Read one search per line from stdin; newer searches replace older ones.
    #[arg(long, short = 'i', conflicts_with = "query")]
    interactive: bool,

    /// Print only the JSON view to stdout (one line per result when interactive).
    #[arg(long)]
    json: bool,

    /// Per-request timeout in seconds (overrides GEOSCOPE_TIMEOUT_SECS).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geoscope=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // ── Configuration ───────────────────────────────────────────

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    });
    let config = match cli.timeout {
        Some(secs) => config.with_timeout(Some(Duration::from_secs(secs))),
        None => config,
    };

    let pipeline = LookupPipeline::from_config(&config);

    // ── Interactive session ─────────────────────────────────────

    if cli.interactive {
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error: Cannot start async runtime: {}", e);
            std::process::exit(1);
        });
        if let Err(e) = runtime.block_on(interactive(pipeline, cli.json)) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // ── One-shot lookup ─────────────────────────────────────────

    let raw = cli.query.join(" ");
    match pipeline.run(&raw) {
        Ok(view) => print_view(&view, cli.json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_view(view: &ViewModel, json_only: bool) {
    let now = Utc::now();
    if !json_only {
        eprintln!("  \u{1F4CD} {}", view.place_line());
        eprint!("{}", view.render_text(now));
    }
    match serde_json::to_string_pretty(&view.snapshot_at(now)) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: Cannot encode view: {}", e),
    }
}

fn print_state(state: &SearchState, json_only: bool) {
    match state {
        SearchState::Idle => {}
        SearchState::Loading { seq, query } => eprintln!("  [#{}] Looking up {} ...", seq, query),
        SearchState::Success { view, .. } if json_only => {
            match serde_json::to_string(&view.snapshot_at(Utc::now())) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error: Cannot encode view: {}", e),
            }
        }
        SearchState::Success { seq, view } => {
            eprintln!("  [#{}] \u{1F4CD} {}", seq, view.place_line());
            eprint!("{}", view.render_text(Utc::now()));
        }
        SearchState::Failed { seq, error } if json_only => {
            eprintln!("  [#{}] Error: {}", seq, error);
            match serde_json::to_string(error) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error: Cannot encode error: {}", e),
            }
        }
        SearchState::Failed { seq, error } => eprintln!("  [#{}] Error: {}", seq, error),
    }
}

async fn interactive(pipeline: LookupPipeline, json_only: bool) -> std::io::Result<()> {
    let controller = SearchController::new(pipeline);
    // Subscribe before the first search so its commit is never marked seen.
    let mut updates = controller.subscribe();
    let mut newest = controller.search("");

    eprintln!("  Looking up your own address. Type an IP or a place (blank = own address, 'quit' to exit).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                    return Ok(());
                }
                newest = controller.search(line);
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                print_state(&updates.borrow_and_update().clone(), json_only);
            }
        }
    }

    // End of input: the newest search always commits, so wait for it.
    if let Err(e) = newest.await {
        eprintln!("Error: lookup task failed: {}", e);
    }
    if updates.has_changed().unwrap_or(false) {
        print_state(&updates.borrow_and_update().clone(), json_only);
    }
    Ok(())
}
