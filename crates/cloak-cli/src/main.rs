//! Cloak — reversible anonymization around an external summarizer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use cloak_core::CloakConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cases;
mod routes;
mod state;

use state::AppState;

fn read_input(args: &[String], command: &str) -> anyhow::Result<String> {
    let path = args
        .get(2)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("Usage: cloak {} <file>", command))?;
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_help() {
    println!("Cloak — anonymize, summarize, restore");
    println!();
    println!("Usage: cloak <command> [args]");
    println!();
    println!("Commands:");
    println!("  detect <file>        Print detected spans as JSON");
    println!("  anonymize <file>     Print redacted text and placeholder map as JSON");
    println!("  summarize <file>     Run the full cycle through the configured LLM");
    println!("  cases <cases.json>   Run a batch of cases and compare with expected summaries");
    println!("  serve                Start the HTTP server");
    println!("  help                 Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    if matches!(command, "--help" | "-h" | "help") {
        print_help();
        return Ok(());
    }

    let config = CloakConfig::from_env()?;

    match command {
        "detect" => {
            let text = read_input(&args, command)?;
            let adapter = cloak_detect::create_adapter(&config);
            let spans = adapter.detect(&text, &config.default_language)?;
            print_json(&spans)?;
        }
        "anonymize" => {
            let text = read_input(&args, command)?;
            let adapter = cloak_detect::create_adapter(&config);
            let anonymized = cloak_runtime::anonymize(&adapter, &text, &config.default_language)?;
            print_json(&anonymized)?;
        }
        "summarize" => {
            let text = read_input(&args, command)?;
            let state = AppState::new(config);
            let outcome = state.pipeline()?.process(&text).await?;
            print_json(&outcome)?;
        }
        "cases" => {
            let path = args
                .get(2)
                .map(PathBuf::from)
                .ok_or_else(|| anyhow::anyhow!("Usage: cloak cases <cases.json>"))?;
            let cases = cases::load_cases(&path)?;
            let state = AppState::new(config);
            let results = cases::run_cases(state.pipeline()?, &cases).await;
            cases::print_report(&results);
            std::process::exit(if cases::all_ok(&results) { 0 } else { 1 });
        }
        "serve" => {
            let port = config.port;
            let state = Arc::new(AppState::new(config));
            let app = routes::build_router(state);

            let addr = format!("0.0.0.0:{}", port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Cloak server listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        other => {
            eprintln!("Unknown command: {}. Use 'cloak help' for usage.", other);
            std::process::exit(1);
        }
    }

    Ok(())
}
