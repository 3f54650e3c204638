use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reconhub::export;
use reconhub::scanner::{DelayRange, ScanOutcome, Scanner};
use reconhub::server::{self, ServerConfig};
use reconhub::types::ScanResult;

/// reconhub — open-source recon demo: marketing pages and a simulated subdomain scanner.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reconhub",
    version,
    about = "Open-source recon demo: marketing pages and a simulated subdomain scanner dashboard.",
    long_about = None
)]
struct Cli {
    /// Address the web UI listens on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Directory holding the stylesheet and dashboard script served under /assets.
    #[arg(long, default_value = "ui")]
    assets: PathBuf,

    /// Shortest simulated delay between scan steps, in milliseconds.
    #[arg(long = "min-delay-ms", default_value_t = 300)]
    min_delay_ms: u64,

    /// Longest simulated delay between scan steps, in milliseconds.
    #[arg(long = "max-delay-ms", default_value_t = 800)]
    max_delay_ms: u64,

    /// Run one simulated scan in the terminal instead of serving the UI.
    #[arg(long)]
    scan: Option<String>,

    /// With --scan: write the results as CSV to this path.
    #[arg(long, requires = "scan")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "reconhub=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let delay = DelayRange::from_millis(cli.min_delay_ms, cli.max_delay_ms)?;

    if let Some(domain) = cli.scan.as_deref() {
        return run_terminal_scan(domain, delay, cli.output.as_deref()).await;
    }

    println!("reconhub configuration:");
    println!("  bind         : {}", cli.bind);
    println!("  assets       : {}", cli.assets.display());
    println!(
        "  step delay   : {}-{} ms",
        delay.min().as_millis(),
        delay.max().as_millis()
    );
    println!("UI server starting at http://{} (Ctrl+C to stop)", cli.bind);

    server::spawn_server(ServerConfig {
        bind: cli.bind,
        assets_dir: cli.assets,
        delay,
    })
    .await
}

async fn run_terminal_scan(domain: &str, delay: DelayRange, output: Option<&Path>) -> Result<()> {
    let scanner = Scanner::new(delay);
    let handle = scanner.start(domain).await?;
    println!("Scanning {}...", handle.ticket().domain());

    match handle.wait().await {
        ScanOutcome::Completed(item) => {
            let results = scanner.results().await;
            print_results_table(&results);
            println!("Found {} subdomains for {}", item.subdomain_count, item.domain);
            if let Some(path) = output {
                write_results_csv(path, &results)?;
                println!("Wrote CSV results to {}", path.display());
            }
        }
        ScanOutcome::Cancelled => println!("Scan cancelled"),
        ScanOutcome::Failed(e) => anyhow::bail!("scan of {domain} failed: {e}"),
    }
    Ok(())
}

fn print_results_table(results: &[ScanResult]) {
    let sub_w = results
        .iter()
        .map(|r| r.subdomain.len())
        .max()
        .unwrap_or(0)
        .max("subdomain".len());
    let status_w = "status".len();

    println!(
        "\n{:<sub_w$}  {:>status_w$}  {}",
        "subdomain",
        "status",
        "status_text",
        sub_w = sub_w,
        status_w = status_w
    );
    println!(
        "{:-<sub_w$}  {:-<status_w$}  {:-<11}",
        "",
        "",
        "",
        sub_w = sub_w,
        status_w = status_w
    );
    for r in results {
        println!(
            "{:<sub_w$}  {:>status_w$}  {}",
            r.subdomain,
            r.status,
            r.status_text,
            sub_w = sub_w,
            status_w = status_w
        );
    }
}

fn write_results_csv(path: &Path, results: &[ScanResult]) -> Result<()> {
    let csv = export::to_csv(results)?;
    fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
