// src/main.rs
// =============================================================================
// Entry point of the indexguard CLI.
//
// What happens here:
// 1. Install logging (stderr, RUST_LOG, default "info")
// 2. Parse command-line arguments using clap
// 3. Dispatch to the subcommand handler
// 4. Exit with the proper code (0 = no fail findings, 1 = fail findings,
//    2 = error)
//
// stdout carries only the report, so it can be piped into other tools.
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use indexguard::findings::Severity;
use indexguard::net::GuardedHttpClient;
use indexguard::{AuditConfig, Auditor};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Audit {
            url,
            mode,
            ignore_robots,
            max_pages,
            compact,
        } => {
            let config = cli::audit_config(mode, ignore_robots, max_pages);
            handle_audit(&url, config, compact).await
        }
        Commands::Fetch { url } => handle_fetch(&url).await,
    }
}

// Runs the audit and prints the report as JSON
async fn handle_audit(url: &str, config: AuditConfig, compact: bool) -> Result<i32> {
    let auditor = Auditor::new(config);
    let report = auditor
        .run(url)
        .await
        .with_context(|| format!("audit of {url} failed"))?;

    let json = if compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", json);

    tracing::info!(
        fail = report.count(Severity::Fail),
        warning = report.count(Severity::Warning),
        info = report.count(Severity::Info),
        "summary"
    );

    Ok(if report.has_failures() { 1 } else { 0 })
}

// One guarded fetch, printed for humans
async fn handle_fetch(url: &str) -> Result<i32> {
    let config = AuditConfig::from_env();
    let client = GuardedHttpClient::from_config(&config);
    let response = client
        .fetch(url, config.max_html_bytes, config.max_redirects)
        .await
        .with_context(|| format!("fetch of {url} failed"))?;

    println!("Status:    {}", response.status);
    println!("Final URL: {}", response.final_url);

    if response.redirect_chain.is_empty() {
        println!("Redirects: none");
    } else {
        println!("Redirects:");
        for hop in &response.redirect_chain {
            println!("  {} {} -> {}", hop.status, hop.url, hop.location);
        }
    }

    println!("Headers:");
    for (name, value) in &response.headers {
        println!("  {:<28} {}", name, value);
    }
    println!("Body:      {} bytes", response.body.len());

    Ok(0)
}
