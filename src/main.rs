use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

mod classifier;
mod config;
mod error;
mod gmail_client;
mod mailbox;
mod normalizer;
mod oracle;
mod triage;

use classifier::Category;
use config::Config;
use gmail_client::GmailClient;
use oracle::GeminiOracle;
use triage::{TriageEngine, TriageReport};

#[derive(Parser)]
#[command(name = "mailtriage")]
#[command(about = "Gmail storage cleanup assistant: classify recent emails and trash the disposable ones")]
#[command(version = "0.1.0")]
struct Args {
    /// Dry-run mode: analyze and report without ever deleting
    #[arg(short, long)]
    dry_run: bool,

    /// Skip the interactive confirmation prompt before deletion
    #[arg(short, long)]
    yes: bool,

    /// Number of most-recent emails to analyze (default: 10)
    #[arg(short = 'l', long)]
    limit: Option<usize>,

    /// Check the configuration without connecting
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load the .env file if present
    dotenv::dotenv().ok();

    let args = Args::parse();

    env_logger::init();

    if args.dry_run {
        info!("🧪 Starting mailtriage in DRY-RUN mode");
    } else {
        info!("🚀 Starting mailtriage");
    }

    let mut config = Config::new()?;

    if args.check_config {
        println!("✅ Configuration valid!");
        println!("📧 Gmail API OAuth2");
        println!("🔑 Credentials: {}", config.gmail.credentials_path);
        println!("💾 Token cache: {}", config.gmail.token_cache_path);
        println!("🤖 Gemini model: {}", config.oracle.model);
        println!("📏 Batch limit: {} emails, content cap: {} chars",
                 config.triage.batch_limit, config.triage.content_max_chars);
        return Ok(());
    }

    if let Some(limit) = args.limit {
        config.triage.batch_limit = limit;
    }

    warn!(
        "⚠️ For cost control, analyzing only the {} most recent emails",
        config.triage.batch_limit
    );

    let mailbox = GmailClient::new(&config.gmail)
        .await
        .context("Unable to connect to the Gmail API")?;
    let oracle = GeminiOracle::new(&config.oracle)
        .context("Unable to initialize the Gemini client")?;

    let engine = TriageEngine::new(mailbox, oracle, config.triage.clone());

    let report = match engine.analyze().await {
        Ok(report) => report,
        Err(e) => {
            error!("❌ Analysis failed: {}", e);
            return Err(e.into());
        }
    };

    print_report(&report);

    if report.plan.is_empty() {
        println!("Nothing recommended for deletion. 🎉");
        return Ok(());
    }

    if args.dry_run {
        info!("🧪 Dry-run mode: no email will be deleted");
        return Ok(());
    }

    // Hard synchronization point: deletion starts only on an explicit signal,
    // sampled after the recommendations above were displayed
    let confirmed = args.yes
        || confirm(&format!(
            "Proceed with deletion of {} email(s)?",
            report.plan.recommendations.len()
        ))?;

    if !confirmed {
        info!("Deletion cancelled, no email was touched");
        return Ok(());
    }

    let deletion = engine.execute(&report.plan).await;

    println!(
        "\n✅ Successfully cleaned up {:.2} MB of storage ({} email(s) trashed)",
        deletion.reclaimed as f64 / 1024.0 / 1024.0,
        deletion.trashed
    );
    for failure in &deletion.failures {
        println!("  ⚠️ Could not trash {}: {}", failure.id, failure.reason);
    }

    Ok(())
}

fn print_report(report: &TriageReport) {
    println!("\n{}", "=".repeat(80));
    println!("📬 STORAGE CLEANUP RECOMMENDATIONS");
    println!("{}", "=".repeat(80));
    println!(
        "Analyzed: {} | Critical: {} | Keep: {} | Delete: {} | Skipped: {}",
        report.classifications.len(),
        report.count(Category::Critical),
        report.count(Category::Keep),
        report.count(Category::Delete),
        report.skipped.len()
    );
    println!(
        "Total space that can be saved: {:.2} MB",
        report.plan.total_reclaimable as f64 / 1024.0 / 1024.0
    );

    if !report.plan.is_empty() {
        println!("\nEmails recommended for deletion:");
        for rec in &report.plan.recommendations {
            println!("  - {} (Size: {:.2} KB)", rec.reason, rec.size as f64 / 1024.0);
        }
    }

    if !report.skipped.is_empty() {
        println!("\nSkipped messages:");
        for skipped in &report.skipped {
            println!("  ⚠️ {}: {}", skipped.id, skipped.reason);
        }
    }

    println!("{}", "=".repeat(80));
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
