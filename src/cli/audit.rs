//! Audit command implementation

use std::io::IsTerminal;
use std::time::Duration;

use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};

use crate::audit::{AuditOptions, AuditRun, archive_all, run_audit};
use crate::cli::{AuditArgs, CommandContext, GlobalOptions, OutputFormat};
use crate::client::InventoryObject;
use crate::error::Result;
use crate::output::Formattable;
use crate::output::json::format_json;
use crate::output::report::ReportView;

/// Run the audit command
pub async fn run(opts: &GlobalOptions, args: &AuditArgs) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let options = AuditOptions {
        concurrency: ctx.config.concurrency,
        progress: progress_bar(ctx.format),
    };
    let run = run_audit(ctx.client.as_ref(), &options).await?;

    if let Some(method) = ctx.client.auth().method().await {
        debug!("Authenticated via {}", method);
    }
    if !run.failures.is_empty() {
        eprintln!(
            "{} {} object(s) could not be fetched and were left out of the report",
            "⚠".yellow(),
            run.failures.len()
        );
    }

    if let Some(path) = &args.out {
        std::fs::write(path, format_json(&run.report)?)?;
        debug!("Wrote JSON report to {}", path.display());
    }

    let server = ctx.config.base_url()?;
    ReportView::new(&run.report, &server).print(ctx.format)?;

    if args.move_to_archive {
        let category = args
            .archive_category
            .clone()
            .unwrap_or_else(|| ctx.config.archive_category.clone());
        move_to_archive(&ctx, &run, &category, args.yes).await?;
    }

    Ok(())
}

/// Progress bar for detail fetches, hidden for JSON output or a non-terminal stderr
fn progress_bar(format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} Fetching details [{bar:40.cyan/blue}] {pos}/{len}")
    {
        bar.set_style(style.progress_chars("█▓▒░"));
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

async fn move_to_archive(
    ctx: &CommandContext,
    run: &AuditRun,
    category: &str,
    yes: bool,
) -> Result<()> {
    let include_unused = !run.references_incomplete();
    if !include_unused {
        warn!("Some policy details failed to load; unused scripts and packages will not be archived");
    }

    let targets = run.report.archive_targets(include_unused);
    if targets.is_empty() {
        eprintln!("Nothing to archive.");
        return Ok(());
    }

    // Confirmation prompt unless --yes
    if !yes {
        eprintln!(
            "{} Move {} object(s) to category \"{}\"?",
            "⚠".yellow(),
            targets.len(),
            category
        );
        for (kind, count) in counts_by_kind(&targets) {
            eprintln!("  {}: {}", kind, count);
        }

        let confirm = Confirm::new()
            .with_prompt("Confirm archive?")
            .default(false)
            .interact()?;

        if !confirm {
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    let summary = archive_all(ctx.client.as_ref(), &targets, category).await?;

    for object in &summary.moved {
        eprintln!("[moved] {} {} -> {}", object.kind, object.id, category);
    }
    if summary.failed.is_empty() {
        eprintln!("{} Archived {} object(s)", "✓".green(), summary.moved.len());
    } else {
        eprintln!(
            "{} Archived {} object(s), {} failed",
            "✗".red(),
            summary.moved.len(),
            summary.failed.len()
        );
    }

    Ok(())
}

/// Target counts per kind, in target order
fn counts_by_kind(targets: &[InventoryObject]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for target in targets {
        let kind = target.kind.to_string();
        match counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, count)) => *count += 1,
            None => counts.push((kind, 1)),
        }
    }
    counts
}
