//! Inspect command implementations

use serde::Serialize;

use crate::audit::{inspect_policy, inspect_profile};
use crate::cli::{CommandContext, GlobalOptions, OutputFormat};
use crate::error::Result;
use crate::output::json::format_json;

/// Run the inspect policy command
pub async fn policy(opts: &GlobalOptions, id: i64) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let inspection = inspect_policy(ctx.client.as_ref(), id).await?;
    print_bundle(&inspection, ctx.format)
}

/// Run the inspect profile command
pub async fn profile(opts: &GlobalOptions, id: i64) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let inspection = inspect_profile(ctx.client.as_ref(), id).await?;
    print_bundle(&inspection, ctx.format)
}

/// Inspection bundles are always JSON; `--format json` adds the envelope.
fn print_bundle<T: Serialize>(bundle: &T, format: OutputFormat) -> Result<()> {
    let output = match format {
        OutputFormat::Json => format_json(bundle)?,
        OutputFormat::Pretty | OutputFormat::Table => serde_json::to_string_pretty(bundle)?,
    };
    println!("{}", output);
    Ok(())
}
