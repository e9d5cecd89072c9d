//! Audit report rendering

use std::fmt::Write;

use colored::Colorize;
use tabled::Tabled;

use super::Formattable;
use super::json::format_json;
use super::table::format_table;
use crate::audit::AuditReport;
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::models::{GroupDisplay, ObjectDisplay, PolicyDisplay};

/// An audit report together with the server it was taken from
pub struct ReportView<'a> {
    pub report: &'a AuditReport,
    pub server: &'a str,
}

impl<'a> ReportView<'a> {
    pub fn new(report: &'a AuditReport, server: &'a str) -> Self {
        Self { report, server }
    }

    fn render(&self, color: bool) -> String {
        let report = self.report;
        let stats = &report.stats;
        let mut out = String::new();

        let heading = format!("Jamf Cleanup Audit: {}", self.server);
        let _ = writeln!(
            out,
            "{}",
            if color {
                heading.bold().cyan().to_string()
            } else {
                heading
            }
        );
        let _ = write!(
            out,
            "Totals: policies {} | profiles {} | scripts {} | packages {} | groups {}",
            stats.policies_total,
            stats.profiles_total,
            stats.scripts_total,
            stats.packages_total,
            stats.groups_total
        );
        if stats.failed_fetches > 0 {
            let note = format!(" | failed fetches {}", stats.failed_fetches);
            let _ = write!(
                out,
                "{}",
                if color { note.yellow().to_string() } else { note }
            );
        }
        out.push('\n');

        section(
            &mut out,
            "Unscoped Policies",
            table_of::<ObjectDisplay, _>(&report.unscoped_policies, color),
            color,
        );
        section(
            &mut out,
            "Unscoped macOS Configuration Profiles",
            table_of::<ObjectDisplay, _>(&report.unscoped_profiles, color),
            color,
        );
        section(
            &mut out,
            "Unused Scripts",
            table_of::<ObjectDisplay, _>(&report.unused_scripts, color),
            color,
        );
        section(
            &mut out,
            "Unused Packages",
            table_of::<ObjectDisplay, _>(&report.unused_packages, color),
            color,
        );
        section(
            &mut out,
            "Unused Computer Groups",
            table_of::<GroupDisplay, _>(&report.unused_groups, color),
            color,
        );
        section(
            &mut out,
            "Policies with No Triggers and Not in Self Service",
            table_of::<PolicyDisplay, _>(&report.policies_no_triggers_and_not_selfservice, color),
            color,
        );
        section(
            &mut out,
            "Active Policies with Self Service Enabled",
            table_of::<PolicyDisplay, _>(&report.active_policies_selfservice_enabled, color),
            color,
        );

        out.trim_end().to_string()
    }
}

fn table_of<'a, D, S>(items: &'a [S], color: bool) -> String
where
    D: Tabled + From<&'a S>,
{
    let rows: Vec<D> = items.iter().map(D::from).collect();
    format_table(&rows, color)
}

fn section(out: &mut String, title: &str, body: String, color: bool) {
    let underline = "=".repeat(title.chars().count());
    if color {
        let _ = writeln!(out, "\n{}\n{}", title.bold(), underline.dimmed());
    } else {
        let _ = writeln!(out, "\n{}\n{}", title, underline);
    }
    let _ = writeln!(out, "{}", body);
}

impl Formattable for ReportView<'_> {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.render(true)),
            OutputFormat::Table => Ok(self.render(false)),
            OutputFormat::Json => Ok(format_json(self.report)?),
        }
    }
}
