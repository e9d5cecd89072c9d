//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - colored headings and rounded tables
    #[default]
    Pretty,
    /// Table format - plain section tables without color
    Table,
    /// JSON format - structured for scripts/APIs
    Json,
}
