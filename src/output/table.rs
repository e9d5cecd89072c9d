//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Placeholder printed for an empty section
pub const EMPTY_SECTION: &str = "(none)";

/// Format data as a table
///
/// `rounded` selects the box-drawing style used by pretty output; otherwise
/// a plain psql-like layout is used.
pub fn format_table<T: Tabled>(data: &[T], rounded: bool) -> String {
    if data.is_empty() {
        return EMPTY_SECTION.to_string();
    }

    let mut table = Table::new(data);
    if rounded {
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
    } else {
        table.with(Style::psql());
    }

    table.to_string()
}
