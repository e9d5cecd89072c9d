//! Common display utilities and helpers

/// Widest name shown in a table cell
pub const MAX_NAME_WIDTH: usize = 60;

/// Truncate string to max length (in characters) with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Placeholder for absent optional values
pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_string("this is a long name", 10), "this is...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_string("Größenänderung", 8), "Größe...");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some("Ongoing")), "Ongoing");
        assert_eq!(or_dash(Some("")), "--");
        assert_eq!(or_dash(None), "--");
    }
}
