use colored::Colorize;

/// Colored yes/no for terminal output
pub fn format_eligible(eligible: bool) -> String {
    if eligible {
        "340B eligible".green().to_string()
    } else {
        "Not eligible".yellow().to_string()
    }
}

/// Shorten long text to `width` characters for table cells
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    println!("{}", table_row(columns, widths));
}

fn table_row(columns: &[&str], widths: &[usize]) -> String {
    let mut row = String::new();
    for (col, width) in columns.iter().zip(widths) {
        row.push_str(&format!("{:<width$}  ", truncate(col, *width), width = width));
    }
    row.trim_end().to_string()
}
