//! Terminal rendering of correlation tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{CorrelationTable, COLUMN_NAMES};

/// Absolute coefficient above which a cell is highlighted as strong
const STRONG_CORRELATION: f64 = 0.7;
/// Absolute coefficient above which a cell is highlighted as moderate
const MODERATE_CORRELATION: f64 = 0.4;
/// Significance level for p-value highlighting
const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Build a `comfy_table` view of the correlation table.
///
/// Coefficients are colored by strength and p-values by significance;
/// undefined statistics show as `NaN`.
pub fn correlation_table_view(correlations: &CorrelationTable) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        COLUMN_NAMES
            .iter()
            .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );

    for record in correlations.records() {
        table.add_row(vec![
            Cell::new(&record.feature1),
            Cell::new(&record.feature2),
            coefficient_cell(record.absolute_spearman),
            coefficient_cell(record.spearman),
            p_value_cell(record.spearman_p_value),
            coefficient_cell(record.absolute_pearson),
            coefficient_cell(record.pearson),
            p_value_cell(record.pearson_p_value),
            coefficient_cell(record.pearson_r_squared),
        ]);
    }

    table
}

/// Print the correlation table with a section header
pub fn display_correlations(correlations: &CorrelationTable) {
    println!();
    println!(
        "    {} {}",
        style("🔗").cyan(),
        style("FEATURE CORRELATIONS").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    if correlations.is_empty() {
        println!("      {}", style("No feature pairs analyzed").dim());
        return;
    }

    // Indent the table
    for line in correlation_table_view(correlations).to_string().lines() {
        println!("    {}", line);
    }

    println!();
    println!(
        "      {} {} pairs",
        style("Analyzed").dim(),
        style(correlations.len()).yellow().bold()
    );
}

fn coefficient_cell(value: f64) -> Cell {
    let cell = Cell::new(format_stat(value)).set_alignment(CellAlignment::Right);
    let magnitude = value.abs();
    if value.is_nan() {
        cell.fg(Color::DarkGrey)
    } else if magnitude > STRONG_CORRELATION {
        cell.fg(Color::Green).add_attribute(Attribute::Bold)
    } else if magnitude > MODERATE_CORRELATION {
        cell.fg(Color::Yellow)
    } else {
        cell
    }
}

fn p_value_cell(value: f64) -> Cell {
    let cell = Cell::new(format_p_value(value)).set_alignment(CellAlignment::Right);
    if value.is_nan() {
        cell.fg(Color::DarkGrey)
    } else if value < SIGNIFICANCE_LEVEL {
        cell.fg(Color::Cyan)
    } else {
        cell
    }
}

fn format_stat(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn format_p_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value != 0.0 && value < 1e-4 {
        format!("{:.2e}", value)
    } else {
        format!("{:.4}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_stat() {
        assert_eq!(format_stat(0.123456), "0.1235");
        assert_eq!(format_stat(f64::NAN), "NaN");
    }

    #[test]
    fn test_format_p_value_small_uses_exponent() {
        assert_eq!(format_p_value(0.0), "0.0000");
        assert_eq!(format_p_value(0.25), "0.2500");
        assert!(format_p_value(1.5e-8).contains('e'));
    }
}
