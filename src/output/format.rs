use chrono::TimeDelta;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, TableComponent,
    modifiers::UTF8_SOLID_INNER_BORDERS, presets::UTF8_FULL,
};

use crate::cli::SortOrder;
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub(crate) struct NumberFormat {
    group_sep: char,
    decimal_sep: char,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            group_sep: ',',
            decimal_sep: '.',
        }
    }
}

impl NumberFormat {
    pub(crate) fn from_locale(locale: Option<&str>) -> Result<Self, AppError> {
        let Some(raw) = locale else {
            return Ok(NumberFormat::default());
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(NumberFormat::default());
        }
        let base = trimmed
            .split(['-', '_'])
            .next()
            .unwrap_or(trimmed)
            .to_ascii_lowercase();

        let format = match base.as_str() {
            "de" => NumberFormat {
                group_sep: '.',
                decimal_sep: ',',
            },
            "fr" | "ru" => NumberFormat {
                group_sep: ' ',
                decimal_sep: ',',
            },
            "en" | "zh" => NumberFormat::default(),
            _ => {
                return Err(AppError::UnsupportedLocale {
                    input: trimmed.to_string(),
                });
            }
        };

        Ok(format)
    }
}

fn group_digits(digits: &str, sep: char) -> String {
    let mut result = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(sep);
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub(super) fn format_number(n: i64, format: NumberFormat) -> String {
    let sign = if n < 0 { "-" } else { "" };
    let digits = n.unsigned_abs().to_string();
    format!("{sign}{}", group_digits(&digits, format.group_sep))
}

/// Fixed number of decimals with locale separators
pub(super) fn format_fixed(value: f64, decimals: usize, format: NumberFormat) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let negative = value < 0.0 && text.bytes().any(|b| matches!(b, b'1'..=b'9'));
    let sign = if negative { "-" } else { "" };
    let grouped = group_digits(int_part, format.group_sep);
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}{}{frac_part}", format.decimal_sep)
    }
}

/// Kilograms: up to two decimals, trailing zeros dropped
pub(super) fn format_weight(kg: f64, format: NumberFormat) -> String {
    let fixed = format_fixed(kg, 2, format);
    if fixed.contains(format.decimal_sep) {
        fixed
            .trim_end_matches('0')
            .trim_end_matches(format.decimal_sep)
            .to_string()
    } else {
        fixed
    }
}

/// Cubic meters, three decimals
pub(super) fn format_volume(m3: f64, format: NumberFormat) -> String {
    format_fixed(m3, 3, format)
}

/// Listing order; stored order is oldest first
pub(super) fn ordered<T>(items: &[T], order: SortOrder) -> Vec<&T> {
    match order {
        SortOrder::Asc => items.iter().collect(),
        SortOrder::Desc => items.iter().rev().collect(),
    }
}

pub(super) fn format_remaining(left: TimeDelta) -> String {
    let minutes = left.num_minutes().max(0);
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

pub(super) fn styled_cell(text: &str, color: Option<Color>, bold: bool) -> Cell {
    let mut cell = Cell::new(text);
    if let Some(c) = color {
        cell = cell.fg(c);
    }
    if bold {
        cell = cell.add_attribute(Attribute::Bold);
    }
    cell
}

pub(super) fn header_cell(text: &str, use_color: bool) -> Cell {
    let mut cell = Cell::new(text).add_attribute(Attribute::Bold);
    if use_color {
        cell = cell.fg(Color::Cyan);
    }
    cell
}

/// Replace the double-line header separator (╞═╪═╡) with single-line (├─┼─┤)
fn normalize_header_separator(table: &mut Table) {
    table.set_style(TableComponent::HeaderLines, '─');
    table.set_style(TableComponent::LeftHeaderIntersection, '├');
    table.set_style(TableComponent::MiddleHeaderIntersections, '┼');
    table.set_style(TableComponent::RightHeaderIntersection, '┤');
}

/// Create a table with the standard preset, inner borders, and normalized header separator.
pub(super) fn create_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    normalize_header_separator(&mut table);
    table
}

/// Numeric column cell
pub(super) fn right_cell(text: &str, color: Option<Color>, bold: bool) -> Cell {
    styled_cell(text, color, bold).set_alignment(CellAlignment::Right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_with_commas() {
        let fmt = NumberFormat::default();
        assert_eq!(format_number(0, fmt), "0");
        assert_eq!(format_number(999, fmt), "999");
        assert_eq!(format_number(1000, fmt), "1,000");
        assert_eq!(format_number(1_234_567, fmt), "1,234,567");
        assert_eq!(format_number(-1234, fmt), "-1,234");
    }

    #[test]
    fn format_fixed_uses_locale_separators() {
        let en = NumberFormat::default();
        let de = NumberFormat::from_locale(Some("de-DE")).unwrap();
        let ru = NumberFormat::from_locale(Some("ru")).unwrap();
        assert_eq!(format_fixed(1234.5, 2, en), "1,234.50");
        assert_eq!(format_fixed(1234.5, 2, de), "1.234,50");
        assert_eq!(format_fixed(1234.5, 2, ru), "1 234,50");
        assert_eq!(format_fixed(-0.0001, 2, en), "0.00");
        assert_eq!(format_fixed(-2.5, 1, en), "-2.5");
    }

    #[test]
    fn weight_drops_trailing_zeros() {
        let fmt = NumberFormat::default();
        assert_eq!(format_weight(3.0, fmt), "3");
        assert_eq!(format_weight(2.5, fmt), "2.5");
        assert_eq!(format_weight(5.0 / 3.0, fmt), "1.67");
        assert_eq!(format_weight(10_000.0, fmt), "10,000");
    }

    #[test]
    fn volume_has_three_decimals() {
        let fmt = NumberFormat::default();
        assert_eq!(format_volume(0.06, fmt), "0.060");
        assert_eq!(format_volume(0.288, fmt), "0.288");
    }

    #[test]
    fn remaining_as_hours_and_minutes() {
        assert_eq!(format_remaining(TimeDelta::minutes(450)), "7h 30m");
        assert_eq!(format_remaining(TimeDelta::minutes(5)), "0h 05m");
        assert_eq!(format_remaining(TimeDelta::minutes(-5)), "0h 00m");
    }

    #[test]
    fn from_locale_unsupported_returns_error() {
        assert!(NumberFormat::from_locale(Some("ja")).is_err());
        let fmt = NumberFormat::from_locale(None).unwrap();
        assert_eq!(format_number(1000, fmt), "1,000");
    }
}
