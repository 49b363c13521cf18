use chrono::{DateTime, TimeDelta, Utc};
use comfy_table::{Cell, Color};

use crate::auth::{Employee, Session};
use crate::cargo::{CargoRecord, CargoType, GroupSummary, ShipmentSnapshot, Totals};
use crate::cli::SortOrder;
use crate::output::format::{
    NumberFormat, create_styled_table, format_number, format_remaining, format_volume,
    format_weight, header_cell, ordered, right_cell, styled_cell,
};
use crate::utils::Timezone;

#[derive(Debug, Clone, Copy)]
pub(crate) struct TableOptions {
    pub(crate) order: SortOrder,
    pub(crate) use_color: bool,
    pub(crate) number_format: NumberFormat,
    pub(crate) timezone: Timezone,
}

fn count(n: usize, fmt: NumberFormat) -> String {
    format_number(i64::try_from(n).unwrap_or(i64::MAX), fmt)
}

fn packaging_label(record: &CargoRecord) -> String {
    if record.packaging.count == 0 {
        record.packaging.kind.as_str().to_string()
    } else {
        format!("{} ×{}", record.packaging.kind.as_str(), record.packaging.count)
    }
}

/// Print the summary line under a table
fn print_totals_line(totals: &Totals, fmt: NumberFormat, use_color: bool) {
    let text = format!(
        "{} places | {} kg | {} m³",
        count(totals.total_places, fmt),
        format_weight(totals.total_weight, fmt),
        format_volume(totals.total_volume, fmt)
    );
    if use_color {
        println!("\n  \x1b[36m{text}\x1b[0m\n");
    } else {
        println!("\n  {text}\n");
    }
}

pub(crate) fn print_records_table(records: &[CargoRecord], totals: &Totals, opts: TableOptions) {
    let c = opts.use_color;
    let fmt = opts.number_format;
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("ID", c),
        header_cell("Type", c),
        header_cell("Size (cm)", c),
        header_cell("Weight (kg)", c),
        header_cell("Volume (m³)", c),
        header_cell("Packaging", c),
        header_cell("Photos", c),
        header_cell("Added", c),
    ]);

    for record in ordered(records, opts.order) {
        table.add_row(vec![
            Cell::new(record.id),
            styled_cell(record.cargo_type.as_str(), c.then_some(Color::Green), false),
            Cell::new(record.dimensions),
            right_cell(&format_weight(record.weight, fmt), None, false),
            right_cell(&format_volume(record.volume, fmt), None, false),
            Cell::new(packaging_label(record)),
            right_cell(&count(record.photos.len(), fmt), None, false),
            Cell::new(opts.timezone.stamp(record.timestamp)),
        ]);
    }

    println!("{table}");
    print_totals_line(totals, fmt, c);
}

pub(crate) fn print_groups_table(groups: &[GroupSummary], totals: &Totals, opts: TableOptions) {
    let c = opts.use_color;
    let fmt = opts.number_format;
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Type", c),
        header_cell("Size (cm)", c),
        header_cell("Unit kg", c),
        header_cell("Qty", c),
        header_cell("Total kg", c),
        header_cell("Total m³", c),
        header_cell("Packaging", c),
        header_cell("Group key", c),
    ]);

    for group in ordered(groups, opts.order) {
        let first = &group.representative;
        table.add_row(vec![
            styled_cell(first.cargo_type.as_str(), c.then_some(Color::Green), false),
            Cell::new(first.dimensions),
            right_cell(&format_weight(first.weight, fmt), None, false),
            right_cell(&count(group.count, fmt), None, true),
            right_cell(&format_weight(group.total_weight, fmt), None, false),
            right_cell(&format_volume(group.total_volume, fmt), None, false),
            Cell::new(packaging_label(first)),
            styled_cell(&group.group_key, c.then_some(Color::DarkGrey), false),
        ]);
    }

    println!("{table}");
    print_totals_line(totals, fmt, c);
}

pub(crate) fn print_summary_table(totals: &Totals, opts: TableOptions) {
    let c = opts.use_color;
    let fmt = opts.number_format;
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Type", c),
        header_cell("Kinds", c),
        header_cell("Places", c),
    ]);

    for cargo_type in CargoType::ALL {
        let Some(tally) = totals.by_type.get(&cargo_type) else {
            continue;
        };
        table.add_row(vec![
            styled_cell(cargo_type.as_str(), c.then_some(Color::Green), false),
            right_cell(&count(tally.count, fmt), None, false),
            right_cell(&count(tally.places, fmt), None, false),
        ]);
    }

    let kinds: usize = totals.by_type.values().map(|t| t.count).sum();
    let total_color = c.then_some(Color::Yellow);
    table.add_row(vec![
        styled_cell("TOTAL", total_color, true),
        right_cell(&count(kinds, fmt), total_color, true),
        right_cell(&count(totals.total_places, fmt), total_color, true),
    ]);

    println!("{table}");
    print_totals_line(totals, fmt, c);
}

pub(crate) fn print_history_table(history: &[ShipmentSnapshot], opts: TableOptions) {
    let c = opts.use_color;
    let fmt = opts.number_format;
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Shipment", c),
        header_cell("Sent", c),
        header_cell("Employee", c),
        header_cell("Places", c),
        header_cell("Weight (kg)", c),
        header_cell("Volume (m³)", c),
        header_cell("Status", c),
    ]);

    for shipment in ordered(history, opts.order) {
        table.add_row(vec![
            Cell::new(&shipment.id),
            Cell::new(opts.timezone.stamp(shipment.created_at)),
            Cell::new(format!("{} ({})", shipment.employee_name, shipment.employee_id)),
            right_cell(&count(shipment.totals.total_places, fmt), None, false),
            right_cell(&format_weight(shipment.totals.total_weight, fmt), None, false),
            right_cell(&format_volume(shipment.totals.total_volume, fmt), None, false),
            styled_cell(shipment.status.as_str(), c.then_some(Color::Yellow), false),
        ]);
    }

    println!("{table}");
}

pub(crate) fn print_employees_table<'a>(
    employees: impl Iterator<Item = &'a Employee>,
    use_color: bool,
) {
    let c = use_color;
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Code", c),
        header_cell("Name", c),
        header_cell("Position", c),
        header_cell("Department", c),
    ]);
    for employee in employees {
        table.add_row(vec![
            styled_cell(employee.code.as_str(), c.then_some(Color::Green), true),
            Cell::new(&employee.full_name),
            Cell::new(&employee.position),
            Cell::new(&employee.department),
        ]);
    }
    println!("{table}");
}

pub(crate) fn print_status(
    session: &Session,
    now: DateTime<Utc>,
    window: TimeDelta,
    places: usize,
    opts: TableOptions,
) {
    println!("Signed in as {} ({})", session.name, session.id);
    if !session.position.is_empty() || !session.department.is_empty() {
        println!("  {}, {}", session.position, session.department);
    }
    println!(
        "  Since {} ({} left)",
        opts.timezone.stamp(session.login_time),
        format_remaining(session.remaining(now, window))
    );
    println!("  Cargo list: {} places", count(places, opts.number_format));
}

/// One-line confirmation after an add
pub(crate) fn added_message(added: &[CargoRecord], totals: &Totals, fmt: NumberFormat) -> String {
    let Some(first) = added.first() else {
        return "Nothing added".to_string();
    };
    format!(
        "Added {} × {} {} cm, {} kg each ({} places in list)",
        count(added.len(), fmt),
        first.cargo_type,
        first.dimensions,
        format_weight(first.weight, fmt),
        count(totals.total_places, fmt)
    )
}

pub(crate) fn shipment_message(shipment: &ShipmentSnapshot, fmt: NumberFormat) -> String {
    format!(
        "Shipment {} sent to operator: {} places, {} kg, {} m³",
        shipment.id,
        count(shipment.totals.total_places, fmt),
        format_weight(shipment.totals.total_weight, fmt),
        format_volume(shipment.totals.total_volume, fmt)
    )
}
