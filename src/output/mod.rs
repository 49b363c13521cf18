mod csv;
mod format;
mod json;
mod table;

pub(crate) use csv::{output_history_csv, output_records_csv};
pub(crate) use format::NumberFormat;
pub(crate) use json::{
    output_decode_json, output_employees_json, output_groups_json, output_history_json,
    output_records_json, output_removal_json, output_snapshot_json, output_status_json,
    output_summary_json,
};
pub(crate) use table::{
    TableOptions, added_message, print_employees_table, print_groups_table, print_history_table,
    print_records_table, print_status, print_summary_table, shipment_message,
};
