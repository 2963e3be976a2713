mod format;
mod json;
mod table;

pub(crate) use json::{
    output_history_json, output_pricing_json, output_report_json, output_snapshot_json,
};
pub(crate) use table::{
    TableOptions, print_history_table, print_pricing_table, print_report_table,
    print_snapshot_confirmation,
};
