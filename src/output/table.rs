use comfy_table::Color;

use crate::core::{HistoryDay, Report, SnapshotOutcome};
use crate::pricing::PricingTable;
use crate::utils::format_day;

use super::format::{
    create_styled_table, format_cost, format_number, format_rate, header_cell, right_cell,
};

#[derive(Debug, Clone, Copy)]
pub(crate) struct TableOptions {
    pub(crate) use_color: bool,
}

fn cost_color(opts: TableOptions) -> Option<Color> {
    opts.use_color.then_some(Color::Green)
}

pub(crate) fn print_report_table(report: &Report, opts: TableOptions) {
    let c = opts.use_color;
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Period", c),
        header_cell("Range", c),
        header_cell("Input", c),
        header_cell("Output", c),
        header_cell("Total", c),
        header_cell("Cost", c),
    ]);

    for rollup in report.rollups() {
        let range = if rollup.start_date == rollup.end_date {
            format_day(rollup.start_date)
        } else {
            format!(
                "{} → {}",
                format_day(rollup.start_date),
                format_day(rollup.end_date)
            )
        };
        table.add_row(vec![
            comfy_table::Cell::new(rollup.period.label()),
            comfy_table::Cell::new(range),
            right_cell(&format_number(rollup.input_tokens), None, false),
            right_cell(&format_number(rollup.output_tokens), None, false),
            right_cell(&format_number(rollup.total_tokens), None, true),
            right_cell(&format_cost(rollup.cost), cost_color(opts), true),
        ]);
    }

    println!("\n  Model: {} ({})\n", report.display_name, report.model);
    println!("{table}");
    if !report.warnings.is_empty() {
        println!("\n  Skipped {} corrupt stored day(s):", report.warnings.len());
        for warning in &report.warnings {
            println!("    {}: {}", warning.file, warning.reason);
        }
    }
    println!();
}

pub(crate) fn print_snapshot_confirmation(outcome: &SnapshotOutcome) {
    let s = &outcome.snapshot;
    println!(
        "Snapshot {} {}: {} tokens ({} in / {} out) across {} session(s), model {}",
        s.day_key(),
        if outcome.replaced { "replaced" } else { "saved" },
        format_number(s.total_tokens),
        format_number(s.input_tokens),
        format_number(s.output_tokens),
        s.sessions.len(),
        s.model
    );
}

pub(crate) fn print_history_table(days: &[HistoryDay], opts: TableOptions) {
    let c = opts.use_color;
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Date", c),
        header_cell("Model", c),
        header_cell("Sessions", c),
        header_cell("Input", c),
        header_cell("Output", c),
        header_cell("Total", c),
        header_cell("Cost", c),
    ]);

    let mut total_tokens = 0u64;
    let mut total_cost = 0.0;
    for day in days {
        total_tokens = total_tokens.saturating_add(day.total_tokens);
        if let Some(cost) = day.cost {
            total_cost += cost;
        }
        table.add_row(vec![
            comfy_table::Cell::new(format_day(day.date)),
            comfy_table::Cell::new(&day.model),
            right_cell(&day.sessions.to_string(), None, false),
            right_cell(&format_number(day.input_tokens), None, false),
            right_cell(&format_number(day.output_tokens), None, false),
            right_cell(&format_number(day.total_tokens), None, false),
            right_cell(
                &day.cost.map_or_else(|| "N/A".to_string(), format_cost),
                cost_color(opts),
                false,
            ),
        ]);
    }
    table.add_row(vec![
        comfy_table::Cell::new("Total"),
        comfy_table::Cell::new(""),
        comfy_table::Cell::new(""),
        comfy_table::Cell::new(""),
        comfy_table::Cell::new(""),
        right_cell(&format_number(total_tokens), None, true),
        right_cell(&format_cost(total_cost), cost_color(opts), true),
    ]);

    println!("{table}");
}

pub(crate) fn print_pricing_table(pricing: &PricingTable, opts: TableOptions) {
    let c = opts.use_color;
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Model", c),
        header_cell("Name", c),
        header_cell("Input", c),
        header_cell("Output", c),
    ]);
    for entry in pricing.entries() {
        table.add_row(vec![
            comfy_table::Cell::new(&entry.model),
            comfy_table::Cell::new(&entry.display_name),
            right_cell(&format_rate(entry.input_per_mtok()), None, false),
            right_cell(&format_rate(entry.output_per_mtok()), None, false),
        ]);
    }
    println!("\n  Pricing table version {}\n", pricing.version());
    println!("{table}");
}
