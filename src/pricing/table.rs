//! Built-in model rates.
//!
//! Plain data only: bump `PRICING_VERSION` and edit the rows when upstream
//! prices change. A TOML file with the same fields replaces this table
//! wholesale (see `PricingTable::from_file`).

/// Identifies the rate sheet the rows below were copied from
pub(super) const PRICING_VERSION: &str = "2025-11";

/// One row of the rate sheet, in dollars per million tokens
pub(super) struct Rate {
    pub(super) model: &'static str,
    pub(super) display_name: &'static str,
    pub(super) input_per_mtok: f64,
    pub(super) output_per_mtok: f64,
}

pub(super) const BUILTIN_RATES: &[Rate] = &[
    Rate {
        model: "claude-opus-4-5",
        display_name: "Claude Opus 4.5",
        input_per_mtok: 5.0,
        output_per_mtok: 25.0,
    },
    Rate {
        model: "claude-opus-4-1",
        display_name: "Claude Opus 4.1",
        input_per_mtok: 15.0,
        output_per_mtok: 75.0,
    },
    Rate {
        model: "claude-opus-4",
        display_name: "Claude Opus 4",
        input_per_mtok: 15.0,
        output_per_mtok: 75.0,
    },
    Rate {
        model: "claude-sonnet-4-5",
        display_name: "Claude Sonnet 4.5",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
    },
    Rate {
        model: "claude-sonnet-4",
        display_name: "Claude Sonnet 4",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
    },
    Rate {
        model: "claude-3-7-sonnet",
        display_name: "Claude Sonnet 3.7",
        input_per_mtok: 3.0,
        output_per_mtok: 15.0,
    },
    Rate {
        model: "claude-haiku-4-5",
        display_name: "Claude Haiku 4.5",
        input_per_mtok: 1.0,
        output_per_mtok: 5.0,
    },
    Rate {
        model: "claude-3-5-haiku",
        display_name: "Claude Haiku 3.5",
        input_per_mtok: 0.8,
        output_per_mtok: 4.0,
    },
];
