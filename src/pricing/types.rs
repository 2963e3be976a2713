use serde::{Deserialize, Serialize};

const PER_MILLION: f64 = 1_000_000.0;

/// Model pricing info (per token, not per million)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PricingEntry {
    pub(crate) model: String,
    pub(crate) input_rate: f64,
    pub(crate) output_rate: f64,
    pub(crate) display_name: String,
}

impl PricingEntry {
    pub(super) fn from_per_million(
        model: &str,
        display_name: &str,
        input_per_mtok: f64,
        output_per_mtok: f64,
    ) -> Self {
        PricingEntry {
            model: model.to_string(),
            input_rate: input_per_mtok / PER_MILLION,
            output_rate: output_per_mtok / PER_MILLION,
            display_name: display_name.to_string(),
        }
    }

    pub(crate) fn input_per_mtok(&self) -> f64 {
        self.input_rate * PER_MILLION
    }

    pub(crate) fn output_per_mtok(&self) -> f64 {
        self.output_rate * PER_MILLION
    }
}

/// On-disk replacement table (TOML)
#[derive(Debug, Deserialize)]
pub(super) struct PricingFile {
    #[serde(default)]
    pub(super) version: Option<String>,
    #[serde(default)]
    pub(super) models: Vec<PricingFileRow>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PricingFileRow {
    pub(super) model: String,
    #[serde(default)]
    pub(super) display_name: Option<String>,
    pub(super) input_per_mtok: f64,
    pub(super) output_per_mtok: f64,
}
