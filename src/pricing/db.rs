use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::core::TokenTotals;
use crate::error::{AppError, PricingError};

use super::table::{BUILTIN_RATES, PRICING_VERSION};
use super::types::{PricingEntry, PricingFile};

/// Closed whitelist of priced models.
///
/// Lookups never fall back to a "close enough" model: an id that is not in
/// the table is an error.
#[derive(Debug, Clone)]
pub(crate) struct PricingTable {
    version: String,
    entries: Vec<PricingEntry>,
}

impl PricingTable {
    pub(crate) fn builtin() -> Self {
        Self {
            version: PRICING_VERSION.to_string(),
            entries: BUILTIN_RATES
                .iter()
                .map(|r| {
                    PricingEntry::from_per_million(
                        r.model,
                        r.display_name,
                        r.input_per_mtok,
                        r.output_per_mtok,
                    )
                })
                .collect(),
        }
    }

    /// Use the pricing file when given, the built-in table otherwise
    pub(crate) fn load(pricing_file: Option<&Path>) -> Result<Self, AppError> {
        match pricing_file {
            Some(path) => {
                let table = Self::from_file(path)?;
                debug!(
                    "Loaded {} model rates from {} (version {})",
                    table.entries.len(),
                    path.display(),
                    table.version
                );
                Ok(table)
            }
            None => Ok(Self::builtin()),
        }
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self, PricingError> {
        let content = std::fs::read_to_string(path).map_err(|source| PricingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: PricingFile = toml::from_str(&content).map_err(|source| PricingError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let entries = file
            .models
            .iter()
            .map(|row| {
                PricingEntry::from_per_million(
                    &row.model,
                    row.display_name.as_deref().unwrap_or(&row.model),
                    row.input_per_mtok,
                    row.output_per_mtok,
                )
            })
            .collect();
        Self::from_entries(file.version.unwrap_or_else(|| "custom".to_string()), entries)
    }

    fn from_entries(version: String, entries: Vec<PricingEntry>) -> Result<Self, PricingError> {
        if entries.is_empty() {
            return Err(PricingError::Empty);
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.model.as_str()) {
                return Err(PricingError::Duplicate {
                    model: entry.model.clone(),
                });
            }
            for rate in [entry.input_rate, entry.output_rate] {
                if !rate.is_finite() || rate < 0.0 {
                    return Err(PricingError::InvalidRate {
                        model: entry.model.clone(),
                        rate,
                    });
                }
            }
        }
        Ok(Self { version, entries })
    }

    pub(crate) fn price_for(&self, model: &str) -> Result<&PricingEntry, AppError> {
        self.entries
            .iter()
            .find(|e| e.model == model)
            .ok_or_else(|| AppError::UnknownModel {
                model: model.to_string(),
            })
    }

    /// Non-failing lookup for display paths
    pub(crate) fn get(&self, model: &str) -> Option<&PricingEntry> {
        self.entries.iter().find(|e| e.model == model)
    }

    pub(crate) fn entries(&self) -> &[PricingEntry] {
        &self.entries
    }

    pub(crate) fn version(&self) -> &str {
        &self.version
    }
}

/// Dollar cost of a token pair at the entry's rates
pub(crate) fn calculate_cost(totals: &TokenTotals, pricing: &PricingEntry) -> f64 {
    totals.input_tokens as f64 * pricing.input_rate
        + totals.output_tokens as f64 * pricing.output_rate
}
