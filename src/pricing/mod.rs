mod db;
mod table;
mod types;

pub(crate) use db::{PricingTable, calculate_cost};
pub(crate) use types::PricingEntry;
