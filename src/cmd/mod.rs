pub mod associated_companies;
pub mod calculate;
pub mod config;
pub mod schema;
pub mod serve;

use crate::core::ConfigurationTable;
use rust_decimal::Decimal;
use std::path::Path;

/// Load the configuration file, or the built-in table when no file is given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ConfigurationTable> {
    let table = match path {
        Some(path) => ConfigurationTable::from_path(path)?,
        None => ConfigurationTable::builtin()?,
    };
    if table.is_empty() {
        log::warn!("Configuration contains no financial years");
    }
    Ok(table)
}

pub(crate) fn format_gbp(amount: Decimal) -> String {
    format!("£{:.2}", amount)
}

pub(crate) fn format_rate(rate: Decimal) -> String {
    format!("{:.2}%", rate)
}
