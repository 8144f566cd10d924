//! Config command - show the financial year rules in use

use crate::cmd::{format_gbp, format_rate};
use crate::core::{ConfigurationTable, FinancialYear, FinancialYearConfig};
use clap::Args;
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Financial year to show (e.g., 2023 for 2023/24)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Tabled)]
struct ConfigRow {
    #[tabled(rename = "Financial Year")]
    year: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Main Rate")]
    main_rate: String,
    #[tabled(rename = "Small Profits Rate")]
    small_profit_rate: String,
    #[tabled(rename = "Lower Threshold")]
    lower_threshold: String,
    #[tabled(rename = "Upper Threshold")]
    upper_threshold: String,
    #[tabled(rename = "MR Fraction")]
    fraction: String,
}

impl From<&FinancialYearConfig> for ConfigRow {
    fn from(config: &FinancialYearConfig) -> Self {
        let year = FinancialYear(config.year()).display();
        match config {
            FinancialYearConfig::FlatRate(c) => ConfigRow {
                year,
                kind: "Flat rate".to_string(),
                main_rate: percent(c.main_rate),
                small_profit_rate: "-".to_string(),
                lower_threshold: "-".to_string(),
                upper_threshold: "-".to_string(),
                fraction: "-".to_string(),
            },
            FinancialYearConfig::MarginalRelief(c) => ConfigRow {
                year,
                kind: "Marginal relief".to_string(),
                main_rate: percent(c.main_rate),
                small_profit_rate: percent(c.small_profit_rate),
                lower_threshold: format_gbp(c.lower_threshold),
                upper_threshold: format_gbp(c.upper_threshold),
                fraction: c.marginal_relief_fraction.normalize().to_string(),
            },
        }
    }
}

fn percent(rate: Decimal) -> String {
    format_rate(rate * Decimal::ONE_HUNDRED)
}

impl ConfigCommand {
    pub fn exec(&self, config: &ConfigurationTable) -> anyhow::Result<()> {
        let years: Vec<&FinancialYearConfig> = config
            .iter()
            .filter(|c| self.year.is_none_or(|y| c.year() == y))
            .collect();

        if let Some(year) = self.year.filter(|_| years.is_empty()) {
            anyhow::bail!("No configuration for financial year {year}");
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&years)?);
            return Ok(());
        }

        let rows: Vec<ConfigRow> = years.into_iter().map(ConfigRow::from).collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        Ok(())
    }
}
