//! Schema command - print the expected configuration file format

use crate::core::ConfigFile;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema or fields
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the configuration file
    JsonSchema,
    /// Field descriptions for a financial year entry
    Fields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::Fields => self.print_fields(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(ConfigFile);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_fields(&self) -> anyhow::Result<()> {
        println!("Financial Year Entry");
        println!("====================");
        println!();
        for (name, required, description) in FIELD_DESCRIPTIONS {
            let req = if *required { "required" } else { "optional" };
            println!("{:26} ({:8})  {}", name, req, description);
        }
        println!();
        println!("Give all four optional fields for a marginal relief year, none for a flat rate year.");
        Ok(())
    }
}

const FIELD_DESCRIPTIONS: &[(&str, bool, &str)] = &[
    (
        "year",
        true,
        "Financial year by starting calendar year (2023 = 2023/24)",
    ),
    ("main_rate", true, "Main rate as a fraction (0.25 = 25%)"),
    (
        "lower_threshold",
        false,
        "Profit at or below which the small profits rate applies",
    ),
    (
        "upper_threshold",
        false,
        "Profit above which no marginal relief is given",
    ),
    ("small_profit_rate", false, "Small profits rate as a fraction"),
    (
        "marginal_relief_fraction",
        false,
        "Standard fraction for marginal relief (0.015 = 3/200)",
    ),
];
