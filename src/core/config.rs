//! Per-financial-year tax rules and the table the calculator reads them from.

use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUILTIN_CONFIG: &str = include_str!("../../config/financial_years.json");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate configuration for financial year {0}")]
    DuplicateYear(i32),
    #[error("financial year {year}: marginal relief entry is missing {}", .missing.join(", "))]
    IncompleteMarginalRelief {
        year: i32,
        missing: Vec<&'static str>,
    },
    #[error("financial year {year}: lower threshold {lower} must be non-negative and below upper threshold {upper}")]
    InvalidThresholds {
        year: i32,
        lower: Decimal,
        upper: Decimal,
    },
    #[error("financial year {year}: {field} {value} is outside 0..=1")]
    RateOutOfRange {
        year: i32,
        field: &'static str,
        value: Decimal,
    },
}

/// A year taxed at a single rate with no relief
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRateConfig {
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub main_rate: Decimal,
}

/// A year with a small profits rate, a main rate and tapered relief between the thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarginalReliefConfig {
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub lower_threshold: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub upper_threshold: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub small_profit_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub main_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub marginal_relief_fraction: Decimal,
}

impl MarginalReliefConfig {
    /// Both thresholds unchanged between two years
    pub fn same_thresholds(&self, other: &MarginalReliefConfig) -> bool {
        self.lower_threshold == other.lower_threshold
            && self.upper_threshold == other.upper_threshold
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum FinancialYearConfig {
    FlatRate(FlatRateConfig),
    MarginalRelief(MarginalReliefConfig),
}

impl FinancialYearConfig {
    pub fn year(&self) -> i32 {
        match self {
            FinancialYearConfig::FlatRate(c) => c.year,
            FinancialYearConfig::MarginalRelief(c) => c.year,
        }
    }

    /// Same variant and same rules, ignoring the year
    pub fn same_rules(&self, other: &FinancialYearConfig) -> bool {
        match (self, other) {
            (FinancialYearConfig::FlatRate(a), FinancialYearConfig::FlatRate(b)) => {
                a.main_rate == b.main_rate
            }
            (FinancialYearConfig::MarginalRelief(a), FinancialYearConfig::MarginalRelief(b)) => {
                a.same_thresholds(b)
                    && a.small_profit_rate == b.small_profit_rate
                    && a.main_rate == b.main_rate
                    && a.marginal_relief_fraction == b.marginal_relief_fraction
            }
            _ => false,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let year = self.year();
        let check_rate = |field: &'static str, value: Decimal| {
            if value < Decimal::ZERO || value > Decimal::ONE {
                Err(ConfigError::RateOutOfRange { year, field, value })
            } else {
                Ok(())
            }
        };
        match self {
            FinancialYearConfig::FlatRate(c) => check_rate("main_rate", c.main_rate),
            FinancialYearConfig::MarginalRelief(c) => {
                if c.lower_threshold < Decimal::ZERO || c.lower_threshold >= c.upper_threshold {
                    return Err(ConfigError::InvalidThresholds {
                        year,
                        lower: c.lower_threshold,
                        upper: c.upper_threshold,
                    });
                }
                check_rate("small_profit_rate", c.small_profit_rate)?;
                check_rate("main_rate", c.main_rate)?;
                check_rate("marginal_relief_fraction", c.marginal_relief_fraction)
            }
        }
    }
}

/// Configuration file root
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub financial_years: Vec<FinancialYearEntry>,
}

/// One financial year as written in the configuration file.
///
/// An entry with only `year` and `main_rate` is a flat rate year. An entry
/// that also carries all four marginal relief fields is a marginal relief year.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FinancialYearEntry {
    /// Financial year, named by the calendar year it starts in (2023 = 2023/24)
    pub year: i32,
    /// Main rate as a fraction (0.25 = 25%)
    #[schemars(with = "f64")]
    pub main_rate: Decimal,
    /// Profit at or below which the small profits rate applies
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub lower_threshold: Option<Decimal>,
    /// Profit above which the main rate applies without relief
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub upper_threshold: Option<Decimal>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub small_profit_rate: Option<Decimal>,
    /// Standard fraction used to taper the relief (0.015 = 3/200)
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub marginal_relief_fraction: Option<Decimal>,
}

impl TryFrom<FinancialYearEntry> for FinancialYearConfig {
    type Error = ConfigError;

    fn try_from(entry: FinancialYearEntry) -> Result<Self, Self::Error> {
        let FinancialYearEntry {
            year,
            main_rate,
            lower_threshold,
            upper_threshold,
            small_profit_rate,
            marginal_relief_fraction,
        } = entry;

        match (
            lower_threshold,
            upper_threshold,
            small_profit_rate,
            marginal_relief_fraction,
        ) {
            (None, None, None, None) => {
                Ok(FinancialYearConfig::FlatRate(FlatRateConfig { year, main_rate }))
            }
            (Some(lower), Some(upper), Some(small), Some(fraction)) => {
                Ok(FinancialYearConfig::MarginalRelief(MarginalReliefConfig {
                    year,
                    lower_threshold: lower,
                    upper_threshold: upper,
                    small_profit_rate: small,
                    main_rate,
                    marginal_relief_fraction: fraction,
                }))
            }
            (lower, upper, small, fraction) => {
                let missing = [
                    ("lower_threshold", lower.is_none()),
                    ("upper_threshold", upper.is_none()),
                    ("small_profit_rate", small.is_none()),
                    ("marginal_relief_fraction", fraction.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(ConfigError::IncompleteMarginalRelief { year, missing })
            }
        }
    }
}

/// Validated financial year rules, unique by year and ordered by year
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationTable {
    years: BTreeMap<i32, FinancialYearConfig>,
}

impl ConfigurationTable {
    pub fn new(configs: Vec<FinancialYearConfig>) -> Result<Self, ConfigError> {
        let mut years = BTreeMap::new();
        for config in configs {
            config.validate()?;
            let year = config.year();
            if years.insert(year, config).is_some() {
                return Err(ConfigError::DuplicateYear(year));
            }
        }
        Ok(ConfigurationTable { years })
    }

    /// The table shipped with the binary
    pub fn builtin() -> Result<Self, ConfigError> {
        let table = Self::from_reader(BUILTIN_CONFIG.as_bytes())?;
        log::info!("Loaded {} built-in financial year(s)", table.len());
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let table = Self::from_reader(BufReader::new(file))?;
        log::info!(
            "Loaded {} financial year(s) from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_reader(reader)?;
        let configs = file
            .financial_years
            .into_iter()
            .map(FinancialYearConfig::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(configs)
    }

    /// Exact-year lookup
    pub fn get(&self, year: i32) -> Option<&FinancialYearConfig> {
        self.years.get(&year)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FinancialYearConfig> {
        self.years.values()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
