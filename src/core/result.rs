use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CalculatorError {
    /// Ascending list of the one or two financial years with no configuration
    #[error("Configuration missing for financial year(s): {}", join_years(.0))]
    ConfigMissing(Vec<i32>),
}

fn join_years(years: &[i32]) -> String {
    years
        .iter()
        .map(|y| y.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Half-up to pence / hundredths of a percent
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum MarginalReliefResult {
    SingleResult(SingleResult),
    DualResult(DualResult),
}

impl MarginalReliefResult {
    /// Corporation tax after relief across the whole accounting period
    pub fn corporation_tax(&self) -> Decimal {
        match self {
            MarginalReliefResult::SingleResult(r) => r.corporation_tax,
            MarginalReliefResult::DualResult(r) => {
                r.year_one.corporation_tax + r.year_two.corporation_tax
            }
        }
    }

    pub fn marginal_relief(&self) -> Decimal {
        match self {
            MarginalReliefResult::SingleResult(r) => r.marginal_relief,
            MarginalReliefResult::DualResult(r) => {
                r.year_one.marginal_relief + r.year_two.marginal_relief
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleResult {
    #[serde(rename = "corporationTaxBeforeMR", with = "rust_decimal::serde::float")]
    pub corporation_tax_before_mr: Decimal,
    #[serde(rename = "effectiveRateBeforeMR", with = "rust_decimal::serde::float")]
    pub effective_rate_before_mr: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub corporation_tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub effective_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub marginal_relief: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DualResult {
    pub year_one: MarginalReliefByYear,
    pub year_two: MarginalReliefByYear,
    #[serde(rename = "effectiveRateBeforeMR", with = "rust_decimal::serde::float")]
    pub effective_rate_before_mr: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub effective_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginalReliefByYear {
    pub year: i32,
    #[serde(rename = "corporationTaxBeforeMR", with = "rust_decimal::serde::float")]
    pub corporation_tax_before_mr: Decimal,
    #[serde(rename = "effectiveRateBeforeMR", with = "rust_decimal::serde::float")]
    pub effective_rate_before_mr: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub corporation_tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub effective_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub marginal_relief: Decimal,
}
