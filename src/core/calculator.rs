//! Marginal relief calculation over one or two financial years.
//!
//! An accounting period that ends on or before the 31 March following its
//! start is calculated against that single financial year. Otherwise the
//! period straddles two financial years and profit, exempt distributions and
//! thresholds are apportioned by days across both.

use super::calendar::{
    days_between_inclusive, days_in_financial_year, financial_year_end, is_single_financial_year,
};
use super::config::{ConfigurationTable, FinancialYearConfig, FlatRateConfig, MarginalReliefConfig};
use super::request::CalculationRequest;
use super::result::{
    round2, CalculatorError, DualResult, MarginalReliefByYear, MarginalReliefResult, SingleResult,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// How a period straddling two financial years with identical rules is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StraddlePolicy {
    /// Calculate as one undivided period and return a single result
    #[default]
    CollapseUnchanged,
    /// Always split by financial year and return a dual result
    AlwaysSplit,
}

pub struct MarginalReliefCalculator<'a> {
    config: &'a ConfigurationTable,
    straddle: StraddlePolicy,
}

impl<'a> MarginalReliefCalculator<'a> {
    pub fn new(config: &'a ConfigurationTable) -> Self {
        MarginalReliefCalculator {
            config,
            straddle: StraddlePolicy::default(),
        }
    }

    pub fn with_straddle_policy(mut self, straddle: StraddlePolicy) -> Self {
        self.straddle = straddle;
        self
    }

    /// Calculate corporation tax and marginal relief for an accounting period.
    ///
    /// The request is expected to have passed [`CalculationRequest::validate`]:
    /// end on or after start, at most 12 months long, non-negative amounts.
    /// Fails with the financial year(s) that have no configuration.
    pub fn compute(
        &self,
        request: &CalculationRequest,
    ) -> Result<MarginalReliefResult, CalculatorError> {
        let start = request.accounting_period_start;
        let end = request.accounting_period_end;
        let days_in_ap = days_between_inclusive(start, end);
        let fy_end = financial_year_end(start);

        if is_single_financial_year(start, end) {
            self.single_financial_year(request, fy_end, days_in_ap)
        } else {
            self.straddled_financial_years(request, fy_end, days_in_ap)
        }
    }

    fn single_financial_year(
        &self,
        request: &CalculationRequest,
        fy_end: NaiveDate,
        days_in_ap: i64,
    ) -> Result<MarginalReliefResult, CalculatorError> {
        let year = fy_end.year() - 1;
        log::debug!(
            "Accounting period {} to {} falls in financial year {}",
            request.accounting_period_start,
            request.accounting_period_end,
            year
        );

        let config = self.config.get(year).ok_or_else(|| missing(vec![year]))?;
        let companies = request.associated_companies.unwrap_or(0) + 1;
        Ok(whole_period(config, request, days_in_ap, companies))
    }

    fn straddled_financial_years(
        &self,
        request: &CalculationRequest,
        fy_end: NaiveDate,
        days_in_ap: i64,
    ) -> Result<MarginalReliefResult, CalculatorError> {
        let fy1 = fy_end.year() - 1;
        let fy2 = fy_end.year();
        let ap_days_fy1 = days_between_inclusive(request.accounting_period_start, fy_end);
        let ap_days_fy2 = days_in_ap - ap_days_fy1;
        log::debug!(
            "Accounting period {} to {} straddles financial years {} ({} days) and {} ({} days)",
            request.accounting_period_start,
            request.accounting_period_end,
            fy1,
            ap_days_fy1,
            fy2,
            ap_days_fy2
        );

        let (config1, config2) = match (self.config.get(fy1), self.config.get(fy2)) {
            (Some(c1), Some(c2)) => (c1, c2),
            (None, None) => return Err(missing(vec![fy1, fy2])),
            (None, Some(_)) => return Err(missing(vec![fy1])),
            (Some(_), None) => return Err(missing(vec![fy2])),
        };

        if self.straddle == StraddlePolicy::CollapseUnchanged && config1.same_rules(config2) {
            log::debug!("Financial years {fy1} and {fy2} share the same rules, calculating as one period");
            let companies = associated_companies_for(request, fy1, fy1, true);
            return Ok(whole_period(config1, request, days_in_ap, companies));
        }

        let part1 = Apportioned::new(request, ap_days_fy1, days_in_ap);
        let part2 = Apportioned::new(request, ap_days_fy2, days_in_ap);
        let basis = year_basis(days_in_ap);

        let (year_one, year_two) = match (config1, config2) {
            (FinancialYearConfig::FlatRate(c1), FinancialYearConfig::FlatRate(c2)) => {
                (flat_rate(c1, &part1), flat_rate(c2, &part2))
            }
            (FinancialYearConfig::MarginalRelief(c1), FinancialYearConfig::MarginalRelief(c2)) => {
                let thresholds_unchanged = c1.same_thresholds(c2);
                let ratio = |ap_days: i64, year: i32| {
                    if c1.upper_threshold != c2.upper_threshold {
                        Decimal::from(ap_days) / Decimal::from(days_in_financial_year(year))
                    } else {
                        Decimal::from(ap_days) / basis
                    }
                };
                (
                    marginal_relief(
                        c1,
                        &part1,
                        ratio(ap_days_fy1, fy1),
                        associated_companies_for(request, fy1, fy1, thresholds_unchanged),
                    ),
                    marginal_relief(
                        c2,
                        &part2,
                        ratio(ap_days_fy2, fy2),
                        associated_companies_for(request, fy2, fy1, thresholds_unchanged),
                    ),
                )
            }
            // Only the marginal relief year needs a count. Its own FY value is
            // used, then the period-wide value, then none.
            (FinancialYearConfig::FlatRate(c1), FinancialYearConfig::MarginalRelief(c2)) => {
                let companies = request
                    .associated_companies_fy2
                    .or(request.associated_companies)
                    .unwrap_or(0)
                    + 1;
                (
                    flat_rate(c1, &part1),
                    marginal_relief(
                        c2,
                        &part2,
                        Decimal::from(ap_days_fy2) / basis,
                        companies,
                    ),
                )
            }
            (FinancialYearConfig::MarginalRelief(c1), FinancialYearConfig::FlatRate(c2)) => {
                let companies = request
                    .associated_companies_fy1
                    .or(request.associated_companies)
                    .unwrap_or(0)
                    + 1;
                (
                    marginal_relief(
                        c1,
                        &part1,
                        Decimal::from(ap_days_fy1) / basis,
                        companies,
                    ),
                    flat_rate(c2, &part2),
                )
            }
        };

        Ok(dual_result(year_one, year_two, request.profit))
    }
}

fn missing(years: Vec<i32>) -> CalculatorError {
    log::warn!("No configuration for financial year(s) {years:?}");
    CalculatorError::ConfigMissing(years)
}

/// 366 for a full leap-year-length period, 365 for anything else
fn year_basis(days_in_ap: i64) -> Decimal {
    if days_in_ap == 366 {
        dec!(366)
    } else {
        dec!(365)
    }
}

/// Associated companies plus the company itself, for the sub-period in `year`.
///
/// A single `associated_companies` value wins. A value given for only one of
/// the financial years applies to both. With both given, the larger is used
/// when thresholds did not change, otherwise each year takes its own value.
pub fn associated_companies_for(
    request: &CalculationRequest,
    year: i32,
    fy1: i32,
    thresholds_unchanged: bool,
) -> i64 {
    let associated = match (
        request.associated_companies,
        request.associated_companies_fy1,
        request.associated_companies_fy2,
    ) {
        (Some(n), _, _) => n,
        (None, Some(n1), None) => n1,
        (None, None, Some(n2)) => n2,
        (None, Some(n1), Some(n2)) if thresholds_unchanged => n1.max(n2),
        (None, Some(n1), Some(n2)) => {
            if year == fy1 {
                n1
            } else {
                n2
            }
        }
        (None, None, None) => 0,
    };
    associated + 1
}

/// Profit and exempt distributions for the days of a sub-period
struct Apportioned {
    profit: Decimal,
    exempt_distributions: Decimal,
}

impl Apportioned {
    fn new(request: &CalculationRequest, ap_days: i64, days_in_ap: i64) -> Self {
        let ratio = Decimal::from(ap_days) / Decimal::from(days_in_ap);
        Apportioned {
            profit: request.profit * ratio,
            exempt_distributions: request.exempt_distributions * ratio,
        }
    }

    fn whole(request: &CalculationRequest) -> Self {
        Apportioned {
            profit: request.profit,
            exempt_distributions: request.exempt_distributions,
        }
    }
}

/// Unrounded figures for one financial year's share of the period
#[derive(Debug, Clone, Copy)]
struct YearFigures {
    year: i32,
    profit: Decimal,
    tax_before_mr: Decimal,
    marginal_relief: Decimal,
}

impl YearFigures {
    fn corporation_tax(&self) -> Decimal {
        self.tax_before_mr - self.marginal_relief
    }

    fn by_year(&self) -> MarginalReliefByYear {
        MarginalReliefByYear {
            year: self.year,
            corporation_tax_before_mr: round2(self.tax_before_mr),
            effective_rate_before_mr: round2(percentage(self.tax_before_mr, self.profit)),
            corporation_tax: round2(self.corporation_tax()),
            effective_rate: round2(percentage(self.corporation_tax(), self.profit)),
            marginal_relief: round2(self.marginal_relief),
        }
    }

    fn single(&self) -> SingleResult {
        let MarginalReliefByYear {
            corporation_tax_before_mr,
            effective_rate_before_mr,
            corporation_tax,
            effective_rate,
            marginal_relief,
            ..
        } = self.by_year();
        SingleResult {
            corporation_tax_before_mr,
            effective_rate_before_mr,
            corporation_tax,
            effective_rate,
            marginal_relief,
        }
    }
}

fn percentage(tax: Decimal, profit: Decimal) -> Decimal {
    if profit.is_zero() {
        Decimal::ZERO
    } else {
        tax / profit * Decimal::ONE_HUNDRED
    }
}

fn whole_period(
    config: &FinancialYearConfig,
    request: &CalculationRequest,
    days_in_ap: i64,
    companies: i64,
) -> MarginalReliefResult {
    let whole = Apportioned::whole(request);
    let figures = match config {
        FinancialYearConfig::FlatRate(c) => flat_rate(c, &whole),
        FinancialYearConfig::MarginalRelief(c) => {
            let ratio = Decimal::from(days_in_ap) / year_basis(days_in_ap);
            marginal_relief(c, &whole, ratio, companies)
        }
    };
    MarginalReliefResult::SingleResult(figures.single())
}

fn flat_rate(config: &FlatRateConfig, part: &Apportioned) -> YearFigures {
    YearFigures {
        year: config.year,
        profit: part.profit,
        tax_before_mr: part.profit * config.main_rate,
        marginal_relief: Decimal::ZERO,
    }
}

fn marginal_relief(
    config: &MarginalReliefConfig,
    part: &Apportioned,
    threshold_ratio: Decimal,
    companies: i64,
) -> YearFigures {
    let companies = Decimal::from(companies);
    let lower = config.lower_threshold * threshold_ratio / companies;
    let upper = config.upper_threshold * threshold_ratio / companies;
    let augmented = part.profit + part.exempt_distributions;

    let rate = if augmented <= lower {
        config.small_profit_rate
    } else {
        config.main_rate
    };
    let tax_before_mr = part.profit * rate;

    let marginal_relief = if augmented > lower && augmented <= upper {
        config.marginal_relief_fraction * (upper - augmented) * (part.profit / augmented)
    } else {
        Decimal::ZERO
    };

    YearFigures {
        year: config.year,
        profit: part.profit,
        tax_before_mr,
        marginal_relief,
    }
}

fn dual_result(year_one: YearFigures, year_two: YearFigures, profit: Decimal) -> MarginalReliefResult {
    let tax_before_mr = year_one.tax_before_mr + year_two.tax_before_mr;
    let tax = year_one.corporation_tax() + year_two.corporation_tax();
    MarginalReliefResult::DualResult(DualResult {
        year_one: year_one.by_year(),
        year_two: year_two.by_year(),
        effective_rate_before_mr: round2(percentage(tax_before_mr, profit)),
        effective_rate: round2(percentage(tax, profit)),
    })
}
