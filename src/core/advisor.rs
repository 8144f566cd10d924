//! Tells a caller, before calculating, whether associated company counts are
//! needed and for which part of the accounting period.

use super::calendar::financial_year_end;
use super::config::{ConfigurationTable, FinancialYearConfig};
use super::request::Period;
use super::result::CalculatorError;
use chrono::{Datelike, Days};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum AssociatedCompaniesRequirement {
    /// Only flat rate years are involved
    NotRequired,
    /// One count covering this period
    OnePeriod { period: Period },
    /// Separate counts for each financial year's part of the period
    #[serde(rename = "TwoPeriod")]
    TwoPeriods { period1: Period, period2: Period },
}

pub struct AssociatedCompaniesAdvisor<'a> {
    config: &'a ConfigurationTable,
}

impl<'a> AssociatedCompaniesAdvisor<'a> {
    pub fn new(config: &'a ConfigurationTable) -> Self {
        AssociatedCompaniesAdvisor { config }
    }

    /// Unlike the calculator, every missing financial year is reported, one error each.
    pub fn requirement(
        &self,
        period: &Period,
    ) -> Result<AssociatedCompaniesRequirement, Vec<CalculatorError>> {
        let fy_end = financial_year_end(period.start);

        if fy_end >= period.end {
            let year = fy_end.year() - 1;
            return match self.config.get(year) {
                None => Err(vec![CalculatorError::ConfigMissing(vec![year])]),
                Some(FinancialYearConfig::FlatRate(_)) => {
                    Ok(AssociatedCompaniesRequirement::NotRequired)
                }
                Some(FinancialYearConfig::MarginalRelief(_)) => {
                    Ok(AssociatedCompaniesRequirement::OnePeriod { period: *period })
                }
            };
        }

        let fy1 = fy_end.year() - 1;
        let fy2 = fy_end.year();
        let lookups = [(fy1, self.config.get(fy1)), (fy2, self.config.get(fy2))];
        let errors: Vec<CalculatorError> = lookups
            .iter()
            .filter(|(_, config)| config.is_none())
            .map(|(year, _)| CalculatorError::ConfigMissing(vec![*year]))
            .collect();
        let (config1, config2) = match lookups {
            [(_, Some(c1)), (_, Some(c2))] => (c1, c2),
            _ => {
                log::warn!("Cannot advise on associated companies for {period}: {errors:?}");
                return Err(errors);
            }
        };

        let in_fy1 = Period::new(period.start, fy_end);
        let in_fy2 = Period::new(fy_end + Days::new(1), period.end);

        let requirement = match (config1, config2) {
            (FinancialYearConfig::FlatRate(_), FinancialYearConfig::FlatRate(_)) => {
                AssociatedCompaniesRequirement::NotRequired
            }
            (FinancialYearConfig::MarginalRelief(c1), FinancialYearConfig::MarginalRelief(c2)) => {
                if c1.same_thresholds(c2) {
                    AssociatedCompaniesRequirement::OnePeriod { period: *period }
                } else {
                    AssociatedCompaniesRequirement::TwoPeriods {
                        period1: in_fy1,
                        period2: in_fy2,
                    }
                }
            }
            (FinancialYearConfig::FlatRate(_), FinancialYearConfig::MarginalRelief(_)) => {
                AssociatedCompaniesRequirement::OnePeriod { period: in_fy2 }
            }
            (FinancialYearConfig::MarginalRelief(_), FinancialYearConfig::FlatRate(_)) => {
                AssociatedCompaniesRequirement::OnePeriod { period: in_fy1 }
            }
        };
        Ok(requirement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{FlatRateConfig, MarginalReliefConfig};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn period(start: &str, end: &str) -> Period {
        Period::new(date(start), date(end))
    }

    fn flat(year: i32) -> FinancialYearConfig {
        FinancialYearConfig::FlatRate(FlatRateConfig {
            year,
            main_rate: dec!(0.19),
        })
    }

    fn mr(year: i32, lower: Decimal, upper: Decimal) -> FinancialYearConfig {
        FinancialYearConfig::MarginalRelief(MarginalReliefConfig {
            year,
            lower_threshold: lower,
            upper_threshold: upper,
            small_profit_rate: dec!(0.19),
            main_rate: dec!(0.25),
            marginal_relief_fraction: dec!(0.015),
        })
    }

    fn advise(
        configs: Vec<FinancialYearConfig>,
        period: &Period,
    ) -> Result<AssociatedCompaniesRequirement, Vec<CalculatorError>> {
        let table = ConfigurationTable::new(configs).unwrap();
        AssociatedCompaniesAdvisor::new(&table).requirement(period)
    }

    #[test]
    fn single_flat_year_not_required() {
        let p = period("2022-04-01", "2023-03-31");
        assert_eq!(
            advise(vec![flat(2022)], &p),
            Ok(AssociatedCompaniesRequirement::NotRequired)
        );
    }

    #[test]
    fn single_marginal_relief_year_one_period() {
        let p = period("2023-04-01", "2024-03-31");
        assert_eq!(
            advise(vec![mr(2023, dec!(50000), dec!(250000))], &p),
            Ok(AssociatedCompaniesRequirement::OnePeriod { period: p })
        );
    }

    #[test]
    fn single_year_missing() {
        let p = period("2023-04-01", "2024-03-31");
        assert_eq!(
            advise(vec![], &p),
            Err(vec![CalculatorError::ConfigMissing(vec![2023])])
        );
    }

    #[test]
    fn straddled_flat_years_not_required() {
        let p = period("2021-10-01", "2022-09-30");
        assert_eq!(
            advise(vec![flat(2021), flat(2022)], &p),
            Ok(AssociatedCompaniesRequirement::NotRequired)
        );
    }

    #[test]
    fn straddled_unchanged_thresholds_one_period() {
        let p = period("2023-10-01", "2024-09-30");
        let configs = vec![
            mr(2023, dec!(50000), dec!(250000)),
            mr(2024, dec!(50000), dec!(250000)),
        ];
        assert_eq!(
            advise(configs, &p),
            Ok(AssociatedCompaniesRequirement::OnePeriod { period: p })
        );
    }

    #[test]
    fn straddled_changed_lower_threshold_two_periods() {
        let p = period("2023-10-01", "2024-09-30");
        let configs = vec![
            mr(2023, dec!(50000), dec!(250000)),
            mr(2024, dec!(60000), dec!(250000)),
        ];
        assert_eq!(
            advise(configs, &p),
            Ok(AssociatedCompaniesRequirement::TwoPeriods {
                period1: period("2023-10-01", "2024-03-31"),
                period2: period("2024-04-01", "2024-09-30"),
            })
        );
    }

    #[test]
    fn straddled_flat_then_marginal_relief_asks_for_second_part() {
        let p = period("2022-10-01", "2023-09-30");
        assert_eq!(
            advise(vec![flat(2022), mr(2023, dec!(50000), dec!(250000))], &p),
            Ok(AssociatedCompaniesRequirement::OnePeriod {
                period: period("2023-04-01", "2023-09-30")
            })
        );
    }

    #[test]
    fn straddled_marginal_relief_then_flat_asks_for_first_part() {
        let p = period("2022-10-01", "2023-09-30");
        assert_eq!(
            advise(vec![mr(2022, dec!(50000), dec!(250000)), flat(2023)], &p),
            Ok(AssociatedCompaniesRequirement::OnePeriod {
                period: period("2022-10-01", "2023-03-31")
            })
        );
    }

    #[test]
    fn straddled_reports_every_missing_year() {
        let p = period("2022-10-01", "2023-09-30");
        assert_eq!(
            advise(vec![], &p),
            Err(vec![
                CalculatorError::ConfigMissing(vec![2022]),
                CalculatorError::ConfigMissing(vec![2023]),
            ])
        );
        assert_eq!(
            advise(vec![flat(2022)], &p),
            Err(vec![CalculatorError::ConfigMissing(vec![2023])])
        );
    }

    #[test]
    fn serializes_two_period_discriminator() {
        let requirement = AssociatedCompaniesRequirement::TwoPeriods {
            period1: period("2023-10-01", "2024-03-31"),
            period2: period("2024-04-01", "2024-09-30"),
        };
        let json = serde_json::to_value(&requirement).unwrap();
        assert_eq!(json["type"], "TwoPeriod");
        assert_eq!(json["period1"]["start"], "2023-10-01");
        assert_eq!(json["period2"]["end"], "2024-09-30");
    }
}
