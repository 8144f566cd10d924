use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Largest profit or exempt distributions accepted for one accounting period
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Largest associated companies count accepted
pub const MAX_ASSOCIATED_COMPANIES: i64 = u32::MAX as i64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("accounting period end {end} is before start {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("accounting period {start} to {end} is longer than 12 months")]
    PeriodTooLong { start: NaiveDate, end: NaiveDate },
    #[error("profit must not be negative: {0}")]
    NegativeProfit(Decimal),
    #[error("exempt distributions must not be negative: {0}")]
    NegativeExemptDistributions(Decimal),
    #[error("{field} must not be negative: {value}")]
    NegativeAssociatedCompanies { field: &'static str, value: i64 },
    #[error("{field} {value} exceeds the maximum of {max}", max = MAX_AMOUNT)]
    AmountTooLarge { field: &'static str, value: Decimal },
    #[error("{field} {value} exceeds the maximum of {max}", max = MAX_ASSOCIATED_COMPANIES)]
    TooManyAssociatedCompanies { field: &'static str, value: i64 },
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Period { start, end }
    }

    /// An accounting period runs forwards and covers at most 12 months.
    pub fn validate(&self) -> Result<(), RequestError> {
        let (start, end) = (self.start, self.end);
        if end < start {
            return Err(RequestError::EndBeforeStart { start, end });
        }
        // 12 months on from 29 February clamps to 28 February, and the day
        // before 1 March may be 29 February, so take the later of both readings
        let year_on = Months::new(12);
        let latest_end = [
            start.checked_add_months(year_on).and_then(|d| d.pred_opt()),
            start.pred_opt().and_then(|d| d.checked_add_months(year_on)),
        ]
        .into_iter()
        .flatten()
        .max();
        if latest_end.is_some_and(|latest| end > latest) {
            return Err(RequestError::PeriodTooLong { start, end });
        }
        Ok(())
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Input to the marginal relief calculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationRequest {
    pub accounting_period_start: NaiveDate,
    /// Inclusive
    pub accounting_period_end: NaiveDate,
    pub profit: Decimal,
    pub exempt_distributions: Decimal,
    pub associated_companies: Option<i64>,
    /// Only meaningful when the period straddles two financial years
    pub associated_companies_fy1: Option<i64>,
    pub associated_companies_fy2: Option<i64>,
}

impl CalculationRequest {
    pub fn new(start: NaiveDate, end: NaiveDate, profit: Decimal) -> Self {
        CalculationRequest {
            accounting_period_start: start,
            accounting_period_end: end,
            profit,
            exempt_distributions: Decimal::ZERO,
            associated_companies: None,
            associated_companies_fy1: None,
            associated_companies_fy2: None,
        }
    }

    pub fn period(&self) -> Period {
        Period::new(self.accounting_period_start, self.accounting_period_end)
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        self.period().validate()?;
        if self.profit < Decimal::ZERO {
            return Err(RequestError::NegativeProfit(self.profit));
        }
        if self.exempt_distributions < Decimal::ZERO {
            return Err(RequestError::NegativeExemptDistributions(
                self.exempt_distributions,
            ));
        }
        let amounts = [
            ("profit", self.profit),
            ("exempt distributions", self.exempt_distributions),
        ];
        for (field, value) in amounts {
            if value > MAX_AMOUNT {
                return Err(RequestError::AmountTooLarge { field, value });
            }
        }
        let counts = [
            ("associated companies", self.associated_companies),
            ("associated companies FY1", self.associated_companies_fy1),
            ("associated companies FY2", self.associated_companies_fy2),
        ];
        for (field, count) in counts {
            match count {
                Some(value) if value < 0 => {
                    return Err(RequestError::NegativeAssociatedCompanies { field, value });
                }
                Some(value) if value > MAX_ASSOCIATED_COMPANIES => {
                    return Err(RequestError::TooManyAssociatedCompanies { field, value });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn twelve_month_period_is_valid() {
        let period = Period::new(date("2023-04-01"), date("2024-03-31"));
        assert_eq!(period.validate(), Ok(()));
        let one_day = Period::new(date("2023-04-01"), date("2023-04-01"));
        assert_eq!(one_day.validate(), Ok(()));
    }

    #[test]
    fn twelve_months_around_leap_day() {
        let from_leap_day = Period::new(date("2024-02-29"), date("2025-02-28"));
        assert_eq!(from_leap_day.validate(), Ok(()));
        let from_march = Period::new(date("2023-03-01"), date("2024-02-29"));
        assert_eq!(from_march.validate(), Ok(()));
        let too_long = Period::new(date("2023-03-01"), date("2024-03-01"));
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn end_before_start_rejected() {
        let period = Period::new(date("2023-04-02"), date("2023-04-01"));
        assert_eq!(
            period.validate(),
            Err(RequestError::EndBeforeStart {
                start: date("2023-04-02"),
                end: date("2023-04-01"),
            })
        );
    }

    #[test]
    fn period_over_twelve_months_rejected() {
        let period = Period::new(date("2023-04-01"), date("2024-04-01"));
        assert!(matches!(
            period.validate(),
            Err(RequestError::PeriodTooLong { .. })
        ));
    }

    #[test]
    fn negative_amounts_rejected() {
        let mut request = CalculationRequest::new(date("2023-04-01"), date("2024-03-31"), dec!(-1));
        assert_eq!(
            request.validate(),
            Err(RequestError::NegativeProfit(dec!(-1)))
        );

        request.profit = dec!(100);
        request.exempt_distributions = dec!(-5);
        assert_eq!(
            request.validate(),
            Err(RequestError::NegativeExemptDistributions(dec!(-5)))
        );

        request.exempt_distributions = Decimal::ZERO;
        request.associated_companies_fy2 = Some(-1);
        assert_eq!(
            request.validate(),
            Err(RequestError::NegativeAssociatedCompanies {
                field: "associated companies FY2",
                value: -1,
            })
        );
    }

    #[test]
    fn oversized_amounts_rejected() {
        let mut request =
            CalculationRequest::new(date("2023-04-01"), date("2024-03-31"), Decimal::MAX);
        request.exempt_distributions = Decimal::MAX;
        assert_eq!(
            request.validate(),
            Err(RequestError::AmountTooLarge {
                field: "profit",
                value: Decimal::MAX,
            })
        );

        request.profit = MAX_AMOUNT;
        assert_eq!(
            request.validate(),
            Err(RequestError::AmountTooLarge {
                field: "exempt distributions",
                value: Decimal::MAX,
            })
        );

        request.exempt_distributions = MAX_AMOUNT;
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn oversized_associated_companies_rejected() {
        let mut request =
            CalculationRequest::new(date("2023-04-01"), date("2024-03-31"), dec!(60000));
        request.associated_companies = Some(i64::MAX);
        assert_eq!(
            request.validate(),
            Err(RequestError::TooManyAssociatedCompanies {
                field: "associated companies",
                value: i64::MAX,
            })
        );

        request.associated_companies = Some(MAX_ASSOCIATED_COMPANIES);
        assert_eq!(request.validate(), Ok(()));
    }
}
