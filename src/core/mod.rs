pub mod advisor;
pub mod calculator;
pub mod calendar;
pub mod config;
pub mod request;
pub mod result;

// Flat public surface for domain types and functions.
pub use advisor::{AssociatedCompaniesAdvisor, AssociatedCompaniesRequirement};
pub use calculator::{MarginalReliefCalculator, StraddlePolicy};
#[allow(unused_imports)]
pub use calendar::{
    days_between_inclusive, days_in_financial_year, financial_year_end, is_single_financial_year,
    FinancialYear,
};
pub use config::{ConfigFile, ConfigurationTable, FinancialYearConfig};
pub use request::{CalculationRequest, Period};
pub use result::MarginalReliefResult;
#[allow(unused_imports)]
pub use {config::ConfigError, request::RequestError, result::CalculatorError};
