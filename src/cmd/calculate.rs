//! Calculate command - corporation tax and marginal relief for one accounting period

use crate::cmd::{format_gbp, format_rate};
use crate::core::result::{MarginalReliefByYear, SingleResult};
use crate::core::{
    CalculationRequest, ConfigurationTable, FinancialYear, MarginalReliefCalculator,
    MarginalReliefResult, StraddlePolicy,
};
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct CalculateCommand {
    /// Accounting period start (YYYY-MM-DD)
    #[arg(short, long)]
    start: NaiveDate,

    /// Accounting period end, inclusive (YYYY-MM-DD)
    #[arg(short, long)]
    end: NaiveDate,

    /// Taxable profit for the accounting period
    #[arg(short, long)]
    profit: Decimal,

    /// Exempt distributions received in the accounting period
    #[arg(long, default_value_t = Decimal::ZERO)]
    exempt_distributions: Decimal,

    /// Number of associated companies
    #[arg(short, long)]
    associated_companies: Option<i64>,

    /// Associated companies in the first financial year (straddling periods)
    #[arg(long)]
    associated_companies_fy1: Option<i64>,

    /// Associated companies in the second financial year (straddling periods)
    #[arg(long)]
    associated_companies_fy2: Option<i64>,

    /// Split straddling periods by financial year even when the rules did not change
    #[arg(long)]
    always_split: bool,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Tabled)]
struct ResultRow {
    #[tabled(rename = "Financial Year")]
    year: String,
    #[tabled(rename = "CT before MR")]
    tax_before_mr: String,
    #[tabled(rename = "Rate before MR")]
    rate_before_mr: String,
    #[tabled(rename = "Marginal Relief")]
    marginal_relief: String,
    #[tabled(rename = "Corporation Tax")]
    corporation_tax: String,
    #[tabled(rename = "Effective Rate")]
    effective_rate: String,
}

impl ResultRow {
    fn single(year: String, r: &SingleResult) -> Self {
        ResultRow {
            year,
            tax_before_mr: format_gbp(r.corporation_tax_before_mr),
            rate_before_mr: format_rate(r.effective_rate_before_mr),
            marginal_relief: format_gbp(r.marginal_relief),
            corporation_tax: format_gbp(r.corporation_tax),
            effective_rate: format_rate(r.effective_rate),
        }
    }

    fn by_year(r: &MarginalReliefByYear) -> Self {
        ResultRow {
            year: FinancialYear(r.year).display(),
            tax_before_mr: format_gbp(r.corporation_tax_before_mr),
            rate_before_mr: format_rate(r.effective_rate_before_mr),
            marginal_relief: format_gbp(r.marginal_relief),
            corporation_tax: format_gbp(r.corporation_tax),
            effective_rate: format_rate(r.effective_rate),
        }
    }
}

impl CalculateCommand {
    pub fn exec(&self, config: &ConfigurationTable) -> anyhow::Result<()> {
        let request = self.request();
        request.validate()?;

        let straddle = if self.always_split {
            StraddlePolicy::AlwaysSplit
        } else {
            StraddlePolicy::CollapseUnchanged
        };
        let result = MarginalReliefCalculator::new(config)
            .with_straddle_policy(straddle)
            .compute(&request)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            self.print_table(&request, &result);
        }
        Ok(())
    }

    fn request(&self) -> CalculationRequest {
        let mut request = CalculationRequest::new(self.start, self.end, self.profit);
        request.exempt_distributions = self.exempt_distributions;
        request.associated_companies = self.associated_companies;
        request.associated_companies_fy1 = self.associated_companies_fy1;
        request.associated_companies_fy2 = self.associated_companies_fy2;
        request
    }

    fn print_table(&self, request: &CalculationRequest, result: &MarginalReliefResult) {
        println!();
        println!("MARGINAL RELIEF ({})", request.period());
        println!("Profit: {}", format_gbp(request.profit));
        if !request.exempt_distributions.is_zero() {
            println!(
                "Exempt distributions: {}",
                format_gbp(request.exempt_distributions)
            );
        }
        println!();

        let rows = match result {
            MarginalReliefResult::SingleResult(r) => {
                let start = FinancialYear::from_date(request.accounting_period_start);
                let end = FinancialYear::from_date(request.accounting_period_end);
                let year = if start == end {
                    start.display()
                } else {
                    format!("{} - {}", start, end)
                };
                vec![ResultRow::single(year, r)]
            }
            MarginalReliefResult::DualResult(r) => vec![
                ResultRow::by_year(&r.year_one),
                ResultRow::by_year(&r.year_two),
            ],
        };

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);

        if let MarginalReliefResult::DualResult(r) = result {
            println!();
            println!(
                "Accounting period: corporation tax {}, marginal relief {}, effective rate {} ({} before marginal relief)",
                format_gbp(result.corporation_tax()),
                format_gbp(result.marginal_relief()),
                format_rate(r.effective_rate),
                format_rate(r.effective_rate_before_mr)
            );
        }
    }
}
