//! Associated companies command - which counts a calculation needs

use crate::core::{
    AssociatedCompaniesAdvisor, AssociatedCompaniesRequirement, ConfigurationTable, Period,
};
use chrono::NaiveDate;
use clap::Args;

#[derive(Args, Debug)]
pub struct AssociatedCompaniesCommand {
    /// Accounting period start (YYYY-MM-DD)
    #[arg(short, long)]
    start: NaiveDate,

    /// Accounting period end, inclusive (YYYY-MM-DD)
    #[arg(short, long)]
    end: NaiveDate,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl AssociatedCompaniesCommand {
    pub fn exec(&self, config: &ConfigurationTable) -> anyhow::Result<()> {
        let period = Period::new(self.start, self.end);
        period.validate()?;

        let requirement = match AssociatedCompaniesAdvisor::new(config).requirement(&period) {
            Ok(requirement) => requirement,
            Err(errors) => {
                for e in &errors {
                    eprintln!("{e}");
                }
                anyhow::bail!("{} financial year(s) missing from configuration", errors.len());
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&requirement)?);
        } else {
            print_text(&requirement);
        }
        Ok(())
    }
}

fn print_text(requirement: &AssociatedCompaniesRequirement) {
    match requirement {
        AssociatedCompaniesRequirement::NotRequired => {
            println!("Associated companies are not required (flat rate only)");
        }
        AssociatedCompaniesRequirement::OnePeriod { period } => {
            println!("Associated companies required for {period}");
            println!("  pass --associated-companies");
        }
        AssociatedCompaniesRequirement::TwoPeriods { period1, period2 } => {
            println!("Associated companies required separately for each financial year:");
            println!("  {period1}  (--associated-companies-fy1)");
            println!("  {period2}  (--associated-companies-fy2)");
        }
    }
}
