use chrono::{Datelike, NaiveDate};

/// UK Financial Year (runs 1 April to 31 March)
/// The year value is the calendar year in which it starts (e.g., 2023 = 2023/24)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FinancialYear(pub i32);

impl FinancialYear {
    /// Financial year containing a date
    pub fn from_date(date: NaiveDate) -> Self {
        FinancialYear(financial_year_end(date).year() - 1)
    }

    /// Start date of the financial year (1 April)
    pub fn start_date(&self) -> NaiveDate {
        ymd(self.0, 4, 1)
    }

    /// End date of the financial year (31 March of the following year)
    pub fn end_date(&self) -> NaiveDate {
        ymd(self.0 + 1, 3, 31)
    }

    /// Number of days in the financial year, 366 when it contains 29 February
    pub fn days(&self) -> i64 {
        days_between_inclusive(self.start_date(), self.end_date())
    }

    /// Display as "2023/24" format
    pub fn display(&self) -> String {
        format!("{}/{:02}", self.0, (self.0 + 1) % 100)
    }
}

impl std::fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// The 31 March that ends the financial year containing `date`.
pub fn financial_year_end(date: NaiveDate) -> NaiveDate {
    if date.month() <= 3 {
        ymd(date.year(), 3, 31)
    } else {
        ymd(date.year() + 1, 3, 31)
    }
}

/// Day count between two dates, counting both ends.
pub fn days_between_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

pub fn days_in_financial_year(year: i32) -> i64 {
    FinancialYear(year).days()
}

/// True when the period ends on or before the end of the financial year it starts in.
pub fn is_single_financial_year(start: NaiveDate, end: NaiveDate) -> bool {
    financial_year_end(start) >= end
}

// 31 March and 1 April exist in every year chrono can represent
fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX)
}
