use chrono::{Datelike, NaiveDate};

/// Assigns calendar dates to hockey seasons that straddle two years.
///
/// Dates in `boundary_month` or later open a new season; earlier months
/// belong to the season that started the previous year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonCutoff {
    boundary_month: u32,
}

impl SeasonCutoff {
    pub fn new(boundary_month: u32) -> Self {
        Self {
            boundary_month: boundary_month.clamp(1, 12),
        }
    }

    pub fn boundary_month(&self) -> u32 {
        self.boundary_month
    }

    pub fn season_start_year(&self, date: NaiveDate) -> i32 {
        self.start_year_for(date.year(), date.month())
    }

    /// Same as `season_start_year` for data that only carries year/month.
    pub fn start_year_for(&self, year: i32, month: u32) -> i32 {
        if month >= self.boundary_month {
            year
        } else {
            year - 1
        }
    }

    /// The year the season finishes in. Game-log pages are indexed by it.
    pub fn season_end_year(&self, date: NaiveDate) -> i32 {
        self.season_start_year(date) + 1
    }
}

impl Default for SeasonCutoff {
    fn default() -> Self {
        Self::new(7)
    }
}
