use chrono::{Datelike, NaiveDate};

use crate::classify::{NamePart, NameRole, SuspensionGames};
use crate::money::Money;

/// One suspension or fine handed out by the Department of Player Safety.
///
/// The scraper fills the raw text fields. The cleaner adds `derived`, and the
/// lookup/augmenter stages append `extra` columns (`off_nhl_id`, `off_goals`,
/// `vic_time_on_ice`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct DisciplinaryRecord {
    /// Position in the scraped table. The manual patch table is keyed on it,
    /// so it survives row drops.
    pub index: usize,
    pub off_date: String,
    pub offender: String,
    pub off_team: String,
    pub offense: String,
    pub dops_date: Option<String>,
    pub susp: String,
    pub forfeit_sal: Option<String>,
    pub fine: Option<String>,
    pub derived: Option<Derived>,
    pub extra: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub offense_cat: String,
    pub victim: String,
    pub games: Option<SuspensionGames>,
    pub forfeit: Money,
    pub fine_amount: Money,
    pub off_date: Option<NaiveDate>,
    pub dops_date: Option<NaiveDate>,
    pub off_last_name: Option<String>,
    pub off_first_name: Option<String>,
    pub vic_last_name: Option<String>,
    pub vic_first_name: Option<String>,
}

impl Derived {
    pub fn name(&self, role: NameRole, part: NamePart) -> Option<&str> {
        match (role, part) {
            (NameRole::Offender, NamePart::First) => self.off_first_name.as_deref(),
            (NameRole::Offender, NamePart::Last) => self.off_last_name.as_deref(),
            (NameRole::Victim, NamePart::First) => self.vic_first_name.as_deref(),
            (NameRole::Victim, NamePart::Last) => self.vic_last_name.as_deref(),
        }
    }
}

/// Index column first, with an empty header, as pandas writes it.
pub const RAW_COLUMNS: &[&str] = &[
    "",
    "off_date",
    "offender",
    "off_team",
    "offense",
    "dops_date",
    "susp",
    "forfeit_sal",
    "fine",
];

pub const DERIVED_COLUMNS: &[&str] = &[
    "offense_cat",
    "victim",
    "total_susp_games",
    "playoff_susp_games",
    "preseason_susp_games",
    "reg_susp_games",
    "fine_amount",
    "off_year",
    "off_month",
    "off_day",
    "dops_year",
    "dops_month",
    "dops_day",
    "off_last_name",
    "off_first_name",
    "vic_last_name",
    "vic_first_name",
];

impl DisciplinaryRecord {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            off_date: String::new(),
            offender: String::new(),
            off_team: String::new(),
            offense: String::new(),
            dops_date: None,
            susp: String::new(),
            forfeit_sal: None,
            fine: None,
            derived: None,
            extra: Vec::new(),
        }
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace an extension column, keeping first-insert order.
    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.extra.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.extra.push((key, value)),
        }
    }

    /// Cell values for `RAW_COLUMNS` followed by `DERIVED_COLUMNS` when the
    /// record has been cleaned.
    pub fn base_cells(&self, with_derived: bool) -> Vec<String> {
        let mut cells = Vec::with_capacity(RAW_COLUMNS.len() + DERIVED_COLUMNS.len());
        cells.push(self.index.to_string());
        match self.derived.as_ref() {
            Some(d) => {
                cells.push(opt_date(d.off_date));
                cells.push(self.offender.clone());
                cells.push(self.off_team.clone());
                cells.push(self.offense.clone());
                cells.push(opt_date(d.dops_date));
                cells.push(self.susp.clone());
                cells.push(d.forfeit.to_string());
            }
            None => {
                cells.push(self.off_date.clone());
                cells.push(self.offender.clone());
                cells.push(self.off_team.clone());
                cells.push(self.offense.clone());
                cells.push(self.dops_date.clone().unwrap_or_default());
                cells.push(self.susp.clone());
                cells.push(self.forfeit_sal.clone().unwrap_or_default());
            }
        }
        cells.push(self.fine.clone().unwrap_or_default());

        if !with_derived {
            return cells;
        }
        let Some(d) = self.derived.as_ref() else {
            cells.extend(std::iter::repeat_n(String::new(), DERIVED_COLUMNS.len()));
            return cells;
        };
        cells.push(d.offense_cat.clone());
        cells.push(d.victim.clone());
        match d.games {
            Some(g) => {
                cells.push(g.total.to_string());
                cells.push(g.playoff.to_string());
                cells.push(g.preseason.to_string());
                cells.push(g.regular().to_string());
            }
            None => cells.extend(std::iter::repeat_n(String::new(), 4)),
        }
        cells.push(d.fine_amount.to_string());
        let (y, m, day) = date_parts(d.off_date);
        cells.extend([y.to_string(), m.to_string(), day.to_string()]);
        let (y, m, day) = date_parts(d.dops_date);
        cells.extend([y.to_string(), m.to_string(), day.to_string()]);
        for name in [
            &d.off_last_name,
            &d.off_first_name,
            &d.vic_last_name,
            &d.vic_first_name,
        ] {
            cells.push(name.clone().unwrap_or_default());
        }
        cells
    }
}

/// Year, month and day, or zeros when the date is unknown.
pub fn date_parts(date: Option<NaiveDate>) -> (i32, u32, u32) {
    date.map(|d| (d.year(), d.month(), d.day()))
        .unwrap_or((0, 0, 0))
}

fn opt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_extra_replaces_in_place() {
        let mut record = DisciplinaryRecord::new(3);
        record.set_extra("off_goals", "1");
        record.set_extra("vic_goals", "2");
        record.set_extra("off_goals", "4");
        assert_eq!(
            record.extra,
            vec![
                ("off_goals".to_string(), "4".to_string()),
                ("vic_goals".to_string(), "2".to_string())
            ]
        );
        assert_eq!(record.extra("vic_goals"), Some("2"));
        assert_eq!(record.extra("missing"), None);
    }

    #[test]
    fn unknown_dates_become_zero_parts() {
        assert_eq!(date_parts(None), (0, 0, 0));
        assert_eq!(date_parts(NaiveDate::from_ymd_opt(2015, 3, 9)), (2015, 3, 9));
    }

    #[test]
    fn raw_record_cells_pad_derived_columns() {
        let mut record = DisciplinaryRecord::new(0);
        record.off_date = "October 22, 2016".to_string();
        let cells = record.base_cells(true);
        assert_eq!(cells.len(), RAW_COLUMNS.len() + DERIVED_COLUMNS.len());
        assert_eq!(cells[1], "October 22, 2016");
        assert!(cells[RAW_COLUMNS.len()..].iter().all(|c| c.is_empty()));
    }
}
