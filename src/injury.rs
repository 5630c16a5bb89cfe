use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::{Dataset, read_legacy_text};
use crate::season::SeasonCutoff;

/// Non-contact conditions that cannot be blamed on an opponent.
pub const EXCLUDED_INJURY_TYPES: &[&str] = &[
    "Pneumonia",
    "Thyroid",
    "Migraine",
    "Blood clots",
    "Sinus",
    "Stomach",
    "Bronchitis",
    "Vertigo",
    "Heart",
    "Dizziness",
    "Appendectomy",
    "Fatigue",
    "Illness",
    "Flu",
];

static SEASON_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(20\d{2})").expect("valid season regex"));

/// One row of the injury export. Unknown columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InjuryRecord {
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Injury Type")]
    pub injury_type: String,
    #[serde(rename = "Season")]
    pub season: String,
    #[serde(rename = "Games Missed", default)]
    pub games_missed: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injury {
    pub record: InjuryRecord,
    pub start_year: i32,
}

/// First `20xx` year in a season label such as `2015-2016`.
pub fn season_start_year(season: &str) -> Option<i32> {
    SEASON_YEAR.captures(season)?.get(1)?.as_str().parse().ok()
}

pub fn is_excluded_type(injury_type: &str) -> bool {
    EXCLUDED_INJURY_TYPES.contains(&injury_type.trim())
}

#[derive(Debug, Clone, Default)]
pub struct InjuryLoad {
    pub injuries: Vec<Injury>,
    pub excluded: usize,
    pub errors: Vec<String>,
}

pub fn load_injuries(path: &Path) -> Result<InjuryLoad> {
    let text = read_legacy_text(path)?;
    let load = parse_injuries(&text).with_context(|| format!("parse {}", path.display()))?;
    info!(
        path = %path.display(),
        injuries = load.injuries.len(),
        excluded = load.excluded,
        "loaded injuries"
    );
    Ok(load)
}

/// Parse injury rows, dropping excluded types and rows without a season year.
pub fn parse_injuries(text: &str) -> Result<InjuryLoad> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut load = InjuryLoad::default();
    for (pos, row) in rdr.deserialize::<InjuryRecord>().enumerate() {
        let record = row.with_context(|| format!("read injury row {pos}"))?;
        if is_excluded_type(&record.injury_type) {
            load.excluded += 1;
            continue;
        }
        let Some(start_year) = season_start_year(&record.season) else {
            let msg = format!("injury row {pos} ({}): no season year in `{}`", record.player, record.season);
            warn!("{msg}");
            load.errors.push(msg);
            continue;
        };
        load.injuries.push(Injury { record, start_year });
    }
    Ok(load)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InjuryMultiplicity {
    /// Keep the first injury of the season; the rest go to `truncated`.
    #[default]
    FirstPerSeason,
    AllPerSeason,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelateOptions {
    pub multiplicity: InjuryMultiplicity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelatedInjury {
    pub victim: String,
    pub date: String,
    pub games_missed: String,
    pub inj_type: String,
    pub susp_act: String,
}

/// An injury matched to a suspension but dropped by `FirstPerSeason`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruncatedInjury {
    pub victim: String,
    pub date: String,
    pub games_missed: String,
    pub inj_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct CorrelationReport {
    pub rows: Vec<CorrelatedInjury>,
    pub truncated: Vec<TruncatedInjury>,
}

/// Pair each victim's disciplinary records with their injuries from the same
/// season.
///
/// Victims are matched on last name only. Records are visited in dataset
/// order and injuries in file order.
pub fn correlate(
    dataset: &Dataset,
    injuries: &[Injury],
    cutoff: SeasonCutoff,
    options: CorrelateOptions,
) -> CorrelationReport {
    let mut report = CorrelationReport::default();

    for record in &dataset.records {
        let Some(derived) = record.derived.as_ref() else {
            continue;
        };
        let (Some(victim), Some(off_date)) = (derived.vic_last_name.as_deref(), derived.off_date)
        else {
            continue;
        };
        let season = cutoff.season_start_year(off_date);
        let date = off_date.format("%Y-%m-%d").to_string();

        let mut matches = injuries
            .iter()
            .filter(|inj| inj.record.player == victim && inj.start_year == season);
        let Some(first) = matches.next() else {
            continue;
        };
        report.rows.push(CorrelatedInjury {
            victim: victim.to_string(),
            date: date.clone(),
            games_missed: first.record.games_missed.clone(),
            inj_type: first.record.injury_type.clone(),
            susp_act: derived.offense_cat.clone(),
        });
        for extra in matches {
            match options.multiplicity {
                InjuryMultiplicity::AllPerSeason => report.rows.push(CorrelatedInjury {
                    victim: victim.to_string(),
                    date: date.clone(),
                    games_missed: extra.record.games_missed.clone(),
                    inj_type: extra.record.injury_type.clone(),
                    susp_act: derived.offense_cat.clone(),
                }),
                InjuryMultiplicity::FirstPerSeason => report.truncated.push(TruncatedInjury {
                    victim: victim.to_string(),
                    date: date.clone(),
                    games_missed: extra.record.games_missed.clone(),
                    inj_type: extra.record.injury_type.clone(),
                }),
            }
        }
    }
    info!(
        rows = report.rows.len(),
        truncated = report.truncated.len(),
        "correlated injuries"
    );
    report
}

pub fn write_correlated_csv(path: &Path, rows: &[CorrelatedInjury]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
    }
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("write {}", path.display()))?;
    }
    wtr.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_year_is_first_match() {
        assert_eq!(season_start_year("2015-2016"), Some(2015));
        assert_eq!(season_start_year("Season 2012/13"), Some(2012));
        assert_eq!(season_start_year("unknown"), None);
    }

    #[test]
    fn excluded_types_are_exact() {
        assert!(is_excluded_type("Flu"));
        assert!(is_excluded_type(" Migraine "));
        assert!(!is_excluded_type("Concussion"));
        assert_eq!(EXCLUDED_INJURY_TYPES.len(), 14);
    }

    #[test]
    fn parse_skips_excluded_and_undated_rows() {
        let text = "Player,Team,Injury Type,Season,Games Missed\n\
                    Smith,BOS,Concussion,2015-2016,12\n\
                    Jones,NYR,Flu,2015-2016,2\n\
                    Brown,TOR,Knee,n/a,4\n";
        let load = parse_injuries(text).unwrap();
        assert_eq!(load.injuries.len(), 1);
        assert_eq!(load.injuries[0].start_year, 2015);
        assert_eq!(load.injuries[0].record.games_missed, "12");
        assert_eq!(load.excluded, 1);
        assert_eq!(load.errors.len(), 1);
    }
}
