use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::classify::{NamePart, NameRole};
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::gamelog::{GameLog, PlayerStatSnapshot, aggregate_until, parse_gamelog_html};
use crate::http_client::PageSource;
use crate::record::DisciplinaryRecord;
use crate::season::SeasonCutoff;

/// Where a player's season game log lives on the reference site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub initial: char,
    pub id: String,
    pub season_end_year: i32,
}

impl PlayerRef {
    /// `<last[0..5]><first[0..2]><NN>`, lowercased.
    pub fn from_names(last: &str, first: &str, ordinal: u8, season_end_year: i32) -> Option<Self> {
        let last: String = last.trim().chars().take(5).collect::<String>().to_lowercase();
        let first: String = first.trim().chars().take(2).collect::<String>().to_lowercase();
        let initial = last.chars().next()?;
        if first.is_empty() {
            return None;
        }
        Some(Self {
            initial,
            id: format!("{last}{first}{ordinal:02}"),
            season_end_year,
        })
    }

    pub fn gamelog_url(&self, base: &str) -> String {
        format!(
            "{}/players/{}/{}/gamelog/{}",
            base.trim_end_matches('/'),
            self.initial,
            self.id,
            self.season_end_year
        )
    }
}

/// Resolve one side of a record, or `None` when a name or the offense date
/// is unknown.
pub fn player_ref(record: &DisciplinaryRecord, role: NameRole, cutoff: SeasonCutoff) -> Option<PlayerRef> {
    let derived = record.derived.as_ref()?;
    let off_date = derived.off_date?;
    let last = derived.name(role, NamePart::Last)?;
    let first = derived.name(role, NamePart::First)?;
    PlayerRef::from_names(last, first, 1, cutoff.season_end_year(off_date))
}

#[derive(Debug, Clone, Default)]
pub struct AugmentSummary {
    pub records_total: usize,
    pub offenders_enriched: usize,
    pub victims_enriched: usize,
    pub unresolved: usize,
    pub pages_fetched: usize,
    pub errors: Vec<String>,
}

/// Attach each player's season-to-date totals as `off_*` / `vic_*` columns.
pub fn augment_dataset(
    dataset: &mut Dataset,
    source: &mut dyn PageSource,
    config: &PipelineConfig,
) -> AugmentSummary {
    let mut summary = AugmentSummary {
        records_total: dataset.len(),
        ..AugmentSummary::default()
    };
    let mut logs: HashMap<String, GameLog> = HashMap::new();

    for record in &mut dataset.records {
        let off_date = record.derived.as_ref().and_then(|d| d.off_date);
        for role in NameRole::BOTH {
            let resolved = player_ref(record, role, config.season_cutoff).zip(off_date);
            let Some((player, off_date)) = resolved else {
                debug!(index = record.index, ?role, "no identity, skipping");
                summary.unresolved += 1;
                continue;
            };
            match snapshot_for(&player, off_date, source, config, &mut logs, &mut summary) {
                Ok(snapshot) => {
                    merge_snapshot(record, role.column_prefix(), &snapshot);
                    match role {
                        NameRole::Offender => summary.offenders_enriched += 1,
                        NameRole::Victim => summary.victims_enriched += 1,
                    }
                }
                Err(err) => {
                    let msg = format!("row {} {}: {err:#}", record.index, player.id);
                    warn!("{msg}");
                    summary.errors.push(msg);
                }
            }
        }
    }
    info!(
        offenders = summary.offenders_enriched,
        victims = summary.victims_enriched,
        errors = summary.errors.len(),
        "augmented dataset"
    );
    summary
}

fn snapshot_for(
    player: &PlayerRef,
    cutoff: NaiveDate,
    source: &mut dyn PageSource,
    config: &PipelineConfig,
    logs: &mut HashMap<String, GameLog>,
    summary: &mut AugmentSummary,
) -> Result<PlayerStatSnapshot> {
    let url = player.gamelog_url(&config.gamelog_base_url);
    if !logs.contains_key(&url) {
        let html = source.fetch(&url)?;
        summary.pages_fetched += 1;
        let log = parse_gamelog_html(&html).with_context(|| format!("parse {url}"))?;
        logs.insert(url.clone(), log);
    }
    let log = &logs[&url];
    let snapshot = aggregate_until(log, cutoff).with_context(|| format!("aggregate {url}"))?;
    Ok(snapshot)
}

pub fn merge_snapshot(record: &mut DisciplinaryRecord, prefix: &str, snapshot: &PlayerStatSnapshot) {
    for (column, value) in snapshot.prefixed_columns(prefix) {
        record.set_extra(column, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_truncates_and_lowercases() {
        let player = PlayerRef::from_names("Crosby", "Sidney", 1, 2016).unwrap();
        assert_eq!(player.id, "crosbsi01");
        assert_eq!(player.initial, 'c');
        assert_eq!(
            player.gamelog_url("https://www.hockey-reference.com/"),
            "https://www.hockey-reference.com/players/c/crosbsi01/gamelog/2016"
        );
    }

    #[test]
    fn short_names_are_kept_whole() {
        let player = PlayerRef::from_names("Orr", "B", 2, 2010).unwrap();
        assert_eq!(player.id, "orrb02");
    }

    #[test]
    fn empty_names_do_not_resolve() {
        assert!(PlayerRef::from_names("", "Sidney", 1, 2016).is_none());
        assert!(PlayerRef::from_names("Crosby", " ", 1, 2016).is_none());
    }
}
