//! NHL player-id lookup through the league's name-suggestion service.

use std::collections::HashMap;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::classify::{NamePart, NameRole};
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::http_client::PageSource;

static SUGGESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"p\|(\d*)\|(\w+)\|(\w+)").expect("valid suggestion regex"));

const MIN_ENTRY_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub id: String,
    pub last_name: String,
    pub first_name: String,
}

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Parse one `p|<id>|<last>|<first>|...` entry.
pub fn parse_suggestion(entry: &str) -> Option<Suggestion> {
    if entry.len() < MIN_ENTRY_LEN {
        return None;
    }
    let caps = SUGGESTION.captures(entry)?;
    Some(Suggestion {
        id: caps[1].to_string(),
        last_name: caps[2].to_string(),
        first_name: caps[3].to_string(),
    })
}

pub fn parse_suggest_json(raw: &str) -> Result<Vec<String>> {
    let resp: SuggestResponse = serde_json::from_str(raw).context("parse suggest json")?;
    Ok(resp.suggestions)
}

/// Query URL for a last name, keyed by its lowercase three-letter prefix.
pub fn suggest_url(base: &str, last_name: &str) -> Option<String> {
    let trio: String = last_name.trim().chars().take(3).collect::<String>().to_lowercase();
    if trio.is_empty() {
        return None;
    }
    Some(format!(
        "{}/svc/suggest/v1/min_all/{trio}/99999",
        base.trim_end_matches('/')
    ))
}

/// First entry whose names match exactly.
pub fn find_player_id(entries: &[String], first: &str, last: &str) -> Option<String> {
    entries
        .iter()
        .filter_map(|e| parse_suggestion(e))
        .find(|s| s.first_name == first && s.last_name == last)
        .map(|s| s.id)
}

#[derive(Debug, Clone, Default)]
pub struct LookupSummary {
    pub records_total: usize,
    pub offender_ids: usize,
    pub victim_ids: usize,
    pub queries: usize,
    pub errors: Vec<String>,
}

/// Fill `off_nhl_id` / `vic_nhl_id` for every record; unmatched sides get an
/// empty cell.
pub fn assign_nhl_ids(
    dataset: &mut Dataset,
    source: &mut dyn PageSource,
    config: &PipelineConfig,
) -> LookupSummary {
    let mut summary = LookupSummary {
        records_total: dataset.len(),
        ..LookupSummary::default()
    };
    let mut answers: HashMap<String, Vec<String>> = HashMap::new();

    for record in &mut dataset.records {
        for role in NameRole::BOTH {
            let column = format!("{}nhl_id", role.column_prefix());
            let names = record.derived.as_ref().and_then(|d| {
                Some((
                    d.name(role, NamePart::First)?.to_string(),
                    d.name(role, NamePart::Last)?.to_string(),
                ))
            });
            let Some((first, last)) = names else {
                record.set_extra(column, "");
                continue;
            };
            let Some(url) = suggest_url(&config.suggest_base_url, &last) else {
                record.set_extra(column, "");
                continue;
            };

            if !answers.contains_key(&url) {
                summary.queries += 1;
                let entries = match source.fetch(&url).and_then(|raw| parse_suggest_json(&raw)) {
                    Ok(entries) => entries,
                    Err(err) => {
                        let msg = format!("row {} {last}: {err:#}", record.index);
                        warn!("{msg}");
                        summary.errors.push(msg);
                        record.set_extra(column, "");
                        continue;
                    }
                };
                answers.insert(url.clone(), entries);
            }

            let id = find_player_id(&answers[&url], &first, &last);
            debug!(index = record.index, ?role, ?id, "nhl id lookup");
            if id.is_some() {
                match role {
                    NameRole::Offender => summary.offender_ids += 1,
                    NameRole::Victim => summary.victim_ids += 1,
                }
            }
            record.set_extra(column, id.unwrap_or_default());
        }
    }
    info!(
        offenders = summary.offender_ids,
        victims = summary.victim_ids,
        queries = summary.queries,
        "assigned nhl ids"
    );
    summary
}
