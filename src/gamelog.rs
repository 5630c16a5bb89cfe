//! Per-game statistics for one player-season and the running totals up to a
//! cutoff date.

use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;

/// Columns that are labels or ratios rather than countable stats.
pub const SKIPPED_STATS: &[&str] = &[
    "reason",
    "ranker",
    "date_game",
    "team_id",
    "game_location",
    "opp_id",
    "game_result",
    "shot_pct",
    "faceoff_percentage_all",
];

pub const AGE_STAT: &str = "age";
pub const TIME_ON_ICE_STAT: &str = "time_on_ice";
const DATE_STAT: &str = "date_game";
/// Spans the stat columns on games the player missed ("Did Not Play").
pub const REASON_STAT: &str = "reason";

static TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.row_summable").expect("valid css selector"));
static GAME_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr[id]").expect("valid css selector"));
static STAT_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th[data-stat], td[data-stat]").expect("valid css selector"));
static TIME_ON_ICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}):?(\d{1,2})").expect("valid toi regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameLogError {
    #[error("no row_summable table on the page")]
    NoTable,
    #[error("game row {row} has no date")]
    MissingDate { row: usize },
    #[error("game row {row} has unreadable date `{text}`")]
    BadDate { row: usize, text: String },
    #[error("stat `{stat}` has non-numeric value `{text}`")]
    BadNumber { stat: String, text: String },
    #[error("unreadable time on ice `{text}`")]
    BadTimeOnIce { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRow {
    pub date: NaiveDate,
    /// `(data-stat, text)` pairs in page order.
    pub cells: Vec<(String, String)>,
}

impl GameRow {
    /// Why the player sat out this game, if the row is an absence line.
    pub fn absence_reason(&self) -> Option<&str> {
        self.cells
            .iter()
            .find(|(stat, _)| stat == REASON_STAT)
            .map(|(_, text)| text.as_str())
    }
}

/// A season game log, in the page's (chronological) order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameLog {
    /// Aggregable stat names in first-seen order.
    pub columns: Vec<String>,
    pub games: Vec<GameRow>,
}

impl GameLog {
    pub fn push_game(&mut self, game: GameRow) {
        for (stat, _) in &game.cells {
            if !SKIPPED_STATS.contains(&stat.as_str()) && !self.columns.contains(stat) {
                self.columns.push(stat.clone());
            }
        }
        self.games.push(game);
    }
}

pub fn parse_gamelog_html(html: &str) -> Result<GameLog, GameLogError> {
    let doc = Html::parse_document(html);
    let table = doc.select(&TABLE).next().ok_or(GameLogError::NoTable)?;

    let mut log = GameLog::default();
    for (row_idx, row) in table.select(&GAME_ROW).enumerate() {
        let cells: Vec<(String, String)> = row
            .select(&STAT_CELL)
            .filter_map(|cell| {
                let stat = cell.value().attr("data-stat")?;
                Some((stat.to_string(), text_of(cell)))
            })
            .collect();
        let date_text = cells
            .iter()
            .find(|(stat, _)| stat == DATE_STAT)
            .map(|(_, text)| text.clone())
            .ok_or(GameLogError::MissingDate { row: row_idx })?;
        let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d").map_err(|_| {
            GameLogError::BadDate {
                row: row_idx,
                text: date_text.clone(),
            }
        })?;
        log.push_game(GameRow { date, cells });
    }
    Ok(log)
}

fn text_of(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatValue {
    Total(i64),
    Seconds(i64),
    /// Not summed; the last value seen wins.
    Latest(Option<String>),
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Total(v) | StatValue::Seconds(v) => write!(f, "{v}"),
            StatValue::Latest(v) => f.write_str(v.as_deref().unwrap_or("")),
        }
    }
}

/// Cumulative stats for one player up to and including a cutoff date.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerStatSnapshot {
    pub games_counted: usize,
    pub stats: Vec<(String, StatValue)>,
}

impl PlayerStatSnapshot {
    pub fn get(&self, stat: &str) -> Option<&StatValue> {
        self.stats.iter().find(|(s, _)| s == stat).map(|(_, v)| v)
    }

    pub fn total(&self, stat: &str) -> Option<i64> {
        match self.get(stat)? {
            StatValue::Total(v) | StatValue::Seconds(v) => Some(*v),
            StatValue::Latest(_) => None,
        }
    }

    /// `(prefix + stat, value)` pairs ready to merge into a record.
    pub fn prefixed_columns(&self, prefix: &str) -> Vec<(String, String)> {
        self.stats
            .iter()
            .map(|(stat, value)| (format!("{prefix}{stat}"), value.to_string()))
            .collect()
    }

    fn slot(&mut self, stat: &str) -> &mut StatValue {
        let idx = match self.stats.iter().position(|(s, _)| s == stat) {
            Some(idx) => idx,
            None => {
                self.stats.push((stat.to_string(), initial_value(stat)));
                self.stats.len() - 1
            }
        };
        &mut self.stats[idx].1
    }
}

fn initial_value(stat: &str) -> StatValue {
    match stat {
        AGE_STAT => StatValue::Latest(None),
        TIME_ON_ICE_STAT => StatValue::Seconds(0),
        _ => StatValue::Total(0),
    }
}

/// Sum every stat over the games dated on or before `cutoff`.
///
/// The log is scanned in its own order and the scan stops at the first game
/// after the cutoff; the log is expected to be sorted already. Absence rows
/// carry no stats and are not counted as games.
pub fn aggregate_until(log: &GameLog, cutoff: NaiveDate) -> Result<PlayerStatSnapshot, GameLogError> {
    let mut snapshot = PlayerStatSnapshot::default();
    for stat in &log.columns {
        snapshot.slot(stat);
    }

    for game in &log.games {
        if game.date > cutoff {
            break;
        }
        if let Some(reason) = game.absence_reason() {
            debug!(date = %game.date, reason, "absence row skipped");
            continue;
        }
        snapshot.games_counted += 1;
        for (stat, text) in &game.cells {
            if SKIPPED_STATS.contains(&stat.as_str()) {
                continue;
            }
            match snapshot.slot(stat) {
                StatValue::Latest(last) => *last = Some(text.clone()),
                StatValue::Seconds(total) => *total += time_on_ice_secs(text)?,
                StatValue::Total(total) => *total += count_value(stat, text)?,
            }
        }
    }
    Ok(snapshot)
}

/// `mm:ss` to seconds. A blank cell means the player was not on the ice.
pub fn time_on_ice_secs(text: &str) -> Result<i64, GameLogError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    let caps = TIME_ON_ICE
        .captures(text)
        .ok_or_else(|| GameLogError::BadTimeOnIce {
            text: text.to_string(),
        })?;
    let minutes: i64 = caps[1].parse().unwrap_or(0);
    let seconds: i64 = caps[2].parse().unwrap_or(0);
    Ok(minutes * 60 + seconds)
}

fn count_value(stat: &str, text: &str) -> Result<i64, GameLogError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    text.parse::<i64>().map_err(|_| GameLogError::BadNumber {
        stat: stat.to_string(),
        text: text.to_string(),
    })
}
