//! Suspension and fine tables from the per-season Wikipedia pages.
//!
//! Each season page holds one or more `wikitable sortable` tables whose
//! layout changed over the years. A table is classified into a `TableFormat`
//! from the page year and its header shape, then every body row becomes a
//! `DisciplinaryRecord`.

use std::fmt;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::http_client::PageSource;
use crate::record::DisciplinaryRecord;

// Exact class match: `wikitable sortable plainrowheaders` tables are not event
// tables, and legacy pages classify by position.
static TABLE: Lazy<Selector> = Lazy::new(|| selector(r#"table[class="wikitable sortable"]"#));
static TH: Lazy<Selector> = Lazy::new(|| selector("th"));
static TR: Lazy<Selector> = Lazy::new(|| selector("tr"));
static TD: Lazy<Selector> = Lazy::new(|| selector("td"));
static SPAN: Lazy<Selector> = Lazy::new(|| selector("span"));
static NOWRAP_SPAN: Lazy<Selector> =
    Lazy::new(|| selector(r#"span[style="white-space:nowrap"]"#));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid css selector")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    CurrentSuspension,
    CurrentFine,
    /// No decision-date column; later columns shift left by one.
    LegacySuspension,
    LegacyFine,
}

/// Where a field comes from in a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    At(usize),
    /// Cell at the index, or the fallback text when the row is too short.
    AtOr(usize, &'static str),
    Literal(&'static str),
    Absent,
}

#[derive(Debug, Clone, Copy)]
struct FieldMap {
    dops_date: Cell,
    susp: Cell,
    forfeit_sal: Cell,
    fine: Cell,
}

impl TableFormat {
    /// Offense date, offender, team and offense are always cells 0..=3.
    fn field_map(self) -> FieldMap {
        match self {
            TableFormat::CurrentSuspension => FieldMap {
                dops_date: Cell::At(4),
                susp: Cell::At(5),
                forfeit_sal: Cell::AtOr(6, "N/A"),
                fine: Cell::Literal("0"),
            },
            TableFormat::CurrentFine => FieldMap {
                dops_date: Cell::At(4),
                susp: Cell::Literal("0"),
                forfeit_sal: Cell::Literal("0"),
                fine: Cell::At(5),
            },
            TableFormat::LegacySuspension => FieldMap {
                dops_date: Cell::Absent,
                susp: Cell::At(4),
                forfeit_sal: Cell::Absent,
                fine: Cell::Absent,
            },
            TableFormat::LegacyFine => FieldMap {
                dops_date: Cell::Absent,
                susp: Cell::Literal("0"),
                forfeit_sal: Cell::Absent,
                fine: Cell::At(4),
            },
        }
    }

    /// Current tables end with a footer row that is not an event.
    fn has_footer(self) -> bool {
        matches!(
            self,
            TableFormat::CurrentSuspension | TableFormat::CurrentFine
        )
    }
}

/// Header counts expected for a season page's suspension and fine tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderCounts {
    pub suspension: usize,
    pub fine: usize,
}

/// Expected header counts by season start year.
pub fn header_counts_for_year(year: i32) -> Option<HeaderCounts> {
    let (suspension, fine) = match year {
        2014..=2016 => (10, 8),
        2013 => (11, 9),
        2011 | 2012 => (6, 6),
        2009 | 2010 => (5, 5),
        _ => return None,
    };
    Some(HeaderCounts { suspension, fine })
}

/// What the classifier looks at for a single table.
#[derive(Debug, Clone, Copy)]
pub struct TableShape {
    pub position: usize,
    pub header_count: usize,
    pub has_length_header: bool,
}

type Predicate = fn(&HeaderCounts, &TableShape) -> bool;

/// Evaluated top to bottom; the first matching predicate decides. `None`
/// means the table is skipped.
const TABLE_RULES: &[(Predicate, Option<TableFormat>)] = &[
    (wide_suspension, Some(TableFormat::CurrentSuspension)),
    (wide_fine, Some(TableFormat::CurrentFine)),
    (wide_page, None),
    (narrow_with_length, Some(TableFormat::CurrentSuspension)),
    (narrow_page, Some(TableFormat::CurrentFine)),
    (legacy_first, Some(TableFormat::LegacySuspension)),
    (legacy_second, Some(TableFormat::LegacyFine)),
];

fn wide_suspension(counts: &HeaderCounts, table: &TableShape) -> bool {
    counts.suspension > 6 && table.header_count == counts.suspension
}

fn wide_fine(counts: &HeaderCounts, table: &TableShape) -> bool {
    counts.suspension > 6 && table.header_count == counts.fine
}

fn wide_page(counts: &HeaderCounts, _: &TableShape) -> bool {
    counts.suspension > 6
}

fn narrow_with_length(counts: &HeaderCounts, table: &TableShape) -> bool {
    counts.suspension == 6 && table.has_length_header
}

fn narrow_page(counts: &HeaderCounts, _: &TableShape) -> bool {
    counts.suspension == 6
}

fn legacy_first(_: &HeaderCounts, table: &TableShape) -> bool {
    table.position == 0
}

fn legacy_second(_: &HeaderCounts, table: &TableShape) -> bool {
    table.position == 1
}

pub fn classify_table(counts: &HeaderCounts, table: &TableShape) -> Option<TableFormat> {
    TABLE_RULES
        .iter()
        .find(|(predicate, _)| predicate(counts, table))
        .and_then(|(_, format)| *format)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("row has {cells} cells, needed cell {index}")]
    MissingCell { index: usize, cells: usize },
    #[error("no table layout known for season starting {0}")]
    UnknownSeason(i32),
    #[error("page has no wikitable")]
    NoTables,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub page: String,
    pub table: usize,
    pub row: usize,
    /// Page-local position among event rows, shared with extracted records.
    pub slot: usize,
    pub error: ExtractError,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} table {} row {}: {}",
            self.page, self.table, self.row, self.error
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub records: Vec<DisciplinaryRecord>,
    pub failures: Vec<RowFailure>,
    pub tables_used: Vec<(usize, TableFormat)>,
}

impl PageExtraction {
    /// Event rows seen so far, extracted or failed.
    pub fn slot_count(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}

/// Extract every event row from one season page.
///
/// Every event row takes one page-local slot in table order, whether it
/// extracts or fails. Records come back with `index` set to their slot and the
/// caller offsets them across pages, so a repaired row never shifts the rows
/// after it.
pub fn extract_page(html: &str, year: i32, page: &str) -> Result<PageExtraction, ExtractError> {
    let counts = header_counts_for_year(year).ok_or(ExtractError::UnknownSeason(year))?;
    let doc = Html::parse_document(html);
    let tables: Vec<ElementRef> = doc.select(&TABLE).collect();
    if tables.is_empty() {
        return Err(ExtractError::NoTables);
    }

    let mut out = PageExtraction::default();
    for (position, table) in tables.iter().enumerate() {
        let shape = table_shape(*table, position);
        let Some(format) = classify_table(&counts, &shape) else {
            debug!(page, position, headers = shape.header_count, "table skipped");
            continue;
        };
        out.tables_used.push((position, format));
        extract_table(*table, format, page, position, &mut out);
    }
    Ok(out)
}

fn table_shape(table: ElementRef, position: usize) -> TableShape {
    let headers: Vec<ElementRef> = table.select(&TH).collect();
    TableShape {
        position,
        header_count: headers.len(),
        has_length_header: headers.iter().any(|th| cell_text(*th) == "Length"),
    }
}

fn extract_table(
    table: ElementRef,
    format: TableFormat,
    page: &str,
    position: usize,
    out: &mut PageExtraction,
) {
    let rows: Vec<ElementRef> = table.select(&TR).collect();
    let end = if format.has_footer() {
        rows.len().saturating_sub(1)
    } else {
        rows.len()
    };
    for (row_idx, row) in rows.iter().enumerate().take(end).skip(1) {
        let cells: Vec<ElementRef> = row.select(&TD).collect();
        if cells.is_empty() {
            continue;
        }
        let slot = out.slot_count();
        match extract_row(&cells, format) {
            Ok(mut record) => {
                record.index = slot;
                out.records.push(record);
            }
            Err(error) => {
                let failure = RowFailure {
                    page: page.to_string(),
                    table: position,
                    row: row_idx,
                    slot,
                    error,
                };
                warn!(%failure, "row skipped");
                out.failures.push(failure);
            }
        }
    }
}

fn extract_row(cells: &[ElementRef], format: TableFormat) -> Result<DisciplinaryRecord, ExtractError> {
    let at = |index: usize| {
        cells.get(index).copied().ok_or(ExtractError::MissingCell {
            index,
            cells: cells.len(),
        })
    };
    let field = |cell: Cell| -> Result<Option<String>, ExtractError> {
        Ok(match cell {
            Cell::At(index) => Some(cell_text(at(index)?)),
            Cell::AtOr(index, fallback) => Some(
                cells
                    .get(index)
                    .map(|c| cell_text(*c))
                    .unwrap_or_else(|| fallback.to_string()),
            ),
            Cell::Literal(text) => Some(text.to_string()),
            Cell::Absent => None,
        })
    };
    let map = format.field_map();

    let mut record = DisciplinaryRecord::new(0);
    record.off_date = date_text(at(0)?);
    record.offender = first_span_text(at(1)?);
    record.off_team = cell_text(at(2)?);
    record.offense = cell_text(at(3)?);
    record.dops_date = match map.dops_date {
        Cell::At(index) => Some(date_text(at(index)?)),
        other => field(other)?,
    };
    record.susp = field(map.susp)?.unwrap_or_default();
    record.forfeit_sal = field(map.forfeit_sal)?;
    record.fine = field(map.fine)?;
    Ok(record)
}

/// Dates sit either in a no-wrap span (next to a hidden sort key) or as plain
/// cell text.
fn date_text(cell: ElementRef) -> String {
    cell.select(&NOWRAP_SPAN)
        .next()
        .map(cell_text)
        .unwrap_or_else(|| cell_text(cell))
}

fn first_span_text(cell: ElementRef) -> String {
    cell.select(&SPAN)
        .next()
        .map(cell_text)
        .unwrap_or_else(|| cell_text(cell))
}

fn cell_text(el: ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `2016–17_NHL_suspensions_and_fines` for the season starting 2016.
pub fn season_page_name(start_year: i32) -> String {
    format!(
        "{}–{:02}_NHL_suspensions_and_fines",
        start_year,
        (start_year + 1).rem_euclid(100)
    )
}

#[derive(Debug, Clone, Default)]
pub struct ScrapeSummary {
    pub dataset: Dataset,
    pub pages_total: usize,
    pub pages_succeeded: usize,
    pub row_failures: Vec<RowFailure>,
    pub errors: Vec<String>,
}

/// Scrape every configured season, newest first, numbering rows as they
/// arrive. Failed rows keep their number so position-keyed patches stay on
/// the events they were written for.
pub fn scrape_seasons(source: &mut dyn PageSource, config: &PipelineConfig) -> ScrapeSummary {
    let mut summary = ScrapeSummary::default();
    let mut next_index = 0usize;

    for year in (config.first_season..=config.last_season).rev() {
        let page = season_page_name(year);
        let url = format!("{}{}", config.wiki_base_url, page);
        summary.pages_total += 1;
        info!(page, "scraping season page");

        let html = match source.fetch(&url) {
            Ok(html) => html,
            Err(err) => {
                warn!(page, error = %err, "page fetch failed");
                summary.errors.push(format!("{page}: {err:#}"));
                continue;
            }
        };
        let extraction = match extract_page(&html, year, &page) {
            Ok(extraction) => extraction,
            Err(err) => {
                warn!(page, error = %err, "page skipped");
                summary.errors.push(format!("{page}: {err}"));
                continue;
            }
        };

        summary.pages_succeeded += 1;
        let page_slots = extraction.slot_count();
        for mut record in extraction.records {
            record.index += next_index;
            summary.dataset.records.push(record);
        }
        for failure in &extraction.failures {
            warn!(page, index = next_index + failure.slot, "row index left unused");
        }
        next_index += page_slots;
        summary.row_failures.extend(extraction.failures);
        info!(page, rows = summary.dataset.len(), "running total");
    }
    summary
}
