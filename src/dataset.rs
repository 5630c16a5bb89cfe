use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use csv::StringRecord;
use tracing::info;

use crate::classify::{SuspensionGames, parse_date};
use crate::money::Money;
use crate::record::{DERIVED_COLUMNS, Derived, DisciplinaryRecord, RAW_COLUMNS};

/// The whole disciplinary table, owned by whichever stage is running.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<DisciplinaryRecord>,
}

impl Dataset {
    pub fn new(records: Vec<DisciplinaryRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let text = read_legacy_text(path)?;
        let dataset =
            Self::from_csv_str(&text).with_context(|| format!("parse {}", path.display()))?;
        info!(path = %path.display(), rows = dataset.len(), "loaded dataset");
        Ok(dataset)
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = rdr.headers().context("read csv header")?.clone();
        let layout = Layout::from_headers(&headers)?;

        let mut records = Vec::new();
        for (pos, row) in rdr.records().enumerate() {
            let row = row.with_context(|| format!("read csv row {pos}"))?;
            records.push(layout.decode(&row, pos)?);
        }
        Ok(Self { records })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
        }
        let file = fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
        self.write_to(file)
            .with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), rows = self.len(), "wrote dataset");
        Ok(())
    }

    pub fn write_to<W: Write>(&self, out: W) -> Result<()> {
        let with_derived = self.records.iter().any(|r| r.derived.is_some());
        let extra = self.extra_columns();

        let mut wtr = csv::Writer::from_writer(out);
        let mut header: Vec<&str> = RAW_COLUMNS.to_vec();
        if with_derived {
            header.extend_from_slice(DERIVED_COLUMNS);
        }
        header.extend(extra.iter().map(String::as_str));
        wtr.write_record(&header).context("write csv header")?;

        for record in &self.records {
            let mut cells = record.base_cells(with_derived);
            for key in &extra {
                cells.push(record.extra(key).unwrap_or_default().to_string());
            }
            wtr.write_record(&cells)
                .with_context(|| format!("write row {}", record.index))?;
        }
        wtr.flush().context("flush csv")?;
        Ok(())
    }

    /// Extension column names across all records, in first-seen order.
    pub fn extra_columns(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for record in &self.records {
            for (key, _) in &record.extra {
                if !out.contains(key) {
                    out.push(key.clone());
                }
            }
        }
        out
    }
}

/// Read a text file as UTF-8, falling back to Latin-1 for the legacy exports.
pub fn read_legacy_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(decode_legacy(bytes))
}

pub fn decode_legacy(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}

struct Layout {
    has_index: bool,
    columns: HashMap<String, usize>,
    has_derived: bool,
    extra: Vec<(usize, String)>,
}

impl Layout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let has_index = headers
            .get(0)
            .is_some_and(|h| h.is_empty() || h.starts_with("Unnamed"));
        let mut columns = HashMap::new();
        let mut extra = Vec::new();
        for (idx, name) in headers.iter().enumerate() {
            if name.is_empty() || name.starts_with("Unnamed") {
                continue;
            }
            if RAW_COLUMNS.contains(&name) || DERIVED_COLUMNS.contains(&name) {
                columns.insert(name.to_string(), idx);
            } else {
                extra.push((idx, name.to_string()));
            }
        }
        for required in &RAW_COLUMNS[1..] {
            if !columns.contains_key(*required) {
                return Err(anyhow!("missing column `{required}`"));
            }
        }
        let has_derived = columns.contains_key("offense_cat");
        Ok(Self {
            has_index,
            columns,
            has_derived,
            extra,
        })
    }

    fn cell<'a>(&self, row: &'a StringRecord, name: &str) -> &'a str {
        self.columns
            .get(name)
            .and_then(|idx| row.get(*idx))
            .unwrap_or("")
    }

    fn opt(&self, row: &StringRecord, name: &str) -> Option<String> {
        let v = self.cell(row, name);
        (!v.is_empty()).then(|| v.to_string())
    }

    fn decode(&self, row: &StringRecord, pos: usize) -> Result<DisciplinaryRecord> {
        let index = if self.has_index {
            let raw = row.get(0).unwrap_or("").trim();
            raw.parse::<usize>()
                .with_context(|| format!("row {pos}: bad index `{raw}`"))?
        } else {
            pos
        };

        let mut record = DisciplinaryRecord::new(index);
        record.off_date = self.cell(row, "off_date").to_string();
        record.offender = self.cell(row, "offender").to_string();
        record.off_team = self.cell(row, "off_team").to_string();
        record.offense = self.cell(row, "offense").to_string();
        record.dops_date = self.opt(row, "dops_date");
        record.susp = self.cell(row, "susp").to_string();
        record.forfeit_sal = self.opt(row, "forfeit_sal");
        record.fine = self.opt(row, "fine");

        if self.has_derived {
            record.derived = Some(self.decode_derived(row, pos)?);
        }
        for (idx, name) in &self.extra {
            record.set_extra(name.clone(), row.get(*idx).unwrap_or(""));
        }
        Ok(record)
    }

    fn decode_derived(&self, row: &StringRecord, pos: usize) -> Result<Derived> {
        let count = |name: &str| -> Result<u32> {
            let v = self.cell(row, name).trim();
            if v.is_empty() {
                return Ok(0);
            }
            v.parse::<u32>()
                .with_context(|| format!("row {pos}: bad {name} `{v}`"))
        };
        let games = if self.cell(row, "total_susp_games").trim().is_empty() {
            None
        } else {
            Some(SuspensionGames {
                total: count("total_susp_games")?,
                playoff: count("playoff_susp_games")?,
                preseason: count("preseason_susp_games")?,
            })
        };
        let money = |name: &str| Money::from_cell(self.cell(row, name)).unwrap_or(Money::Amount(0.0));

        Ok(Derived {
            offense_cat: self.cell(row, "offense_cat").to_string(),
            victim: self.cell(row, "victim").to_string(),
            games,
            forfeit: money("forfeit_sal"),
            fine_amount: money("fine_amount"),
            off_date: parse_date(self.cell(row, "off_date")),
            dops_date: parse_date(self.cell(row, "dops_date")),
            off_last_name: self.opt(row, "off_last_name"),
            off_first_name: self.opt(row, "off_first_name"),
            vic_last_name: self.opt(row, "vic_last_name"),
            vic_first_name: self.opt(row, "vic_first_name"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_fallback() {
        let bytes = b"Fr\xe9d\xe9ric".to_vec();
        assert_eq!(decode_legacy(bytes), "Frédéric");
        assert_eq!(decode_legacy("Frédéric".as_bytes().to_vec()), "Frédéric");
    }

    #[test]
    fn reads_csv_without_index_column() {
        let text = "off_date,offender,off_team,offense,dops_date,susp,forfeit_sal,fine\n\
                    \"October 22, 2016\",John Doe,Boston,Slashing,,2 games,,\n";
        let dataset = Dataset::from_csv_str(text).unwrap();
        assert_eq!(dataset.len(), 1);
        let record = &dataset.records[0];
        assert_eq!(record.index, 0);
        assert_eq!(record.off_date, "October 22, 2016");
        assert_eq!(record.dops_date, None);
        assert!(record.derived.is_none());
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = Dataset::from_csv_str("off_date,offender\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("off_team"));
    }
}
