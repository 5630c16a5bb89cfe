use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::injury::CorrelationReport;

pub struct ExportReport {
    pub correlated: usize,
    pub truncated: usize,
}

/// Write the correlation as a workbook with `Correlated` and `Truncated`
/// sheets.
pub fn export_correlation_xlsx(path: &Path, report: &CorrelationReport) -> Result<ExportReport> {
    let mut correlated_rows = vec![header(&["victim", "date", "games_missed", "inj_type", "susp_act"])];
    for row in &report.rows {
        correlated_rows.push(vec![
            row.victim.clone(),
            row.date.clone(),
            row.games_missed.clone(),
            row.inj_type.clone(),
            row.susp_act.clone(),
        ]);
    }

    let mut truncated_rows = vec![header(&["victim", "date", "games_missed", "inj_type"])];
    for row in &report.truncated {
        truncated_rows.push(vec![
            row.victim.clone(),
            row.date.clone(),
            row.games_missed.clone(),
            row.inj_type.clone(),
        ]);
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Correlated")?;
        write_rows(sheet, &correlated_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Truncated")?;
        write_rows(sheet, &truncated_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        correlated: correlated_rows.len().saturating_sub(1),
        truncated: truncated_rows.len().saturating_sub(1),
    })
}

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            match value.parse::<f64>() {
                Ok(number) if row_idx > 0 => worksheet
                    .write_number(row_idx as u32, col_idx as u16, number)
                    .with_context(|| format!("write cell ({row_idx},{col_idx})"))?,
                _ => worksheet
                    .write_string(row_idx as u32, col_idx as u16, value)
                    .with_context(|| format!("write cell ({row_idx},{col_idx})"))?,
            };
        }
    }
    Ok(())
}
