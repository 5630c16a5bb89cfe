use tracing::{debug, info, warn};

use crate::classify::{
    NO_PARSE, NO_PLAYER_VICTIM, NamePart, NameRole, offense_category,
    parse_date, split_name, suspension_games, victim_name,
};
use crate::dataset::Dataset;
use crate::money::{Money, money_to_float};
use crate::record::{Derived, DisciplinaryRecord};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatchValue {
    OffenseCategory(&'static str),
    TotalGames(u32),
    ForfeitedSalary(f64),
}

impl PatchValue {
    pub fn field(&self) -> &'static str {
        match self {
            PatchValue::OffenseCategory(_) => "offense_cat",
            PatchValue::TotalGames(_) => "total_susp_games",
            PatchValue::ForfeitedSalary(_) => "forfeit_sal",
        }
    }
}

/// Hand-checked corrections, keyed by scraped row index. Applied verbatim
/// after all derivations.
pub const MANUAL_PATCHES: &[(usize, PatchValue)] = &[
    (21, PatchValue::OffenseCategory("Spearing")),
    (139, PatchValue::OffenseCategory("Instigating")),
    (147, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (198, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (205, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (248, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (338, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (339, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (352, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (381, PatchValue::OffenseCategory("Illegal Hit")),
    (388, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (390, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (394, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (401, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (431, PatchValue::OffenseCategory("Inappropriate Conduct")),
    (182, PatchValue::TotalGames(6)),
    (241, PatchValue::TotalGames(6)),
    (381, PatchValue::TotalGames(4)),
    (94, PatchValue::ForfeitedSalary(0.0)),
];

/// Row 1 is a suspension listed on two seasons' pages.
pub const DUPLICATE_ROWS: &[usize] = &[1];

#[derive(Debug, Clone, Default)]
pub struct CleanSummary {
    pub rows_in: usize,
    pub rows_out: usize,
    pub no_parse: usize,
    pub no_victim: usize,
    pub money_errors: usize,
    pub patches_applied: usize,
    pub forfeited_total: f64,
    pub errors: Vec<String>,
}

/// Compute every derived field of one record from its raw text.
pub fn derive_fields(record: &DisciplinaryRecord) -> (Derived, Option<String>) {
    let victim = victim_name(&record.offense);
    let games = suspension_games(&record.susp);
    let problem = games
        .is_none()
        .then(|| format!("row {}: no game count in `{}`", record.index, record.susp));

    let derived = Derived {
        offense_cat: offense_category(&record.offense).to_string(),
        games,
        forfeit: money_to_float(record.forfeit_sal.as_deref()),
        fine_amount: money_to_float(record.fine.as_deref()),
        off_date: parse_date(&record.off_date),
        dops_date: record.dops_date.as_deref().and_then(parse_date),
        off_last_name: split_name(&record.offender, NameRole::Offender, NamePart::Last),
        off_first_name: split_name(&record.offender, NameRole::Offender, NamePart::First),
        vic_last_name: split_name(&victim, NameRole::Victim, NamePart::Last),
        vic_first_name: split_name(&victim, NameRole::Victim, NamePart::First),
        victim,
    };
    (derived, problem)
}

/// Derive, patch and de-duplicate the scraped table in place.
pub fn clean_dataset(dataset: &mut Dataset) -> CleanSummary {
    let mut summary = CleanSummary {
        rows_in: dataset.len(),
        ..CleanSummary::default()
    };

    for record in &mut dataset.records {
        let (derived, problem) = derive_fields(record);
        if let Some(problem) = problem {
            warn!("{problem}");
            summary.errors.push(problem);
        }
        record.derived = Some(derived);
    }

    apply_patches(dataset, MANUAL_PATCHES, &mut summary);

    dataset.records.retain(|r| {
        let keep = !DUPLICATE_ROWS.contains(&r.index);
        if !keep {
            debug!(index = r.index, "dropping duplicate row");
        }
        keep
    });

    for record in &dataset.records {
        let Some(d) = record.derived.as_ref() else {
            continue;
        };
        if d.offense_cat == NO_PARSE {
            summary.no_parse += 1;
        }
        if d.victim == NO_PLAYER_VICTIM {
            summary.no_victim += 1;
        }
        match d.forfeit {
            Money::Amount(v) => summary.forfeited_total += v,
            Money::Error => summary.money_errors += 1,
        }
    }
    summary.rows_out = dataset.len();
    info!(
        rows_in = summary.rows_in,
        rows_out = summary.rows_out,
        patches = summary.patches_applied,
        "cleaned dataset"
    );
    summary
}

pub fn apply_patches(
    dataset: &mut Dataset,
    patches: &[(usize, PatchValue)],
    summary: &mut CleanSummary,
) {
    for (index, value) in patches {
        let target = dataset
            .records
            .iter_mut()
            .find(|r| r.index == *index)
            .and_then(|r| r.derived.as_mut());
        let Some(derived) = target else {
            let msg = format!("patch for row {index} ({}) has no target", value.field());
            warn!("{msg}");
            summary.errors.push(msg);
            continue;
        };
        match *value {
            PatchValue::OffenseCategory(cat) => derived.offense_cat = cat.to_string(),
            PatchValue::TotalGames(total) => {
                let mut games = derived.games.unwrap_or_default();
                games.total = total;
                derived.games = Some(games);
            }
            PatchValue::ForfeitedSalary(v) => derived.forfeit = Money::Amount(v),
        }
        summary.patches_applied += 1;
    }
}
