use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use nhl_dops::clean::derive_fields;
use nhl_dops::dataset::Dataset;
use nhl_dops::export::export_correlation_xlsx;
use nhl_dops::injury::{
    CorrelateOptions, Injury, InjuryMultiplicity, InjuryRecord, correlate, load_injuries,
    write_correlated_csv,
};
use nhl_dops::record::DisciplinaryRecord;
use nhl_dops::season::SeasonCutoff;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn suspension(index: usize, off_date: &str, offense: &str) -> DisciplinaryRecord {
    let mut record = DisciplinaryRecord::new(index);
    record.off_date = off_date.to_string();
    record.offender = "Doe, Jane".to_string();
    record.off_team = "Boston Bruins".to_string();
    record.offense = offense.to_string();
    record.susp = "3 games".to_string();
    record.derived = Some(derive_fields(&record).0);
    record
}

fn injury(player: &str, injury_type: &str, start_year: i32, games: &str) -> Injury {
    Injury {
        record: InjuryRecord {
            player: player.to_string(),
            injury_type: injury_type.to_string(),
            season: format!("{start_year}-{}", start_year + 1),
            games_missed: games.to_string(),
        },
        start_year,
    }
}

#[test]
fn season_boundary_is_july_first() {
    let cutoff = SeasonCutoff::default();
    let june_30 = NaiveDate::from_ymd_opt(2016, 6, 30).unwrap();
    let july_1 = NaiveDate::from_ymd_opt(2016, 7, 1).unwrap();
    assert_eq!(cutoff.season_start_year(june_30), 2015);
    assert_eq!(cutoff.season_start_year(july_1), 2016);
    assert_eq!(cutoff.season_end_year(july_1), 2017);

    let august = SeasonCutoff::new(8);
    assert_eq!(august.season_start_year(july_1), 2015);
}

#[test]
fn injury_joins_only_the_matching_season() {
    let dataset = Dataset::new(vec![
        suspension(0, "November 10, 2015", "Boarding resulting in injury to John Smith"),
        suspension(1, "December 1, 2014", "Elbowing John Smith"),
    ]);
    let injuries = vec![injury("Smith", "Concussion", 2015, "12")];

    let report = correlate(
        &dataset,
        &injuries,
        SeasonCutoff::default(),
        CorrelateOptions::default(),
    );

    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert_eq!(row.victim, "Smith");
    assert_eq!(row.date, "2015-11-10");
    assert_eq!(row.games_missed, "12");
    assert_eq!(row.inj_type, "Concussion");
    assert_eq!(row.susp_act, "Boarding");
    assert!(report.truncated.is_empty());
}

#[test]
fn second_injury_in_a_season_is_truncated_visibly() {
    let dataset = Dataset::new(vec![suspension(
        0,
        "November 10, 2015",
        "Boarding resulting in injury to John Smith",
    )]);
    let injuries = vec![
        injury("Smith", "Concussion", 2015, "12"),
        injury("Smith", "Upper body", 2015, "4"),
    ];

    let first = correlate(
        &dataset,
        &injuries,
        SeasonCutoff::default(),
        CorrelateOptions::default(),
    );
    assert_eq!(first.rows.len(), 1);
    assert_eq!(first.rows[0].inj_type, "Concussion");
    assert_eq!(first.truncated.len(), 1);
    assert_eq!(first.truncated[0].inj_type, "Upper body");

    let all = correlate(
        &dataset,
        &injuries,
        SeasonCutoff::default(),
        CorrelateOptions {
            multiplicity: InjuryMultiplicity::AllPerSeason,
        },
    );
    assert_eq!(all.rows.len(), 2);
    assert!(all.truncated.is_empty());
}

#[test]
fn fixture_file_filters_and_correlates() {
    let load = load_injuries(&fixture_path("injuries.csv")).expect("injury fixture loads");
    assert_eq!(load.injuries.len(), 4);
    assert_eq!(load.excluded, 1);
    assert_eq!(load.errors.len(), 1);

    let dataset = Dataset::new(vec![
        suspension(0, "November 10, 2015", "Boarding resulting in injury to John Smith"),
        suspension(1, "January 20, 2015", "Illegal check to the head of Tom Jones"),
        suspension(2, "March 1, 2016", "Diving"),
    ]);
    let report = correlate(
        &dataset,
        &load.injuries,
        SeasonCutoff::default(),
        CorrelateOptions::default(),
    );

    let victims: Vec<(&str, &str)> = report
        .rows
        .iter()
        .map(|r| (r.victim.as_str(), r.inj_type.as_str()))
        .collect();
    assert_eq!(victims, vec![("Smith", "Concussion"), ("Jones", "Shoulder")]);
    assert_eq!(report.rows[1].susp_act, "Illegal Check");
    assert_eq!(report.truncated.len(), 1);

    let dir = tempfile::tempdir().expect("temp dir");
    let csv_path = dir.path().join("Injury_Suspension_Connect.csv");
    write_correlated_csv(&csv_path, &report.rows).expect("write correlation csv");
    let text = fs::read_to_string(&csv_path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("victim,date,games_missed,inj_type,susp_act"));
    assert_eq!(lines.next(), Some("Smith,2015-11-10,12,Concussion,Boarding"));

    let xlsx_path = dir.path().join("correlation.xlsx");
    let exported = export_correlation_xlsx(&xlsx_path, &report).expect("export workbook");
    assert_eq!(exported.correlated, 2);
    assert_eq!(exported.truncated, 1);
    assert!(xlsx_path.exists());
}
