use std::fs;
use std::path::PathBuf;

use nhl_dops::config::PipelineConfig;
use nhl_dops::http_client::StaticSource;
use nhl_dops::wiki_scrape::{
    ExtractError, TableFormat, extract_page, scrape_seasons, season_page_name,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn wide_page_extracts_suspensions_and_fines() {
    let html = read_fixture("wiki_2014_15.html");
    let page = extract_page(&html, 2014, "2014–15").expect("page should extract");

    assert_eq!(
        page.tables_used,
        vec![
            (0, TableFormat::CurrentSuspension),
            (1, TableFormat::CurrentFine)
        ]
    );
    assert_eq!(page.records.len(), 3);
    let slots: Vec<usize> = page.records.iter().map(|r| r.index).collect();
    assert_eq!(slots, vec![0, 1, 3]);
    assert_eq!(page.slot_count(), 4);

    let first = &page.records[0];
    assert_eq!(first.off_date, "January 5, 2015");
    assert_eq!(first.offender, "Doe, Jane");
    assert_eq!(first.off_team, "Boston Bruins");
    assert_eq!(first.offense, "Boarding resulting in injury to John Smith");
    assert_eq!(first.dops_date.as_deref(), Some("January 7, 2015"));
    assert_eq!(first.susp, "3 games");
    assert_eq!(first.forfeit_sal.as_deref(), Some("$10,000.00"));
    assert_eq!(first.fine.as_deref(), Some("0"));

    // Short row: no salary cell.
    assert_eq!(page.records[1].forfeit_sal.as_deref(), Some("N/A"));

    let fine = &page.records[2];
    assert_eq!(fine.offender, "Poe, Edgar");
    assert_eq!(fine.susp, "0");
    assert_eq!(fine.forfeit_sal.as_deref(), Some("0"));
    assert_eq!(fine.fine.as_deref(), Some("$2,000.00"));
}

#[test]
fn short_rows_are_reported_not_fatal() {
    let html = read_fixture("wiki_2014_15.html");
    let page = extract_page(&html, 2014, "2014–15").expect("page should extract");

    assert_eq!(page.failures.len(), 1);
    let failure = &page.failures[0];
    assert_eq!(failure.table, 0);
    assert_eq!(failure.row, 3);
    assert_eq!(failure.slot, 2);
    assert_eq!(failure.error, ExtractError::MissingCell { index: 3, cells: 3 });
    assert!(failure.to_string().starts_with("2014–15 table 0 row 3"));
}

#[test]
fn narrow_page_uses_length_header() {
    let html = read_fixture("wiki_2012_13.html");
    let page = extract_page(&html, 2012, "2012–13").expect("page should extract");

    assert_eq!(
        page.tables_used,
        vec![
            (0, TableFormat::CurrentFine),
            (1, TableFormat::CurrentSuspension)
        ]
    );
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].fine.as_deref(), Some("$2,500.00"));
    assert_eq!(page.records[1].susp, "2 games");
    assert_eq!(page.records[1].forfeit_sal.as_deref(), Some("$21,000.00"));
    assert!(page.failures.is_empty());
}

#[test]
fn legacy_page_keeps_every_row() {
    let html = read_fixture("wiki_2009_10.html");
    let page = extract_page(&html, 2009, "2009–10").expect("page should extract");

    assert_eq!(
        page.tables_used,
        vec![
            (0, TableFormat::LegacySuspension),
            (1, TableFormat::LegacyFine)
        ]
    );
    assert_eq!(page.records.len(), 3);
    let suspension = &page.records[1];
    assert_eq!(suspension.susp, "2 games (1 pre-season)");
    assert_eq!(suspension.dops_date, None);
    assert_eq!(suspension.forfeit_sal, None);
    assert_eq!(suspension.fine, None);

    let fine = &page.records[2];
    assert_eq!(fine.susp, "0");
    assert_eq!(fine.fine.as_deref(), Some("$2,500.00"));
}

#[test]
fn repaired_row_does_not_renumber_later_rows() {
    let config = PipelineConfig {
        first_season: 2014,
        last_season: 2014,
        ..PipelineConfig::default()
    };
    let url = format!("{}{}", config.wiki_base_url, season_page_name(2014));
    let broken = read_fixture("wiki_2014_15.html");
    let repaired = broken.replace(
        "<td>Ottawa Senators</td>\n</tr>",
        "<td>Ottawa Senators</td><td>Roughing</td><td>March 4, 2015</td>\
         <td>1 game</td><td>N/A</td>\n</tr>",
    );
    assert_ne!(broken, repaired, "fixture should contain the broken row");

    let index_of = |html: String| {
        let mut source = StaticSource::new().with_page(url.clone(), html);
        let summary = scrape_seasons(&mut source, &config);
        summary
            .dataset
            .records
            .iter()
            .find(|r| r.offender == "Poe, Edgar")
            .map(|r| r.index)
    };
    assert_eq!(index_of(broken), Some(3));
    assert_eq!(index_of(repaired), Some(3));
}

#[test]
fn only_plain_sortable_tables_are_event_tables() {
    let html = read_fixture("wiki_2009_10.html").replacen(
        "<body>",
        "<body>\n<table class=\"wikitable sortable plainrowheaders\">\
         <tr><th>Team</th><th>Suspensions</th><th>Fines</th><th>Games</th><th>Total</th></tr>\
         <tr><td>Boston Bruins</td><td>2</td><td>1</td><td>5</td><td>$4,000.00</td></tr>\
         </table>",
        1,
    );
    let page = extract_page(&html, 2009, "2009–10").expect("page should extract");

    assert_eq!(
        page.tables_used,
        vec![
            (0, TableFormat::LegacySuspension),
            (1, TableFormat::LegacyFine)
        ]
    );
    assert_eq!(page.records.len(), 3);
    assert_eq!(page.records[0].offender, "Cooke, Matt");
}

#[test]
fn page_without_tables_is_an_error() {
    let err = extract_page("<html><body><p>gone</p></body></html>", 2014, "x").unwrap_err();
    assert_eq!(err, ExtractError::NoTables);
    let err = extract_page("<html></html>", 2005, "x").unwrap_err();
    assert_eq!(err, ExtractError::UnknownSeason(2005));
}

#[test]
fn scrape_walks_seasons_newest_first() {
    let config = PipelineConfig {
        first_season: 2012,
        last_season: 2014,
        ..PipelineConfig::default()
    };
    let base = config.wiki_base_url.clone();
    let mut source = StaticSource::new()
        .with_page(
            format!("{base}{}", season_page_name(2014)),
            read_fixture("wiki_2014_15.html"),
        )
        .with_page(
            format!("{base}{}", season_page_name(2012)),
            read_fixture("wiki_2012_13.html"),
        );

    let summary = scrape_seasons(&mut source, &config);

    assert_eq!(summary.pages_total, 3);
    assert_eq!(summary.pages_succeeded, 2);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains("2013–14"));
    assert_eq!(summary.row_failures.len(), 1);

    // The broken 2014-15 suspension row keeps index 2, so the fine after it
    // stays at 3 and the older page starts at 4.
    let indexes: Vec<usize> = summary.dataset.records.iter().map(|r| r.index).collect();
    assert_eq!(indexes, vec![0, 1, 3, 4, 5]);
    assert_eq!(summary.dataset.records[0].offender, "Doe, Jane");
    assert_eq!(summary.dataset.records[2].offender, "Poe, Edgar");
    assert_eq!(summary.dataset.records[3].offender, "Lee, Adam");
    assert_eq!(summary.row_failures[0].slot, 2);

    assert_eq!(
        source.requested(),
        &[
            "https://en.wikipedia.org/wiki/2014–15_NHL_suspensions_and_fines".to_string(),
            "https://en.wikipedia.org/wiki/2013–14_NHL_suspensions_and_fines".to_string(),
            "https://en.wikipedia.org/wiki/2012–13_NHL_suspensions_and_fines".to_string(),
        ]
    );
}
