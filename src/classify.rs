//! Free-text classifiers applied by the cleaner.
//!
//! Every function here is pure: text in, derived value out. Unreadable input
//! resolves to the sentinel strings below rather than an error.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

pub const NO_PARSE: &str = "NO PARSE";
pub const NO_PLAYER_VICTIM: &str = "No Player Victim";

/// Offense pattern → category, in precedence order. The first pattern found
/// anywhere in the text decides the category.
const OFFENSE_PATTERNS: &[(&str, &str)] = &[
    (r".*abuse.*official", "Abuse of Official"),
    (r"Attempt.*", "Attempt to Injure"),
    (r"Automatic.*", "Automatic Suspension"),
    (r"Blindsid.*", "Blindsiding"),
    (r"Board.*", "Boarding"),
    (r"[Bb]utt-?end.*", "Butt-Ending"),
    (r"[Cc]harg.*", "Charging"),
    (r"Clip.*", "Clipping"),
    (
        r"([Cc]omment.*|[Cc]omplaint.*|[Gg]esture.*|[Ss]lur)",
        "Comments/Gestures",
    ),
    (r"Cross.check.*", "Cross-checking"),
    (r"Diving.*", "Diving"),
    (r"Elbow.*", "Elbowing"),
    (r"[Hh]ead-?butt.*", "Head-Butting"),
    (r"High.stick.*", "High-Stick"),
    (r"(Hit.*|Check.*) from behind", "Hitting from Behind"),
    (r"Illegal( check| hit)", "Illegal Check"),
    (r"(Inappropriate.*|conduct)", "Inappropriate Conduct"),
    (r"([Ii]nstigat.*|[Aa]ggress.*)", "Instigator"),
    (r"Interfer.*", "Interference"),
    (r"Knee-on-knee.*", "Knee-on-knee"),
    (r"([Kk]ick.*|Kneeing)", "Kicking or Kneeing"),
    // late, low, or to the head
    (r"([Ll]ate|[Ll]ow)?.*([Hh]it.|[Cc]heck)(to the head)?", "Illegal hit"),
    (r"[Ll]eaving.*bench", "Leaving Bench"),
    (r"[Pp]unch.*", "Punching"),
    (r"Roughing.*", "Roughing"),
    (r"Slash.*", "Slashing"),
    (r"[Ss]lew.*", "Slew-footing"),
    (r"Spear.*", "Spearing"),
    (r"[Tt]rip.*", "Tripping"),
    (r".*[Vv]iolating", "Drugs"),
];

static OFFENSE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    OFFENSE_PATTERNS
        .iter()
        .map(|(pattern, label)| (Regex::new(pattern).expect("valid offense regex"), *label))
        .collect()
});

/// Matches that look like names but are teams or league programs.
const VICTIM_DENYLIST: &[&str] = &[
    "Substances Program",
    "Health Program",
    "Star Game",
    "Montreal Canadiens",
    "Vancouver Canucks",
    "Maple Leafs",
    "Red Wings",
];

// The greedy `.*` makes this pick the last name-shaped pair in the text.
static VICTIM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:[A-Z]\w+ing)?.*(",
        r"[A-Z]\w+\s[A-Z]\w+",
        r"|[A-Z][.]\s?[A-Z][.]\s?\s[A-Z]\w+",
        r"|[A-Z]\w+\s[A-Z]'[A-Z]\w+",
        r")"
    ))
    .expect("valid victim regex")
});

static FIRST_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("valid int regex"));
static POST_SEASON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r".*?(\d+)(?:\s[A-Z]{0,3})?(?:\s\d{4})?\spost-season").expect("valid regex")
});
static PRE_SEASON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r".*?(\d+)(?:\s[A-Z]{0,3})?(?:\s\d{4})?\spre-season").expect("valid regex")
});

/// Map an offense description to its category, or `NO PARSE`.
pub fn offense_category(offense: &str) -> &'static str {
    OFFENSE_RULES
        .iter()
        .find(|(re, _)| re.is_match(offense))
        .map(|(_, label)| *label)
        .unwrap_or(NO_PARSE)
}

/// Pull the injured player's name out of an offense description.
pub fn victim_name(offense: &str) -> String {
    let Some(found) = VICTIM.captures(offense).and_then(|caps| caps.get(1)) else {
        return NO_PLAYER_VICTIM.to_string();
    };
    let name = found.as_str();
    if VICTIM_DENYLIST.contains(&name) {
        return NO_PLAYER_VICTIM.to_string();
    }
    name.to_string()
}

/// Games of a suspension, split by season segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuspensionGames {
    pub total: u32,
    pub playoff: u32,
    pub preseason: u32,
}

impl SuspensionGames {
    /// Total minus playoff and preseason games. Negative when the length text
    /// was inconsistent; that is left visible rather than clamped.
    pub fn regular(&self) -> i64 {
        i64::from(self.total) - i64::from(self.playoff) - i64::from(self.preseason)
    }
}

/// Parse a suspension length such as `5 games (2 post-season)`.
///
/// The first integer is the total; `None` when the text has no digits.
pub fn suspension_games(text: &str) -> Option<SuspensionGames> {
    let total = first_capture_u32(&FIRST_INT, text)?;
    Some(SuspensionGames {
        total,
        playoff: first_capture_u32(&POST_SEASON, text).unwrap_or(0),
        preseason: first_capture_u32(&PRE_SEASON, text).unwrap_or(0),
    })
}

fn first_capture_u32(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRole {
    Offender,
    Victim,
}

impl NameRole {
    pub const BOTH: [NameRole; 2] = [NameRole::Offender, NameRole::Victim];

    /// Prefix of the extension columns written for this role.
    pub fn column_prefix(&self) -> &'static str {
        match self {
            NameRole::Offender => "off_",
            NameRole::Victim => "vic_",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePart {
    First,
    Last,
}

const NON_PLAYER_NAMES: &[&str] = &[NO_PLAYER_VICTIM, "Team", "Organization"];

static COMMA_LAST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+),?\s\w+").expect("valid regex"));
static COMMA_FIRST: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+,?\s(\w+)").expect("valid regex"));
static SPACE_LAST: Lazy<Regex> = Lazy::new(|| Regex::new(r".*\s(\w+)").expect("valid regex"));
static SPACE_LAST_VICTIM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*\s([A-Z].\w+|\w+)").expect("valid regex"));
static SPACE_FIRST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.*)\s\w+").expect("valid regex"));

/// Split a person's name into its first or last part.
///
/// `Last, First` and `First Last` orders are both accepted. Victims may carry
/// apostrophe surnames (`D'Amigo`) in the space form. Placeholders such as
/// `Team` are not people and yield `None`.
pub fn split_name(name: &str, role: NameRole, part: NamePart) -> Option<String> {
    let name = name.trim();
    if name.is_empty() || NON_PLAYER_NAMES.contains(&name) {
        return None;
    }
    let re: &Regex = match (name.contains(','), part, role) {
        (true, NamePart::Last, _) => &COMMA_LAST,
        (true, NamePart::First, _) => &COMMA_FIRST,
        (false, NamePart::Last, NameRole::Offender) => &SPACE_LAST,
        (false, NamePart::Last, NameRole::Victim) => &SPACE_LAST_VICTIM,
        (false, NamePart::First, _) => &SPACE_FIRST,
    };
    re.captures_iter(name)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%Y-%m-%d", "%m/%d/%Y"];

static EMBEDDED_LONG_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][a-z]+\.? \d{1,2}, \d{4}").expect("valid regex"));
static EMBEDDED_ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid regex"));

/// Parse the date formats seen in the Wikipedia tables and in cleaned CSVs.
///
/// Cells sometimes carry a hidden sort key in front of the visible date; the
/// visible `Month D, YYYY` form is preferred over the key.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(date) = parse_with_formats(text) {
        return Some(date);
    }
    if let Some(found) = EMBEDDED_LONG_DATE.find(text) {
        if let Some(date) = parse_with_formats(&found.as_str().replace('.', "")) {
            return Some(date);
        }
    }
    EMBEDDED_ISO_DATE
        .find(text)
        .and_then(|found| parse_with_formats(found.as_str()))
}

fn parse_with_formats(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offense_first_pattern_wins() {
        assert_eq!(offense_category("Boarding resulting in injury to John Smith"), "Boarding");
        assert_eq!(offense_category("Roughing and boarding"), "Roughing");
        assert_eq!(offense_category("Boarding and Roughing"), "Boarding");
        assert_eq!(offense_category("Physical abuse of an official"), "Abuse of Official");
        assert_eq!(offense_category("Cross-checking Derek Stepan"), "Cross-checking");
        assert_eq!(offense_category("Late hit on Nick Foligno"), "Illegal hit");
        assert_eq!(offense_category("Hit from behind on Tom Wilson"), "Hitting from Behind");
        assert_eq!(
            offense_category("Violating the terms of the Substances Program"),
            "Drugs"
        );
    }

    #[test]
    fn offense_without_keyword_is_no_parse() {
        assert_eq!(offense_category("Unsportsmanlike behaviour"), NO_PARSE);
        assert_eq!(offense_category(""), NO_PARSE);
    }

    #[test]
    fn offense_match_is_case_sensitive_as_authored() {
        // `Slash.*` has no lowercase variant
        assert_eq!(offense_category("slashing"), NO_PARSE);
        assert_eq!(offense_category("tripping"), "Tripping");
    }

    #[test]
    fn victim_name_shapes() {
        assert_eq!(victim_name("Boarding resulting in injury to John Smith"), "John Smith");
        assert_eq!(
            victim_name("Illegal check to the head of P. K. Subban"),
            "P. K. Subban"
        );
        assert_eq!(victim_name("Slashing Jason D'Amigo"), "Jason D'Amigo");
    }

    #[test]
    fn victim_denylist_and_misses() {
        assert_eq!(
            victim_name("Violating the terms of the Substances Program"),
            NO_PLAYER_VICTIM
        );
        assert_eq!(victim_name("Comments about the Maple Leafs"), NO_PLAYER_VICTIM);
        assert_eq!(victim_name("Diving"), NO_PLAYER_VICTIM);
    }

    #[test]
    fn games_split_by_segment() {
        let g = suspension_games("5 games (2 post-season)").unwrap();
        assert_eq!((g.total, g.playoff, g.preseason, g.regular()), (5, 2, 0, 3));

        let g = suspension_games("10 games (4 pre-season, 6 regular season)").unwrap();
        assert_eq!((g.total, g.playoff, g.preseason, g.regular()), (10, 0, 4, 6));

        let g = suspension_games("8 games (3 NHL 2013 post-season)").unwrap();
        assert_eq!(g.playoff, 3);

        assert_eq!(suspension_games("0").unwrap().total, 0);
        assert!(suspension_games("Indefinite").is_none());
    }

    #[test]
    fn games_invariant_holds_even_when_negative() {
        for text in [
            "2 games",
            "3 games (1 pre-season)",
            "1 game (5 post-season)",
            "20 games (4 post-season, 2 pre-season)",
        ] {
            let g = suspension_games(text).unwrap();
            assert_eq!(
                g.regular() + i64::from(g.playoff) + i64::from(g.preseason),
                i64::from(g.total),
                "{text}"
            );
        }
        assert_eq!(suspension_games("1 game (5 post-season)").unwrap().regular(), -4);
    }

    #[test]
    fn split_name_space_and_comma_forms() {
        use NamePart::*;
        use NameRole::*;
        assert_eq!(split_name("John Smith", Offender, Last).as_deref(), Some("Smith"));
        assert_eq!(split_name("John Smith", Offender, First).as_deref(), Some("John"));
        assert_eq!(split_name("Smith, John", Victim, Last).as_deref(), Some("Smith"));
        assert_eq!(split_name("Smith, John", Victim, First).as_deref(), Some("John"));
        assert_eq!(split_name("Jason D'Amigo", Victim, Last).as_deref(), Some("D'Amigo"));
        // offenders do not get the apostrophe allowance
        assert_eq!(split_name("Jason D'Amigo", Offender, Last).as_deref(), Some("D"));
        assert_eq!(split_name("P.K. Subban", Offender, First).as_deref(), Some("P.K."));
    }

    #[test]
    fn split_name_placeholders_are_absent() {
        for placeholder in [NO_PLAYER_VICTIM, "Team", "Organization", ""] {
            assert_eq!(split_name(placeholder, NameRole::Victim, NamePart::Last), None);
        }
        assert_eq!(split_name("Madonna", NameRole::Offender, NamePart::Last), None);
    }

    #[test]
    fn dates_in_table_formats() {
        let d = NaiveDate::from_ymd_opt(2016, 10, 22).unwrap();
        assert_eq!(parse_date("October 22, 2016"), Some(d));
        assert_eq!(parse_date("Oct 22, 2016"), Some(d));
        assert_eq!(parse_date("22 October 2016"), Some(d));
        assert_eq!(parse_date("2016-10-22"), Some(d));
        assert_eq!(parse_date("000000002016-10-22-0000October 22, 2016"), Some(d));
        assert_eq!(parse_date("Sept. 31"), None);
        assert_eq!(parse_date(""), None);
    }
}
