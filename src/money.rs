use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static STRICT_MONEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[$](\d+,\d+.\d+)").expect("valid money regex"));

/// A parsed currency amount, or the `ERROR` sentinel when the text could not be
/// read. Downstream consumers check for the literal `ERROR`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Money {
    Amount(f64),
    Error,
}

pub const MONEY_ERROR: &str = "ERROR";

impl Money {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Money::Amount(v) => Some(*v),
            Money::Error => None,
        }
    }

    /// Read back a value written by `Display`.
    pub fn from_cell(cell: &str) -> Option<Money> {
        let t = cell.trim();
        if t.is_empty() {
            return None;
        }
        if t == MONEY_ERROR {
            return Some(Money::Error);
        }
        t.parse::<f64>().ok().map(Money::Amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Money::Amount(v) => write!(f, "{v}"),
            Money::Error => f.write_str(MONEY_ERROR),
        }
    }
}

/// Convert currency text such as `$12,345.67` to a number.
///
/// `None` (no cell at all) and blank cells count as zero, the same value an
/// empty cell reads back as from CSV. Text that neither parses directly
/// after dropping `$`/`,` nor contains a `$d,ddd.dd` amount becomes
/// `Money::Error`.
pub fn money_to_float(text: Option<&str>) -> Money {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Money::Amount(0.0);
    };
    if let Some(v) = parse_stripped(text) {
        return Money::Amount(v);
    }
    STRICT_MONEY
        .captures(text)
        .and_then(|caps| parse_stripped(&caps[1]))
        .map(Money::Amount)
        .unwrap_or(Money::Error)
}

fn parse_stripped(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| *c != '$' && *c != ',').collect();
    let v = cleaned.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Render `1234.5` as `$1,234.50`.
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (idx, ch) in dollars.chars().enumerate() {
        if idx > 0 && (dollars.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}
