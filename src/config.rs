use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::season::SeasonCutoff;

pub const RAW_CSV: &str = "NHL_Suspensions.csv";
pub const CLEAN_CSV: &str = "Scrubbed_CSV.csv";
pub const STATS_CSV: &str = "Stats_CSV.csv";
pub const INJURY_CSV: &str = "NHL_Injuries.csv";
pub const CORRELATED_CSV: &str = "Injury_Suspension_Connect.csv";

const DEFAULT_DELAY_MS: u64 = 1000;
const DEFAULT_BOUNDARY_MONTH: u32 = 7;
const DEFAULT_FIRST_SEASON: i32 = 2009;
const DEFAULT_LAST_SEASON: i32 = 2016;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub request_delay: Duration,
    pub use_http_cache: bool,
    pub season_cutoff: SeasonCutoff,
    pub wiki_base_url: String,
    pub gamelog_base_url: String,
    pub suggest_base_url: String,
    pub first_season: i32,
    pub last_season: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            request_delay: Duration::from_millis(DEFAULT_DELAY_MS),
            use_http_cache: true,
            season_cutoff: SeasonCutoff::new(DEFAULT_BOUNDARY_MONTH),
            wiki_base_url: "https://en.wikipedia.org/wiki/".to_string(),
            gamelog_base_url: "https://www.hockey-reference.com".to_string(),
            suggest_base_url: "https://suggest.svc.nhl.com".to_string(),
            first_season: DEFAULT_FIRST_SEASON,
            last_season: DEFAULT_LAST_SEASON,
        }
    }
}

impl PipelineConfig {
    /// Read settings from `DOPS_*` variables. Call `load_dotenv` first to pick
    /// up `.env` files.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let data_dir = env::var("DOPS_DATA_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let delay_ms = env_parse::<u64>("DOPS_REQUEST_DELAY_MS")
            .unwrap_or(DEFAULT_DELAY_MS)
            .min(60_000);
        let boundary_month = env_parse::<u32>("DOPS_SEASON_BOUNDARY_MONTH")
            .unwrap_or(DEFAULT_BOUNDARY_MONTH)
            .clamp(1, 12);
        let first_season = env_parse::<i32>("DOPS_FIRST_SEASON").unwrap_or(DEFAULT_FIRST_SEASON);
        let last_season = env_parse::<i32>("DOPS_LAST_SEASON")
            .unwrap_or(DEFAULT_LAST_SEASON)
            .max(first_season);

        Self {
            data_dir,
            request_delay: Duration::from_millis(delay_ms),
            use_http_cache: env_bool("DOPS_HTTP_CACHE", true),
            season_cutoff: SeasonCutoff::new(boundary_month),
            wiki_base_url: env_url("DOPS_WIKI_BASE_URL", defaults.wiki_base_url),
            gamelog_base_url: env_url("DOPS_GAMELOG_BASE_URL", defaults.gamelog_base_url),
            suggest_base_url: env_url("DOPS_SUGGEST_BASE_URL", defaults.suggest_base_url),
            first_season,
            last_season,
        }
    }

    /// Apply `--data-dir` from the command line, if given.
    pub fn with_args(mut self, args: &[String]) -> Self {
        if let Some(dir) = parse_flag_value(args, "--data-dir") {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn data_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// Find `--name value` or `--name=value` in `args`.
pub fn parse_flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

pub fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_url(key: &str, default: String) -> String {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}
