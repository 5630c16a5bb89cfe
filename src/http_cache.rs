use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "nhl_dops";
const PAGES_DIR: &str = "pages";

/// One cached response. Pages are large, so every URL gets its own file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    version: u32,
    url: String,
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

/// GET `url`, revalidating against the on-disk copy with ETag/Last-Modified.
///
/// A 304 answer returns the cached body. Cache write failures are logged and
/// otherwise ignored; the fetched body is still returned.
pub fn fetch_text_cached(client: &Client, url: &str) -> Result<String> {
    let cache_dir = app_cache_dir();
    let cached = cache_dir.as_deref().and_then(|dir| load_entry_in(dir, url));

    let mut req = client.get(url);
    if let Some(entry) = cached.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req
        .send()
        .with_context(|| format!("request failed: {url}"))?;
    let status = resp.status();
    if status == StatusCode::NOT_MODIFIED {
        if let Some(entry) = cached {
            debug!(url, "cache revalidated");
            return Ok(entry.body);
        }
        return Err(anyhow!("received 304 without cache body for {url}"));
    }

    let headers = resp.headers().clone();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {status} for {url}"));
    }

    let header_text = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    let entry = CacheEntry {
        version: CACHE_VERSION,
        url: url.to_string(),
        body: body.clone(),
        etag: header_text(ETAG),
        last_modified: header_text(LAST_MODIFIED),
        fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
    };
    if let Some(dir) = cache_dir.as_deref() {
        if let Err(err) = save_entry_in(dir, &entry) {
            warn!(url, error = %err, "failed to write http cache entry");
        }
    }
    Ok(body)
}

/// Entries written by another cache version, or stored under a colliding
/// name for a different URL, are misses.
fn load_entry_in(cache_dir: &Path, url: &str) -> Option<CacheEntry> {
    let raw = fs::read_to_string(entry_path_in(cache_dir, url)).ok()?;
    let entry = serde_json::from_str::<CacheEntry>(&raw).ok()?;
    if entry.version != CACHE_VERSION || entry.url != url {
        return None;
    }
    Some(entry)
}

/// Readers never see a partial file: the entry is written beside its final
/// name and renamed into place.
fn save_entry_in(cache_dir: &Path, entry: &CacheEntry) -> Result<()> {
    let path = entry_path_in(cache_dir, &entry.url);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("create http cache dir")?;
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(entry).context("serialize http cache entry")?;
    fs::write(&tmp, json).context("write http cache entry")?;
    fs::rename(&tmp, &path).context("swap http cache entry")?;
    Ok(())
}

fn entry_path_in(cache_dir: &Path, url: &str) -> PathBuf {
    let digest = Sha256::digest(url.as_bytes());
    cache_dir.join(PAGES_DIR).join(format!("{digest:x}.json"))
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
