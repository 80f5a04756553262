//! Target-path naming and raw URL rewriting
//!
//! Both are pure string transformations; callers supply the clock.

use chrono::{DateTime, TimeZone};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;

use super::replace_brace_tokens;

/// Expand a rename template for `file_name` at `time`.
///
/// | token                          | value                                  |
/// |--------------------------------|----------------------------------------|
/// | `{year}` ... `{second}`        | zero-padded parts of `time`            |
/// | `{unixts}`                     | seconds since the epoch                |
/// | `{unixtsms}`                   | microseconds since the epoch           |
/// | `{ext}`                        | extension including the dot, or empty  |
/// | `{fullname}`                   | file name with extension               |
/// | `{filename}`, `{fname}`        | file name without extension            |
/// | `{fnamehash}`, `{filenamehash}`| hex MD5 of the name without extension  |
/// | `{fnamehash4}`, `{fnamehash8}` | first 4 / 8 hex digits of that hash    |
///
/// Underscores inside braces are ignored (`{fname_hash8}` works).
pub fn rename<Tz>(template: &str, file_name: &str, time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let hash = format!("{:x}", md5::compute(stem.as_bytes()));

    replace_brace_tokens(template, |token| {
        let value = match token {
            "year" => time.format("%Y").to_string(),
            "month" => time.format("%m").to_string(),
            "day" => time.format("%d").to_string(),
            "hour" => time.format("%H").to_string(),
            "minute" => time.format("%M").to_string(),
            "second" => time.format("%S").to_string(),
            "unixts" => time.timestamp().to_string(),
            "unixtsms" => time.timestamp_micros().to_string(),
            "ext" => ext.clone(),
            "fullname" => format!("{stem}{ext}"),
            "filename" | "fname" => stem.clone(),
            "fnamehash" | "filenamehash" => hash.clone(),
            "fnamehash4" => hash[..4].to_string(),
            "fnamehash8" => hash[..8].to_string(),
            _ => return None,
        };
        Some(value)
    })
}

/// Expand the legacy `{remotepath}` token some adapter definitions still use
pub fn expand_request_tokens(input: &str, target_path: &str) -> String {
    replace_brace_tokens(input, |token| match token {
        "remotepath" => Some(target_path.to_string()),
        _ => None,
    })
}

/// Literal substring rewrites applied to raw URLs
#[derive(Debug, Clone, Default)]
pub struct UrlRewriter {
    rules: Vec<(String, String)>,
}

impl UrlRewriter {
    /// Rules are applied in key order; empty patterns are skipped
    ///
    /// Rules chain: one rule's output can match a later rule's pattern, so a
    /// second pass over an already rewritten URL is not always a no-op.
    pub fn new(replacements: &BTreeMap<String, String>) -> Self {
        let rules = replacements
            .iter()
            .filter(|(from, _)| !from.is_empty())
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect();
        Self { rules }
    }

    pub fn replace_url(&self, raw_url: &str) -> String {
        self.rules
            .iter()
            .fold(raw_url.to_string(), |url, (from, to)| url.replace(from, to))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
