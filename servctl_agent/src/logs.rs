//! Trailing text of the newest supervisor log file per glob pattern.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use crate::error::ControlError;
use crate::types::LogBundle;

pub const DEFAULT_TAIL_CHARS: usize = 5000;

/// Never fails as a whole: a bad pattern or unreadable file becomes an
/// `error_<pattern>` entry and the remaining patterns are still read.
pub fn collect_logs<S: AsRef<str>>(patterns: &[S], tail_chars: usize) -> LogBundle {
    let mut bundle = LogBundle::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        match newest_match(pattern).and_then(|p| p.map(|p| read_tail(&p, tail_chars)).transpose()) {
            Ok(Some((name, text))) => {
                bundle.insert(name, text);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("{e}");
                bundle.insert(format!("error_{pattern}"), e.to_string());
            }
        }
    }
    bundle
}

fn newest_match(pattern: &str) -> Result<Option<PathBuf>, ControlError> {
    let paths = glob::glob(pattern).map_err(|source| ControlError::LogPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(paths
        .filter_map(Result::ok)
        .filter_map(|p| {
            let modified = fs::metadata(&p)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            p.is_file().then_some((modified, p))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, p)| p))
}

fn read_tail(path: &Path, tail_chars: usize) -> Result<(String, String), ControlError> {
    let bytes = fs::read(path).map_err(|source| ControlError::LogRead {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((name, tail(&text, tail_chars).to_string()))
}

/// Last `n` characters of `s` (characters, not bytes).
pub fn tail(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
