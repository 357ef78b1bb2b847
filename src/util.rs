use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Filename-safe UTC timestamp shared by logs, reports, and weekly artifacts.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub fn timestamp_now() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

/// Write `contents` to `path`, creating parent directories first.
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents.as_bytes()).with_context(|| format!("write {}", path.display()))
}

pub fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_string_respects_char_boundaries() {
        assert_eq!(truncate_string("produit", 64), "produit");
        assert_eq!(truncate_string("supprimé", 8), "supprim");
        assert_eq!(truncate_string("abc", 0), "");
    }

    #[test]
    fn display_path_strips_base_when_possible() {
        let base = Path::new("/repo");
        assert_eq!(
            display_path(Path::new("/repo/reports/vv1.2.json"), Some(base)),
            "reports/vv1.2.json"
        );
        assert_eq!(display_path(Path::new("/elsewhere/x"), Some(base)), "/elsewhere/x");
    }

    #[test]
    fn round_secs_keeps_two_decimals() {
        assert_eq!(round_secs(1.23456), 1.23);
        assert_eq!(round_secs(300.0), 300.0);
    }
}
