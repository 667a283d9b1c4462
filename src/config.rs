//! Configuration loading and on-disk paths.
//!
//! sdkbridge reads one optional settings file,
//! `~/.config/sdkbridge/settings.conf`, in a plain `key = value` format with
//! `#`, `//`, and `;` comments. The only recognized key is `sdk_root`. The
//! effective SDK root is resolved once per session from, in order: an
//! explicit value (CLI flag), the `ANDROID_HOME` environment variable, and
//! the settings file. When all are absent the runner falls back to a `PATH`
//! lookup.

use std::env;
use std::path::{Path, PathBuf};

/// What: Check if a settings line should be skipped (empty or comment).
///
/// Inputs:
/// - `line`: Line to check.
///
/// Output:
/// - `true` if the line should be skipped, `false` otherwise.
///
/// Details:
/// - Skips empty lines and lines starting with `#`, `//`, or `;`.
fn skip_comment_or_empty(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with(';')
}

/// What: Parse a `key = value` pair from a settings line.
///
/// Inputs:
/// - `line`: Line containing key=value format.
///
/// Output:
/// - `Some((key, value))` if parsing succeeds, `None` otherwise.
///
/// Details:
/// - Splits on the first `=` character and trims both sides.
fn parse_key_value(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if !trimmed.contains('=') {
        return None;
    }
    let mut parts = trimmed.splitn(2, '=');
    let key = parts.next()?.trim().to_string();
    let value = parts.next()?.trim().to_string();
    Some((key, value))
}

/// Return `$HOME/.config/sdkbridge`, ensuring it exists.
fn home_config_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        let dir = Path::new(&home).join(".config").join("sdkbridge");
        if std::fs::create_dir_all(&dir).is_ok() {
            return Some(dir);
        }
    }
    None
}

/// Config directory for sdkbridge (ensured to exist).
///
/// Prefers `$HOME/.config/sdkbridge`; falls back to `$XDG_CONFIG_HOME` or a
/// relative `.config` when HOME is unavailable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(dir) = home_config_dir() {
        return dir;
    }
    let base = env::var("XDG_CONFIG_HOME").map_or_else(|_| PathBuf::from(".config"), PathBuf::from);
    let dir = base.join("sdkbridge");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Logs directory under config (ensured to exist).
#[must_use]
pub fn logs_dir() -> PathBuf {
    let dir = config_dir().join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// What: Extract `sdk_root` from settings file content.
///
/// Inputs:
/// - `contents`: Raw text of a settings.conf file.
///
/// Output:
/// - The configured root path, or `None` when the key is missing or empty.
///
/// Details:
/// - Later occurrences override earlier ones; unknown keys are ignored.
#[must_use]
pub fn sdk_root_from_settings(contents: &str) -> Option<PathBuf> {
    let mut found = None;
    for line in contents.lines() {
        if skip_comment_or_empty(line) {
            continue;
        }
        if let Some((key, value)) = parse_key_value(line)
            && key.eq_ignore_ascii_case("sdk_root")
            && !value.is_empty()
        {
            found = Some(PathBuf::from(value));
        }
    }
    found
}

/// What: Resolve the effective SDK root for a session.
///
/// Inputs:
/// - `explicit`: Root passed on the command line, when any.
///
/// Output:
/// - The first configured root from: explicit flag, `ANDROID_HOME`, the
///   settings file; `None` when nothing is configured.
#[must_use]
pub fn resolve_sdk_root(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    if let Ok(env_root) = env::var("ANDROID_HOME")
        && !env_root.trim().is_empty()
    {
        return Some(PathBuf::from(env_root));
    }
    let settings = config_dir().join("settings.conf");
    std::fs::read_to_string(settings)
        .ok()
        .and_then(|contents| sdk_root_from_settings(&contents))
}
