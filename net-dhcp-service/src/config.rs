//! Environment file loading
//!
//! `KEY=VALUE` lines from `$NET_DHCP_ENV_FILE`, `/etc/net-dhcp/environment`
//! or `./.env` are applied before the CLI is parsed, so every `NET_DHCP_*`
//! flag can also come from there. Nothing is logged here: tracing is not up
//! yet, so the outcome is handed back to `main`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Checked in order after `$NET_DHCP_ENV_FILE`
pub const ENV_FILE_PATHS: &[&str] = &["/etc/net-dhcp/environment", ".env"];

/// Outcome of applying one environment file
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadedEnv {
    pub path: PathBuf,
    /// Variables newly set
    pub applied: usize,
    /// Keys left alone because the process already had them
    pub skipped: Vec<String>,
}

/// Apply the first environment file that exists. Variables already present
/// in the process environment win over the file.
pub fn load_environment() -> Result<Option<LoadedEnv>> {
    let custom = std::env::var_os("NET_DHCP_ENV_FILE").map(PathBuf::from);
    let candidates = custom
        .into_iter()
        .chain(ENV_FILE_PATHS.iter().map(PathBuf::from));

    for path in candidates {
        if path.exists() {
            return apply_env_file(&path).map(Some);
        }
    }
    Ok(None)
}

fn apply_env_file(path: &Path) -> Result<LoadedEnv> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read environment file {}", path.display()))?;

    let mut loaded = LoadedEnv {
        path: path.to_path_buf(),
        ..Default::default()
    };
    for (key, value) in content.lines().filter_map(parse_env_line) {
        if std::env::var_os(&key).is_some() {
            loaded.skipped.push(key);
        } else {
            std::env::set_var(&key, value);
            loaded.applied += 1;
        }
    }
    Ok(loaded)
}

/// `KEY=VALUE`, with optional matching single or double quotes around the
/// value. Blank lines and `#` comments yield nothing.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let value = value.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q))
        .unwrap_or(value);

    Some((key.to_string(), unquoted.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_env_line() {
        assert_eq!(
            parse_env_line("NET_DHCP_BIND_SOCK=/run/x.sock"),
            Some(("NET_DHCP_BIND_SOCK".into(), "/run/x.sock".into()))
        );
        assert_eq!(
            parse_env_line("  FOO = \"bar baz\" "),
            Some(("FOO".into(), "bar baz".into()))
        );
        assert_eq!(parse_env_line("FOO='bar'"), Some(("FOO".into(), "bar".into())));
        assert_eq!(parse_env_line("FOO=\"open"), Some(("FOO".into(), "\"open".into())));
    }

    #[test]
    fn test_parse_env_line_ignored() {
        assert!(parse_env_line("").is_none());
        assert!(parse_env_line("# NET_DHCP_LOG_LEVEL=debug").is_none());
        assert!(parse_env_line("=value").is_none());
        assert!(parse_env_line("NO_EQUALS").is_none());
    }

    #[test]
    fn test_env_file_does_not_override() {
        std::env::set_var("NET_DHCP_TEST_PRESET", "kept");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "NET_DHCP_TEST_PRESET=replaced").unwrap();
        writeln!(file, "NET_DHCP_TEST_FRESH=\"loaded\"").unwrap();

        let loaded = apply_env_file(file.path()).unwrap();
        assert_eq!(loaded.path, file.path());
        assert_eq!(loaded.applied, 1);
        assert_eq!(loaded.skipped, vec!["NET_DHCP_TEST_PRESET".to_string()]);
        assert_eq!(std::env::var("NET_DHCP_TEST_PRESET").unwrap(), "kept");
        assert_eq!(std::env::var("NET_DHCP_TEST_FRESH").unwrap(), "loaded");
    }

    #[test]
    fn test_unreadable_env_file_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        // A directory exists but cannot be read as a file
        let err = apply_env_file(dir.path()).unwrap_err();
        assert!(err.to_string().contains("failed to read environment file"));
    }
}
