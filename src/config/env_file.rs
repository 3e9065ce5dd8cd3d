// file: src/config/env_file.rs
// version: 1.0.0
// guid: 0c928681-85cf-467c-8715-b06e624d48e7

//! `KEY=value` configuration file read by the deployed application

use crate::error::{DeployError, Result};
use std::fmt;
use std::path::Path;

/// A `KEY=value` line; `prefix` is everything before the key (indentation,
/// an optional `export `)
struct Entry<'a> {
    prefix: &'a str,
    key: &'a str,
    value: &'a str,
}

/// Parse one line body (terminator already removed)
fn parse_entry(body: &str) -> Option<Entry<'_>> {
    let rest = body.trim_start();
    let rest = rest.strip_prefix("export ").map(str::trim_start).unwrap_or(rest);
    let key_start = body.len() - rest.len();
    let (key, value) = rest.split_once('=')?;
    let key = key.trim_end();

    let mut chars = key.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(Entry {
        prefix: &body[..key_start],
        key,
        value,
    })
}

/// Split a raw line into its body and its terminator (`\n`, `\r\n` or nothing)
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Line-preserving view of an env file
///
/// Lines are kept with their original terminators, so the written file
/// differs from the template only in the keys that were changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvFile {
    lines: Vec<String>,
}

impl EnvFile {
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::parse(&content))
    }

    /// Write the file, creating it with the given permission bits
    pub fn save<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()> {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let path = path.as_ref();
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(path)?;
        file.write_all(self.to_string().as_bytes())?;
        // mode() only applies on creation
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    /// Value of the first entry for `key`, with surrounding quotes removed
    pub fn get(&self, key: &str) -> Option<String> {
        self.lines.iter().find_map(|line| {
            let (body, _) = split_terminator(line);
            match parse_entry(body) {
                Some(entry) if entry.key == key => Some(unquote(entry.value.trim()).to_string()),
                _ => None,
            }
        })
    }

    /// Replace the value on the first `key=` line, or append one if the key is absent
    ///
    /// The line keeps its prefix and terminator; an appended line uses the
    /// file's dominant line ending.
    pub fn set(&mut self, key: &str, value: &str) {
        for line in self.lines.iter_mut() {
            let (body, ending) = split_terminator(line);
            if let Some(entry) = parse_entry(body).filter(|e| e.key == key) {
                *line = format!("{}{}={}{}", entry.prefix, key, value, ending);
                return;
            }
        }

        let ending = self.line_ending();
        if let Some(last) = self.lines.last_mut() {
            if split_terminator(last).1.is_empty() {
                last.push_str(ending);
            }
        }
        self.lines.push(format!("{}={}{}", key, value, ending));
    }

    /// Keys in file order
    pub fn keys(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|line| parse_entry(split_terminator(line).0).map(|e| e.key.to_string()))
            .collect()
    }

    fn line_ending(&self) -> &'static str {
        let crlf = self.lines.iter().filter(|l| l.ends_with("\r\n")).count();
        let lf = self.lines.iter().filter(|l| l.ends_with('\n')).count() - crlf;
        if crlf > lf {
            "\r\n"
        } else {
            "\n"
        }
    }
}

impl fmt::Display for EnvFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(line)?;
        }
        Ok(())
    }
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && ((bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\''))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    const TEMPLATE: &str = "# SMS Gateway configuration\nENVIRONMENT=production\nAPI_KEY=your-secret-api-key-here\n\nPORT=8000\n";

    #[test]
    fn test_get_values() {
        let env = EnvFile::parse(TEMPLATE);
        assert_eq!(env.get("PORT").as_deref(), Some("8000"));
        assert_eq!(env.get("API_KEY").as_deref(), Some("your-secret-api-key-here"));
        assert_eq!(env.get("MISSING"), None);
        assert_eq!(env.keys(), vec!["ENVIRONMENT", "API_KEY", "PORT"]);
    }

    #[test]
    fn test_set_replaces_only_target_line() {
        let mut env = EnvFile::parse(TEMPLATE);
        env.set("API_KEY", "abc123");

        let expected = TEMPLATE.replace("your-secret-api-key-here", "abc123");
        assert_eq!(env.to_string(), expected);
    }

    #[test]
    fn test_set_appends_missing_key() {
        let mut env = EnvFile::parse("PORT=8000");
        env.set("API_KEY", "abc123");
        assert_eq!(env.to_string(), "PORT=8000\nAPI_KEY=abc123\n");
    }

    #[test]
    fn test_quoted_and_exported_values() {
        let env = EnvFile::parse("export HOST=\"0.0.0.0\"\nLOG_LEVEL='INFO'\n");
        assert_eq!(env.get("HOST").as_deref(), Some("0.0.0.0"));
        assert_eq!(env.get("LOG_LEVEL").as_deref(), Some("INFO"));
    }

    #[test]
    fn test_set_keeps_export_prefix_and_crlf() {
        let template = "# comment\r\nexport API_KEY=placeholder\r\n  PORT=8000\r\n";
        let mut env = EnvFile::parse(template);
        env.set("API_KEY", "abc123");

        assert_eq!(
            env.to_string(),
            "# comment\r\nexport API_KEY=abc123\r\n  PORT=8000\r\n"
        );
        assert_eq!(env.get("PORT").as_deref(), Some("8000"));
    }

    #[test]
    fn test_append_follows_crlf_file() {
        let mut env = EnvFile::parse("HOST=0.0.0.0\r\nPORT=8000");
        env.set("API_KEY", "abc123");
        assert_eq!(
            env.to_string(),
            "HOST=0.0.0.0\r\nPORT=8000\r\nAPI_KEY=abc123\r\n"
        );
    }

    #[test]
    fn test_unchanged_file_round_trips_exactly() {
        let content = "A=1\r\n\n# note\nB='two'";
        assert_eq!(EnvFile::parse(content).to_string(), content);
    }

    #[test]
    fn test_save_sets_permissions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");

        EnvFile::parse(TEMPLATE).save(&path, 0o600).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TEMPLATE);
    }
}
