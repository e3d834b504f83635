//! Environment naming, env-file reading, and env-file rendering.

use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Maps a flag name to its environment variable name.
///
/// `redis-uri` → `REDIS_URI`, `http.port` → `HTTP_PORT`.
pub fn env_key(flag_name: &str) -> String {
    flag_name
        .chars()
        .map(|c| match c {
            '-' | '.' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Where environment values are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The real process environment.
    #[default]
    Process,
    /// A fixed map, used to keep tests hermetic.
    Map(HashMap<String, String>),
}

impl EnvSource {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EnvSource::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn var(&self, key: &str) -> Option<String> {
        match self {
            EnvSource::Process => std::env::var(key).ok(),
            EnvSource::Map(map) => map.get(key).cloned(),
        }
    }
}

/// Parses `KEY=VALUE` lines. Blank lines and `#` comments are skipped, an
/// `export ` prefix is accepted, and matching outer quotes are removed.
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            tracing::debug!(line = %line, "Skipping env file line without '='");
            continue;
        };
        vars.insert(key.trim().to_string(), unquote(value.trim()));
    }
    vars
}

/// Reads an env file; a missing file yields an empty map.
pub fn load_env_file(path: &Path) -> io::Result<HashMap<String, String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let vars = parse_env_file(&content);
            tracing::debug!(path = ?path, count = vars.len(), "Env file loaded");
            Ok(vars)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(e),
    }
}

/// Quotes a value for an env file when it would not survive unquoted.
///
/// Inside double quotes `\\`, `"`, newline and carriage return are escaped, so
/// multi-line values (PEM keys) stay on one line.
pub fn quote_value(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\'));
    if !needs_quotes {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 {
        if let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
            return unescape(inner);
        }
        if let Some(inner) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
            return inner.to_string();
        }
    }
    // Unquoted values may carry a trailing comment.
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end().to_string(),
        None => value.to_string(),
    }
}

/// Reverses the escapes written by [`quote_value`]; unknown escapes are kept verbatim.
fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
