use std::collections::{HashMap, hash_map::Entry};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// File name looked up by [`find_env_file`].
pub const ENV_FILE_NAME: &str = ".env";

/// Key/value view the settings are read from.
///
/// Entries present at construction take precedence over anything merged in
/// later with [`EnvSource::with_env_file`], so process variables always win
/// over env-file lines. The process environment itself is never modified.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
    env_file: Option<PathBuf>,
}

impl EnvSource {
    /// Snapshot of the current process environment.
    pub fn process() -> Self {
        let vars = env::vars_os()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (Ok(key), Err(_)) => {
                    tracing::warn!(key = %key, "skipping non-unicode environment value");
                    None
                }
                _ => None,
            })
            .collect();

        Self {
            vars,
            env_file: None,
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            env_file: None,
        }
    }

    /// Merge `KEY=value` lines from `path` underneath the existing entries.
    ///
    /// Only `${NAME}` is expanded; a bare `$` is kept as written. Lines that
    /// fail to parse are skipped with a warning. Only a file that cannot be
    /// read at all is an error.
    pub fn with_env_file(mut self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let env_file_err = |source: dotenvy::Error| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        };

        let contents = fs::read_to_string(path)
            .map_err(|err| env_file_err(dotenvy::Error::Io(err)))?;
        let contents = escape_bare_dollars(&contents);

        let mut merged = 0usize;
        let mut skipped = 0usize;
        for item in dotenvy::from_read_iter(contents.as_bytes()) {
            match item {
                Ok((key, value)) => {
                    if let Entry::Vacant(slot) = self.vars.entry(key) {
                        slot.insert(value);
                        merged += 1;
                    }
                }
                Err(dotenvy::Error::LineParse(line, index)) => {
                    tracing::warn!(
                        path = %path.display(),
                        line = %line,
                        index,
                        "skipping unparsable env file line"
                    );
                    skipped += 1;
                }
                Err(err) => return Err(env_file_err(err)),
            }
        }

        tracing::debug!(path = %path.display(), merged, skipped, "env file loaded");
        self.env_file = Some(path.to_path_buf());
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }
}

/// Look for [`ENV_FILE_NAME`] in `start` and then each of its ancestors.
pub fn find_env_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(ENV_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
    Comment,
}

/// Escape every `$` that dotenvy would treat as a `$NAME` reference.
///
/// `${NAME}` is left alone, as is anything inside single quotes or comments.
fn escape_bare_dollars(contents: &str) -> String {
    let mut out = String::with_capacity(contents.len());
    let mut state = Quote::None;
    let mut escaped = false;
    let mut after_blank = true;
    let mut chars = contents.chars().peekable();

    while let Some(c) = chars.next() {
        if escaped {
            escaped = false;
        } else {
            match (state, c) {
                (Quote::Comment, '\n') => state = Quote::None,
                (Quote::Comment, _) => {}
                (Quote::Single, '\'') => state = Quote::None,
                (Quote::Single, _) => {}
                (Quote::Double, '"') => state = Quote::None,
                (Quote::None, '\'') => state = Quote::Single,
                (Quote::None, '"') => state = Quote::Double,
                (Quote::None, '#') if after_blank => state = Quote::Comment,
                (Quote::None | Quote::Double, '\\') => escaped = true,
                (Quote::None | Quote::Double, '$') if chars.peek() != Some(&'{') => {
                    out.push('\\')
                }
                _ => {}
            }
        }
        after_blank = c.is_whitespace();
        out.push(c);
    }

    out
}
