//! Ant-style path patterns.
//!
//! Supports:
//! - `*` - matches any characters within one path segment
//! - `**` - matches any number of segments (including zero)
//! - `?` - matches a single character
//!
//! Patterns compile to anchored regexes once, at table construction.

use regex::Regex;

/// Errors from compiling a path pattern.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// The pattern does not compile.
    #[error("Invalid path pattern '{pattern}': {message}")]
    Invalid {
        /// The offending pattern.
        pattern: String,
        /// Description of the failure.
        message: String,
    },
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    regex: Regex,
}

impl PathPattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    /// Returns an error if the translated regex does not compile.
    pub fn new(pattern: impl Into<String>) -> Result<Self, PatternError> {
        let raw = pattern.into();
        let translated = translate(&raw);
        let regex = Regex::new(&translated).map_err(|e| PatternError::Invalid {
            pattern: raw.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { raw, regex })
    }

    /// Returns `true` if the pattern matches the (already normalized,
    /// query-free) request path.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Returns the pattern source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Translates a glob pattern into an anchored regex.
///
/// `/**/` and a trailing `/**` match zero or more whole segments, so
/// `/api/**` covers `/api` itself and `/api/**/admin/**` covers
/// `/api/admin`, the ant-matcher semantics the patterns are written in.
fn translate(pattern: &str) -> String {
    // Placeholders keep the later `*` replacement from touching the
    // multi-segment constructs. Order matters: `/**/` before `/**`
    // before bare `**`.
    let mut p = pattern.replace("/**/", "/\u{1}");
    if let Some(stripped) = p.strip_suffix("/**") {
        p = format!("{stripped}\u{2}");
    }
    let p = p
        .replace("**", "\u{0}")
        .replace('.', "\\.")
        .replace('*', "[^/]*")
        .replace('?', "[^/]")
        .replace('\u{0}', ".*")
        .replace('\u{1}', "(?:.*/)?")
        .replace('\u{2}', "(?:/.*)?");
    format!("^{p}$")
}
