use crate::ConfigError;
use regex::{Regex, RegexBuilder};

/// A compiled list of case-insensitive exclusion regexes
///
/// Patterns are searched (not anchored) against the full URL string, so
/// `admin` and `.*admin.*` behave the same.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compiles every pattern, failing on the first invalid one
    ///
    /// # Examples
    ///
    /// ```
    /// use link_sentry::url::PatternSet;
    ///
    /// let set = PatternSet::new(&[".*admin.*".to_string()]).unwrap();
    /// assert!(set.is_match("https://example.com/ADMIN/login"));
    /// assert!(!set.is_match("https://example.com/about"));
    /// ```
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", p.as_ref(), e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if any pattern matches somewhere in `url`
    pub fn is_match(&self, url: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(url))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
