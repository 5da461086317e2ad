//! Decide which changed files go to the model.
//!
//! A file is reviewed when its extension is in the configured target list
//! (or the list is empty), it does not match a skip pattern, and it is not
//! a lock file.

use std::fmt;

use sieve_core::ReviewConfig;

/// Why a file was left out of the review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Extension not in `review.target_extensions`.
    Extension,
    /// Matched a `review.skip_patterns` glob.
    Pattern(String),
    /// Dependency lock file.
    LockFile,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Extension => write!(f, "extension not reviewed"),
            SkipReason::Pattern(p) => write!(f, "matches skip pattern {p}"),
            SkipReason::LockFile => write!(f, "lock file"),
        }
    }
}

/// Path-based file filter built from [`ReviewConfig`].
///
/// # Examples
///
/// ```
/// use sieve_core::ReviewConfig;
/// use sieve_difflens::filter::PathFilter;
///
/// let config = ReviewConfig {
///     target_extensions: vec!["py".into()],
///     skip_patterns: vec!["migrations/**".into()],
///     ..ReviewConfig::default()
/// };
/// let filter = PathFilter::from_config(&config);
/// assert!(filter.check("app/views.py").is_none());
/// assert!(filter.check("app/views.js").is_some());
/// assert!(filter.check("migrations/0001_initial.py").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    target_extensions: Vec<String>,
    skip_patterns: Vec<glob::Pattern>,
}

impl PathFilter {
    /// Build a filter from review configuration.
    ///
    /// Invalid glob patterns are logged and ignored.
    pub fn from_config(config: &ReviewConfig) -> Self {
        let skip_patterns = config
            .skip_patterns
            .iter()
            .filter_map(|pat| match glob::Pattern::new(pat) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(pattern = %pat, error = %e, "ignoring invalid skip pattern");
                    None
                }
            })
            .collect();
        let target_extensions = config
            .target_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self {
            target_extensions,
            skip_patterns,
        }
    }

    /// Return the reason `path` should be skipped, or `None` to review it.
    pub fn check(&self, path: &str) -> Option<SkipReason> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        if is_lock_file(file_name) {
            return Some(SkipReason::LockFile);
        }
        if let Some(pat) = self.skip_patterns.iter().find(|p| p.matches(path)) {
            return Some(SkipReason::Pattern(pat.to_string()));
        }
        if !self.target_extensions.is_empty() {
            let ext = file_name
                .rsplit_once('.')
                .filter(|(stem, _)| !stem.is_empty())
                .map(|(_, ext)| ext.to_ascii_lowercase());
            match ext {
                Some(ext) if self.target_extensions.contains(&ext) => {}
                _ => return Some(SkipReason::Extension),
            }
        }
        None
    }

    /// Convenience wrapper around [`PathFilter::check`].
    pub fn should_review(&self, path: &str) -> bool {
        self.check(path).is_none()
    }
}

fn is_lock_file(name: &str) -> bool {
    matches!(
        name,
        "package-lock.json"
            | "yarn.lock"
            | "pnpm-lock.yaml"
            | "Cargo.lock"
            | "Gemfile.lock"
            | "poetry.lock"
            | "composer.lock"
            | "go.sum"
            | "uv.lock"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(exts: &[&str], patterns: &[&str]) -> PathFilter {
        PathFilter::from_config(&ReviewConfig {
            target_extensions: exts.iter().map(|s| s.to_string()).collect(),
            skip_patterns: patterns.iter().map(|s| s.to_string()).collect(),
            ..ReviewConfig::default()
        })
    }

    #[test]
    fn empty_target_list_reviews_everything() {
        let f = filter(&[], &[]);
        assert!(f.should_review("src/main.rs"));
        assert!(f.should_review("Makefile"));
    }

    #[test]
    fn extension_match_is_case_insensitive_and_dot_tolerant() {
        let f = filter(&[".PY", "ts"], &[]);
        assert!(f.should_review("a/b/Script.Py"));
        assert!(f.should_review("web/app.ts"));
        assert_eq!(f.check("web/app.tsx"), Some(SkipReason::Extension));
        assert_eq!(f.check("Dockerfile"), Some(SkipReason::Extension));
        assert_eq!(f.check(".py"), Some(SkipReason::Extension));
    }

    #[test]
    fn lock_files_are_always_skipped() {
        let f = filter(&[], &[]);
        assert_eq!(f.check("Cargo.lock"), Some(SkipReason::LockFile));
        assert_eq!(f.check("web/package-lock.json"), Some(SkipReason::LockFile));
    }

    #[test]
    fn skip_patterns_apply_before_extensions() {
        let f = filter(&["rs"], &["generated/**", "*.pb.rs"]);
        assert_eq!(
            f.check("generated/api.rs"),
            Some(SkipReason::Pattern("generated/**".into()))
        );
        assert!(matches!(f.check("proto/x.pb.rs"), Some(SkipReason::Pattern(_))));
        assert!(f.should_review("src/lib.rs"));
    }

    #[test]
    fn invalid_pattern_is_ignored() {
        let f = filter(&[], &["[unclosed"]);
        assert!(f.should_review("src/lib.rs"));
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::LockFile.to_string(), "lock file");
        assert_eq!(
            SkipReason::Pattern("a/**".into()).to_string(),
            "matches skip pattern a/**"
        );
    }
}
