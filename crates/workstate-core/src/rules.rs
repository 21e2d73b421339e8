//! Ignore rules for snapshot selection.
//!
//! Rules come from the `.workstateignore` file at the project root and use
//! gitignore syntax:
//! - `*` and `**` globs
//! - a leading `/` anchors the rule to the project root
//! - a trailing `/` restricts the rule to directories
//! - `!` re-includes a path excluded by an earlier rule
//!
//! Later rules take precedence over earlier ones. A rule that matches a
//! directory excludes everything below it.

use crate::error::{Error, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the ignore file at the project root.
pub const IGNORE_FILE: &str = ".workstateignore";

/// A rule that could not be compiled and was left out of the rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRule {
    /// 1-based line number in the ignore file
    pub line: usize,

    /// The rule text as written
    pub rule: String,

    /// Why the rule was rejected
    pub message: String,
}

/// Compiled ignore rules for one selection pass.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    matcher: Gitignore,
    source: Option<PathBuf>,
    rejected: Vec<RejectedRule>,
}

impl IgnoreRules {
    /// Rule set that excludes nothing (no ignore file present).
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
            source: None,
            rejected: Vec::new(),
        }
    }

    /// Loads `.workstateignore` from the project root.
    ///
    /// A missing file yields [`IgnoreRules::empty`]; callers should warn that
    /// no filter is applied. Malformed rules are skipped and reported through
    /// [`IgnoreRules::rejected`].
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(IGNORE_FILE);

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {} at {}", IGNORE_FILE, root.display());
                return Ok(Self::empty());
            }
            Err(e) => return Err(Error::filesystem(&path, e)),
        };

        let mut rules = Self::parse(root, &text)?;
        rules.source = Some(path);
        Ok(rules)
    }

    /// Compiles rule text, skipping malformed rules with a warning.
    pub fn parse(root: &Path, text: &str) -> Result<Self> {
        Self::compile(root, text, false)
    }

    /// Compiles rule text, failing on the first malformed rule.
    pub fn parse_strict(root: &Path, text: &str) -> Result<Self> {
        Self::compile(root, text, true)
    }

    fn compile(root: &Path, text: &str, strict: bool) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);
        let mut rejected = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            if let Err(e) = builder.add_line(None, line) {
                let rule = RejectedRule {
                    line: idx + 1,
                    rule: line.to_string(),
                    message: e.to_string(),
                };

                if strict {
                    return Err(Error::PatternSyntax {
                        line: rule.line,
                        rule: rule.rule,
                        message: rule.message,
                    });
                }

                warn!(
                    "Skipping invalid ignore rule on line {}: {} ({})",
                    rule.line, rule.rule, rule.message
                );
                rejected.push(rule);
            }
        }

        let matcher = builder.build().map_err(|e| Error::PatternSyntax {
            line: 0,
            rule: String::new(),
            message: e.to_string(),
        })?;

        debug!(
            "Compiled {} ignore rules ({} negated)",
            matcher.num_ignores(),
            matcher.num_whitelists()
        );

        Ok(Self {
            matcher,
            source: None,
            rejected,
        })
    }

    /// Returns true if the root-relative path is excluded.
    ///
    /// A path is also excluded when any of its parent directories is.
    pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }

    /// Whether the rules were read from an ignore file.
    pub fn has_ignore_file(&self) -> bool {
        self.source.is_some()
    }

    /// Path of the ignore file the rules were read from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of compiled rules, including negations.
    pub fn len(&self) -> u64 {
        self.matcher.num_ignores() + self.matcher.num_whitelists()
    }

    /// Whether the rule set excludes nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rules skipped because they failed to compile.
    pub fn rejected(&self) -> &[RejectedRule] {
        &self.rejected
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::empty()
    }
}
