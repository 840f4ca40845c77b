//! Parsing `/stack #N` directives out of PR descriptions

use regex::Regex;
use std::sync::LazyLock;

/// `/stack`, whitespace, `#`, digits
static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/stack\s+#([0-9]+)").expect("directive regex is valid"));

/// Extract the dependency PR number from a description.
///
/// Lines are scanned in order and the first trimmed line that matches wins;
/// later lines are ignored even if they also match. A number that is zero or
/// does not fit in a `u64` is not a match.
pub fn parse_directive(body: &str) -> Option<u64> {
    body.lines().find_map(|line| {
        let caps = DIRECTIVE_RE.captures(line.trim())?;
        caps[1].parse::<u64>().ok().filter(|n| *n > 0)
    })
}

/// A PR's parsed dependency declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive {
    /// Declared dependency, if any
    pub depends_on: Option<u64>,
}

impl Directive {
    /// Parse the directive of PR `own_number`.
    ///
    /// A PR cannot depend on itself, so a directive naming `own_number`
    /// counts as no directive.
    pub fn for_pull_request(body: &str, own_number: u64) -> Self {
        Self {
            depends_on: parse_directive(body).filter(|dep| *dep != own_number),
        }
    }
}
