//! Check results and their terminal output.

use owo_colors::OwoColorize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::log;
use crate::utils::plural_count;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "Warning",
            Self::Error => "Error",
        })
    }
}

/// One validator message, positioned in its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}: {}", self.line, self.column, self.severity, self.message)
    }
}

/// Off-site link that did not answer with success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalFailure {
    pub url: String,
    pub reason: String,
    pub referrers: Vec<String>,
}

/// Everything a crawl found.
///
/// Broken links and validation errors fail a check. Orphans, validation
/// warnings and external failures are only reported.
#[derive(Debug, Default)]
pub struct CheckReport {
    /// URIs requested from the output.
    pub visited: usize,
    /// Referring URI -> problems with its links.
    pub broken: BTreeMap<String, Vec<String>>,
    /// Output file -> validator messages that are not ignored.
    pub diagnostics: BTreeMap<PathBuf, Vec<Diagnostic>>,
    /// Output files never reached, relative to the output directory.
    pub orphans: Vec<PathBuf>,
    pub externals_checked: usize,
    pub external: Vec<ExternalFailure>,
}

impl CheckReport {
    pub fn add_broken(&mut self, referrer: &str, problem: String) {
        self.broken.entry(referrer.to_string()).or_default().push(problem);
    }

    pub fn broken_count(&self) -> usize {
        self.broken.values().map(Vec::len).sum()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .values()
            .flatten()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn is_ok(&self) -> bool {
        self.broken.is_empty() && self.count(Severity::Error) == 0
    }

    /// Print the findings, then a one-line summary.
    pub fn print(&self) {
        for (referrer, problems) in &self.broken {
            log!("error"; "broken links on {}", referrer);
            for problem in problems {
                eprintln!("  {problem}");
            }
        }

        for (file, diagnostics) in &self.diagnostics {
            for d in diagnostics {
                let line = format!("{}:{d}", file.display());
                match d.severity {
                    Severity::Error => eprintln!("{}", line.red()),
                    Severity::Warning => eprintln!("{}", line.yellow()),
                }
            }
        }

        if !self.orphans.is_empty() {
            log!("warning"; "{} never linked:", plural_count(self.orphans.len(), "file"));
            for orphan in &self.orphans {
                eprintln!("  {}", orphan.display());
            }
        }

        for failure in &self.external {
            log!("warning"; "{}: {}", failure.url, failure.reason);
            for referrer in &failure.referrers {
                eprintln!("  linked from {referrer}");
            }
        }

        log!("check"; "{}", self.summary());
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![
            plural_count(self.visited, "URI"),
            plural_count(self.broken_count(), "broken link"),
            plural_count(self.count(Severity::Error), "error"),
            plural_count(self.count(Severity::Warning), "warning"),
            plural_count(self.orphans.len(), "orphan"),
        ];
        if self.externals_checked > 0 {
            parts.push(format!(
                "{} of {} failed",
                self.external.len(),
                plural_count(self.externals_checked, "external link")
            ));
        }
        parts.join(", ")
    }
}
