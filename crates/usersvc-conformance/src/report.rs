//! Per-case outcomes and the run summary.

use std::fmt;
use std::time::Duration;

use crate::error::ConformanceError;

#[derive(Debug)]
pub enum Outcome {
    Passed,
    Failed(ConformanceError),
    /// Not run; carries the reason.
    Skipped(String),
}

#[derive(Debug)]
pub struct CaseResult {
    pub name: &'static str,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Passed)
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    pub fn skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped(_))
    }

    pub fn error(&self) -> Option<&ConformanceError> {
        match &self.outcome {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Report {
    base_url: String,
    cases: Vec<CaseResult>,
}

impl Report {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cases: Vec::new(),
        }
    }

    pub fn record(&mut self, name: &'static str, outcome: Outcome, elapsed: Duration) {
        match &outcome {
            Outcome::Passed => tracing::debug!(case = name, ?elapsed, "passed"),
            Outcome::Failed(e) => tracing::warn!(case = name, kind = e.kind(), error = %e, "failed"),
            Outcome::Skipped(reason) => tracing::debug!(case = name, %reason, "skipped"),
        }
        self.cases.push(CaseResult {
            name,
            outcome,
            elapsed,
        });
    }

    pub fn skip(&mut self, name: &'static str, reason: impl Into<String>) {
        self.record(name, Outcome::Skipped(reason.into()), Duration::ZERO);
    }

    pub fn cases(&self) -> &[CaseResult] {
        &self.cases
    }

    pub fn case(&self, name: &str) -> Option<&CaseResult> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|c| c.failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.cases.iter().filter(|c| c.skipped()).count()
    }

    /// A run with no failures succeeds. Skips only occur on request or behind a failure.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && !self.cases.is_empty()
    }

    /// Process exit code: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "conformance run against {}", self.base_url)?;
        for c in &self.cases {
            let ms = c.elapsed.as_millis();
            match &c.outcome {
                Outcome::Passed => writeln!(f, "  PASS  {:<26} {ms:>6} ms", c.name)?,
                Outcome::Failed(e) => {
                    writeln!(f, "  FAIL  {:<26} {ms:>6} ms  [{}] {e}", c.name, e.kind())?
                }
                Outcome::Skipped(reason) => writeln!(f, "  SKIP  {:<26} {:>9}  {reason}", c.name, "")?,
            }
        }
        write!(
            f,
            "{} cases: {} passed, {} failed, {} skipped",
            self.cases.len(),
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}
