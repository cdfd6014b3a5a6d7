//! Result formatting

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::runner::PhaseResult;

/// Formats phase results, one line per phase.
///
/// Formatting only: the reporter has no influence on benchmark correctness
/// and produces no return value beyond IO success.
pub struct Reporter<W: Write> {
    out: W,
}

impl Reporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn report(&mut self, results: &[PhaseResult]) -> io::Result<()> {
        for result in results {
            if result.failures > 0 {
                writeln!(
                    self.out,
                    "{} ({:.1}sec): {} ({} failed)",
                    result.name,
                    result.elapsed.as_secs_f64(),
                    result.delta,
                    result.failures
                )?;
            } else {
                writeln!(
                    self.out,
                    "{} ({:.1}sec): {}",
                    result.name,
                    result.elapsed.as_secs_f64(),
                    result.delta
                )?;
            }
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Write the results as pretty-printed JSON to a file.
pub fn write_json_report(path: &Path, results: &[PhaseResult]) -> Result<()> {
    let report = serde_json::to_string_pretty(results)?;
    fs::write(path, report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn report_writes_one_line_per_phase() {
        let results = vec![
            PhaseResult {
                name: "fetch".to_string(),
                elapsed: Duration::from_millis(30_100),
                delta: 42,
                failures: 0,
            },
            PhaseResult {
                name: "put and push".to_string(),
                elapsed: Duration::from_millis(30_000),
                delta: 17,
                failures: 2,
            },
        ];

        let mut reporter = Reporter::new(Vec::new());
        reporter.report(&results).unwrap();
        let output = String::from_utf8(reporter.into_inner()).unwrap();

        assert_eq!(
            output,
            "fetch (30.1sec): 42\nput and push (30.0sec): 17 (2 failed)\n"
        );
    }

    #[test]
    fn report_surfaces_negative_deltas() {
        let results = vec![PhaseResult {
            name: "fetch".to_string(),
            elapsed: Duration::from_secs(30),
            delta: -3,
            failures: 0,
        }];

        let mut reporter = Reporter::new(Vec::new());
        reporter.report(&results).unwrap();
        let output = String::from_utf8(reporter.into_inner()).unwrap();

        assert_eq!(output, "fetch (30.0sec): -3\n");
    }
}
