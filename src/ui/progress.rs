//! Console progress reporter
//!
//! Renders dispatcher events as one line per event:
//!
//! ```text
//! ◯ Stopping web-1 (proj-a/us-central1-a)
//! ✓ Stopped web-1 (820ms)
//! ✗ Failed web-2 (proj-a/us-central1-b) - permission denied: ...
//! ```

use crate::operation::{BatchItem, BatchReport, OperationResult, ProgressSink, ResourceAction};
use clap::ValueEnum;
use crossterm::style::Stylize;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How much the reporter prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DetailLevel {
    /// Completion lines only
    Minimal,
    /// Begin and completion lines with timings
    #[default]
    Detailed,
    /// Also failure kinds and resource locations
    Verbose,
}

impl DetailLevel {
    /// Parse a config value, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Detailed => "detailed",
            Self::Verbose => "verbose",
        }
    }
}

/// [`ProgressSink`] that writes to a terminal or any writer
pub struct ConsoleProgress<W: Write> {
    out: Mutex<W>,
    action: ResourceAction,
    detail: DetailLevel,
    color: bool,
    started: Mutex<HashMap<Uuid, Instant>>,
}

impl ConsoleProgress<std::io::Stdout> {
    pub fn stdout(action: ResourceAction, detail: DetailLevel, color: bool) -> Self {
        Self::new(std::io::stdout(), action, detail, color)
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W, action: ResourceAction, detail: DetailLevel, color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            action,
            detail,
            color,
            started: Mutex::new(HashMap::new()),
        }
    }

    /// Print the closing summary line
    pub fn summary(&self, report: &BatchReport) {
        let mut line = format!(
            "{} {}: {} succeeded, {} failed",
            self.action.display_name(),
            plural(report.total(), "resource"),
            report.succeeded(),
            report.failed()
        );
        if self.detail != DetailLevel::Minimal {
            let elapsed = report.duration().to_std().unwrap_or_default();
            line.push_str(&format!(" in {}", format_elapsed(elapsed)));
        }

        let line = match (self.color, report.failed()) {
            (false, _) => line,
            (true, 0) => line.green().bold().to_string(),
            (true, _) => line.yellow().bold().to_string(),
        };
        self.write_line(&line);
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }

    fn elapsed(&self, item: &BatchItem) -> Option<Duration> {
        let started = self.started.lock().ok()?.remove(&item.id)?;
        Some(started.elapsed())
    }

    fn success_line(&self, item: &BatchItem, message: &str, elapsed: Option<Duration>) -> String {
        let mut line = format!("✓ {}", message);
        if self.detail != DetailLevel::Minimal {
            if let Some(elapsed) = elapsed {
                line.push_str(&format!(" ({})", format_elapsed(elapsed)));
            }
        }
        if self.detail == DetailLevel::Verbose {
            line.push_str(&format!(" [{}]", item.label));
        }
        if self.color {
            line.green().to_string()
        } else {
            line
        }
    }

    fn failure_line(&self, item: &BatchItem, result: &OperationResult) -> String {
        let line = match (self.detail, result.failure_kind()) {
            (DetailLevel::Verbose, Some(kind)) => {
                format!("✗ Failed {} - [{}] {}", item.label, kind, result.message())
            },
            _ => format!("✗ Failed {} - {}", item.label, result.message()),
        };
        if self.color {
            line.red().to_string()
        } else {
            line
        }
    }
}

impl<W: Write> ProgressSink for ConsoleProgress<W> {
    fn begin(&self, item: &BatchItem) {
        if let Ok(mut started) = self.started.lock() {
            started.insert(item.id, Instant::now());
        }
        if self.detail == DetailLevel::Minimal {
            return;
        }

        let line = format!("◯ {} {}", self.action.present_participle(), item.label);
        let line = if self.color {
            line.dark_grey().to_string()
        } else {
            line
        };
        self.write_line(&line);
    }

    fn complete(&self, item: &BatchItem, result: &OperationResult) {
        let elapsed = self.elapsed(item);
        let line = match result {
            OperationResult::Success { message } => self.success_line(item, message, elapsed),
            OperationResult::Failure { .. } => self.failure_line(item, result),
        };
        self.write_line(&line);
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// `820ms`, `2.3s`, `1m05s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else {
        let secs = elapsed.as_secs();
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{BatchOutcome, FailureKind};
    use crate::resource::{Location, ResourceRef};

    fn output(progress: ConsoleProgress<Vec<u8>>) -> String {
        String::from_utf8(progress.into_inner()).unwrap()
    }

    fn item() -> BatchItem {
        BatchItem::new(0, "web-1 (proj-a/us-central1-a)".to_string())
    }

    #[test]
    fn test_detailed_lines() {
        let progress =
            ConsoleProgress::new(Vec::new(), ResourceAction::Stop, DetailLevel::Detailed, false);
        let item = item();
        progress.begin(&item);
        progress.complete(&item, &OperationResult::success("Stopped web-1"));

        let out = output(progress);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "◯ Stopping web-1 (proj-a/us-central1-a)");
        assert!(lines[1].starts_with("✓ Stopped web-1 ("));
        assert!(lines[1].ends_with("ms)"));
    }

    #[test]
    fn test_minimal_skips_begin_lines() {
        let progress =
            ConsoleProgress::new(Vec::new(), ResourceAction::Start, DetailLevel::Minimal, false);
        let item = item();
        progress.begin(&item);
        progress.complete(&item, &OperationResult::success("Started web-1"));

        assert_eq!(output(progress), "✓ Started web-1\n");
    }

    #[test]
    fn test_failure_line_verbose_includes_kind() {
        let progress =
            ConsoleProgress::new(Vec::new(), ResourceAction::Delete, DetailLevel::Verbose, false);
        progress.complete(
            &item(),
            &OperationResult::failure(FailureKind::NotFound, "resource not found"),
        );

        assert_eq!(
            output(progress),
            "✗ Failed web-1 (proj-a/us-central1-a) - [not-found] resource not found\n"
        );
    }

    #[test]
    fn test_summary_counts() {
        let progress =
            ConsoleProgress::new(Vec::new(), ResourceAction::Restart, DetailLevel::Minimal, false);
        let now = chrono::Utc::now();
        let vm = ResourceRef::new("compute-instances", "proj-a", "web-1", Location::Global);
        let report = BatchReport {
            outcomes: vec![
                BatchOutcome {
                    resource: vm.clone(),
                    result: OperationResult::success("Restarted web-1"),
                },
                BatchOutcome {
                    resource: vm,
                    result: OperationResult::failure(FailureKind::Provider, "boom"),
                },
            ],
            started_at: now,
            finished_at: now,
        };
        progress.summary(&report);

        assert_eq!(output(progress), "Restart 2 resources: 1 succeeded, 1 failed\n");
    }

    #[test]
    fn test_detail_level_parse() {
        assert_eq!(DetailLevel::parse("VERBOSE"), Some(DetailLevel::Verbose));
        assert_eq!(DetailLevel::parse("loud"), None);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(820)), "820ms");
        assert_eq!(format_elapsed(Duration::from_millis(2300)), "2.3s");
        assert_eq!(format_elapsed(Duration::from_secs(65)), "1m05s");
    }
}
