//! Parallel traversal and outcome collection

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::{ErrorKind, SmallifyError};
use crate::processing::ProcessedImage;

pub mod scheduler;
pub mod walker;

pub use scheduler::*;
pub use walker::*;

/// What a single unit of work ended with
#[derive(Debug)]
pub enum TaskOutcome {
    Resized(ProcessedImage),
    DirectoryScheduled {
        source: PathBuf,
        output: PathBuf,
        scheduled: usize,
    },
    Skipped {
        path: PathBuf,
        reason: SkipReason,
    },
    Failed(TaskFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Directories are only expanded at the top level
    NestedDirectory,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskFailure {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

impl TaskFailure {
    pub fn new(path: PathBuf, error: &SmallifyError) -> Self {
        Self {
            path,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub scheduled: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Everything a run produced, gathered after all tasks joined
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub resized: Vec<ProcessedImage>,
    pub directories: Vec<DirectoryReport>,
    pub skipped: Vec<SkippedPath>,
    pub failures: Vec<TaskFailure>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Aggregate outcomes. Lists are sorted by path since completion order
    /// between siblings is arbitrary.
    pub fn from_outcomes<I>(outcomes: I, elapsed: Duration) -> Self
    where
        I: IntoIterator<Item = TaskOutcome>,
    {
        let mut report = Self {
            elapsed,
            ..Self::default()
        };

        for outcome in outcomes {
            match outcome {
                TaskOutcome::Resized(image) => report.resized.push(image),
                TaskOutcome::DirectoryScheduled {
                    source,
                    output,
                    scheduled,
                } => report.directories.push(DirectoryReport {
                    source,
                    output,
                    scheduled,
                }),
                TaskOutcome::Skipped { path, reason } => {
                    report.skipped.push(SkippedPath { path, reason });
                }
                TaskOutcome::Failed(failure) => report.failures.push(failure),
            }
        }

        report.resized.sort_by(|a, b| a.source.cmp(&b.source));
        report.directories.sort_by(|a, b| a.source.cmp(&b.source));
        report.skipped.sort_by(|a, b| a.path.cmp(&b.path));
        report.failures.sort_by(|a, b| a.path.cmp(&b.path));

        report
    }

    /// Whether any task failed; drives the process exit code
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{OutputCodec, ScaleTarget, SourceFormat};

    fn resized(source: &str) -> TaskOutcome {
        TaskOutcome::Resized(ProcessedImage {
            source: PathBuf::from(source),
            output: PathBuf::from(format!("{source}_small.png")),
            format: SourceFormat::Png,
            codec: OutputCodec::Png,
            original: ScaleTarget { width: 10, height: 10 },
            resized: ScaleTarget { width: 480, height: 480 },
        })
    }

    #[test]
    fn test_report_aggregation() {
        let outcomes = vec![
            resized("/b"),
            TaskOutcome::Failed(TaskFailure::new(
                PathBuf::from("/z.gif"),
                &SmallifyError::unsupported_format("gif", None),
            )),
            resized("/a"),
            TaskOutcome::Skipped {
                path: PathBuf::from("/d/sub"),
                reason: SkipReason::NestedDirectory,
            },
            TaskOutcome::DirectoryScheduled {
                source: PathBuf::from("/d"),
                output: PathBuf::from("/d_small"),
                scheduled: 2,
            },
        ];

        let report = RunReport::from_outcomes(outcomes, Duration::from_millis(5));

        assert!(report.has_failures());
        assert_eq!(report.resized.len(), 2);
        assert_eq!(report.resized[0].source, PathBuf::from("/a"));
        assert_eq!(report.directories[0].scheduled, 2);
        assert_eq!(report.skipped[0].reason, SkipReason::NestedDirectory);
        assert_eq!(report.failures[0].kind, ErrorKind::Unsupported);
    }

    #[test]
    fn test_empty_report_has_no_failures() {
        let report = RunReport::from_outcomes(Vec::new(), Duration::ZERO);
        assert!(!report.has_failures());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = RunReport::from_outcomes(vec![resized("/a")], Duration::from_secs(1));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["resized"][0]["codec"], "png");
        assert_eq!(json["resized"][0]["resized"]["width"], 480);
        assert!(json["failures"].as_array().unwrap().is_empty());
    }
}
