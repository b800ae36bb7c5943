//! Concurrent traversal of the paths given on the command line

use std::any::Any;
use std::fs::{self, File};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use crossbeam::channel::{self, Sender};
use rayon::Scope;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::config::{Config, NamingConfig};
use crate::error::{ErrorContext, Result, SmallifyError};
use crate::parallel::{RunReport, SkipReason, TaskFailure, TaskOutcome, WorkerPool};
use crate::processing::ImageProcessor;

/// One path waiting to be visited
#[derive(Debug, Clone)]
pub struct PathTask {
    pub path: PathBuf,
    /// `None` writes next to the source
    pub target_dir: Option<PathBuf>,
    /// 0 for command line arguments, 1 for entries of an argument directory
    pub depth: u32,
}

impl PathTask {
    pub fn top_level<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            target_dir: None,
            depth: 0,
        }
    }

    fn child(&self, path: PathBuf, target_dir: PathBuf) -> Self {
        Self {
            path,
            target_dir: Some(target_dir),
            depth: self.depth + 1,
        }
    }
}

/// Walks command line paths on a bounded pool, resizing files and fanning
/// out over the direct entries of directories.
pub struct Walker {
    pool: WorkerPool,
    processor: ImageProcessor,
    naming: NamingConfig,
}

impl Walker {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            pool: WorkerPool::new(config.processing.workers)?,
            processor: ImageProcessor::new(config),
            naming: config.naming.clone(),
        })
    }

    /// Process every path and wait for all work they schedule. Failures are
    /// collected in the report; they never stop other paths.
    pub fn run<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> RunReport {
        let start_time = Instant::now();
        let (sender, receiver) = channel::unbounded();

        info!("Starting run over {} path(s)", paths.len());

        self.pool.scope(|scope| {
            for path in paths {
                let task = PathTask::top_level(path.as_ref());
                let sender = sender.clone();
                scope.spawn(move |scope| self.smallify(scope, task, &sender));
            }
        });

        // Every task has finished; this was the last sender
        drop(sender);

        let report = RunReport::from_outcomes(receiver, start_time.elapsed());
        info!(
            "Run completed in {:.2}s: {} resized, {} failed",
            report.elapsed.as_secs_f64(),
            report.resized.len(),
            report.failures.len()
        );
        report
    }

    /// Task boundary: errors and panics stop here
    fn smallify<'s>(&'s self, scope: &Scope<'s>, task: PathTask, outcomes: &Sender<TaskOutcome>) {
        let visited = catch_panic(&task.path, || self.visit(scope, &task, outcomes));
        let outcome = match visited {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Failed to process {}: {}", task.path.display(), e);
                TaskOutcome::Failed(TaskFailure::new(task.path, &e))
            }
        };
        report(outcomes, outcome);
    }

    fn visit<'s>(
        &'s self,
        scope: &Scope<'s>,
        task: &PathTask,
        outcomes: &Sender<TaskOutcome>,
    ) -> Result<TaskOutcome> {
        let path = resolve_path(&task.path)?;
        let metadata = fs::metadata(&path).with_path(&path)?;

        let target_dir = match &task.target_dir {
            Some(dir) => dir.clone(),
            None => path.parent().map_or_else(|| path.clone(), Path::to_path_buf),
        };

        if !metadata.is_dir() {
            let file = File::open(&path).with_path(&path)?;
            let processed = self.processor.process_file(file, &path, &target_dir)?;
            return Ok(TaskOutcome::Resized(processed));
        }

        if task.depth > 0 {
            debug!("Not descending into nested directory {:?}", path);
            return Ok(TaskOutcome::Skipped {
                path,
                reason: SkipReason::NestedDirectory,
            });
        }

        let name = path.file_name().ok_or_else(|| {
            SmallifyError::io(
                &path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "directory has no name"),
            )
        })?;
        let output_dir = target_dir.join(self.naming.directory_name(name));

        // An unreadable directory fails before its output directory exists
        let entries = WalkDir::new(&path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        create_output_dir(&output_dir, &metadata)?;

        let mut scheduled = 0;
        for entry in entries {
            if entry.file_type().is_dir() {
                debug!("Not descending into nested directory {:?}", entry.path());
                report(
                    outcomes,
                    TaskOutcome::Skipped {
                        path: entry.into_path(),
                        reason: SkipReason::NestedDirectory,
                    },
                );
                continue;
            }

            let child = task.child(entry.into_path(), output_dir.clone());
            let sender = outcomes.clone();
            scope.spawn(move |scope| self.smallify(scope, child, &sender));
            scheduled += 1;
        }

        debug!("Scheduled {} entries of {:?} into {:?}", scheduled, path, output_dir);

        Ok(TaskOutcome::DirectoryScheduled {
            source: path,
            output: output_dir,
            scheduled,
        })
    }
}

fn report(outcomes: &Sender<TaskOutcome>, outcome: TaskOutcome) {
    // The receiver outlives the scope every sender lives in
    if let Err(e) = outcomes.send(outcome) {
        error!("Dropped task outcome: {:?}", e.into_inner());
    }
}

/// Run `f`, turning a panic into a failure for `path`
fn catch_panic<T, F>(path: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(SmallifyError::Panicked {
            path: path.to_path_buf(),
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Make `path` absolute and fold `.` and `..` lexically. Symlinks are not
/// resolved, so names stay as the user typed them.
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).with_path(path)?;

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }

    Ok(cleaned)
}

/// Create the output directory, copying the source directory's permission
/// bits. An existing directory is reused.
#[cfg_attr(not(unix), allow(unused_variables))]
fn create_output_dir(dir: &Path, source: &fs::Metadata) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
        builder.mode(source.permissions().mode() & 0o7777);
    }

    builder.create(dir).with_path(dir)
}
