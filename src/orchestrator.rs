//! Drives input paths through one uploader, strictly in input order

use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::humanize::ByteSize;
use crate::observability::RunStats;
use crate::task::{Task, TaskFailure, TaskOutcome, TaskStatus, is_remote_reference};
use crate::uploader::Uploader;

/// An input that cannot be uploaded at all; checked before the first upload
#[derive(Debug, Error)]
pub enum InputError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("file is empty: {}", .0.display())]
    Empty(PathBuf),

    #[error("file {} is {size} bytes, over the {limit} limit", path.display())]
    TooLarge {
        path: PathBuf,
        size: u64,
        limit: ByteSize,
    },

    #[error("failed to inspect {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Check every local input exists, is non-empty and fits under `limit`
///
/// Remote references are skipped; a zero limit disables the size check.
pub async fn validate_inputs(inputs: &[String], limit: ByteSize) -> Result<(), InputError> {
    for input in inputs {
        if is_remote_reference(input) {
            continue;
        }

        let path = PathBuf::from(input);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(InputError::NotFound(path));
            }
            Err(source) => return Err(InputError::Io { path, source }),
        };

        if !metadata.is_file() {
            return Err(InputError::NotAFile(path));
        }
        if metadata.len() == 0 {
            return Err(InputError::Empty(path));
        }
        if !limit.allows(metadata.len()) {
            return Err(InputError::TooLarge {
                path,
                size: metadata.len(),
                limit,
            });
        }
    }

    Ok(())
}

/// Upload every input sequentially and report one outcome per input
///
/// Remote references are passed through without calling the uploader. A failed
/// task never stops the batch. The uploader's callback, if any, sees each
/// outcome as soon as its task is terminal.
pub async fn upload_all(
    uploader: &dyn Uploader,
    inputs: &[String],
    target_dir: Option<&str>,
    stats: &RunStats,
) -> Vec<TaskOutcome> {
    let mut outcomes = Vec::with_capacity(inputs.len());

    for (id, input) in inputs.iter().enumerate() {
        let mut task = Task::new(id, input.as_str(), target_dir);

        let outcome = if is_remote_reference(input) {
            debug!(task_id = id, url = %input, "Input is already remote, skipping upload");
            task.mark_ignored();
            stats.task_ignored();
            Ok(task)
        } else {
            match uploader.upload(&mut task).await {
                Ok(()) => {
                    if task.status != TaskStatus::Finished {
                        let raw_url = std::mem::take(&mut task.raw_url);
                        let url = std::mem::take(&mut task.url);
                        task.mark_finished(raw_url, url);
                    }
                    stats.task_finished();
                    Ok(task)
                }
                Err(error) => {
                    warn!(task_id = id, path = %input, error = %error, "Upload failed");
                    task.mark_failed();
                    stats.task_failed();
                    Err(TaskFailure { task, error })
                }
            }
        };

        if let Some(callback) = uploader.callback() {
            callback(&outcome);
        }
        outcomes.push(outcome);
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, UploadError};
    use crate::uploader::TaskCallback;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Fails any path containing "bad", succeeds otherwise
    #[derive(Default)]
    struct MockUploader {
        calls: Mutex<Vec<String>>,
        callback: Option<TaskCallback>,
    }

    #[async_trait]
    impl Uploader for MockUploader {
        async fn upload(&self, task: &mut Task) -> Result<()> {
            self.calls.lock().unwrap().push(task.local_path.clone());
            if task.local_path.contains("bad") {
                return Err(UploadError::Status {
                    status: 500,
                    body: "nope".to_string(),
                });
            }
            task.target_path = task.file_name();
            task.raw_url = format!("https://mock/{}", task.target_path);
            task.url = task.raw_url.clone();
            Ok(())
        }

        fn set_callback(&mut self, callback: TaskCallback) {
            self.callback = Some(callback);
        }

        fn callback(&self) -> Option<&TaskCallback> {
            self.callback.as_ref()
        }
    }

    fn inputs(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[tokio::test]
    async fn test_outcomes_in_input_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut uploader = MockUploader::default();
        uploader.set_callback(Box::new(move |outcome: &TaskOutcome| {
            let entry = match outcome {
                Ok(task) => (task.id, task.status),
                Err(failure) => (failure.task.id, failure.task.status),
            };
            sink.lock().unwrap().push(entry);
        }));

        let stats = RunStats::new();
        let outcomes = upload_all(
            &uploader,
            &inputs(&["/tmp/a.png", "/tmp/bad.png", "https://x/c.png", "/tmp/d.png"]),
            None,
            &stats,
        )
        .await;

        assert_eq!(outcomes.len(), 4);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (0, TaskStatus::Finished),
                (1, TaskStatus::Failed),
                (2, TaskStatus::Finished),
                (3, TaskStatus::Finished),
            ]
        );

        let first = outcomes[0].as_ref().unwrap();
        assert_eq!(first.raw_url, "https://mock/a.png");

        let failure = outcomes[1].as_ref().unwrap_err();
        assert!(failure.task.raw_url.is_empty());
        assert!(failure.error.to_string().contains("nope"));

        let snapshot = stats.snapshot();
        assert_eq!((snapshot.finished, snapshot.failed, snapshot.ignored), (3, 1, 1));
    }

    #[tokio::test]
    async fn test_remote_inputs_never_reach_uploader() {
        let uploader = MockUploader::default();
        let outcomes = upload_all(
            &uploader,
            &inputs(&["https://x/1.png"]),
            None,
            &RunStats::new(),
        )
        .await;

        assert!(uploader.calls.lock().unwrap().is_empty());
        let task = outcomes[0].as_ref().unwrap();
        assert!(task.ignored);
        assert_eq!(task.raw_url, "https://x/1.png");
        assert_eq!(task.url, task.local_path);
    }

    #[tokio::test]
    async fn test_uploader_success_is_marked_finished() {
        let uploader = MockUploader::default();
        let outcomes = upload_all(&uploader, &inputs(&["/tmp/a.png"]), None, &RunStats::new()).await;

        let task = outcomes[0].as_ref().unwrap();
        assert_eq!(task.status, TaskStatus::Finished);
        assert!(task.finish_time.is_some());
        assert_eq!(task.url, "https://mock/a.png");
    }

    #[tokio::test]
    async fn test_validate_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.png");
        let empty = temp_dir.path().join("empty.png");
        fs::write(&good, vec![0u8; 2048]).unwrap();
        fs::write(&empty, b"").unwrap();

        let path = |p: &std::path::Path| p.to_string_lossy().into_owned();

        assert!(
            validate_inputs(&[path(&good), "https://x/1.png".to_string()], ByteSize(4096))
                .await
                .is_ok()
        );
        assert!(validate_inputs(&[path(&good)], ByteSize(0)).await.is_ok());

        assert!(matches!(
            validate_inputs(&[path(&good)], ByteSize(1024)).await,
            Err(InputError::TooLarge { size: 2048, .. })
        ));
        assert!(matches!(
            validate_inputs(&[path(&empty)], ByteSize(0)).await,
            Err(InputError::Empty(_))
        ));
        assert!(matches!(
            validate_inputs(&[path(&temp_dir.path().join("missing.png"))], ByteSize(0)).await,
            Err(InputError::NotFound(_))
        ));
        assert!(matches!(
            validate_inputs(&[path(temp_dir.path())], ByteSize(0)).await,
            Err(InputError::NotAFile(_))
        ));
    }
}
