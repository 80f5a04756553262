//! Per-file unit of upload work and its outcome record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::UploadError;

/// Upload status of a [`Task`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Created,
    Finished,
    Failed,
    /// Reserved; nothing pauses a task today.
    Paused,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Created => "created",
            TaskStatus::Finished => "ok",
            TaskStatus::Failed => "failed",
            TaskStatus::Paused => "paused",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file's upload attempt
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Position in the input sequence
    pub id: usize,
    pub local_path: String,
    /// Caller-supplied directory; disables renaming when set
    pub target_dir: Option<String>,
    pub target_path: String,
    /// The input already was a remote URL and is passed through untouched
    pub ignored: bool,
    pub raw_url: String,
    pub url: String,
    pub status: TaskStatus,
    pub create_time: DateTime<Utc>,
    pub finish_time: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: usize, local_path: impl Into<String>, target_dir: Option<&str>) -> Self {
        let target_dir = target_dir
            .map(|dir| dir.trim_matches('/').to_string())
            .filter(|dir| !dir.is_empty());

        Self {
            id,
            local_path: local_path.into(),
            target_dir,
            target_path: String::new(),
            ignored: false,
            raw_url: String::new(),
            url: String::new(),
            status: TaskStatus::Created,
            create_time: Utc::now(),
            finish_time: None,
        }
    }

    /// File name of the local path, extension included
    pub fn file_name(&self) -> String {
        Path::new(&self.local_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.local_path.clone())
    }

    /// Pass a remote reference through without uploading it.
    pub fn mark_ignored(&mut self) {
        self.ignored = true;
        self.raw_url = self.local_path.clone();
        self.url = self.local_path.clone();
        self.status = TaskStatus::Finished;
        self.finish_time = Some(Utc::now());
    }

    pub fn mark_finished(&mut self, raw_url: String, url: String) {
        self.raw_url = raw_url;
        self.url = url;
        self.status = TaskStatus::Finished;
        self.finish_time = Some(Utc::now());
    }

    pub fn mark_failed(&mut self) {
        self.raw_url.clear();
        self.url.clear();
        self.status = TaskStatus::Failed;
        self.finish_time = Some(Utc::now());
    }

    /// Field lookup by serialized name, used by the `task` placeholder scope
    pub fn lookup(&self, key: &str) -> Option<String> {
        let value = match key {
            "id" => self.id.to_string(),
            "local_path" => self.local_path.clone(),
            "target_dir" => self.target_dir.clone().unwrap_or_default(),
            "target_path" => self.target_path.clone(),
            "ignored" => self.ignored.to_string(),
            "raw_url" => self.raw_url.clone(),
            "url" => self.url.clone(),
            "status" => self.status.to_string(),
            "create_time" => self.create_time.to_rfc3339(),
            "finish_time" => self
                .finish_time
                .map(|time| time.to_rfc3339())
                .unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }
}

/// A task that reached `Failed`, together with the reason
#[derive(Debug)]
pub struct TaskFailure {
    pub task: Task,
    pub error: UploadError,
}

/// What the completion callback receives for every task
pub type TaskOutcome = Result<Task, TaskFailure>;

/// Whether an input already names a remote resource
pub fn is_remote_reference(path: &str) -> bool {
    reqwest::Url::parse(path)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_starts_created() {
        let task = Task::new(3, "shots/a.png", Some("/img/2024/"));
        assert_eq!(task.id, 3);
        assert_eq!(task.status, TaskStatus::Created);
        assert_eq!(task.target_dir.as_deref(), Some("img/2024"));
        assert!(task.raw_url.is_empty());
        assert!(task.url.is_empty());
        assert!(task.finish_time.is_none());
    }

    #[test]
    fn test_blank_target_dir_is_none() {
        let task = Task::new(0, "a.png", Some("/"));
        assert!(task.target_dir.is_none());
    }

    #[test]
    fn test_mark_ignored_passes_path_through() {
        let mut task = Task::new(0, "https://example.com/a.png", None);
        task.mark_ignored();
        assert!(task.ignored);
        assert_eq!(task.status, TaskStatus::Finished);
        assert_eq!(task.raw_url, task.local_path);
        assert_eq!(task.url, task.local_path);
    }

    #[test]
    fn test_mark_failed_clears_urls() {
        let mut task = Task::new(0, "a.png", None);
        task.raw_url = "partial".to_string();
        task.mark_failed();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.status.is_terminal());
        assert!(task.raw_url.is_empty());
    }

    #[test]
    fn test_lookup_known_and_unknown_keys() {
        let mut task = Task::new(7, "/tmp/cat.jpg", None);
        task.target_path = "2024/cat.jpg".to_string();

        assert_eq!(task.lookup("target_path").as_deref(), Some("2024/cat.jpg"));
        assert_eq!(task.lookup("id").as_deref(), Some("7"));
        assert_eq!(task.lookup("target_dir").as_deref(), Some(""));
        assert_eq!(task.lookup("status").as_deref(), Some("created"));
        assert!(task.lookup("TargetPath").is_none());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(Task::new(0, "/tmp/dir/cat.jpg", None).file_name(), "cat.jpg");
    }

    #[test]
    fn test_is_remote_reference() {
        assert!(is_remote_reference("https://x/1.png"));
        assert!(is_remote_reference("http://x/1.png"));
        assert!(!is_remote_reference("./http-notes.png"));
        assert!(!is_remote_reference("C:\\pics\\a.png"));
        assert!(!is_remote_reference("/tmp/a.png"));
    }
}
