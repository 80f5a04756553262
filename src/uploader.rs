//! The contract shared by every upload backend

use async_trait::async_trait;
use chrono::Local;

use crate::error::Result;
use crate::task::{Task, TaskOutcome};
use crate::template::rename;

/// Completion hook, called once per task after it reaches a terminal state
pub type TaskCallback = Box<dyn Fn(&TaskOutcome) + Send + Sync>;

/// An upload backend
///
/// Implementations own the whole life of a task between dispatch and return:
/// they pick the target path, transfer the file and, on success, leave the
/// task `Finished` with both URLs set. On error the caller marks the task
/// failed.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, task: &mut Task) -> Result<()>;

    fn set_callback(&mut self, callback: TaskCallback);

    fn callback(&self) -> Option<&TaskCallback>;
}

/// `target_dir/<file name>` when a directory was given, else the rename template at local time
pub fn assign_target_path(task: &mut Task, rename_template: &str) {
    let file_name = task.file_name();
    task.target_path = match &task.target_dir {
        Some(dir) => format!("{dir}/{file_name}"),
        None => rename(rename_template.trim_matches('/'), &file_name, &Local::now()),
    };
}
