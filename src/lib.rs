pub mod adapter;
pub mod backends;
pub mod config;
pub mod error;
pub mod http;
pub mod humanize;
pub mod observability;
pub mod options;
pub mod orchestrator;
pub mod output;
pub mod registry;
pub mod task;
pub mod template;
pub mod uploader;

pub use error::UploadError;
pub use task::{Task, TaskOutcome, TaskStatus};
pub use uploader::{TaskCallback, Uploader};
