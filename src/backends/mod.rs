//! Built-in uploaders with hand-written protocols

pub mod github;
pub mod s3;

pub use github::{GithubSettings, GithubUploader};
pub use s3::{S3Settings, S3Uploader};
