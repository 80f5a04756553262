//! Completion sink used by the binary: prints one line per task

use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::options::RunOptions;
use crate::task::{Task, TaskOutcome};
use crate::template::replace_brace_tokens;
use crate::uploader::TaskCallback;

/// Formats available without configuration
pub const BUILTIN_FORMATS: [(&str, &str); 2] = [("url", "{url}"), ("markdown", "![{fname}]({url})")];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("unknown output format '{0}'")]
    UnknownFormat(String),
}

#[derive(Debug, Clone)]
pub struct OutputSink {
    template: String,
    raw: bool,
    clean: bool,
}

impl OutputSink {
    /// Configured `output_formats` shadow the built-ins of the same name
    pub fn new(options: &RunOptions, config: &Config) -> Result<Self, OutputError> {
        let name = options.output_format.as_str();
        let template = config
            .output_formats
            .get(name)
            .cloned()
            .or_else(|| {
                BUILTIN_FORMATS
                    .iter()
                    .find(|(builtin, _)| *builtin == name)
                    .map(|(_, template)| template.to_string())
            })
            .ok_or_else(|| OutputError::UnknownFormat(name.to_string()))?;

        Ok(Self {
            template,
            raw: options.raw,
            clean: options.clean,
        })
    }

    /// `{url}` is the raw URL under `--raw`; `{rawurl}`, `{fname}`, `{fullname}` and `{target}` are also known
    pub fn render(&self, task: &Task) -> String {
        let url = if self.raw { &task.raw_url } else { &task.url };
        let full_name = task.file_name();
        let stem = Path::new(&full_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        replace_brace_tokens(&self.template, |token| match token {
            "url" => Some(url.clone()),
            "rawurl" => Some(task.raw_url.clone()),
            "fname" | "filename" => Some(stem.clone()),
            "fullname" => Some(full_name.clone()),
            "target" => Some(task.target_path.clone()),
            _ => None,
        })
    }

    pub fn handle(&self, outcome: &TaskOutcome) {
        match outcome {
            Ok(task) => {
                if self.clean && !task.ignored {
                    match std::fs::remove_file(&task.local_path) {
                        Ok(()) => debug!(path = %task.local_path, "Removed local file"),
                        Err(e) => warn!(path = %task.local_path, error = %e, "Failed to remove local file"),
                    }
                }
                println!("{}", self.render(task));
            }
            Err(failure) => eprintln!("Failed: {}", failure.error),
        }
    }

    pub fn into_callback(self) -> TaskCallback {
        Box::new(move |outcome| self.handle(outcome))
    }
}
