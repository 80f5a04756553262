//! Run options as given on the command line

use serde::Serialize;
use std::path::PathBuf;

use crate::humanize::ByteSize;

pub const DEFAULT_OUTPUT_FORMAT: &str = "url";

/// Options for one invocation
///
/// Readable from adapter definitions through the `option` placeholder scope.
#[derive(Debug, Clone, Serialize)]
pub struct RunOptions {
    pub local_paths: Vec<String>,
    pub target_dir: Option<String>,
    pub verbose: bool,
    /// Overrides `max_upload_size`; zero disables the check
    pub size_limit: Option<ByteSize>,
    pub config_file: Option<PathBuf>,
    pub clean: bool,
    pub raw: bool,
    pub uploader: Option<String>,
    pub output_format: String,
    pub extensions_dir: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            local_paths: Vec::new(),
            target_dir: None,
            verbose: false,
            size_limit: None,
            config_file: None,
            clean: false,
            raw: false,
            uploader: None,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            extensions_dir: None,
        }
    }
}

impl RunOptions {
    /// Field lookup by serialized name, used by the `option` placeholder scope
    pub fn lookup(&self, key: &str) -> Option<String> {
        let value = match key {
            "target_dir" => self.target_dir.clone().unwrap_or_default(),
            "verbose" => self.verbose.to_string(),
            "size_limit" => self
                .size_limit
                .map(|size| size.as_u64().to_string())
                .unwrap_or_default(),
            "config_file" => path_string(self.config_file.as_ref()),
            "clean" => self.clean.to_string(),
            "raw" => self.raw.to_string(),
            "uploader" => self.uploader.clone().unwrap_or_default(),
            "output_format" => self.output_format.clone(),
            "extensions_dir" => path_string(self.extensions_dir.as_ref()),
            _ => return None,
        };
        Some(value)
    }
}

fn path_string(path: Option<&PathBuf>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}
