use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Settings for one uploader id, taken from `[uploaders.<id>]`
pub type AdapterConfig = BTreeMap<String, Value>;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Uploader used when `--uploader` is not given
    #[serde(default)]
    pub default_uploader: Option<String>,
    /// Target path template used when no target directory is given
    #[serde(default = "default_rename")]
    pub rename: String,
    /// Literal substring rewrites applied to every raw URL
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,
    /// Extra output formats, name -> template
    #[serde(default)]
    pub output_formats: BTreeMap<String, String>,
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: ByteSize,
    /// Directory holding adapter definitions
    #[serde(default)]
    pub extensions_dir: Option<PathBuf>,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub uploaders: HashMap<String, AdapterConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_uploader: None,
            rename: default_rename(),
            replacements: BTreeMap::new(),
            output_formats: BTreeMap::new(),
            max_upload_size: default_max_upload_size(),
            extensions_dir: None,
            http: HttpSettings::default(),
            uploaders: HashMap::new(),
        }
    }
}

fn default_rename() -> String {
    "{year}/{month}/{fname}-{unixtsms}{ext}".to_string()
}

fn default_max_upload_size() -> ByteSize {
    ByteSize(5 * 1024 * 1024) // 5 MB
}

/// HTTP client settings shared by every uploader
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpSettings {
    pub proxy: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            proxy: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("hoist/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Field lookup by serialized name, used by the `config` placeholder scope
    ///
    /// Map-valued sections (`replacements`, `uploaders`, ...) are not addressable.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let value = match key {
            "default_uploader" => self.default_uploader.clone().unwrap_or_default(),
            "rename" => self.rename.clone(),
            "max_upload_size" => self.max_upload_size.as_u64().to_string(),
            "extensions_dir" => self
                .extensions_dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }

    /// Adapter configuration for an uploader id, empty when none is configured
    pub fn adapter_config(&self, id: &str) -> AdapterConfig {
        self.uploaders.get(id).cloned().unwrap_or_default()
    }
}

/// Lookup in an adapter configuration map; scalars are stringified
pub fn adapter_value(config: &AdapterConfig, key: &str) -> Option<String> {
    match config.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
