//! Uploader selection: built-in backends by id, otherwise installed adapter definitions

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::adapter::{AdapterDefinition, SimpleHttpUploader};
use crate::backends::{GithubSettings, GithubUploader, S3Settings, S3Uploader};
use crate::config::Config;
use crate::http::{HttpClient, HttpError};
use crate::options::RunOptions;
use crate::uploader::Uploader;

pub const GITHUB: &str = "github";
pub const S3: &str = "s3";

const DEFINITION_EXTENSIONS: [&str; 2] = ["json", "jsonc"];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no uploader selected; pass --uploader or set default_uploader")]
    NoUploader,

    #[error("unknown uploader: {0}")]
    NotFound(String),

    #[error("invalid settings for uploader '{id}': {source}")]
    Settings {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to set up uploader '{id}': {source}")]
    Setup {
        id: String,
        #[source]
        source: crate::error::UploadError,
    },

    #[error("failed to read extensions directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Installed adapter definitions keyed by `meta.id`
#[derive(Debug, Clone, Default)]
pub struct ExtensionCatalog {
    definitions: BTreeMap<String, AdapterDefinition>,
    /// File each definition was loaded from; absent for in-memory registrations
    sources: BTreeMap<String, PathBuf>,
}

impl ExtensionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations replace earlier ones with the same id; the replaced one is returned
    pub fn register(&mut self, definition: AdapterDefinition) -> Option<AdapterDefinition> {
        self.insert(definition, None)
    }

    fn insert(&mut self, definition: AdapterDefinition, source: Option<&Path>) -> Option<AdapterDefinition> {
        let id = definition.id().to_string();
        let previous_source = match source {
            Some(path) => self.sources.insert(id.clone(), path.to_path_buf()),
            None => self.sources.remove(&id),
        };

        let replaced = self.definitions.insert(id.clone(), definition);
        if replaced.is_some() {
            let describe = |path: Option<&Path>| {
                path.map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<in-memory>".to_string())
            };
            warn!(
                id = %id,
                replaced = %describe(previous_source.as_deref()),
                by = %describe(source),
                "Duplicate adapter id, later definition wins"
            );
        }
        replaced
    }

    /// Load every `*.json` / `*.jsonc` definition in `dir`
    ///
    /// A missing directory yields an empty catalog. Files that fail to parse or
    /// are not `simple-http-uploader` definitions are skipped with a warning.
    pub fn load_dir(dir: &Path) -> Result<Self, RegistryError> {
        let mut catalog = Self::new();

        if !dir.is_dir() {
            debug!("Extensions directory {} not found", dir.display());
            return Ok(catalog);
        }

        let entries = std::fs::read_dir(dir).map_err(|source| RegistryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| DEFINITION_EXTENSIONS.contains(&ext))
            })
            .collect();
        paths.sort();

        for path in paths {
            match AdapterDefinition::from_file(&path) {
                Ok(definition) => {
                    debug!(id = definition.id(), path = %path.display(), "Loaded adapter definition");
                    catalog.insert(definition, Some(&path));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping adapter definition"),
            }
        }

        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&AdapterDefinition> {
        self.definitions.get(id)
    }

    /// File the definition registered under `id` came from
    pub fn source(&self, id: &str) -> Option<&Path> {
        self.sources.get(id).map(PathBuf::as_path)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// `--uploader` wins over `default_uploader`
pub fn uploader_id(options: &RunOptions, config: &Config) -> Result<String, RegistryError> {
    options
        .uploader
        .as_deref()
        .or(config.default_uploader.as_deref())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(RegistryError::NoUploader)
}

/// Construct the uploader registered under `id`
pub fn select_uploader(
    id: &str,
    config: Arc<Config>,
    options: Arc<RunOptions>,
    http: HttpClient,
    catalog: &ExtensionCatalog,
) -> Result<Box<dyn Uploader>, RegistryError> {
    let settings_error = |source| RegistryError::Settings {
        id: id.to_string(),
        source,
    };

    match id {
        GITHUB => {
            let settings = GithubSettings::from_adapter_config(&config.adapter_config(GITHUB))
                .map_err(settings_error)?;
            Ok(Box::new(GithubUploader::new(settings, config, http)))
        }
        S3 => {
            let settings = S3Settings::from_adapter_config(&config.adapter_config(S3))
                .map_err(settings_error)?;
            let uploader =
                S3Uploader::from_settings(&settings, config).map_err(|source| RegistryError::Setup {
                    id: id.to_string(),
                    source,
                })?;
            Ok(Box::new(uploader))
        }
        _ => {
            let definition = catalog
                .get(id)
                .cloned()
                .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

            let uploader = SimpleHttpUploader::builder()
                .definition(definition)
                .ext_config(config.adapter_config(id))
                .config(config)
                .options(options)
                .http(http)
                .build();
            Ok(Box::new(uploader))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpSettings;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn definition_source(id: &str, kind: &str) -> String {
        json!({
            "meta": {"id": id, "type": kind},
            "http": {"request": {"method": "POST", "url": "https://h/upload"}},
            "upload": {"rawUrl": {"from": "text_response"}}
        })
        .to_string()
    }

    fn http() -> HttpClient {
        HttpClient::new(&HttpSettings::default()).unwrap()
    }

    #[test]
    fn test_load_dir_filters_definitions() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("imgbed.json"), definition_source("imgbed", "simple-http-uploader")).unwrap();
        fs::write(
            dir.join("other.jsonc"),
            format!("// comment\n{}", definition_source("other", "simple-http-uploader")),
        )
        .unwrap();
        fs::write(dir.join("foreign.json"), definition_source("foreign", "something-else")).unwrap();
        fs::write(dir.join("broken.json"), "{ nope").unwrap();
        fs::write(dir.join("notes.txt"), definition_source("txt", "simple-http-uploader")).unwrap();

        let catalog = ExtensionCatalog::load_dir(dir).unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["imgbed", "other"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_duplicate_id_later_file_wins() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("a.json"), definition_source("dup", "simple-http-uploader")).unwrap();
        fs::write(dir.join("b.jsonc"), definition_source("dup", "simple-http-uploader")).unwrap();

        let mut catalog = ExtensionCatalog::load_dir(dir).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.source("dup"), Some(dir.join("b.jsonc").as_path()));

        let replaced = catalog
            .register(AdapterDefinition::parse(&definition_source("dup", "simple-http-uploader")).unwrap());
        assert_eq!(replaced.map(|d| d.id().to_string()).as_deref(), Some("dup"));
        assert!(catalog.source("dup").is_none());
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = ExtensionCatalog::load_dir(&temp_dir.path().join("nope")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_uploader_id_precedence() {
        let config = Config {
            default_uploader: Some("github".to_string()),
            ..Default::default()
        };
        let mut options = RunOptions::default();
        assert_eq!(uploader_id(&options, &config).unwrap(), "github");

        options.uploader = Some("imgbed".to_string());
        assert_eq!(uploader_id(&options, &config).unwrap(), "imgbed");

        assert!(matches!(
            uploader_id(&RunOptions::default(), &Config::default()),
            Err(RegistryError::NoUploader)
        ));
    }

    #[test]
    fn test_select_builtin_and_extension() {
        let mut config = Config::default();
        config.uploaders.insert(
            "github".to_string(),
            [("username", "octo"), ("repo", "pics"), ("pat", "ghp_x")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), json!(v)))
                .collect(),
        );
        let config = Arc::new(config);
        let options = Arc::new(RunOptions::default());

        let mut catalog = ExtensionCatalog::new();
        catalog.register(AdapterDefinition::parse(&definition_source("imgbed", "simple-http-uploader")).unwrap());

        assert!(select_uploader("github", config.clone(), options.clone(), http(), &catalog).is_ok());
        assert!(select_uploader("imgbed", config.clone(), options.clone(), http(), &catalog).is_ok());
        assert!(matches!(
            select_uploader("qcloud", config.clone(), options.clone(), http(), &catalog),
            Err(RegistryError::NotFound(id)) if id == "qcloud"
        ));
        assert!(matches!(
            select_uploader("s3", config, options, http(), &catalog),
            Err(RegistryError::Settings { .. })
        ));
    }
}
