//! Upload to an S3-compatible object store

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::{ObjectStore, PutPayload, path::Path as StoragePath};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::config::{AdapterConfig, Config};
use crate::error::{Result, UploadError};
use crate::task::Task;
use crate::template::UrlRewriter;
use crate::uploader::{TaskCallback, Uploader, assign_target_path};

const DEFAULT_REGION: &str = "us-east-1";

/// `[uploaders.s3]`
#[derive(Debug, Clone, Deserialize)]
pub struct S3Settings {
    pub bucket_name: String,
    /// Host without scheme, e.g. `s3.example.com`
    pub endpoint: String,
    #[serde(default = "default_region")]
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl S3Settings {
    pub fn from_adapter_config(config: &AdapterConfig) -> std::result::Result<Self, serde_json::Error> {
        let map = config.clone().into_iter().collect();
        serde_json::from_value(serde_json::Value::Object(map))
    }

    /// `https://{bucket}.{host}`; any scheme on the endpoint is dropped
    pub fn public_base(&self) -> String {
        let host = self
            .endpoint
            .split_once("://")
            .map_or(self.endpoint.as_str(), |(_, host)| host);
        format!("https://{}.{}", self.bucket_name, host.trim_end_matches('/'))
    }

    /// Path-style S3 client for these settings
    pub fn build_store(&self) -> std::result::Result<Arc<dyn ObjectStore>, object_store::Error> {
        let endpoint = if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("https://{}", self.endpoint)
        };

        let store = AmazonS3Builder::new()
            .with_bucket_name(&self.bucket_name)
            .with_endpoint(endpoint)
            .with_region(&self.region)
            .with_access_key_id(&self.access_key)
            .with_secret_access_key(&self.secret_key)
            .with_virtual_hosted_style_request(false)
            .build()?;

        Ok(Arc::new(store))
    }
}

pub struct S3Uploader {
    store: Arc<dyn ObjectStore>,
    public_base: String,
    config: Arc<Config>,
    callback: Option<TaskCallback>,
}

impl S3Uploader {
    /// Works with any `ObjectStore`; URLs are `{public_base}/{target_path}`
    pub fn new(store: Arc<dyn ObjectStore>, public_base: impl Into<String>, config: Arc<Config>) -> Self {
        Self {
            store,
            public_base: public_base.into().trim_end_matches('/').to_string(),
            config,
            callback: None,
        }
    }

    pub fn from_settings(settings: &S3Settings, config: Arc<Config>) -> Result<Self> {
        let store = settings.build_store()?;
        Ok(Self::new(store, settings.public_base(), config))
    }
}

#[async_trait]
impl Uploader for S3Uploader {
    async fn upload(&self, task: &mut Task) -> Result<()> {
        assign_target_path(task, &self.config.rename);

        let content = tokio::fs::read(&task.local_path)
            .await
            .map_err(|source| UploadError::io(&task.local_path, source))?;
        let size = content.len();

        let location = StoragePath::from(task.target_path.as_str());
        self.store
            .put(&location, PutPayload::from(content))
            .await?;

        info!(task_id = task.id, key = %location, size, "Uploaded to object store");

        let raw_url = format!("{}/{}", self.public_base, task.target_path);
        let url = UrlRewriter::new(&self.config.replacements).replace_url(&raw_url);
        task.mark_finished(raw_url, url);
        Ok(())
    }

    fn set_callback(&mut self, callback: TaskCallback) {
        self.callback = Some(callback);
    }

    fn callback(&self) -> Option<&TaskCallback> {
        self.callback.as_ref()
    }
}
