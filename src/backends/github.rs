//! Upload through the GitHub contents API

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{AdapterConfig, Config};
use crate::error::{Result, UploadError};
use crate::http::{HttpClient, HttpExchange};
use crate::task::Task;
use crate::template::UrlRewriter;
use crate::uploader::{TaskCallback, Uploader, assign_target_path};

pub const GITHUB_API: &str = "https://api.github.com";
const RAW_CONTENT_HOST: &str = "https://raw.githubusercontent.com";
const DEFAULT_BRANCH: &str = "master";
/// Raw JSON body fragment GitHub sends when the path exists and no sha was given
const ALREADY_EXISTS: &str = r#"\"sha\" wasn't supplied"#;

/// `[uploaders.github]`
#[derive(Debug, Clone, Deserialize)]
pub struct GithubSettings {
    pub username: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Personal access token; `GITHUB_TOKEN` fills this in
    pub pat: String,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl GithubSettings {
    pub fn from_adapter_config(config: &AdapterConfig) -> std::result::Result<Self, serde_json::Error> {
        let map = config.clone().into_iter().collect();
        serde_json::from_value(serde_json::Value::Object(map))
    }

    pub fn raw_url(&self, target_path: &str) -> String {
        format!(
            "{RAW_CONTENT_HOST}/{}/{}/{}/{target_path}",
            self.username, self.repo, self.branch
        )
    }
}

pub struct GithubUploader {
    settings: GithubSettings,
    config: Arc<Config>,
    http: HttpClient,
    api_base: String,
    callback: Option<TaskCallback>,
}

impl GithubUploader {
    pub fn new(settings: GithubSettings, config: Arc<Config>, http: HttpClient) -> Self {
        Self {
            settings,
            config,
            http,
            api_base: GITHUB_API.to_string(),
            callback: None,
        }
    }

    /// Point at another API root, e.g. a GitHub Enterprise host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn contents_url(&self, target_path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{target_path}",
            self.api_base, self.settings.username, self.settings.repo
        )
    }

    async fn put_file(&self, task: &Task) -> Result<HttpExchange> {
        let content = tokio::fs::read(&task.local_path)
            .await
            .map_err(|source| UploadError::io(&task.local_path, source))?;

        let body = json!({
            "branch": self.settings.branch,
            "message": format!("upload {} via hoist", task.file_name()),
            "content": BASE64.encode(content),
        });

        let response = self
            .http
            .client()
            .put(self.contents_url(&task.target_path))
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(AUTHORIZATION, format!("token {}", self.settings.pat))
            .json(&body)
            .send()
            .await?;

        Ok(HttpExchange::read(response).await?)
    }
}

#[async_trait]
impl Uploader for GithubUploader {
    async fn upload(&self, task: &mut Task) -> Result<()> {
        assign_target_path(task, &self.config.rename);
        info!(
            task_id = task.id,
            path = %task.local_path,
            target = %task.target_path,
            repo = %self.settings.repo,
            "Uploading to GitHub"
        );

        let exchange = self.put_file(task).await?;
        let body = exchange.body_text();
        if !exchange.is_success() {
            if body.contains(ALREADY_EXISTS) {
                debug!(task_id = task.id, "File already exists, reusing it");
            } else {
                return Err(UploadError::Status {
                    status: exchange.status,
                    body,
                });
            }
        }

        let raw_url = self.settings.raw_url(&task.target_path);
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
