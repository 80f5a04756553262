use async_trait::async_trait;
use bon::Builder;
use std::sync::Arc;
use tracing::{debug, info};

use super::definition::AdapterDefinition;
use super::extract::Extraction;
use super::request::RequestBuilder;
use crate::config::{AdapterConfig, Config};
use crate::error::Result;
use crate::http::HttpClient;
use crate::options::RunOptions;
use crate::task::Task;
use crate::template::{ResolveContext, UrlRewriter};
use crate::uploader::{TaskCallback, Uploader, assign_target_path};

/// Uploader driven entirely by an [`AdapterDefinition`]
#[derive(Builder)]
pub struct SimpleHttpUploader {
    definition: AdapterDefinition,
    /// `[uploaders.<id>]` settings, seen as `$(ext_config.*)`
    #[builder(default)]
    ext_config: AdapterConfig,
    config: Arc<Config>,
    options: Arc<RunOptions>,
    http: HttpClient,
    #[builder(skip)]
    callback: Option<TaskCallback>,
}

#[async_trait]
impl Uploader for SimpleHttpUploader {
    async fn upload(&self, task: &mut Task) -> Result<()> {
        let resolver = self.definition.resolver()?;
        let extraction = Extraction::from_spec(&self.definition.upload.raw_url)?;

        assign_target_path(task, &self.config.rename);
        info!(
            task_id = task.id,
            path = %task.local_path,
            target = %task.target_path,
            adapter = self.definition.id(),
            "Uploading"
        );

        let raw_url = {
            let ctx = ResolveContext {
                ext_config: &self.ext_config,
                config: &self.config,
                options: &self.options,
                task: &*task,
            };
            let request = RequestBuilder::new(&self.definition, &resolver)
                .build(&ctx)
                .await?;
            let exchange = self.http.execute(request).await?;
            debug!(task_id = task.id, body = %exchange.body_text(), "Upload response");
            extraction.extract(&exchange, &resolver, &ctx)?
        };

        let url = UrlRewriter::new(&self.config.replacements).replace_url(&raw_url);
        info!(task_id = task.id, %raw_url, %url, "Uploaded");
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
