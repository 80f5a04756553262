//! Raw URL extraction from a finished upload exchange

use thiserror::Error;

use super::definition::{DefinitionError, RawUrlSpec};
use super::json_path::{self, PathError};
use crate::error::{Result, UploadError};
use crate::http::HttpExchange;
use crate::template::{ResolveContext, Resolver, expand_request_tokens};

/// The response did not have the shape the definition promised
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("json response is not valid: {source}. resp: {body}")]
    MalformedJson {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("unable to get url: {source}. resp: {body}")]
    Path {
        #[source]
        source: PathError,
        body: String,
    },

    #[error("unable to get url: '{path}' is empty or not a string. resp: {body}")]
    EmptyValue { path: String, body: String },

    #[error("response header '{0}' is missing or empty")]
    MissingHeader(String),
}

/// Strategy declared under `upload.rawUrl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Dotted path into the JSON body
    JsonResponse { path: String },
    /// The body itself
    TextResponse,
    /// A placeholder template, independent of the response
    Template { template: String },
    /// A response header, verbatim
    ResponseHeader { name: String },
}

impl Extraction {
    pub fn from_spec(spec: &RawUrlSpec) -> std::result::Result<Self, DefinitionError> {
        let require = |value: &Option<String>, param: &'static str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| DefinitionError::MissingExtractionParam {
                    from: spec.from.clone(),
                    param,
                })
        };

        match spec.from.as_str() {
            "json_response" => Ok(Extraction::JsonResponse {
                path: require(&spec.path, "path")?,
            }),
            "text_response" => Ok(Extraction::TextResponse),
            "template" => Ok(Extraction::Template {
                template: require(&spec.template, "template")?,
            }),
            "response_header" => Ok(Extraction::ResponseHeader {
                name: require(&spec.header, "header")?,
            }),
            other => Err(DefinitionError::UnknownExtraction(other.to_string())),
        }
    }

    /// Derive the raw URL; a non-2xx status fails regardless of strategy
    pub fn extract(
        &self,
        exchange: &HttpExchange,
        resolver: &Resolver,
        ctx: &ResolveContext<'_>,
    ) -> Result<String> {
        if !exchange.is_success() {
            return Err(UploadError::Status {
                status: exchange.status,
                body: exchange.body_text(),
            });
        }

        match self {
            Extraction::JsonResponse { path } => {
                let document: serde_json::Value =
                    serde_json::from_slice(&exchange.body).map_err(|source| {
                        ResponseError::MalformedJson {
                            source,
                            body: exchange.body_text(),
                        }
                    })?;

                let value = json_path::lookup(&document, path).map_err(|source| {
                    ResponseError::Path {
                        source,
                        body: exchange.body_text(),
                    }
                })?;

                match value.as_str() {
                    Some(url) if !url.is_empty() => Ok(url.to_string()),
                    _ => Err(ResponseError::EmptyValue {
                        path: path.clone(),
                        body: exchange.body_text(),
                    }
                    .into()),
                }
            }
            Extraction::TextResponse => Ok(exchange.body_text()),
            Extraction::Template { template } => {
                let resolved = resolver.resolve(template, ctx)?;
                Ok(expand_request_tokens(&resolved, &ctx.task.target_path))
            }
            Extraction::ResponseHeader { name } => exchange
                .headers
                .get(name.as_str())
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ResponseError::MissingHeader(name.clone()).into()),
        }
    }
}
