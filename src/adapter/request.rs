//! Turns an adapter definition plus one task into a ready-to-send request

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, Url};
use serde_json::{Map, Value};
use tracing::debug;

use super::definition::{AdapterDefinition, BodyField, DefinitionError};
use crate::error::{Result, UploadError};
use crate::template::{ResolveContext, Resolver, expand_request_tokens};

const OCTET_STREAM: &str = "application/octet-stream";

/// Declared type of a multipart field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Literal, placeholder-substituted text
    String,
    /// The local file, attached under its base name
    File,
    /// The local file, base64-encoded into a text field
    FileBase64,
}

impl FieldKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "string" => Some(FieldKind::String),
            "file" => Some(FieldKind::File),
            "file_base64" => Some(FieldKind::FileBase64),
            _ => None,
        }
    }
}

/// What went into one multipart part, kept for logging and inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSummary {
    pub name: String,
    pub kind: FieldKind,
    pub file_name: Option<String>,
    /// Text content for `string` and `file_base64` parts
    pub value: Option<String>,
}

#[derive(Debug)]
pub enum PreparedBody {
    Bytes(Bytes),
    Multipart { form: Form, parts: Vec<PartSummary> },
}

#[derive(Debug)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: PreparedBody,
}

/// Builds the request for one task; every step aborts the task on error
pub struct RequestBuilder<'a> {
    definition: &'a AdapterDefinition,
    resolver: &'a Resolver,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(definition: &'a AdapterDefinition, resolver: &'a Resolver) -> Self {
        Self {
            definition,
            resolver,
        }
    }

    pub async fn build(&self, ctx: &ResolveContext<'_>) -> Result<PreparedRequest> {
        let method = self.method(ctx)?;
        let url = self.url(ctx)?;
        let mut headers = self.headers(ctx)?;

        let body = if is_multipart(&headers) {
            let (form, parts) = self.multipart(ctx).await?;
            let content_type = format!("multipart/form-data; boundary={}", form.boundary());
            headers.insert(CONTENT_TYPE, header_value(CONTENT_TYPE.as_str(), &content_type)?);
            PreparedBody::Multipart { form, parts }
        } else {
            PreparedBody::Bytes(Bytes::from(read_local_file(ctx).await?))
        };

        debug!(task_id = ctx.task.id, %method, %url, "Prepared upload request");

        Ok(PreparedRequest {
            method,
            url,
            headers,
            body,
        })
    }

    fn method(&self, ctx: &ResolveContext<'_>) -> Result<Method> {
        let raw = self.resolver.resolve(&self.definition.http.request.method, ctx)?;
        let upper = raw.trim().to_ascii_uppercase();
        Method::from_bytes(upper.as_bytes())
            .map_err(|_| DefinitionError::InvalidMethod(raw).into())
    }

    fn url(&self, ctx: &ResolveContext<'_>) -> Result<Url> {
        let spec = &self.definition.http.request;

        let resolved = self.resolver.resolve(&spec.url, ctx)?;
        let expanded = expand_request_tokens(&resolved, &ctx.task.target_path);
        let mut url = Url::parse(&expanded).map_err(|e| DefinitionError::InvalidUrl {
            url: expanded.clone(),
            reason: e.to_string(),
        })?;

        let params = self.resolver.resolve_map(&spec.params, ctx)?;
        if !params.is_empty() {
            let pairs = scalar_entries("params", &params)?;
            let mut query = url.query_pairs_mut();
            for (name, value) in &pairs {
                query.append_pair(name, value);
            }
        }

        Ok(url)
    }

    fn headers(&self, ctx: &ResolveContext<'_>) -> Result<HeaderMap> {
        let resolved = self
            .resolver
            .resolve_map(&self.definition.http.request.headers, ctx)?;

        let mut headers = HeaderMap::new();
        for (name, value) in scalar_entries("headers", &resolved)? {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                DefinitionError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let value = expand_request_tokens(&value, &ctx.task.target_path);
            headers.insert(header_name, header_value(&name, &value)?);
        }

        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
        }

        Ok(headers)
    }

    async fn multipart(&self, ctx: &ResolveContext<'_>) -> Result<(Form, Vec<PartSummary>)> {
        let mut form = Form::new();
        let mut parts = Vec::new();
        let mut content: Option<Vec<u8>> = None;

        for (name, field) in &self.definition.http.request.body {
            let kind = field_kind(name, field)?;

            let summary = match kind {
                FieldKind::String => {
                    let raw = field
                        .value
                        .as_deref()
                        .ok_or_else(|| DefinitionError::MissingFieldValue {
                            field: name.clone(),
                        })?;
                    let value = self.resolver.resolve(
                        &expand_request_tokens(raw, &ctx.task.target_path),
                        ctx,
                    )?;
                    form = form.text(name.clone(), value.clone());
                    PartSummary {
                        name: name.clone(),
                        kind,
                        file_name: None,
                        value: Some(value),
                    }
                }
                FieldKind::File => {
                    let data = cached_file(&mut content, ctx).await?.to_vec();
                    let file_name = ctx.task.file_name();
                    let part = Part::bytes(data)
                        .file_name(file_name.clone())
                        .mime_str(OCTET_STREAM)?;
                    form = form.part(name.clone(), part);
                    PartSummary {
                        name: name.clone(),
                        kind,
                        file_name: Some(file_name),
                        value: None,
                    }
                }
                FieldKind::FileBase64 => {
                    let encoded = BASE64.encode(cached_file(&mut content, ctx).await?);
                    form = form.text(name.clone(), encoded.clone());
                    PartSummary {
                        name: name.clone(),
                        kind,
                        file_name: None,
                        value: Some(encoded),
                    }
                }
            };

            debug!(field = %summary.name, kind = ?summary.kind, "Added multipart field");
            parts.push(summary);
        }

        Ok((form, parts))
    }
}

fn field_kind(name: &str, field: &BodyField) -> std::result::Result<FieldKind, DefinitionError> {
    FieldKind::parse(&field.kind).ok_or_else(|| DefinitionError::UnknownFieldType {
        field: name.to_string(),
        kind: field.kind.clone(),
    })
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA)
}

fn header_value(name: &str, value: &str) -> std::result::Result<HeaderValue, DefinitionError> {
    HeaderValue::from_str(value).map_err(|e| DefinitionError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Flatten a resolved map into name/value strings
fn scalar_entries(
    section: &'static str,
    map: &Map<String, Value>,
) -> std::result::Result<Vec<(String, String)>, DefinitionError> {
    map.iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(DefinitionError::NonScalarValue {
                        section,
                        key: key.clone(),
                    });
                }
            };
            Ok((key.clone(), text))
        })
        .collect()
}

/// Read the task's file at most once per request
async fn cached_file<'c>(
    cache: &'c mut Option<Vec<u8>>,
    ctx: &ResolveContext<'_>,
) -> Result<&'c [u8]> {
    if cache.is_none() {
        *cache = Some(read_local_file(ctx).await?);
    }
    Ok(cache.as_deref().unwrap_or_default())
}

async fn read_local_file(ctx: &ResolveContext<'_>) -> Result<Vec<u8>> {
    let path = &ctx.task.local_path;
    tokio::fs::read(path)
        .await
        .map_err(|source| UploadError::io(path, source))
}
