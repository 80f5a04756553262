use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::jsonc::strip_comments;
use crate::template::{
    DEFAULT_LEFT_DELIMITER, DEFAULT_RIGHT_DELIMITER, Resolver, UnresolvedPlaceholder,
};

/// `meta.type` this engine accepts
pub const SIMPLE_HTTP_UPLOADER: &str = "simple-http-uploader";

/// Problems with an adapter definition or with what it resolves to
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read definition {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("definition '{id}' has type '{found}', expected 'simple-http-uploader'")]
    UnsupportedType { id: String, found: String },

    #[error(transparent)]
    Unresolved(#[from] UnresolvedPlaceholder),

    #[error("invalid placeholder delimiters: {0}")]
    Delimiters(#[from] regex::Error),

    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("{section}.{key} must be a string, number or bool")]
    NonScalarValue { section: &'static str, key: String },

    #[error("unknown body field type '{kind}' for field '{field}'")]
    UnknownFieldType { field: String, kind: String },

    #[error("body field '{field}' of type string has no value")]
    MissingFieldValue { field: String },

    #[error("unsupported rawUrl from type '{0}'")]
    UnknownExtraction(String),

    #[error("rawUrl from '{from}' requires '{param}'")]
    MissingExtractionParam { from: String, param: &'static str },
}

/// A data-driven uploader described in JSON
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterDefinition {
    pub meta: Meta,
    pub http: HttpSpec,
    pub upload: UploadSpec,
    /// Placeholder delimiters, `["$(", ")"]` when absent
    #[serde(default)]
    pub delimiters: Option<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSpec {
    pub request: RequestSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestSpec {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub headers: Map<String, Value>,
    /// Multipart fields by name; ignored for non-multipart content types
    #[serde(default)]
    pub body: BTreeMap<String, BodyField>,
}

/// One multipart field; `type` is `string`, `file` or `file_base64`
#[derive(Debug, Clone, Deserialize)]
pub struct BodyField {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSpec {
    #[serde(rename = "rawUrl")]
    pub raw_url: RawUrlSpec,
}

/// How to find the raw URL once the upload request returns
#[derive(Debug, Clone, Deserialize)]
pub struct RawUrlSpec {
    pub from: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
}

impl AdapterDefinition {
    /// Parse a definition, comments allowed, rejecting foreign `meta.type`s
    pub fn parse(source: &str) -> Result<Self, DefinitionError> {
        let definition: AdapterDefinition = serde_json::from_str(&strip_comments(source))?;

        if definition.meta.kind != SIMPLE_HTTP_UPLOADER {
            return Err(DefinitionError::UnsupportedType {
                id: definition.meta.id,
                found: definition.meta.kind,
            });
        }

        Ok(definition)
    }

    pub fn from_file(path: &Path) -> Result<Self, DefinitionError> {
        let source = fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// Placeholder resolver honoring the definition's delimiters
    pub fn resolver(&self) -> Result<Resolver, DefinitionError> {
        match &self.delimiters {
            Some((left, right))
                if left != DEFAULT_LEFT_DELIMITER || right != DEFAULT_RIGHT_DELIMITER =>
            {
                Ok(Resolver::with_delimiters(left, right)?)
            }
            _ => Ok(Resolver::default()),
        }
    }
}
