//! Data-driven HTTP uploader
//!
//! An adapter definition is a JSON document (comments allowed) describing one
//! upload target:
//!
//! ```jsonc
//! {
//!   "meta": { "id": "imgbed", "name": "Image bed", "type": "simple-http-uploader" },
//!   "http": {
//!     "request": {
//!       "method": "POST",
//!       "url": "https://imgbed.example.com/api/upload",
//!       "params": { "key": "$(ext_config.api_key)" },
//!       "headers": { "Content-Type": "multipart/form-data" },
//!       "body": { "image": { "type": "file" } }
//!     }
//!   },
//!   "upload": { "rawUrl": { "from": "json_response", "path": "data.url" } }
//! }
//! ```
//!
//! ## Key Components
//!
//! - [`AdapterDefinition`] - parsed definition document
//! - [`RequestBuilder`] - definition + task -> [`PreparedRequest`]
//! - [`Extraction`] - response -> raw URL
//! - [`SimpleHttpUploader`] - the [`Uploader`](crate::uploader::Uploader) tying them together

mod definition;
mod extract;
pub mod json_path;
mod jsonc;
mod request;
mod simple_http;

pub use definition::{
    AdapterDefinition, BodyField, DefinitionError, HttpSpec, Meta, RawUrlSpec, RequestSpec,
    SIMPLE_HTTP_UPLOADER, UploadSpec,
};
pub use extract::{Extraction, ResponseError};
pub use json_path::PathError;
pub use jsonc::strip_comments;
pub use request::{FieldKind, PartSummary, PreparedBody, PreparedRequest, RequestBuilder};
pub use simple_http::SimpleHttpUploader;
