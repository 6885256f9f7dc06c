//! Discovery request parameters.

use std::path::Path;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;

use crate::core::service::ApiRequest;
use crate::errors::{WatsonError, WatsonResult};

// =============================================================================
// Environments
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateEnvironmentParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Environment size tier (0 is free).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateEnvironmentParams {
    #[serde(skip)]
    pub environment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// Configurations
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct CreateConfigurationParams {
    pub environment_id: String,
    /// Full configuration document (`name`, `conversions`, `enrichments`, ...).
    pub configuration: Value,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateConfigurationParams {
    pub environment_id: String,
    pub configuration_id: String,
    pub configuration: Value,
}

// =============================================================================
// Collections
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateCollectionParams {
    #[serde(skip)]
    pub environment_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_id: Option<String>,
    /// Sent as `language`, e.g. `en_us`.
    #[serde(rename = "language", skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateCollectionParams {
    #[serde(skip)]
    pub environment_id: String,
    #[serde(skip)]
    pub collection_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_id: Option<String>,
}

// =============================================================================
// Documents
// =============================================================================

/// A document to upload as the `file` part of a multipart request.
#[derive(Debug, Clone, Default)]
pub struct DocumentFile {
    pub filename: String,
    pub data: Bytes,
    /// Guessed from the file extension when `None`.
    pub content_type: Option<String>,
}

impl DocumentFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a document from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> WatsonResult<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        Ok(Self::new(filename, data))
    }

    /// Content type used for the upload.
    pub fn mime_type(&self) -> &str {
        if let Some(content_type) = &self.content_type {
            return content_type;
        }
        let extension = self
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "html" | "htm" => "text/html",
            "json" => "application/json",
            "pdf" => "application/pdf",
            "doc" => "application/msword",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "txt" => "text/plain",
            "xml" => "application/xml",
            _ => "application/octet-stream",
        }
    }

    fn into_part(self) -> WatsonResult<Part> {
        let mime = self.mime_type().to_string();
        Ok(Part::bytes(self.data.to_vec())
            .file_name(self.filename)
            .mime_str(&mime)?)
    }
}

fn json_part(value: &Value) -> WatsonResult<Part> {
    Ok(Part::text(serde_json::to_string(value)?).mime_str("application/json")?)
}

/// Multipart body with optional `file` and `metadata` parts.
pub(crate) fn document_form(file: Option<&DocumentFile>, metadata: Option<&Value>) -> WatsonResult<Form> {
    let mut form = Form::new();
    if let Some(file) = file {
        form = form.part("file", file.clone().into_part()?);
    }
    if let Some(metadata) = metadata {
        form = form.part("metadata", json_part(metadata)?);
    }
    Ok(form)
}

#[derive(Debug, Clone, Default)]
pub struct AddDocumentParams {
    pub environment_id: String,
    pub collection_id: String,
    pub file: Option<DocumentFile>,
    /// Arbitrary JSON stored with the document.
    pub metadata: Option<Value>,
    /// Configuration to ingest with, instead of the collection's.
    pub configuration_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentParams {
    pub environment_id: String,
    pub collection_id: String,
    pub document_id: String,
    pub file: Option<DocumentFile>,
    pub metadata: Option<Value>,
    pub configuration_id: Option<String>,
}

/// Upload a document through a configuration without storing it.
#[derive(Debug, Clone, Default)]
pub struct TestConfigurationParams {
    pub environment_id: String,
    /// Inline configuration; mutually exclusive with `configuration_id`.
    pub configuration: Option<Value>,
    pub configuration_id: Option<String>,
    /// Stop after `html_input`, `html_output`, `json_output`,
    /// `json_normalizations_output` or `enrichments_output`.
    pub step: Option<String>,
    pub file: Option<DocumentFile>,
    pub metadata: Option<Value>,
}

impl TestConfigurationParams {
    pub(crate) fn form(&self) -> WatsonResult<Form> {
        if self.configuration.is_some() && self.configuration_id.is_some() {
            return Err(WatsonError::Configuration(
                "configuration and configuration_id are mutually exclusive".to_string(),
            ));
        }
        let mut form = document_form(self.file.as_ref(), self.metadata.as_ref())?;
        if let Some(configuration) = &self.configuration {
            form = form.part("configuration", json_part(configuration)?);
        }
        Ok(form)
    }
}

// =============================================================================
// Query
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub environment_id: String,
    pub collection_id: String,
    /// Cacheable filter, e.g. `enriched_text.entities.text:IBM`.
    pub filter: Option<String>,
    pub query: Option<String>,
    pub natural_language_query: Option<String>,
    pub aggregation: Option<String>,
    pub count: Option<u32>,
    /// Fields to return (`return`).
    pub return_fields: Option<Vec<String>>,
    pub offset: Option<u32>,
    /// Sort keys, each optionally prefixed with `+`/`-`.
    pub sort: Option<Vec<String>>,
    pub passages: Option<bool>,
    pub highlight: Option<bool>,
}

impl QueryParams {
    pub(crate) fn apply_query(&self, request: ApiRequest) -> ApiRequest {
        request
            .query_opt("filter", self.filter.as_deref())
            .query_opt("query", self.query.as_deref())
            .query_opt("natural_language_query", self.natural_language_query.as_deref())
            .query_opt("aggregation", self.aggregation.as_deref())
            .query_opt("count", self.count)
            .query_list("return", self.return_fields.as_deref())
            .query_opt("offset", self.offset)
            .query_list("sort", self.sort.as_deref())
            .query_opt("passages", self.passages)
            .query_opt("highlight", self.highlight)
    }
}
