//! Discovery v1 client.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use super::params::*;
use crate::config::{ServiceConfig, ServiceKind};
use crate::core::service::{ApiRequest, HttpTransport, WatsonService, required, required_present};
use crate::errors::WatsonResult;

/// Client for the Watson Discovery v1 API.
#[derive(Debug, Clone)]
pub struct Discovery {
    service: WatsonService,
}

// =============================================================================
// Request builders
// =============================================================================

fn environment_request(method: Method, path: &'static str, environment_id: &str) -> WatsonResult<ApiRequest> {
    required(&[("environment_id", environment_id)])?;
    Ok(ApiRequest::new(method, path).path_param("environment_id", environment_id))
}

fn configuration_request(
    method: Method,
    environment_id: &str,
    configuration_id: &str,
) -> WatsonResult<ApiRequest> {
    required(&[("environment_id", environment_id), ("configuration_id", configuration_id)])?;
    Ok(
        ApiRequest::new(method, "/v1/environments/{environment_id}/configurations/{configuration_id}")
            .path_param("environment_id", environment_id)
            .path_param("configuration_id", configuration_id),
    )
}

fn collection_request(
    method: Method,
    path: &'static str,
    environment_id: &str,
    collection_id: &str,
) -> WatsonResult<ApiRequest> {
    required(&[("environment_id", environment_id), ("collection_id", collection_id)])?;
    Ok(ApiRequest::new(method, path)
        .path_param("environment_id", environment_id)
        .path_param("collection_id", collection_id))
}

fn document_request(
    method: Method,
    environment_id: &str,
    collection_id: &str,
    document_id: &str,
) -> WatsonResult<ApiRequest> {
    required(&[
        ("environment_id", environment_id),
        ("collection_id", collection_id),
        ("document_id", document_id),
    ])?;
    Ok(ApiRequest::new(
        method,
        "/v1/environments/{environment_id}/collections/{collection_id}/documents/{document_id}",
    )
    .path_param("environment_id", environment_id)
    .path_param("collection_id", collection_id)
    .path_param("document_id", document_id))
}

pub(crate) fn create_configuration_request(params: &CreateConfigurationParams) -> WatsonResult<ApiRequest> {
    required_present(&[
        ("environment_id", !params.environment_id.trim().is_empty()),
        ("configuration", !params.configuration.is_null()),
    ])?;
    Ok(
        environment_request(Method::POST, "/v1/environments/{environment_id}/configurations", &params.environment_id)?
            .json(params.configuration.clone()),
    )
}

pub(crate) fn update_configuration_request(params: &UpdateConfigurationParams) -> WatsonResult<ApiRequest> {
    required_present(&[
        ("environment_id", !params.environment_id.trim().is_empty()),
        ("configuration_id", !params.configuration_id.trim().is_empty()),
        ("configuration", !params.configuration.is_null()),
    ])?;
    Ok(configuration_request(Method::PUT, &params.environment_id, &params.configuration_id)?
        .json(params.configuration.clone()))
}

pub(crate) fn create_environment_request(params: &CreateEnvironmentParams) -> WatsonResult<ApiRequest> {
    required(&[("name", params.name.as_str())])?;
    Ok(ApiRequest::post("/v1/environments").json(serde_json::to_value(params)?))
}

pub(crate) fn create_collection_request(params: &CreateCollectionParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("environment_id", params.environment_id.as_str()),
        ("name", params.name.as_str()),
    ])?;
    Ok(ApiRequest::post("/v1/environments/{environment_id}/collections")
        .path_param("environment_id", params.environment_id.as_str())
        .json(serde_json::to_value(params)?))
}

pub(crate) fn update_collection_request(params: &UpdateCollectionParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("environment_id", params.environment_id.as_str()),
        ("collection_id", params.collection_id.as_str()),
        ("name", params.name.as_str()),
    ])?;
    Ok(collection_request(
        Method::PUT,
        "/v1/environments/{environment_id}/collections/{collection_id}",
        &params.environment_id,
        &params.collection_id,
    )?
    .json(serde_json::to_value(params)?))
}

/// A document upload needs a file, metadata, or both.
fn has_document(file: Option<&DocumentFile>, metadata: Option<&Value>) -> bool {
    file.is_some() || metadata.is_some()
}

pub(crate) fn add_document_request(params: &AddDocumentParams) -> WatsonResult<ApiRequest> {
    required_present(&[
        ("environment_id", !params.environment_id.trim().is_empty()),
        ("collection_id", !params.collection_id.trim().is_empty()),
        ("file", has_document(params.file.as_ref(), params.metadata.as_ref())),
    ])?;
    let request = collection_request(
        Method::POST,
        "/v1/environments/{environment_id}/collections/{collection_id}/documents",
        &params.environment_id,
        &params.collection_id,
    )?;
    Ok(request
        .query_opt("configuration_id", params.configuration_id.as_deref())
        .multipart(document_form(params.file.as_ref(), params.metadata.as_ref())?))
}

pub(crate) fn update_document_request(params: &UpdateDocumentParams) -> WatsonResult<ApiRequest> {
    required_present(&[
        ("environment_id", !params.environment_id.trim().is_empty()),
        ("collection_id", !params.collection_id.trim().is_empty()),
        ("document_id", !params.document_id.trim().is_empty()),
        ("file", has_document(params.file.as_ref(), params.metadata.as_ref())),
    ])?;
    let request = document_request(
        Method::POST,
        &params.environment_id,
        &params.collection_id,
        &params.document_id,
    )?;
    Ok(request
        .query_opt("configuration_id", params.configuration_id.as_deref())
        .multipart(document_form(params.file.as_ref(), params.metadata.as_ref())?))
}

pub(crate) fn query_request(params: &QueryParams) -> WatsonResult<ApiRequest> {
    let request = collection_request(
        Method::GET,
        "/v1/environments/{environment_id}/collections/{collection_id}/query",
        &params.environment_id,
        &params.collection_id,
    )?;
    Ok(params.apply_query(request))
}

pub(crate) fn test_configuration_request(params: &TestConfigurationParams) -> WatsonResult<ApiRequest> {
    let request = environment_request(
        Method::POST,
        "/v1/environments/{environment_id}/preview",
        &params.environment_id,
    )?;
    let form = params.form()?;
    Ok(request
        .query_opt("configuration_id", params.configuration_id.as_deref())
        .query_opt("step", params.step.as_deref())
        .multipart(form))
}

// =============================================================================
// Client
// =============================================================================

impl Discovery {
    /// Create a client; `version_date` is required.
    pub fn new(config: ServiceConfig) -> WatsonResult<Self> {
        Ok(Self {
            service: WatsonService::new(ServiceKind::Discovery, config)?,
        })
    }

    /// Create a client with configuration from `DISCOVERY_*` variables.
    pub fn from_env() -> WatsonResult<Self> {
        Self::new(ServiceConfig::from_env(ServiceKind::Discovery))
    }

    /// Replace the HTTP transport.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.service = self.service.with_transport(transport);
        self
    }

    pub fn service(&self) -> &WatsonService {
        &self.service
    }

    // -------------------------------------------------------------------------
    // Environments
    // -------------------------------------------------------------------------

    pub async fn get_environments(&self, name: Option<&str>) -> WatsonResult<Value> {
        let request = ApiRequest::get("/v1/environments").query_opt("name", name);
        self.service.send_json(request).await
    }

    pub async fn create_environment(&self, params: &CreateEnvironmentParams) -> WatsonResult<Value> {
        let environment: Value = self.service.send_json(create_environment_request(params)?).await?;
        if let Some(id) = environment.get("environment_id").and_then(Value::as_str) {
            info!(environment_id = id, "Created environment");
        }
        Ok(environment)
    }

    pub async fn get_environment(&self, environment_id: &str) -> WatsonResult<Value> {
        let request = environment_request(Method::GET, "/v1/environments/{environment_id}", environment_id)?;
        self.service.send_json(request).await
    }

    pub async fn update_environment(&self, params: &UpdateEnvironmentParams) -> WatsonResult<Value> {
        let request = environment_request(
            Method::PUT,
            "/v1/environments/{environment_id}",
            &params.environment_id,
        )?
        .json(serde_json::to_value(params)?);
        self.service.send_json(request).await
    }

    pub async fn delete_environment(&self, environment_id: &str) -> WatsonResult<Value> {
        let request = environment_request(Method::DELETE, "/v1/environments/{environment_id}", environment_id)?;
        self.service.send_empty(request).await
    }

    // -------------------------------------------------------------------------
    // Configurations
    // -------------------------------------------------------------------------

    pub async fn get_configurations(&self, environment_id: &str, name: Option<&str>) -> WatsonResult<Value> {
        let request = environment_request(
            Method::GET,
            "/v1/environments/{environment_id}/configurations",
            environment_id,
        )?
        .query_opt("name", name);
        self.service.send_json(request).await
    }

    pub async fn get_configuration(&self, environment_id: &str, configuration_id: &str) -> WatsonResult<Value> {
        let request = configuration_request(Method::GET, environment_id, configuration_id)?;
        self.service.send_json(request).await
    }

    pub async fn create_configuration(&self, params: &CreateConfigurationParams) -> WatsonResult<Value> {
        self.service.send_json(create_configuration_request(params)?).await
    }

    /// Replace a configuration document.
    pub async fn update_configuration(&self, params: &UpdateConfigurationParams) -> WatsonResult<Value> {
        self.service.send_json(update_configuration_request(params)?).await
    }

    pub async fn delete_configuration(&self, environment_id: &str, configuration_id: &str) -> WatsonResult<Value> {
        let request = configuration_request(Method::DELETE, environment_id, configuration_id)?;
        self.service.send_empty(request).await
    }

    /// Run a document through a configuration without indexing it.
    pub async fn test_configuration_in_environment(&self, params: &TestConfigurationParams) -> WatsonResult<Value> {
        debug!(environment_id = %params.environment_id, step = ?params.step, "Previewing configuration");
        self.service.send_json(test_configuration_request(params)?).await
    }

    // -------------------------------------------------------------------------
    // Collections
    // -------------------------------------------------------------------------

    pub async fn get_collections(&self, environment_id: &str, name: Option<&str>) -> WatsonResult<Value> {
        let request = environment_request(
            Method::GET,
            "/v1/environments/{environment_id}/collections",
            environment_id,
        )?
        .query_opt("name", name);
        self.service.send_json(request).await
    }

    pub async fn get_collection(&self, environment_id: &str, collection_id: &str) -> WatsonResult<Value> {
        let request = collection_request(
            Method::GET,
            "/v1/environments/{environment_id}/collections/{collection_id}",
            environment_id,
            collection_id,
        )?;
        self.service.send_json(request).await
    }

    pub async fn create_collection(&self, params: &CreateCollectionParams) -> WatsonResult<Value> {
        self.service.send_json(create_collection_request(params)?).await
    }

    pub async fn update_collection(&self, params: &UpdateCollectionParams) -> WatsonResult<Value> {
        self.service.send_json(update_collection_request(params)?).await
    }

    pub async fn delete_collection(&self, environment_id: &str, collection_id: &str) -> WatsonResult<Value> {
        let request = collection_request(
            Method::DELETE,
            "/v1/environments/{environment_id}/collections/{collection_id}",
            environment_id,
            collection_id,
        )?;
        self.service.send_empty(request).await
    }

    /// Unique field names across the collection's documents.
    pub async fn get_collection_fields(&self, environment_id: &str, collection_id: &str) -> WatsonResult<Value> {
        let request = collection_request(
            Method::GET,
            "/v1/environments/{environment_id}/collections/{collection_id}/fields",
            environment_id,
            collection_id,
        )?;
        self.service.send_json(request).await
    }

    // -------------------------------------------------------------------------
    // Documents
    // -------------------------------------------------------------------------

    /// Upload a document (and/or metadata) for ingestion.
    pub async fn add_document(&self, params: &AddDocumentParams) -> WatsonResult<Value> {
        self.service.send_json(add_document_request(params)?).await
    }

    pub async fn update_document(&self, params: &UpdateDocumentParams) -> WatsonResult<Value> {
        self.service.send_json(update_document_request(params)?).await
    }

    /// Ingestion status of a document.
    pub async fn get_document(
        &self,
        environment_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> WatsonResult<Value> {
        let request = document_request(Method::GET, environment_id, collection_id, document_id)?;
        self.service.send_json(request).await
    }

    pub async fn delete_document(
        &self,
        environment_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> WatsonResult<Value> {
        let request = document_request(Method::DELETE, environment_id, collection_id, document_id)?;
        self.service.send_empty(request).await
    }

    // -------------------------------------------------------------------------
    // Query
    // -------------------------------------------------------------------------

    pub async fn query(&self, params: &QueryParams) -> WatsonResult<Value> {
        self.service.send_json(query_request(params)?).await
    }
}
