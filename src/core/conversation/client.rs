//! Conversation v1 client.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Value, json};
use tracing::info;

use super::params::*;
use crate::config::{ServiceConfig, ServiceKind};
use crate::core::service::{ApiRequest, HttpTransport, WatsonService, required};
use crate::errors::WatsonResult;

/// Client for the Watson Conversation v1 API.
#[derive(Debug, Clone)]
pub struct Conversation {
    service: WatsonService,
}

// =============================================================================
// Request builders
// =============================================================================

fn workspace_request(method: Method, path: &'static str, workspace_id: &str) -> WatsonResult<ApiRequest> {
    required(&[("workspace_id", workspace_id)])?;
    Ok(ApiRequest::new(method, path).path_param("workspace_id", workspace_id))
}

pub(crate) fn message_request(params: &MessageParams) -> WatsonResult<ApiRequest> {
    Ok(workspace_request(
        Method::POST,
        "/v1/workspaces/{workspace_id}/message",
        &params.workspace_id,
    )?
    .json(serde_json::to_value(params)?))
}

pub(crate) fn get_workspace_request(params: &GetWorkspaceParams) -> WatsonResult<ApiRequest> {
    Ok(workspace_request(Method::GET, "/v1/workspaces/{workspace_id}", &params.workspace_id)?
        .query_opt("export", params.export))
}

pub(crate) fn update_workspace_request(params: &WorkspaceParams) -> WatsonResult<ApiRequest> {
    Ok(workspace_request(Method::POST, "/v1/workspaces/{workspace_id}", &params.workspace_id)?
        .json(serde_json::to_value(params)?))
}

pub(crate) fn get_intents_request(params: &GetIntentsParams) -> WatsonResult<ApiRequest> {
    let request = workspace_request(Method::GET, "/v1/workspaces/{workspace_id}/intents", &params.workspace_id)?
        .query_opt("export", params.export);
    Ok(params.list.apply_query(request))
}

pub(crate) fn create_intent_request(params: &CreateIntentParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("workspace_id", params.workspace_id.as_str()),
        ("intent", params.intent.as_str()),
    ])?;
    Ok(ApiRequest::post("/v1/workspaces/{workspace_id}/intents")
        .path_param("workspace_id", params.workspace_id.as_str())
        .json(serde_json::to_value(params)?))
}

fn intent_request(method: Method, path: &'static str, workspace_id: &str, intent: &str) -> WatsonResult<ApiRequest> {
    required(&[("workspace_id", workspace_id), ("intent", intent)])?;
    Ok(ApiRequest::new(method, path)
        .path_param("workspace_id", workspace_id)
        .path_param("intent", intent))
}

pub(crate) fn update_intent_request(params: &UpdateIntentParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("workspace_id", params.workspace_id.as_str()),
        ("old_intent", params.old_intent.as_str()),
    ])?;
    Ok(ApiRequest::post("/v1/workspaces/{workspace_id}/intents/{old_intent}")
        .path_param("workspace_id", params.workspace_id.as_str())
        .path_param("old_intent", params.old_intent.as_str())
        .json(serde_json::to_value(params)?))
}

fn example_request(method: Method, params: &ExampleParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("workspace_id", params.workspace_id.as_str()),
        ("intent", params.intent.as_str()),
        ("text", params.text.as_str()),
    ])?;
    Ok(ApiRequest::new(method, "/v1/workspaces/{workspace_id}/intents/{intent}/examples/{text}")
        .path_param("workspace_id", params.workspace_id.as_str())
        .path_param("intent", params.intent.as_str())
        .path_param("text", params.text.as_str()))
}

pub(crate) fn create_example_request(params: &ExampleParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("workspace_id", params.workspace_id.as_str()),
        ("intent", params.intent.as_str()),
        ("text", params.text.as_str()),
    ])?;
    Ok(ApiRequest::post("/v1/workspaces/{workspace_id}/intents/{intent}/examples")
        .path_param("workspace_id", params.workspace_id.as_str())
        .path_param("intent", params.intent.as_str())
        .json(json!({ "text": params.text })))
}

pub(crate) fn update_example_request(params: &UpdateExampleParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("workspace_id", params.workspace_id.as_str()),
        ("intent", params.intent.as_str()),
        ("old_text", params.old_text.as_str()),
    ])?;
    let body = match &params.text {
        Some(text) => json!({ "text": text }),
        None => json!({}),
    };
    Ok(ApiRequest::post("/v1/workspaces/{workspace_id}/intents/{intent}/examples/{old_text}")
        .path_param("workspace_id", params.workspace_id.as_str())
        .path_param("intent", params.intent.as_str())
        .path_param("old_text", params.old_text.as_str())
        .json(body))
}

fn counter_example_request(method: Method, params: &CounterExampleParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("workspace_id", params.workspace_id.as_str()),
        ("text", params.text.as_str()),
    ])?;
    Ok(ApiRequest::new(method, "/v1/workspaces/{workspace_id}/counterexamples/{text}")
        .path_param("workspace_id", params.workspace_id.as_str())
        .path_param("text", params.text.as_str()))
}

pub(crate) fn create_counter_example_request(params: &CounterExampleParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("workspace_id", params.workspace_id.as_str()),
        ("text", params.text.as_str()),
    ])?;
    Ok(ApiRequest::post("/v1/workspaces/{workspace_id}/counterexamples")
        .path_param("workspace_id", params.workspace_id.as_str())
        .json(json!({ "text": params.text })))
}

pub(crate) fn update_counter_example_request(params: &UpdateCounterExampleParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("workspace_id", params.workspace_id.as_str()),
        ("old_text", params.old_text.as_str()),
    ])?;
    let body = match &params.text {
        Some(text) => json!({ "text": text }),
        None => json!({}),
    };
    Ok(ApiRequest::post("/v1/workspaces/{workspace_id}/counterexamples/{old_text}")
        .path_param("workspace_id", params.workspace_id.as_str())
        .path_param("old_text", params.old_text.as_str())
        .json(body))
}

fn entity_request(method: Method, path: &'static str, workspace_id: &str, entity: &str) -> WatsonResult<ApiRequest> {
    required(&[("workspace_id", workspace_id), ("entity", entity)])?;
    Ok(ApiRequest::new(method, path)
        .path_param("workspace_id", workspace_id)
        .path_param("entity", entity))
}

pub(crate) fn update_entity_request(params: &UpdateEntityParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("workspace_id", params.workspace_id.as_str()),
        ("old_entity", params.old_entity.as_str()),
    ])?;
    Ok(ApiRequest::post("/v1/workspaces/{workspace_id}/entities/{old_entity}")
        .path_param("workspace_id", params.workspace_id.as_str())
        .path_param("old_entity", params.old_entity.as_str())
        .json(serde_json::to_value(params)?))
}

fn value_request(method: Method, workspace_id: &str, entity: &str, value: &str) -> WatsonResult<ApiRequest> {
    required(&[("workspace_id", workspace_id), ("entity", entity), ("value", value)])?;
    Ok(ApiRequest::new(method, "/v1/workspaces/{workspace_id}/entities/{entity}/values/{value}")
        .path_param("workspace_id", workspace_id)
        .path_param("entity", entity)
        .path_param("value", value))
}

pub(crate) fn create_value_request(params: &CreateValueParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("workspace_id", params.workspace_id.as_str()),
        ("entity", params.entity.as_str()),
        ("value", params.value.as_str()),
    ])?;
    Ok(ApiRequest::post("/v1/workspaces/{workspace_id}/entities/{entity}/values")
        .path_param("workspace_id", params.workspace_id.as_str())
        .path_param("entity", params.entity.as_str())
        .json(serde_json::to_value(params)?))
}

pub(crate) fn update_value_request(params: &UpdateValueParams) -> WatsonResult<ApiRequest> {
    required(&[
        ("workspace_id", params.workspace_id.as_str()),
        ("entity", params.entity.as_str()),
        ("old_value", params.old_value.as_str()),
    ])?;
    Ok(ApiRequest::post("/v1/workspaces/{workspace_id}/entities/{entity}/values/{old_value}")
        .path_param("workspace_id", params.workspace_id.as_str())
        .path_param("entity", params.entity.as_str())
        .path_param("old_value", params.old_value.as_str())
        .json(serde_json::to_value(params)?))
}

pub(crate) fn list_logs_request(params: &ListLogsParams) -> WatsonResult<ApiRequest> {
    Ok(workspace_request(Method::GET, "/v1/workspaces/{workspace_id}/logs", &params.workspace_id)?
        .query_opt("sort", params.sort.as_deref())
        .query_opt("filter", params.filter.as_deref())
        .query_opt("page_limit", params.page_limit)
        .query_opt("cursor", params.cursor.as_deref()))
}

// =============================================================================
// Client
// =============================================================================

impl Conversation {
    /// Create a client; `version_date` is required.
    pub fn new(config: ServiceConfig) -> WatsonResult<Self> {
        Ok(Self {
            service: WatsonService::new(ServiceKind::Conversation, config)?,
        })
    }

    /// Create a client with configuration from `CONVERSATION_*` variables.
    pub fn from_env() -> WatsonResult<Self> {
        Self::new(ServiceConfig::from_env(ServiceKind::Conversation))
    }

    /// Replace the HTTP transport.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.service = self.service.with_transport(transport);
        self
    }

    pub fn service(&self) -> &WatsonService {
        &self.service
    }

    /// Send user input to a workspace and get the dialog response.
    pub async fn message(&self, params: &MessageParams) -> WatsonResult<Value> {
        self.service.send_json(message_request(params)?).await
    }

    // -------------------------------------------------------------------------
    // Workspaces
    // -------------------------------------------------------------------------

    pub async fn list_workspaces(&self, params: &ListParams) -> WatsonResult<Value> {
        let request = params.apply_query(ApiRequest::get("/v1/workspaces"));
        self.service.send_json(request).await
    }

    pub async fn create_workspace(&self, params: &WorkspaceParams) -> WatsonResult<Value> {
        let request = ApiRequest::post("/v1/workspaces").json(serde_json::to_value(params)?);
        let workspace: Value = self.service.send_json(request).await?;
        if let Some(id) = workspace.get("workspace_id").and_then(Value::as_str) {
            info!(workspace_id = id, "Created workspace");
        }
        Ok(workspace)
    }

    pub async fn get_workspace(&self, params: &GetWorkspaceParams) -> WatsonResult<Value> {
        self.service.send_json(get_workspace_request(params)?).await
    }

    /// Update a workspace; only the fields set in `params` are changed.
    pub async fn update_workspace(&self, params: &WorkspaceParams) -> WatsonResult<Value> {
        self.service.send_json(update_workspace_request(params)?).await
    }

    pub async fn delete_workspace(&self, workspace_id: &str) -> WatsonResult<Value> {
        let request = workspace_request(Method::DELETE, "/v1/workspaces/{workspace_id}", workspace_id)?;
        self.service.send_empty(request).await
    }

    /// Workspace details without its content; includes the training status.
    pub async fn workspace_status(&self, workspace_id: &str) -> WatsonResult<Value> {
        let request = workspace_request(Method::GET, "/v1/workspaces/{workspace_id}", workspace_id)?;
        self.service.send_json(request).await
    }

    // -------------------------------------------------------------------------
    // Intents
    // -------------------------------------------------------------------------

    pub async fn get_intents(&self, params: &GetIntentsParams) -> WatsonResult<Value> {
        self.service.send_json(get_intents_request(params)?).await
    }

    pub async fn create_intent(&self, params: &CreateIntentParams) -> WatsonResult<Value> {
        self.service.send_json(create_intent_request(params)?).await
    }

    pub async fn get_intent(&self, params: &GetIntentParams) -> WatsonResult<Value> {
        let request = intent_request(
            Method::GET,
            "/v1/workspaces/{workspace_id}/intents/{intent}",
            &params.workspace_id,
            &params.intent,
        )?
        .query_opt("export", params.export);
        self.service.send_json(request).await
    }

    pub async fn update_intent(&self, params: &UpdateIntentParams) -> WatsonResult<Value> {
        self.service.send_json(update_intent_request(params)?).await
    }

    pub async fn delete_intent(&self, workspace_id: &str, intent: &str) -> WatsonResult<Value> {
        let request = intent_request(
            Method::DELETE,
            "/v1/workspaces/{workspace_id}/intents/{intent}",
            workspace_id,
            intent,
        )?;
        self.service.send_empty(request).await
    }

    // -------------------------------------------------------------------------
    // Examples
    // -------------------------------------------------------------------------

    pub async fn get_examples(&self, params: &GetExamplesParams) -> WatsonResult<Value> {
        let request = intent_request(
            Method::GET,
            "/v1/workspaces/{workspace_id}/intents/{intent}/examples",
            &params.workspace_id,
            &params.intent,
        )?;
        self.service.send_json(params.list.apply_query(request)).await
    }

    pub async fn create_example(&self, params: &ExampleParams) -> WatsonResult<Value> {
        self.service.send_json(create_example_request(params)?).await
    }

    pub async fn get_example(&self, params: &ExampleParams) -> WatsonResult<Value> {
        self.service.send_json(example_request(Method::GET, params)?).await
    }

    pub async fn update_example(&self, params: &UpdateExampleParams) -> WatsonResult<Value> {
        self.service.send_json(update_example_request(params)?).await
    }

    pub async fn delete_example(&self, params: &ExampleParams) -> WatsonResult<Value> {
        self.service.send_empty(example_request(Method::DELETE, params)?).await
    }

    // -------------------------------------------------------------------------
    // Counterexamples
    // -------------------------------------------------------------------------

    pub async fn get_counter_examples(&self, workspace_id: &str, list: &ListParams) -> WatsonResult<Value> {
        let request = workspace_request(
            Method::GET,
            "/v1/workspaces/{workspace_id}/counterexamples",
            workspace_id,
        )?;
        self.service.send_json(list.apply_query(request)).await
    }

    pub async fn create_counter_example(&self, params: &CounterExampleParams) -> WatsonResult<Value> {
        self.service.send_json(create_counter_example_request(params)?).await
    }

    pub async fn get_counter_example(&self, params: &CounterExampleParams) -> WatsonResult<Value> {
        self.service
            .send_json(counter_example_request(Method::GET, params)?)
            .await
    }

    pub async fn update_counter_example(&self, params: &UpdateCounterExampleParams) -> WatsonResult<Value> {
        self.service.send_json(update_counter_example_request(params)?).await
    }

    pub async fn delete_counter_example(&self, params: &CounterExampleParams) -> WatsonResult<Value> {
        self.service
            .send_empty(counter_example_request(Method::DELETE, params)?)
            .await
    }

    // -------------------------------------------------------------------------
    // Entities
    // -------------------------------------------------------------------------

    pub async fn get_entities(&self, params: &GetEntitiesParams) -> WatsonResult<Value> {
        let request = workspace_request(Method::GET, "/v1/workspaces/{workspace_id}/entities", &params.workspace_id)?
            .query_opt("export", params.export);
        self.service.send_json(params.list.apply_query(request)).await
    }

    pub async fn create_entity(&self, params: &CreateEntityParams) -> WatsonResult<Value> {
        required(&[
            ("workspace_id", params.workspace_id.as_str()),
            ("entity", params.entity.as_str()),
        ])?;
        let request = ApiRequest::post("/v1/workspaces/{workspace_id}/entities")
            .path_param("workspace_id", params.workspace_id.as_str())
            .json(serde_json::to_value(params)?);
        self.service.send_json(request).await
    }

    pub async fn get_entity(&self, params: &GetEntityParams) -> WatsonResult<Value> {
        let request = entity_request(
            Method::GET,
            "/v1/workspaces/{workspace_id}/entities/{entity}",
            &params.workspace_id,
            &params.entity,
        )?
        .query_opt("export", params.export);
        self.service.send_json(request).await
    }

    pub async fn update_entity(&self, params: &UpdateEntityParams) -> WatsonResult<Value> {
        self.service.send_json(update_entity_request(params)?).await
    }

    pub async fn delete_entity(&self, workspace_id: &str, entity: &str) -> WatsonResult<Value> {
        let request = entity_request(
            Method::DELETE,
            "/v1/workspaces/{workspace_id}/entities/{entity}",
            workspace_id,
            entity,
        )?;
        self.service.send_empty(request).await
    }

    // -------------------------------------------------------------------------
    // Entity values
    // -------------------------------------------------------------------------

    pub async fn get_values(&self, params: &GetValuesParams) -> WatsonResult<Value> {
        let request = entity_request(
            Method::GET,
            "/v1/workspaces/{workspace_id}/entities/{entity}/values",
            &params.workspace_id,
            &params.entity,
        )?
        .query_opt("export", params.export);
        self.service.send_json(params.list.apply_query(request)).await
    }

    pub async fn create_value(&self, params: &CreateValueParams) -> WatsonResult<Value> {
        self.service.send_json(create_value_request(params)?).await
    }

    pub async fn get_value(&self, params: &GetValueParams) -> WatsonResult<Value> {
        let request = value_request(Method::GET, &params.workspace_id, &params.entity, &params.value)?
            .query_opt("export", params.export);
        self.service.send_json(request).await
    }

    pub async fn update_value(&self, params: &UpdateValueParams) -> WatsonResult<Value> {
        self.service.send_json(update_value_request(params)?).await
    }

    pub async fn delete_value(&self, workspace_id: &str, entity: &str, value: &str) -> WatsonResult<Value> {
        let request = value_request(Method::DELETE, workspace_id, entity, value)?;
        self.service.send_empty(request).await
    }

    // -------------------------------------------------------------------------
    // Logs
    // -------------------------------------------------------------------------

    pub async fn list_logs(&self, params: &ListLogsParams) -> WatsonResult<Value> {
        self.service.send_json(list_logs_request(params)?).await
    }
}
