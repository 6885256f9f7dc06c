//! Conversation request parameters.
//!
//! Path identifiers are `#[serde(skip)]`; everything else serializes straight
//! into the request body, with unset options left out.

use serde::Serialize;
use serde_json::Value;

use crate::core::service::ApiRequest;

// =============================================================================
// Shared
// =============================================================================

/// Pagination for list operations.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub page_limit: Option<u32>,
    pub include_count: Option<bool>,
    /// Attribute to sort by, prefix with `-` for descending order.
    pub sort: Option<String>,
    pub cursor: Option<String>,
}

impl ListParams {
    pub(crate) fn apply_query(&self, request: ApiRequest) -> ApiRequest {
        request
            .query_opt("page_limit", self.page_limit)
            .query_opt("include_count", self.include_count)
            .query_opt("sort", self.sort.as_deref())
            .query_opt("cursor", self.cursor.as_deref())
    }
}

/// An intent example, as sent inside intent payloads.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExampleText {
    pub text: String,
}

impl ExampleText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// An intent with its examples, as sent inside workspace payloads.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntentDefinition {
    pub intent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ExampleText>,
}

/// An entity value with its synonyms.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValueDefinition {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
}

/// An entity with its values, as sent inside workspace payloads.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityDefinition {
    pub entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<ValueDefinition>,
}

// =============================================================================
// Message
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageParams {
    #[serde(skip)]
    pub workspace_id: String,
    /// User input, e.g. `{"text": "Turn on the lights"}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_intents: Option<bool>,
    /// Context returned by the previous turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intents: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

// =============================================================================
// Workspaces
// =============================================================================

/// Body of `create_workspace` and `update_workspace`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkspaceParams {
    /// Ignored by `create_workspace`.
    #[serde(skip)]
    pub workspace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intents: Option<Vec<IntentDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<EntityDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterexamples: Option<Vec<ExampleText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialog_nodes: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct GetWorkspaceParams {
    pub workspace_id: String,
    /// Include intents, entities and dialog nodes.
    pub export: Option<bool>,
}

// =============================================================================
// Intents and examples
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct GetIntentsParams {
    pub workspace_id: String,
    pub export: Option<bool>,
    pub list: ListParams,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateIntentParams {
    #[serde(skip)]
    pub workspace_id: String,
    pub intent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<ExampleText>>,
}

#[derive(Debug, Clone, Default)]
pub struct GetIntentParams {
    pub workspace_id: String,
    pub intent: String,
    pub export: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateIntentParams {
    #[serde(skip)]
    pub workspace_id: String,
    /// Current name of the intent.
    #[serde(skip)]
    pub old_intent: String,
    /// New name, when renaming.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<ExampleText>>,
}

#[derive(Debug, Clone, Default)]
pub struct GetExamplesParams {
    pub workspace_id: String,
    pub intent: String,
    pub list: ListParams,
}

/// Identifies one example of an intent (`create_example`, `get_example`,
/// `delete_example`).
#[derive(Debug, Clone, Default)]
pub struct ExampleParams {
    pub workspace_id: String,
    pub intent: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateExampleParams {
    pub workspace_id: String,
    pub intent: String,
    pub old_text: String,
    pub text: Option<String>,
}

/// Identifies one counterexample (`create`, `get`, `delete`).
#[derive(Debug, Clone, Default)]
pub struct CounterExampleParams {
    pub workspace_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCounterExampleParams {
    pub workspace_id: String,
    pub old_text: String,
    pub text: Option<String>,
}

// =============================================================================
// Entities and values
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct GetEntitiesParams {
    pub workspace_id: String,
    pub export: Option<bool>,
    pub list: ListParams,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateEntityParams {
    #[serde(skip)]
    pub workspace_id: String,
    pub entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<ValueDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_match: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct GetEntityParams {
    pub workspace_id: String,
    pub entity: String,
    pub export: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateEntityParams {
    #[serde(skip)]
    pub workspace_id: String,
    #[serde(skip)]
    pub old_entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<ValueDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_match: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct GetValuesParams {
    pub workspace_id: String,
    pub entity: String,
    pub export: Option<bool>,
    pub list: ListParams,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateValueParams {
    #[serde(skip)]
    pub workspace_id: String,
    #[serde(skip)]
    pub entity: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct GetValueParams {
    pub workspace_id: String,
    pub entity: String,
    pub value: String,
    pub export: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateValueParams {
    #[serde(skip)]
    pub workspace_id: String,
    #[serde(skip)]
    pub entity: String,
    #[serde(skip)]
    pub old_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,
}

// =============================================================================
// Logs
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct ListLogsParams {
    pub workspace_id: String,
    pub sort: Option<String>,
    /// Search filter, e.g. `response.intents:intent::hello`.
    pub filter: Option<String>,
    pub page_limit: Option<u32>,
    pub cursor: Option<String>,
}
