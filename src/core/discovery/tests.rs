//! Unit tests for the Discovery client.

use super::*;
use crate::config::{ServiceConfig, ServiceKind};
use crate::core::service::testing::{RecordingTransport, TEST_URL, recording_service};
use crate::errors::WatsonError;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

fn discovery() -> (Discovery, Arc<RecordingTransport>) {
    let (service, transport) = recording_service(ServiceKind::Discovery);
    let discovery = Discovery::new(service.config().clone())
        .unwrap()
        .with_transport(transport.clone());
    (discovery, transport)
}

fn assert_missing(err: WatsonError, expected: &[&str]) {
    match err {
        WatsonError::MissingParameters(names) => assert_eq!(names, expected),
        other => panic!("Expected MissingParameters, got {other:?}"),
    }
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_version_date_required() {
    let config = ServiceConfig::new(TEST_URL).with_basic_auth("batman", "bruce-wayne");
    let err = Discovery::new(config).unwrap_err();
    assert!(err.to_string().contains("version_date"));
}

// =============================================================================
// Environments
// =============================================================================

#[tokio::test]
async fn test_get_environments() {
    let (discovery, transport) = discovery();
    transport.reply(200, r#"{"environments":[]}"#);

    discovery.get_environments(None).await.unwrap();
    let req = transport.last();
    assert_eq!(req.method, Method::GET);
    assert_eq!(req.url.as_str(), "http://ibm.com/v1/environments?version=2016-12-15");

    discovery.get_environments(Some("byod")).await.unwrap();
    assert_eq!(transport.last().path_and_query(), "/v1/environments?version=2016-12-15&name=byod");
}

#[tokio::test]
async fn test_environment_lifecycle() {
    let (discovery, transport) = discovery();
    transport.reply(200, r#"{"environment_id":"yes"}"#);

    let created = discovery
        .create_environment(&CreateEnvironmentParams {
            name: "new environment".into(),
            description: Some("my description".into()),
            size: None,
        })
        .await
        .unwrap();
    assert_eq!(created["environment_id"], "yes");
    let req = transport.last();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path_and_query(), "/v1/environments?version=2016-12-15");
    assert_eq!(req.json(), json!({"name": "new environment", "description": "my description"}));

    discovery.get_environment("env-guid").await.unwrap();
    assert_eq!(transport.last().path_and_query(), "/v1/environments/env-guid?version=2016-12-15");

    discovery
        .update_environment(&UpdateEnvironmentParams {
            environment_id: "env-guid".into(),
            name: Some("renamed".into()),
            description: None,
        })
        .await
        .unwrap();
    let req = transport.last();
    assert_eq!(req.method, Method::PUT);
    assert_eq!(req.json(), json!({"name": "renamed"}));

    discovery.delete_environment("env-guid").await.unwrap();
    let req = transport.last();
    assert_eq!(req.method, Method::DELETE);
    assert_eq!(req.path_and_query(), "/v1/environments/env-guid?version=2016-12-15");

    assert_missing(
        discovery
            .create_environment(&CreateEnvironmentParams::default())
            .await
            .unwrap_err(),
        &["name"],
    );
    assert_missing(discovery.get_environment("").await.unwrap_err(), &["environment_id"]);
}

// =============================================================================
// Configurations
// =============================================================================

#[tokio::test]
async fn test_configurations() {
    let (discovery, transport) = discovery();

    discovery.get_configurations("env-guid", None).await.unwrap();
    assert_eq!(
        transport.last().path_and_query(),
        "/v1/environments/env-guid/configurations?version=2016-12-15"
    );

    discovery.get_configuration("env-guid", "config-guid").await.unwrap();
    assert_eq!(
        transport.last().path_and_query(),
        "/v1/environments/env-guid/configurations/config-guid?version=2016-12-15"
    );

    let configuration = json!({"name": "my config", "enrichments": []});
    discovery
        .create_configuration(&CreateConfigurationParams {
            environment_id: "env-guid".into(),
            configuration: configuration.clone(),
        })
        .await
        .unwrap();
    let req = transport.last();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.json(), configuration);

    discovery
        .update_configuration(&UpdateConfigurationParams {
            environment_id: "env-guid".into(),
            configuration_id: "config-guid".into(),
            configuration: configuration.clone(),
        })
        .await
        .unwrap();
    assert_eq!(transport.last().method, Method::PUT);

    discovery.delete_configuration("env-guid", "config-guid").await.unwrap();
    assert_eq!(transport.last().method, Method::DELETE);

    assert_missing(
        discovery
            .create_configuration(&CreateConfigurationParams {
                environment_id: "env-guid".into(),
                ..Default::default()
            })
            .await
            .unwrap_err(),
        &["configuration"],
    );
    assert_missing(
        discovery
            .update_configuration(&UpdateConfigurationParams::default())
            .await
            .unwrap_err(),
        &["environment_id", "configuration_id", "configuration"],
    );
    assert_missing(
        discovery.get_configuration("", "").await.unwrap_err(),
        &["environment_id", "configuration_id"],
    );
}

#[tokio::test]
async fn test_configuration_preview() {
    let (discovery, transport) = discovery();
    transport.reply(200, r#"{"status":"completed","snapshots":[]}"#);

    discovery
        .test_configuration_in_environment(&TestConfigurationParams {
            environment_id: "env-guid".into(),
            configuration_id: Some("config-guid".into()),
            step: Some("html_output".into()),
            file: Some(DocumentFile::new("sample.html", "<html></html>")),
            ..Default::default()
        })
        .await
        .unwrap();

    let req = transport.last();
    assert_eq!(req.method, Method::POST);
    assert_eq!(
        req.path_and_query(),
        "/v1/environments/env-guid/preview?version=2016-12-15&configuration_id=config-guid&step=html_output"
    );
    assert!(req.header("content-type").unwrap().starts_with("multipart/form-data"));
}

// =============================================================================
// Collections
// =============================================================================

#[tokio::test]
async fn test_collections() {
    let (discovery, transport) = discovery();

    discovery.get_collections("env-guid", None).await.unwrap();
    assert_eq!(
        transport.last().path_and_query(),
        "/v1/environments/env-guid/collections?version=2016-12-15"
    );

    discovery.get_collection("env-guid", "col-guid").await.unwrap();
    assert_eq!(
        transport.last().path_and_query(),
        "/v1/environments/env-guid/collections/col-guid?version=2016-12-15"
    );

    discovery
        .create_collection(&CreateCollectionParams {
            environment_id: "env-guid".into(),
            name: "node-sdk-test".into(),
            description: Some("Test collection".into()),
            configuration_id: Some("config-guid".into()),
            language_code: Some("en_us".into()),
        })
        .await
        .unwrap();
    let req = transport.last();
    assert_eq!(req.method, Method::POST);
    assert_eq!(
        req.json(),
        json!({
            "name": "node-sdk-test",
            "description": "Test collection",
            "configuration_id": "config-guid",
            "language": "en_us"
        })
    );

    discovery
        .update_collection(&UpdateCollectionParams {
            environment_id: "env-guid".into(),
            collection_id: "col-guid".into(),
            name: "renamed".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let req = transport.last();
    assert_eq!(req.method, Method::PUT);
    assert_eq!(req.json(), json!({"name": "renamed"}));

    discovery.get_collection_fields("env-guid", "col-guid").await.unwrap();
    assert_eq!(
        transport.last().path_and_query(),
        "/v1/environments/env-guid/collections/col-guid/fields?version=2016-12-15"
    );

    discovery.delete_collection("env-guid", "col-guid").await.unwrap();
    assert_eq!(transport.last().method, Method::DELETE);

    assert_missing(
        discovery
            .create_collection(&CreateCollectionParams::default())
            .await
            .unwrap_err(),
        &["environment_id", "name"],
    );
    assert_missing(
        discovery
            .update_collection(&UpdateCollectionParams::default())
            .await
            .unwrap_err(),
        &["environment_id", "collection_id", "name"],
    );
}

// =============================================================================
// Documents
// =============================================================================

#[tokio::test]
async fn test_add_document() {
    let (discovery, transport) = discovery();
    transport.reply(202, r#"{"document_id":"doc-1","status":"processing"}"#);

    let result = discovery
        .add_document(&AddDocumentParams {
            environment_id: "env-guid".into(),
            collection_id: "col-guid".into(),
            file: Some(DocumentFile::new("sampleHtml.html", "<html><body>hi</body></html>")),
            metadata: Some(json!({"action": "testing"})),
            configuration_id: None,
        })
        .await
        .unwrap();
    assert_eq!(result["document_id"], "doc-1");

    let req = transport.last();
    assert_eq!(req.method, Method::POST);
    assert_eq!(
        req.path_and_query(),
        "/v1/environments/env-guid/collections/col-guid/documents?version=2016-12-15"
    );
    assert!(req.header("content-type").unwrap().starts_with("multipart/form-data; boundary="));
}

#[tokio::test]
async fn test_document_requires_file_or_metadata() {
    let (discovery, transport) = discovery();

    let err = discovery
        .add_document(&AddDocumentParams {
            environment_id: "env-guid".into(),
            collection_id: "col-guid".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_missing(err, &["file"]);

    let err = discovery
        .add_document(&AddDocumentParams::default())
        .await
        .unwrap_err();
    assert_missing(err, &["environment_id", "collection_id", "file"]);

    let err = discovery
        .update_document(&UpdateDocumentParams::default())
        .await
        .unwrap_err();
    assert_missing(err, &["environment_id", "collection_id", "document_id", "file"]);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_update_get_delete_document() {
    let (discovery, transport) = discovery();

    discovery
        .update_document(&UpdateDocumentParams {
            environment_id: "env-guid".into(),
            collection_id: "col-guid".into(),
            document_id: "document-guid".into(),
            metadata: Some(json!({"version": 2})),
            configuration_id: Some("config-guid".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let req = transport.last();
    assert_eq!(req.method, Method::POST);
    assert_eq!(
        req.path_and_query(),
        "/v1/environments/env-guid/collections/col-guid/documents/document-guid?version=2016-12-15&configuration_id=config-guid"
    );

    discovery.get_document("env-guid", "col-guid", "document-guid").await.unwrap();
    assert_eq!(transport.last().method, Method::GET);

    discovery.delete_document("env-guid", "col-guid", "document-guid").await.unwrap();
    let req = transport.last();
    assert_eq!(req.method, Method::DELETE);
    assert_eq!(
        req.path_and_query(),
        "/v1/environments/env-guid/collections/col-guid/documents/document-guid?version=2016-12-15"
    );

    assert_missing(
        discovery.delete_document("env-guid", "col-guid", "").await.unwrap_err(),
        &["document_id"],
    );
}

// =============================================================================
// Query
// =============================================================================

#[tokio::test]
async fn test_query() {
    let (discovery, transport) = discovery();
    transport.reply(200, r#"{"matching_results":0,"results":[]}"#);

    discovery
        .query(&QueryParams {
            environment_id: "env-guid".into(),
            collection_id: "col-guid".into(),
            filter: Some("yesplease".into()),
            count: Some(10),
            ..Default::default()
        })
        .await
        .unwrap();

    let req = transport.last();
    assert_eq!(req.method, Method::GET);
    assert_eq!(
        req.url.as_str(),
        "http://ibm.com/v1/environments/env-guid/collections/col-guid/query?version=2016-12-15&filter=yesplease&count=10"
    );
}

#[tokio::test]
async fn test_query_all_options_order() {
    let (discovery, transport) = discovery();

    discovery
        .query(&QueryParams {
            environment_id: "env-guid".into(),
            collection_id: "col-guid".into(),
            filter: Some("a".into()),
            query: Some("b".into()),
            natural_language_query: Some("who is ibm".into()),
            aggregation: Some("term(year)".into()),
            count: Some(5),
            return_fields: Some(vec!["title".into(), "url".into()]),
            offset: Some(5),
            sort: Some(vec!["-date".into(), "title".into()]),
            passages: Some(true),
            highlight: Some(false),
        })
        .await
        .unwrap();

    assert_eq!(
        transport.last().url.query(),
        Some(
            "version=2016-12-15&filter=a&query=b&natural_language_query=who+is+ibm&aggregation=term%28year%29&count=5&return=title%2Curl&offset=5&sort=-date%2Ctitle&passages=true&highlight=false"
        )
    );
}
