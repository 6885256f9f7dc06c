//! Discovery REST calls against a wiremock server.

mod mock_providers;

use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mock_providers::mock_config;
use watson_sdk::WatsonError;
use watson_sdk::core::discovery::{
    AddDocumentParams, CreateCollectionParams, Discovery, DocumentFile, QueryParams,
    VERSION_DATE_2017_09_01,
};

const API: &str = "/discovery/api";
const ENV: &str = "/discovery/api/v1/environments/env-1";

fn client(server: &MockServer) -> Discovery {
    Discovery::new(
        mock_config(format!("{}{API}", server.uri())).with_version_date(VERSION_DATE_2017_09_01),
    )
    .unwrap()
}

#[tokio::test]
async fn test_query_collection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{ENV}/collections/col-1/query")))
        .and(query_param("version", "2017-09-01"))
        .and(query_param("natural_language_query", "who is ibm"))
        .and(query_param("return", "title,url"))
        .and(query_param("count", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matching_results": 24,
            "results": [{"id": "doc-1", "score": 1.7, "title": "IBM history"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .query(&QueryParams {
            environment_id: "env-1".into(),
            collection_id: "col-1".into(),
            natural_language_query: Some("who is ibm".into()),
            return_fields: Some(vec!["title".into(), "url".into()]),
            count: Some(5),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(response["matching_results"], 24);
    assert_eq!(response["results"][0]["id"], "doc-1");
}

#[tokio::test]
async fn test_add_document_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{ENV}/collections/col-1/documents")))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains(r#"name="file"; filename="report.html""#))
        .and(body_string_contains("<h1>Quarterly report</h1>"))
        .and(body_string_contains(r#"name="metadata""#))
        .and(body_string_contains(r#""author":"finance""#))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "document_id": "doc-42",
            "status": "processing"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .add_document(&AddDocumentParams {
            environment_id: "env-1".into(),
            collection_id: "col-1".into(),
            file: Some(DocumentFile::new("report.html", "<h1>Quarterly report</h1>")),
            metadata: Some(json!({"author": "finance"})),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(response["document_id"], "doc-42");
    assert_eq!(response["status"], "processing");
}

#[tokio::test]
async fn test_create_collection_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{ENV}/collections")))
        .and(body_json(json!({
            "name": "news",
            "language": "en"
        })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": 409,
            "error": "Conflict",
            "description": "Collection already exists"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .create_collection(&CreateCollectionParams {
            environment_id: "env-1".into(),
            name: "news".into(),
            language_code: Some("en".into()),
            ..Default::default()
        })
        .await
        .unwrap_err();

    match err {
        WatsonError::Service { code, description, .. } => {
            assert_eq!(code, 409);
            assert_eq!(description.as_deref(), Some("Collection already exists"));
        }
        other => panic!("Expected Service error, got {other:?}"),
    }
}
