// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! HTTP-level tests for the PowerDNS client, covering every verb and the
//! full status-code to error-taxonomy mapping.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::client::PdnsClient;
use super::{PdnsError, RecordOperations, RrSetChange, ZoneChanges, ZoneCreate, ZoneOperations};

fn client(server: &MockServer) -> PdnsClient {
    PdnsClient::new(&server.uri(), "localhost", "test-api-key").unwrap()
}

fn zone_body() -> serde_json::Value {
    json!({
        "id": "example1.org.",
        "name": "example1.org.",
        "kind": "Native",
        "serial": 2024010101u32,
        "notified_serial": 2024010101u32,
        "edited_serial": 2024010101u32,
        "masters": [],
        "dnssec": false,
        "catalog": "catalog.example1.org.",
        "soa_edit_api": "DEFAULT",
        "url": "/api/v1/servers/localhost/zones/example1.org."
    })
}

#[tokio::test]
async fn test_get_zone_parses_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/servers/localhost/zones/example1.org."))
        .and(header("X-API-Key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zone_body()))
        .mount(&server)
        .await;

    let zone = client(&server).get_zone("example1.org.").await.unwrap();
    assert_eq!(zone.name.as_deref(), Some("example1.org."));
    assert_eq!(zone.kind.as_deref(), Some("Native"));
    assert_eq!(zone.serial, Some(2024010101));
    assert_eq!(zone.soa_edit_api.as_deref(), Some("DEFAULT"));
}

#[tokio::test]
async fn test_get_zone_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/servers/localhost/zones/absent.org."))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Not Found"})))
        .mount(&server)
        .await;

    let err = client(&server).get_zone("absent.org.").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_create_zone_returns_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/servers/localhost/zones"))
        .and(body_partial_json(json!({
            "name": "example1.org.",
            "kind": "Native",
            "nameservers": ["ns1.example1.org.", "ns2.example1.org."],
            "dnssec": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(zone_body()))
        .mount(&server)
        .await;

    let create = ZoneCreate {
        name: "example1.org.".to_string(),
        kind: "Native".to_string(),
        nameservers: vec![
            "ns1.example1.org.".to_string(),
            "ns2.example1.org.".to_string(),
        ],
        catalog: Some("catalog.example1.org.".to_string()),
        soa_edit_api: Some("DEFAULT".to_string()),
        dnssec: false,
    };
    let zone = client(&server).create_zone(&create).await.unwrap();
    assert_eq!(zone.serial, Some(2024010101));
}

#[tokio::test]
async fn test_create_zone_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/servers/localhost/zones"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"error": "Domain 'example1.org.' already exists"})),
        )
        .mount(&server)
        .await;

    let create = ZoneCreate {
        name: "example1.org.".to_string(),
        kind: "Native".to_string(),
        nameservers: vec!["ns1.example1.org.".to_string()],
        catalog: None,
        soa_edit_api: None,
        dnssec: false,
    };
    let err = client(&server).create_zone(&create).await.unwrap_err();
    assert!(matches!(err, PdnsError::Conflict(_)));
}

#[tokio::test]
async fn test_update_zone_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/servers/localhost/zones/example1.org."))
        .and(body_partial_json(json!({"kind": "Master", "soa_edit_api": "EPOCH"})))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let changes = ZoneChanges {
        kind: "Master".to_string(),
        catalog: Some(String::new()),
        soa_edit_api: Some("EPOCH".to_string()),
    };
    client(&server)
        .update_zone("example1.org.", &changes)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_zone_not_found_is_structured() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/servers/localhost/zones/absent.org."))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Not Found"})))
        .mount(&server)
        .await;

    let err = client(&server).delete_zone("absent.org.").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_zone_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/servers/localhost/zones/example1.org."))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client(&server).delete_zone("example1.org.").await.unwrap();
}

#[tokio::test]
async fn test_get_rrsets_filters_by_query() {
    let server = MockServer::start().await;
    let mut body = zone_body();
    body["rrsets"] = json!([
        {
            "name": "test.example1.org.",
            "type": "A",
            "ttl": 300,
            "records": [
                {"content": "127.0.0.1", "disabled": false},
                {"content": "127.0.0.2", "disabled": false}
            ],
            "comments": []
        }
    ]);
    Mock::given(method("GET"))
        .and(path("/api/v1/servers/localhost/zones/example1.org."))
        .and(query_param("rrset_name", "test.example1.org."))
        .and(query_param("rrset_type", "A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let rrsets = client(&server)
        .get_rrsets("example1.org.", "test.example1.org.", "A")
        .await
        .unwrap();
    assert_eq!(rrsets.len(), 1);
    assert_eq!(rrsets[0].records.len(), 2);
    assert_eq!(rrsets[0].records[0].content, "127.0.0.1");
}

#[tokio::test]
async fn test_replace_rrset_sends_replace_changetype() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/servers/localhost/zones/example1.org."))
        .and(body_partial_json(json!({
            "rrsets": [{
                "name": "test.example1.org.",
                "type": "A",
                "ttl": 300,
                "changetype": "REPLACE",
                "records": [
                    {"content": "127.0.0.1", "disabled": false}
                ],
                "comments": [
                    {"content": "managed records", "account": "pdns-operator"}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let change = RrSetChange {
        name: "test.example1.org.".to_string(),
        rtype: "A".to_string(),
        ttl: 300,
        records: vec!["127.0.0.1".to_string()],
        comment: Some("managed records".to_string()),
    };
    client(&server)
        .replace_rrset("example1.org.", &change)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_replace_rrset_validation_message_verbatim() {
    let server = MockServer::start().await;
    let message = "Record test.example1.org./AA: unknown type given";
    Mock::given(method("PATCH"))
        .and(path("/api/v1/servers/localhost/zones/example1.org."))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"error": message})))
        .mount(&server)
        .await;

    let change = RrSetChange {
        name: "test.example1.org.".to_string(),
        rtype: "AA".to_string(),
        ttl: 300,
        records: vec!["127.0.0.1".to_string()],
        comment: None,
    };
    let err = client(&server)
        .replace_rrset("example1.org.", &change)
        .await
        .unwrap_err();
    match err {
        PdnsError::Validation(msg) => assert_eq!(msg, message),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_rrset_sends_delete_changetype() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/servers/localhost/zones/example1.org."))
        .and(body_partial_json(json!({
            "rrsets": [{
                "name": "test.example1.org.",
                "type": "A",
                "changetype": "DELETE",
                "records": []
            }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client(&server)
        .delete_rrset("example1.org.", "test.example1.org.", "A")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_transport_error_on_unreachable_backend() {
    // Port 9 is discard; nothing listens there in the test environment
    let client = PdnsClient::new("http://127.0.0.1:9", "localhost", "key").unwrap();
    let err = client.get_zone("example1.org.").await.unwrap_err();
    assert!(matches!(err, PdnsError::Transport(_)));
}
