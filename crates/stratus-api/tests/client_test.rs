// Integration tests for `Client` resource operations, using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stratus_api::{ApiConfig, Client, Credentials, Error, InterfaceRef};
use stratus_model::{Block, BlockType, InterfaceKind, MappingType};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> ApiConfig {
    ApiConfig {
        realm: "acme".to_owned(),
        token: SecretString::from("test-token".to_owned()),
        data_api_url: format!("{}/data", server.uri()),
        flow_api_url: format!("{}/flow", server.uri()),
        pairing_api_url: format!("{}/pairing", server.uri()),
        registry_api_url: format!("{}/registry", server.uri()),
    }
}

async fn setup() -> (MockServer, Client) {
    let server = MockServer::start().await;
    let client = Client::with_http(&config_for(&server), reqwest::Client::new());
    (server, client)
}

async fn received_request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

// ── Interfaces / triggers ───────────────────────────────────────────

#[tokio::test]
async fn test_list_interface_names_unwraps_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/registry/v1/acme/interfaces"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": ["org.stratus.Sampling", "org.stratus.Geo"]
        })))
        .mount(&server)
        .await;

    let names = client.list_interface_names().await.unwrap();
    assert_eq!(names, vec!["org.stratus.Sampling", "org.stratus.Geo"]);
}

#[tokio::test]
async fn test_get_interface_returns_domain_object() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/registry/v1/acme/interfaces/org.stratus.Sampling/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "interface_name": "org.stratus.Sampling",
                "version_major": 1,
                "version_minor": 2,
                "type": "datastream",
                "ownership": "device",
                "mappings": [
                    { "endpoint": "/%{sensor_id}/value", "type": "double", "explicit_timestamp": true }
                ]
            }
        })))
        .mount(&server)
        .await;

    let interface = client.get_interface("org.stratus.Sampling", 1).await.unwrap();

    assert_eq!(interface.name, "org.stratus.Sampling");
    assert_eq!(interface.kind, InterfaceKind::Datastream);
    assert_eq!(interface.mappings[0].value_type, MappingType::Double);
    assert!(interface.mappings[0].explicit_timestamp);
}

#[tokio::test]
async fn test_install_trigger_wraps_request_in_data_envelope() {
    let (server, client) = setup().await;

    let trigger_json = json!({
        "name": "on-connect",
        "action": { "http_url": "https://hooks.example.com", "http_method": "post" },
        "simple_triggers": [
            { "type": "device_trigger", "on": "device_connected" }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/registry/v1/acme/triggers"))
        .and(body_partial_json(json!({ "data": { "name": "on-connect" } })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "data": trigger_json.clone() })),
        )
        .mount(&server)
        .await;

    let dto: stratus_model::TriggerDto = serde_json::from_value(trigger_json).unwrap();
    let trigger = stratus_model::Trigger::try_from(dto).unwrap();

    let installed = client.install_trigger(&trigger).await.unwrap();
    assert_eq!(installed, trigger);
}

// ── Devices / pagination ────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_parses_next_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/data/v1/acme/devices"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "dev-1", "connected": true },
                { "id": "dev-2" }
            ],
            "links": { "next": "/v1/acme/devices?from_token=abc&limit=2" }
        })))
        .mount(&server)
        .await;

    let page = client.list_devices(2, None).await.unwrap();

    assert_eq!(page.devices.len(), 2);
    assert_eq!(page.devices[0].id, "dev-1");
    assert!(page.devices[0].connected);
    assert_eq!(page.next_token.as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_list_devices_without_link_yields_no_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/data/v1/acme/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": []
        })))
        .mount(&server)
        .await;

    let page = client.list_devices(100, None).await.unwrap();
    assert!(page.devices.is_empty());
    assert_eq!(page.next_token, None);
}

#[tokio::test]
async fn test_list_devices_forwards_page_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/data/v1/acme/devices"))
        .and(query_param("from_token", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    client.list_devices(100, Some("abc")).await.unwrap();
}

#[tokio::test]
async fn test_set_device_alias_uses_merge_patch() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/data/v1/acme/devices/dev-1"))
        .and(header("content-type", "application/merge-patch+json"))
        .and(body_partial_json(json!({
            "data": { "aliases": { "display_name": "hall-sensor" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "dev-1",
                "aliases": { "display_name": "hall-sensor" }
            }
        })))
        .mount(&server)
        .await;

    let device = client
        .set_device_alias("dev-1", "display_name", "hall-sensor")
        .await
        .unwrap();
    assert_eq!(device.aliases["display_name"], "hall-sensor");
}

// ── Device data tree ────────────────────────────────────────────────

#[tokio::test]
async fn test_data_tree_resolves_interface_by_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/data/v1/acme/devices/dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "dev-1",
                "introspection": { "org.stratus.Sampling": { "major": 1, "minor": 0 } }
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/registry/v1/acme/interfaces/org.stratus.Sampling/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "interface_name": "org.stratus.Sampling",
                "version_major": 1,
                "version_minor": 0,
                "type": "datastream",
                "ownership": "device",
                "mappings": [ { "endpoint": "/%{sensor_id}/value", "type": "double" } ]
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/v1/acme/devices/dev-1/interfaces/org.stratus.Sampling"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "kitchen": { "value": 21.5 } }
        })))
        .mount(&server)
        .await;

    let tree = client
        .get_device_data_tree("dev-1", InterfaceRef::Name("org.stratus.Sampling".to_owned()))
        .await
        .unwrap();

    assert_eq!(
        tree.get("/kitchen/value").and_then(|node| node.value()),
        Some(&json!(21.5))
    );
}

#[tokio::test]
async fn test_data_tree_fails_for_uninstalled_interface() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/data/v1/acme/devices/dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "dev-1", "introspection": {} }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client
        .get_device_data_tree("dev-1", InterfaceRef::Name("org.stratus.Missing".to_owned()))
        .await;

    assert!(
        matches!(result, Err(Error::InterfaceNotInstalled { .. })),
        "expected InterfaceNotInstalled, got: {result:?}"
    );
    // Only the introspection fetch went out.
    assert_eq!(received_request_count(&server).await, 1);
}

// ── Groups ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_group_names_are_double_encoded() {
    let (server, client) = setup().await;

    // "my/group%" -> "my%2Fgroup%25" -> "my%252Fgroup%2525"
    Mock::given(method("POST"))
        .and(path("/data/v1/acme/groups/my%252Fgroup%2525/devices"))
        .and(body_partial_json(json!({ "data": { "device_id": "dev-1" } })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client.add_device_to_group("my/group%", "dev-1").await.unwrap();
}

#[tokio::test]
async fn test_group_membership_rejects_empty_identifiers_without_requests() {
    let (server, client) = setup().await;

    let err = client.add_device_to_group("", "dev-1").await.unwrap_err();
    assert!(err.is_precondition(), "unexpected error: {err:?}");

    let err = client.add_device_to_group("floor-1", "").await.unwrap_err();
    assert!(err.is_precondition(), "unexpected error: {err:?}");

    let err = client.remove_device_from_group("", "dev-1").await.unwrap_err();
    assert!(err.is_precondition(), "unexpected error: {err:?}");

    let err = client.remove_device_from_group("floor-1", "  ").await.unwrap_err();
    assert!(err.is_precondition(), "unexpected error: {err:?}");

    assert_eq!(received_request_count(&server).await, 0);
}

// ── Blocks ──────────────────────────────────────────────────────────

fn custom_block(name: &str) -> Block {
    Block {
        name: name.to_owned(),
        block_type: BlockType::ProducerConsumer,
        source: Some("filter { true }".to_owned()),
        schema: json!({}),
    }
}

#[tokio::test]
async fn test_list_blocks_merges_and_dedupes_by_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/flow/v1/acme/blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "name": "threshold", "type": "producer_consumer", "source": "filter { v > 1 }" },
                { "name": "http_source", "type": "producer", "source": "shadowing builtin" }
            ]
        })))
        .mount(&server)
        .await;

    let blocks = client.list_blocks().await.unwrap();

    let mut names: Vec<&str> = blocks.iter().map(|b| b.name.as_str()).collect();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total, "duplicate block names after merge");

    let http_source = blocks.iter().find(|b| b.name == "http_source").unwrap();
    assert!(http_source.source.is_none(), "built-in must win the name tie");
    assert!(blocks.iter().any(|b| b.name == "threshold"));
}

#[tokio::test]
async fn test_register_builtin_named_block_rejects_without_request() {
    let (server, client) = setup().await;

    let err = client.register_block(&custom_block("http_source")).await.unwrap_err();

    assert!(
        matches!(err, Error::BlockNameConflict { ref name } if name == "http_source"),
        "unexpected error: {err:?}"
    );
    assert_eq!(received_request_count(&server).await, 0);
}

#[tokio::test]
async fn test_delete_builtin_block_rejects_without_request() {
    let (server, client) = setup().await;

    let err = client.delete_block("http_sink").await.unwrap_err();

    assert!(
        matches!(err, Error::BuiltinBlock { ref name } if name == "http_sink"),
        "unexpected error: {err:?}"
    );
    assert_eq!(received_request_count(&server).await, 0);
}

#[tokio::test]
async fn test_delete_custom_block_issues_exactly_one_request() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/flow/v1/acme/blocks/threshold"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_block("threshold").await.unwrap();
    assert_eq!(received_request_count(&server).await, 1);
}

// ── Pairing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_register_device_returns_credentials_secret() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/pairing/v1/acme/agent/devices"))
        .and(body_partial_json(json!({ "data": { "hw_id": "dev-1" } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "credentials_secret": "shhh" }
        })))
        .mount(&server)
        .await;

    let secret = client.register_device("dev-1").await.unwrap();
    assert_eq!(secret, "shhh");
}

// ── Health / errors / credentials ───────────────────────────────────

#[tokio::test]
async fn test_health_probes_hit_all_four_planes() {
    let (server, client) = setup().await;

    for plane in ["registry", "data", "pairing", "flow"] {
        Mock::given(method("GET"))
            .and(path(format!("/{plane}/health")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    client.registry_health().await.unwrap();
    client.data_health().await.unwrap();
    client.pairing_health().await.unwrap();
    client.flow_health().await.unwrap();
}

#[tokio::test]
async fn test_error_detail_is_extracted_from_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/registry/v1/acme/triggers/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": { "detail": "Trigger not found" }
        })))
        .mount(&server)
        .await;

    let err = client.get_trigger("missing").await.unwrap_err();

    match err {
        Error::Api { status, ref message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Trigger not found");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
    assert!(client.get_trigger("missing").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_credential_update_rescopes_requests() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/data/v1/globex/devices"))
        .and(header("authorization", "Bearer other-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_credentials(Some(Credentials {
        realm: "globex".to_owned(),
        token: SecretString::from("other-token".to_owned()),
    }));

    client.list_devices(10, None).await.unwrap();
}
