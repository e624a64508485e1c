#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use apiform::spec::{
    fetch_spec, load_spec_file, resolve_node, resolve_ref, ApiSpec, BodyEncoding, LoadError,
    ParameterLocation,
};
use common::mock_server::{self, Reply};
use common::temp_files;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

const YAML_SPEC: &str = r#"openapi: 3.1.0
info:
  title: Inventory
  version: "2.0"
tags:
  - name: items
    description: Stock items
  - description: tag without a name
components:
  parameters:
    IdParam:
      name: id
      in: path
      required: true
      schema: { type: string }
  schemas:
    Item:
      type: object
      required: [sku]
      properties:
        sku: { type: string }
        qty: { type: integer, default: 1 }
  requestBodies:
    ItemBody:
      required: true
      content:
        application/json; charset=utf-8:
          schema:
            $ref: '#/components/schemas/Item'
paths:
  /items/{id}:
    parameters:
      - $ref: '#/components/parameters/IdParam'
    put:
      tags: [items, extra]
      operationId: update_item
      parameters:
        - name: dry_run
          in: query
          schema: { type: boolean }
        - $ref: '#/components/parameters/Missing'
      requestBody:
        $ref: '#/components/requestBodies/ItemBody'
    x-internal:
      summary: ignored
  /items:
    get:
      tags: [items]
      operationId: list_items
    post:
      tags: [Items]
      requestBody:
        content:
          text/plain:
            schema: { type: string }
  /ping:
    head: {}
"#;

#[test]
fn test_load_yaml_file() {
    let path = temp_files::create_temp_yaml(YAML_SPEC);
    let spec = load_spec_file(&path).unwrap();

    assert_eq!(spec.title.as_deref(), Some("Inventory"));
    assert_eq!(spec.version.as_deref(), Some("2.0"));
    // same lowercase name: stable order of the grouping keys
    assert_eq!(spec.tags(), vec!["Items", "items", "default"]);
    assert_eq!(spec.tag_description("items"), Some("Stock items"));
    assert!(spec.tag_definitions.contains_key("unknown_tag_1"));

    // unresolved parameter reference reported, the rest kept
    assert_eq!(spec.notices.len(), 1);
    assert_eq!(spec.notices[0].kind, "unresolved_ref");

    let update = spec.find_endpoint("update_item").unwrap();
    assert_eq!(update.tag, "items");
    assert_eq!(update.id.as_str(), "items_PUT__items_id");
    let names: Vec<(&str, ParameterLocation)> = update
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.location))
        .collect();
    assert_eq!(
        names,
        vec![("id", ParameterLocation::Path), ("dry_run", ParameterLocation::Query)]
    );

    let body = update.request_body(&spec.document).unwrap().unwrap();
    assert_eq!(body.encoding, BodyEncoding::Json);
    assert!(body.required);
    assert_eq!(body.content_type, "application/json; charset=utf-8");
    assert_eq!(body.schema.unwrap()["required"], json!(["sku"]));

    let plain = spec.find_endpoint("POST /items").unwrap();
    assert_eq!(plain.tag, "Items");
    assert_eq!(plain.request_body(&spec.document).unwrap(), None);
    assert!(plain.has_request_body());

    assert!(spec.find_endpoint("HEAD /ping").is_some());
    assert_eq!(spec.endpoints().count(), 4);
    temp_files::cleanup_temp_files(&[path]);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_spec_file(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn test_invalid_json_file_is_parse_error() {
    let path = temp_files::create_temp_json("{\"openapi\": ");
    let err = load_spec_file(&path).unwrap_err();
    match err {
        LoadError::Parse { snippet, .. } => assert_eq!(snippet, "{\"openapi\": "),
        other => panic!("expected parse error, got {other:?}"),
    }
    temp_files::cleanup_temp_files(&[path]);
}

#[test]
fn test_fetch_uses_json_location() {
    let doc = json!({"openapi": "3.0.0", "info": {"title": "Remote", "version": "1"}, "paths": {}});
    let server = mock_server::start(vec![Reply::json(200, doc)]);

    let spec = fetch_spec(&server.base_url, "/api/v1/spec.json", Duration::from_secs(5)).unwrap();
    assert_eq!(server.next_request().target, "/api/v1/spec.json");
    assert_eq!(spec.title.as_deref(), Some("Remote"));
    assert!(spec.groups.is_empty());
    assert_eq!(spec.source, format!("{}/api/v1/spec.json", server.base_url));
}

#[test]
fn test_fetch_non_json_body_is_parse_error() {
    let server = mock_server::start(vec![Reply::text(200, "<html>hello</html>")]);
    let err = fetch_spec(&server.base_url, "openapi.json", Duration::from_secs(5)).unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }));
    assert!(err.to_string().contains("<html>hello</html>"));
}

#[test]
fn test_fetch_timeout() {
    let server = mock_server::start(vec![Reply::json(200, json!({})).delayed(Duration::from_secs(3))]);
    let err = fetch_spec(&server.base_url, "openapi.json", Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, LoadError::Timeout { secs: 1, .. }));
}

#[test]
fn test_non_object_document_rejected() {
    let err = ApiSpec::from_value(json!(["not", "a", "spec"]), "inline").unwrap_err();
    assert_eq!(err, LoadError::NotAnObject { source: "inline".into() });
}

#[test]
fn test_colliding_ids_get_suffix() {
    let doc = json!({
        "paths": {
            "/x{y}": {"get": {"tags": ["t"]}},
            "/xy": {"get": {"tags": ["t"]}}
        }
    });
    let spec = ApiSpec::from_value(doc, "inline").unwrap();
    let mut ids: Vec<&str> = spec.groups["t"].iter().map(|e| e.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["t_GET__xy", "t_GET__xy_2"]);
}

#[test]
fn test_reference_resolution() {
    let root = json!({
        "components": {"schemas": {
            "a/b": {"type": "string"},
            "Alias": {"$ref": "#/components/schemas/Target"},
            "Target": {"type": "integer"},
            "Loop": {"$ref": "#/components/schemas/Loop"}
        }}
    });
    assert_eq!(
        resolve_ref(&root, "#/components/schemas/a~1b"),
        Some(&json!({"type": "string"}))
    );
    assert_eq!(resolve_ref(&root, "#/components/schemas/Nope"), None);
    assert_eq!(resolve_ref(&root, "other.json#/x"), None);

    let alias = json!({"$ref": "#/components/schemas/Alias"});
    assert_eq!(resolve_node(&root, &alias).unwrap(), &json!({"type": "integer"}));
    let looping = json!({"$ref": "#/components/schemas/Loop"});
    assert!(resolve_node(&root, &looping).is_err());
}
