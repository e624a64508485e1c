#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use apiform::client::{ExecuteError, ResponseRecord};
use apiform::form::{BodyMode, FieldPath, FormEdit};
use apiform::runtime_config::ClientConfig;
use apiform::session::{Session, SessionError};
use apiform::spec::LoadError;
use common::fixtures::petstore;
use common::mock_server::{self, Reply};
use common::temp_files;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;

fn p(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

fn petstore_file() -> PathBuf {
    temp_files::create_temp_json(&petstore().to_string())
}

/// Session over HTTP against `base_url`, with the pet store loaded from disk
fn file_session(base_url: &str, timeout_secs: u64) -> (Session, PathBuf) {
    let config = ClientConfig {
        base_url: Some(base_url.to_string()),
        request_timeout_secs: timeout_secs,
        ..ClientConfig::default()
    };
    let mut session = Session::new(config).unwrap();
    let file = petstore_file();
    session.load(Some(file.to_str().unwrap())).unwrap();
    (session, file)
}

#[test]
fn test_load_from_base_url_fetches_document() {
    let server = mock_server::start(vec![Reply::json(200, petstore())]);
    let mut session = Session::new(ClientConfig::default()).unwrap();

    let notices = session.load(Some(&format!("{}/", server.base_url))).unwrap();
    let request = server.next_request();

    assert_eq!(request.method, "GET");
    assert_eq!(request.target, "/openapi.json");
    assert_eq!(request.header("accept"), Some("application/json"));
    assert!(notices.is_empty(), "unexpected notices: {notices:?}");
    assert_eq!(session.base_url(), Some(server.base_url.as_str()));
    assert_eq!(session.tags().unwrap(), vec!["auth", "pets", "default"]);
    assert_eq!(session.active_tag(), Some("auth"));
    assert_eq!(session.schemes().len(), 2);

    let spec = session.spec().unwrap();
    assert_eq!(spec.title.as_deref(), Some("Pet Store"));
    assert_eq!(spec.tag_description("pets"), Some("Everything about pets"));
}

#[test]
fn test_load_failure_status_reported() {
    let server = mock_server::start(vec![Reply::text(404, "nope")]);
    let mut session = Session::new(ClientConfig::default()).unwrap();

    let err = session.load(Some(&server.base_url)).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Load(LoadError::Status { status: 404, .. })
    ));
    assert!(session.spec().is_none());
}

#[test]
fn test_load_without_source_or_config_is_blank() {
    let mut session = Session::new(ClientConfig::default()).unwrap();
    let err = session.load(None).unwrap_err();
    assert!(matches!(err, SessionError::Load(LoadError::BlankSource)));
    assert_eq!(err.to_string(), "please enter the API base URL");
}

#[test]
fn test_file_without_servers_warns_about_base_url() {
    let file = petstore_file();
    let mut session = Session::new(ClientConfig::default()).unwrap();
    let notices = session.load(Some(file.to_str().unwrap())).unwrap();
    assert!(notices.iter().any(|n| n.kind == "no_base_url"));

    session.open("health").unwrap();
    let err = session.preview(None).unwrap_err();
    assert!(err.to_string().contains("no base URL configured"));
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_reload_resets_everything() {
    let (mut session, file) = file_session("http://api.test", 5);
    session.open("createPet").unwrap();
    session
        .edit(
            None,
            &FormEdit::SetValue {
                path: p("name"),
                input: "rex".into(),
            },
        )
        .unwrap();
    session.set_credential("bearerAuth", "tok").unwrap();
    assert!(!session.state().is_empty());
    assert!(session.auth_status().is_some());

    session.load(Some(file.to_str().unwrap())).unwrap();
    assert!(session.state().is_empty());
    assert!(session.credentials().is_empty());
    assert!(session.auth_status().is_none());
    assert!(session.active_endpoint().is_none());
    assert_eq!(session.base_url(), Some("http://api.test"));
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_json_body_sent_over_http() {
    let server = mock_server::start(vec![Reply::json(201, json!({"id": 9, "name": "rex"}))]);
    let (mut session, file) = file_session(&server.base_url, 5);
    session.open("createPet").unwrap();

    let edits = [
        FormEdit::SetValue {
            path: p("name"),
            input: "rex".into(),
        },
        FormEdit::SetIncluded {
            path: p("owner"),
            included: true,
        },
        FormEdit::SetValue {
            path: p("owner.name"),
            input: "ana".into(),
        },
        FormEdit::SetIncluded {
            path: p("vaccinations"),
            included: true,
        },
        FormEdit::AppendItem {
            path: p("vaccinations"),
        },
        FormEdit::SetValue {
            path: p("vaccinations[0].vaccine"),
            input: "rabies".into(),
        },
    ];
    for edit in &edits {
        session.edit(None, edit).unwrap();
    }
    assert!(session.set_override(None, r#"{"age": 3}"#).unwrap().is_empty());

    let outcome = session.send(None).unwrap();
    let request = server.next_request();

    assert_eq!(request.method, "POST");
    assert_eq!(request.target, "/pets");
    assert_eq!(request.header("content-type"), Some("application/json"));
    let sent: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        sent,
        json!({
            "name": "rex",
            "status": "available",
            "owner": {"name": "ana"},
            "vaccinations": [{"vaccine": "rabies"}],
            "age": 3
        })
    );

    assert_eq!(outcome.record.status(), 201);
    let stored = session.response(None).unwrap().unwrap();
    assert_eq!(stored.response().unwrap().json(), Some(&json!({"id": 9, "name": "rex"})));
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_raw_body_mode_sends_text_as_is() {
    let server = mock_server::start(vec![Reply::json(200, json!({}))]);
    let (mut session, file) = file_session(&server.base_url, 5);
    session.open("createPet").unwrap();
    session
        .set_raw_body(None, r#"{"name": "from raw", "extra": [1, 2]}"#)
        .unwrap();

    let screen = session.form(None).unwrap();
    assert_eq!(screen.mode, Some(BodyMode::Raw));
    assert!(screen.view.is_none());

    session.send(None).unwrap();
    let request = server.next_request();
    let sent: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(sent, json!({"name": "from raw", "extra": [1, 2]}));
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_invalid_raw_body_is_not_sent() {
    let (mut session, file) = file_session("http://api.test", 5);
    session.open("createPet").unwrap();
    session.set_raw_body(None, "{not json").unwrap();
    let err = session.send(None).unwrap_err();
    assert!(matches!(err, SessionError::Prepare(_)));
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_path_parameter_encoded() {
    let server = mock_server::start(vec![Reply::json(200, json!({"id": "a b"}))]);
    let (mut session, file) = file_session(&server.base_url, 5);
    session.set_param(Some("getPet"), "petId", "a b").unwrap();
    session.send(Some("getPet")).unwrap();
    assert_eq!(server.next_request().target, "/pets/a%20b");

    let err = session.set_param(Some("getPet"), "nope", "1").unwrap_err();
    assert!(matches!(err, SessionError::UnknownParameter { .. }));
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_same_parameter_name_in_two_locations() {
    let doc = json!({
        "openapi": "3.0.3",
        "info": {"title": "Items", "version": "1"},
        "paths": {"/items/{id}": {"get": {
            "operationId": "getItem",
            "parameters": [
                {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}},
                {"name": "id", "in": "query", "schema": {"type": "string"}}
            ]
        }}}
    });
    let file = temp_files::create_temp_json(&doc.to_string());
    let config = ClientConfig {
        base_url: Some("http://api.test".to_string()),
        ..ClientConfig::default()
    };
    let mut session = Session::new(config).unwrap();
    session.load(Some(file.to_str().unwrap())).unwrap();

    let err = session.set_param(Some("getItem"), "id", "5").unwrap_err();
    assert!(matches!(err, SessionError::AmbiguousParameter { .. }));
    assert!(err.to_string().contains("path:id, query:id"));

    session.set_param(Some("getItem"), "path:id", "5").unwrap();
    let prep = session.preview(Some("getItem")).unwrap();
    assert_eq!(prep.request.url.as_str(), "http://api.test/items/5");

    session.set_param(Some("getItem"), "query:id", "9").unwrap();
    let prep = session.preview(Some("getItem")).unwrap();
    assert_eq!(prep.request.url.as_str(), "http://api.test/items/5?id=9");

    let err = session.set_param(Some("getItem"), "header:id", "1").unwrap_err();
    assert!(matches!(err, SessionError::UnknownParameter { .. }));
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_missing_path_parameter_blocks_send() {
    let (mut session, file) = file_session("http://api.test", 5);
    let err = session.send(Some("deletePet")).unwrap_err();
    assert_eq!(err.to_string(), "required path parameter 'petId' is empty");
    assert!(session.response(Some("deletePet")).unwrap().is_none());
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_login_captures_token_for_later_requests() {
    let server = mock_server::start(vec![
        Reply::json(200, json!({"access_token": "tok123", "username": "ana", "role": "admin"})),
        Reply::json(200, json!([{"id": 1, "name": "rex"}])),
    ]);
    let (mut session, file) = file_session(&server.base_url, 5);

    session.set_form_field(Some("login"), "username", "ana").unwrap();
    session.set_form_field(Some("login"), "password", "secret").unwrap();
    let outcome = session.send(Some("login")).unwrap();
    let login = server.next_request();

    assert!(outcome.preparation.request.auth_endpoint);
    assert_eq!(
        login.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(login.body, "grant_type=password&username=ana&password=secret");
    assert!(outcome.notices.iter().any(|n| n.kind == "credentials_captured"));
    assert_eq!(session.credentials().get("bearerAuth"), Some("tok123"));
    assert_eq!(session.user_info().get("role"), Some(&json!("admin")));
    assert!(session.user_info().get("access_token").is_none());
    assert_eq!(session.auth_status(), Some("authenticated via bearerAuth"));

    let outcome = session.send(Some("listPets")).unwrap();
    let list = server.next_request();
    assert_eq!(list.header("authorization"), Some("Bearer tok123"));
    assert_eq!(list.target, "/pets");
    assert!(outcome.notices.iter().any(|n| n.kind == "credentials_applied"));
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_failed_login_sets_status() {
    let server = mock_server::start(vec![Reply::json(401, json!({"detail": "bad password"}))]);
    let (mut session, file) = file_session(&server.base_url, 5);
    session.set_form_field(Some("login"), "username", "ana").unwrap();
    session.set_form_field(Some("login"), "password", "wrong").unwrap();

    let outcome = session.send(Some("login")).unwrap();
    assert!(outcome.notices.iter().any(|n| n.kind == "auth_failed"));
    assert_eq!(session.auth_status(), Some("authentication failed: bad password"));
    assert!(session.credentials().is_empty());
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_unauthorized_response_warns() {
    let server = mock_server::start(vec![Reply::json(401, json!({"detail": "Not authenticated"}))]);
    let (mut session, file) = file_session(&server.base_url, 5);
    session.set_param(Some("listPets"), "limit", "5").unwrap();

    let outcome = session.send(Some("listPets")).unwrap();
    assert_eq!(server.next_request().target, "/pets?limit=5");
    assert_eq!(outcome.record.status(), 401);
    assert!(outcome.notices.iter().any(|n| n.kind == "missing_credentials"));
    assert!(outcome.notices.iter().any(|n| n.kind == "unauthorized"));
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_manual_api_key_credential() {
    let (mut session, file) = file_session("http://api.test", 5);
    assert!(matches!(
        session.set_credential("nope", "x"),
        Err(SessionError::UnknownScheme { .. })
    ));
    session.set_credential("bearerAuth", "abc").unwrap();
    let preparation = session.preview(Some("listPets")).unwrap();
    assert_eq!(preparation.request.header("authorization"), Some("Bearer abc"));

    session.logout();
    let preparation = session.preview(Some("listPets")).unwrap();
    assert!(preparation.request.header("authorization").is_none());
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_timeout_recorded() {
    let server = mock_server::start(vec![Reply::json(200, json!({})).delayed(Duration::from_secs(3))]);
    let (mut session, file) = file_session(&server.base_url, 1);

    let outcome = session.send(Some("health")).unwrap();
    match &outcome.record {
        ResponseRecord::Failed { error, .. } => {
            assert!(matches!(error, ExecuteError::Timeout { secs: 1, .. }));
            assert!(error.to_string().starts_with("API error: timeout after 1 seconds"));
        }
        other => panic!("expected a failure, got {other:?}"),
    }
    assert_eq!(outcome.record.status(), 408);
    assert_eq!(session.response(Some("health")).unwrap().unwrap().status(), 408);
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_connection_failure_recorded() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let (mut session, file) = file_session(&format!("http://{addr}"), 2);

    let outcome = session.send(Some("health")).unwrap();
    assert!(matches!(
        outcome.record,
        ResponseRecord::Failed {
            error: ExecuteError::Transport { .. },
            ..
        }
    ));
    assert_eq!(outcome.record.status(), 500);
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_endpoint_state_is_isolated() {
    let (mut session, file) = file_session("http://api.test", 5);
    session.set_param(Some("getPet"), "petId", "1").unwrap();
    session.set_param(Some("deletePet"), "petId", "2").unwrap();

    let get = session.preview(Some("getPet")).unwrap();
    let delete = session.preview(Some("deletePet")).unwrap();
    assert_eq!(get.request.url.path(), "/pets/1");
    assert_eq!(delete.request.url.path(), "/pets/2");
    temp_files::cleanup_temp_files(&[file]);
}

#[test]
fn test_selection_commands() {
    let (mut session, file) = file_session("http://api.test", 5);
    session.set_active_tag("PETS").unwrap();
    assert_eq!(session.active_tag(), Some("pets"));
    let ids: Vec<String> = session
        .endpoints(None)
        .unwrap()
        .iter()
        .map(|e| e.id.to_string())
        .collect();
    assert_eq!(
        ids,
        vec![
            "pets_GET__pets",
            "pets_POST__pets",
            "pets_DELETE__pets_petId",
            "pets_GET__pets_petId"
        ]
    );

    let endpoint = session.open("GET /health").unwrap();
    assert_eq!(endpoint.tag, "default");
    assert_eq!(session.active_tag(), Some("default"));
    assert!(matches!(
        session.open("nothing"),
        Err(SessionError::UnknownEndpoint { .. })
    ));
    assert!(matches!(
        session.set_active_tag("zzz"),
        Err(SessionError::UnknownTag { .. })
    ));
    temp_files::cleanup_temp_files(&[file]);
}
