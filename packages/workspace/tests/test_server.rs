use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use pagewright_compiler::CompileCache;
use pagewright_store::InMemoryStore;
use pagewright_workspace::{router, AppState, BroadcastHub, Config, VersionManager, SESSION_HEADER};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, VersionManager) {
    let manager = VersionManager::new(
        Arc::new(InMemoryStore::new()),
        BroadcastHub::default(),
        Arc::new(CompileCache::new()),
    );
    let state = AppState {
        manager: manager.clone(),
        config: Arc::new(Config::default()),
    };
    (router(state), manager)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_app(app: &Router) -> Value {
    let (status, body) = send_json(app, Method::POST, "/api/apps", Some(json!({"slug": "crm", "name": "CRM"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_create_write_and_publish() {
    let (app, _) = app();
    let created = create_app(&app).await;
    let app_id = created["id"].as_str().unwrap().to_string();
    let draft = created["draftVersionId"].as_str().unwrap().to_string();
    assert!(created["activeVersionId"].is_null());

    let (status, file) = send_json(
        &app,
        Method::PUT,
        &format!("/api/versions/{}/files/pages/about.tsx", draft),
        Some(json!({"source": "export default () => <p>About</p>;"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(file["path"], "pages/about.tsx");
    assert!(file["contentHash"].is_string());

    let (status, files) = send_json(&app, Method::GET, &format!("/api/versions/{}/files", draft), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(files.as_array().unwrap().len(), 3);

    let (status, version) = send_json(&app, Method::POST, &format!("/api/apps/{}/publish", app_id), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(version["number"], 1);
    assert_eq!(version["state"], "published");

    let (_, fetched) = send_json(&app, Method::GET, &format!("/api/apps/{}", app_id), None).await;
    assert_eq!(fetched["activeVersionId"], version["id"]);

    let (status, versions) = send_json(&app, Method::GET, &format!("/api/apps/{}/versions", app_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(versions.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_error_bodies_carry_codes() {
    let (app, _) = app();
    let (status, body) = send_json(
        &app,
        Method::GET,
        "/api/apps/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "app_not_found");

    create_app(&app).await;
    let (status, body) = send_json(&app, Method::POST, "/api/apps", Some(json!({"slug": "crm", "name": "Again"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "slug_taken");
}

#[tokio::test]
async fn test_invalid_path_and_read_only_version() {
    let (app, _) = app();
    let created = create_app(&app).await;
    let app_id = created["id"].as_str().unwrap();
    let draft = created["draftVersionId"].as_str().unwrap();

    let (status, body) = send_json(
        &app,
        Method::PUT,
        &format!("/api/versions/{}/files/notes.txt", draft),
        Some(json!({"source": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "path_not_source");

    let (_, version) = send_json(&app, Method::POST, &format!("/api/apps/{}/publish", app_id), None).await;
    let (status, body) = send_json(
        &app,
        Method::DELETE,
        &format!("/api/versions/{}/files/pages/index.tsx", version["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "version_read_only");
}

#[tokio::test]
async fn test_session_header_is_the_event_origin() {
    let (app, manager) = app();
    let created = create_app(&app).await;
    let app_id = created["id"].as_str().unwrap().parse().unwrap();
    let draft = created["draftVersionId"].as_str().unwrap();
    let mut events = manager.subscribe_draft(app_id);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/versions/{}/files/pages/index.tsx", draft))
        .header(SESSION_HEADER, "editor-1")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    match events.try_recv().unwrap() {
        pagewright_workspace::ChannelEvent::Draft(event) => assert_eq!(event.origin(), Some("editor-1")),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_rename_and_rollback() {
    let (app, _) = app();
    let created = create_app(&app).await;
    let app_id = created["id"].as_str().unwrap();
    let draft = created["draftVersionId"].as_str().unwrap();

    let (_, v1) = send_json(&app, Method::POST, &format!("/api/apps/{}/publish", app_id), None).await;
    let (status, file) = send_json(
        &app,
        Method::POST,
        &format!("/api/versions/{}/rename", draft),
        Some(json!({"from": "pages/index.tsx", "to": "pages/home.tsx"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(file["path"], "pages/home.tsx");
    send_json(&app, Method::POST, &format!("/api/apps/{}/publish", app_id), None).await;

    let (status, rolled) = send_json(
        &app,
        Method::POST,
        &format!("/api/apps/{}/rollback", app_id),
        Some(json!({"versionId": v1["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rolled["activeVersionId"], v1["id"]);
}

#[tokio::test]
async fn test_diagnostics_and_route_collisions() {
    let (app, _) = app();
    let created = create_app(&app).await;
    let draft = created["draftVersionId"].as_str().unwrap();

    for (path, source) in [
        ("pages/clients.tsx", "export default () => <ul></ul>;"),
        ("pages/clients/index.tsx", "export default () => <div>"),
    ] {
        send_json(
            &app,
            Method::PUT,
            &format!("/api/versions/{}/files/{}", draft, path),
            Some(json!({ "source": source })),
        )
        .await;
    }

    let (status, diagnostics) =
        send_json(&app, Method::GET, &format!("/api/versions/{}/diagnostics", draft), None).await;
    assert_eq!(status, StatusCode::OK);
    let failed: Vec<&str> = diagnostics
        .as_array()
        .unwrap()
        .iter()
        .filter(|d| d["success"] == false)
        .map(|d| d["path"].as_str().unwrap())
        .collect();
    assert_eq!(failed, vec!["pages/clients/index.tsx"]);

    let (status, body) = send_json(&app, Method::GET, &format!("/api/versions/{}/routes", draft), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "route_collision");
    assert_eq!(body["error"]["files"], json!(["pages/clients.tsx", "pages/clients/index.tsx"]));
}

#[tokio::test]
async fn test_routes_of_a_fresh_draft() {
    let (app, _) = app();
    let created = create_app(&app).await;
    let draft = created["draftVersionId"].as_str().unwrap();

    let (status, tree) = send_json(&app, Method::GET, &format!("/api/versions/{}/routes", draft), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree["rootLayout"], "_layout.tsx");
    assert_eq!(tree["routes"][0]["path"], "/");
}

#[tokio::test]
async fn test_preview_renders_html() {
    let (app, _) = app();
    let created = create_app(&app).await;
    let draft = created["draftVersionId"].as_str().unwrap();
    send_json(
        &app,
        Method::PUT,
        &format!("/api/versions/{}/files/pages/clients/%5Bid%5D.tsx", draft),
        Some(json!({"source": r#"
            import { useParams } from "@platform";
            export default function Client() {
                const { id } = useParams();
                return <h2>Client {id}</h2>;
            }
        "#})),
    )
    .await;

    let (status, html) = send(&app, Method::GET, &format!("/api/versions/{}/preview", draft), None).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains("Welcome"), "{}", html);
    assert!(html.contains("app-shell"));

    let (status, html) = send(
        &app,
        Method::GET,
        &format!("/api/versions/{}/preview?path=/clients/42", draft),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(html).unwrap().contains("Client 42"));
}

#[tokio::test]
async fn test_delete_application() {
    let (app, _) = app();
    let created = create_app(&app).await;
    let app_id = created["id"].as_str().unwrap();

    let (status, _) = send(&app, Method::DELETE, &format!("/api/apps/{}", app_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, apps) = send_json(&app, Method::GET, "/api/apps", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(apps, json!([]));
}

#[tokio::test]
async fn test_closed_event_stream_prunes_its_channel() {
    let (app, manager) = app();
    let created = create_app(&app).await;
    let app_id = created["id"].as_str().unwrap();
    let _live = manager.subscribe_live(app_id.parse().unwrap());

    let request = Request::builder()
        .uri(format!("/api/apps/{}/events/draft", app_id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(manager.hub().channels().len(), 2);

    drop(response);
    let channels = manager.hub().channels();
    assert_eq!(channels.len(), 1);
    assert!(channels[0].ends_with(":live"));
}
