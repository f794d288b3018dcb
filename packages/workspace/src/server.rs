use crate::config::Config;
use crate::error::WorkspaceError;
use crate::events::{Channel, ChannelEvent, DraftEvent, LiveEvent};
use crate::hub::BroadcastHub;
use crate::manager::VersionManager;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use pagewright_shell::{AppInstance, InstanceOptions, MountPrefix};
use pagewright_store::{AppId, MetadataUpdate, NewApplication, StoreError, VersionId};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

/// Header carrying the editing session a mutation comes from
pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Clone)]
pub struct AppState {
    pub manager: VersionManager,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/apps", get(list_apps).post(create_app))
        .route("/api/apps/:app_id", get(get_app).patch(update_app).delete(delete_app))
        .route("/api/apps/:app_id/versions", get(list_versions))
        .route("/api/apps/:app_id/publish", post(publish))
        .route("/api/apps/:app_id/rollback", post(rollback))
        .route("/api/apps/:app_id/events/:channel", get(events))
        .route("/api/versions/:version_id/files", get(list_files))
        .route(
            "/api/versions/:version_id/files/*path",
            get(get_file).put(put_file).delete(delete_file),
        )
        .route("/api/versions/:version_id/rename", post(rename_file))
        .route("/api/versions/:version_id/diagnostics", get(diagnostics))
        .route("/api/versions/:version_id/routes", get(routes))
        .route("/api/versions/:version_id/preview", get(preview))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Errors
// ============================================================================

/// Error response: `{"error": {"code", "message"}}`
pub struct ApiError(pub WorkspaceError);

impl<E: Into<WorkspaceError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            err if err.is_not_found() => StatusCode::NOT_FOUND,
            WorkspaceError::Store(StoreError::InvalidPath(_))
            | WorkspaceError::Store(StoreError::InvalidSlug(_))
            | WorkspaceError::Shell { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            WorkspaceError::Store(_) | WorkspaceError::NotPublished(_) => StatusCode::CONFLICT,
            WorkspaceError::ChannelClosed(_) => StatusCode::GONE,
            WorkspaceError::Preview(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        let body = json!({ "error": { "code": self.0.code(), "message": self.0.to_string() } });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn origin(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|value| value.to_str().ok())
}

// ============================================================================
// Applications and versions
// ============================================================================

async fn list_apps(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.manager.applications())
}

async fn create_app(State(state): State<AppState>, Json(input): Json<NewApplication>) -> ApiResult<impl IntoResponse> {
    let app = state.manager.create_application(input)?;
    Ok((StatusCode::CREATED, Json(app)))
}

async fn get_app(State(state): State<AppState>, Path(app_id): Path<AppId>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.manager.application(app_id)?))
}

async fn update_app(
    State(state): State<AppState>,
    Path(app_id): Path<AppId>,
    Json(update): Json<MetadataUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.manager.update_metadata(app_id, update)?))
}

async fn delete_app(State(state): State<AppState>, Path(app_id): Path<AppId>) -> ApiResult<StatusCode> {
    state.manager.delete_application(app_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_versions(State(state): State<AppState>, Path(app_id): Path<AppId>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.manager.versions(app_id)?))
}

async fn publish(State(state): State<AppState>, Path(app_id): Path<AppId>) -> ApiResult<impl IntoResponse> {
    let version = state.manager.publish(app_id)?;
    Ok((StatusCode::CREATED, Json(version)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RollbackRequest {
    version_id: VersionId,
}

async fn rollback(
    State(state): State<AppState>,
    Path(app_id): Path<AppId>,
    Json(request): Json<RollbackRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.manager.rollback(app_id, request.version_id)?))
}

// ============================================================================
// Files
// ============================================================================

async fn list_files(State(state): State<AppState>, Path(version_id): Path<VersionId>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.manager.files(version_id)?))
}

async fn get_file(
    State(state): State<AppState>,
    Path((version_id, path)): Path<(VersionId, String)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.manager.file(version_id, &path)?))
}

#[derive(Debug, Deserialize)]
struct FileBody {
    source: String,
}

async fn put_file(
    State(state): State<AppState>,
    Path((version_id, path)): Path<(VersionId, String)>,
    headers: HeaderMap,
    Json(body): Json<FileBody>,
) -> ApiResult<impl IntoResponse> {
    let file = state.manager.write_file(version_id, &path, &body.source, origin(&headers))?;
    Ok(Json(file))
}

async fn delete_file(
    State(state): State<AppState>,
    Path((version_id, path)): Path<(VersionId, String)>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    state.manager.delete_file(version_id, &path, origin(&headers))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RenameBody {
    from: String,
    to: String,
}

async fn rename_file(
    State(state): State<AppState>,
    Path(version_id): Path<VersionId>,
    headers: HeaderMap,
    Json(body): Json<RenameBody>,
) -> ApiResult<impl IntoResponse> {
    let file = state.manager.rename_file(version_id, &body.from, &body.to, origin(&headers))?;
    Ok(Json(file))
}

// ============================================================================
// Compilation, routes and preview
// ============================================================================

async fn diagnostics(State(state): State<AppState>, Path(version_id): Path<VersionId>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.manager.diagnostics(version_id)?))
}

async fn routes(State(state): State<AppState>, Path(version_id): Path<VersionId>) -> ApiResult<Response> {
    let response = match state.manager.routes(version_id)? {
        Ok(tree) => Json(tree).into_response(),
        Err(collision) => {
            let (first, second) = collision.files();
            let body = json!({
                "error": {
                    "code": collision.code(),
                    "message": collision.to_string(),
                    "files": [first, second],
                }
            });
            (StatusCode::CONFLICT, Json(body)).into_response()
        }
    };
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct PreviewQuery {
    path: Option<String>,
}

/// Render one location of a version to HTML. Instances are single-threaded,
/// so each preview runs on the blocking pool.
async fn preview(
    State(state): State<AppState>,
    Path(version_id): Path<VersionId>,
    Query(query): Query<PreviewQuery>,
) -> ApiResult<Html<String>> {
    let version = state.manager.version(version_id)?;
    let app = state.manager.application(version.app_id)?;
    let files = state.manager.file_set(version_id)?;
    let cache = state.manager.cache().clone();
    let options = InstanceOptions {
        prefix: MountPrefix::for_app(&state.config.mount_base, &app.slug),
        limits: state.config.limits(),
        render_passes: state.config.render_pass_limit,
        ..InstanceOptions::default()
    };
    let path = query.path.unwrap_or_else(|| "/".to_string());

    let html = tokio::task::spawn_blocking(move || -> Result<String, WorkspaceError> {
        let mut instance = AppInstance::mount(&version_id.to_string(), &files, cache, options)?;
        Ok(instance.navigate(&path).to_html())
    })
    .await
    .map_err(|err| WorkspaceError::Preview(err.to_string()))??;
    Ok(Html(html))
}

// ============================================================================
// Live update streams
// ============================================================================

fn event_name(event: &ChannelEvent) -> &'static str {
    match event {
        ChannelEvent::Draft(DraftEvent::FileChanged { .. }) => "fileChanged",
        ChannelEvent::Live(LiveEvent::Published { .. }) => "published",
        ChannelEvent::Live(LiveEvent::RolledBack { .. }) => "rolledBack",
    }
}

/// Server-sent events for one of an application's channels. A `lagged`
/// event tells the client it missed notifications and should refetch.
async fn events(
    State(state): State<AppState>,
    Path((app_id, channel)): Path<(AppId, Channel)>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    state.manager.application(app_id)?;
    let receiver = state.manager.hub().subscribe(&channel.name(app_id));
    info!(app_id = %app_id, channel = ?channel, "Opened event stream");

    let stream = BroadcastStream::new(receiver).map(|item| {
        let event = match item {
            Ok(event) => Event::default()
                .event(event_name(&event))
                .json_data(&event)
                .unwrap_or_else(|_| Event::default().event("error")),
            Err(BroadcastStreamRecvError::Lagged(missed)) => Event::default().event("lagged").data(missed.to_string()),
        };
        Ok(event)
    });

    let stream = Pruning {
        stream: Some(Box::pin(stream)),
        hub: state.manager.hub().clone(),
    };
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping")))
}

/// Event stream that drops idle hub channels once its client goes away
struct Pruning<S> {
    stream: Option<Pin<Box<S>>>,
    hub: BroadcastHub,
}

impl<S: Stream> Stream for Pruning<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S::Item>> {
        match self.stream.as_mut() {
            Some(stream) => stream.as_mut().poll_next(cx),
            None => Poll::Ready(None),
        }
    }
}

impl<S> Drop for Pruning<S> {
    fn drop(&mut self) {
        // the receiver has to go first or its channel still counts as subscribed
        self.stream.take();
        let pruned = self.hub.prune();
        debug!(pruned, "Closed event stream");
    }
}
