//! HTTP surface of the point facade.

use crate::types::{
    GetRequest, GetResponse, SetRequest, SetResponse, StatusResponse, StepRequest,
};
use crate::{FacadeError, PointFacade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use simbridge_types::PointProperties;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

type Shared = State<Arc<PointFacade>>;

/// Build the facade's routes.
///
/// - `POST /points/get` `{keys}` → `{time, pairs}`
/// - `POST /points/set` `{pairs}` → `{pairs}`
/// - `GET /points/measurements`, `GET /points/inputs` → metadata by address
/// - `POST /run/start`, `PUT /run/step` `{step}` → status
/// - `GET /status`, `GET /health`
pub fn router(facade: Arc<PointFacade>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/points/get", post(get_points))
        .route("/points/set", post(set_points))
        .route("/points/measurements", get(measurements))
        .route("/points/inputs", get(inputs))
        .route("/run/start", post(start))
        .route("/run/step", put(set_step))
        .with_state(facade)
}

/// Serve the facade on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    facade: Arc<PointFacade>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listen_addr = listener.local_addr()?;
    info!(%listen_addr, "Facade listening");
    axum::serve(listener, router(facade))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn status(State(facade): Shared) -> Json<StatusResponse> {
    Json(facade.status())
}

async fn get_points(
    State(facade): Shared,
    Json(request): Json<GetRequest>,
) -> Result<Json<GetResponse>, FacadeError> {
    facade.get(&request.keys).map(Json)
}

async fn set_points(
    State(facade): Shared,
    Json(request): Json<SetRequest>,
) -> Result<Json<SetResponse>, FacadeError> {
    facade.set(request.pairs).map(Json)
}

async fn measurements(
    State(facade): Shared,
) -> Result<Json<BTreeMap<String, PointProperties>>, FacadeError> {
    facade.measurements().await.map(Json)
}

async fn inputs(
    State(facade): Shared,
) -> Result<Json<BTreeMap<String, PointProperties>>, FacadeError> {
    facade.inputs().await.map(Json)
}

async fn start(State(facade): Shared) -> Result<Json<StatusResponse>, FacadeError> {
    facade.start().await.map(Json)
}

async fn set_step(
    State(facade): Shared,
    Json(request): Json<StepRequest>,
) -> Result<Json<StatusResponse>, FacadeError> {
    facade.set_step(request.step).await.map(Json)
}
