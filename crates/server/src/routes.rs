use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use case_api::{
    create_alternant, create_dossier, create_entreprise, create_tuteur, delete_dossier,
    get_dossier, list_alternants, list_dossiers, list_entreprises, list_tuteurs,
    update_dossier_status, ApiContext,
};
use shared::{
    domain::{
        Alternant, Dossier, DossierId, Entreprise, NewAlternant, NewDossier, NewEntreprise,
        NewTuteur, Tuteur,
    },
    error::{ApiError, ErrorCode},
    protocol::UpdateStatusRequest,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) request_body_limit_bytes: usize,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.request_body_limit_bytes;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/dossiers", get(http_list_dossiers).post(http_create_dossier))
        .route(
            "/dossiers/:dossier_id",
            get(http_get_dossier).delete(http_delete_dossier),
        )
        .route("/dossiers/:dossier_id/status", patch(http_update_status))
        .route(
            "/alternants",
            get(http_list_alternants).post(http_create_alternant),
        )
        .route(
            "/entreprises",
            get(http_list_entreprises).post(http_create_entreprise),
        )
        .route("/tuteurs", get(http_list_tuteurs).post(http_create_tuteur))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    if err.code == ErrorCode::Internal {
        tracing::error!(message = %err.message, "cases: internal error");
    }
    (status_for(err.code), Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state.api.storage.health_check().await.map_err(|e| {
        reject(ApiError::new(
            ErrorCode::Internal,
            format!("storage unavailable: {e}"),
        ))
    })?;
    Ok("ok")
}

async fn http_list_dossiers(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Dossier>>> {
    list_dossiers(&state.api).await.map(Json).map_err(reject)
}

async fn http_create_dossier(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewDossier>,
) -> ApiResult<(StatusCode, Json<Dossier>)> {
    let dossier = create_dossier(&state.api, &req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(dossier)))
}

async fn http_get_dossier(
    State(state): State<Arc<AppState>>,
    Path(dossier_id): Path<String>,
) -> ApiResult<Json<Dossier>> {
    get_dossier(&state.api, &DossierId(dossier_id))
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_update_status(
    State(state): State<Arc<AppState>>,
    Path(dossier_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Dossier>> {
    update_dossier_status(&state.api, &DossierId(dossier_id), req.status)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_delete_dossier(
    State(state): State<Arc<AppState>>,
    Path(dossier_id): Path<String>,
) -> ApiResult<StatusCode> {
    delete_dossier(&state.api, &DossierId(dossier_id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_list_alternants(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Alternant>>> {
    list_alternants(&state.api).await.map(Json).map_err(reject)
}

async fn http_create_alternant(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewAlternant>,
) -> ApiResult<(StatusCode, Json<Alternant>)> {
    let alternant = create_alternant(&state.api, &req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(alternant)))
}

async fn http_list_entreprises(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Entreprise>>> {
    list_entreprises(&state.api).await.map(Json).map_err(reject)
}

async fn http_create_entreprise(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewEntreprise>,
) -> ApiResult<(StatusCode, Json<Entreprise>)> {
    let entreprise = create_entreprise(&state.api, &req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(entreprise)))
}

async fn http_list_tuteurs(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Tuteur>>> {
    list_tuteurs(&state.api).await.map(Json).map_err(reject)
}

async fn http_create_tuteur(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewTuteur>,
) -> ApiResult<(StatusCode, Json<Tuteur>)> {
    let tuteur = create_tuteur(&state.api, &req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(tuteur)))
}

#[cfg(test)]
#[path = "tests/routes_tests.rs"]
mod tests;
