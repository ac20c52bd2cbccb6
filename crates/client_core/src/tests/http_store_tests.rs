use super::*;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode as HttpStatus,
    routing::{get, patch},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct ServerState {
    dossiers: Arc<Mutex<Vec<Dossier>>>,
    patches: Arc<Mutex<Vec<(String, Status)>>>,
}

fn dossier(id: &str, status: Status) -> Dossier {
    Dossier {
        id: DossierId::from(id),
        alternant_id: "alt-1".into(),
        entreprise_id: "ent-1".into(),
        tuteur_id: "tut-1".into(),
        alternant: None,
        entreprise: None,
        tuteur: None,
        status,
        date_debut: NaiveDate::from_ymd_opt(2025, 9, 1).expect("date"),
        date_fin: NaiveDate::from_ymd_opt(2026, 8, 31).expect("date"),
        commentaires: String::new(),
        created_at: Utc::now(),
    }
}

async fn list_dossiers(State(state): State<ServerState>) -> Json<Vec<Dossier>> {
    Json(state.dossiers.lock().expect("dossiers").clone())
}

async fn patch_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Dossier>, (HttpStatus, Json<ApiError>)> {
    state
        .patches
        .lock()
        .expect("patches")
        .push((id.clone(), body.status));
    let mut dossiers = state.dossiers.lock().expect("dossiers");
    match dossiers.iter_mut().find(|d| d.id.as_str() == id) {
        Some(dossier) => {
            dossier.status = body.status;
            Ok(Json(dossier.clone()))
        }
        None => Err((
            HttpStatus::NOT_FOUND,
            Json(ApiError::not_found("dossier not found")),
        )),
    }
}

async fn delete_dossier(State(state): State<ServerState>, Path(id): Path<String>) -> HttpStatus {
    let mut dossiers = state.dossiers.lock().expect("dossiers");
    let before = dossiers.len();
    dossiers.retain(|d| d.id.as_str() != id);
    if dossiers.len() == before {
        HttpStatus::NOT_FOUND
    } else {
        HttpStatus::NO_CONTENT
    }
}

async fn broken_alternants() -> (HttpStatus, &'static str) {
    (HttpStatus::INTERNAL_SERVER_ERROR, "database is locked")
}

async fn spawn_case_server(prefix: &str) -> Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    state
        .dossiers
        .lock()
        .expect("dossiers")
        .extend([dossier("1", Status::Request), dossier("2", Status::Created)]);

    let routes = Router::new()
        .route("/dossiers", get(list_dossiers))
        .route("/dossiers/:id", axum::routing::delete(delete_dossier))
        .route("/dossiers/:id/status", patch(patch_status))
        .route("/alternants", get(broken_alternants))
        .with_state(state.clone());
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}{prefix}"), state))
}

#[test]
fn rejects_malformed_server_url() {
    assert!(HttpCaseStore::new("not a url").is_err());
}

#[test]
fn base_url_gets_trailing_slash() {
    let store = HttpCaseStore::new("http://127.0.0.1:8080/api").expect("url");
    assert_eq!(store.base_url().as_str(), "http://127.0.0.1:8080/api/");
}

#[tokio::test]
async fn list_decodes_dossiers_in_server_order() {
    let (server_url, _state) = spawn_case_server("").await.expect("spawn server");
    let store = HttpCaseStore::new(&server_url).expect("url");

    let dossiers = store.list().await.expect("list");

    assert_eq!(
        dossiers.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
        vec!["1", "2"]
    );
}

#[tokio::test]
async fn update_status_sends_patch_and_returns_record() {
    let (server_url, state) = spawn_case_server("").await.expect("spawn server");
    let store = HttpCaseStore::new(&server_url).expect("url");

    let updated = store
        .update_status(&DossierId::from("2"), Status::Verification)
        .await
        .expect("update");

    assert_eq!(updated.status, Status::Verification);
    assert_eq!(
        state.patches.lock().expect("patches").as_slice(),
        &[("2".to_string(), Status::Verification)]
    );
}

#[tokio::test]
async fn unknown_dossier_maps_to_not_found_api_error() {
    let (server_url, _state) = spawn_case_server("").await.expect("spawn server");
    let store = HttpCaseStore::new(&server_url).expect("url");

    let err = store
        .update_status(&DossierId::from("99"), Status::Created)
        .await
        .expect_err("unknown id");

    assert!(err.is_not_found());
    match err {
        StoreError::Api { status, error } => {
            assert_eq!(status, 404);
            assert_eq!(error.code, ErrorCode::NotFound);
            assert_eq!(error.message, "dossier not found");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn delete_succeeds_once_then_is_not_found() {
    let (server_url, state) = spawn_case_server("").await.expect("spawn server");
    let store = HttpCaseStore::new(&server_url).expect("url");

    store.delete(&DossierId::from("1")).await.expect("delete");
    assert_eq!(state.dossiers.lock().expect("dossiers").len(), 1);

    let err = store
        .delete(&DossierId::from("1"))
        .await
        .expect_err("second delete");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn plain_text_server_error_falls_back_to_internal_code() {
    let (server_url, _state) = spawn_case_server("").await.expect("spawn server");
    let store = HttpCaseStore::new(&server_url).expect("url");

    let err = store.list_alternants().await.expect_err("server error");

    match err {
        StoreError::Api { status, error } => {
            assert_eq!(status, 500);
            assert_eq!(error.code, ErrorCode::Internal);
            assert_eq!(error.message, "database is locked");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn routes_resolve_under_a_path_prefix() {
    let (server_url, _state) = spawn_case_server("/api").await.expect("spawn server");
    let store = HttpCaseStore::new(&server_url).expect("url");

    assert_eq!(store.list().await.expect("list").len(), 2);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let store = HttpCaseStore::new(&format!("http://{addr}")).expect("url");

    let err = store.list().await.expect_err("connection refused");

    assert!(matches!(err, StoreError::Transport(_)));
}
