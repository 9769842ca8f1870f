//! HTTP transport over the tasting engine and dashboard statistics.

pub mod error;
pub mod form;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::entity::{Cigar, Tasting, TastingStatus, TastingView};
use crate::error::{HumidorError, Result};
use crate::input::{FinalizeTasting, NewTasting, TastingPatch};
use crate::lifecycle::TastingEngine;
use crate::photos::DiskPhotoStore;
use crate::stats::{compute_dashboard_stats, DashboardStats};
use crate::storage::{InventoryStore, SqliteStore};
use error::ApiError;
use form::TastingForm;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<SqliteStore>>,
    pub photos: Arc<DiskPhotoStore>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(store: SqliteStore, photos: DiskPhotoStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            photos: Arc::new(photos),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Cap on request bodies, photo uploads included.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/charutos", get(list_cigars))
        .route("/api/charutos/{id}", get(get_cigar))
        .route(
            "/api/degustacoes",
            get(list_tastings).post(create_tasting),
        )
        .route("/api/degustacoes/em-andamento", get(list_in_progress))
        .route(
            "/api/degustacoes/{id}",
            get(get_tasting).put(update_tasting).delete(delete_tasting),
        )
        .route(
            "/api/degustacoes/{id}/finalizar",
            axum::routing::put(finalize_tasting),
        )
        .route("/api/dashboard/stats", get(dashboard_stats))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(address = %bind, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

#[derive(Debug, Deserialize)]
struct CigarQuery {
    q: Option<String>,
}

async fn list_cigars(
    State(state): State<AppState>,
    Query(query): Query<CigarQuery>,
) -> std::result::Result<Json<Vec<Cigar>>, ApiError> {
    let store = state.store.lock().await;
    let cigars = match query.q {
        Some(q) => store.search_cigars(&q)?,
        None => store.get_all_cigars()?,
    };
    Ok(Json(cigars))
}

async fn get_cigar(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Cigar>, ApiError> {
    let store = state.store.lock().await;
    let cigar = store
        .get_cigar_by_id(id)?
        .ok_or(HumidorError::CigarNotFound(id))?;
    Ok(Json(cigar))
}

#[derive(Debug, Deserialize)]
struct TastingQuery {
    status: Option<String>,
}

async fn list_tastings(
    State(state): State<AppState>,
    Query(query): Query<TastingQuery>,
) -> std::result::Result<Json<Vec<TastingView>>, ApiError> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<TastingStatus>()
                .map_err(HumidorError::Validation)?,
        ),
    };
    let store = state.store.lock().await;
    let engine = TastingEngine::new(&*store, &*state.photos);
    Ok(Json(engine.list(status)?))
}

async fn list_in_progress(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<TastingView>>, ApiError> {
    let store = state.store.lock().await;
    let engine = TastingEngine::new(&*store, &*state.photos);
    Ok(Json(engine.list(Some(TastingStatus::InProgress))?))
}

async fn get_tasting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<TastingView>, ApiError> {
    let store = state.store.lock().await;
    let engine = TastingEngine::new(&*store, &*state.photos);
    Ok(Json(engine.get(id)?))
}

async fn create_tasting(
    State(state): State<AppState>,
    form: TastingForm,
) -> std::result::Result<(StatusCode, Json<Tasting>), ApiError> {
    let input = NewTasting::from_fields(&form.fields)?;
    let store = state.store.lock().await;
    let engine = TastingEngine::new(&*store, &*state.photos);
    let tasting = engine.create(input, form.photo)?;
    Ok((StatusCode::CREATED, Json(tasting)))
}

async fn finalize_tasting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    form: TastingForm,
) -> std::result::Result<Json<Tasting>, ApiError> {
    let input = FinalizeTasting::from_fields(&form.fields)?;
    let store = state.store.lock().await;
    let engine = TastingEngine::new(&*store, &*state.photos);
    Ok(Json(engine.finalize(id, input, form.photo)?))
}

async fn update_tasting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    form: TastingForm,
) -> std::result::Result<Json<Tasting>, ApiError> {
    let patch = TastingPatch::from_fields(&form.fields)?;
    let store = state.store.lock().await;
    let engine = TastingEngine::new(&*store, &*state.photos);
    Ok(Json(engine.update(id, patch, form.photo)?))
}

async fn delete_tasting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> std::result::Result<Json<Value>, ApiError> {
    let store = state.store.lock().await;
    let engine = TastingEngine::new(&*store, &*state.photos);
    engine.delete(id)?;
    Ok(Json(json!({ "id": id, "message": "tasting deleted" })))
}

async fn dashboard_stats(
    State(state): State<AppState>,
) -> std::result::Result<Json<DashboardStats>, ApiError> {
    let store = state.store.lock().await;
    Ok(Json(compute_dashboard_stats(&*store)?))
}
