//! REST API for the forecast dashboard and text queries

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Query as QueryParams, State,
        rejection::{JsonRejection, QueryRejection},
    },
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::bot;
use crate::dashboard::{DashboardRequest, DashboardView, ForecastDuration, build_dashboard};
use crate::dataset::ForecastStore;
use crate::forecast::{ForecastReport, Query, lookup_forecast};

pub mod error;

pub use error::{ApiError, AppError};

type HandlerResult<T> = Result<Json<T>, AppError>;

/// Shared state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ForecastStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ForecastStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub locations: usize,
}

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub location: String,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub duration: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/locations", get(list_locations))
        .route("/forecast", get(get_forecast))
        .route("/dashboard", get(get_dashboard))
        .route("/query", post(post_query))
        .route("/chat", post(post_chat))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.store.refresh() {
        Ok(()) => "ok",
        Err(_) => "data_unavailable",
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: crate::VERSION.to_string(),
        locations: state.store.all_locations().len(),
    })
}

async fn list_locations(State(state): State<AppState>) -> HandlerResult<Vec<String>> {
    state.store.refresh()?;
    Ok(Json(state.store.all_locations().into_iter().collect()))
}

#[instrument(skip(state))]
async fn get_forecast(
    State(state): State<AppState>,
    params: Result<QueryParams<ForecastParams>, QueryRejection>,
) -> HandlerResult<ForecastReport> {
    let QueryParams(params) = params?;
    state.store.refresh()?;
    let query = Query::new(params.location, params.date);
    let record = lookup_forecast(&query, state.store.as_ref())?;
    Ok(Json(ForecastReport::from_record(record)))
}

#[instrument(skip(state))]
async fn get_dashboard(
    State(state): State<AppState>,
    params: Result<QueryParams<DashboardParams>, QueryRejection>,
) -> HandlerResult<DashboardView> {
    let QueryParams(params) = params?;
    let duration = match params.duration.as_deref() {
        Some(d) => d
            .parse::<ForecastDuration>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => ForecastDuration::default(),
    };
    state.store.refresh()?;
    let request = DashboardRequest {
        location: params.location,
        date: params.date,
        duration,
    };
    Ok(Json(build_dashboard(state.store.as_ref(), &request)?))
}

#[instrument(skip(state))]
async fn post_query(
    State(state): State<AppState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> HandlerResult<ForecastReport> {
    let Json(body) = body?;
    Ok(Json(bot::answer(&body.text, state.store.as_ref())?))
}

async fn post_chat(
    State(state): State<AppState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> HandlerResult<ChatReply> {
    let Json(body) = body?;
    Ok(Json(ChatReply {
        reply: bot::reply_for(&body.text, state.store.as_ref()),
    }))
}
