use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::store::{StoreError, WeatherStore};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn WeatherStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn WeatherStore>) -> Self {
        Self { store }
    }
}

pub struct WebServerConfig {
    pub store: Arc<dyn WeatherStore>,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct ClimaQuery {
    dia: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ClimaResponse {
    pub dia: u32,
    pub clima: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TotalesResponse {
    pub dias: u32,
    pub sequia: u32,
    pub lluvia: u32,
    pub otpc: u32,
    pub otros: u32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/clima", get(clima))
        .route("/totales", get(totales))
        .with_state(Arc::new(state))
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig { store, host, port } = config;

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("Weather API listening on http://{}", addr);

    axum::serve(listener, router(AppState::new(store)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    log::info!("Shutting down weather API...");
}

async fn clima(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClimaQuery>,
) -> Result<Json<ClimaResponse>, StatusCode> {
    let day = query.dia.unwrap_or(1);
    let store = state.store.clone();
    let lookup = tokio::task::spawn_blocking(move || store.get_by_day(day))
        .await
        .map_err(|err| {
            log::error!("Record lookup task failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    match lookup {
        Ok(record) => Ok(Json(ClimaResponse {
            dia: day,
            clima: record.weather().label(),
        })),
        Err(StoreError::NotFound(_)) => {
            log::warn!("No weather record for day {day}");
            Err(StatusCode::NOT_FOUND)
        }
        Err(err) => {
            log::error!("Failed to fetch record by day {day}: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn totales(State(state): State<Arc<AppState>>) -> Result<Json<TotalesResponse>, StatusCode> {
    let store = state.store.clone();
    let counter = tokio::task::spawn_blocking(move || store.get_counter())
        .await
        .map_err(|err| {
            log::error!("Counter lookup task failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|err| {
            log::error!("Failed to fetch counter: {err}");
            StatusCode::SERVICE_UNAVAILABLE
        })?;

    Ok(Json(TotalesResponse {
        dias: counter.days,
        sequia: counter.drought,
        lluvia: counter.rain_season,
        otpc: counter.optimum_temperature_pressure,
        otros: counter.other,
    }))
}
