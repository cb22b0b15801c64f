//! HTTP client for the resilience backend.
//!
//! All functions use gloo-net to call the REST API with JSON bodies and
//! Bearer token auth. Base URL is relative (same origin). Failures map to
//! the typed [`ApiError`], so a rejected credential is distinguishable
//! from a transport failure everywhere downstream.

use std::time::Duration;

use gloo_net::http::Request;
use gloo_storage::{LocalStorage, Storage};
use serde::{Deserialize, Serialize};

use netpulse_core::api::{
    AnalysisReport, AnalysisRequest, ApiErrorResponse, CredentialProvider, HealthStatus,
    RouteHistory, RouteRequest, RouteResponse, TelemetryApi, ThresholdConfig,
};
use netpulse_core::controller::TimerFactory;
use netpulse_core::error::ApiError;
use netpulse_core::sample::MetricReading;

use crate::TOKEN_KEY;

pub type ApiResult<T> = Result<T, ApiError>;

fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}

fn transport(err: gloo_net::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

fn decode(err: gloo_net::Error) -> ApiError {
    ApiError::Decode(err.to_string())
}

/// Parse a non-2xx response into a typed error.
async fn parse_error(resp: gloo_net::http::Response) -> ApiError {
    let status = resp.status();
    match resp.json::<ApiErrorResponse>().await {
        Ok(e) => ApiError::from_detail(status, e.detail),
        Err(_) => ApiError::Remote {
            status,
            detail: format!("HTTP {status}"),
        },
    }
}

// ── Auth ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

pub async fn login(username: &str, password: &str) -> ApiResult<LoginResponse> {
    let body = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    let resp = Request::post("/users/login")
        .json(&body)
        .map_err(transport)?
        .send()
        .await
        .map_err(transport)?;

    if resp.ok() {
        resp.json().await.map_err(decode)
    } else {
        Err(parse_error(resp).await)
    }
}

// ── Telemetry ───────────────────────────────────────────────────────

pub async fn submit_reading(token: &str, reading: &MetricReading) -> ApiResult<()> {
    let resp = Request::post("/api/resilience/metrics/manual")
        .header("Authorization", &auth_header(token))
        .json(reading)
        .map_err(transport)?
        .send()
        .await
        .map_err(transport)?;

    if resp.ok() {
        Ok(())
    } else {
        Err(parse_error(resp).await)
    }
}

pub async fn analyze(token: &str, data: &[f64]) -> ApiResult<AnalysisReport> {
    let body = AnalysisRequest {
        data: data.to_vec(),
    };
    let resp = Request::post("/api/resilience/predictive-maintenance")
        .header("Authorization", &auth_header(token))
        .json(&body)
        .map_err(transport)?
        .send()
        .await
        .map_err(transport)?;

    if resp.ok() {
        resp.json().await.map_err(decode)
    } else {
        Err(parse_error(resp).await)
    }
}

// ── Routing ─────────────────────────────────────────────────────────

pub async fn compute_route(token: &str, request: &RouteRequest) -> ApiResult<RouteResponse> {
    let resp = Request::post("/api/resilience/routing")
        .header("Authorization", &auth_header(token))
        .json(request)
        .map_err(transport)?
        .send()
        .await
        .map_err(transport)?;

    if resp.ok() {
        let response: RouteResponse = resp.json().await.map_err(decode)?;
        response.checked()
    } else {
        Err(parse_error(resp).await)
    }
}

pub async fn routing_history(token: &str) -> ApiResult<RouteHistory> {
    let resp = Request::get("/api/resilience/routing/history")
        .header("Authorization", &auth_header(token))
        .send()
        .await
        .map_err(transport)?;

    if resp.ok() {
        resp.json().await.map_err(decode)
    } else {
        Err(parse_error(resp).await)
    }
}

#[derive(Deserialize)]
pub struct RetrainResponse {
    pub status: String,
}

pub async fn retrain_penalty(token: &str) -> ApiResult<RetrainResponse> {
    let resp = Request::post("/api/resilience/retrain-penalty")
        .header("Authorization", &auth_header(token))
        .header("Content-Type", "application/json")
        .body("{}")
        .map_err(transport)?
        .send()
        .await
        .map_err(transport)?;

    if resp.ok() {
        resp.json().await.map_err(decode)
    } else {
        Err(parse_error(resp).await)
    }
}

// ── Configuration / health ──────────────────────────────────────────

pub async fn get_config(token: &str) -> ApiResult<ThresholdConfig> {
    let resp = Request::get("/api/resilience/config")
        .header("Authorization", &auth_header(token))
        .send()
        .await
        .map_err(transport)?;

    if resp.ok() {
        resp.json().await.map_err(decode)
    } else {
        Err(parse_error(resp).await)
    }
}

#[derive(Deserialize)]
pub struct UpdateConfigResponse {
    pub status: String,
    pub config: ThresholdConfig,
}

pub async fn update_config(token: &str, config: &ThresholdConfig) -> ApiResult<UpdateConfigResponse> {
    let resp = Request::post("/api/resilience/config")
        .header("Authorization", &auth_header(token))
        .json(config)
        .map_err(transport)?
        .send()
        .await
        .map_err(transport)?;

    if resp.ok() {
        resp.json().await.map_err(decode)
    } else {
        Err(parse_error(resp).await)
    }
}

/// Unauthenticated liveness probe, polled by the shell.
pub async fn health_check() -> ApiResult<HealthStatus> {
    let resp = Request::get("/api/resilience/health-check")
        .send()
        .await
        .map_err(transport)?;

    if resp.ok() {
        resp.json().await.map_err(decode)
    } else {
        Err(parse_error(resp).await)
    }
}

// ── Capability implementations ──────────────────────────────────────

/// [`TelemetryApi`] over the live backend.
#[derive(Clone, Copy, Default)]
pub struct HttpTelemetryApi;

impl TelemetryApi for HttpTelemetryApi {
    async fn submit_reading(&self, token: &str, reading: &MetricReading) -> Result<(), ApiError> {
        submit_reading(token, reading).await
    }

    async fn analyze(&self, token: &str, data: &[f64]) -> Result<AnalysisReport, ApiError> {
        analyze(token, data).await
    }
}

/// [`CredentialProvider`] over browser LocalStorage.
#[derive(Clone, Copy, Default)]
pub struct StoredCredentials;

impl CredentialProvider for StoredCredentials {
    fn token(&self) -> Option<String> {
        LocalStorage::get(TOKEN_KEY).ok()
    }
}

/// [`TimerFactory`] over gloo interval timers. Dropping the returned
/// handle cancels the interval.
#[derive(Clone, Copy, Default)]
pub struct BrowserTimers;

impl TimerFactory for BrowserTimers {
    type Handle = gloo_timers::callback::Interval;

    fn every(&self, period: Duration, mut tick: Box<dyn FnMut()>) -> Self::Handle {
        // setInterval takes a u32 of milliseconds; saturate rather than wrap.
        let millis = u32::try_from(period.as_millis()).unwrap_or(u32::MAX);
        gloo_timers::callback::Interval::new(millis, move || tick())
    }
}
