//! HTTP request handlers for the Monitor API

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::{AnalysisAutomation, SyncAutomation};
use crate::errors::ConfigError;
use crate::run_tracker::RunRecord;
use crate::web::AppState;

// Helper type for API responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
pub struct RunsQuery {
    #[serde(default = "default_runs_limit")]
    pub limit: usize,
}

fn default_runs_limit() -> usize {
    50
}

/// Scheduler statuses plus the currently active runs.
pub async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let automation = state.automation.status();
    let runs = state.run_tracker.status();

    Json(ApiResponse::success(json!({
        "automation": automation,
        "runs": runs,
        "alerts_enabled": state.alert_service.is_enabled(),
    })))
}

/// Current automation settings as stored in the configuration.
pub async fn get_automation_settings(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let config = state.config_manager.get_current_config().await;

    Json(ApiResponse::success(json!({
        "analysis": config.analysis.automation,
        "sync": config.sync.automation,
    })))
}

/// Update analysis automation settings. Persist and apply happen as one
/// serialized step; the schedule is only reconfigured when a field actually
/// changed.
pub async fn update_analysis_automation(
    State(state): State<AppState>,
    Json(settings): Json<AnalysisAutomation>,
) -> ApiResult<Value> {
    info!("Analysis automation settings update requested");

    match state
        .automation
        .update_analysis_settings(&state.config_manager, &settings)
        .await
    {
        Ok(changed) => {
            Ok(Json(ApiResponse::success(json!({
                "changed": changed,
                "settings": settings,
            }))))
        }
        Err(e) => {
            error!("Failed to update analysis automation settings: {}", e);
            Err(config_error_response(e))
        }
    }
}

/// Update sync automation settings; same contract as the analysis variant.
pub async fn update_sync_automation(
    State(state): State<AppState>,
    Json(settings): Json<SyncAutomation>,
) -> ApiResult<Value> {
    info!("Sync automation settings update requested");

    match state
        .automation
        .update_sync_settings(&state.config_manager, &settings)
        .await
    {
        Ok(changed) => {
            Ok(Json(ApiResponse::success(json!({
                "changed": changed,
                "settings": settings,
            }))))
        }
        Err(e) => {
            error!("Failed to update sync automation settings: {}", e);
            Err(config_error_response(e))
        }
    }
}

/// Manual analysis trigger. Conflicts with an in-flight run return 409.
pub async fn run_analysis_now(State(state): State<AppState>) -> ApiResult<Value> {
    info!("Manual analysis run requested");

    if state.automation.run_analysis_now() {
        Ok(Json(ApiResponse::success(json!({
            "message": "Analysis run started",
            "status": "started"
        }))))
    } else {
        Err((
            StatusCode::CONFLICT,
            Json(ApiResponse::error(
                "An analysis run is already in progress".to_string(),
            )),
        ))
    }
}

/// Manual sync trigger. Conflicts with an in-flight run return 409.
pub async fn run_sync_now(State(state): State<AppState>) -> ApiResult<Value> {
    info!("Manual sync run requested");

    if state.automation.run_sync_now() {
        Ok(Json(ApiResponse::success(json!({
            "message": "Sync run started",
            "status": "started"
        }))))
    } else {
        Err((
            StatusCode::CONFLICT,
            Json(ApiResponse::error(
                "A sync run is already in progress".to_string(),
            )),
        ))
    }
}

/// Recent run history, most recent first.
pub async fn get_recent_runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Json<ApiResponse<Vec<RunRecord>>> {
    Json(ApiResponse::success(
        state.run_tracker.recent_runs(query.limit),
    ))
}

fn config_error_response(e: ConfigError) -> (StatusCode, Json<ApiResponse<()>>) {
    let status = match e {
        ConfigError::InvalidValue { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::error(e.to_string())))
}
