use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::plate::{export, PlateError, PlateRequest, PlateStyle};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub emirate: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub style: PlateStyle,
    /// "png" (default) returns image bytes; "dataurl" returns a JSON
    /// envelope for inline previews.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DataUrlResponse {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlatesIndex {
    pub emirates: Vec<String>,
    pub styles: Vec<String>,
}

#[utoipa::path(get, path = "/health", tag = "plategen", responses((status = 200, body = HealthResponse)))]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

#[utoipa::path(
    get,
    path = "/plates",
    tag = "plategen",
    responses((status = 200, body = PlatesIndex))
)]
pub async fn plates(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    Json(PlatesIndex {
        emirates: st.engine.emirates().iter().map(|s| s.to_string()).collect(),
        styles: PlateStyle::all().iter().map(|s| s.as_str().to_string()).collect(),
    })
}

fn error_status(e: &PlateError) -> StatusCode {
    match e {
        // The request named an image we don't have or can't use.
        PlateError::InvalidInput(_) | PlateError::Template(_) => StatusCode::BAD_REQUEST,
        PlateError::FontLoad(_) | PlateError::Render(_) | PlateError::Export(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[utoipa::path(
    post,
    path = "/generate",
    tag = "plategen",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Rendered plate PNG", content_type = "image/png"),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Render failure")
    )
)]
pub async fn generate(
    State(st): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Response, (StatusCode, String)> {
    if req.emirate.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "emirate is required".to_string()));
    }

    let preq = PlateRequest {
        emirate: req.emirate,
        code: req.code,
        number: req.number,
        style: req.style,
    };
    let plate = st
        .engine
        .render(&preq)
        .await
        .map_err(|e| (error_status(&e), e.to_string()))?;

    if req.format.as_deref() == Some("dataurl") {
        return Ok(Json(DataUrlResponse {
            data_url: export::png_data_url(&plate.png),
            width: plate.width,
            height: plate.height,
        })
        .into_response());
    }

    let filename =
        export::download_filename(&preq.emirate, preq.style, &preq.code, &preq.number);
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut resp = plate.png.clone().into_response();
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    resp.headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    Ok(resp)
}
