use gloo_net::http::{Request, Response};
use shared::{BatchResponse, ErrorResponse, HistoryResponse, PredictRequest, PredictResponse};
use std::fmt;
use web_sys::{File, FormData};

pub const HISTORY_CSV_URL: &str = "/api/history/export.csv";
pub const HISTORY_PDF_URL: &str = "/api/history/export.pdf";

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Network(String),
    Server { status: u16, message: String },
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e) => write!(f, "Network error: {}", e),
            ApiError::Server { status, message } => write!(f, "Server error {}: {}", status, message),
            ApiError::Decode(e) => write!(f, "Failed to parse response: {}", e),
        }
    }
}

impl From<gloo_net::Error> for ApiError {
    fn from(e: gloo_net::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

/// Pulls the `{ "error": ... }` message out of a failed response, falling back to the raw body.
async fn server_error(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    ApiError::Server { status, message }
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if !response.ok() {
        return Err(server_error(response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

pub async fn predict(text: String, lang_hint: Option<String>) -> Result<PredictResponse, ApiError> {
    let response = Request::post("/api/predict")
        .json(&PredictRequest { text, lang_hint })?
        .send()
        .await?;
    decode(response).await
}

pub async fn upload_batch(file: File) -> Result<BatchResponse, ApiError> {
    let form_data = FormData::new().map_err(|e| ApiError::Network(format!("{:?}", e)))?;
    form_data
        .append_with_blob_and_filename("file", &file, &file.name())
        .map_err(|e| ApiError::Network(format!("{:?}", e)))?;

    let response = Request::post("/api/batch").body(form_data)?.send().await?;
    decode(response).await
}

pub async fn fetch_history() -> Result<HistoryResponse, ApiError> {
    let response = Request::get("/api/history").send().await?;
    decode(response).await
}

pub async fn clear_history() -> Result<(), ApiError> {
    let response = Request::delete("/api/history").send().await?;
    if !response.ok() {
        return Err(server_error(response).await);
    }
    Ok(())
}
