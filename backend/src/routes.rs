use crate::batch::{self, BatchTable};
use crate::config::AppConfig;
use crate::history::HistoryService;
use crate::report;
use crate::sentiment::SentimentPipeline;
use crate::session::SessionId;
use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::StatusCode;
use actix_web::{web, Error, HttpResponse};
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;
use shared::{ErrorResponse, HistoryEntry, PredictRequest, PredictResponse, EMPTY_TEXT_WARNING};
use std::path::PathBuf;

pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/predict").route(web::post().to(predict)))
        .service(web::resource("/api/batch").route(web::post().to(handle_batch)))
        .service(
            web::resource("/api/history")
                .route(web::get().to(get_history))
                .route(web::delete().to(clear_history)),
        )
        .service(web::resource("/api/history/export.csv").route(web::get().to(export_csv)))
        .service(web::resource("/api/history/export.pdf").route(web::get().to(export_pdf)));
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: PathBuf) {
    configure_api(cfg);
    cfg.service(Files::new("/", frontend_dir).index_file("index.html"));
}

fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: message.into(),
    })
}

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename.to_string())],
        })
        .body(body)
}

async fn health(pipeline: web::Data<SentimentPipeline>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "classifier": pipeline.classifier_name(),
        "features": pipeline.n_features(),
    }))
}

async fn predict(
    pipeline: web::Data<SentimentPipeline>,
    history: web::Data<HistoryService>,
    session: SessionId,
    request: web::Json<PredictRequest>,
) -> HttpResponse {
    let PredictRequest { text, lang_hint } = request.into_inner();
    if text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, EMPTY_TEXT_WARNING);
    }

    let scoring = pipeline.clone();
    let input = text.clone();
    let result = web::block(move || scoring.classify(&input, lang_hint.as_deref())).await;

    match result {
        Ok(Ok(classification)) => {
            history
                .append(
                    session.0,
                    HistoryEntry::new(
                        text,
                        classification.label,
                        classification.confidence,
                        Utc::now(),
                    ),
                )
                .await;
            info!(
                "Session {} predicted {} ({:?})",
                session.0, classification.label, classification.confidence
            );
            HttpResponse::Ok().json(PredictResponse {
                label: classification.label,
                class_id: classification.label.class_id(),
                confidence: classification.confidence,
                scored_text: classification.scored_text,
                translated: classification.translated,
            })
        }
        Ok(Err(e)) => {
            error!("Classification failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Model error: {}", e))
        }
        Err(e) => {
            error!("Classification task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Classification task failed")
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchQuery {
    format: Option<String>,
}

/// Reads the first non-empty multipart field, bounded by `limit` bytes.
async fn read_upload(payload: &mut Multipart, limit: usize) -> Result<Option<Vec<u8>>, Error> {
    while let Some(mut field) = payload.try_next().await? {
        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if data.len() + chunk.len() > limit {
                return Err(actix_web::error::ErrorPayloadTooLarge(format!(
                    "Upload exceeds {} bytes",
                    limit
                )));
            }
            data.extend_from_slice(&chunk);
        }
        if !data.is_empty() {
            return Ok(Some(data));
        }
    }
    Ok(None)
}

async fn handle_batch(
    pipeline: web::Data<SentimentPipeline>,
    history: web::Data<HistoryService>,
    config: web::Data<AppConfig>,
    session: SessionId,
    query: web::Query<BatchQuery>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let data = match read_upload(&mut payload, config.max_upload_bytes).await {
        Ok(Some(data)) => data,
        Ok(None) => {
            return Ok(error_response(StatusCode::BAD_REQUEST, "No CSV file uploaded"));
        }
        Err(e) => {
            warn!("Rejected batch upload: {}", e);
            return Ok(error_response(e.as_response_error().status_code(), e.to_string()));
        }
    };

    let table = match BatchTable::parse(&data, &config.batch_text_column) {
        Ok(table) => table,
        Err(e) => {
            warn!("Invalid batch file: {}", e);
            return Ok(error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
        }
    };
    info!("Session {} uploaded {} batch rows", session.0, table.rows.len());

    let scoring = pipeline.clone();
    let outcome = match web::block(move || batch::score_table(&scoring, table)).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            error!("Batch classification failed: {}", e);
            return Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Model error: {}", e),
            ));
        }
        Err(e) => {
            error!("Batch task failed: {}", e);
            return Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Batch task failed",
            ));
        }
    };

    history.append_many(session.0, outcome.history).await;

    if query.format.as_deref() == Some("csv") {
        return Ok(match batch::to_csv(&outcome.response) {
            Ok(csv) => attachment("text/csv", "sentiment_predictions.csv", csv),
            Err(e) => {
                error!("Failed to encode batch CSV: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        });
    }
    Ok(HttpResponse::Ok().json(outcome.response))
}

async fn get_history(history: web::Data<HistoryService>, session: SessionId) -> HttpResponse {
    HttpResponse::Ok().json(history.snapshot(session.0).await)
}

async fn clear_history(history: web::Data<HistoryService>, session: SessionId) -> HttpResponse {
    let removed = history.clear(session.0).await;
    info!("Cleared {} history entries for session {}", removed, session.0);
    HttpResponse::NoContent().finish()
}

async fn export_csv(history: web::Data<HistoryService>, session: SessionId) -> HttpResponse {
    let entries = history.entries(session.0).await;
    match report::history_csv(&entries) {
        Ok(csv) => attachment("text/csv", "sentiment_history.csv", csv),
        Err(e) => {
            error!("CSV export failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn export_pdf(history: web::Data<HistoryService>, session: SessionId) -> HttpResponse {
    let entries = history.entries(session.0).await;
    match web::block(move || report::history_pdf(&entries)).await {
        Ok(Ok(pdf)) => attachment("application/pdf", "sentiment_report.pdf", pdf),
        Ok(Err(e)) => {
            error!("PDF export failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            error!("PDF export task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "PDF export failed")
        }
    }
}
