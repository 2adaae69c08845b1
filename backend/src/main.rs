use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use sentiment_backend::config::AppConfig;
use sentiment_backend::history::HistoryService;
use sentiment_backend::routes::configure_routes;
use sentiment_backend::sentiment::{
    DisabledTranslator, GoogleTranslator, SentimentPipeline, SentimentPipelineBuilder, Translator,
};
use sentiment_backend::session::SessionMiddleware;
use sentiment_backend::shutdown;
use std::env;
use std::io;
use std::time::Duration;

const WORKER_RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

fn translator(config: &AppConfig) -> io::Result<Box<dyn Translator>> {
    if !config.translation.enabled {
        log::info!("Translation disabled; non-English text is scored as-is");
        return Ok(Box::new(DisabledTranslator));
    }
    let endpoint = config
        .translation
        .endpoint_url()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    log::info!(
        "Translating non-English text via {} (timeout {}s)",
        endpoint,
        config.translation.timeout_secs
    );
    let translator = GoogleTranslator::new(endpoint, config.translation.timeout())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    Ok(Box::new(translator))
}

fn load_pipeline(config: &AppConfig) -> io::Result<SentimentPipeline> {
    let pipeline =
        SentimentPipelineBuilder::from_paths(&config.model_path, &config.vectorizer_path)
            .translator(translator(config)?)
            .build();
    match pipeline {
        Ok(pipeline) => Ok(pipeline),
        Err(e) => {
            log::error!("Failed to load model artifacts at startup: {}", e);
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("Model loading failed: {}", e),
            ))
        }
    }
}

// The pipeline owns a blocking HTTP client, which must be built and dropped
// outside the async runtime. The runtime is started by hand and the pipeline
// is reclaimed from the workers before it is dropped here.
fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    let config = AppConfig::load().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let pipeline = web::Data::new(load_pipeline(&config)?);
    let history = web::Data::new(HistoryService::with_idle_ttl(config.session_idle_ttl()));
    let frontend_dir = config.resolve_frontend_dir();
    let bind_address = format!("0.0.0.0:{}", config.port);
    let settings = web::Data::new(config);

    log::info!("Serving dashboard from {}", frontend_dir.display());
    log::info!("Starting server on {}", bind_address);

    let app_pipeline = pipeline.clone();
    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            App::new()
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                        .allowed_headers(vec![
                            actix_web::http::header::ACCEPT,
                            actix_web::http::header::CONTENT_TYPE,
                        ])
                        .max_age(3600),
                )
                .wrap(SessionMiddleware)
                .app_data(app_pipeline.clone())
                .app_data(history.clone())
                .app_data(settings.clone())
                .app_data(web::JsonConfig::default().limit(settings.max_upload_bytes))
                .configure(|cfg| configure_routes(cfg, frontend_dir.clone()))
        })
        .bind(&bind_address)?
        .run()
        .await
    })?;

    match shutdown::reclaim(pipeline.into_inner(), WORKER_RELEASE_TIMEOUT) {
        Ok(pipeline) => drop(pipeline),
        Err(still_shared) => {
            log::warn!("Workers still hold the pipeline after shutdown; leaking it");
            std::mem::forget(still_shared);
        }
    }
    Ok(())
}
