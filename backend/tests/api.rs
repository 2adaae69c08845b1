use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use sentiment_backend::config::AppConfig;
use sentiment_backend::history::HistoryService;
use sentiment_backend::routes::configure_api;
use ndarray::ArrayView1;
use sentiment_backend::sentiment::{
    PipelineError, ProbabilityError, SentimentPipeline, SentimentPipelineBuilder, TextClassifier,
    TfidfVectorizer,
};
use sentiment_backend::session::{SessionMiddleware, SESSION_COOKIE};
use serde_json::{json, Value};
use shared::{BatchResponse, ErrorResponse, HistoryResponse, PredictResponse, SentimentLabel};
use std::path::Path;

const BOUNDARY: &str = "----sentiment-test-boundary";

fn bundled_pipeline() -> SentimentPipeline {
    let models = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
    SentimentPipelineBuilder::from_paths(
        models.join("sentiment_model.json"),
        models.join("tfidf_vectorizer.json"),
    )
    .build()
    .unwrap()
}

/// Classifier whose every prediction fails, as with a corrupt model.
struct BrokenClassifier;

impl TextClassifier for BrokenClassifier {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn n_features(&self) -> usize {
        2
    }

    fn predict(&self, _: ArrayView1<f64>) -> Result<SentimentLabel, PipelineError> {
        Err(PipelineError::NonFiniteDecision)
    }

    fn predict_proba(&self, _: ArrayView1<f64>) -> Result<[f64; 2], ProbabilityError> {
        Err(ProbabilityError::Unsupported)
    }
}

fn broken_pipeline() -> SentimentPipeline {
    let vectorizer =
        TfidfVectorizer::from_json(r#"{"vocabulary": {"great": 0, "worst": 1}, "idf": [1.0, 1.0]}"#)
            .unwrap();
    SentimentPipelineBuilder::from_artifacts(Box::new(BrokenClassifier), Box::new(vectorizer))
        .build()
        .unwrap()
}

macro_rules! app {
    () => {
        app!(bundled_pipeline())
    };
    ($pipeline:expr) => {
        test::init_service(
            App::new()
                .wrap(SessionMiddleware)
                .app_data(web::Data::new($pipeline))
                .app_data(web::Data::new(HistoryService::new()))
                .app_data(web::Data::new(AppConfig::default()))
                .configure(configure_api),
        )
        .await
    };
}

fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
        .expect("session cookie issued")
}

fn multipart_csv(csv: &str) -> (String, Vec<u8>) {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"tweets.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{BOUNDARY}--\r\n"
    );
    (format!("multipart/form-data; boundary={BOUNDARY}"), body.into_bytes())
}

fn predict_request(cookie: Option<&Cookie<'static>>, text: &str) -> test::TestRequest {
    let req = test::TestRequest::post()
        .uri("/api/predict")
        .set_json(json!({ "text": text }));
    match cookie {
        Some(cookie) => req.cookie(cookie.clone()),
        None => req,
    }
}

macro_rules! predict {
    ($app:expr, $cookie:expr, $text:expr) => {
        test::call_service(&$app, predict_request($cookie, $text).to_request()).await
    };
}

#[actix_web::test]
async fn health_reports_loaded_classifier() {
    let app = app!();
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["classifier"], "logistic_regression");
    assert!(body["features"].as_u64().unwrap() > 0);
}

#[actix_web::test]
async fn predicts_bundled_examples() {
    let app = app!();

    let res = predict!(app, None, "Great leadership!");
    assert_eq!(res.status(), StatusCode::OK);
    let positive: PredictResponse = test::read_body_json(res).await;
    assert_eq!(positive.label, SentimentLabel::Positive);
    assert_eq!(positive.class_id, 1);
    assert_eq!(positive.scored_text, "great leadership!");
    let confidence = positive.confidence.unwrap();
    assert!((50.0..=100.0).contains(&confidence));

    let res = predict!(app, None, "Worst decision ever");
    let negative: PredictResponse = test::read_body_json(res).await;
    assert_eq!(negative.label, SentimentLabel::Negative);
    assert_eq!(negative.class_id, 0);
}

#[actix_web::test]
async fn blank_text_is_rejected_with_warning() {
    let app = app!();
    let res = predict!(app, None, "   \n");
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(res).await;
    assert_eq!(body.error, "Please enter some text to analyze.");
}

#[actix_web::test]
async fn history_is_scoped_to_the_session() {
    let app = app!();

    let first = predict!(app, None, "Great leadership!");
    let cookie = session_cookie(&first);
    predict!(app, Some(&cookie), "Worst decision ever");
    predict!(app, None, "Great leadership!");

    let req = test::TestRequest::get()
        .uri("/api/history")
        .cookie(cookie.clone())
        .to_request();
    let history: HistoryResponse = test::call_and_read_body_json(&app, req).await;
    let texts: Vec<&str> = history.entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Great leadership!", "Worst decision ever"]);
    assert_eq!(history.summary.total, 2);
    assert_eq!(history.summary.positive, 1);
    assert_eq!(history.summary.negative, 1);
    assert!(history.entries[0].confidence.ends_with('%'));

    let req = test::TestRequest::delete()
        .uri("/api/history")
        .cookie(cookie.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri("/api/history")
        .cookie(cookie)
        .to_request();
    let history: HistoryResponse = test::call_and_read_body_json(&app, req).await;
    assert!(history.entries.is_empty());
}

#[actix_web::test]
async fn batch_scores_rows_and_records_history() {
    let app = app!();
    let (content_type, body) =
        multipart_csv("id,text\n1,Great leadership!\n2,\n3,Worst decision ever");

    let req = test::TestRequest::post()
        .uri("/api/batch")
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res);
    let batch: BatchResponse = test::read_body_json(res).await;

    assert_eq!(batch.columns, vec!["id", "text", "Sentiment", "Confidence"]);
    assert_eq!(batch.rows.len(), 3);
    assert_eq!(batch.rows[0][2], "Positive");
    assert_eq!(batch.rows[1][2], "");
    assert_eq!(batch.rows[2][2], "Negative");
    assert_eq!((batch.scored, batch.skipped), (2, 1));

    let req = test::TestRequest::get()
        .uri("/api/history")
        .cookie(cookie)
        .to_request();
    let history: HistoryResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(history.summary.total, 2);
}

#[actix_web::test]
async fn batch_can_return_csv() {
    let app = app!();
    let (content_type, body) = multipart_csv("text\nGreat leadership!");

    let req = test::TestRequest::post()
        .uri("/api/batch?format=csv")
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "text/csv");
    let csv = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert!(csv.starts_with("text,Sentiment,Confidence\n"));
    assert!(csv.contains("Great leadership!,Positive,"));
}

#[actix_web::test]
async fn batch_without_text_column_is_unprocessable() {
    let app = app!();
    let (content_type, body) = multipart_csv("tweet\nGreat leadership!");

    let req = test::TestRequest::post()
        .uri("/api/batch")
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorResponse = test::read_body_json(res).await;
    assert!(body.error.contains("'text'"));
}

#[actix_web::test]
async fn exports_history_as_csv_and_pdf() {
    let app = app!();
    let first = predict!(app, None, "Great leadership!");
    let cookie = session_cookie(&first);

    let req = test::TestRequest::get()
        .uri("/api/history/export.csv")
        .cookie(cookie.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let disposition = res.headers().get(header::CONTENT_DISPOSITION).unwrap();
    assert!(disposition.to_str().unwrap().contains("sentiment_history.csv"));
    let csv = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("Text,Sentiment,Confidence"));
    assert!(lines.next().unwrap().starts_with("Great leadership!,Positive,"));

    let req = test::TestRequest::get()
        .uri("/api/history/export.pdf")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let pdf = test::read_body(res).await;
    assert!(pdf.starts_with(b"%PDF-"));
}

#[actix_web::test]
async fn model_failure_is_a_server_error() {
    let app = app!(broken_pipeline());

    let res = predict!(app, None, "Great leadership!");
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let cookie = session_cookie(&res);
    let body: ErrorResponse = test::read_body_json(res).await;
    assert!(body.error.starts_with("Model error"), "{}", body.error);

    let (content_type, body) = multipart_csv("text\nGreat leadership!\nWorst decision ever");
    let req = test::TestRequest::post()
        .uri("/api/batch")
        .cookie(cookie.clone())
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = test::read_body_json(res).await;
    assert!(body.error.starts_with("Model error"), "{}", body.error);

    // Nothing from the failed requests lands in the history.
    let req = test::TestRequest::get()
        .uri("/api/history")
        .cookie(cookie)
        .to_request();
    let history: HistoryResponse = test::call_and_read_body_json(&app, req).await;
    assert!(history.entries.is_empty());
}
