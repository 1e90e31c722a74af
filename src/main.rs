use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use media_insight::app_state::AppState;
use media_insight::config::AppConfig;
use media_insight::routes;
use media_insight::services::{
    acquire::AssetAcquirer,
    analysis::{AnalysisConfig, MediaAnalyzer},
    genai::{GeminiClient, GenerationConfig, SeedExchange},
    insight::InsightSynthesizer,
    pipeline::Pipeline,
    recognition::RekognitionBackend,
    scrape::ApifyScraper,
    storage::{MediaStoreGateway, S3MediaStore},
    transcription::TranscribeBackend,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing media-insight server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!(
        "pipeline_requests_total",
        "Total processing requests received"
    );
    metrics::describe_counter!(
        "pipeline_requests_failed_total",
        "Processing requests that aborted before synthesis"
    );
    metrics::describe_counter!(
        "analysis_jobs_failed_total",
        "Analysis jobs absorbed as failed, by job"
    );
    metrics::describe_counter!(
        "synthesis_failed_total",
        "Synthesis calls degraded to the sentinel answer"
    );
    metrics::describe_histogram!(
        "pipeline_processing_seconds",
        "End-to-end time of one pipeline execution"
    );

    // One HTTP client shared by every collaborator that speaks plain HTTP
    let http = reqwest::Client::new();

    // AWS clients for the analysis collaborators
    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;

    tracing::info!(bucket = %config.s3_bucket, "Initializing S3 media store");
    let store =
        S3MediaStore::new(&config.s3_bucket, &config.aws_region).expect("Failed to initialize S3");
    let gateway = MediaStoreGateway::new(Arc::new(store));

    tracing::info!("Initializing recognition and transcription clients");
    let recognition = Arc::new(RekognitionBackend::new(&sdk_config));
    let transcription = Arc::new(TranscribeBackend::new(
        &sdk_config,
        http.clone(),
        config.transcribe_language_code.clone(),
    ));
    let analyzer = MediaAnalyzer::new(
        recognition,
        transcription,
        AnalysisConfig {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_poll_attempts: config.max_poll_attempts,
        },
    );

    tracing::info!("Initializing social-media scraper client");
    let scraper = Arc::new(ApifyScraper::new(
        http.clone(),
        config.apify_token.clone(),
        config.apify_actor.clone(),
    ));
    let acquirer = AssetAcquirer::new(http.clone(), scraper);

    tracing::info!(model = %config.gemini_model, "Initializing generative model client");
    let seed = SeedExchange::default();
    let model = Arc::new(GeminiClient::new(
        http,
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        seed.clone(),
        GenerationConfig::default(),
    ));
    let synthesizer = InsightSynthesizer::new(model, seed);

    let pipeline = Pipeline::new(acquirer, gateway, analyzer, synthesizer);

    let shutdown = CancellationToken::new();
    let state = AppState::new(pipeline, shutdown.clone());

    // Build API routes
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/process", post(routes::process::process_media))
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(100 * 1024 * 1024)); // 100 MB: video uploads

    tracing::info!("Starting media-insight on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for shutdown signal");
            tracing::info!("Shutdown signal received, cancelling in-flight work");
            shutdown.cancel();
        })
        .await
        .expect("Server error");
}
