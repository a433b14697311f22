//! # Annotext 웹 서버 진입점
//!
//! 주석 기반 문서 수정 서비스입니다. 사용자가 문서의 구간에 코멘트를 달면
//! 외부 LLM 서비스가 수정안을 만들고, 수락된 수정은 버전 이력으로 남습니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 연결 풀 생성 + 마이그레이션
//! 4. 주석 캐시 디렉토리 생성
//! 5. 외부 수정 서비스 클라이언트 구성
//! 6. API 라우터 설정 후 HTTP 서버 시작

mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;

use std::{path::Path, sync::Arc};

use anyhow::Result;
use axum::Router;
use config::Config;
use routes::AppState;
use services::{
    annotations::AnnotationStore,
    processing::ProcessingTracker,
    revision_client::{OpenAiRevisionService, RevisionClient},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "annotext=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting Annotext server on {}:{}", config.host, config.port);

    let pool = db::connect(&config.database_url, 5).await?;

    let annotations_path = Path::new(&config.annotations_path);
    if !annotations_path.exists() {
        tokio::fs::create_dir_all(annotations_path).await?;
        tracing::info!("Created annotations directory: {}", config.annotations_path);
    }

    if config.revision.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; revision requests will be rejected upstream");
    }
    let max_attempts = config.revision.max_attempts;
    let retry_base_delay = config.revision.retry_base_delay;
    let service = OpenAiRevisionService::new(config.revision.clone())?;

    // 핸들러가 공유하는 세션 컨텍스트. 전역 상태는 두지 않습니다.
    let state = AppState {
        pool,
        jwt_secret: config.jwt_secret.clone(),
        annotations: Arc::new(AnnotationStore::new(&config.annotations_path)),
        revisions: RevisionClient::new(Arc::new(service), max_attempts, retry_base_delay),
        processing: ProcessingTracker::new(),
    };

    // 개발 환경에서는 모든 출처를 허용합니다.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api/v1", routes::api_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
