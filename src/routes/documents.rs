//! # 문서(Document) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/documents`              → 내 문서 목록
//! - `POST   /api/v1/documents`              → 새 문서 생성 (내용이 있으면 v1 기록)
//! - `GET    /api/v1/documents/{id}`         → 단일 문서 조회
//! - `DELETE /api/v1/documents/{id}`         → 문서 삭제 (버전/변경 기록/주석 캐시 포함)
//! - `GET    /api/v1/documents/{id}/content` → 현재 텍스트 (버전이 없으면 `null`)
//!
//! 모든 핸들러는 `AuthUser`로 요청자를 확인하고, 다른 사용자의 문서에는
//! `AccessDenied`(403)를 돌려줍니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    services::{
        annotations::AnnotationStore, processing::ProcessingTracker,
        revision_client::RevisionClient,
    },
};

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 전역 싱글턴 대신 이 구조체 하나로 세션 의존성을 주입합니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// JWT 토큰 검증용 비밀키
    pub jwt_secret: String,
    /// 문서별 주석 캐시
    pub annotations: Arc<AnnotationStore>,
    /// 외부 수정 서비스 클라이언트 (재시도 포함)
    pub revisions: RevisionClient,
    /// 문서별 처리 중 상태
    pub processing: ProcessingTracker,
}

const INITIAL_VERSION_EXPLANATION: &str = "Initial version";

/// `GET /documents`: 요청자가 소유한 문서 목록
pub async fn list_documents(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let documents = db::list_documents(&state.pool, &auth_user.user_id).await?;
    Ok(Json(json!({ "documents": documents })))
}

/// `GET /documents/{id}`
pub async fn get_document(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let document = db::get_owned_document(&state.pool, &id, &auth_user.user_id).await?;
    Ok(Json(document))
}

/// `POST /documents`: 새 문서를 생성합니다.
///
/// `content`가 비어 있지 않으면 이전 버전이 없는 첫 버전(v1)과
/// 변경 기록(`"" → content`)을 함께 남깁니다.
pub async fn create_document(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled");

    let id = uuid::Uuid::now_v7().to_string();
    let mut document = db::create_document(&state.pool, &id, &auth_user.user_id, title).await?;

    if let Some(content) = req.content.as_deref().filter(|c| !c.is_empty()) {
        db::create_document_version(
            &state.pool,
            &id,
            &auth_user.user_id,
            content,
            Some(INITIAL_VERSION_EXPLANATION),
            Some(None),
            |previous| {
                ChangeDraft::wholesale(
                    previous,
                    content,
                    Some(INITIAL_VERSION_EXPLANATION.to_string()),
                )
            },
        )
        .await?;
        document = db::get_owned_document(&state.pool, &id, &auth_user.user_id).await?;
    }

    tracing::info!(document_id = %id, owner_id = %auth_user.user_id, "document created");
    Ok((StatusCode::CREATED, Json(document)))
}

/// `DELETE /documents/{id}`: 버전과 변경 기록은 CASCADE로, 주석 캐시는 직접 지웁니다.
pub async fn delete_document(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    db::get_owned_document(&state.pool, &id, &auth_user.user_id).await?;

    if !db::delete_document(&state.pool, &id).await? {
        return Err(AppError::NotFound);
    }
    state.annotations.clear(&id).await?;

    tracing::info!(document_id = %id, "document deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /documents/{id}/content`: 현재 버전의 텍스트
pub async fn get_document_content(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DocumentContent>, AppError> {
    db::get_owned_document(&state.pool, &id, &auth_user.user_id).await?;
    let content = db::current_text(&state.pool, &id).await?;
    Ok(Json(DocumentContent { content }))
}
