//! # 수정 요청(Processing) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `POST /api/v1/annotations/process`   → 요청 본문의 텍스트와 주석으로 수정 요청
//! - `POST /api/v1/documents/{id}/process` → 저장된 문서와 주석으로 수정 요청
//! - `GET  /api/v1/documents/{id}/process` → `{ "processing": bool }`
//!
//! 수정 결과는 돌려주기만 하고 문서에 적용하지 않습니다. 적용은 `routes::apply`가 합니다.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    services::request_builder::build_request,
};

use super::documents::AppState;

/// `POST /annotations/process`
///
/// 클라이언트가 보낸 `position`은 무시하고 `fullContext`에서 다시 계산합니다.
pub async fn process_annotations(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(req): Json<ProcessAnnotationsRequest>,
) -> Result<Json<RevisionResult>, AppError> {
    let request = build_request(&req.full_context, &req.annotations)?;
    let result = state.revisions.submit(&request).await?;
    Ok(Json(result))
}

/// `POST /documents/{id}/process`
///
/// 같은 문서에 진행 중인 요청이 있으면 외부 서비스를 부르지 않고
/// `202 {"status":"processing"}`을 돌려줍니다.
pub async fn process_document(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    db::get_owned_document(&state.pool, &id, &auth_user.user_id).await?;

    let Some(_ticket) = state.processing.try_begin(&id) else {
        tracing::debug!(document_id = %id, "revision request already in flight");
        return Ok((StatusCode::ACCEPTED, Json(json!({ "status": "processing" }))).into_response());
    };

    let text = db::current_text(&state.pool, &id).await?.ok_or_else(|| {
        tracing::warn!(document_id = %id, operation = "process_document", "rejected: no content");
        AppError::Validation("Document has no content to revise".to_string())
    })?;

    let inputs: Vec<AnnotationInput> = state
        .annotations
        .restore(&id, &text)
        .await?
        .iter()
        .map(|placed| AnnotationInput::from(&placed.annotation))
        .collect();

    let request = build_request(&text, &inputs)?;
    tracing::info!(
        document_id = %id,
        annotations = request.annotations.len(),
        "submitting revision request"
    );
    let result = state.revisions.submit(&request).await?;

    Ok(Json(result).into_response())
}

/// `GET /documents/{id}/process`
pub async fn processing_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    db::get_owned_document(&state.pool, &id, &auth_user.user_id).await?;
    Ok(Json(json!({ "processing": state.processing.is_processing(&id) })))
}
