//! # 버전(Version) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `POST /api/v1/documents/{id}/versions` → 수동 편집 저장 (새 버전 + 변경 기록)
//! - `GET  /api/v1/documents/{id}/versions` → 버전 요약 목록 (최신순)
//! - `GET  /api/v1/documents/{id}/history`  → 변경 기록 목록 (최신순)
//! - `GET  /api/v1/versions/{id}`           → 버전 하나 (내용 포함)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{db, error::AppError, middleware::auth::AuthUser, models::*};

use super::documents::AppState;

/// `POST /documents/{id}/versions`
///
/// 인덱스와 원문/수정문 메타데이터는 선택 항목입니다. 빠진 항목은 문서 전체 교체
/// 기준(`0`, `len(content)`, 이전 내용, 새 내용)으로 채웁니다.
pub async fn create_version(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<CreateVersionRequest>,
) -> Result<(StatusCode, Json<VersionWithChange>), AppError> {
    if req.start_index.is_some_and(|i| i < 0) || req.end_index.is_some_and(|i| i < 0) {
        tracing::warn!(document_id = %id, operation = "create_version", "rejected: negative index");
        return Err(AppError::Validation(
            "Change indices must not be negative".to_string(),
        ));
    }
    if let (Some(start), Some(end)) = (req.start_index, req.end_index) {
        if start > end {
            tracing::warn!(document_id = %id, start, end, "rejected: inverted change range");
            return Err(AppError::Validation(
                "start_index must not exceed end_index".to_string(),
            ));
        }
    }

    let explanation = req.explanation.as_deref().filter(|e| !e.trim().is_empty());
    let expected = req.expected_previous_version_id.as_ref().map(Option::as_deref);

    let saved = db::create_document_version(
        &state.pool,
        &id,
        &auth_user.user_id,
        &req.content,
        explanation,
        expected,
        |previous| {
            let wholesale = ChangeDraft::wholesale(
                previous,
                &req.content,
                explanation.map(str::to_string),
            );
            ChangeDraft {
                start_index: req.start_index.unwrap_or(wholesale.start_index),
                end_index: req.end_index.unwrap_or(wholesale.end_index),
                original_text: req.original_text.clone().unwrap_or(wholesale.original_text),
                updated_text: req.updated_text.clone().unwrap_or(wholesale.updated_text),
                explanation: wholesale.explanation,
            }
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn list_versions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    db::get_owned_document(&state.pool, &id, &auth_user.user_id).await?;

    let versions: Vec<TextVersionSummary> = db::version_chain(&state.pool, &id)
        .await?
        .into_iter()
        .map(TextVersionSummary::from)
        .collect();
    Ok(Json(json!({ "versions": versions })))
}

pub async fn get_version_content(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TextVersion>, AppError> {
    let version = db::get_version(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;

    // 문서 소유권 확인
    db::get_owned_document(&state.pool, &version.document_id, &auth_user.user_id).await?;

    Ok(Json(version))
}

pub async fn get_history(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    db::get_owned_document(&state.pool, &id, &auth_user.user_id).await?;
    let changes = db::list_history(&state.pool, &id).await?;
    Ok(Json(json!({ "changes": changes })))
}
