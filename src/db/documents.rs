//! # 문서 데이터베이스 쿼리 모듈
//!
//! `documents` 테이블에 대한 조회/생성/삭제 쿼리 함수들입니다.
//! 문서 내용(`content`)은 여기서 직접 바꾸지 않습니다.
//! 내용 변경은 항상 버전 원장(`db::versions`)을 거칩니다.

use crate::error::AppError;
use crate::models::Document;
use sqlx::SqlitePool;

/// 사용자가 소유한 문서 목록 (최근 수정 순)
pub async fn list_documents(pool: &SqlitePool, owner_id: &str) -> Result<Vec<Document>, AppError> {
    let docs = sqlx::query_as::<_, Document>(
        r#"
        SELECT id, owner_id, title, content, created_at, updated_at
        FROM documents
        WHERE owner_id = ?
        ORDER BY updated_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(docs)
}

/// ID로 단일 문서를 조회합니다. 소유권은 확인하지 않습니다.
pub async fn get_document(pool: &SqlitePool, id: &str) -> Result<Option<Document>, AppError> {
    let doc = sqlx::query_as::<_, Document>(
        r#"
        SELECT id, owner_id, title, content, created_at, updated_at
        FROM documents
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(doc)
}

/// 문서를 조회하고 요청자가 소유자인지 확인합니다.
///
/// # 반환값
/// - `Err(AppError::NotFound)`: 문서가 없음
/// - `Err(AppError::AccessDenied)`: 다른 사용자의 문서 (NotFound로 숨기지 않습니다)
pub async fn get_owned_document(
    pool: &SqlitePool,
    id: &str,
    owner_id: &str,
) -> Result<Document, AppError> {
    let doc = get_document(pool, id).await?.ok_or(AppError::NotFound)?;

    if doc.owner_id != owner_id {
        tracing::warn!(document_id = id, requester = owner_id, "access denied to document");
        return Err(AppError::AccessDenied);
    }

    Ok(doc)
}

/// 빈 문서를 생성합니다. 초기 내용은 버전 원장이 기록합니다.
pub async fn create_document(
    pool: &SqlitePool,
    id: &str,
    owner_id: &str,
    title: &str,
) -> Result<Document, AppError> {
    sqlx::query(
        r#"
        INSERT INTO documents (id, owner_id, title)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(title)
    .execute(pool)
    .await?;

    get_document(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created document".to_string()))
}

/// 문서를 삭제합니다. 버전과 변경 기록은 `ON DELETE CASCADE`로 함께 삭제됩니다.
///
/// # 반환값
/// - `Ok(true)`: 삭제 성공
/// - `Ok(false)`: 해당 ID의 문서가 없음
pub async fn delete_document(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
