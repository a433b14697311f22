//! # 버전 & 변경 기록 원장 (Version & Change Ledger)
//!
//! 수락된 편집마다 불변 텍스트 버전 하나와 변경 기록 하나를 남깁니다.
//!
//! ## 버전 체인
//! ```text
//! NO_VERSION → v1 (prev = NULL) → v2 (prev = v1) → v3 (prev = v2) → …
//! ```
//! - "현재 버전" = 문서에서 가장 최근에 만든 버전 (`version_number` 최대값)
//! - 체인은 늘어나기만 합니다. 문서가 삭제될 때만 함께 삭제됩니다 (CASCADE).
//! - 쓰기 트랜잭션은 `BEGIN IMMEDIATE`로 시작하므로 작성자들은 한 줄로 섭니다.
//!   같은 토큰을 들고 온 나중 작성자는 충돌(Conflict)로 거부됩니다.
//! - `(document_id, version_number)` 고유 제약이 마지막 방어선입니다. 잠금 대기가
//!   시간 초과되거나 번호가 겹쳐도 충돌로 보고되고, 이력은 갈라지지 않습니다.

use std::collections::{HashMap, HashSet};

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::db::documents::get_owned_document;
use crate::error::AppError;
use crate::models::{ChangeDraft, ChangeRecord, TextVersion, VersionWithChange};

/// 새 버전을 쓸 때 기대하는 현재 버전 (낙관적 동시성 토큰).
/// `None` = 검사하지 않음, `Some(None)` = 아직 버전이 없어야 함.
pub type ExpectedVersion<'a> = Option<Option<&'a str>>;

const VERSION_COLUMNS: &str = "id, owner_id, document_id, version_number, content, \
                               previous_version_id, explanation, created_at";

/// 문서의 현재(가장 최근) 버전
pub async fn current_version<'e, E>(
    executor: E,
    document_id: &str,
) -> Result<Option<TextVersion>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, TextVersion>(&format!(
        "SELECT {VERSION_COLUMNS} FROM text_versions \
         WHERE document_id = ? ORDER BY version_number DESC LIMIT 1"
    ))
    .bind(document_id)
    .fetch_optional(executor)
    .await
}

/// 문서의 현재 텍스트. 버전이 아직 없으면 `None`.
pub async fn current_text(
    pool: &SqlitePool,
    document_id: &str,
) -> Result<Option<String>, AppError> {
    Ok(current_version(pool, document_id).await?.map(|v| v.content))
}

/// 새 버전과 그 변경 기록을 한 트랜잭션으로 만듭니다.
///
/// `change`는 트랜잭션 안에서 읽은 이전 버전 내용(없으면 빈 문자열)을 받아
/// 변경 기록을 만듭니다. 같은 트랜잭션에서 `documents.content`도 갱신합니다.
///
/// # 에러
/// - `NotFound` / `AccessDenied`: 문서가 없거나 요청자가 소유자가 아님
/// - `Conflict`: `expected`가 현재 버전과 다르거나, 동시 작성으로 버전 번호가 겹침
pub async fn create_document_version<F>(
    pool: &SqlitePool,
    document_id: &str,
    owner_id: &str,
    content: &str,
    explanation: Option<&str>,
    expected: ExpectedVersion<'_>,
    change: F,
) -> Result<VersionWithChange, AppError>
where
    F: FnOnce(&str) -> ChangeDraft,
{
    get_owned_document(pool, document_id, owner_id).await?;

    // 쓰기 잠금을 먼저 잡아 토큰 확인과 INSERT 사이에 다른 작성자가 끼어들지 못하게 합니다.
    let mut tx = pool
        .begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(AppError::from_version_write)?;

    let previous = current_version(&mut *tx, document_id)
        .await
        .map_err(AppError::from_version_write)?;
    let previous_id = previous.as_ref().map(|v| v.id.as_str());

    if let Some(expected_id) = expected {
        if expected_id != previous_id {
            tracing::warn!(
                document_id,
                expected = ?expected_id,
                current = ?previous_id,
                "version token mismatch"
            );
            return Err(AppError::Conflict(
                "Document has changed since it was last read".to_string(),
            ));
        }
    }

    let version_number = previous.as_ref().map_or(1, |v| v.version_number + 1);
    let draft = change(previous.as_ref().map_or("", |v| v.content.as_str()));

    let version_id = uuid::Uuid::now_v7().to_string();
    sqlx::query(
        r#"
        INSERT INTO text_versions
            (id, owner_id, document_id, version_number, content, previous_version_id, explanation)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&version_id)
    .bind(owner_id)
    .bind(document_id)
    .bind(version_number)
    .bind(content)
    .bind(previous_id)
    .bind(explanation)
    .execute(&mut *tx)
    .await
    .map_err(AppError::from_version_write)?;

    let change_id = uuid::Uuid::now_v7().to_string();
    sqlx::query(
        r#"
        INSERT INTO change_records
            (id, version_id, start_index, end_index, original_text, updated_text, explanation)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&change_id)
    .bind(&version_id)
    .bind(draft.start_index)
    .bind(draft.end_index)
    .bind(&draft.original_text)
    .bind(&draft.updated_text)
    .bind(&draft.explanation)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE documents SET content = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(content)
    .bind(document_id)
    .execute(&mut *tx)
    .await?;

    let version = sqlx::query_as::<_, TextVersion>(&format!(
        "SELECT {VERSION_COLUMNS} FROM text_versions WHERE id = ?"
    ))
    .bind(&version_id)
    .fetch_one(&mut *tx)
    .await?;

    let change = sqlx::query_as::<_, ChangeRecord>(
        r#"
        SELECT id, version_id, start_index, end_index, original_text, updated_text, explanation, created_at
        FROM change_records
        WHERE id = ?
        "#,
    )
    .bind(&change_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await.map_err(AppError::from_version_write)?;

    tracing::info!(
        document_id,
        version_id = %version.id,
        version_number,
        "text version created"
    );

    Ok(VersionWithChange { version, change })
}

/// 문서의 모든 버전에 걸친 변경 기록 (최신순)
pub async fn list_history(
    pool: &SqlitePool,
    document_id: &str,
) -> Result<Vec<ChangeRecord>, sqlx::Error> {
    sqlx::query_as::<_, ChangeRecord>(
        r#"
        SELECT c.id, c.version_id, c.start_index, c.end_index,
               c.original_text, c.updated_text, c.explanation, c.created_at
        FROM change_records c
        JOIN text_versions v ON v.id = c.version_id
        WHERE v.document_id = ?
        ORDER BY v.version_number DESC, c.created_at DESC, c.rowid DESC
        "#,
    )
    .bind(document_id)
    .fetch_all(pool)
    .await
}

pub async fn get_version(
    pool: &SqlitePool,
    version_id: &str,
) -> Result<Option<TextVersion>, sqlx::Error> {
    sqlx::query_as::<_, TextVersion>(&format!(
        "SELECT {VERSION_COLUMNS} FROM text_versions WHERE id = ?"
    ))
    .bind(version_id)
    .fetch_optional(pool)
    .await
}

/// 현재 버전에서 시작해 `previous_version_id`를 따라가며 체인을 돌려줍니다 (최신순).
///
/// 체인은 루트 버전(이전 버전 없음)에서 끝나야 합니다. 순환이나 끊긴 링크는
/// 원장 불변식 위반이므로 내부 오류로 취급합니다.
pub async fn version_chain(
    pool: &SqlitePool,
    document_id: &str,
) -> Result<Vec<TextVersion>, AppError> {
    let versions = sqlx::query_as::<_, TextVersion>(&format!(
        "SELECT {VERSION_COLUMNS} FROM text_versions \
         WHERE document_id = ? ORDER BY version_number DESC"
    ))
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    let Some(current_id) = versions.first().map(|v| v.id.clone()) else {
        return Ok(Vec::new());
    };

    let mut by_id: HashMap<String, TextVersion> =
        versions.into_iter().map(|v| (v.id.clone(), v)).collect();
    let mut visited = HashSet::new();
    let mut chain = Vec::with_capacity(by_id.len());
    let mut cursor = Some(current_id);

    while let Some(id) = cursor {
        if !visited.insert(id.clone()) {
            return Err(AppError::Internal(format!(
                "Version chain of document {} contains a cycle at {}",
                document_id, id
            )));
        }
        let version = by_id.remove(&id).ok_or_else(|| {
            AppError::Internal(format!(
                "Version chain of document {} links to missing version {}",
                document_id, id
            ))
        })?;
        cursor = version.previous_version_id.clone();
        chain.push(version);
    }

    Ok(chain)
}
