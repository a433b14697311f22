//! # 수정 적용기 (Revision Applier)
//!
//! 수락된 수정을 문서에 반영하고, 새 버전 + 변경 기록을 남긴 뒤, 문서의 대기 중인
//! 주석을 모두 지웁니다. 문서 내용을 바꾸는 유일한 경로입니다.
//!
//! 두 가지 단위를 지원합니다:
//! - `apply_all`: 수정된 전체 텍스트로 문서를 통째로 교체 ("모든 변경 적용")
//! - `apply_revision`: 수정안 하나의 `original`을 첫 일치 위치에서 찾아 `revised`로 교체
//!
//! 저장 전에 주석 마크업(`<span data-annotation-id>`)을 벗겨 평문만 저장합니다.

use sqlx::SqlitePool;

use crate::{
    db::{self, ExpectedVersion},
    error::AppError,
    models::{ChangeDraft, Revision, VersionWithChange},
    services::{annotations::AnnotationStore, markup::strip_annotation_markup, offsets},
};

const NO_EXPLANATION: &str = "No explanation provided";

/// 수정된 전체 텍스트를 적용합니다.
///
/// 변경 기록: `start_index = 0`, `end_index = len(updated)`,
/// `original_text` = 이전 버전 전체 내용, 설명은 `explanations`를 `"; "`로 이은 값.
pub async fn apply_all(
    pool: &SqlitePool,
    annotations: &AnnotationStore,
    document_id: &str,
    owner_id: &str,
    revised_text: &str,
    explanations: &[String],
    expected: ExpectedVersion<'_>,
) -> Result<VersionWithChange, AppError> {
    let cleaned = strip_annotation_markup(revised_text);
    if cleaned.trim().is_empty() {
        tracing::warn!(
            document_id,
            operation = "apply_all",
            "rejected: no content after markup strip"
        );
        return Err(AppError::Validation("No valid content to save".to_string()));
    }

    let explanation = join_explanations(explanations);

    let saved = db::create_document_version(
        pool,
        document_id,
        owner_id,
        &cleaned,
        Some(&explanation),
        expected,
        |previous| ChangeDraft::wholesale(previous, &cleaned, Some(explanation.clone())),
    )
    .await?;

    clear_pending(annotations, document_id).await;
    Ok(saved)
}

/// 수정안 하나를 적용합니다.
///
/// `original`을 찾지 못하면 `AppError::Apply`를 돌려주며 어떤 상태도 바꾸지 않습니다.
/// 호출자가 버전 토큰을 주지 않으면, 치환 기준으로 읽은 현재 버전을 토큰으로 씁니다.
pub async fn apply_revision(
    pool: &SqlitePool,
    annotations: &AnnotationStore,
    document_id: &str,
    owner_id: &str,
    revision: &Revision,
    expected: ExpectedVersion<'_>,
) -> Result<VersionWithChange, AppError> {
    db::get_owned_document(pool, document_id, owner_id).await?;

    let current = db::current_version(pool, document_id).await?;
    let current_text = current.as_ref().map_or("", |v| v.content.as_str());

    let found = offsets::find_first(current_text, &revision.original).ok_or_else(|| {
        tracing::warn!(
            document_id,
            original = %revision.original,
            "revision original text not found in current document"
        );
        AppError::Apply("Original text not found in the current document".to_string())
    })?;

    let revised = strip_annotation_markup(&revision.revised);
    let mut updated = String::with_capacity(current_text.len() + revised.len());
    updated.push_str(&current_text[..found.bytes.start]);
    updated.push_str(&revised);
    updated.push_str(&current_text[found.bytes.end..]);

    let explanation = if revision.explanation.trim().is_empty() {
        NO_EXPLANATION.to_string()
    } else {
        revision.explanation.clone()
    };

    let draft = ChangeDraft {
        start_index: found.span.start as i64,
        end_index: (found.span.start + revised.chars().count()) as i64,
        original_text: revision.original.clone(),
        updated_text: revised,
        explanation: Some(explanation.clone()),
    };

    let observed = current.as_ref().map(|v| v.id.as_str());
    let saved = db::create_document_version(
        pool,
        document_id,
        owner_id,
        &updated,
        Some(&explanation),
        expected.or(Some(observed)),
        |_| draft,
    )
    .await?;

    clear_pending(annotations, document_id).await;
    Ok(saved)
}

fn join_explanations(explanations: &[String]) -> String {
    let parts: Vec<&str> = explanations
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect();
    if parts.is_empty() {
        NO_EXPLANATION.to_string()
    } else {
        parts.join("; ")
    }
}

/// 버전은 이미 커밋되었으므로 주석 캐시 정리 실패는 요청을 실패시키지 않습니다.
async fn clear_pending(annotations: &AnnotationStore, document_id: &str) {
    if let Err(e) = annotations.clear(document_id).await {
        tracing::error!(document_id, error = %e, "failed to clear annotations after apply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_document, test_pool};
    use crate::models::{AnnotationSource, CreateAnnotationRequest};
    use pretty_assertions::assert_eq;

    const OWNER: &str = "user-1";
    const DOC: &str = "doc-1";

    async fn seeded(content: &str) -> (SqlitePool, tempfile::TempDir, AnnotationStore) {
        let pool = test_pool().await;
        create_document(&pool, DOC, OWNER, "Draft").await.expect("create");
        db::create_document_version(&pool, DOC, OWNER, content, None, None, |prev| {
            ChangeDraft::wholesale(prev, content, None)
        })
        .await
        .expect("seed version");

        let dir = tempfile::tempdir().expect("temp dir");
        let store = AnnotationStore::new(dir.path());
        (pool, dir, store)
    }

    async fn annotate(store: &AnnotationStore, text: &str, comment: &str) {
        let current = "The cat sat on the mat.";
        store
            .create(
                DOC,
                current,
                CreateAnnotationRequest {
                    text: text.to_string(),
                    comment: comment.to_string(),
                    source: AnnotationSource::User,
                },
            )
            .await
            .expect("annotate");
    }

    fn revision(original: &str, revised: &str, explanation: &str) -> Revision {
        Revision {
            original: original.to_string(),
            revised: revised.to_string(),
            explanation: explanation.to_string(),
        }
    }

    #[tokio::test]
    async fn single_revision_replaces_first_match_only() {
        let (pool, _dir, store) = seeded("The cat sat on the mat.").await;
        annotate(&store, "cat", "vivid").await;

        let saved = apply_revision(
            &pool,
            &store,
            DOC,
            OWNER,
            &revision("at", "AT", "caps"),
            None,
        )
        .await
        .expect("apply");

        assert_eq!(saved.version.content, "The cAT sat on the mat.");
        assert_eq!(saved.change.start_index, 5);
        assert_eq!(saved.change.end_index, 7);
        assert_eq!(saved.change.original_text, "at");
        assert_eq!(saved.change.updated_text, "AT");
        assert!(store.load(DOC).await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn missing_original_leaves_everything_untouched() {
        let (pool, _dir, store) = seeded("The cat sat on the mat.").await;
        annotate(&store, "cat", "vivid").await;

        let before_version = db::current_version(&pool, DOC).await.expect("current");
        let before_doc = db::get_document(&pool, DOC).await.expect("get").expect("doc");

        let err = apply_revision(
            &pool,
            &store,
            DOC,
            OWNER,
            &revision("dog", "hound", "n/a"),
            None,
        )
        .await
        .expect_err("dog is absent");
        assert!(matches!(err, AppError::Apply(_)));

        assert_eq!(db::current_version(&pool, DOC).await.expect("current"), before_version);
        let after_doc = db::get_document(&pool, DOC).await.expect("get").expect("doc");
        assert_eq!(after_doc.content.as_bytes(), before_doc.content.as_bytes());
        assert_eq!(db::list_history(&pool, DOC).await.expect("history").len(), 1);
        assert_eq!(store.load(DOC).await.expect("load").len(), 1);
    }

    #[tokio::test]
    async fn wholesale_apply_strips_markup_and_records_full_delta() {
        let (pool, _dir, store) = seeded("The cat sat on the mat.").await;
        annotate(&store, "cat", "vivid").await;
        annotate(&store, "mat", "specific").await;

        let revised = r#"The <span data-annotation-id="1">feline</span> sat on the rug."#;
        let saved = apply_all(
            &pool,
            &store,
            DOC,
            OWNER,
            revised,
            &["more vivid".to_string(), " ".to_string(), "more specific".to_string()],
            None,
        )
        .await
        .expect("apply all");

        assert_eq!(saved.version.content, "The feline sat on the rug.");
        assert_eq!(saved.change.start_index, 0);
        assert_eq!(saved.change.end_index, 26);
        assert_eq!(saved.change.original_text, "The cat sat on the mat.");
        assert_eq!(saved.change.updated_text, "The feline sat on the rug.");
        assert_eq!(saved.change.explanation.as_deref(), Some("more vivid; more specific"));
        assert!(store.load(DOC).await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn wholesale_apply_rejects_blank_content() {
        let (pool, _dir, store) = seeded("The cat sat.").await;

        let err = apply_all(
            &pool,
            &store,
            DOC,
            OWNER,
            r#"<span data-annotation-id="1">  </span>"#,
            &[],
            None,
        )
        .await
        .expect_err("blank");
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(db::list_history(&pool, DOC).await.expect("history").len(), 1);
    }

    #[tokio::test]
    async fn non_owner_cannot_apply() {
        let (pool, _dir, store) = seeded("The cat sat.").await;

        let err = apply_revision(
            &pool,
            &store,
            DOC,
            "someone-else",
            &revision("cat", "feline", "vivid"),
            None,
        )
        .await
        .expect_err("not the owner");
        assert!(matches!(err, AppError::AccessDenied));
    }

    #[test]
    fn explanations_default_when_empty() {
        assert_eq!(join_explanations(&[]), NO_EXPLANATION);
        assert_eq!(
            join_explanations(&["a".to_string(), "b".to_string()]),
            "a; b"
        );
    }
}
