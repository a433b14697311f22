//! # 수정 적용(Apply) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `POST /api/v1/documents/{id}/apply`          → 수정된 전체 텍스트 적용
//! - `POST /api/v1/documents/{id}/apply-revision` → 수정안 하나 적용
//!
//! 성공하면 새 버전과 변경 기록을 돌려주고 문서의 주석은 모두 지워집니다.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{error::AppError, middleware::auth::AuthUser, models::*, services::applier};

use super::documents::AppState;

pub async fn apply_all(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ApplyAllRequest>,
) -> Result<(StatusCode, Json<VersionWithChange>), AppError> {
    let saved = applier::apply_all(
        &state.pool,
        &state.annotations,
        &id,
        &auth_user.user_id,
        &req.revised_text,
        &req.explanations,
        req.expected_previous_version_id.as_ref().map(Option::as_deref),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn apply_revision(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ApplyRevisionRequest>,
) -> Result<(StatusCode, Json<VersionWithChange>), AppError> {
    let revision = Revision {
        original: req.original,
        revised: req.revised,
        explanation: req.explanation,
    };
    let saved = applier::apply_revision(
        &state.pool,
        &state.annotations,
        &id,
        &auth_user.user_id,
        &revision,
        req.expected_previous_version_id.as_ref().map(Option::as_deref),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::routes::{
        processing::process_document,
        test_support::{user, TestApp},
    };
    use crate::services::revision_client::tests::feline_result;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn annotate_process_apply_end_to_end() {
        let app = TestApp::with_replies(vec![Ok(feline_result())]).await;
        let doc = app.document("alice", "The cat sat.").await;
        let v1 = db::current_version(&app.state.pool, &doc.id)
            .await
            .expect("current")
            .expect("v1");
        app.annotate(&doc.id, "cat", "make it more vivid").await;

        let response = process_document(app.state(), user("alice"), Path(doc.id.clone()))
            .await
            .expect("process");
        assert_eq!(response.status(), StatusCode::OK);

        let revision = feline_result().revisions.remove(0);
        let (status, Json(saved)) = apply_revision(
            app.state(),
            user("alice"),
            Path(doc.id.clone()),
            Json(ApplyRevisionRequest {
                original: revision.original,
                revised: revision.revised,
                explanation: revision.explanation,
                expected_previous_version_id: Some(Some(v1.id.clone())),
            }),
        )
        .await
        .expect("apply");
        assert_eq!(status, StatusCode::CREATED);

        assert_eq!(saved.version.content, "The feline sat.");
        assert_eq!(saved.version.previous_version_id.as_deref(), Some(v1.id.as_str()));
        assert_eq!(saved.change.version_id, saved.version.id);
        assert_eq!(saved.change.original_text, "cat");
        assert_eq!(saved.change.updated_text, "feline");
        assert_eq!(saved.change.explanation.as_deref(), Some("more vivid"));
        assert_eq!(saved.change.start_index, 4);
        assert_eq!(saved.change.end_index, 10);

        let doc = db::get_document(&app.state.pool, &doc.id)
            .await
            .expect("get")
            .expect("doc");
        assert_eq!(doc.content, "The feline sat.");
        assert!(app.state.annotations.load(&doc.id).await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn apply_all_with_stale_token_conflicts() {
        let app = TestApp::new().await;
        let doc = app.document("alice", "The cat sat.").await;

        let err = apply_all(
            app.state(),
            user("alice"),
            Path(doc.id.clone()),
            Json(ApplyAllRequest {
                revised_text: "The feline sat.".to_string(),
                explanations: vec!["more vivid".to_string()],
                expected_previous_version_id: Some(None),
            }),
        )
        .await
        .expect_err("a version already exists");
        assert!(matches!(err, AppError::Conflict(_)));

        let (_, Json(saved)) = apply_all(
            app.state(),
            user("alice"),
            Path(doc.id),
            Json(ApplyAllRequest {
                revised_text: "The feline sat.".to_string(),
                explanations: vec![],
                expected_previous_version_id: None,
            }),
        )
        .await
        .expect("unchecked apply");
        assert_eq!(saved.change.explanation.as_deref(), Some("No explanation provided"));
    }

    #[tokio::test]
    async fn apply_revision_not_found_is_unprocessable() {
        let app = TestApp::new().await;
        let doc = app.document("alice", "The cat sat.").await;

        let err = apply_revision(
            app.state(),
            user("alice"),
            Path(doc.id.clone()),
            Json(ApplyRevisionRequest {
                original: "dog".to_string(),
                revised: "hound".to_string(),
                explanation: String::new(),
                expected_previous_version_id: None,
            }),
        )
        .await
        .expect_err("dog is absent");
        assert!(matches!(err, AppError::Apply(_)));

        let doc = db::get_document(&app.state.pool, &doc.id)
            .await
            .expect("get")
            .expect("doc");
        assert_eq!(doc.content, "The cat sat.");
    }
}
