//! # 주석(Annotation) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/documents/{id}/annotations`                 → 현재 텍스트 기준으로 복원한 주석 목록
//! - `POST   /api/v1/documents/{id}/annotations`                 → 주석 추가
//! - `DELETE /api/v1/documents/{id}/annotations`                 → 주석 전체 삭제
//! - `DELETE /api/v1/documents/{id}/annotations/{annotation_id}` → 주석 하나 삭제

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{db, error::AppError, middleware::auth::AuthUser, models::*};

use super::documents::AppState;

/// 소유권을 확인하고 문서의 현재 텍스트를 돌려줍니다. 버전이 없으면 빈 문자열입니다.
async fn owned_text(
    state: &AppState,
    document_id: &str,
    owner_id: &str,
) -> Result<String, AppError> {
    db::get_owned_document(&state.pool, document_id, owner_id).await?;
    Ok(db::current_text(&state.pool, document_id)
        .await?
        .unwrap_or_default())
}

pub async fn list_annotations(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let text = owned_text(&state, &id, &auth_user.user_id).await?;
    let annotations = state.annotations.restore(&id, &text).await?;
    Ok(Json(json!({ "annotations": annotations })))
}

pub async fn create_annotation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<CreateAnnotationRequest>,
) -> Result<(StatusCode, Json<PlacedAnnotation>), AppError> {
    let text = owned_text(&state, &id, &auth_user.user_id).await?;
    let placed = state.annotations.create(&id, &text, req).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

pub async fn delete_annotation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, annotation_id)): Path<(String, i64)>,
) -> Result<StatusCode, AppError> {
    db::get_owned_document(&state.pool, &id, &auth_user.user_id).await?;
    state.annotations.remove(&id, annotation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_annotations(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    db::get_owned_document(&state.pool, &id, &auth_user.user_id).await?;
    state.annotations.clear(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{user, TestApp};
    use pretty_assertions::assert_eq;

    fn note(text: &str, comment: &str) -> Json<CreateAnnotationRequest> {
        Json(CreateAnnotationRequest {
            text: text.to_string(),
            comment: comment.to_string(),
            source: AnnotationSource::User,
        })
    }

    #[tokio::test]
    async fn annotations_are_placed_against_current_text() {
        let app = TestApp::new().await;
        let doc = app.document("alice", "The cat sat on the cat mat.").await;

        let (status, Json(placed)) = create_annotation(
            app.state(),
            user("alice"),
            Path(doc.id.clone()),
            note("cat", "make it more vivid"),
        )
        .await
        .expect("annotate");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(placed.offset, 4);

        let Json(listing) = list_annotations(app.state(), user("alice"), Path(doc.id.clone()))
            .await
            .expect("list");
        assert_eq!(
            listing["annotations"],
            json!([{
                "id": placed.annotation.id,
                "text": "cat",
                "comment": "make it more vivid",
                "source": "user",
                "offset": 4
            }])
        );
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let app = TestApp::new().await;
        let doc = app.document("alice", "one two three").await;
        let one = app.annotate(&doc.id, "one", "1").await;
        app.annotate(&doc.id, "two", "2").await;

        let status = delete_annotation(
            app.state(),
            user("alice"),
            Path((doc.id.clone(), one.annotation.id)),
        )
        .await
        .expect("remove");
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = delete_annotation(
            app.state(),
            user("alice"),
            Path((doc.id.clone(), one.annotation.id)),
        )
        .await
        .expect_err("already gone");
        assert!(matches!(err, AppError::NotFound));

        clear_annotations(app.state(), user("alice"), Path(doc.id.clone()))
            .await
            .expect("clear");
        assert!(app.state.annotations.load(&doc.id).await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn strangers_cannot_touch_annotations() {
        let app = TestApp::new().await;
        let doc = app.document("alice", "The cat sat.").await;

        let err = create_annotation(
            app.state(),
            user("bob"),
            Path(doc.id.clone()),
            note("cat", "x"),
        )
        .await
        .expect_err("bob is not the owner");
        assert!(matches!(err, AppError::AccessDenied));

        let err = clear_annotations(app.state(), user("bob"), Path(doc.id))
            .await
            .expect_err("bob is not the owner");
        assert!(matches!(err, AppError::AccessDenied));
    }
}
