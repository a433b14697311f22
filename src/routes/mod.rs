//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//!
//! 각 하위 모듈:
//! - `documents`: 문서 생성/조회/삭제, 현재 텍스트, 공유 상태(`AppState`)
//! - `versions`: 수동 편집 저장, 버전 목록/조회, 변경 기록
//! - `annotations`: 문서별 주석 추가/복원/삭제
//! - `processing`: 외부 수정 서비스 호출과 처리 중 상태
//! - `apply`: 수정 적용 (전체 / 하나)
//! - `health`: 서버 상태 확인

pub mod annotations;
pub mod apply;
pub mod documents;
pub mod health;
pub mod processing;
pub mod versions;

#[cfg(test)]
pub(crate) mod test_support;

pub use documents::AppState;

use axum::{
    routing::{get, post},
    Router,
};

/// `/api/v1` 아래에 들어갈 API 라우터
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // 문서
        .route(
            "/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/documents/{id}",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/documents/{id}/content", get(documents::get_document_content))
        // 버전 & 변경 기록
        .route(
            "/documents/{id}/versions",
            get(versions::list_versions).post(versions::create_version),
        )
        .route("/documents/{id}/history", get(versions::get_history))
        .route("/versions/{id}", get(versions::get_version_content))
        // 주석
        .route(
            "/documents/{id}/annotations",
            get(annotations::list_annotations)
                .post(annotations::create_annotation)
                .delete(annotations::clear_annotations),
        )
        .route(
            "/documents/{id}/annotations/{annotation_id}",
            axum::routing::delete(annotations::delete_annotation),
        )
        // 수정 요청 & 적용
        .route("/annotations/process", post(processing::process_annotations))
        .route(
            "/documents/{id}/process",
            get(processing::processing_status).post(processing::process_document),
        )
        .route("/documents/{id}/apply", post(apply::apply_all))
        .route("/documents/{id}/apply-revision", post(apply::apply_revision))
        // 헬스체크
        .route("/health", get(health::health_check))
        .with_state(state)
}
