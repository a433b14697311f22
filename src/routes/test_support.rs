//! 핸들러 테스트용 상태 구성: 인메모리 DB + 임시 주석 디렉토리 + 가짜 수정 서비스

use std::{sync::Arc, time::Duration};

use axum::extract::State;
use tempfile::TempDir;

use crate::{
    db,
    middleware::auth::AuthUser,
    models::{
        AnnotationSource, ChangeDraft, CreateAnnotationRequest, Document, PlacedAnnotation,
        RevisionResult,
    },
    services::{
        annotations::AnnotationStore,
        processing::ProcessingTracker,
        revision_client::{tests::ScriptedService, RevisionClient, RevisionError, RevisionService},
    },
};

use super::AppState;

pub(crate) struct TestApp {
    pub state: AppState,
    pub service: Arc<ScriptedService>,
    _annotations_dir: TempDir,
}

pub(crate) fn user(id: &str) -> AuthUser {
    AuthUser {
        user_id: id.to_string(),
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_replies(Vec::new()).await
    }

    /// 수정 서비스가 `replies`를 차례로 돌려주는 앱. 재시도 지연은 0입니다.
    pub async fn with_replies(replies: Vec<Result<RevisionResult, RevisionError>>) -> Self {
        let pool = db::test_pool().await;
        let dir = tempfile::tempdir().expect("create temp dir");
        let service = Arc::new(ScriptedService::new(replies));
        let revision_service: Arc<dyn RevisionService> = service.clone();

        let state = AppState {
            pool,
            jwt_secret: "test-secret".to_string(),
            annotations: Arc::new(AnnotationStore::new(dir.path())),
            revisions: RevisionClient::new(revision_service, 3, Duration::ZERO),
            processing: ProcessingTracker::new(),
        };

        Self {
            state,
            service,
            _annotations_dir: dir,
        }
    }

    /// `owner` 소유의 문서를 만들고 `content`를 첫 버전으로 기록합니다.
    pub async fn document(&self, owner: &str, content: &str) -> Document {
        let id = uuid::Uuid::now_v7().to_string();
        db::create_document(&self.state.pool, &id, owner, "Draft")
            .await
            .expect("create document");
        db::create_document_version(&self.state.pool, &id, owner, content, None, None, |prev| {
            ChangeDraft::wholesale(prev, content, None)
        })
        .await
        .expect("seed version");
        db::get_document(&self.state.pool, &id)
            .await
            .expect("get document")
            .expect("document exists")
    }

    pub async fn annotate(&self, document_id: &str, text: &str, comment: &str) -> PlacedAnnotation {
        let current = db::current_text(&self.state.pool, document_id)
            .await
            .expect("current text")
            .unwrap_or_default();
        self.state
            .annotations
            .create(
                document_id,
                &current,
                CreateAnnotationRequest {
                    text: text.to_string(),
                    comment: comment.to_string(),
                    source: AnnotationSource::User,
                },
            )
            .await
            .expect("annotate")
    }

    pub fn state(&self) -> State<AppState> {
        State(self.state.clone())
    }
}
