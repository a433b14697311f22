use serde::{Deserialize, Serialize};

/// 문서: 작업 공간 탭 하나의 편집 가능한 텍스트 버퍼.
/// `content`는 수정 적용기(services::applier)와 버전 원장만 변경합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub title: Option<String>,
    /// 비어 있지 않으면 첫 번째 버전으로 기록됩니다.
    pub content: Option<String>,
}

/// `GET /documents/{id}/content` 응답. 버전이 아직 없으면 `null`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentContent {
    pub content: Option<String>,
}
