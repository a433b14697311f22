//! # 수정 요청/응답 모델
//!
//! 외부 수정 서비스와 주고받는 페이로드, 그리고 수정 적용 요청 본문입니다.

use serde::{Deserialize, Serialize};

use super::version::present_or_null;

/// 외부 수정 서비스로 보내는 정규화된 페이로드.
/// `position`은 전송 시점의 현재 문서에서 다시 계산한 시작 문자 오프셋입니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionRequest {
    pub full_context: String,
    pub annotations: Vec<AnnotationPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPayload {
    pub text: String,
    pub comment: String,
    pub position: usize,
}

/// `POST /annotations/process` 요청 본문.
/// 클라이언트가 보낸 `position`은 참고만 하고 서버에서 다시 계산합니다.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessAnnotationsRequest {
    #[serde(default)]
    pub full_context: String,
    #[serde(default)]
    pub annotations: Vec<AnnotationInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationInput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub position: Option<usize>,
}

/// 주석 하나에 대한 수정안
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub original: String,
    pub revised: String,
    pub explanation: String,
}

/// 검증을 통과한 외부 서비스 응답
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionResult {
    pub revised_text: String,
    pub revisions: Vec<Revision>,
}

/// `POST /documents/{id}/apply`: 수정된 전체 텍스트를 한 번에 적용
#[derive(Debug, Deserialize)]
pub struct ApplyAllRequest {
    pub revised_text: String,
    #[serde(default)]
    pub explanations: Vec<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub expected_previous_version_id: Option<Option<String>>,
}

/// `POST /documents/{id}/apply-revision`: 수정안 하나만 적용
#[derive(Debug, Deserialize)]
pub struct ApplyRevisionRequest {
    pub original: String,
    pub revised: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, deserialize_with = "present_or_null")]
    pub expected_previous_version_id: Option<Option<String>>,
}
