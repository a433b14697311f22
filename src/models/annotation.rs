//! # 주석(Annotation) 모델
//!
//! 주석은 세션 캐시가 소유하는 임시 작업 상태입니다. 버전 이력에는 속하지 않습니다.
//!
//! 저장되는 것은 `{id, text, comment, source}`뿐입니다. 문자 오프셋은 문서가 바뀌면
//! 어긋나므로 저장하지 않고, 불러올 때마다 `text`로 다시 찾습니다.

use serde::{Deserialize, Serialize};

use crate::services::offsets::Span;

/// 주석을 누가 만들었는지
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationSource {
    #[default]
    User,
    System,
}

/// 캐시에 저장되는 주석 레코드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// 문서 범위에서 유일한 시간 기반 ID (밀리초, 단조 증가)
    pub id: i64,
    /// 주석이 달린 원문 그대로의 부분 문자열: 다시 찾을 때 쓰는 유일한 키
    pub text: String,
    pub comment: String,
    #[serde(default)]
    pub source: AnnotationSource,
}

/// 현재 문서 텍스트에서 위치가 확인된 주석
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedAnnotation {
    #[serde(flatten)]
    pub annotation: Annotation,
    /// 시작 문자 오프셋
    pub offset: usize,
    #[serde(skip)]
    pub span: Span,
}

impl PlacedAnnotation {
    pub fn new(annotation: Annotation, span: Span) -> Self {
        Self {
            annotation,
            offset: span.start,
            span,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAnnotationRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub source: AnnotationSource,
}
