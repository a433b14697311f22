//! # 수정 요청 생성기 (Revision Request Builder)
//!
//! 전체 문서 텍스트와 살아 있는 주석 목록으로 외부 서비스에 보낼
//! `{ fullContext, annotations: [{ text, comment, position }] }` 페이로드를 만듭니다.
//! 부수 효과가 없는 순수 변환입니다.

use crate::{
    error::AppError,
    models::{Annotation, AnnotationInput, AnnotationPayload, RevisionRequest},
    services::offsets,
};

impl From<&Annotation> for AnnotationInput {
    fn from(annotation: &Annotation) -> Self {
        Self {
            text: annotation.text.clone(),
            comment: annotation.comment.clone(),
            position: None,
        }
    }
}

/// 페이로드를 만듭니다.
///
/// `position`은 생성 시점 값을 재사용하지 않고 지금의 `full_context`에서 다시 계산합니다.
/// 그사이 문서가 바뀌어 더 이상 찾을 수 없는 주석은 경고 로그와 함께 제외하며,
/// 결과는 문서 내 위치 순으로 정렬됩니다.
pub fn build_request(
    full_context: &str,
    annotations: &[AnnotationInput],
) -> Result<RevisionRequest, AppError> {
    if full_context.trim().is_empty() {
        tracing::warn!(operation = "build_request", "rejected: empty full context");
        return Err(AppError::Validation("Full context is required".to_string()));
    }
    if annotations.is_empty() {
        tracing::warn!(operation = "build_request", "rejected: no annotations");
        return Err(AppError::Validation(
            "At least one annotation is required".to_string(),
        ));
    }

    if let Some(index) = annotations
        .iter()
        .position(|a| a.text.is_empty() || a.comment.trim().is_empty())
    {
        tracing::warn!(operation = "build_request", index, "rejected: incomplete annotation");
        return Err(AppError::Validation(format!(
            "Annotation {} must have both text and comment",
            index
        )));
    }

    let mut payload: Vec<AnnotationPayload> = annotations
        .iter()
        .filter_map(|a| match offsets::resolve(full_context, &a.text) {
            Some(span) => {
                if let Some(sent) = a.position.filter(|&p| p != span.start) {
                    tracing::debug!(
                        text = %a.text,
                        sent,
                        recomputed = span.start,
                        "client position is stale; using recomputed offset"
                    );
                }
                Some(AnnotationPayload {
                    text: a.text.clone(),
                    comment: a.comment.trim().to_string(),
                    position: span.start,
                })
            }
            None => {
                tracing::warn!(text = %a.text, "annotation not found in current text; skipped");
                None
            }
        })
        .collect();

    if payload.is_empty() {
        tracing::warn!(operation = "build_request", "rejected: no annotation could be located");
        return Err(AppError::Validation(
            "None of the annotations could be located in the document".to_string(),
        ));
    }

    payload.sort_by_key(|a| a.position);

    Ok(RevisionRequest {
        full_context: full_context.to_string(),
        annotations: payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(text: &str, comment: &str, position: Option<usize>) -> AnnotationInput {
        AnnotationInput {
            text: text.to_string(),
            comment: comment.to_string(),
            position,
        }
    }

    #[test]
    fn positions_are_recomputed_and_ordered() {
        let request = build_request(
            "The cat sat on the mat.",
            &[
                input("mat", "be specific", Some(0)),
                input("cat", " make it more vivid ", Some(99)),
            ],
        )
        .expect("valid request");

        assert_eq!(
            request,
            RevisionRequest {
                full_context: "The cat sat on the mat.".to_string(),
                annotations: vec![
                    AnnotationPayload {
                        text: "cat".to_string(),
                        comment: "make it more vivid".to_string(),
                        position: 4,
                    },
                    AnnotationPayload {
                        text: "mat".to_string(),
                        comment: "be specific".to_string(),
                        position: 19,
                    },
                ],
            }
        );
    }

    #[test]
    fn serializes_with_camel_case_context() {
        let request = build_request("The cat sat.", &[input("cat", "vivid", None)])
            .expect("valid request");
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "fullContext": "The cat sat.",
                "annotations": [{ "text": "cat", "comment": "vivid", "position": 4 }]
            })
        );
    }

    #[test]
    fn rejects_empty_context_and_incomplete_annotations() {
        let cases = [
            build_request("   ", &[input("cat", "vivid", None)]),
            build_request("The cat sat.", &[]),
            build_request("The cat sat.", &[input("", "vivid", None)]),
            build_request("The cat sat.", &[input("cat", "", None)]),
        ];
        for result in cases {
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn unlocatable_annotations_are_skipped() {
        let request = build_request(
            "The feline sat.",
            &[input("cat", "vivid", None), input("sat", "verb", None)],
        )
        .expect("one annotation still resolves");
        assert_eq!(request.annotations.len(), 1);
        assert_eq!(request.annotations[0].position, 11);

        let err = build_request("The feline sat.", &[input("cat", "vivid", None)])
            .expect_err("nothing left to send");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
