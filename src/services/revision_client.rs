//! # LLM 수정 클라이언트 (LLM Revision Client)
//!
//! 문서 전체와 주석 목록을 외부 수정 서비스(OpenAI 호환 chat completions)에 보내고,
//! 응답을 검증/정규화하여 `RevisionResult`로 돌려줍니다.
//!
//! ## 구성
//! - `RevisionService`: 시도 한 번을 수행하는 트레이트 (HTTP 구현 + 테스트용 가짜 구현)
//! - `OpenAiRevisionService`: reqwest 기반 HTTP 구현
//! - `RevisionClient`: 재시도 정책(최대 N회, 선형 백오프)을 감싸는 래퍼
//! - `decode_revision_payload`: "강제 변환 또는 거부" 디코딩
//!
//! ## 응답 계약
//! ```text
//! { "revised_text": string, "revisions": [{ "original", "revised", "explanation" }, ...] }
//! ```
//! `revisions`가 JSON 문자열로 한 번 더 인코딩되어 오면 **정확히 한 번** 더 파싱해 봅니다.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    config::RevisionConfig,
    error::AppError,
    models::{Revision, RevisionRequest, RevisionResult},
};

const SYSTEM_PROMPT: &str = r#"You revise selected passages of a document according to reviewer comments.

You receive a JSON object with:
- "context": the complete document text.
- "annotations": a list of { "text", "comment", "position" } where "text" is an exact passage of the context, "comment" says how to revise it, and "position" is its character offset.

Rules:
1. Keep every part of the context that is not annotated exactly as it is.
2. Revise only the annotated passages, following their comments, so the result reads naturally.
3. Return the complete document with all revisions applied, never only the changed fragments.
4. For every annotation report the original passage, its revised version, and an explanation of the change.

Reply with a single JSON object using double quotes and nothing else:
{
  "revised_text": "the full revised document",
  "revisions": [
    { "original": "original passage", "revised": "revised passage", "explanation": "why it changed" }
  ]
}"#;

/// 외부 수정 서비스 호출 실패. 세 종류 모두 재시도 대상입니다.
#[derive(Debug, Error)]
pub enum RevisionError {
    /// 네트워크 오류 또는 2xx가 아닌 응답
    #[error("revision request failed: {0}")]
    RequestFailed(String),
    /// 응답 본문이 JSON이 아님
    #[error("failed to parse revision response: {0}")]
    ParseFailed(String),
    /// JSON이지만 응답 계약을 만족하지 못함
    #[error("invalid revision response format: {0}")]
    InvalidResponseFormat(String),
}

impl From<RevisionError> for AppError {
    fn from(err: RevisionError) -> Self {
        match err {
            RevisionError::RequestFailed(msg) | RevisionError::ParseFailed(msg) => {
                AppError::UpstreamRequest(msg)
            }
            RevisionError::InvalidResponseFormat(msg) => AppError::InvalidResponseFormat(msg),
        }
    }
}

/// 외부 수정 서비스에 대한 시도 한 번
#[async_trait]
pub trait RevisionService: Send + Sync {
    async fn revise(&self, request: &RevisionRequest) -> Result<RevisionResult, RevisionError>;
}

pub struct OpenAiRevisionService {
    client: Client,
    config: RevisionConfig,
}

impl OpenAiRevisionService {
    pub fn new(config: RevisionConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: RevisionConfig) -> Self {
        Self { client, config }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn chat_body(&self, request: &RevisionRequest) -> Value {
        let user_content = json!({
            "context": request.full_context,
            "annotations": request.annotations,
        });

        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_content.to_string() },
            ],
            "temperature": self.config.temperature,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl RevisionService for OpenAiRevisionService {
    async fn revise(&self, request: &RevisionRequest) -> Result<RevisionResult, RevisionError> {
        tracing::debug!(
            annotations = request.annotations.len(),
            context_chars = request.full_context.chars().count(),
            "sending revision request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&self.chat_body(request))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "revision service unreachable");
                RevisionError::RequestFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unavailable>".to_string());
            tracing::error!(
                status = %status,
                body = %body,
                "revision service returned error status"
            );
            return Err(RevisionError::RequestFailed(format!("status {}", status)));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| RevisionError::RequestFailed(e.to_string()))?;

        let completion: ChatCompletion = serde_json::from_str(&raw).map_err(|e| {
            tracing::error!(error = %e, body = %raw, "revision service body is not JSON");
            RevisionError::ParseFailed(e.to_string())
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                tracing::error!(body = %raw, "revision service reply has no message content");
                RevisionError::InvalidResponseFormat(
                    "missing choices[0].message.content".to_string(),
                )
            })?;

        decode_revision_content(&content)
    }
}

/// 모델이 돌려준 메시지 텍스트를 해석합니다.
pub fn decode_revision_content(content: &str) -> Result<RevisionResult, RevisionError> {
    let value: Value = serde_json::from_str(content).map_err(|e| {
        tracing::error!(error = %e, content, "revision content is not JSON");
        RevisionError::ParseFailed(e.to_string())
    })?;

    decode_revision_payload(value).inspect_err(|e| {
        tracing::error!(error = %e, content, "revision content violates the response contract");
    })
}

/// 강제 변환 또는 거부(coerce-or-reject) 디코딩.
///
/// - `revised_text`: 문자열이어야 합니다. 그 문자열이 다시 `revised_text`를 가진
///   JSON 객체라면 한 번만 벗겨냅니다.
/// - `revisions`: 배열이거나, 배열을 담은 JSON 문자열이어야 합니다 (2차 파싱은 한 번만).
/// - 각 항목은 `original`, `revised`, `explanation` 문자열을 모두 가져야 합니다.
pub fn decode_revision_payload(value: Value) -> Result<RevisionResult, RevisionError> {
    let Value::Object(mut object) = value else {
        return Err(invalid("response is not a JSON object"));
    };

    let revised_text = match object.remove("revised_text") {
        Some(Value::String(text)) => unwrap_encoded_revised_text(text),
        _ => return Err(invalid("missing revised_text")),
    };
    if revised_text.is_empty() {
        return Err(invalid("revised_text is empty"));
    }

    let items = match object.remove("revisions") {
        Some(Value::Array(items)) => items,
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(&encoded) {
            Ok(Value::Array(items)) => items,
            _ => return Err(invalid("revisions is not an array")),
        },
        Some(_) => return Err(invalid("revisions is not an array")),
        None => return Err(invalid("missing revisions")),
    };

    let revisions = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Revision>(item).map_err(|_| {
                invalid(&format!(
                    "revision {} must have original, revised and explanation",
                    index
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RevisionResult {
        revised_text,
        revisions,
    })
}

fn unwrap_encoded_revised_text(text: String) -> String {
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(mut inner)) => match inner.remove("revised_text") {
            Some(Value::String(unwrapped)) => unwrapped,
            _ => text,
        },
        _ => text,
    }
}

fn invalid(reason: &str) -> RevisionError {
    RevisionError::InvalidResponseFormat(reason.to_string())
}

/// 재시도 정책을 적용하는 수정 클라이언트.
///
/// 실패(요청 실패, 파싱 실패, 형식 오류 모두)하면 `시도 번호 × base_delay`만큼 기다린 뒤
/// 다시 시도합니다. 마지막 시도의 에러는 호출자에게 그대로 전달됩니다.
#[derive(Clone)]
pub struct RevisionClient {
    service: Arc<dyn RevisionService>,
    max_attempts: u32,
    base_delay: Duration,
}

impl RevisionClient {
    pub fn new(service: Arc<dyn RevisionService>, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            service,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub async fn submit(&self, request: &RevisionRequest) -> Result<RevisionResult, AppError> {
        let mut attempt = 1;
        loop {
            match self.service.revise(request).await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "revision request succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(err) if attempt >= self.max_attempts => {
                    tracing::error!(attempt, error = %err, "revision request failed; giving up");
                    return Err(err.into());
                }
                Err(err) => {
                    let delay = self.base_delay * attempt;
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "revision attempt failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
