//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//! Rust에서는 예외(exception) 대신 `Result<T, E>` 타입으로 에러를 처리합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! ## 에러 분류
//! | 종류 | 재시도 | 사용자에게 보이는 메시지 |
//! |------|--------|--------------------------|
//! | `Validation` | 안 함 | 구체적인 사유 |
//! | `AccessDenied` | 안 함 | 접근 거부 (NotFound로 숨기지 않음) |
//! | `NotFound` | 안 함 | 리소스 없음 |
//! | `Conflict` | 안 함 | 버전 충돌 사유 |
//! | `Apply` | 안 함 | 원문을 찾지 못한 사유 |
//! | `UpstreamRequest` | 수정 클라이언트가 재시도 | 일반 메시지 |
//! | `InvalidResponseFormat` | 수정 클라이언트가 재시도 | 일반 메시지 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 외부 수정 서비스 실패 시 사용자에게 보여주는 고정 메시지.
/// 내부 사정(상태 코드, 응답 본문)은 로그에만 남깁니다.
pub const PROCESSING_FAILED_MESSAGE: &str = "Processing failed, please try again later";

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청 필드가 없거나 잘못됨 (HTTP 400). 재시도하지 않습니다.
    #[error("Validation error: {0}")]
    Validation(String),

    /// 다른 사용자가 소유한 문서에 접근 (HTTP 403)
    #[error("Access denied")]
    AccessDenied,

    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 낙관적 버전 토큰 불일치 등 리소스 충돌 (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 수정안의 원문을 현재 문서에서 찾지 못함 (HTTP 422).
    /// 문서는 변경되지 않은 상태로 남습니다.
    #[error("Apply error: {0}")]
    Apply(String),

    /// 외부 수정 서비스의 네트워크 오류 또는 2xx가 아닌 응답 (HTTP 502)
    #[error("Upstream request failed: {0}")]
    UpstreamRequest(String),

    /// 외부 수정 서비스가 응답했지만 구조 계약을 만족하지 못함 (HTTP 502)
    #[error("Invalid response format: {0}")]
    InvalidResponseFormat(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx::Error → AppError::Database 자동 변환
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 파일 입출력 오류 (HTTP 500): 주석 캐시 파일 읽기/쓰기
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 직렬화 오류 (HTTP 500): 주석 캐시 파일 해석
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// 버전 쓰기 중 동시 작성으로 생긴 DB 에러는 충돌로, 나머지는 그대로 감쌉니다.
    ///
    /// - 고유 제약 위반: 같은 버전 번호를 두 작성자가 쓰려 함
    /// - `SQLITE_BUSY`(5) / `SQLITE_LOCKED`(6) 계열: 쓰기 잠금 대기 시간 초과
    pub fn from_version_write(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation() || is_lock_contention(db_err.code().as_deref()) =>
            {
                tracing::warn!(error = %db_err, "concurrent version write rejected");
                AppError::Conflict(
                    "Document was modified concurrently; reload and try again".to_string(),
                )
            }
            _ => AppError::Database(err),
        }
    }
}

/// SQLite 확장 결과 코드의 하위 8비트가 기본 코드입니다 (예: 517 `BUSY_SNAPSHOT` → 5).
fn is_lock_contention(code: Option<&str>) -> bool {
    const SQLITE_BUSY: i32 = 5;
    const SQLITE_LOCKED: i32 = 6;

    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, IO, Internal)와 외부 서비스 에러는
    /// 실제 내용을 로그에만 기록하고, 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::AccessDenied => (StatusCode::FORBIDDEN, "access_denied", self.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Apply(ref msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "apply_error", msg.clone())
            }
            // 외부 서비스 에러는 감지 지점(수정 클라이언트)에서 이미 상세 로그를 남겼습니다.
            AppError::UpstreamRequest(_) => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                PROCESSING_FAILED_MESSAGE.to_string(),
            ),
            AppError::InvalidResponseFormat(_) => (
                StatusCode::BAD_GATEWAY,
                "invalid_response_format",
                PROCESSING_FAILED_MESSAGE.to_string(),
            ),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "io_error",
                    "An IO error occurred".to_string(),
                )
            }
            AppError::Json(ref e) => {
                tracing::error!("JSON error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        // 결과: { "error": { "code": "not_found", "message": "Resource not found" } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
