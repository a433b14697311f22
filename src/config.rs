//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `JWT_SECRET`: JWT 토큰 검증에 사용할 비밀키 (필수)
//! - `HOST`, `PORT`: 서버 바인딩 주소와 포트
//! - `ANNOTATIONS_PATH`: 주석 캐시 파일 저장 디렉토리
//! - `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL`, `OPENAI_TEMPERATURE`: 외부 수정 서비스
//! - `REVISION_MAX_ATTEMPTS`, `REVISION_RETRY_BASE_MS`, `REVISION_TIMEOUT_SECS`: 재시도 정책

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 파일 경로 (예: "sqlite:data/annotext.db")
    pub database_url: String,
    /// JWT 토큰 검증에 사용하는 비밀키
    pub jwt_secret: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// 문서별 주석 캐시 파일이 저장되는 디렉토리 (기본값: "data/annotations")
    pub annotations_path: String,
    /// 외부 수정 서비스 설정
    pub revision: RevisionConfig,
}

/// 외부 LLM 수정 서비스 호출 설정
#[derive(Debug, Clone)]
pub struct RevisionConfig {
    pub api_key: String,
    /// chat completions 엔드포인트의 기준 URL (끝에 `/chat/completions`를 붙입니다)
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 선형 백오프의 기본 지연. n번째 실패 후 `n × retry_base_delay`만큼 기다립니다.
    pub retry_base_delay: Duration,
    /// 시도 한 번의 HTTP 타임아웃
    pub request_timeout: Duration,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `JWT_SECRET`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없거나 해석할 수 없어도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = RevisionConfig::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL")?, // 필수: 없으면 에러
            jwt_secret: env::var("JWT_SECRET")?,     // 필수: 없으면 에러
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3000),
            annotations_path: env::var("ANNOTATIONS_PATH")
                .unwrap_or_else(|_| "data/annotations".to_string()),
            revision: RevisionConfig {
                api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                base_url: env::var("OPENAI_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.base_url),
                model: env::var("OPENAI_MODEL").unwrap_or(defaults.model),
                temperature: parse_or("OPENAI_TEMPERATURE", defaults.temperature),
                // 0회 시도는 의미가 없으므로 최소 1회로 맞춥니다.
                max_attempts: parse_or("REVISION_MAX_ATTEMPTS", defaults.max_attempts).max(1),
                retry_base_delay: Duration::from_millis(parse_or("REVISION_RETRY_BASE_MS", 1000)),
                request_timeout: Duration::from_secs(parse_or("REVISION_TIMEOUT_SECS", 60)),
            },
        })
    }
}

/// 선택 환경변수를 파싱하고, 없거나 파싱에 실패하면 기본값을 사용합니다.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
