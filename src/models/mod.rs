//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `document`: 문서(Document)와 요청 바디
//! - `version`: 텍스트 버전(TextVersion)과 변경 기록(ChangeRecord)
//! - `annotation`: 주석(Annotation)과 복원된 주석(PlacedAnnotation)
//! - `revision`: 외부 수정 서비스와 주고받는 요청/응답, 적용 요청
//!
//! `pub use X::*;`로 재공개하므로 `crate::models::Document`처럼 짧게 접근할 수 있습니다.

pub mod annotation;
pub mod document;
pub mod revision;
pub mod version;

pub use annotation::*;
pub use document::*;
pub use revision::*;
pub use version::*;
