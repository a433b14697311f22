//! # 서비스 모듈
//!
//! HTTP 계층과 무관한 도메인 로직을 담습니다.
//! - `offsets`: 부분 문자열 → 문자 오프셋 해석 (첫 일치)
//! - `markup`: 주석 하이라이트 마크업 제거
//! - `annotations`: 문서별 주석 캐시
//! - `request_builder`: 외부 수정 서비스용 페이로드 생성
//! - `revision_client`: 외부 수정 서비스 호출 + 재시도
//! - `applier`: 수정 적용 (새 버전 + 변경 기록 + 주석 정리)
//! - `processing`: 문서별 처리 중 상태

pub mod annotations;
pub mod applier;
pub mod markup;
pub mod offsets;
pub mod processing;
pub mod request_builder;
pub mod revision_client;
