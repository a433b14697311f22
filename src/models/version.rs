use serde::{Deserialize, Deserializer, Serialize};

/// 문서 전체 내용의 불변 스냅샷. `previous_version_id`로 이전 버전을 가리킵니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TextVersion {
    pub id: String,
    pub owner_id: String,
    pub document_id: String,
    pub version_number: i64,
    pub content: String,
    pub previous_version_id: Option<String>,
    pub explanation: Option<String>,
    pub created_at: String,
}

/// 버전 목록 응답용. 내용(content)은 `GET /versions/{id}`로 따로 받습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextVersionSummary {
    pub id: String,
    pub document_id: String,
    pub version_number: i64,
    pub previous_version_id: Option<String>,
    pub explanation: Option<String>,
    pub created_at: String,
}

impl From<TextVersion> for TextVersionSummary {
    fn from(version: TextVersion) -> Self {
        Self {
            id: version.id,
            document_id: version.document_id,
            version_number: version.version_number,
            previous_version_id: version.previous_version_id,
            explanation: version.explanation,
            created_at: version.created_at,
        }
    }
}

/// 버전 하나를 만든 편집 한 건의 감사 기록
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChangeRecord {
    pub id: String,
    pub version_id: String,
    pub start_index: i64,
    pub end_index: i64,
    pub original_text: String,
    pub updated_text: String,
    pub explanation: Option<String>,
    pub created_at: String,
}

/// 아직 저장되지 않은 변경 기록. 버전과 같은 트랜잭션에서 기록됩니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDraft {
    pub start_index: i64,
    pub end_index: i64,
    pub original_text: String,
    pub updated_text: String,
    pub explanation: Option<String>,
}

impl ChangeDraft {
    /// 문서 전체를 교체하는 편집: `0..len(updated)`, 이전 내용 → 새 내용
    pub fn wholesale(previous: &str, updated: &str, explanation: Option<String>) -> Self {
        Self {
            start_index: 0,
            end_index: updated.chars().count() as i64,
            original_text: previous.to_string(),
            updated_text: updated.to_string(),
            explanation,
        }
    }
}

/// 버전 생성과 변경 기록을 함께 돌려주는 응답
#[derive(Debug, Clone, Serialize)]
pub struct VersionWithChange {
    pub version: TextVersion,
    pub change: ChangeRecord,
}

/// `POST /documents/{id}/versions`: 수동 편집 저장.
///
/// 인덱스/텍스트 메타데이터는 선택 항목입니다. 없으면 문서 전체 교체로 기록합니다.
#[derive(Debug, Deserialize)]
pub struct CreateVersionRequest {
    pub content: String,
    pub explanation: Option<String>,
    pub start_index: Option<i64>,
    pub end_index: Option<i64>,
    pub original_text: Option<String>,
    pub updated_text: Option<String>,
    /// 필드 누락 = 검사 안 함, `null` = "아직 버전이 없어야 함", 값 = 현재 버전 ID여야 함
    #[serde(default, deserialize_with = "present_or_null")]
    pub expected_previous_version_id: Option<Option<String>>,
}

/// 필드가 존재할 때만 호출되므로 `null`은 `Some(None)`이 됩니다.
pub fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
