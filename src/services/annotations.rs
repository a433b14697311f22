//! # 주석 저장소 (Annotation Store)
//!
//! 문서 ID를 키로 하는 로컬 주석 캐시입니다. 세션 사이에도 유지되도록
//! 문서마다 JSON 파일 하나(`annotations_<document_id>.json`)에 저장합니다.
//!
//! 이 캐시는 버전 이력과 분리된 임시 작업 상태입니다. 주석 집합은
//! 이 모듈의 `create` / `remove` / `clear`로만 변경됩니다.
//!
//! ## 복원(restore) 규칙
//! 오프셋은 저장하지 않습니다. 불러올 때마다 `text`로 현재 문서에서 다시 찾고,
//! 찾지 못한 주석은 조용히 건너뜁니다 (의도된 손실이며 에러가 아님).

use std::path::PathBuf;

use chrono::Utc;
use tokio::{fs, sync::Mutex};

use crate::{
    error::AppError,
    models::{Annotation, CreateAnnotationRequest, PlacedAnnotation},
    services::offsets,
};

pub struct AnnotationStore {
    root: PathBuf,
    /// 읽기-수정-쓰기 구간을 직렬화합니다.
    write_lock: Mutex<()>,
}

impl AnnotationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// 저장된 주석 레코드를 그대로 읽습니다. 파일이 없으면 빈 목록입니다.
    pub async fn load(&self, document_id: &str) -> Result<Vec<Annotation>, AppError> {
        let path = self.path_for(document_id)?;
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// 저장된 주석을 현재 문서 텍스트에 다시 배치합니다.
    pub async fn restore(
        &self,
        document_id: &str,
        current_text: &str,
    ) -> Result<Vec<PlacedAnnotation>, AppError> {
        let saved = self.load(document_id).await?;
        Ok(place_all(document_id, current_text, saved))
    }

    /// 새 주석을 등록합니다.
    ///
    /// - `text` 또는 `comment`가 비어 있으면 거부
    /// - 현재 문서에서 `text`를 찾지 못하면 거부
    /// - 살아 있는 다른 주석과 구간이 겹치면 거부
    ///
    /// 복원되지 않은(현재 문서에서 찾을 수 없는) 기존 주석은 이때 캐시에서 빠집니다.
    pub async fn create(
        &self,
        document_id: &str,
        current_text: &str,
        req: CreateAnnotationRequest,
    ) -> Result<PlacedAnnotation, AppError> {
        if req.text.trim().is_empty() {
            tracing::warn!(document_id, operation = "create_annotation", "rejected: empty text");
            return Err(AppError::Validation("Annotation text is required".to_string()));
        }
        let comment = req.comment.trim();
        if comment.is_empty() {
            tracing::warn!(
                document_id,
                operation = "create_annotation",
                "rejected: empty comment"
            );
            return Err(AppError::Validation(
                "Annotation comment is required".to_string(),
            ));
        }

        let span = offsets::resolve(current_text, &req.text).ok_or_else(|| {
            tracing::warn!(
                document_id,
                operation = "create_annotation",
                text = %req.text,
                "rejected: text not found in document"
            );
            AppError::Validation("Annotated text was not found in the document".to_string())
        })?;

        let _guard = self.write_lock.lock().await;
        let live = place_all(document_id, current_text, self.load(document_id).await?);

        if live.iter().any(|placed| placed.span.overlaps(&span)) {
            tracing::warn!(
                document_id,
                operation = "create_annotation",
                text = %req.text,
                "rejected: overlaps an existing annotation"
            );
            return Err(AppError::Validation(
                "Text is already annotated".to_string(),
            ));
        }

        let now = Utc::now().timestamp_millis();
        let id = live
            .iter()
            .map(|placed| placed.annotation.id)
            .max()
            .map_or(now, |max| now.max(max + 1));

        let placed = PlacedAnnotation::new(
            Annotation {
                id,
                text: req.text,
                comment: comment.to_string(),
                source: req.source,
            },
            span,
        );

        let mut records: Vec<Annotation> = live.into_iter().map(|p| p.annotation).collect();
        records.push(placed.annotation.clone());
        self.save(document_id, &records).await?;

        tracing::info!(document_id, annotation_id = id, "annotation created");
        Ok(placed)
    }

    /// 주석 하나를 제거합니다.
    pub async fn remove(&self, document_id: &str, annotation_id: i64) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load(document_id).await?;
        let before = records.len();
        records.retain(|a| a.id != annotation_id);
        if records.len() == before {
            return Err(AppError::NotFound);
        }
        self.save(document_id, &records).await
    }

    /// 문서의 주석을 모두 지웁니다. 수정이 적용된 뒤 호출됩니다.
    pub async fn clear(&self, document_id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.save(document_id, &[]).await
    }

    async fn save(&self, document_id: &str, records: &[Annotation]) -> Result<(), AppError> {
        let path = self.path_for(document_id)?;

        if records.is_empty() {
            return match fs::remove_file(&path).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        fs::create_dir_all(&self.root).await?;
        // 임시 파일에 쓴 뒤 이름을 바꿔서, 쓰는 도중에 읽어도 반쯤 쓴 파일을 보지 않게 합니다.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(records)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    fn path_for(&self, document_id: &str) -> Result<PathBuf, AppError> {
        let valid = !document_id.is_empty()
            && document_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::Validation("Invalid document id".to_string()));
        }
        Ok(self.root.join(format!("annotations_{}.json", document_id)))
    }
}

/// 저장된 순서대로 각 주석의 위치를 다시 찾습니다. 찾지 못한 주석은 빠집니다.
pub fn place_all(
    document_id: &str,
    current_text: &str,
    saved: Vec<Annotation>,
) -> Vec<PlacedAnnotation> {
    saved
        .into_iter()
        .filter_map(|annotation| match offsets::resolve(current_text, &annotation.text) {
            Some(span) => Some(PlacedAnnotation::new(annotation, span)),
            None => {
                tracing::debug!(
                    document_id,
                    annotation_id = annotation.id,
                    "annotation text no longer in document; dropped from restore"
                );
                None
            }
        })
        .collect()
}
