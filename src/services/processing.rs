//! 문서별 처리 상태. 한 문서에는 진행 중인 수정 요청이 최대 하나만 있습니다.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

#[derive(Clone, Default)]
pub struct ProcessingTracker {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// 처리 중 표시. drop되면 표시가 풀립니다 (에러로 빠져나가도 마찬가지).
pub struct ProcessingTicket {
    document_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ProcessingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이미 처리 중이면 `None`을 돌려줍니다.
    pub fn try_begin(&self, document_id: &str) -> Option<ProcessingTicket> {
        if !lock(&self.in_flight).insert(document_id.to_string()) {
            return None;
        }
        Some(ProcessingTicket {
            document_id: document_id.to_string(),
            in_flight: self.in_flight.clone(),
        })
    }

    pub fn is_processing(&self, document_id: &str) -> bool {
        lock(&self.in_flight).contains(document_id)
    }
}

impl Drop for ProcessingTicket {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.document_id);
    }
}

fn lock(set: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
