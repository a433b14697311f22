//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//!
//! 각 하위 모듈:
//! - `documents`: 문서 조회/생성/삭제와 소유권 확인
//! - `versions`: 텍스트 버전과 변경 기록 원장 (Version & Change Ledger)

pub mod documents;
pub mod versions;

pub use documents::*;
pub use versions::*;

use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;

/// `./migrations` 폴더의 SQL 파일들을 컴파일 타임에 포함합니다.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// 연결 풀을 만들고 마이그레이션을 실행합니다.
///
/// 외래키(ON DELETE CASCADE)가 동작하도록 `foreign_keys`를 명시적으로 켭니다.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    tracing::info!("Running database migrations...");
    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // 인메모리 DB는 연결마다 따로 생기므로 연결을 하나로 제한합니다.
    connect("sqlite::memory:", 1).await.expect("in-memory database")
}
