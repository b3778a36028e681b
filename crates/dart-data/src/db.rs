//! 데이터베이스 연결 풀 래퍼 및 마이그레이션.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::error::{DataError, Result};

/// 데이터베이스 풀 설정
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 연결 URL
    pub url: String,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 최소 유지 연결 수
    pub min_connections: u32,
    /// 연결 획득 타임아웃
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// 수집기(단일 프로세스, 순차 실행)용 풀 설정.
    ///
    /// 백필은 순차 I/O라 연결이 많이 필요 없습니다.
    pub fn for_collector(url: String) -> Self {
        Self {
            url,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// PgPool 소유 래퍼
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 설정으로 연결
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self { pool })
    }

    /// 내부 풀 참조
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 내장 마이그레이션 실행 (스키마 초기화/업그레이드)
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DataError::MigrationError(e.to_string()))?;

        info!("데이터베이스 마이그레이션 완료");
        Ok(())
    }
}
