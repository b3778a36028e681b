//! 데이터 계층 에러 타입.

use thiserror::Error;

/// 데이터 계층 에러
#[derive(Debug, Error)]
pub enum DataError {
    #[error("데이터베이스 연결 실패: {0}")]
    ConnectionError(String),

    #[error("쿼리 실행 실패: {0}")]
    QueryError(String),

    #[error("삽입 실패: {0}")]
    InsertError(String),

    #[error("마이그레이션 실패: {0}")]
    MigrationError(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        Self::QueryError(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, DataError>;
