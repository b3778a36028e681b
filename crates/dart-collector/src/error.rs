//! 에러 타입 정의.

use std::fmt;

use dart_data::error::DataError;
use dart_data::provider::DartError;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 데이터베이스 에러
    Database(sqlx::Error),
    /// 설정 에러
    Config(String),
    /// DART API 에러
    DataSource(String),
    /// CSV 파싱 에러
    Csv(String),
    /// 스케줄링 에러
    Scheduling(String),
    /// 알림 전송 에러
    Notification(String),
    /// 일반 에러
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(e) => write!(f, "Database error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::DataSource(msg) => write!(f, "Data source error: {}", msg),
            Self::Csv(msg) => write!(f, "CSV error: {}", msg),
            Self::Scheduling(msg) => write!(f, "Scheduling error: {}", msg),
            Self::Notification(msg) => write!(f, "Notification error: {}", msg),
            Self::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<sqlx::Error> for CollectorError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl From<std::env::VarError> for CollectorError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<DartError> for CollectorError {
    fn from(err: DartError) -> Self {
        Self::DataSource(err.to_string())
    }
}

impl From<csv::Error> for CollectorError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CollectorError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Other(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
