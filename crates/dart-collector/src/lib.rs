//! DART 공시 데이터 수집기.
//!
//! 기업 마스터 적재, 재무제표 백필, 주요사항 공시 동기화와
//! 월간 스케줄러를 제공합니다.

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
