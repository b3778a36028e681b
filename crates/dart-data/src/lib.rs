//! DART 공시 파이프라인 데이터 계층.
//!
//! - [`db`]: PgPool 래퍼와 내장 마이그레이션
//! - [`provider`]: 호출 간격이 제한된 DART API 클라이언트
//! - [`storage`]: 자연키 기반 upsert 쓰기 계층
//! - [`repository`]: 대시보드 등 외부 소비자용 읽기 전용 쿼리

pub mod db;
pub mod error;
pub mod provider;
pub mod repository;
pub mod storage;

pub use db::{Database, DatabaseConfig};
pub use error::{DataError, Result};
