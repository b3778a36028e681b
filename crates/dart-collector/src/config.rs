//! 환경변수 기반 설정 모듈.

use crate::Result;
use dart_core::FsDiv;
use std::time::Duration;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// DART API 설정
    pub dart: DartApiConfig,
    /// 백필 설정
    pub backfill: BackfillConfig,
    /// 주요사항 동기화 설정
    pub events: EventsConfig,
}

/// DART Open API 설정
#[derive(Debug, Clone)]
pub struct DartApiConfig {
    /// DART API 인증 키
    pub api_key: String,
    /// API 요청 간 딜레이 (밀리초)
    /// 기본값: 150ms (일일 쿼터 보호)
    pub request_delay_ms: u64,
    /// 일일 쿼터 소진 시 대기 시간 (초)
    /// 기본값: 3600초
    pub rate_limit_pause_secs: u64,
}

/// 재무제표 백필 설정
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// 백필 시작 연도
    pub start_year: i32,
    /// 요청할 재무제표 구분 (CFS/OFS)
    pub fs_div: FsDiv,
}

/// 주요사항 공시 동기화 설정
#[derive(Debug, Clone)]
pub struct EventsConfig {
    /// 조회 기간 (일)
    pub lookback_days: i64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            crate::error::CollectorError::Config(
                "DATABASE_URL 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;
        let api_key = std::env::var("DART_API_KEY").map_err(|_| {
            crate::error::CollectorError::Config(
                "DART_API_KEY 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        let fs_div = match std::env::var("BACKFILL_FS_DIV") {
            Ok(raw) => FsDiv::from_code(&raw).ok_or_else(|| {
                crate::error::CollectorError::Config(format!(
                    "BACKFILL_FS_DIV 값이 올바르지 않습니다: {} (CFS 또는 OFS)",
                    raw
                ))
            })?,
            Err(_) => FsDiv::Cfs,
        };

        Ok(Self {
            database_url,
            dart: DartApiConfig {
                api_key,
                request_delay_ms: env_var_parse("DART_REQUEST_DELAY_MS", 150),
                rate_limit_pause_secs: env_var_parse("DART_RATE_LIMIT_PAUSE_SECS", 3600),
            },
            backfill: BackfillConfig {
                start_year: env_var_parse("BACKFILL_START_YEAR", 2015),
                fs_div,
            },
            events: EventsConfig {
                lookback_days: env_var_parse("EVENTS_LOOKBACK_DAYS", 31),
            },
        })
    }
}

impl DartApiConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 쿼터 소진 시 대기 시간을 Duration으로 반환
    pub fn rate_limit_pause(&self) -> Duration {
        Duration::from_secs(self.rate_limit_pause_secs)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
