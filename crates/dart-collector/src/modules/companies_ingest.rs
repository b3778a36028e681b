//! 기업 마스터 CSV 적재.
//!
//! corp_code가 유일한 조인 키입니다. stock_code는 상장폐지 후
//! 재사용될 수 있어 충돌 시 정책에 따라 기존 보유 회사의 코드를
//! 해제하거나 새 행을 거부합니다.

use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};

use dart_core::transform::{normalize_code, parse_bool_flag, parse_date_flexible};
use dart_core::StockCodeReusePolicy;
use dart_data::storage::companies::{self, NewCompany};

use crate::error::Result;
use crate::stats::{DelistingStats, IngestStats};

/// 기업 적재 옵션
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// 종목코드 재사용 처리 정책
    pub on_stock_code_reuse: StockCodeReusePolicy,
    /// is_priority 컬럼이 없는 행의 기본값
    pub default_priority: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            on_stock_code_reuse: StockCodeReusePolicy::Reassign,
            default_priority: false,
        }
    }
}

/// 기업 목록 CSV 원시 행
#[derive(Debug, Deserialize)]
struct CsvCompanyRecord {
    corp_code: Option<String>,
    #[serde(default)]
    stock_code: Option<String>,
    corp_name: Option<String>,
    #[serde(default)]
    is_priority: Option<String>,
    #[serde(default)]
    listing_date: Option<String>,
}

/// 상장폐지 CSV 원시 행
#[derive(Debug, Deserialize)]
struct CsvDelistingRecord {
    corp_code: Option<String>,
    delisted_date: Option<String>,
}

/// CSV 파일에서 기업 목록 적재
pub async fn ingest_companies(
    pool: &PgPool,
    path: &Path,
    options: &IngestOptions,
) -> Result<IngestStats> {
    let mut stats = IngestStats::default();
    let mut reader = csv::Reader::from_path(path)?;

    info!(path = %path.display(), "기업 목록 적재 시작");

    for record in reader.deserialize::<CsvCompanyRecord>() {
        stats.total_rows += 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(row = stats.total_rows, error = %e, "CSV 행 파싱 실패, 건너뜀");
                stats.invalid += 1;
                continue;
            }
        };

        let corp_code = record
            .corp_code
            .as_deref()
            .and_then(|v| normalize_code(v, 8));
        let corp_name = record
            .corp_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let (corp_code, corp_name) = match (corp_code, corp_name) {
            (Some(code), Some(name)) => (code, name.to_string()),
            _ => {
                warn!(row = stats.total_rows, "corp_code/corp_name 누락, 행 건너뜀");
                stats.invalid += 1;
                continue;
            }
        };

        let stock_code = record
            .stock_code
            .as_deref()
            .and_then(|v| normalize_code(v, 6));

        // 종목코드 재사용 검사: 다른 회사가 이미 보유 중인 코드.
        // 재할당은 기존 보유 회사가 상장폐지된 경우에만 허용됩니다.
        if let Some(ref code) = stock_code {
            if let Some(holder) = companies::find_by_stock_code(pool, code).await? {
                if holder.corp_code != corp_code {
                    if holder.delisted_date.is_none() {
                        warn!(
                            stock_code = %code,
                            holder = %holder.corp_code,
                            rejected = %corp_code,
                            "상장 중인 회사가 보유한 종목코드, 행 거부"
                        );
                        stats.conflicts += 1;
                        continue;
                    }
                    match options.on_stock_code_reuse {
                        StockCodeReusePolicy::Reassign => {
                            warn!(
                                stock_code = %code,
                                previous = %holder.corp_code,
                                new = %corp_code,
                                "상장폐지 회사의 종목코드 재사용, 기존 회사에서 해제"
                            );
                            companies::clear_stock_code(pool, &holder.corp_code).await?;
                            stats.stock_code_released += 1;
                        }
                        StockCodeReusePolicy::Reject => {
                            warn!(
                                stock_code = %code,
                                previous = %holder.corp_code,
                                rejected = %corp_code,
                                "종목코드 재사용 감지, 행 거부"
                            );
                            stats.conflicts += 1;
                            continue;
                        }
                    }
                }
            }
        }

        let company = NewCompany {
            corp_code,
            stock_code,
            corp_name,
            is_priority: record
                .is_priority
                .as_deref()
                .map(|v| parse_bool_flag(v, options.default_priority))
                .unwrap_or(options.default_priority),
            listing_date: record
                .listing_date
                .as_deref()
                .and_then(parse_date_flexible),
        };

        if companies::insert_company(pool, &company).await? {
            stats.inserted += 1;
        } else {
            stats.duplicates += 1;
        }
    }

    Ok(stats)
}

/// CSV 파일에서 상장폐지일 반영
pub async fn update_delistings(pool: &PgPool, path: &Path) -> Result<DelistingStats> {
    let mut stats = DelistingStats::default();
    let mut reader = csv::Reader::from_path(path)?;

    info!(path = %path.display(), "상장폐지 반영 시작");

    for record in reader.deserialize::<CsvDelistingRecord>() {
        stats.total_rows += 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(row = stats.total_rows, error = %e, "CSV 행 파싱 실패, 건너뜀");
                stats.invalid += 1;
                continue;
            }
        };

        let corp_code = record
            .corp_code
            .as_deref()
            .and_then(|v| normalize_code(v, 8));
        let date = record
            .delisted_date
            .as_deref()
            .and_then(parse_date_flexible);

        let (corp_code, date) = match (corp_code, date) {
            (Some(code), Some(date)) => (code, date),
            _ => {
                warn!(row = stats.total_rows, "corp_code/delisted_date 파싱 실패");
                stats.invalid += 1;
                continue;
            }
        };

        if companies::set_delisted_date(pool, &corp_code, date).await? {
            stats.updated += 1;
        } else {
            warn!(corp_code = %corp_code, "미등록 회사, 상장폐지 반영 건너뜀");
            stats.not_found += 1;
        }
    }

    Ok(stats)
}
