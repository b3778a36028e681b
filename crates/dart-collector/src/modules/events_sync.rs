//! 주요사항 공시 동기화.
//!
//! 최근 N일 공시 목록을 페이지 단위로 조회해 key_events에 저장합니다.
//! 미등록 기업의 공시는 FK 제약에 걸리므로 제외합니다.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{info, warn};

use dart_core::transform::parse_date8;
use dart_data::provider::{DartApi, DartError};
use dart_data::storage::events::{insert_events, NewEvent};
use dart_data::storage::companies;

use crate::error::Result;
use crate::stats::EventsSyncStats;

/// report_nm 컬럼 한도
const REPORT_NM_MAX: usize = 255;

/// 공시 동기화 옵션
#[derive(Debug, Clone)]
pub struct EventsSyncOptions {
    /// 조회 기간 (일)
    pub lookback_days: i64,
    /// 특정 회사만 조회
    pub corp_code: Option<String>,
}

impl Default for EventsSyncOptions {
    fn default() -> Self {
        Self {
            lookback_days: 31,
            corp_code: None,
        }
    }
}

/// 최근 공시 목록을 조회해 저장
pub async fn sync_events(
    client: &dyn DartApi,
    pool: &PgPool,
    options: &EventsSyncOptions,
) -> Result<EventsSyncStats> {
    let mut stats = EventsSyncStats::default();

    let end = Utc::now().date_naive();
    let begin = end - Duration::days(options.lookback_days);

    let known: HashSet<String> = companies::all_corp_codes(pool).await?.into_iter().collect();
    if known.is_empty() {
        warn!("등록된 회사가 없어 공시 동기화를 건너뜁니다");
        return Ok(stats);
    }

    info!(
        begin = %begin,
        end = %end,
        companies = known.len(),
        "주요사항 동기화 시작"
    );

    let mut page_no = 1u32;
    loop {
        // 기간 내 공시가 없으면 013이 돌아옵니다 — 실패가 아니라 빈 결과
        let page = match client
            .list_disclosures(options.corp_code.as_deref(), begin, end, page_no)
            .await
        {
            Ok(page) => page,
            Err(DartError::NoData { .. }) => {
                info!(begin = %begin, end = %end, "조회 기간 내 공시 없음");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        stats.pages += 1;
        stats.fetched += page.rows.len();

        let mut batch = Vec::new();
        for row in &page.rows {
            if row.rcept_no.trim().is_empty() {
                warn!(corp_code = %row.corp_code, "접수번호 누락, 행 건너뜀");
                stats.invalid += 1;
                continue;
            }
            if !known.contains(&row.corp_code) {
                stats.unknown_corp += 1;
                continue;
            }
            let Some(event_date) = parse_date8(&row.rcept_dt) else {
                warn!(rcept_no = %row.rcept_no, rcept_dt = %row.rcept_dt, "접수일자 파싱 실패");
                stats.invalid += 1;
                continue;
            };

            batch.push(NewEvent {
                rcept_no: row.rcept_no.clone(),
                corp_code: row.corp_code.clone(),
                report_nm: row.report_nm.chars().take(REPORT_NM_MAX).collect(),
                event_date,
            });
        }

        let counts = insert_events(pool, &batch).await?;
        stats.inserted += counts.inserted;
        stats.duplicates += counts.skipped;

        if !page.has_next() {
            break;
        }
        page_no += 1;
    }

    Ok(stats)
}
