//! 주요 공시 이벤트 삽입.

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::error::Result;
use crate::storage::UpsertCounts;

const INSERT_CHUNK: usize = 500;

/// 정규화된 공시 이벤트
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// 접수번호 (14자리, PK)
    pub rcept_no: String,
    pub corp_code: String,
    pub report_nm: String,
    pub event_date: NaiveDate,
}

/// 이벤트 배치 삽입. 접수번호 충돌 시 무시 (이벤트는 불변).
pub async fn insert_events(pool: &PgPool, events: &[NewEvent]) -> Result<UpsertCounts> {
    if events.is_empty() {
        return Ok(UpsertCounts::default());
    }

    let mut inserted = 0usize;

    for chunk in events.chunks(INSERT_CHUNK) {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO key_events (rcept_no, corp_code, report_nm, event_date) ");

        builder.push_values(chunk, |mut b, event| {
            b.push_bind(&event.rcept_no)
                .push_bind(&event.corp_code)
                .push_bind(&event.report_nm)
                .push_bind(event.event_date);
        });
        builder.push(" ON CONFLICT (rcept_no) DO NOTHING");

        let result = builder.build().execute(pool).await?;
        inserted += result.rows_affected() as usize;
    }

    let counts = UpsertCounts::new(events.len(), inserted);
    debug!(
        attempted = counts.attempted,
        inserted = counts.inserted,
        skipped = counts.skipped,
        "공시 이벤트 삽입"
    );

    Ok(counts)
}
