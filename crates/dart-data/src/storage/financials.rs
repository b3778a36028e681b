//! 재무 계정 배치 삽입.

use sqlx::{Postgres, QueryBuilder, Transaction};
use tracing::debug;

use crate::error::Result;
use crate::storage::UpsertCounts;

/// 삽입 배치 크기 (바인드 한도 대비 여유)
const INSERT_CHUNK: usize = 500;

/// 정규화된 재무 계정 행
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFinancialRow {
    pub corp_code: String,
    pub year: i32,
    pub report_code: String,
    pub fs_div: String,
    pub account_id: String,
    pub account_name: String,
    /// 파싱 실패/미보고 금액은 NULL로 보존
    pub amount: Option<i64>,
    /// 버전은 호출자가 부여 (정정공시는 더 높은 버전)
    pub version: i32,
}

/// 재무 계정 배치 삽입.
///
/// 자연키 (corp_code, year, report_code, fs_div, account_id, version)
/// 충돌 시 무시합니다 — 기존에 기록된 버전은 절대 덮어쓰지 않습니다.
pub async fn insert_financials(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[NewFinancialRow],
) -> Result<UpsertCounts> {
    if rows.is_empty() {
        return Ok(UpsertCounts::default());
    }

    let mut inserted = 0usize;

    for chunk in rows.chunks(INSERT_CHUNK) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO financial_fundamentals \
             (corp_code, year, report_code, fs_div, account_id, account_name, amount, version) ",
        );

        builder.push_values(chunk, |mut b, row| {
            b.push_bind(&row.corp_code)
                .push_bind(row.year)
                .push_bind(&row.report_code)
                .push_bind(&row.fs_div)
                .push_bind(&row.account_id)
                .push_bind(&row.account_name)
                .push_bind(row.amount)
                .push_bind(row.version);
        });
        builder.push(
            " ON CONFLICT (corp_code, year, report_code, fs_div, account_id, version) DO NOTHING",
        );

        let result = builder.build().execute(&mut **tx).await?;
        inserted += result.rows_affected() as usize;
    }

    let counts = UpsertCounts::new(rows.len(), inserted);
    debug!(
        attempted = counts.attempted,
        inserted = counts.inserted,
        skipped = counts.skipped,
        "재무 계정 삽입"
    );

    Ok(counts)
}
