//! 읽기 전용 조회 계층.
//!
//! 외부 표시 계층(대시보드 등)이 소비하는 쿼리 표면입니다.
//! 렌더링 책임은 없으며 행과 총 건수만 반환합니다.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use dart_core::{FsDiv, ReportCode};

use crate::error::Result;
use crate::storage::CompanyRow;

/// 회사 목록 필터
#[derive(Debug, Clone, Default)]
pub struct CompanyFilter {
    /// 회사명 / 종목코드 / corp_code 부분 일치 검색
    pub search: Option<String>,
    /// 우선순위 회사만
    pub priority_only: bool,
}

/// 페이지네이션
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

/// 재무 행 필터
#[derive(Debug, Clone, Copy, Default)]
pub struct FinancialFilter {
    pub year: Option<i32>,
    pub report: Option<ReportCode>,
    pub fs_div: Option<FsDiv>,
}

/// 재무 조회 행 (최신 뷰 또는 원본 테이블)
#[derive(Debug, Clone, FromRow)]
pub struct FinancialRow {
    pub corp_code: String,
    pub year: i32,
    pub report_code: String,
    pub fs_div: String,
    pub account_id: String,
    pub account_name: String,
    pub amount: Option<i64>,
    pub version: i32,
    pub fetched_at: DateTime<Utc>,
}

/// 공시 이벤트 조회 행
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub rcept_no: String,
    pub corp_code: String,
    pub report_nm: String,
    pub event_date: NaiveDate,
}

/// 회사 목록 조회 (검색 + 페이지네이션). (행, 전체 건수) 반환.
pub async fn list_companies(
    pool: &PgPool,
    filter: &CompanyFilter,
    page: Page,
) -> Result<(Vec<CompanyRow>, i64)> {
    fn apply_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CompanyFilter) {
        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search);
            builder.push(" AND (corp_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR stock_code ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR corp_code ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        if filter.priority_only {
            builder.push(" AND is_priority = TRUE");
        }
    }

    let mut count_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM companies WHERE 1 = 1");
    apply_filter(&mut count_builder, filter);
    let (total,): (i64,) = count_builder.build_query_as().fetch_one(pool).await?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"
        SELECT corp_code, stock_code, corp_name, is_priority,
               listing_date, delisted_date, last_updated, earliest_data_year
        FROM companies
        WHERE 1 = 1
        "#,
    );
    apply_filter(&mut builder, filter);
    builder.push(" ORDER BY corp_name LIMIT ");
    builder.push_bind(page.limit);
    builder.push(" OFFSET ");
    builder.push_bind(page.offset);

    let rows = builder.build_query_as().fetch_all(pool).await?;
    Ok((rows, total))
}

/// 회사의 재무 행 조회.
///
/// `latest_only`면 latest_financials 뷰 (자연키별 최신 버전만),
/// 아니면 원본 테이블의 모든 버전을 반환합니다.
pub async fn company_financials(
    pool: &PgPool,
    corp_code: &str,
    filter: FinancialFilter,
    latest_only: bool,
) -> Result<Vec<FinancialRow>> {
    let source = if latest_only {
        "latest_financials"
    } else {
        "financial_fundamentals"
    };

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT corp_code, year, report_code, fs_div, account_id, account_name, \
         amount, version, fetched_at FROM {} WHERE corp_code = ",
        source
    ));
    builder.push_bind(corp_code);

    if let Some(year) = filter.year {
        builder.push(" AND year = ");
        builder.push_bind(year);
    }
    if let Some(report) = filter.report {
        builder.push(" AND report_code = ");
        builder.push_bind(report.as_code());
    }
    if let Some(fs_div) = filter.fs_div {
        builder.push(" AND fs_div = ");
        builder.push_bind(fs_div.as_code());
    }
    builder.push(" ORDER BY year, report_code, account_id, version");

    let rows = builder.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}

/// 회사의 최근 공시 이벤트 조회
pub async fn company_events(pool: &PgPool, corp_code: &str, limit: i64) -> Result<Vec<EventRow>> {
    let rows = sqlx::query_as(
        r#"
        SELECT rcept_no, corp_code, report_nm, event_date
        FROM key_events
        WHERE corp_code = $1
        ORDER BY event_date DESC, rcept_no DESC
        LIMIT $2
        "#,
    )
    .bind(corp_code)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// 전체 백필 진행 상황 (상태별 건수)
pub async fn backfill_status_counts(pool: &PgPool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT status, COUNT(*)
        FROM backfill_progress
        GROUP BY status
        ORDER BY status
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
