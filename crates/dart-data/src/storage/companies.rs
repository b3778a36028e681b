//! 회사 마스터 테이블 쓰기.
//!
//! 회사 식별자는 항상 corp_code (불변 8자리)입니다. stock_code는
//! 상장폐지 후 재사용될 수 있어 절대 조인 키로 쓰지 않습니다.

use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::error::Result;

/// 회사 행
#[derive(Debug, Clone, FromRow)]
pub struct CompanyRow {
    pub corp_code: String,
    pub stock_code: Option<String>,
    pub corp_name: String,
    pub is_priority: bool,
    pub listing_date: Option<NaiveDate>,
    pub delisted_date: Option<NaiveDate>,
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
    /// 이 연도 이전에는 데이터가 없음이 확인된 워터마크
    pub earliest_data_year: Option<i32>,
}

/// 신규 회사 (CSV 수집 결과)
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub corp_code: String,
    pub stock_code: Option<String>,
    pub corp_name: String,
    pub is_priority: bool,
    pub listing_date: Option<NaiveDate>,
}

/// 회사 삽입. 이미 존재하면 false.
pub async fn insert_company(pool: &PgPool, company: &NewCompany) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO companies (corp_code, stock_code, corp_name, is_priority, listing_date)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (corp_code) DO NOTHING
        "#,
    )
    .bind(&company.corp_code)
    .bind(&company.stock_code)
    .bind(&company.corp_name)
    .bind(company.is_priority)
    .bind(company.listing_date)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// corp_code로 조회
pub async fn find_company(pool: &PgPool, corp_code: &str) -> Result<Option<CompanyRow>> {
    let row = sqlx::query_as(
        r#"
        SELECT corp_code, stock_code, corp_name, is_priority,
               listing_date, delisted_date, last_updated, earliest_data_year
        FROM companies
        WHERE corp_code = $1
        "#,
    )
    .bind(corp_code)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// 종목코드 보유 회사 조회 (재사용 충돌 검사용)
pub async fn find_by_stock_code(pool: &PgPool, stock_code: &str) -> Result<Option<CompanyRow>> {
    let row = sqlx::query_as(
        r#"
        SELECT corp_code, stock_code, corp_name, is_priority,
               listing_date, delisted_date, last_updated, earliest_data_year
        FROM companies
        WHERE stock_code = $1
        "#,
    )
    .bind(stock_code)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// 종목코드 해제 (상장폐지 회사의 코드를 신규 회사에 재할당할 때)
pub async fn clear_stock_code(pool: &PgPool, corp_code: &str) -> Result<()> {
    sqlx::query("UPDATE companies SET stock_code = NULL WHERE corp_code = $1")
        .bind(corp_code)
        .execute(pool)
        .await?;

    debug!(corp_code = corp_code, "종목코드 해제");
    Ok(())
}

/// 상장폐지일 설정. 회사가 없으면 false.
pub async fn set_delisted_date(pool: &PgPool, corp_code: &str, date: NaiveDate) -> Result<bool> {
    let result = sqlx::query("UPDATE companies SET delisted_date = $2 WHERE corp_code = $1")
        .bind(corp_code)
        .bind(date)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// earliest_data_year 워터마크 갱신.
///
/// 단조 강화만 허용: NULL이거나 더 큰 값일 때만 낮춥니다.
/// 한 번 확인된 "데이터 시작 연도"를 느슨하게 되돌리지 않습니다.
pub async fn update_watermark(pool: &PgPool, corp_code: &str, year: i32) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE companies
        SET earliest_data_year = $2
        WHERE corp_code = $1
          AND (earliest_data_year IS NULL OR earliest_data_year > $2)
        "#,
    )
    .bind(corp_code)
    .bind(year)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// last_updated 갱신 (월간 동기화 후)
pub async fn touch_last_updated(pool: &PgPool, corp_code: &str) -> Result<()> {
    sqlx::query("UPDATE companies SET last_updated = NOW() WHERE corp_code = $1")
        .bind(corp_code)
        .execute(pool)
        .await?;

    Ok(())
}

/// 백필 대상 회사 목록.
///
/// 우선순위 회사를 먼저, 그다음 corp_code 순으로 처리합니다.
pub async fn companies_for_backfill(
    pool: &PgPool,
    priority_only: bool,
    corp_code: Option<&str>,
) -> Result<Vec<CompanyRow>> {
    let mut builder = sqlx::QueryBuilder::new(
        r#"
        SELECT corp_code, stock_code, corp_name, is_priority,
               listing_date, delisted_date, last_updated, earliest_data_year
        FROM companies
        WHERE 1 = 1
        "#,
    );

    if priority_only {
        builder.push(" AND is_priority = TRUE");
    }
    if let Some(code) = corp_code {
        builder.push(" AND corp_code = ");
        builder.push_bind(code);
    }
    builder.push(" ORDER BY is_priority DESC, corp_code");

    let rows = builder.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}

/// 등록된 모든 corp_code (이벤트 수집 시 FK 필터용)
pub async fn all_corp_codes(pool: &PgPool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT corp_code FROM companies")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(code,)| code).collect())
}
