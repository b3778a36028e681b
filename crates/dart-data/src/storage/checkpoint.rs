//! 백필 체크포인트 저장/조회.
//!
//! (corp_code, year, report_code) 단위당 한 행. 행이 없으면 pending.
//! 프로세스 재시작 시 다음 처리 단위는 이 테이블에서만 유도됩니다.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};

use dart_core::{ReportCode, UnitStatus};

use crate::error::Result;

/// 에러 메시지 컬럼 한도
const ERROR_MESSAGE_MAX: usize = 500;

/// 회사별 상태 요약 (CLI 조회용)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckpointSummary {
    pub corp_code: String,
    pub status: String,
    pub count: i64,
}

const UPSERT_SQL: &str = r#"
    INSERT INTO backfill_progress (corp_code, year, report_code, status, error_message, processed_at)
    VALUES ($1, $2, $3, $4, $5, NOW())
    ON CONFLICT (corp_code, year, report_code)
    DO UPDATE SET
        status = EXCLUDED.status,
        error_message = EXCLUDED.error_message,
        processed_at = NOW()
"#;

fn truncate_error(message: Option<&str>) -> Option<String> {
    message.map(|m| m.chars().take(ERROR_MESSAGE_MAX).collect())
}

/// 단위 상태 기록 (pool 경유)
pub async fn save_checkpoint(
    pool: &PgPool,
    corp_code: &str,
    year: i32,
    report: ReportCode,
    status: UnitStatus,
    error_message: Option<&str>,
) -> Result<()> {
    sqlx::query(UPSERT_SQL)
        .bind(corp_code)
        .bind(year)
        .bind(report.as_code())
        .bind(status.as_str())
        .bind(truncate_error(error_message))
        .execute(pool)
        .await?;

    Ok(())
}

/// 단위 상태 기록 (단위 트랜잭션 내부 — 데이터와 함께 커밋)
pub async fn save_checkpoint_tx(
    tx: &mut Transaction<'_, Postgres>,
    corp_code: &str,
    year: i32,
    report: ReportCode,
    status: UnitStatus,
    error_message: Option<&str>,
) -> Result<()> {
    sqlx::query(UPSERT_SQL)
        .bind(corp_code)
        .bind(year)
        .bind(report.as_code())
        .bind(status.as_str())
        .bind(truncate_error(error_message))
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// 회사의 체크포인트 맵 로드.
///
/// 알 수 없는 status 문자열이나 report_code는 무시합니다 (pending 취급).
pub async fn load_company_checkpoints(
    pool: &PgPool,
    corp_code: &str,
) -> Result<HashMap<(i32, ReportCode), UnitStatus>> {
    let rows: Vec<(i32, String, String)> = sqlx::query_as(
        r#"
        SELECT year, report_code, status
        FROM backfill_progress
        WHERE corp_code = $1
        "#,
    )
    .bind(corp_code)
    .fetch_all(pool)
    .await?;

    let mut map = HashMap::new();
    for (year, report_code, status) in rows {
        if let (Some(report), Some(status)) = (
            ReportCode::from_code(&report_code),
            UnitStatus::from_str(&status),
        ) {
            map.insert((year, report), status);
        }
    }

    Ok(map)
}

/// 전체 체크포인트 상태 요약 (회사 × 상태별 건수)
pub async fn list_checkpoint_summary(pool: &PgPool) -> Result<Vec<CheckpointSummary>> {
    let rows = sqlx::query_as(
        r#"
        SELECT corp_code, status, COUNT(*) AS count
        FROM backfill_progress
        GROUP BY corp_code, status
        ORDER BY corp_code, status
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// 회사의 체크포인트 전체 삭제. 삭제된 행 수 반환.
pub async fn clear_checkpoints(pool: &PgPool, corp_code: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM backfill_progress WHERE corp_code = $1")
        .bind(corp_code)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
