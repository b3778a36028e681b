//! 재무제표 백필.
//!
//! 처리 단위는 (corp_code, year, report_code)입니다. 각 단위는
//! in_progress 체크포인트 기록 → API 호출 → 데이터와 done 체크포인트를
//! 한 트랜잭션으로 커밋하는 순서로 진행되며, 중단 후 재실행하면
//! 종결 상태(done/no_data) 단위만 건너뛰고 정확히 이어서 처리합니다.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Datelike;
use sqlx::PgPool;
use tracing::{info, warn};

use dart_core::transform::parse_amount;
use dart_core::{FsDiv, NoDataPolicy, RateLimitPolicy, ReportCode, UnitStatus};
use dart_data::provider::{DartApi, DartError, RawFinancialRow};
use dart_data::storage::financials::{insert_financials, NewFinancialRow};
use dart_data::storage::{checkpoint, companies};

use crate::error::Result;
use crate::stats::BackfillStats;

/// 백필 실행 옵션
#[derive(Debug, Clone)]
pub struct BackfillOptions {
    /// 특정 회사만 처리 (corp_code)
    pub corp_code: Option<String>,
    /// 시작 연도
    pub start_year: i32,
    /// 종료 연도 (포함)
    pub end_year: i32,
    /// 우선순위 회사만 처리
    pub priority_only: bool,
    /// 요청할 재무제표 구분
    pub fs_div: FsDiv,
    /// 데이터 없음 응답 처리 정책
    pub on_no_data: NoDataPolicy,
    /// 호출 한도 초과 처리 정책
    pub on_rate_limit: RateLimitPolicy,
    /// Pause 정책 시 대기 시간
    pub rate_limit_pause: Duration,
    /// 처리할 보고서 코드 (분기 → 연간 순)
    pub report_codes: Vec<ReportCode>,
    /// 회사 처리 완료 후 last_updated 갱신 여부 (월간 동기화용)
    pub touch_last_updated: bool,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            corp_code: None,
            start_year: 2015,
            end_year: chrono::Utc::now().year(),
            priority_only: false,
            fs_div: FsDiv::Cfs,
            on_no_data: NoDataPolicy::Skip,
            on_rate_limit: RateLimitPolicy::Pause,
            rate_limit_pause: Duration::from_secs(3600),
            report_codes: ReportCode::ALL.to_vec(),
            touch_last_updated: false,
        }
    }
}

/// 처리할 연도 목록 계산.
///
/// earliest_data_year 워터마크가 있으면 그보다 이전 연도는
/// 조회해도 데이터가 없음이 확인된 것이므로 제외합니다.
pub fn years_to_process(start_year: i32, end_year: i32, watermark: Option<i32>) -> Vec<i32> {
    let floor = watermark.map_or(start_year, |w| start_year.max(w));
    (floor..=end_year).collect()
}

/// 체크포인트를 반영한 미처리 단위 목록.
///
/// done/no_data는 종결 상태로 제외하고, in_progress/error는
/// 재시도 대상으로 포함합니다. 행이 없으면 pending입니다.
pub fn pending_units(
    years: &[i32],
    reports: &[ReportCode],
    checkpoints: &HashMap<(i32, ReportCode), UnitStatus>,
) -> Vec<(i32, ReportCode)> {
    let mut units = Vec::new();
    for &year in years {
        for &report in reports {
            match checkpoints.get(&(year, report)) {
                Some(status) if status.is_terminal_success() => {}
                _ => units.push((year, report)),
            }
        }
    }
    units
}

/// 원시 API 행을 저장용 행으로 정규화.
///
/// account_id가 없으면 sj_div로 폴백하고, 둘 다 없는 행은 버립니다.
/// 금액 파싱 실패는 NULL로 보존합니다.
pub fn transform_rows(
    corp_code: &str,
    year: i32,
    report: ReportCode,
    default_fs_div: FsDiv,
    raw: &[RawFinancialRow],
) -> Vec<NewFinancialRow> {
    raw.iter()
        .filter_map(|row| {
            let account_id = row
                .account_id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .or_else(|| {
                    row.sj_div
                        .as_deref()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                })?;

            let fs_div = row
                .fs_div
                .as_deref()
                .and_then(FsDiv::from_code)
                .unwrap_or(default_fs_div);

            Some(NewFinancialRow {
                corp_code: corp_code.to_string(),
                year,
                report_code: report.as_code().to_string(),
                fs_div: fs_div.as_code().to_string(),
                account_id: account_id.to_string(),
                account_name: row
                    .account_nm
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or("")
                    .to_string(),
                amount: row.thstrm_amount.as_deref().and_then(parse_amount),
                version: 1,
            })
        })
        .collect()
}

/// 단일 단위 처리 결과
enum UnitOutcome {
    /// 데이터 저장됨 (삽입 행 수)
    Saved(usize),
    /// 조회 성공, 데이터 없음
    NoData,
    /// 에러 기록됨
    Failed,
    /// 호출 한도로 전체 중단
    Abort,
}

/// 재무제표 백필 실행.
pub async fn run_backfill(
    client: &dyn DartApi,
    pool: &PgPool,
    options: &BackfillOptions,
) -> Result<BackfillStats> {
    let started = Instant::now();
    let mut stats = BackfillStats::new();

    let targets =
        companies::companies_for_backfill(pool, options.priority_only, options.corp_code.as_deref())
            .await?;

    info!(
        companies = targets.len(),
        start_year = options.start_year,
        end_year = options.end_year,
        fs_div = options.fs_div.as_code(),
        "백필 시작"
    );

    'company: for company in &targets {
        let years = years_to_process(
            options.start_year,
            options.end_year,
            company.earliest_data_year,
        );
        let checkpoints = checkpoint::load_company_checkpoints(pool, &company.corp_code).await?;
        let units = pending_units(&years, &options.report_codes, &checkpoints);

        let all_units = years.len() * options.report_codes.len();
        stats.skipped += all_units.saturating_sub(units.len());

        info!(
            corp_code = %company.corp_code,
            corp_name = %company.corp_name,
            pending = units.len(),
            skipped = all_units.saturating_sub(units.len()),
            "회사 백필"
        );

        for (year, report) in units {
            stats.total += 1;

            let outcome =
                process_unit(client, pool, options, &mut stats, &company.corp_code, year, report)
                    .await?;

            match outcome {
                UnitOutcome::Saved(records) => {
                    stats.success += 1;
                    stats.records += records;
                }
                UnitOutcome::NoData => {
                    stats.no_data += 1;
                    checkpoint::save_checkpoint(
                        pool,
                        &company.corp_code,
                        year,
                        report,
                        UnitStatus::NoData,
                        None,
                    )
                    .await?;

                    match options.on_no_data {
                        NoDataPolicy::Skip => {}
                        NoDataPolicy::Mark => {
                            if companies::update_watermark(pool, &company.corp_code, year).await? {
                                info!(
                                    corp_code = %company.corp_code,
                                    year = year,
                                    "earliest_data_year 워터마크 갱신"
                                );
                            }
                        }
                        NoDataPolicy::Stop => {
                            info!(
                                corp_code = %company.corp_code,
                                year = year,
                                report = report.as_code(),
                                "데이터 없음, 회사 나머지 단위 중단"
                            );
                            continue 'company;
                        }
                    }
                }
                UnitOutcome::Failed => {
                    stats.errors += 1;
                }
                UnitOutcome::Abort => {
                    stats.elapsed = started.elapsed();
                    warn!("호출 한도 초과, 백필 중단 (체크포인트로 재개 가능)");
                    return Ok(stats);
                }
            }
        }

        if options.touch_last_updated {
            companies::touch_last_updated(pool, &company.corp_code).await?;
        }
    }

    stats.elapsed = started.elapsed();
    Ok(stats)
}

/// 단일 (회사, 연도, 보고서) 단위 처리.
///
/// 호출 한도 초과 시 Pause 정책은 같은 단위를 대기 후 재시도합니다.
async fn process_unit(
    client: &dyn DartApi,
    pool: &PgPool,
    options: &BackfillOptions,
    stats: &mut BackfillStats,
    corp_code: &str,
    year: i32,
    report: ReportCode,
) -> Result<UnitOutcome> {
    loop {
        checkpoint::save_checkpoint(pool, corp_code, year, report, UnitStatus::InProgress, None)
            .await?;

        match client.fetch_financials(corp_code, year, report, options.fs_div).await {
            Ok(raw) => {
                let rows = transform_rows(corp_code, year, report, options.fs_div, &raw);
                if rows.is_empty() {
                    return Ok(UnitOutcome::NoData);
                }

                // 데이터와 done 체크포인트를 한 트랜잭션으로 커밋
                let mut tx = pool.begin().await?;
                let counts = insert_financials(&mut tx, &rows).await?;
                checkpoint::save_checkpoint_tx(
                    &mut tx,
                    corp_code,
                    year,
                    report,
                    UnitStatus::Done,
                    None,
                )
                .await?;
                tx.commit().await?;

                info!(
                    corp_code = corp_code,
                    year = year,
                    report = report.as_code(),
                    inserted = counts.inserted,
                    skipped = counts.skipped,
                    "재무제표 저장"
                );
                return Ok(UnitOutcome::Saved(counts.inserted));
            }
            Err(DartError::NoData { .. }) => return Ok(UnitOutcome::NoData),
            Err(DartError::RateLimited) => {
                stats.rate_limited += 1;
                match options.on_rate_limit {
                    RateLimitPolicy::Pause => {
                        warn!(
                            pause_secs = options.rate_limit_pause.as_secs(),
                            corp_code = corp_code,
                            year = year,
                            report = report.as_code(),
                            "호출 한도 초과, 대기 후 같은 단위 재시도"
                        );
                        tokio::time::sleep(options.rate_limit_pause).await;
                    }
                    RateLimitPolicy::Exit => return Ok(UnitOutcome::Abort),
                }
            }
            Err(e) => {
                let message = e.to_string();
                warn!(
                    corp_code = corp_code,
                    year = year,
                    report = report.as_code(),
                    error = %message,
                    "재무제표 조회 실패"
                );
                checkpoint::save_checkpoint(
                    pool,
                    corp_code,
                    year,
                    report,
                    UnitStatus::Error,
                    Some(&message),
                )
                .await?;
                return Ok(UnitOutcome::Failed);
            }
        }
    }
}
