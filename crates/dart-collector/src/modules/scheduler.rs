//! 월간 동기화 스케줄러.
//!
//! 매월 1일 02:00 (Asia/Seoul)에 당해 연도 백필과 주요사항 동기화를
//! 실행합니다. 실행 시각 계산은 순수 함수로 분리되어 있습니다.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Asia::Seoul;
use sqlx::PgPool;
use tracing::{error, info};

use dart_data::provider::DartApi;
use dart_notification::EmailNotifier;

use crate::config::CollectorConfig;
use crate::error::Result;
use crate::modules::events_sync::{sync_events, EventsSyncOptions};
use crate::modules::financials_backfill::{run_backfill, BackfillOptions};

/// 다음 월간 실행 시각 계산.
///
/// `after` 이후 가장 가까운 "매월 1일 02:00 KST"를 UTC로 반환합니다.
/// `after`가 이미 이번 달 경계를 지났으면 다음 달로 넘어갑니다.
pub fn next_monthly_run(after: DateTime<Utc>) -> DateTime<Utc> {
    let local = after.with_timezone(&Seoul);
    let mut year = local.year();
    let mut month = local.month();

    loop {
        if let Some(candidate) = Seoul
            .with_ymd_and_hms(year, month, 1, 2, 0, 0)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
        {
            if candidate > after {
                return candidate;
            }
        }

        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
}

/// 월간 동기화 작업 1회 실행.
///
/// 당해 연도 재무제표 백필 (last_updated 갱신 포함) 후 주요사항
/// 공시를 동기화합니다. 알림이 설정되어 있으면 결과를 이메일로
/// 전송합니다.
pub async fn run_monthly_sync(
    client: &dyn DartApi,
    pool: &PgPool,
    config: &CollectorConfig,
    notifier: Option<&EmailNotifier>,
) -> Result<()> {
    let current_year = Utc::now().with_timezone(&Seoul).year();
    info!(year = current_year, "월간 동기화 시작");

    let options = BackfillOptions {
        start_year: current_year,
        end_year: current_year,
        fs_div: config.backfill.fs_div,
        rate_limit_pause: config.dart.rate_limit_pause(),
        touch_last_updated: true,
        ..Default::default()
    };

    let backfill = match run_backfill(client, pool, &options).await {
        Ok(stats) => {
            stats.log_summary("월간 백필");
            stats
        }
        Err(e) => {
            error!("월간 백필 실패: {}", e);
            notify_failure(notifier, "monthly-backfill", &e.to_string(), current_year).await;
            return Err(e);
        }
    };

    let events_options = EventsSyncOptions {
        lookback_days: config.events.lookback_days,
        corp_code: None,
    };
    let events = match sync_events(client, pool, &events_options).await {
        Ok(stats) => {
            stats.log_summary();
            stats
        }
        Err(e) => {
            error!("주요사항 동기화 실패: {}", e);
            notify_failure(notifier, "events-sync", &e.to_string(), current_year).await;
            return Err(e);
        }
    };

    if let Some(notifier) = notifier {
        let summary = vec![
            ("year".to_string(), current_year.to_string()),
            ("backfill_total".to_string(), backfill.total.to_string()),
            ("backfill_success".to_string(), backfill.success.to_string()),
            ("backfill_no_data".to_string(), backfill.no_data.to_string()),
            ("backfill_errors".to_string(), backfill.errors.to_string()),
            ("records".to_string(), backfill.records.to_string()),
            ("events_inserted".to_string(), events.inserted.to_string()),
        ];
        if let Err(e) = notifier.send_sync_summary(&summary).await {
            error!("완료 알림 전송 실패: {}", e);
        }
    }

    info!(year = current_year, "월간 동기화 완료");
    Ok(())
}

async fn notify_failure(
    notifier: Option<&EmailNotifier>,
    job_name: &str,
    detail: &str,
    year: i32,
) {
    if let Some(notifier) = notifier {
        let context = vec![("year".to_string(), year.to_string())];
        if let Err(e) = notifier.send_job_failure(job_name, detail, &context).await {
            error!("실패 알림 전송 실패: {}", e);
        }
    }
}

/// 스케줄러 데몬 루프.
///
/// 다음 실행 시각까지 대기 후 월간 동기화를 실행합니다.
/// Ctrl+C 수신 시 종료합니다. 작업 실패는 로그와 알림으로 남기고
/// 루프는 계속됩니다.
pub async fn run_scheduler(
    client: &dyn DartApi,
    pool: &PgPool,
    config: &CollectorConfig,
    notifier: Option<&EmailNotifier>,
) -> Result<()> {
    info!("스케줄러 시작 (매월 1일 02:00 KST)");

    loop {
        let now = Utc::now();
        let next = next_monthly_run(now);
        let wait = (next - now)
            .to_std()
            .unwrap_or_else(|_| std::time::Duration::from_secs(0));

        info!(
            next_run = %next.with_timezone(&Seoul),
            wait_secs = wait.as_secs(),
            "다음 실행 대기"
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                if let Err(e) = run_monthly_sync(client, pool, config, notifier).await {
                    error!("월간 동기화 실패, 다음 주기까지 대기: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("종료 신호 수신, 스케줄러 종료");
                return Ok(());
            }
        }
    }
}
