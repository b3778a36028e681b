//! 수집 통계 구조체.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 재무제표 백필 통계.
///
/// 단위는 (기업, 연도, 보고서코드) 작업 단위입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillStats {
    /// 총 처리 단위 수
    pub total: usize,
    /// 성공 단위 수 (데이터 저장됨)
    pub success: usize,
    /// 데이터 없음 단위 수
    pub no_data: usize,
    /// 에러 단위 수
    pub errors: usize,
    /// 건너뛴 단위 수 (체크포인트 완료 상태)
    pub skipped: usize,
    /// 저장된 계정과목 행 수
    pub records: usize,
    /// 쿼터 제한으로 대기한 횟수
    pub rate_limited: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl BackfillStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    ///
    /// no_data(조회 성공, 데이터 없음)는 분모에서 제외.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total.saturating_sub(self.no_data);
        if attempted == 0 {
            0.0
        } else {
            (self.success as f64 / attempted as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            no_data = self.no_data,
            errors = self.errors,
            skipped = self.skipped,
            records = self.records,
            rate_limited = self.rate_limited,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "백필 완료"
        );
    }
}

/// 기업 목록 CSV 적재 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// CSV 총 행 수
    pub total_rows: usize,
    /// 신규 등록 수
    pub inserted: usize,
    /// 중복 건너뜀 수
    pub duplicates: usize,
    /// 종목코드 재사용으로 해제된 기존 기업 수 (상장폐지 회사만)
    pub stock_code_released: usize,
    /// 종목코드 충돌로 거부된 행 수
    pub conflicts: usize,
    /// 필수 값 누락 등으로 건너뛴 행 수
    pub invalid: usize,
}

impl IngestStats {
    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        tracing::info!(
            total_rows = self.total_rows,
            inserted = self.inserted,
            duplicates = self.duplicates,
            stock_code_released = self.stock_code_released,
            conflicts = self.conflicts,
            invalid = self.invalid,
            "기업 목록 적재 완료"
        );
    }
}

/// 상장폐지 반영 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelistingStats {
    /// CSV 총 행 수
    pub total_rows: usize,
    /// 상장폐지일 반영 수
    pub updated: usize,
    /// 등록되지 않은 종목코드 수
    pub not_found: usize,
    /// 파싱 실패 행 수
    pub invalid: usize,
}

impl DelistingStats {
    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        tracing::info!(
            total_rows = self.total_rows,
            updated = self.updated,
            not_found = self.not_found,
            invalid = self.invalid,
            "상장폐지 반영 완료"
        );
    }
}

/// 주요사항 공시 동기화 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsSyncStats {
    /// API에서 조회한 공시 수
    pub fetched: usize,
    /// 신규 저장 수
    pub inserted: usize,
    /// 중복 건너뜀 수
    pub duplicates: usize,
    /// 미등록 기업 공시로 제외된 수
    pub unknown_corp: usize,
    /// 접수번호/접수일자 누락으로 건너뛴 행 수
    pub invalid: usize,
    /// 조회한 페이지 수
    pub pages: usize,
}

impl EventsSyncStats {
    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        tracing::info!(
            fetched = self.fetched,
            inserted = self.inserted,
            duplicates = self.duplicates,
            unknown_corp = self.unknown_corp,
            invalid = self.invalid,
            pages = self.pages,
            "주요사항 동기화 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_excludes_no_data() {
        let stats = BackfillStats {
            total: 10,
            success: 4,
            no_data: 2,
            ..Default::default()
        };
        assert!((stats.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_rate_empty() {
        assert_eq!(BackfillStats::new().success_rate(), 0.0);
    }
}
