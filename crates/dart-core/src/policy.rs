//! 백필 동작을 제어하는 정책 enum.
//!
//! 각 정책 축은 닫힌 variant 집합으로, 모든 분기에서 exhaustive match 합니다.

use serde::{Deserialize, Serialize};

/// "데이터 없음" (status 013/800) 응답 처리 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoDataPolicy {
    /// 건너뛰고 다음 단위 계속
    Skip,
    /// 건너뛰되 회사의 earliest_data_year 워터마크를 해당 연도로 갱신
    Mark,
    /// 해당 회사의 나머지 단위 처리 중단
    Stop,
}

/// 호출 한도 초과 (status 020) 응답 처리 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateLimitPolicy {
    /// 설정된 시간만큼 대기 후 같은 단위부터 재시도
    Pause,
    /// 전체 실행 중단 (체크포인트로 다음 실행 시 정확히 재개)
    Exit,
}

/// 상장폐지 후 종목코드 재사용 처리 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockCodeReusePolicy {
    /// 기존 보유 회사의 종목코드를 비우고 새 회사에 할당
    Reassign,
    /// 재사용 감지 시 새 행을 거부
    Reject,
}

/// 백필 단위 (회사, 연도, 보고서) 처리 상태.
///
/// 체크포인트 행이 없으면 pending. `Done`/`NoData`는 종결 상태로
/// 재실행 시 건너뛰고, `InProgress`/`Error`는 재시도 대상입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    InProgress,
    Done,
    NoData,
    Error,
}

impl UnitStatus {
    /// DB 저장용 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::NoData => "no_data",
            Self::Error => "error",
        }
    }

    /// DB 문자열에서 변환
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            "no_data" => Some(Self::NoData),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// 종결 상태 여부 (재실행 시 건너뜀)
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, Self::Done | Self::NoData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_status_round_trip() {
        for status in [
            UnitStatus::InProgress,
            UnitStatus::Done,
            UnitStatus::NoData,
            UnitStatus::Error,
        ] {
            assert_eq!(UnitStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(UnitStatus::from_str("completed"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(UnitStatus::Done.is_terminal_success());
        assert!(UnitStatus::NoData.is_terminal_success());
        assert!(!UnitStatus::InProgress.is_terminal_success());
        assert!(!UnitStatus::Error.is_terminal_success());
    }
}
