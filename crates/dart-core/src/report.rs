//! 보고서 코드 및 재무제표 구분.

use serde::{Deserialize, Serialize};

/// DART 보고서 코드.
///
/// 분기 순서대로 처리합니다: 1분기 → 반기 → 3분기 → 사업보고서.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportCode {
    /// 1분기보고서 (11013)
    Q1,
    /// 반기보고서 (11012)
    Q2,
    /// 3분기보고서 (11014)
    Q3,
    /// 사업보고서 (11011)
    Annual,
}

impl ReportCode {
    /// 처리 순서 (분기 → 연간)
    pub const ALL: [ReportCode; 4] = [
        ReportCode::Q1,
        ReportCode::Q2,
        ReportCode::Q3,
        ReportCode::Annual,
    ];

    /// DART API 요청 코드 (reprt_code)
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Q1 => "11013",
            Self::Q2 => "11012",
            Self::Q3 => "11014",
            Self::Annual => "11011",
        }
    }

    /// DART 코드에서 변환
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "11013" => Some(Self::Q1),
            "11012" => Some(Self::Q2),
            "11014" => Some(Self::Q3),
            "11011" => Some(Self::Annual),
            _ => None,
        }
    }

    /// 사람이 읽는 분기 라벨
    pub fn label(&self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Annual => "Q4/Annual",
        }
    }
}

/// 재무제표 구분 (연결 / 개별).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FsDiv {
    /// 연결재무제표
    Cfs,
    /// 개별(별도)재무제표
    Ofs,
}

impl FsDiv {
    /// DART API 요청 코드 (fs_div)
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Cfs => "CFS",
            Self::Ofs => "OFS",
        }
    }

    /// 코드 문자열에서 변환 (대소문자 무시)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "CFS" => Some(Self::Cfs),
            "OFS" => Some(Self::Ofs),
            _ => None,
        }
    }
}
