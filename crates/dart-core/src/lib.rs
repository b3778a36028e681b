//! DART 공시 파이프라인 공통 도메인 타입.
//!
//! 순수 함수와 닫힌 enum만 포함합니다. I/O 없음.

pub mod policy;
pub mod report;
pub mod transform;

pub use policy::{NoDataPolicy, RateLimitPolicy, StockCodeReusePolicy, UnitStatus};
pub use report::{FsDiv, ReportCode};
