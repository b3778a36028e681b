//! 쓰기 계층: 자연키 기반 upsert.

pub mod checkpoint;
pub mod companies;
pub mod events;
pub mod financials;

pub use checkpoint::{
    clear_checkpoints, list_checkpoint_summary, load_company_checkpoints, save_checkpoint,
    save_checkpoint_tx, CheckpointSummary,
};
pub use companies::{CompanyRow, NewCompany};
pub use events::NewEvent;
pub use financials::NewFinancialRow;

/// 배치 쓰기 결과 집계.
///
/// skipped = attempted - inserted (자연키 충돌로 무시된 행 수).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    /// 시도한 행 수
    pub attempted: usize,
    /// 실제 삽입된 행 수
    pub inserted: usize,
    /// 충돌로 건너뛴 행 수
    pub skipped: usize,
}

impl UpsertCounts {
    /// 시도/삽입 수로 생성 (skipped는 차이로 계산)
    pub fn new(attempted: usize, inserted: usize) -> Self {
        Self {
            attempted,
            inserted,
            skipped: attempted.saturating_sub(inserted),
        }
    }
}
