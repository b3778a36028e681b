//! 데이터 수집 모듈.

pub mod companies_ingest;
pub mod events_sync;
pub mod financials_backfill;
pub mod scheduler;

pub use companies_ingest::{ingest_companies, update_delistings, IngestOptions};
pub use events_sync::{sync_events, EventsSyncOptions};
pub use financials_backfill::{
    pending_units, run_backfill, transform_rows, years_to_process, BackfillOptions,
};
pub use scheduler::{next_monthly_run, run_monthly_sync, run_scheduler};
