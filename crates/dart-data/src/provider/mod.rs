//! 외부 데이터 프로바이더.

pub mod dart_api;

pub use dart_api::{
    DartApi, DartApiClient, DartError, DisclosurePage, DisclosureRow, RawFinancialRow,
};
