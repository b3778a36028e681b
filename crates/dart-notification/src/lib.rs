//! 동기화 작업 이메일 알림.

pub mod email;

pub use email::{EmailConfig, EmailNotifier};

use thiserror::Error;

/// 알림 전송 에러
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("잘못된 설정: {0}")]
    InvalidConfig(String),

    #[error("전송 실패: {0}")]
    SendFailed(String),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, NotificationError>;
