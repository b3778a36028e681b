//! SMTP 이메일 알림 전송.
//!
//! 스케줄러가 작업 실패/완료를 통지할 때 사용합니다.
//! 설정이 없으면 `from_env`가 None을 반환하고 호출자는 조용히 건너뜁니다.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, error, info, warn};

use crate::{NotificationError, Result};

/// 이메일 알림 설정
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP 서버 호스트
    pub smtp_host: String,
    /// SMTP 서버 포트
    pub smtp_port: u16,
    /// STARTTLS 사용 여부
    pub use_tls: bool,
    /// SMTP 사용자명
    pub username: String,
    /// SMTP 비밀번호
    pub password: String,
    /// 발신자 이메일 주소
    pub from_email: String,
    /// 수신자 이메일 주소 목록
    pub to_emails: Vec<String>,
    /// 전송 활성화 여부
    pub enabled: bool,
}

impl EmailConfig {
    /// 환경 변수에서 설정을 생성합니다.
    ///
    /// 필수 변수 (`EMAIL_SMTP_HOST`, `EMAIL_USERNAME`, `EMAIL_PASSWORD`,
    /// `EMAIL_FROM`, `EMAIL_TO`)가 하나라도 없으면 None.
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("EMAIL_SMTP_HOST").ok()?;
        let smtp_port = std::env::var("EMAIL_SMTP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(587);
        let username = std::env::var("EMAIL_USERNAME").ok()?;
        let password = std::env::var("EMAIL_PASSWORD").ok()?;
        let from_email = std::env::var("EMAIL_FROM").ok()?;
        let to_emails: Vec<String> = std::env::var("EMAIL_TO")
            .ok()?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if to_emails.is_empty() {
            return None;
        }

        let enabled = std::env::var("EMAIL_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);

        Some(Self {
            smtp_host,
            smtp_port,
            use_tls: true,
            username,
            password,
            from_email,
            to_emails,
            enabled,
        })
    }
}

/// 이메일 알림 전송기
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    /// 새 전송기 생성
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// 환경 변수에서 전송기 생성 (설정 없으면 None)
    pub fn from_env() -> Option<Self> {
        EmailConfig::from_env().map(Self::new)
    }

    /// 전송 가능 여부
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
            && !self.config.smtp_host.is_empty()
            && !self.config.to_emails.is_empty()
    }

    /// 작업 실패 알림
    pub async fn send_job_failure(
        &self,
        job_name: &str,
        error_detail: &str,
        context: &[(String, String)],
    ) -> Result<()> {
        let subject = format!("[OpenDART] Job Failed: {}", job_name);

        let mut lines = vec![
            format!("작업 '{}' 실행이 실패했습니다.", job_name),
            String::new(),
            format!("오류: {}", error_detail),
            String::new(),
        ];
        if !context.is_empty() {
            lines.push("실행 정보:".to_string());
            for (key, value) in context {
                lines.push(format!("  {}: {}", key, value));
            }
        }

        self.send_text(&subject, &lines.join("\n")).await
    }

    /// 월간 동기화 완료 요약
    pub async fn send_sync_summary(&self, stats: &[(String, String)]) -> Result<()> {
        let subject = "[OpenDART] Monthly Sync Completed";

        let mut lines = vec![
            "월간 DART 데이터 동기화가 완료되었습니다.".to_string(),
            String::new(),
            "통계:".to_string(),
        ];
        for (key, value) in stats {
            lines.push(format!("  {}: {}", key, value));
        }

        self.send_text(subject, &lines.join("\n")).await
    }

    /// 호출 한도 초과 알림
    pub async fn send_rate_limit_alert(&self, action_taken: &str) -> Result<()> {
        let subject = "[OpenDART] Rate Limit Hit (020)";
        let body = format!(
            "DART API 호출 한도를 초과했습니다.\n\n조치: {}",
            action_taken
        );

        self.send_text(subject, &body).await
    }

    /// 텍스트 이메일 전송
    async fn send_text(&self, subject: &str, body: &str) -> Result<()> {
        if !self.is_enabled() {
            warn!("이메일 알림 비활성화 상태, 전송 건너뜀: {}", subject);
            return Ok(());
        }

        let from_mailbox: Mailbox = self
            .config
            .from_email
            .parse()
            .map_err(|e| NotificationError::InvalidConfig(format!("잘못된 발신자 주소: {}", e)))?;

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer: AsyncSmtpTransport<Tokio1Executor> = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
                .map_err(|e| NotificationError::SendFailed(format!("SMTP 연결 실패: {}", e)))?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        for to_email in &self.config.to_emails {
            let to_mailbox: Mailbox = to_email.parse().map_err(|e| {
                NotificationError::InvalidConfig(format!("잘못된 수신자 주소: {}", e))
            })?;

            let email = Message::builder()
                .from(from_mailbox.clone())
                .to(to_mailbox)
                .subject(subject)
                .header(ContentType::TEXT_PLAIN)
                .body(body.to_string())
                .map_err(|e| NotificationError::SendFailed(format!("이메일 생성 실패: {}", e)))?;

            match mailer.send(email).await {
                Ok(_) => debug!("이메일 전송 성공: {}", to_email),
                Err(e) => {
                    error!("이메일 전송 실패 ({}): {}", to_email, e);
                    return Err(NotificationError::SendFailed(format!(
                        "이메일 전송 실패: {}",
                        e
                    )));
                }
            }
        }

        info!(
            recipients = self.config.to_emails.len(),
            subject = subject,
            "이메일 알림 전송 완료"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.test.com".to_string(),
            smtp_port: 587,
            use_tls: true,
            username: "user".to_string(),
            password: "pass".to_string(),
            from_email: "from@test.com".to_string(),
            to_emails: vec!["to@test.com".to_string()],
            enabled: true,
        }
    }

    #[test]
    fn test_is_enabled() {
        let notifier = EmailNotifier::new(test_config());
        assert!(notifier.is_enabled());

        let mut disabled = test_config();
        disabled.enabled = false;
        assert!(!EmailNotifier::new(disabled).is_enabled());

        let mut no_recipients = test_config();
        no_recipients.to_emails.clear();
        assert!(!EmailNotifier::new(no_recipients).is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_notifier_skips_silently() {
        let mut config = test_config();
        config.enabled = false;
        let notifier = EmailNotifier::new(config);

        // 비활성화 상태에서는 네트워크 없이 Ok
        let result = notifier.send_job_failure("monthly_sync", "timeout", &[]).await;
        assert!(result.is_ok());
    }
}
