//! 금융감독원 전자공시(DART) Open API 클라이언트.
//!
//! 모든 호출 전에 직전 호출과의 최소 간격(기본 150ms)을 강제합니다.
//! 간격 상태는 인스턴스 필드로, 프로세스 전역 변수가 아닙니다 —
//! 테스트에서 클라이언트 여러 개가 서로 간섭하지 않습니다.
//!
//! ## 응답 분류
//!
//! 모든 응답의 status 필드를 타입화된 결과로 변환합니다:
//! - `000`: 성공 (빈 목록도 성공)
//! - `013`, `800`: 조회 데이터 없음 → [`DartError::NoData`]
//! - `020`: 호출 한도 초과 → [`DartError::RateLimited`]
//! - 그 외: [`DartError::Api`]

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use dart_core::{FsDiv, ReportCode};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// 기본 API 엔드포인트
const DEFAULT_BASE_URL: &str = "https://opendart.fss.or.kr/api";

/// 요청 간 기본 딜레이
const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(150);

/// 공시 목록 페이지당 건수
const LIST_PAGE_COUNT: u32 = 100;

/// DART API 에러
#[derive(Debug, Error)]
pub enum DartError {
    #[error("호출 한도 초과 (status 020)")]
    RateLimited,

    #[error("조회 데이터 없음 (status {code})")]
    NoData { code: String },

    #[error("DART API 오류 {code}: {message}")]
    Api { code: String, message: String },

    #[error("HTTP 요청 실패: {0}")]
    Http(#[from] reqwest::Error),

    #[error("응답 파싱 실패: {0}")]
    Parse(String),
}

/// 재무제표 원시 행 (fnlttSinglAcntAll 응답 항목)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFinancialRow {
    /// 재무제표 구분 (CFS/OFS)
    #[serde(default)]
    pub fs_div: Option<String>,
    /// 재무제표 종류 구분 (account_id 폴백)
    #[serde(default)]
    pub sj_div: Option<String>,
    /// 계정 식별자
    #[serde(default)]
    pub account_id: Option<String>,
    /// 계정명
    #[serde(default)]
    pub account_nm: Option<String>,
    /// 당기 금액 (천 단위 콤마 포함 문자열)
    #[serde(default)]
    pub thstrm_amount: Option<String>,
}

/// 공시 목록 원시 행 (list 응답 항목)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisclosureRow {
    #[serde(default)]
    pub corp_code: String,
    #[serde(default)]
    pub corp_name: String,
    #[serde(default)]
    pub report_nm: String,
    #[serde(default)]
    pub rcept_no: String,
    /// 접수일자 (YYYYMMDD)
    #[serde(default)]
    pub rcept_dt: String,
}

/// 공시 목록 한 페이지
#[derive(Debug, Clone)]
pub struct DisclosurePage {
    pub page_no: u32,
    pub total_page: u32,
    pub total_count: u64,
    pub rows: Vec<DisclosureRow>,
}

impl DisclosurePage {
    /// 뒤에 더 가져올 페이지가 있는지
    pub fn has_next(&self) -> bool {
        self.page_no < self.total_page
    }
}

#[derive(Debug, Deserialize)]
struct FinancialResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    list: Option<Vec<RawFinancialRow>>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    page_no: u32,
    #[serde(default)]
    total_page: u32,
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    list: Option<Vec<DisclosureRow>>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    status: String,
    #[serde(default)]
    message: String,
}

/// status 필드를 타입화된 결과로 변환
fn classify_status(status: &str, message: &str) -> Result<(), DartError> {
    match status {
        "000" => Ok(()),
        "013" | "800" => Err(DartError::NoData {
            code: status.to_string(),
        }),
        "020" => Err(DartError::RateLimited),
        _ => Err(DartError::Api {
            code: status.to_string(),
            message: message.to_string(),
        }),
    }
}

/// DART API 연산 (mock 구현 교체용)
#[async_trait]
pub trait DartApi: Send + Sync {
    /// 전체 재무제표 조회 (회사 × 연도 × 보고서 × 구분)
    async fn fetch_financials(
        &self,
        corp_code: &str,
        year: i32,
        report: ReportCode,
        fs_div: FsDiv,
    ) -> Result<Vec<RawFinancialRow>, DartError>;

    /// 기간 내 공시 목록 조회 (페이지 단위)
    async fn list_disclosures(
        &self,
        corp_code: Option<&str>,
        begin: NaiveDate,
        end: NaiveDate,
        page_no: u32,
    ) -> Result<DisclosurePage, DartError>;

    /// 접수번호의 XBRL 원본 번들(ZIP) 조회
    async fn fetch_xbrl_bundle(
        &self,
        rcept_no: &str,
        report: ReportCode,
    ) -> Result<Vec<u8>, DartError>;
}

/// 호출 간격이 제한된 DART API 클라이언트
pub struct DartApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    request_delay: Duration,
    /// 마지막 요청 시각 — 모든 연산이 공유하는 단일 제한
    last_request: Mutex<Option<Instant>>,
}

impl DartApiClient {
    /// 기본 설정으로 생성
    pub fn new(api_key: String) -> Self {
        Self::with_delay(api_key, DEFAULT_REQUEST_DELAY)
    }

    /// 커스텀 딜레이로 생성
    pub fn with_delay(api_key: String, request_delay: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            request_delay,
            last_request: Mutex::new(None),
        }
    }

    /// 엔드포인트 교체 (테스트용)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// 요청 딜레이 반환
    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    /// 직전 호출과의 최소 간격 대기
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.request_delay {
                tokio::time::sleep(self.request_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl DartApi for DartApiClient {
    async fn fetch_financials(
        &self,
        corp_code: &str,
        year: i32,
        report: ReportCode,
        fs_div: FsDiv,
    ) -> Result<Vec<RawFinancialRow>, DartError> {
        self.throttle().await;

        let year_str = year.to_string();
        debug!(
            corp_code = corp_code,
            year = year,
            report = report.as_code(),
            fs_div = fs_div.as_code(),
            "재무제표 조회"
        );

        let response: FinancialResponse = self
            .http
            .get(format!("{}/fnlttSinglAcntAll.json", self.base_url))
            .query(&[
                ("crtfc_key", self.api_key.as_str()),
                ("corp_code", corp_code),
                ("bsns_year", year_str.as_str()),
                ("reprt_code", report.as_code()),
                ("fs_div", fs_div.as_code()),
            ])
            .send()
            .await?
            .json()
            .await?;

        classify_status(&response.status, &response.message)?;
        Ok(response.list.unwrap_or_default())
    }

    async fn list_disclosures(
        &self,
        corp_code: Option<&str>,
        begin: NaiveDate,
        end: NaiveDate,
        page_no: u32,
    ) -> Result<DisclosurePage, DartError> {
        self.throttle().await;

        let begin_str = begin.format("%Y%m%d").to_string();
        let end_str = end.format("%Y%m%d").to_string();
        let page_str = page_no.to_string();
        let count_str = LIST_PAGE_COUNT.to_string();

        debug!(
            begin = %begin_str,
            end = %end_str,
            page_no = page_no,
            "공시 목록 조회"
        );

        let mut request = self
            .http
            .get(format!("{}/list.json", self.base_url))
            .query(&[
                ("crtfc_key", self.api_key.as_str()),
                ("bgn_de", begin_str.as_str()),
                ("end_de", end_str.as_str()),
                ("page_no", page_str.as_str()),
                ("page_count", count_str.as_str()),
            ]);
        if let Some(code) = corp_code {
            request = request.query(&[("corp_code", code)]);
        }

        let response: ListResponse = request.send().await?.json().await?;

        classify_status(&response.status, &response.message)?;
        Ok(DisclosurePage {
            page_no: response.page_no.max(page_no),
            total_page: response.total_page,
            total_count: response.total_count,
            rows: response.list.unwrap_or_default(),
        })
    }

    async fn fetch_xbrl_bundle(
        &self,
        rcept_no: &str,
        report: ReportCode,
    ) -> Result<Vec<u8>, DartError> {
        self.throttle().await;

        debug!(rcept_no = rcept_no, report = report.as_code(), "XBRL 번들 조회");

        let bytes = self
            .http
            .get(format!("{}/fnlttXbrl.xml", self.base_url))
            .query(&[
                ("crtfc_key", self.api_key.as_str()),
                ("rcept_no", rcept_no),
                ("reprt_code", report.as_code()),
            ])
            .send()
            .await?
            .bytes()
            .await?;

        // 성공 시 ZIP 바이트, 실패 시 JSON 에러 envelope
        if bytes.starts_with(b"PK") {
            return Ok(bytes.to_vec());
        }

        match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
            Ok(envelope) => {
                classify_status(&envelope.status, &envelope.message)?;
                Err(DartError::Parse(
                    "성공 응답이지만 ZIP 형식이 아님".to_string(),
                ))
            }
            Err(_) => Err(DartError::Parse(format!(
                "알 수 없는 XBRL 응답 ({} bytes)",
                bytes.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(server: &mockito::ServerGuard) -> DartApiClient {
        DartApiClient::with_delay("test-key".to_string(), Duration::from_millis(0))
            .with_base_url(server.url())
    }

    #[tokio::test]
    async fn test_fetch_financials_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/fnlttSinglAcntAll.json")
            .match_query(mockito::Matcher::UrlEncoded(
                "reprt_code".into(),
                "11011".into(),
            ))
            .with_status(200)
            .with_body(
                r#"{
                    "status": "000",
                    "message": "정상",
                    "list": [
                        {"fs_div": "CFS", "account_id": "ifrs-full_Revenue",
                         "account_nm": "매출액", "thstrm_amount": "1,234,567"},
                        {"fs_div": "CFS", "account_id": "ifrs-full_ProfitLoss",
                         "account_nm": "당기순이익", "thstrm_amount": "-45,000"}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let client = test_client(&server);
        let rows = client
            .fetch_financials("00126380", 2024, ReportCode::Annual, FsDiv::Cfs)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account_nm.as_deref(), Some("매출액"));
        assert_eq!(rows[1].thstrm_amount.as_deref(), Some("-45,000"));
    }

    #[tokio::test]
    async fn test_fetch_financials_no_data() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/fnlttSinglAcntAll.json")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "013", "message": "조회된 데이타가 없습니다."}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client
            .fetch_financials("00100002", 2024, ReportCode::Annual, FsDiv::Cfs)
            .await;

        assert!(matches!(result, Err(DartError::NoData { code }) if code == "013"));
    }

    #[tokio::test]
    async fn test_fetch_financials_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/fnlttSinglAcntAll.json")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "020", "message": "조회 가능한 회수를 초과하였습니다."}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client
            .fetch_financials("00126380", 2024, ReportCode::Q1, FsDiv::Cfs)
            .await;

        assert!(matches!(result, Err(DartError::RateLimited)));
    }

    #[tokio::test]
    async fn test_fetch_financials_other_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/fnlttSinglAcntAll.json")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "011", "message": "사용할 수 없는 키입니다."}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let result = client
            .fetch_financials("00126380", 2024, ReportCode::Q1, FsDiv::Cfs)
            .await;

        assert!(matches!(result, Err(DartError::Api { code, .. }) if code == "011"));
    }

    #[tokio::test]
    async fn test_list_disclosures_pagination_fields() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/list.json")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "status": "000",
                    "message": "정상",
                    "page_no": 1,
                    "total_page": 3,
                    "total_count": 250,
                    "list": [
                        {"corp_code": "00126380", "corp_name": "삼성전자",
                         "report_nm": "주요사항보고서", "rcept_no": "20240801000123",
                         "rcept_dt": "20240801"}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let client = test_client(&server);
        let page = client
            .list_disclosures(
                None,
                NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
                1,
            )
            .await
            .unwrap();

        assert_eq!(page.page_no, 1);
        assert_eq!(page.total_page, 3);
        assert!(page.has_next());
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].rcept_no, "20240801000123");
    }

    #[tokio::test]
    async fn test_xbrl_bundle_zip_and_error() {
        let mut server = mockito::Server::new_async().await;
        let _zip = server
            .mock("GET", "/fnlttXbrl.xml")
            .match_query(mockito::Matcher::UrlEncoded(
                "rcept_no".into(),
                "20240801000123".into(),
            ))
            .with_status(200)
            .with_body(b"PK\x03\x04fake-zip-payload".to_vec())
            .create_async()
            .await;
        let _err = server
            .mock("GET", "/fnlttXbrl.xml")
            .match_query(mockito::Matcher::UrlEncoded(
                "rcept_no".into(),
                "00000000000000".into(),
            ))
            .with_status(200)
            .with_body(r#"{"status": "800", "message": "조회된 데이타가 없습니다."}"#)
            .create_async()
            .await;

        let client = test_client(&server);

        let bundle = client
            .fetch_xbrl_bundle("20240801000123", ReportCode::Annual)
            .await
            .unwrap();
        assert!(bundle.starts_with(b"PK"));

        let missing = client
            .fetch_xbrl_bundle("00000000000000", ReportCode::Annual)
            .await;
        assert!(matches!(missing, Err(DartError::NoData { code }) if code == "800"));
    }

    #[tokio::test]
    async fn test_throttle_enforces_delay_across_operations() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/fnlttSinglAcntAll.json")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "000", "message": "정상", "list": []}"#)
            .expect(2)
            .create_async()
            .await;

        let client = DartApiClient::with_delay("test-key".to_string(), Duration::from_millis(80))
            .with_base_url(server.url());

        let started = Instant::now();
        for _ in 0..2 {
            client
                .fetch_financials("00126380", 2024, ReportCode::Q1, FsDiv::Cfs)
                .await
                .unwrap();
        }

        // 두 번째 호출은 최소 간격만큼 기다려야 함
        assert!(started.elapsed() >= Duration::from_millis(80));
    }
}
