//! 원시 API/CSV 값을 정규화하는 순수 변환 함수.
//!
//! 모든 함수는 파싱 실패 시 None을 반환하며 절대 panic 하지 않습니다.
//! 실패를 치명적으로 다룰지는 호출자가 결정합니다.

use chrono::NaiveDate;

/// 천 단위 구분자가 포함된 금액 문자열을 정수로 변환.
///
/// 빈 문자열과 "-" 플레이스홀더는 None (금액 미보고).
///
/// # 예시
/// - "1,234,567" → Some(1234567)
/// - "-45,000" → Some(-45000)
/// - "-" / "" / "abc" → None
pub fn parse_amount(value: &str) -> Option<i64> {
    let text = value.trim();
    if text.is_empty() || text == "-" {
        return None;
    }
    text.replace(',', "").parse::<i64>().ok()
}

/// DART 날짜 형식 (YYYYMMDD) 파싱.
pub fn parse_date8(value: &str) -> Option<NaiveDate> {
    let text = value.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y%m%d").ok()
}

/// CSV에서 흔한 두 날짜 형식 (YYYY-MM-DD, YYYYMMDD) 파싱.
pub fn parse_date_flexible(value: &str) -> Option<NaiveDate> {
    let text = value.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y%m%d"))
        .ok()
}

/// 선행 0을 보존하며 숫자 코드를 정규화.
///
/// 스프레드시트 내보내기에서 생기는 ".0" 접미사와 천 단위 콤마를
/// 제거하고, 숫자만으로 구성되면 `width` 자리까지 0으로 채웁니다.
///
/// # 예시
/// - ("5930", 6) → Some("005930")
/// - ("00126380.0", 8) → Some("00126380")
/// - ("", 8) → None
pub fn normalize_code(value: &str, width: usize) -> Option<String> {
    let mut text = value.trim().to_string();
    if text.is_empty() {
        return None;
    }

    if let Some(stripped) = text.strip_suffix(".0") {
        if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
            text = stripped.to_string();
        }
    }

    text = text.replace(',', "");

    if text.chars().all(|c| c.is_ascii_digit()) && text.len() < width {
        text = format!("{:0>width$}", text, width = width);
    }

    Some(text)
}

/// CSV의 다양한 불리언 표기 파싱.
///
/// 인식 못하는 값은 default를 반환합니다.
pub fn parse_bool_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" => true,
        "0" | "false" | "f" | "no" | "n" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// 천 단위 콤마 포맷 (테스트 보조)
    fn format_with_commas(n: i64) -> String {
        let negative = n < 0;
        let digits = n.unsigned_abs().to_string();
        let mut grouped = String::new();
        for (i, c) in digits.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        let body: String = grouped.chars().rev().collect();
        if negative {
            format!("-{}", body)
        } else {
            body
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234,567"), Some(1_234_567));
        assert_eq!(parse_amount("-45,000"), Some(-45_000));
        assert_eq!(parse_amount(" 0 "), Some(0));
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("N/A"), None);
        assert_eq!(parse_amount("1.5"), None);
    }

    #[test]
    fn test_parse_date8() {
        assert_eq!(
            parse_date8("20240315"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(parse_date8(""), None);
        assert_eq!(parse_date8("2024-03-15"), None);
        assert_eq!(parse_date8("20241345"), None);
    }

    #[test]
    fn test_parse_date_flexible() {
        let expected = NaiveDate::from_ymd_opt(2021, 7, 1);
        assert_eq!(parse_date_flexible("2021-07-01"), expected);
        assert_eq!(parse_date_flexible("20210701"), expected);
        assert_eq!(parse_date_flexible("  "), None);
        assert_eq!(parse_date_flexible("07/01/2021"), None);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("5930", 6), Some("005930".to_string()));
        assert_eq!(
            normalize_code("00126380.0", 8),
            Some("00126380".to_string())
        );
        assert_eq!(normalize_code(" 1,001 ", 6), Some("001001".to_string()));
        assert_eq!(normalize_code("", 8), None);
        // 숫자가 아니면 패딩 없이 그대로
        assert_eq!(normalize_code("A1234", 6), Some("A1234".to_string()));
    }

    #[test]
    fn test_parse_bool_flag() {
        assert!(parse_bool_flag("1", false));
        assert!(parse_bool_flag("Yes", false));
        assert!(parse_bool_flag(" TRUE ", false));
        assert!(!parse_bool_flag("0", true));
        assert!(!parse_bool_flag("n", true));
        assert!(parse_bool_flag("", true));
        assert!(!parse_bool_flag("maybe", false));
    }

    proptest! {
        /// 콤마 포맷 → 파싱 왕복이 항등
        #[test]
        fn prop_amount_round_trip(n in i64::MIN / 2..i64::MAX / 2) {
            let formatted = format_with_commas(n);
            prop_assert_eq!(parse_amount(&formatted), Some(n));
        }

        /// 임의 입력에서도 panic 없음
        #[test]
        fn prop_amount_never_panics(s in ".*") {
            let _ = parse_amount(&s);
        }
    }
}
