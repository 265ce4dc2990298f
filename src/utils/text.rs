/// Listed Korean equities use six digit codes, e.g. 005930.
pub const KRX_CODE_LEN: usize = 6;

const KOREAN_MARKETS: &[&str] = &["KRX", "KOSPI", "KOSDAQ", "KONEX"];

pub fn is_ascii_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_korean_market(market: &str) -> bool {
    KOREAN_MARKETS
        .iter()
        .any(|m| m.eq_ignore_ascii_case(market.trim()))
}

/// Trims the code. For Korean markets it also restores the leading zeros that
/// spreadsheet exports drop; other markets keep the code as listed.
pub fn normalize_code(text: &str, market: &str) -> String {
    let text = text.trim();
    if is_korean_market(market) && is_ascii_digits(text) && text.len() < KRX_CODE_LEN {
        format!("{text:0>width$}", width = KRX_CODE_LEN)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ascii_digits() {
        assert!(is_ascii_digits("005930"));
        assert!(!is_ascii_digits(""));
        assert!(!is_ascii_digits("삼성전자"));
        assert!(!is_ascii_digits("005930.KS"));
    }

    #[test]
    fn test_is_korean_market() {
        assert!(is_korean_market("KRX"));
        assert!(is_korean_market("kosdaq"));
        assert!(!is_korean_market("HKEX"));
        assert!(!is_korean_market("TSE"));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("5930", "KRX"), "005930");
        assert_eq!(normalize_code(" 005930 ", "KOSPI"), "005930");
        assert_eq!(normalize_code("0126Z0", "KRX"), "0126Z0");
    }

    #[test]
    fn test_normalize_code_other_markets() {
        assert_eq!(normalize_code("7203", "TSE"), "7203");
        assert_eq!(normalize_code("00700", "HKEX"), "00700");
        assert_eq!(normalize_code(" AAPL ", "NASDAQ"), "AAPL");
    }
}
