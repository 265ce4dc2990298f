use chrono::{DateTime, NaiveDate};

use crate::error::{TlError, TlResult};

pub fn date_from_str(s: &str) -> TlResult<NaiveDate> {
    const FORMATS: &[&str] = &[
        "%Y%m%d",
        "%Y-%m-%d",
        "%Y.%m.%d",
        "%Y-%m-%dT%H:%M:%S%.f", // ISO 8601 Extended
        "%Y-%m-%d %H:%M:%S",
    ];

    let s = s.trim();
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date);
        }
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
        return Ok(datetime.date_naive());
    }

    Err(TlError::Invalid {
        code: "INVALID_DATE",
        message: format!("Unable to parse date '{s}'"),
    })
}

pub fn date_to_str(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_from_str() {
        for s in [
            "20240102",
            "2024-01-02",
            "2024.01.02",
            "2024-01-02T09:00:00",
            "2024-01-02 15:30:00",
            "2024-01-02T09:00:00+09:00",
        ] {
            assert_eq!(date_to_str(&date_from_str(s).unwrap()), "2024-01-02");
        }

        assert!(date_from_str("02/01/2024").is_err());
    }
}
