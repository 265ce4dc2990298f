use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDateTime, NaiveTime, Utc, Weekday};

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Next KRX close (15:30 KST, weekends skipped) in UTC, used as cache expiry.
pub fn next_data_expire_in_korea(now: &DateTime<Utc>) -> NaiveDateTime {
    let (Some(kst), Some(market_close_time)) = (
        FixedOffset::east_opt(KST_OFFSET_SECS),
        NaiveTime::from_hms_opt(15, 30, 0),
    ) else {
        return now.naive_utc() + Duration::days(1);
    };

    let local_now = now.with_timezone(&kst);
    let mut expire_date = if local_now.time() >= market_close_time {
        local_now.date_naive() + Duration::days(1)
    } else {
        local_now.date_naive()
    };
    while matches!(expire_date.weekday(), Weekday::Sat | Weekday::Sun) {
        expire_date += Duration::days(1);
    }

    expire_date.and_time(market_close_time) - Duration::seconds(KST_OFFSET_SECS as i64)
}
