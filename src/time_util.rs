use chrono::{NaiveTime, TimeZone, Timelike, Utc};

pub fn mill_time_to_datetime(timestamp_ms: i64) -> Result<String, String> {
    // 将毫秒级时间戳转换为 DateTime<Utc>
    match Utc.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(datetime) => {
            let formatted_datetime = datetime.format("%Y-%m-%d %H:%M:%S").to_string();
            Ok(formatted_datetime)
        }
        chrono::LocalResult::None => Err("Invalid timestamp: None".to_string()),
        chrono::LocalResult::Ambiguous(_, _) => Err("Invalid timestamp: Ambiguous".to_string()),
    }
}

pub fn now_timestamp_mills() -> i64 {
    Utc::now().timestamp_millis()
}

/// 当前UTC时间是否在交易时段内（闭区间，不支持跨午夜的时段）
pub fn in_session_window(now: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    start <= now && now <= end
}

/// 当前UTC日期串，用于每日重置判断
pub fn utc_date_string() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// 当前UTC时间（时分秒）
pub fn utc_time_of_day() -> NaiveTime {
    let now = Utc::now();
    NaiveTime::from_hms_opt(now.hour(), now.minute(), now.second())
        .unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_window_bounds() {
        let start = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(22, 0, 0).unwrap();

        // 边界时间应包含在时段内
        assert!(in_session_window(start, start, end));
        assert!(in_session_window(end, start, end));
        assert!(in_session_window(
            NaiveTime::from_hms_opt(13, 30, 0).unwrap(),
            start,
            end
        ));
        assert!(!in_session_window(
            NaiveTime::from_hms_opt(7, 59, 59).unwrap(),
            start,
            end
        ));
        assert!(!in_session_window(
            NaiveTime::from_hms_opt(22, 0, 1).unwrap(),
            start,
            end
        ));
    }

    #[test]
    fn test_mill_time_to_datetime() {
        let s = mill_time_to_datetime(1718339551210).unwrap();
        assert_eq!(s, "2024-06-14 04:32:31");
    }
}
