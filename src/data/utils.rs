use chrono::{DateTime, NaiveDateTime};
use color_eyre::eyre::{eyre, Result};

/// CSV 출력에 사용하는 타임스탬프 형식 (소수 초는 있을 때만 출력)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// 장비 로그 원본에서 사용하는 독일식 날짜 형식
pub const PLANT_LOG_FORMAT: &str = "%d.%m.%y %H:%M:%S%.f";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    PLANT_LOG_FORMAT,
];

/// 타임스탬프 문자열을 timezone-naive 시간으로 파싱합니다.
/// 예: "2025-03-23 20:20:00", "2025-03-23T20:20:00.125", "23.03.25 20:20:00.125"
/// 오프셋이 붙은 RFC 3339 문자열은 로컬 벽시계 시간만 남깁니다.
pub fn parse_timestamp(time_str: &str) -> Result<NaiveDateTime> {
    let time_str = time_str.trim();

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(time_str, format) {
            return Ok(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(time_str) {
        return Ok(dt.naive_local());
    }

    // 날짜만 있는 경우 자정으로 간주
    if let Ok(date) = chrono::NaiveDate::parse_from_str(time_str, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    Err(eyre!("Failed to parse time string: {}", time_str))
}

/// 잘못된 값은 에러 대신 None 으로 바꿉니다.
pub fn parse_timestamp_opt(time_str: &str) -> Option<NaiveDateTime> {
    parse_timestamp(time_str).ok()
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// 정렬 여부 확인 (같은 값은 허용)
pub fn is_ascending<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

/// serde 용 타임스탬프 (de)serializer
pub mod naive_ts {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(|e| de::Error::custom(e.to_string()))
    }

    /// 비어 있거나 파싱할 수 없는 값은 None
    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_str(&super::super::format_timestamp(ts)),
                None => serializer.serialize_str(""),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            Ok(raw.and_then(|s| super::super::parse_timestamp_opt(&s)))
        }
    }
}
