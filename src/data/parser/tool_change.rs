use once_cell::sync::Lazy;
use regex::Regex;

use crate::data::models::{AlarmEntry, ToolChange};

/// 공구 교체 알람의 기본 에러 코드
pub const TOOL_CHANGE_ERROR_CODE: &str = "77334";

/// NCU 메시지에서 공구 번호를 추출하기 위한 정규표현식 (`NR. 321`)
static TOOL_NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"NR\.\s*(\d+)").expect("Invalid tool number regex"));

/// NCU 메시지에서 공구 번호를 추출합니다.
pub fn extract_tool_id(message: &str) -> Option<u32> {
    let caps = TOOL_NUMBER_REGEX.captures(message)?;
    caps.get(1)?.as_str().parse().ok()
}

/// 지정한 에러 코드의 알람에서 공구 교체 이벤트를 추출합니다.
/// 공구 번호가 없는 알람은 버립니다.
pub fn extract_tool_changes(alarms: &[AlarmEntry], error_code: &str) -> Vec<ToolChange> {
    alarms
        .iter()
        .filter(|alarm| alarm.error_code.trim() == error_code)
        .filter_map(|alarm| {
            Some(ToolChange {
                tool_id: extract_tool_id(&alarm.message)?,
                timestamp: alarm.timestamp,
                timestamp_end: Some(alarm.timestamp_end),
            })
        })
        .collect()
}
