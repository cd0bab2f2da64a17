use color_eyre::eyre::{Context, Result};
use std::fs;
use std::path::Path;

use crate::data::models::AlarmEntry;
use crate::data::utils;

/// NCU 알람 행을 표시하는 문자열
const NCU_MARKER: &str = "NCU_";
/// 날짜가 비어 있는 알람 (아직 종료되지 않은 알람 등)
const EMPTY_DATE: &str = "---";

/// 고정 폭 컬럼 (문자 단위)
const DATE_START: (usize, usize) = (7, 16);
const DATE_END: (usize, usize) = (23, 32);
const ERROR_CODE: (usize, usize) = (39, 45);
const MESSAGE_FROM: usize = 52;

/// 문자 단위로 부분 문자열을 잘라냅니다. 범위를 벗어나면 있는 만큼만 반환합니다.
fn char_slice(line: &str, from: usize, to: Option<usize>) -> String {
    let chars = line.chars().skip(from);
    let sliced: String = match to {
        Some(to) => chars.take(to.saturating_sub(from)).collect(),
        None => chars.collect(),
    };
    sliced.trim().to_string()
}

/// 알람 로그 텍스트를 파싱합니다.
///
/// `NCU_` 가 포함된 줄에서 날짜, 에러 코드, 메시지를 읽고
/// 바로 다음 줄에서 시작/종료 시간을 읽습니다.
/// 날짜가 `---` 이거나 타임스탬프를 만들 수 없는 항목은 버립니다.
pub fn parse_alarm_log(content: &str) -> Vec<AlarmEntry> {
    let lines: Vec<&str> = content.lines().collect();

    lines
        .windows(2)
        .filter(|pair| pair[0].contains(NCU_MARKER))
        .filter_map(|pair| {
            let line = pair[0];
            let date_start = char_slice(line, DATE_START.0, Some(DATE_START.1));
            let date_end = char_slice(line, DATE_END.0, Some(DATE_END.1));
            if date_start == EMPTY_DATE || date_end == EMPTY_DATE {
                return None;
            }

            let error_code = char_slice(line, ERROR_CODE.0, Some(ERROR_CODE.1));
            let message = char_slice(line, MESSAGE_FROM, None);

            let mut times = pair[1].split_whitespace();
            let time_start = times.next()?;
            let time_end = times.next()?;

            let timestamp = utils::parse_timestamp_opt(&format!("{} {}", date_start, time_start))?;
            let timestamp_end = utils::parse_timestamp_opt(&format!("{} {}", date_end, time_end))?;

            Some(AlarmEntry {
                error_code,
                message,
                timestamp,
                timestamp_end,
            })
        })
        .collect()
}

/// 알람 로그 파일을 로드합니다. (UTF-8 이 아닌 문자는 대체 문자로 읽습니다)
pub fn load_alarm_log<P: AsRef<Path>>(path: P) -> Result<Vec<AlarmEntry>> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("Failed to read alarm log: {:?}", path))?;
    Ok(parse_alarm_log(&String::from_utf8_lossy(&bytes)))
}
