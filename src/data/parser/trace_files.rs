use chrono::{Duration as ChronoDuration, NaiveDateTime};
use color_eyre::eyre::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

use crate::align;

/// 생산 주기마다 기록되는 온도 트레이스 파일 이름 접두사
pub const TRACE_FILE_PREFIX: &str = "GEMVM_Export_Trace_S1_";

/// 이 간격 (초) 이하로 이어지는 트레이스 파일은 하나의 생산 시각으로 묶습니다.
pub const TRACE_GROUP_SECS: i64 = 3;

/// 파일 이름 끝의 `2025-03-20_06-00-01.csv`
static TRACE_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2})\.csv$")
        .expect("Invalid trace file regex")
});

/// 폴더 하나를 읽은 결과
#[derive(Debug, Default)]
pub struct TraceScan {
    /// 생산 시각 (오름차순)
    pub ticks: Vec<NaiveDateTime>,
    /// 시각을 읽은 트레이스 파일 수
    pub files: usize,
    /// 접두사는 맞지만 이름에서 시각을 읽지 못한 파일
    pub skipped: Vec<String>,
}

/// 트레이스 파일 여부. `E.csv` 로 끝나는 파일은 같은 주기의 부가 파일이라 제외합니다.
pub fn is_trace_file(name: &str) -> bool {
    name.starts_with(TRACE_FILE_PREFIX) && name.ends_with(".csv") && !name.ends_with("E.csv")
}

/// 파일 이름에서 시각을 읽습니다. (`..._2025-03-20_06-00-01.csv`)
pub fn trace_timestamp(name: &str) -> Option<NaiveDateTime> {
    let caps = TRACE_TIMESTAMP_REGEX.captures(name)?;
    NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%d_%H-%M-%S").ok()
}

/// 오름차순 시각을 묶어 각 묶음의 첫 시각만 남깁니다.
/// 직전 파일과의 간격이 `max_gap` 을 넘을 때만 새 묶음이 시작됩니다.
pub fn group_ticks(sorted: &[NaiveDateTime], max_gap: ChronoDuration) -> Vec<NaiveDateTime> {
    let Some(first) = sorted.first() else {
        return Vec::new();
    };

    std::iter::once(*first)
        .chain(align::detect_gaps(sorted, max_gap).into_iter().map(|gap| gap.end))
        .collect()
}

/// 폴더의 트레이스 파일 이름에서 생산 시각을 추출합니다. 파일 내용은 읽지 않습니다.
pub fn scan_trace_folder<P: AsRef<Path>>(folder: P) -> Result<TraceScan> {
    let folder = folder.as_ref();
    let entries = fs::read_dir(folder)
        .with_context(|| format!("Failed to read trace folder: {:?}", folder))?;

    let mut scan = TraceScan::default();
    let mut timestamps = Vec::new();

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {:?}", folder))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_trace_file(&name) {
            continue;
        }
        match trace_timestamp(&name) {
            Some(ts) => timestamps.push(ts),
            None => scan.skipped.push(name),
        }
    }

    timestamps.sort();
    scan.files = timestamps.len();
    scan.ticks = group_ticks(&timestamps, ChronoDuration::seconds(TRACE_GROUP_SECS));
    Ok(scan)
}
