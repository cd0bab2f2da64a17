use color_eyre::eyre::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::data::models::AxisAdjustment;
use crate::data::utils;

/// `9.470->9.480` 형태의 축 설정 변경
static SETTING_CHANGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^>]*?)\s*->\s*(.*?)\s*$").expect("Invalid setting regex"));

/// 축 보정 파싱 결과
#[derive(Debug, Default)]
pub struct AxisLogParse {
    pub adjustments: Vec<AxisAdjustment>,
    /// 타임스탬프나 보정값을 읽지 못해 버린 행 수
    pub skipped: usize,
}

/// 소수점으로 쉼표를 쓰는 값도 허용합니다.
fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse().ok()
}

fn split_setting(raw: &str) -> (Option<f64>, Option<f64>) {
    match SETTING_CHANGE_REGEX.captures(raw) {
        Some(caps) => (
            caps.get(1).and_then(|m| parse_decimal(m.as_str())),
            caps.get(2).and_then(|m| parse_decimal(m.as_str())),
        ),
        None => (parse_decimal(raw), None),
    }
}

/// 축 보정 로그를 파싱합니다.
/// 형식 (헤더 없음, `;` 구분): `Timestamp;TD_Info;Verstellung;Achseneinstellung;Verschleißtext`
pub fn parse_axis_log<R: Read>(reader: R) -> Result<AxisLogParse> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut result = AxisLogParse::default();

    for (i, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Failed to read axis log line {}", i + 1))?;
        // 장비 로그는 Latin-1 인 경우가 있으므로 손실 허용 변환
        let field = |idx: usize| -> String {
            record
                .get(idx)
                .map(|raw| String::from_utf8_lossy(raw).trim().to_string())
                .unwrap_or_default()
        };

        let Some(timestamp) = utils::parse_timestamp_opt(&field(0)) else {
            result.skipped += 1;
            continue;
        };
        let Some(adjustment) = parse_decimal(&field(2)) else {
            result.skipped += 1;
            continue;
        };

        let td: String = field(1).chars().filter(|c| c.is_ascii_digit()).collect();
        let (original_setting, new_setting) = split_setting(&field(3));
        let axis = field(4)
            .split(' ')
            .next_back()
            .unwrap_or_default()
            .to_string();

        result.adjustments.push(AxisAdjustment {
            timestamp,
            td,
            adjustment,
            original_setting,
            new_setting,
            axis,
        });
    }

    Ok(result)
}

pub fn load_axis_log<P: AsRef<Path>>(path: P) -> Result<AxisLogParse> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open axis log: {:?}", path))?;
    parse_axis_log(file).with_context(|| format!("Failed to parse axis log: {:?}", path))
}
