use color_eyre::eyre::{eyre, Result};

use crate::align::Matched;
use crate::config::{AlignConfig, DeviationGroup};
use crate::data::table::{self, Table};
use crate::data::utils;

/// 매칭된 측정 CSV 의 생산 시각 컬럼
pub const PRODUCTION_TIME_COLUMN: &str = "Timestamp Prod";

/// 그룹별 편차 튜플 컬럼 이름 (`T321_Tupel`)
pub fn tuple_column(group: &DeviationGroup) -> String {
    format!("{}_Tupel", group.name)
}

/// 소수 셋째 자리에서 반올림
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// 편차 값을 `(0.012, -0.3, nan)` 형태의 문자열로 만듭니다.
/// 원소가 하나뿐이면 `(0.1,)` 처럼 끝에 쉼표를 붙입니다.
pub fn format_tuple(values: &[f64]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| {
            if v.is_nan() {
                "nan".to_string()
            } else {
                format!("{:?}", v)
            }
        })
        .collect();

    match items.as_slice() {
        [single] => format!("({},)", single),
        _ => format!("({})", items.join(", ")),
    }
}

/// 측정 행마다 그룹별 편차 튜플을 계산합니다.
///
/// 편차는 `round(값 - (하한 + 상한) / 2, 3)` 이며, 값이 비어 있으면 `nan` 입니다.
/// payload 는 그룹 순서대로의 튜플 문자열이고 reference 는 `Timestamp Prod` 입니다.
pub fn deviation_tuples(table: &Table, config: &AlignConfig) -> Result<Vec<Matched<Vec<String>>>> {
    let time_col = table.require_column(PRODUCTION_TIME_COLUMN)?;

    // (컬럼 index, 보정 범위의 중앙값)
    let groups: Vec<Vec<(usize, f64)>> = config
        .deviation_groups
        .iter()
        .map(|group| {
            group
                .columns
                .iter()
                .map(|column| -> Result<(usize, f64)> {
                    let idx = table.require_column(column)?;
                    let limit = config
                        .limit_for_column(column)
                        .ok_or_else(|| eyre!("No tool limit configured for column '{}'", column))?;
                    Ok((idx, limit.mean()))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<_>>()?;

    Ok(table
        .rows
        .iter()
        .map(|row| {
            let tuples = groups
                .iter()
                .map(|columns| {
                    let deviations: Vec<f64> = columns
                        .iter()
                        .map(|&(idx, mean)| {
                            table::numeric(row, idx).map_or(f64::NAN, |v| round3(v - mean))
                        })
                        .collect();
                    format_tuple(&deviations)
                })
                .collect();
            let reference = utils::parse_timestamp_opt(table::cell(row, time_col));
            Matched::new(tuples, reference)
        })
        .collect())
}
