use chrono::NaiveDateTime;
use color_eyre::eyre::Result;
use std::path::PathBuf;

use crate::align::{self, AsofDirection};
use crate::command::{self, TimeRange};
use crate::config::AlignConfig;
use crate::data::deviation::{self, PRODUCTION_TIME_COLUMN};
use crate::data::loader;
use crate::data::models::{AxisAdjustment, EnergySample};
use crate::data::table::Table;
use crate::data::utils;
use crate::utils::Logger;

/// 학습 데이터 생성 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct PreTrainingOpt {
    /// `match-production` 결과 CSV (`Timestamp Prod` 포함)
    #[structopt(long, parse(from_os_str))]
    pub measurements: PathBuf,

    #[structopt(long, parse(from_os_str))]
    pub production: PathBuf,

    /// 전력 측정 CSV (`Timestamp`, `Power (W)`, `Current (A)`, `Voltage (V)`)
    #[structopt(long, parse(from_os_str))]
    pub energy: PathBuf,

    /// 축 보정 CSV
    #[structopt(long, parse(from_os_str))]
    pub axis: PathBuf,

    /// 사용할 축 보정의 TD
    #[structopt(long, default_value = "3211")]
    pub td: String,

    /// 사용할 축 보정의 축 이름
    #[structopt(long, default_value = "X")]
    pub axis_name: String,

    /// 측정 CSV 의 시간 컬럼 (기간 필터에 사용)
    #[structopt(long, default_value = "Timestamp")]
    pub time_column: String,

    #[structopt(long, default_value = "Measurement ToolID.200")]
    pub reference_column: String,

    /// 그룹별 CSV (`T321.csv`, `T521.csv`) 를 저장할 폴더
    #[structopt(long, parse(from_os_str), default_value = ".")]
    pub output_dir: PathBuf,

    #[structopt(flatten)]
    pub range: TimeRange,
}

const ENERGY_COLUMNS: [&str; 3] = ["Power (W)", "Current (A)", "Voltage (V)"];
const AXIS_SETTING_COLUMN: &str = "Neue Achseneinstellung";

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// 편차 튜플 → 생산 시각 확장 → 전력 (가장 가까운 값) → 축 설정 (직전 값) 순서로 결합하고
/// 공구 그룹마다 CSV 를 하나씩 저장합니다.
pub fn run_pre_training(
    opts: &PreTrainingOpt,
    config: &AlignConfig,
    logger: &Logger,
) -> Result<()> {
    logger.log("데이터 로드 중...");
    let mut measurements = loader::load_table(&opts.measurements)?;
    if opts.range.start.is_some() || opts.range.end.is_some() {
        command::retain_rows_in_range(&mut measurements, &opts.time_column, &opts.range, logger)?;
    }
    command::drop_unmeasured_rows(&mut measurements, &opts.reference_column, logger)?;

    let production = command::load_production(&opts.production, &opts.range, logger)?;

    let mut energy: Vec<EnergySample> = loader::load_records(&opts.energy)?;
    energy.retain(|sample| opts.range.contains(sample.timestamp));
    energy.sort_by_key(|sample| sample.timestamp);

    let mut axis: Vec<AxisAdjustment> = loader::load_records(&opts.axis)?;
    axis.retain(|a| a.td == opts.td && a.axis == opts.axis_name);
    axis.sort_by_key(|a| a.timestamp);

    logger.log(format!(
        "측정 {}건, 생산 {}건, 전력 {}건, 축 보정 {}건",
        measurements.len(),
        production.len(),
        energy.len(),
        axis.len()
    ));

    logger.log("편차 튜플 계산 중...");
    let tuples = deviation::deviation_tuples(&measurements, config)?;

    logger.log("생산 시각으로 확장 중...");
    let mut expanded = align::expand_neighbors(&tuples, &production, config.expand.window()?);
    expanded.sort_by_key(|row| row.reference);

    let keys: Vec<NaiveDateTime> = expanded.iter().filter_map(|row| row.reference).collect();

    logger.log("전력 데이터 결합 중...");
    let energy_keys: Vec<NaiveDateTime> = energy.iter().map(|s| s.timestamp).collect();
    let energy_idx = align::merge_asof(&keys, &energy_keys, AsofDirection::Nearest);

    logger.log("축 데이터 결합 중...");
    let axis_keys: Vec<NaiveDateTime> = axis.iter().map(|a| a.timestamp).collect();
    let axis_idx = align::merge_asof(&keys, &axis_keys, AsofDirection::Backward);

    for (group_idx, group) in config.deviation_groups.iter().enumerate() {
        let mut headers = vec![deviation::tuple_column(group), PRODUCTION_TIME_COLUMN.to_string()];
        headers.extend(ENERGY_COLUMNS.iter().map(|c| c.to_string()));
        headers.push(AXIS_SETTING_COLUMN.to_string());

        let mut table = Table::new(headers);
        for (i, (row, ts)) in expanded.iter().zip(&keys).enumerate() {
            let sample = energy_idx[i].map(|idx| &energy[idx]);
            let setting = axis_idx[i].and_then(|idx| axis[idx].new_setting);

            table.rows.push(vec![
                row.payload[group_idx].clone(),
                utils::format_timestamp(ts),
                format_value(sample.and_then(|s| s.power)),
                format_value(sample.and_then(|s| s.current)),
                format_value(sample.and_then(|s| s.voltage)),
                format_value(setting),
            ]);
        }

        let path = opts.output_dir.join(format!("{}.csv", group.name));
        loader::write_table(&table, &path)?;
        logger.log(format!("{} 저장 완료: {:?} ({}행)", group.name, path, table.len()));
    }

    Ok(())
}
