use chrono::NaiveDateTime;
use color_eyre::eyre::Result;
use std::path::PathBuf;

use crate::align;
use crate::command::{self, TimeRange};
use crate::config::AlignConfig;
use crate::data::loader;
use crate::data::models::{AxisAdjustment, RelativeAdjustment, ToolChange};
use crate::utils::Logger;

/// 공구 교체 기준 축 보정 시점 변환 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct RelativeAdjustmentsOpt {
    /// 공구 교체 CSV (`ToolID`, `Timestamp`)
    #[structopt(long, parse(from_os_str))]
    pub tool_changes: PathBuf,

    /// 생산 시각 CSV
    #[structopt(long, parse(from_os_str))]
    pub production: PathBuf,

    /// 축 보정 CSV (`Timestamp`, `Verstellung`, ...)
    #[structopt(long, parse(from_os_str))]
    pub adjustments: PathBuf,

    /// 구간 경계로 사용할 공구 번호
    #[structopt(long, default_value = "321")]
    pub tool_id: u32,

    /// 이 축의 보정만 사용 (예: "X")
    #[structopt(long)]
    pub axis: Option<String>,

    /// 이 TD 의 보정만 사용 (예: "3211")
    #[structopt(long)]
    pub td: Option<String>,

    #[structopt(long, parse(from_os_str), default_value = "X_Adjustments_Relative.csv")]
    pub output: PathBuf,
}

/// 축 보정 기록을 직전 공구 교체 이후의 경과 시간으로 변환합니다.
pub fn run_relative_adjustments(
    opts: &RelativeAdjustmentsOpt,
    config: &AlignConfig,
    logger: &Logger,
) -> Result<()> {
    let changes: Vec<ToolChange> = loader::load_records(&opts.tool_changes)?;
    let mut boundaries: Vec<NaiveDateTime> = changes
        .iter()
        .filter(|change| change.tool_id == opts.tool_id)
        .map(|change| change.timestamp)
        .collect();
    boundaries.sort();
    logger.log(format!("공구 {} 교체 {}건", opts.tool_id, boundaries.len()));

    let production = command::load_production(&opts.production, &TimeRange::default(), logger)?;

    let adjustments: Vec<AxisAdjustment> = loader::load_records(&opts.adjustments)?;
    let mut auxiliary: Vec<(NaiveDateTime, f64)> = adjustments
        .iter()
        .filter(|a| opts.axis.as_ref().is_none_or(|axis| a.axis == *axis))
        .filter(|a| opts.td.as_ref().is_none_or(|td| a.td == *td))
        .map(|a| (a.timestamp, a.adjustment))
        .collect();
    auxiliary.sort_by_key(|(ts, _)| *ts);
    logger.log(format!("축 보정 {}건", auxiliary.len()));

    let points = align::project_relative(
        &boundaries,
        &production,
        &auxiliary,
        &config.segments,
        logger,
    );

    let records: Vec<RelativeAdjustment> = points
        .iter()
        .map(|point| RelativeAdjustment {
            relative_hours: point.relative_hours(),
            adjustment: point.value,
        })
        .collect();

    loader::write_records(&records, &opts.output)?;
    logger.log(format!("데이터 포인트 {}개 저장: {:?}", records.len(), opts.output));

    Ok(())
}
