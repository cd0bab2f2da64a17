use chrono::NaiveDateTime;
use color_eyre::eyre::Result;
use std::path::Path;
use structopt::StructOpt;

use crate::data::loader;
use crate::data::models::ProductionTick;
use crate::data::table::{self, Table};
use crate::data::utils::parse_timestamp;
use crate::utils::Logger;

pub mod adjustment_density;
pub mod idle_periods;
pub mod keyence;
pub mod match_production;
pub mod parse_logs;
pub mod pre_training;
pub mod relative_adjustments;

/// 조회 기간 옵션 (양 끝 미포함)
#[derive(StructOpt, Debug, Default, Clone)]
pub struct TimeRange {
    /// 이 시각 이후의 데이터만 사용 (예: "2025-03-23 20:20:00")
    #[structopt(long, parse(try_from_str = parse_timestamp))]
    pub start: Option<NaiveDateTime>,

    /// 이 시각 이전의 데이터만 사용
    #[structopt(long, parse(try_from_str = parse_timestamp))]
    pub end: Option<NaiveDateTime>,
}

impl TimeRange {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start.is_none_or(|start| ts > start) && self.end.is_none_or(|end| ts < end)
    }
}

/// 생산 시각 CSV 를 읽어 기간으로 거른 뒤 오름차순으로 정렬합니다.
pub fn load_production<P: AsRef<Path>>(
    path: P,
    range: &TimeRange,
    logger: &Logger,
) -> Result<Vec<NaiveDateTime>> {
    let ticks: Vec<ProductionTick> = loader::load_records(path.as_ref())?;
    let mut timestamps: Vec<NaiveDateTime> = ticks
        .into_iter()
        .map(|tick| tick.timestamp)
        .filter(|ts| range.contains(*ts))
        .collect();
    timestamps.sort();

    logger.log(format!("생산 시각 {}개 로드: {:?}", timestamps.len(), path.as_ref()));
    Ok(timestamps)
}

/// 시간 컬럼이 기간 안에 있는 행만 남깁니다. 시간을 읽을 수 없는 행도 버립니다.
pub fn retain_rows_in_range(
    table: &mut Table,
    column: &str,
    range: &TimeRange,
    logger: &Logger,
) -> Result<()> {
    let col = table.require_column(column)?;
    let before = table.len();
    let mut invalid = 0;

    table.retain_rows(|row| match crate::data::utils::parse_timestamp_opt(table::cell(row, col)) {
        Some(ts) => range.contains(ts),
        None => {
            invalid += 1;
            false
        }
    });

    if invalid > 0 {
        logger.warn(format!(
            "'{}' 컬럼을 읽을 수 없는 행 {}개를 제외했습니다",
            column, invalid
        ));
    }
    logger.debug(format!("기간 필터: {} → {} 행", before, table.len()));
    Ok(())
}

/// 기준 공구 측정값이 0 인 행 (측정되지 않은 행) 을 제외합니다.
pub fn drop_unmeasured_rows(table: &mut Table, column: &str, logger: &Logger) -> Result<()> {
    let col = table.require_column(column)?;
    let before = table.len();
    table.retain_rows(|row| table::numeric(row, col) != Some(0.0));
    logger.debug(format!("'{}' = 0 인 행 {}개 제외", column, before - table.len()));
    Ok(())
}
