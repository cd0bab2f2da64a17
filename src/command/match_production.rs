use chrono::{Duration as ChronoDuration, NaiveDateTime};
use color_eyre::eyre::Result;
use std::path::PathBuf;

use crate::align::{self, Matched};
use crate::command::{self, TimeRange};
use crate::config::AlignConfig;
use crate::data::deviation::PRODUCTION_TIME_COLUMN;
use crate::data::loader;
use crate::data::table::Table;
use crate::data::utils;
use crate::utils::Logger;

/// 측정 ↔ 생산 시각 매칭 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct MatchProductionOpt {
    /// 생산 시각 CSV (`Timestamp` 컬럼)
    #[structopt(long, parse(from_os_str))]
    pub production: PathBuf,

    /// 측정 CSV (Keyence 재구성 결과)
    #[structopt(long, parse(from_os_str))]
    pub measurements: PathBuf,

    /// 측정 CSV 의 시간 컬럼
    #[structopt(long, default_value = "Timestamp")]
    pub time_column: String,

    /// 값이 0 이면 측정되지 않은 것으로 보고 제외하는 컬럼
    #[structopt(long, default_value = "Measurement ToolID.200")]
    pub reference_column: String,

    /// 매칭 결과 CSV
    #[structopt(long, parse(from_os_str), default_value = "matched_V2_backwards.csv")]
    pub output: PathBuf,

    /// 주변 생산 시각으로 펼친 결과 CSV
    #[structopt(
        long,
        parse(from_os_str),
        default_value = "matched_V2_backwards_expanded.csv"
    )]
    pub expanded_output: PathBuf,

    /// 건너뛸 생산 시각 개수. 없으면 설정 파일 값을 사용
    #[structopt(long)]
    pub step: Option<usize>,

    #[structopt(flatten)]
    pub range: TimeRange,
}

/// 측정 이벤트에 생산 시각을 매칭하고, 매칭된 시각 주변의 생산 시각으로 펼쳐서 저장합니다.
pub fn run_match_production(
    opts: &MatchProductionOpt,
    config: &AlignConfig,
    logger: &Logger,
) -> Result<()> {
    logger.log("생산 시각 로드 중...");
    let production = command::load_production(&opts.production, &opts.range, logger)?;

    logger.log("측정 데이터 로드 중...");
    let mut measurements = loader::load_table(&opts.measurements)?;
    command::retain_rows_in_range(&mut measurements, &opts.time_column, &opts.range, logger)?;
    command::drop_unmeasured_rows(&mut measurements, &opts.reference_column, logger)?;
    measurements.sort_by_timestamp(&opts.time_column)?;
    if measurements.is_empty() {
        logger.warn("기간 안에 측정 데이터가 없습니다");
    }
    logger.log(format!("측정 {}건", measurements.len()));

    let mut matcher = config.matcher.clone();
    if let Some(step) = opts.step {
        matcher.step = step;
    }

    logger.log("생산 시각 매칭 중...");
    let events = measurements.timestamps(&opts.time_column)?;
    let matches = align::assign_backward(&events, &production, &matcher, logger)?;

    let matched_count = matches.iter().filter(|m| m.is_some()).count();
    logger.log(format!("매칭 완료: {}/{}건", matched_count, matches.len()));

    let matched = attach_production_time(measurements, &matches);
    let prod_col = matched.require_column(PRODUCTION_TIME_COLUMN)?;
    loader::write_table(&matched, &opts.output)?;
    logger.log(format!("저장 완료: {:?}", opts.output));

    logger.log("주변 생산 시각으로 확장 중...");
    let window = config.expand.window()?;
    let expanded = expand_table(&matched, prod_col, &matches, &production, window, logger);
    loader::write_table(&expanded, &opts.expanded_output)?;
    logger.log(format!(
        "저장 완료: {:?} ({}행)",
        opts.expanded_output,
        expanded.len()
    ));

    Ok(())
}

/// `Timestamp Prod` 컬럼에 매칭 결과를 기록합니다. 매칭되지 않은 행은 빈 값입니다.
fn attach_production_time(mut table: Table, matches: &[Option<NaiveDateTime>]) -> Table {
    let col = table.ensure_column(PRODUCTION_TIME_COLUMN);
    for (row, matched) in table.rows.iter_mut().zip(matches) {
        row[col] = matched.as_ref().map(utils::format_timestamp).unwrap_or_default();
    }
    table
}

/// 매칭된 행을 주변 생산 시각마다 복제하고 `Timestamp Prod` 만 바꿉니다.
fn expand_table(
    matched: &Table,
    col: usize,
    matches: &[Option<NaiveDateTime>],
    production: &[NaiveDateTime],
    window: ChronoDuration,
    logger: &Logger,
) -> Table {
    let rows: Vec<Matched<&Vec<String>>> = matched
        .rows
        .iter()
        .zip(matches)
        .map(|(row, reference)| Matched::new(row, *reference))
        .collect();

    let expanded = align::expand_neighbors(&rows, production, window);
    logger.debug(format!("{}행 → {}행", rows.len(), expanded.len()));

    let mut table = Table::new(matched.headers.clone());
    table.rows = expanded
        .into_iter()
        .map(|row| {
            let mut values = row.payload.to_vec();
            values[col] = row.reference.as_ref().map(utils::format_timestamp).unwrap_or_default();
            values
        })
        .collect();
    table
}
