use std::path::PathBuf;

use color_eyre::eyre::Result;
use mimalloc::MiMalloc;
use structopt::StructOpt;

use crate::config::AlignConfig;
use crate::utils::Logger;

mod align;
mod command;
mod config;
mod data;
mod utils;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// ====== CLI 구조체 ======

#[derive(StructOpt, Debug)]
#[structopt(name = "toolwear-timeline", about = "설비 센서 시계열 정렬 도구")]
pub struct Cli {
    /// 상세 로그 출력
    #[structopt(long, global = true)]
    pub debug: bool,

    /// JSON 설정 파일 (없으면 기본값 사용)
    #[structopt(long, global = true, parse(from_os_str))]
    pub config: Option<PathBuf>,

    #[structopt(subcommand)]
    pub command: Opt,
}

#[derive(StructOpt, Debug)]
pub enum Opt {
    /// 생산 중단 구간 추출 모드
    #[structopt(name = "idle-periods")]
    IdlePeriods(command::idle_periods::IdlePeriodsOpt),

    /// 측정 ↔ 생산 시각 매칭 모드
    #[structopt(name = "match-production")]
    MatchProduction(command::match_production::MatchProductionOpt),

    /// 공구 교체 기준 축 보정 변환 모드
    #[structopt(name = "relative-adjustments")]
    RelativeAdjustments(command::relative_adjustments::RelativeAdjustmentsOpt),

    /// 축 보정 밀도 집계 모드
    #[structopt(name = "adjustment-density")]
    AdjustmentDensity(command::adjustment_density::AdjustmentDensityOpt),

    /// 학습 데이터 생성 모드
    #[structopt(name = "pre-training")]
    PreTraining(command::pre_training::PreTrainingOpt),

    /// 알람 로그 파싱
    #[structopt(name = "parse-alarm-log")]
    ParseAlarmLog(command::parse_logs::ParseAlarmLogOpt),

    /// 축 보정 로그 파싱
    #[structopt(name = "parse-axis-log")]
    ParseAxisLog(command::parse_logs::ParseAxisLogOpt),

    /// 트레이스 파일 이름에서 생산 시각 추출
    #[structopt(name = "parse-trace-files")]
    ParseTraceFiles(command::parse_logs::ParseTraceFilesOpt),

    /// 전력 측정기 내보내기 변환
    #[structopt(name = "parse-energy")]
    ParseEnergy(command::parse_logs::ParseEnergyOpt),

    /// 알람에서 공구 교체 추출
    #[structopt(name = "extract-tool-changes")]
    ExtractToolChanges(command::parse_logs::ExtractToolChangesOpt),

    /// Keyence ToolID 보정
    #[structopt(name = "correct-tool-ids")]
    CorrectToolIds(command::keyence::CorrectToolIdsOpt),

    /// Keyence 측정값을 공구별 컬럼으로 재구성
    #[structopt(name = "restructure-keyence")]
    RestructureKeyence(command::keyence::RestructureKeyenceOpt),
}

/// ====== 엔트리포인트 ======

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::from_args();

    let logger = Logger::new(cli.debug);
    let config = AlignConfig::load(cli.config.as_deref())?;
    logger.debug(format!("설정: {:?}", config));

    match &cli.command {
        Opt::IdlePeriods(opts) => command::idle_periods::run_idle_periods(opts, &config, &logger)?,
        Opt::MatchProduction(opts) => {
            command::match_production::run_match_production(opts, &config, &logger)?
        }
        Opt::RelativeAdjustments(opts) => {
            command::relative_adjustments::run_relative_adjustments(opts, &config, &logger)?
        }
        Opt::AdjustmentDensity(opts) => {
            command::adjustment_density::run_adjustment_density(opts, &config, &logger)?
        }
        Opt::PreTraining(opts) => command::pre_training::run_pre_training(opts, &config, &logger)?,
        Opt::ParseAlarmLog(opts) => command::parse_logs::run_parse_alarm_log(opts, &logger)?,
        Opt::ParseAxisLog(opts) => command::parse_logs::run_parse_axis_log(opts, &logger)?,
        Opt::ParseTraceFiles(opts) => command::parse_logs::run_parse_trace_files(opts, &logger)?,
        Opt::ParseEnergy(opts) => command::parse_logs::run_parse_energy(opts, &logger)?,
        Opt::ExtractToolChanges(opts) => {
            command::parse_logs::run_extract_tool_changes(opts, &logger)?
        }
        Opt::CorrectToolIds(opts) => {
            command::keyence::run_correct_tool_ids(opts, &config, &logger)?
        }
        Opt::RestructureKeyence(opts) => command::keyence::run_restructure_keyence(opts, &logger)?,
    }

    Ok(())
}
