use color_eyre::eyre::{bail, Result};
use std::path::PathBuf;

use crate::data::loader;
use crate::data::models::{AlarmEntry, ProductionTick};
use crate::data::parser;
use crate::utils::Logger;

/// 알람 로그 변환 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct ParseAlarmLogOpt {
    /// NCU 알람 로그 텍스트 파일
    #[structopt(long, parse(from_os_str))]
    pub input: PathBuf,

    #[structopt(long, parse(from_os_str), default_value = "Alarm.csv")]
    pub output: PathBuf,
}

/// 축 보정 로그 변환 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct ParseAxisLogOpt {
    /// `;` 로 구분된 축 보정 로그
    #[structopt(long, parse(from_os_str))]
    pub input: PathBuf,

    #[structopt(long, parse(from_os_str), default_value = "Achse.csv")]
    pub output: PathBuf,
}

/// 공구 교체 추출 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct ExtractToolChangesOpt {
    /// `parse-alarm-log` 결과 CSV
    #[structopt(long, parse(from_os_str), default_value = "Alarm.csv")]
    pub alarms: PathBuf,

    /// 공구 교체 알람의 에러 코드 (기본값 77334)
    #[structopt(long)]
    pub error_code: Option<String>,

    #[structopt(long, parse(from_os_str), default_value = "Werkzeugwechsel.csv")]
    pub output: PathBuf,
}

/// 트레이스 파일에서 생산 시각 추출 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct ParseTraceFilesOpt {
    /// `GEMVM_Export_Trace_S1_*` 파일이 있는 폴더 (여러 개 지정 가능)
    #[structopt(long, required = true, parse(from_os_str))]
    pub folders: Vec<PathBuf>,

    #[structopt(long, parse(from_os_str), default_value = "Produktionszeiten.csv")]
    pub output: PathBuf,
}

/// 전력 측정기 내보내기 변환 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct ParseEnergyOpt {
    /// 전력 측정기 CSV 가 있는 폴더
    #[structopt(long, parse(from_os_str))]
    pub folder: PathBuf,

    #[structopt(long, parse(from_os_str), default_value = "Energy.csv")]
    pub output: PathBuf,
}

pub fn run_parse_alarm_log(opts: &ParseAlarmLogOpt, logger: &Logger) -> Result<()> {
    let entries = parser::load_alarm_log(&opts.input)?;
    logger.log(format!("알람 {}건 파싱", entries.len()));

    loader::write_records(&entries, &opts.output)?;
    logger.log(format!("저장 완료: {:?}", opts.output));
    Ok(())
}

pub fn run_parse_axis_log(opts: &ParseAxisLogOpt, logger: &Logger) -> Result<()> {
    let parsed = parser::load_axis_log(&opts.input)?;
    if parsed.skipped > 0 {
        logger.warn(format!(
            "타임스탬프나 보정값을 읽을 수 없는 행 {}개를 제외했습니다",
            parsed.skipped
        ));
    }
    logger.log(format!("축 보정 {}건 파싱", parsed.adjustments.len()));

    loader::write_records(&parsed.adjustments, &opts.output)?;
    logger.log(format!("저장 완료: {:?}", opts.output));
    Ok(())
}

pub fn run_extract_tool_changes(opts: &ExtractToolChangesOpt, logger: &Logger) -> Result<()> {
    let alarms: Vec<AlarmEntry> = loader::load_records(&opts.alarms)?;
    let error_code = opts
        .error_code
        .as_deref()
        .unwrap_or(parser::TOOL_CHANGE_ERROR_CODE);
    let changes = parser::extract_tool_changes(&alarms, error_code);
    logger.log(format!("알람 {}건 중 공구 교체 {}건", alarms.len(), changes.len()));

    loader::write_records(&changes, &opts.output)?;
    logger.log(format!("저장 완료: {:?}", opts.output));
    Ok(())
}

/// 폴더마다 트레이스 파일 이름의 시각을 묶어 생산 시각 CSV 로 저장합니다.
pub fn run_parse_trace_files(opts: &ParseTraceFilesOpt, logger: &Logger) -> Result<()> {
    let mut ticks = Vec::new();

    for folder in &opts.folders {
        let scan = parser::scan_trace_folder(folder)?;
        for name in &scan.skipped {
            logger.warn(format!("파일 이름에서 시각을 읽을 수 없습니다: {}", name));
        }
        logger.log(format!(
            "{:?}: 트레이스 파일 {}개 → 생산 시각 {}개",
            folder,
            scan.files,
            scan.ticks.len()
        ));
        ticks.extend(scan.ticks);
    }

    ticks.sort();
    let records: Vec<ProductionTick> = ticks
        .into_iter()
        .map(|timestamp| ProductionTick { timestamp })
        .collect();

    loader::write_records(&records, &opts.output)?;
    logger.log(format!("저장 완료: {:?} ({}행)", opts.output, records.len()));
    Ok(())
}

pub fn run_parse_energy(opts: &ParseEnergyOpt, logger: &Logger) -> Result<()> {
    let files = parser::energy_files(&opts.folder)?;
    if files.is_empty() {
        bail!("No energy CSV files found in {:?}", opts.folder);
    }
    logger.log(format!("전력 파일 {}개 처리 중...", files.len()));

    let samples = parser::load_all_energy(&files, logger);
    logger.log(format!("전력 데이터 {}건", samples.len()));

    loader::write_records(&samples, &opts.output)?;
    logger.log(format!("저장 완료: {:?}", opts.output));
    Ok(())
}
