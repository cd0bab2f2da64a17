use color_eyre::eyre::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::models::EnergySample;
use crate::data::utils as data_utils;
use crate::utils::{self, Logger};

/// 전력 측정기 내보내기 파일 앞의 장치 정보 줄 수
pub const ENERGY_HEADER_ROWS: usize = 6;

// 헤더 이후 컬럼 순서: timestamp, Power (W), factor, apparent, Current (A), Voltage (V)
const TIMESTAMP_FIELD: usize = 0;
const POWER_FIELD: usize = 1;
const CURRENT_FIELD: usize = 4;
const VOLTAGE_FIELD: usize = 5;

/// 전력 파일 파싱 결과
#[derive(Debug, Default)]
pub struct EnergyParse {
    pub samples: Vec<EnergySample>,
    /// 타임스탬프를 읽지 못해 버린 행 수
    pub skipped: usize,
}

/// 앞의 `count` 줄을 건너뜁니다. 줄이 모자라면 빈 슬라이스입니다.
fn skip_lines(content: &[u8], count: usize) -> &[u8] {
    let mut rest = content;
    for _ in 0..count {
        match rest.iter().position(|b| *b == b'\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return &[],
        }
    }
    rest
}

/// 전력 측정기 CSV 를 파싱합니다.
/// 타임존이 붙은 시각은 벽시계 시간만 남기고, 숫자가 아닌 측정값은 비워 둡니다.
pub fn parse_energy_export(content: &[u8]) -> Result<EnergyParse> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(skip_lines(content, ENERGY_HEADER_ROWS));

    let mut result = EnergyParse::default();

    for (i, record) in reader.byte_records().enumerate() {
        let line = ENERGY_HEADER_ROWS + i + 1;
        let record = record.with_context(|| format!("Failed to read energy line {}", line))?;
        let field = |idx: usize| -> String {
            record
                .get(idx)
                .map(|raw| String::from_utf8_lossy(raw).trim().to_string())
                .unwrap_or_default()
        };
        let number = |idx: usize| field(idx).parse::<f64>().ok();

        let Some(timestamp) = data_utils::parse_timestamp_opt(&field(TIMESTAMP_FIELD)) else {
            result.skipped += 1;
            continue;
        };

        result.samples.push(EnergySample {
            timestamp,
            power: number(POWER_FIELD),
            current: number(CURRENT_FIELD),
            voltage: number(VOLTAGE_FIELD),
        });
    }

    Ok(result)
}

pub fn load_energy_export<P: AsRef<Path>>(path: P) -> Result<EnergyParse> {
    let path = path.as_ref();
    let content = fs::read(path)
        .with_context(|| format!("Failed to read energy file: {:?}", path))?;
    parse_energy_export(&content)
        .with_context(|| format!("Failed to parse energy file: {:?}", path))
}

/// 폴더 안의 `.csv` 파일 목록 (이름 순)
pub fn energy_files<P: AsRef<Path>>(folder: P) -> Result<Vec<PathBuf>> {
    let folder = folder.as_ref();
    let entries = fs::read_dir(folder)
        .with_context(|| format!("Failed to read energy folder: {:?}", folder))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read entry in {:?}", folder))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// 여러 전력 파일을 병렬로 읽습니다. 읽지 못한 파일은 경고 후 건너뜁니다.
/// 결과는 시각 순으로 정렬됩니다.
pub fn load_all_energy(paths: &[PathBuf], logger: &Logger) -> Vec<EnergySample> {
    let pb = utils::create_progress_bar(paths.len() as u64, "Loading energy exports...");

    let parsed: Vec<EnergyParse> = paths
        .par_iter()
        .filter_map(|path| {
            let result = load_energy_export(path);
            pb.inc(1);

            match result {
                Ok(parsed) => {
                    logger.debug(format!(
                        "{:?}: {}행, 제외 {}행",
                        path,
                        parsed.samples.len(),
                        parsed.skipped
                    ));
                    Some(parsed)
                }
                Err(e) => {
                    logger.warn(format!("Failed to load energy file {:?}: {}", path, e));
                    None
                }
            }
        })
        .collect();

    pb.finish_with_message("Energy exports loaded!");

    let skipped: usize = parsed.iter().map(|p| p.skipped).sum();
    if skipped > 0 {
        logger.warn(format!("타임스탬프를 읽을 수 없는 행 {}개를 제외했습니다", skipped));
    }

    let mut samples: Vec<EnergySample> = parsed.into_iter().flat_map(|p| p.samples).collect();
    samples.sort_by_key(|sample| sample.timestamp);
    samples
}
