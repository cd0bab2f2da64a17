use color_eyre::eyre::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::config::ToolLimit;
use crate::data::loader;
use crate::data::table::{self, Table};
use crate::utils::{self, Logger};

pub const END_TIME_COLUMN: &str = "Measurement End Time";
pub const START_TIME_COLUMN: &str = "Measurement Start Time";
pub const MISSING_VALUE: &str = "N/A";

/// ToolID 컬럼과 측정값 컬럼 사이의 간격 (Keyence 내보내기 형식)
const VALUE_COLUMN_OFFSET: usize = 4;

/// 정리된 측정 컬럼 이름
pub fn measurement_column(tool_id: i64) -> String {
    format!("Measurement ToolID.{}", tool_id)
}

/// `ToolID` 가 들어간 컬럼과 오른쪽으로 네 칸 떨어진 측정값 컬럼의 쌍
pub fn tool_value_pairs(headers: &[String]) -> Vec<(usize, usize)> {
    headers
        .iter()
        .enumerate()
        .filter(|(i, h)| h.contains("ToolID") && i + VALUE_COLUMN_OFFSET < headers.len())
        .map(|(i, _)| (i, i + VALUE_COLUMN_OFFSET))
        .collect()
}

/// ToolID 셀을 정수로 읽습니다. (`200`, `200.0` 모두 허용)
fn parse_tool_id(raw: &str) -> Option<i64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then(|| value.trunc() as i64)
}

/// 측정값이 처음으로 포함되는 범위의 ToolID 를 반환합니다. (선언 순서)
pub fn classify(value: f64, limits: &[ToolLimit]) -> Option<u32> {
    limits.iter().find(|l| l.contains(value)).map(|l| l.tool_id)
}

/// 측정값 범위를 기준으로 ToolID 를 다시 매깁니다.
/// 어떤 범위에도 속하지 않거나 값이 비어 있으면 원래 ToolID 를 유지합니다.
///
/// 반환값은 바뀐 셀 수입니다.
pub fn correct_tool_ids(table: &mut Table, limits: &[ToolLimit]) -> usize {
    let pairs = tool_value_pairs(&table.headers);
    let mut changed = 0;

    for row in &mut table.rows {
        for &(tool_col, value_col) in &pairs {
            let Some(corrected) = table::numeric(row, value_col).and_then(|v| classify(v, limits))
            else {
                continue;
            };
            let corrected = corrected.to_string();
            if let Some(cell) = row.get_mut(tool_col) {
                if *cell != corrected {
                    *cell = corrected;
                    changed += 1;
                }
            }
        }
    }

    changed
}

/// 여러 Keyence 파일을 병렬로 읽어 ToolID 를 보정합니다.
/// 읽지 못한 파일은 경고 후 건너뛰며, 결과는 입력 순서를 유지합니다.
pub fn load_and_correct_all(
    paths: &[PathBuf],
    limits: &[ToolLimit],
    logger: &Logger,
) -> Vec<(PathBuf, Table)> {
    let pb = utils::create_progress_bar(paths.len() as u64, "Correcting tool ids...");

    let corrected: Vec<(PathBuf, Table)> = paths
        .par_iter()
        .filter_map(|path| {
            let result = loader::load_table(path);
            pb.inc(1);

            match result {
                Ok(mut table) => {
                    let changed = correct_tool_ids(&mut table, limits);
                    logger.debug(format!(
                        "{:?}: {} tool-value pairs, {} cells corrected",
                        path,
                        tool_value_pairs(&table.headers).len(),
                        changed
                    ));
                    Some((path.clone(), table))
                }
                Err(e) => {
                    logger.warn(format!("Failed to load Keyence file {:?}: {}", path, e));
                    None
                }
            }
        })
        .collect();

    pb.finish_with_message("Tool ids corrected!");
    corrected
}

/// 보정 결과 파일 이름: `{순번}{원래 파일 이름}`
pub fn numbered_file_name(counter: usize, path: &Path) -> String {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}", counter, base)
}

/// (ToolID, 측정값) 쌍을 `Measurement ToolID.<id>` 컬럼으로 펼칩니다.
///
/// 측정 시작/종료 시각 컬럼은 그대로 두고, 새 컬럼은 처음 등장한 순서대로 추가합니다.
/// 값이 없는 셀은 `N/A` 로 채웁니다.
pub fn restructure(source: &Table, logger: &Logger) -> Table {
    let end_col = source.column_index(END_TIME_COLUMN);
    let start_col = source.column_index(START_TIME_COLUMN);
    let pairs = tool_value_pairs(&source.headers);

    let mut output = Table::new(vec![END_TIME_COLUMN.to_string(), START_TIME_COLUMN.to_string()]);

    for (index, row) in source.rows.iter().enumerate() {
        let base = |col: Option<usize>| {
            col.map(|c| table::cell(row, c).to_string()).unwrap_or_default()
        };
        let mut out_row = vec![base(end_col), base(start_col)];
        out_row.resize(output.headers.len(), String::new());

        for &(tool_col, value_col) in &pairs {
            let raw_id = table::cell(row, tool_col);
            if raw_id.trim().is_empty() {
                continue;
            }
            let Some(tool_id) = parse_tool_id(raw_id) else {
                logger.debug(format!("Invalid ToolID '{}' in row {}", raw_id, index));
                continue;
            };

            let col = output.ensure_column(&measurement_column(tool_id));
            if out_row.len() <= col {
                out_row.resize(col + 1, String::new());
            }
            out_row[col] = table::cell(row, value_col).to_string();
        }

        output.rows.push(out_row);
    }

    let width = output.headers.len();
    for row in &mut output.rows {
        row.resize(width, String::new());
        for cell in row.iter_mut().filter(|c| c.trim().is_empty()) {
            *cell = MISSING_VALUE.to_string();
        }
    }

    output
}

/// Keyence 파일 하나를 읽어 재구성합니다.
pub fn restructure_file<P: AsRef<Path>>(path: P, logger: &Logger) -> Result<Table> {
    let source = loader::load_table(path)?;
    Ok(restructure(&source, logger))
}
