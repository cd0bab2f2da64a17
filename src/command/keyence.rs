use color_eyre::eyre::Result;
use std::path::PathBuf;

use crate::config::AlignConfig;
use crate::data::loader;
use crate::data::parser::keyence;
use crate::utils::Logger;

/// Keyence ToolID 보정 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct CorrectToolIdsOpt {
    /// Keyence 내보내기 CSV (여러 개 지정 가능)
    #[structopt(long, required = true, parse(from_os_str))]
    pub files: Vec<PathBuf>,

    #[structopt(long, parse(from_os_str), default_value = "korrigierte_dateien")]
    pub output_dir: PathBuf,

    /// 결과 파일 이름 앞에 붙는 순번의 시작값
    #[structopt(long, default_value = "1")]
    pub start_index: usize,
}

/// Keyence 재구성 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct RestructureKeyenceOpt {
    /// ToolID 가 보정된 Keyence CSV (여러 개 지정 가능)
    #[structopt(long, required = true, parse(from_os_str))]
    pub files: Vec<PathBuf>,

    #[structopt(long, parse(from_os_str), default_value = "transformierte_dateien")]
    pub output_dir: PathBuf,
}

/// 여러 Keyence 파일의 ToolID 를 병렬로 보정하고 `{순번}{파일 이름}` 으로 저장합니다.
pub fn run_correct_tool_ids(
    opts: &CorrectToolIdsOpt,
    config: &AlignConfig,
    logger: &Logger,
) -> Result<()> {
    logger.log(format!("Keyence 파일 {}개 보정 시작", opts.files.len()));
    let corrected = keyence::load_and_correct_all(&opts.files, &config.tool_limits, logger);

    for (i, (path, table)) in corrected.iter().enumerate() {
        let name = keyence::numbered_file_name(opts.start_index + i, path);
        let output = opts.output_dir.join(name);
        loader::write_table(table, &output)?;
        logger.log(format!("저장 완료: {:?}", output));
    }

    logger.log(format!("{}/{}개 파일 보정 완료", corrected.len(), opts.files.len()));
    Ok(())
}

/// (ToolID, 측정값) 쌍을 공구별 컬럼으로 펼칩니다. 읽지 못한 파일은 건너뜁니다.
pub fn run_restructure_keyence(opts: &RestructureKeyenceOpt, logger: &Logger) -> Result<()> {
    let mut written = 0;

    for path in &opts.files {
        logger.log(format!("처리 중: {:?}", path));
        let table = match keyence::restructure_file(path, logger) {
            Ok(table) => table,
            Err(e) => {
                logger.warn(format!("Failed to restructure {:?}: {}", path, e));
                continue;
            }
        };

        let Some(name) = path.file_name() else {
            logger.warn(format!("Invalid filename: {:?}", path));
            continue;
        };
        let output = opts.output_dir.join(name);
        loader::write_table(&table, &output)?;
        logger.debug(format!("{}개 컬럼, {}행", table.headers.len(), table.len()));
        logger.log(format!("저장 완료: {:?}", output));
        written += 1;
    }

    logger.log(format!("{}/{}개 파일 재구성 완료", written, opts.files.len()));
    Ok(())
}
