use color_eyre::eyre::{bail, Result};
use std::path::PathBuf;

use crate::align;
use crate::config::AlignConfig;
use crate::data::loader;
use crate::data::models::{DensityBin, RelativeAdjustment};
use crate::utils::Logger;

/// 축 보정 밀도 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct AdjustmentDensityOpt {
    /// `relative-adjustments` 결과 CSV
    #[structopt(long, parse(from_os_str), default_value = "X_Adjustments_Relative.csv")]
    pub input: PathBuf,

    #[structopt(long, parse(from_os_str), default_value = "Achsenverstellungsdichte.csv")]
    pub output: PathBuf,

    /// 구간 폭 (시간). 없으면 설정 파일 값을 사용
    #[structopt(long)]
    pub bin_hours: Option<f64>,

    /// 공구 교체 직후 데이터도 버리지 않음
    #[structopt(long)]
    pub keep_all: bool,
}

pub fn run_adjustment_density(
    opts: &AdjustmentDensityOpt,
    config: &AlignConfig,
    logger: &Logger,
) -> Result<()> {
    let records: Vec<RelativeAdjustment> = loader::load_records(&opts.input)?;
    let values: Vec<f64> = records.iter().map(|r| r.relative_hours).collect();

    let bin_hours = opts.bin_hours.unwrap_or(config.density.bin_hours);
    if !(bin_hours.is_finite() && bin_hours > 0.0) {
        bail!("--bin-hours must be positive (got {})", bin_hours);
    }
    let discard_before = if opts.keep_all {
        None
    } else {
        config.density.discard_before_hours
    };

    let bins: Vec<DensityBin> = align::density(&values, bin_hours, discard_before);
    let used: usize = bins.iter().map(|b| b.count).sum();
    logger.log(format!(
        "{}개 중 {}개 사용, 구간 {}개 ({}시간 단위)",
        values.len(),
        used,
        bins.len(),
        bin_hours
    ));

    loader::write_records(&bins, &opts.output)?;
    logger.log(format!("저장 완료: {:?}", opts.output));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_relative(dir: &tempfile::TempDir) -> PathBuf {
        let input = dir.path().join("X_Adjustments_Relative.csv");
        fs::write(
            &input,
            "Relative_Time,Verstellung\n\
             0.2,0.01\n\
             1.0,0.01\n\
             1.1,-0.02\n\
             1.3,0.01\n\
             1.7,0.01\n\
             2.05,0.03\n",
        )
        .unwrap();
        input
    }

    #[test]
    fn test_run_adjustment_density_writes_histogram() {
        let dir = tempfile::tempdir().unwrap();
        let opts = AdjustmentDensityOpt {
            input: write_relative(&dir),
            output: dir.path().join("Achsenverstellungsdichte.csv"),
            bin_hours: None,
            keep_all: false,
        };
        run_adjustment_density(&opts, &AlignConfig::default(), &Logger::default()).unwrap();

        let bins: Vec<DensityBin> = loader::load_records(&opts.output).unwrap();
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 2]);
        assert!((bins[0].bin_center - 1.35).abs() < 1e-9);
        assert!((bins[1].bin_center - 1.85).abs() < 1e-9);
    }

    #[test]
    fn test_keep_all_and_bin_override() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = AdjustmentDensityOpt {
            input: write_relative(&dir),
            output: dir.path().join("dichte.csv"),
            bin_hours: Some(1.0),
            keep_all: true,
        };
        run_adjustment_density(&opts, &AlignConfig::default(), &Logger::default()).unwrap();

        let bins: Vec<DensityBin> = loader::load_records(&opts.output).unwrap();
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![3, 3]);

        opts.bin_hours = Some(0.0);
        let result = run_adjustment_density(&opts, &AlignConfig::default(), &Logger::default());
        assert!(result.is_err());
    }
}
