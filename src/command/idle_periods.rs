use color_eyre::eyre::Result;
use std::path::PathBuf;

use crate::align;
use crate::command::{self, TimeRange};
use crate::config::AlignConfig;
use crate::data::loader;
use crate::data::models::IdlePeriod;
use crate::utils::Logger;

/// 생산 중단 구간 추출 옵션
#[derive(structopt::StructOpt, Debug)]
pub struct IdlePeriodsOpt {
    /// 생산 시각 CSV (`Timestamp` 컬럼)
    #[structopt(long, parse(from_os_str))]
    pub production: PathBuf,

    /// 결과 CSV 경로
    #[structopt(long, parse(from_os_str), default_value = "Standzeiten.csv")]
    pub output: PathBuf,

    /// 중단으로 판정할 최소 간격 (초). 없으면 설정 파일 값을 사용
    #[structopt(long)]
    pub gap_secs: Option<i64>,

    #[structopt(flatten)]
    pub range: TimeRange,
}

/// 생산 시각 사이의 간격이 임계값을 넘는 구간을 생산 중단으로 저장합니다.
pub fn run_idle_periods(
    opts: &IdlePeriodsOpt,
    config: &AlignConfig,
    logger: &Logger,
) -> Result<()> {
    let production = command::load_production(&opts.production, &opts.range, logger)?;

    let mut idle = config.idle.clone();
    if let Some(gap_secs) = opts.gap_secs {
        idle.gap_secs = gap_secs;
    }

    logger.log(format!("{}초 초과 간격 탐색 중...", idle.gap_secs));
    let gaps = align::detect_gaps(&production, idle.gap()?);
    let total_minutes: i64 = gaps.iter().map(|gap| gap.duration().num_minutes()).sum();

    let periods: Vec<IdlePeriod> = gaps
        .into_iter()
        .map(|gap| IdlePeriod {
            start: gap.start,
            end: gap.end,
        })
        .collect();
    logger.log(format!("생산 중단 {}건 (합계 {}분)", periods.len(), total_minutes));

    loader::write_records(&periods, &opts.output)?;
    logger.log(format!("저장 완료: {:?}", opts.output));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_run_idle_periods_writes_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let production = dir.path().join("Produktionszeiten.csv");
        fs::write(
            &production,
            "Timestamp\n\
             2025-02-01 06:00:50\n\
             2025-02-01 06:00:00\n\
             2025-02-01 06:00:20\n\
             2025-02-01 06:00:45\n",
        )
        .unwrap();

        let opts = IdlePeriodsOpt {
            production,
            output: dir.path().join("Standzeiten.csv"),
            gap_secs: None,
            range: TimeRange::default(),
        };
        run_idle_periods(&opts, &AlignConfig::default(), &Logger::default()).unwrap();

        let periods: Vec<IdlePeriod> = loader::load_records(&opts.output).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].start.to_string(), "2025-02-01 06:00:20");
        assert_eq!(periods[0].end.to_string(), "2025-02-01 06:00:45");
    }

    #[test]
    fn test_negative_gap_override_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let production = dir.path().join("Produktionszeiten.csv");
        fs::write(&production, "Timestamp\n2025-02-01 06:00:00\n").unwrap();

        let opts = IdlePeriodsOpt {
            production,
            output: dir.path().join("Standzeiten.csv"),
            gap_secs: Some(-1),
            range: TimeRange::default(),
        };
        assert!(run_idle_periods(&opts, &AlignConfig::default(), &Logger::default()).is_err());
        assert!(!opts.output.exists());
    }
}
