use chrono::Duration as ChronoDuration;
use color_eyre::eyre::{bail, eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::loader;

/// 설정의 시간 값 (초) 상한. 100년
const MAX_DURATION_SECS: i64 = 100 * 365 * 24 * 3600;

/// ====== 정렬/분할 파라미터 ======
/// 모든 임계값은 JSON 설정 파일에서 읽으며, 없는 섹션은 기본값을 사용합니다.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub idle: IdleConfig,
    pub matcher: MatcherConfig,
    pub expand: ExpandConfig,
    pub segments: SegmentBounds,
    pub density: DensityConfig,
    /// 측정값 범위로 ToolID 를 판별하는 보정 테이블 (선언 순서대로 첫 일치)
    pub tool_limits: Vec<ToolLimit>,
    /// 편차 튜플을 만드는 공구 그룹
    pub deviation_groups: Vec<DeviationGroup>,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            idle: IdleConfig::default(),
            matcher: MatcherConfig::default(),
            expand: ExpandConfig::default(),
            segments: SegmentBounds::default(),
            density: DensityConfig::default(),
            tool_limits: default_tool_limits(),
            deviation_groups: default_deviation_groups(),
        }
    }
}

impl AlignConfig {
    /// 설정 파일을 로드합니다. 경로가 없으면 기본값을 반환합니다.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = match path {
            Some(path) => loader::load_json(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.idle.gap()?;
        self.matcher.max_gap()?;
        self.matcher.soft_gap()?;
        self.matcher.resync_window()?;
        self.expand.window()?;
        duration_secs("segments.max_duration_secs", self.segments.max_duration_secs)?;

        if self.matcher.soft_gap_secs > self.matcher.max_gap_secs {
            bail!(
                "matcher.soft_gap_secs ({}) must not exceed matcher.max_gap_secs ({})",
                self.matcher.soft_gap_secs,
                self.matcher.max_gap_secs
            );
        }
        if self.segments.min_events > self.segments.max_events {
            bail!(
                "segments.min_events ({}) must not exceed segments.max_events ({})",
                self.segments.min_events,
                self.segments.max_events
            );
        }
        if !(self.density.bin_hours.is_finite() && self.density.bin_hours > 0.0) {
            bail!("density.bin_hours must be positive (got {})", self.density.bin_hours);
        }
        for limit in &self.tool_limits {
            if limit.lower > limit.upper {
                bail!(
                    "tool_limits: lower bound {} exceeds upper bound {} for tool {}",
                    limit.lower,
                    limit.upper,
                    limit.tool_id
                );
            }
        }
        Ok(())
    }

    /// 측정 컬럼 이름으로 보정 범위를 찾습니다. (`Measurement ToolID.200` → 200)
    pub fn limit_for_column(&self, column: &str) -> Option<&ToolLimit> {
        let tool_id: u32 = column.rsplit('.').next()?.parse().ok()?;
        self.tool_limits.iter().find(|l| l.tool_id == tool_id)
    }
}

/// 초 단위 설정 값을 시간 간격으로 변환합니다. 음수이거나 상한을 넘으면 에러입니다.
fn duration_secs(name: &str, secs: i64) -> Result<ChronoDuration> {
    if secs < 0 {
        bail!("{} must not be negative (got {})", name, secs);
    }
    if secs > MAX_DURATION_SECS {
        bail!("{} must not exceed {} seconds (got {})", name, MAX_DURATION_SECS, secs);
    }
    ChronoDuration::try_seconds(secs).ok_or_else(|| eyre!("{} is out of range: {}", name, secs))
}

/// 생산 중단 판정 기준
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub gap_secs: i64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self { gap_secs: 20 }
    }
}

impl IdleConfig {
    pub fn gap(&self) -> Result<ChronoDuration> {
        duration_secs("idle.gap_secs", self.gap_secs)
    }
}

/// 측정 이벤트 ↔ 생산 시각 매칭 파라미터
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// 직전 매칭 위치에서 건너뛸 생산 시각 개수
    pub step: usize,
    /// 이보다 긴 측정 간격이면 같은 날짜의 첫 생산 시각으로 재동기화
    pub max_gap_secs: i64,
    /// 이보다 긴 측정 간격이면 재동기화 시작
    pub soft_gap_secs: i64,
    /// 재동기화 시 허용하는 생산 시각과의 거리
    pub resync_window_secs: i64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            step: 63,
            max_gap_secs: 12 * 3600,
            soft_gap_secs: 4 * 3600,
            resync_window_secs: 50 * 60,
        }
    }
}

impl MatcherConfig {
    pub fn max_gap(&self) -> Result<ChronoDuration> {
        duration_secs("matcher.max_gap_secs", self.max_gap_secs)
    }

    pub fn soft_gap(&self) -> Result<ChronoDuration> {
        duration_secs("matcher.soft_gap_secs", self.soft_gap_secs)
    }

    pub fn resync_window(&self) -> Result<ChronoDuration> {
        duration_secs("matcher.resync_window_secs", self.resync_window_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandConfig {
    pub window_secs: i64,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self { window_secs: 10 }
    }
}

impl ExpandConfig {
    pub fn window(&self) -> Result<ChronoDuration> {
        duration_secs("expand.window_secs", self.window_secs)
    }
}

/// 공구 교체 구간 채택 조건
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentBounds {
    pub min_events: usize,
    pub max_events: usize,
    pub max_duration_secs: i64,
}

impl Default for SegmentBounds {
    fn default() -> Self {
        Self {
            min_events: 2500,
            max_events: 3500,
            max_duration_secs: 12 * 3600,
        }
    }
}

impl SegmentBounds {
    /// 구간 길이는 초 단위로 비교합니다. (정수 상한이므로 소수점 이하를 버려도 결과가 같습니다)
    pub fn accepts(&self, event_count: usize, duration: ChronoDuration) -> bool {
        (self.min_events..=self.max_events).contains(&event_count)
            && duration.num_seconds() < self.max_duration_secs
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    pub bin_hours: f64,
    /// 이 시간 (시간 단위) 이하의 데이터는 버립니다. None 이면 모두 사용.
    pub discard_before_hours: Option<f64>,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            bin_hours: 0.5,
            discard_before_hours: Some(1.0),
        }
    }
}

/// 측정값 범위 → ToolID
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolLimit {
    pub tool_id: u32,
    pub lower: f64,
    pub upper: f64,
}

impl ToolLimit {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn mean(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviationGroup {
    pub name: String,
    pub columns: Vec<String>,
}

fn default_tool_limits() -> Vec<ToolLimit> {
    [
        (200, 9.000, 9.470),
        (202, 9.485, 9.734),
        (203, 10.050, 11.410),
        (204, 12.000, 15.500),
        (205, 7.100, 7.800),
        (206, 9.740, 10.020),
        (208, 2.200, 2.900),
        (209, 1.370, 2.190),
    ]
    .into_iter()
    .map(|(tool_id, lower, upper)| ToolLimit {
        tool_id,
        lower,
        upper,
    })
    .collect()
}

fn default_deviation_groups() -> Vec<DeviationGroup> {
    let group = |name: &str, ids: &[u32]| DeviationGroup {
        name: name.to_string(),
        columns: ids
            .iter()
            .map(|id| format!("Measurement ToolID.{}", id))
            .collect(),
    };
    vec![
        group("T321", &[200, 202, 203, 204, 209]),
        group("T521", &[205, 206, 208, 209]),
    ]
}
