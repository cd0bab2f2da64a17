use chrono::{Duration as ChronoDuration, NaiveDateTime};

/// 인접한 두 타임스탬프 사이의 빈 구간
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub fn duration(&self) -> ChronoDuration {
        self.end - self.start
    }
}

/// 정렬된 타임스탬프에서 간격이 `threshold` 를 초과하는 구간을 찾습니다.
/// 간격이 정확히 `threshold` 인 경우는 포함하지 않습니다.
pub fn detect_gaps(timestamps: &[NaiveDateTime], threshold: ChronoDuration) -> Vec<Interval> {
    timestamps
        .windows(2)
        .filter(|pair| pair[1] - pair[0] > threshold)
        .map(|pair| Interval {
            start: pair[0],
            end: pair[1],
        })
        .collect()
}
