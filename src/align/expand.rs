use chrono::{Duration as ChronoDuration, NaiveDateTime};
use rayon::prelude::*;

/// 생산 시각이 매칭된 행
#[derive(Debug, Clone, PartialEq)]
pub struct Matched<T> {
    pub payload: T,
    pub reference: Option<NaiveDateTime>,
}

impl<T> Matched<T> {
    pub fn new(payload: T, reference: Option<NaiveDateTime>) -> Self {
        Self { payload, reference }
    }
}

/// 매칭된 생산 시각 ±`window` (경계 포함) 안의 모든 생산 시각으로 행을 펼칩니다.
/// 나머지 필드는 그대로 복사하고 생산 시각만 바꿉니다. 매칭되지 않은 행은 사라집니다.
/// `references` 는 오름차순이어야 하며 출력 순서는 입력 순서를 따릅니다.
pub fn expand_neighbors<T>(
    rows: &[Matched<T>],
    references: &[NaiveDateTime],
    window: ChronoDuration,
) -> Vec<Matched<T>>
where
    T: Clone + Send + Sync,
{
    rows.par_iter()
        .flat_map_iter(|row| {
            let neighbors: &[NaiveDateTime] = match row.reference {
                Some(ts) => neighbors_within(references, ts, window),
                None => &[],
            };
            neighbors
                .iter()
                .map(move |n| Matched::new(row.payload.clone(), Some(*n)))
        })
        .collect()
}

/// `[center - window, center + window]` 범위의 생산 시각
pub fn neighbors_within(
    references: &[NaiveDateTime],
    center: NaiveDateTime,
    window: ChronoDuration,
) -> &[NaiveDateTime] {
    let lower = references.partition_point(|r| *r < center - window);
    let upper = references.partition_point(|r| *r <= center + window);
    &references[lower..upper.max(lower)]
}
