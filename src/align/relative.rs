use chrono::{Duration as ChronoDuration, NaiveDateTime};

use crate::config::SegmentBounds;
use crate::utils::Logger;

/// 연속된 두 경계 (예: 공구 교체) 사이의 구간
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// `(start, end]` 에 속하는 대상 이벤트 수
    pub event_count: usize,
    pub duration: ChronoDuration,
}

/// 구간 시작 기준 경과 시간과 값
#[derive(Debug, Clone, PartialEq)]
pub struct RelativePoint<V> {
    pub relative_time: ChronoDuration,
    pub value: V,
}

impl<V> RelativePoint<V> {
    pub fn relative_hours(&self) -> f64 {
        self.relative_time.num_milliseconds() as f64 / 3_600_000.0
    }
}

/// 오름차순 슬라이스에서 `(start, end]` 범위의 index 구간
fn half_open_range<T, F>(
    items: &[T],
    start: NaiveDateTime,
    end: NaiveDateTime,
    key: F,
) -> (usize, usize)
where
    F: Fn(&T) -> NaiveDateTime,
{
    let lower = items.partition_point(|item| key(item) <= start);
    let upper = items.partition_point(|item| key(item) <= end);
    (lower, upper.max(lower))
}

/// 경계 시각들로 구간을 나누고 각 구간의 이벤트 수와 길이를 계산합니다.
/// `boundaries` 와 `targets` 는 오름차순이어야 합니다.
pub fn segments(boundaries: &[NaiveDateTime], targets: &[NaiveDateTime]) -> Vec<Segment> {
    boundaries
        .windows(2)
        .map(|pair| {
            let (lower, upper) = half_open_range(targets, pair[0], pair[1], |t| *t);
            Segment {
                start: pair[0],
                end: pair[1],
                event_count: upper - lower,
                duration: pair[1] - pair[0],
            }
        })
        .collect()
}

/// 유효한 구간 안의 보조 시계열 값을 구간 시작 기준 경과 시간으로 변환합니다.
///
/// 구간은 이벤트 수가 `[min_events, max_events]` 안에 있고
/// 길이가 `max_duration_secs` 미만일 때만 채택되며, 조건을 벗어난 구간은 통째로 버립니다.
pub fn project_relative<V: Clone>(
    boundaries: &[NaiveDateTime],
    targets: &[NaiveDateTime],
    auxiliary: &[(NaiveDateTime, V)],
    bounds: &SegmentBounds,
    logger: &Logger,
) -> Vec<RelativePoint<V>> {
    let mut points = Vec::new();
    let mut rejected = 0;

    for segment in segments(boundaries, targets) {
        if !bounds.accepts(segment.event_count, segment.duration) {
            logger.debug(format!(
                "구간 제외: {} ~ {} (이벤트 {}개, {}분)",
                segment.start,
                segment.end,
                segment.event_count,
                segment.duration.num_minutes()
            ));
            rejected += 1;
            continue;
        }

        let (lower, upper) = half_open_range(auxiliary, segment.start, segment.end, |(ts, _)| *ts);
        points.extend(auxiliary[lower..upper].iter().map(|(ts, value)| RelativePoint {
            relative_time: *ts - segment.start,
            value: value.clone(),
        }));
    }

    logger.debug(format!(
        "구간 {}개 제외, 데이터 포인트 {}개 생성",
        rejected,
        points.len()
    ));

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    fn project<V: Clone>(
        boundaries: &[NaiveDateTime],
        targets: &[NaiveDateTime],
        aux: &[(NaiveDateTime, V)],
        bounds: &SegmentBounds,
    ) -> Vec<RelativePoint<V>> {
        project_relative(boundaries, targets, aux, bounds, &Logger::default())
    }

    fn bounds(min_events: usize, max_events: usize, max_hours: i64) -> SegmentBounds {
        SegmentBounds {
            min_events,
            max_events,
            max_duration_secs: max_hours * 3600,
        }
    }

    #[test]
    fn test_valid_segment_projects_relative_time() {
        let boundaries = vec![t0(), t0() + ChronoDuration::hours(2)];
        let aux = vec![
            (t0() + ChronoDuration::minutes(10), 5),
            (t0() + ChronoDuration::minutes(50), 9),
        ];
        let targets: Vec<NaiveDateTime> = aux.iter().map(|(ts, _)| *ts).collect();

        let points = project(&boundaries, &targets, &aux, &bounds(1, 5, 6));
        assert_eq!(
            points,
            vec![
                RelativePoint {
                    relative_time: ChronoDuration::minutes(10),
                    value: 5
                },
                RelativePoint {
                    relative_time: ChronoDuration::minutes(50),
                    value: 9
                },
            ]
        );
        assert!((points[1].relative_hours() - 50.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_outside_count_bound_is_dropped() {
        let boundaries = vec![t0(), t0() + ChronoDuration::hours(2)];
        let targets: Vec<NaiveDateTime> = (0..8000)
            .map(|i| t0() + ChronoDuration::milliseconds(1 + i * 900))
            .collect();
        let aux = vec![(t0() + ChronoDuration::minutes(30), 0.25)];

        let points = project(&boundaries, &targets, &aux, &bounds(2500, 3500, 12));
        assert!(points.is_empty());
    }

    #[test]
    fn test_boundaries_are_exclusive_at_start_inclusive_at_end() {
        let b = vec![t0(), t0() + ChronoDuration::hours(1), t0() + ChronoDuration::hours(2)];
        let targets = vec![t0(), b[1], b[1] + ChronoDuration::minutes(1)];
        let segs = segments(&b, &targets);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].event_count, 1);
        assert_eq!(segs[1].event_count, 1);
        assert_eq!(segs[0].duration, ChronoDuration::hours(1));

        let aux = vec![(t0(), "start"), (b[1], "boundary"), (b[2], "end")];
        let points = project(&b, &targets, &aux, &bounds(1, 1, 12));
        let values: Vec<&str> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec!["boundary", "end"]);
        assert_eq!(points[0].relative_time, ChronoDuration::hours(1));
        assert_eq!(points[1].relative_time, ChronoDuration::hours(1));
    }

    #[test]
    fn test_duration_at_maximum_is_rejected() {
        let b = vec![t0(), t0() + ChronoDuration::hours(12)];
        let targets = vec![t0() + ChronoDuration::hours(1)];
        let aux = vec![(t0() + ChronoDuration::hours(1), 1.0)];
        assert!(project(&b, &targets, &aux, &bounds(1, 5, 12)).is_empty());
        assert_eq!(project(&b, &targets, &aux, &bounds(1, 5, 13)).len(), 1);
    }

    #[test]
    fn test_fewer_than_two_boundaries_yield_nothing() {
        let aux = vec![(t0(), 1)];
        assert!(project(&[t0()], &[t0()], &aux, &bounds(0, 5, 12)).is_empty());
        assert!(segments(&[], &[]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_segments_are_all_or_nothing(
            gaps in prop::collection::vec(1i64..600, 1..8),
            mut target_offsets in prop::collection::vec(0i64..4000, 0..80),
            min_events in 0usize..10,
            span in 0usize..10,
            max_minutes in 1i64..600,
        ) {
            let mut boundaries = vec![t0()];
            for g in &gaps {
                let last = *boundaries.last().unwrap();
                boundaries.push(last + ChronoDuration::minutes(*g));
            }
            target_offsets.sort();
            let aux: Vec<(NaiveDateTime, i64)> = target_offsets
                .iter()
                .map(|o| (t0() + ChronoDuration::minutes(*o), *o))
                .collect();
            let targets: Vec<NaiveDateTime> = aux.iter().map(|(ts, _)| *ts).collect();
            let b = SegmentBounds {
                min_events,
                max_events: min_events + span,
                max_duration_secs: max_minutes * 60,
            };

            let points = project_relative(&boundaries, &targets, &aux, &b, &Logger::default());

            let mut expected = 0;
            for seg in segments(&boundaries, &targets) {
                let inside = aux.iter().filter(|(ts, _)| *ts > seg.start && *ts <= seg.end).count();
                prop_assert_eq!(inside, seg.event_count);
                if b.accepts(seg.event_count, seg.duration) {
                    expected += inside;
                }
            }
            prop_assert_eq!(points.len(), expected);
            for p in &points {
                prop_assert!(p.relative_time >= ChronoDuration::zero());
                prop_assert!(p.relative_time < ChronoDuration::minutes(max_minutes));
            }
        }
    }
}
