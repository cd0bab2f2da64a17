use chrono::{Duration as ChronoDuration, NaiveDateTime};
use color_eyre::eyre::{bail, Result};

use crate::config::MatcherConfig;
use crate::data::utils::is_ascending;
use crate::utils::{self, Logger};

/// 생산 시각 배열을 최신 → 과거 순서로 읽는 뷰.
/// 매칭은 "뒤에서부터" 진행되므로 walk index 0 이 가장 최근 생산 시각입니다.
struct ReverseWalk<'a> {
    references: &'a [NaiveDateTime],
}

impl<'a> ReverseWalk<'a> {
    fn len(&self) -> usize {
        self.references.len()
    }

    fn at(&self, walk_index: usize) -> NaiveDateTime {
        self.references[self.to_ascending(walk_index)]
    }

    fn to_ascending(&self, walk_index: usize) -> usize {
        self.references.len() - 1 - walk_index
    }

    /// `limit` 이후 (과거 방향) 에서 처음으로 `event` 이하인 생산 시각
    fn first_at_or_before(&self, limit: usize, event: NaiveDateTime) -> Option<usize> {
        let ascending_limit = self.to_ascending(limit);
        let count = self.references[..=ascending_limit].partition_point(|r| *r <= event);
        count.checked_sub(1).map(|asc| self.to_ascending(asc))
    }
}

/// 설정에서 한 번만 변환해 두는 시간 임계값
#[derive(Debug, Clone, Copy)]
struct GapLimits {
    step: usize,
    soft_gap: ChronoDuration,
    max_gap: ChronoDuration,
    resync_window: ChronoDuration,
}

impl GapLimits {
    fn from_config(config: &MatcherConfig) -> Result<Self> {
        Ok(Self {
            step: config.step,
            soft_gap: config.soft_gap()?,
            max_gap: config.max_gap()?,
            resync_window: config.resync_window()?,
        })
    }
}

/// fold 로 전달되는 매칭 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MatchCursor {
    /// 다음 탐색의 기준이 되는 walk index (len 이면 끝까지 소진된 상태)
    index: usize,
    /// 직전에 처리한 측정 시각
    previous: Option<NaiveDateTime>,
}

/// 측정 이벤트마다 그 이전의 가장 가까운 생산 시각을 찾습니다.
///
/// 두 시계열 모두 오름차순이어야 하며, 결과는 `events` 와 같은 순서로 반환됩니다.
/// 찾지 못한 이벤트는 `None` 이고 배치 전체를 중단하지 않습니다.
///
/// 탐색은 최신 측정부터 과거 방향으로 진행하면서 커서를 유지합니다.
/// 측정 간격이 `soft_gap` 을 넘으면 커서를 재동기화하고 (`max_gap` 초과 시 같은 날짜 기준,
/// 아니면 `resync_window` 이내의 생산 시각 기준), 커서에서 `step` 만큼 건너뛴 뒤
/// 이벤트 이하인 생산 시각이 나올 때까지 과거로 이동합니다. 찾은 값이 다른 날짜면
/// 이벤트를 넘지 않는 범위에서 최근 방향으로 되돌아가고,
/// 그래도 같은 날짜가 아니면 매칭하지 않습니다.
pub fn assign_backward(
    events: &[NaiveDateTime],
    references: &[NaiveDateTime],
    config: &MatcherConfig,
    logger: &Logger,
) -> Result<Vec<Option<NaiveDateTime>>> {
    if !is_ascending(events) {
        bail!("Event timestamps must be sorted ascending before matching");
    }
    if !is_ascending(references) {
        bail!("Reference timestamps must be sorted ascending before matching");
    }
    let limits = GapLimits::from_config(config)?;
    if references.is_empty() {
        logger.debug("생산 시각이 비어 있어 모든 측정이 매칭되지 않습니다");
        return Ok(vec![None; events.len()]);
    }

    let walk = ReverseWalk { references };
    let pb = utils::create_progress_bar(events.len() as u64, "Matching measurements...");

    let (_, mut matches) = events.iter().rev().fold(
        (MatchCursor::default(), Vec::with_capacity(events.len())),
        |(cursor, mut matches), &event| {
            let (next, matched) = advance(cursor, event, &walk, &limits, logger);
            matches.push(matched);
            pb.inc(1);
            (next, matches)
        },
    );

    pb.finish_and_clear();
    matches.reverse();

    let unmatched = matches.iter().filter(|m| m.is_none()).count();
    logger.debug(format!(
        "매칭 완료: {}개 중 {}개 매칭 실패",
        matches.len(),
        unmatched
    ));

    Ok(matches)
}

fn advance(
    cursor: MatchCursor,
    event: NaiveDateTime,
    walk: &ReverseWalk<'_>,
    limits: &GapLimits,
    logger: &Logger,
) -> (MatchCursor, Option<NaiveDateTime>) {
    let mut start = cursor.index;

    if let Some(previous) = cursor.previous {
        let gap = if previous >= event {
            previous - event
        } else {
            event - previous
        };
        if gap > limits.soft_gap {
            start = resync_index(walk, event, gap > limits.max_gap, limits.resync_window);
            logger.debug(format!(
                "재동기화: {} (간격 {}분) → {}",
                event,
                gap.num_minutes(),
                walk.at(start)
            ));
        }
    }

    let last = walk.len() - 1;
    let target = start.saturating_add(limits.step).min(last);

    let Some(mut index) = walk.first_at_or_before(target, event) else {
        logger.debug(format!("{} 이전의 생산 시각 없음", event));
        let next = MatchCursor {
            index: walk.len(),
            previous: Some(event),
        };
        return (next, None);
    };

    // 다른 날짜로 넘어간 경우 이벤트를 넘지 않는 범위에서 최근 방향으로 되돌아갑니다.
    // 날짜 비교는 24시간 간격이 아니라 달력 날짜 기준이라 자정을 넘긴 매칭은 만들지 않습니다.
    while index > 0 && days_between(walk.at(index), event) >= 1 && walk.at(index - 1) <= event {
        index -= 1;
    }

    let next = MatchCursor {
        index,
        previous: Some(event),
    };
    let candidate = walk.at(index);
    if days_between(candidate, event) >= 1 {
        logger.debug(format!(
            "{} 와 같은 날짜의 생산 시각 없음 (가장 가까운 값: {})",
            event, candidate
        ));
        return (next, None);
    }

    (next, Some(candidate))
}

/// 재동기화 위치 (walk index).
/// `beyond_max_gap` 이면 이벤트와 같은 날짜의 첫 생산 시각, 아니면 `window` 이내의 첫 생산 시각.
/// 해당하는 값이 없으면 마지막 index 를 반환합니다.
fn resync_index(
    walk: &ReverseWalk<'_>,
    event: NaiveDateTime,
    beyond_max_gap: bool,
    window: ChronoDuration,
) -> usize {
    let references = walk.references;
    let last = walk.len() - 1;

    if beyond_max_gap {
        let date = event.date();
        let count = references.partition_point(|r| r.date() <= date);
        return match count.checked_sub(1) {
            Some(asc) if references[asc].date() == date => walk.to_ascending(asc),
            _ => last,
        };
    }

    let count = references.partition_point(|r| *r < event + window);
    match count.checked_sub(1) {
        Some(asc) if references[asc] > event - window => walk.to_ascending(asc),
        _ => last,
    }
}

fn days_between(earlier: NaiveDateTime, later: NaiveDateTime) -> i64 {
    (later.date() - earlier.date()).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn ts(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn minutes(day: u32, h: u32, from: u32, to: u32) -> Vec<NaiveDateTime> {
        (from..=to).map(|m| ts(day, h, m, 0)).collect()
    }

    fn config(step: usize) -> MatcherConfig {
        MatcherConfig {
            step,
            ..MatcherConfig::default()
        }
    }

    #[test]
    fn test_unsorted_input_is_rejected() {
        let refs = minutes(23, 10, 0, 5);
        let events = vec![ts(23, 10, 3, 0), ts(23, 10, 1, 0)];
        assert!(assign_backward(&events, &refs, &config(0), &Logger::default()).is_err());

        let mut refs_desc = refs.clone();
        refs_desc.reverse();
        let events = [ts(23, 10, 3, 0)];
        assert!(assign_backward(&events, &refs_desc, &config(0), &Logger::default()).is_err());
    }

    #[test]
    fn test_empty_references_leave_events_unmatched() {
        let events = vec![ts(23, 10, 3, 0), ts(23, 10, 4, 0)];
        let result = assign_backward(&events, &[], &config(0), &Logger::default()).unwrap();
        assert_eq!(result, vec![None, None]);
    }

    #[test]
    fn test_event_before_all_references_is_unmatched() {
        let refs = minutes(23, 10, 0, 5);
        let events = vec![ts(23, 9, 59, 0), ts(23, 10, 2, 30)];
        let result = assign_backward(&events, &refs, &config(0), &Logger::default()).unwrap();
        assert_eq!(result, vec![None, Some(ts(23, 10, 2, 0))]);
    }

    #[test]
    fn test_step_skips_references_after_previous_match() {
        let refs = minutes(23, 10, 0, 59);
        let events = vec![ts(23, 10, 30, 30), ts(23, 10, 44, 30), ts(23, 10, 45, 30)];
        let result = assign_backward(&events, &refs, &config(2), &Logger::default()).unwrap();
        // 10:45:30 → 커서 0 + 2 (10:57) 에서 과거로 이동해 10:45
        // 10:44:30 → 10:45 (walk 14) + 2 = 10:43, 이미 이벤트 이하이므로 그대로 사용
        // 10:30:30 → 10:43 (walk 16) + 2 = 10:41 에서 10:30 까지 이동
        assert_eq!(
            result,
            vec![
                Some(ts(23, 10, 30, 0)),
                Some(ts(23, 10, 43, 0)),
                Some(ts(23, 10, 45, 0))
            ]
        );
    }

    #[test]
    fn test_match_never_crosses_into_previous_day() {
        // 23일 08:00~08:10, 24일 08:00, 08:01
        let mut refs = minutes(23, 8, 0, 10);
        refs.extend(minutes(24, 8, 0, 1));
        let events = vec![ts(23, 8, 9, 30), ts(24, 8, 1, 30)];

        let result = assign_backward(&events, &refs, &config(5), &Logger::default()).unwrap();
        // 24일 이벤트는 step 으로 23일 08:07 까지 밀려나지만
        // 같은 날짜인 24일 08:00 으로 되돌아갑니다.
        // 23일 이벤트는 간격이 max_gap 을 넘으므로 23일의 첫 생산 시각 (08:10) 으로 재동기화 후 +5.
        assert_eq!(result, vec![Some(ts(23, 8, 5, 0)), Some(ts(24, 8, 0, 0))]);
    }

    #[test]
    fn test_no_same_day_reference_leaves_event_unmatched() {
        let refs = minutes(23, 23, 50, 59);
        let events = vec![ts(24, 0, 5, 0)];
        let result = assign_backward(&events, &refs, &config(0), &Logger::default()).unwrap();
        assert_eq!(result, vec![None]);
    }

    #[test]
    fn test_reference_just_before_midnight_is_not_matched() {
        // 23:59 → 00:05 는 6분 차이지만 날짜가 다르므로 매칭하지 않습니다.
        let refs = vec![ts(23, 23, 59, 0), ts(24, 0, 10, 0)];
        let events = vec![ts(24, 0, 5, 0), ts(24, 0, 12, 0)];
        let result = assign_backward(&events, &refs, &config(0), &Logger::default()).unwrap();
        assert_eq!(result, vec![None, Some(ts(24, 0, 10, 0))]);

        let result = assign_backward(&events[..1], &refs[..1], &config(0), &Logger::default());
        assert_eq!(result.unwrap(), vec![None]);
    }

    #[test]
    fn test_invalid_config_is_rejected_before_matching() {
        let refs = minutes(23, 10, 0, 5);
        let events = vec![ts(23, 10, 3, 0)];
        let bad = MatcherConfig {
            soft_gap_secs: -5,
            ..MatcherConfig::default()
        };
        assert!(assign_backward(&events, &refs, &bad, &Logger::default()).is_err());
        assert!(assign_backward(&events, &[], &bad, &Logger::default()).is_err());
    }

    #[test]
    fn test_resync_index_by_date_and_window() {
        let mut refs = minutes(23, 8, 0, 10);
        refs.extend(minutes(24, 8, 0, 1));
        let walk = ReverseWalk { references: &refs };
        let window = ChronoDuration::minutes(50);

        // 같은 날짜의 첫 (가장 최근) 생산 시각
        let idx = resync_index(&walk, ts(23, 20, 0, 0), true, window);
        assert_eq!(walk.at(idx), ts(23, 8, 10, 0));
        // 해당 날짜가 없으면 마지막 index
        let idx = resync_index(&walk, ts(25, 8, 0, 0), true, window);
        assert_eq!(idx, refs.len() - 1);

        // window 이내의 가장 최근 생산 시각
        let idx = resync_index(&walk, ts(23, 8, 30, 0), false, window);
        assert_eq!(walk.at(idx), ts(23, 8, 10, 0));
        let idx = resync_index(&walk, ts(23, 12, 0, 0), false, window);
        assert_eq!(idx, refs.len() - 1);
    }

    #[test]
    fn test_soft_gap_resync_uses_window() {
        let mut refs = minutes(23, 6, 0, 10);
        refs.extend(minutes(23, 12, 0, 10));
        let events = vec![ts(23, 6, 5, 30), ts(23, 12, 9, 30)];
        // step 8: 12:09:30 → walk 8 (12:02); 6시간 간격 (soft 초과, max 이하) 이므로
        // 06:05:30 은 ±50분 이내의 최신 시각 06:10 으로 재동기화 후 +8 → 06:02
        let result = assign_backward(&events, &refs, &config(8), &Logger::default()).unwrap();
        assert_eq!(result, vec![Some(ts(23, 6, 2, 0)), Some(ts(23, 12, 2, 0))]);
    }

    proptest! {
        #[test]
        fn prop_step_zero_matches_nearest_earlier_reference(
            n_refs in 2usize..400,
            offsets in prop::collection::vec(0i64..24_000, 1..40),
        ) {
            let start = ts(23, 6, 0, 0);
            let refs: Vec<NaiveDateTime> =
                (0..n_refs).map(|i| start + ChronoDuration::minutes(i as i64)).collect();
            let last = *refs.last().unwrap();
            let mut events: Vec<NaiveDateTime> = offsets
                .iter()
                .map(|s| start + ChronoDuration::seconds(*s))
                .filter(|e| *e <= last)
                .collect();
            events.sort();

            let result = assign_backward(&events, &refs, &config(0), &Logger::default()).unwrap();
            prop_assert_eq!(result.len(), events.len());
            for (event, matched) in events.iter().zip(&result) {
                let expected = refs.iter().rev().find(|r| *r <= event).copied();
                prop_assert_eq!(*matched, expected);
            }
        }

        #[test]
        fn prop_matches_are_earlier_and_same_day(
            ref_offsets in prop::collection::vec(0i64..259_200, 1..200),
            event_offsets in prop::collection::vec(0i64..259_200, 0..60),
            step in 0usize..80,
        ) {
            let start = ts(22, 0, 0, 0);
            let mut refs: Vec<NaiveDateTime> =
                ref_offsets.iter().map(|s| start + ChronoDuration::seconds(*s)).collect();
            refs.sort();
            let mut events: Vec<NaiveDateTime> =
                event_offsets.iter().map(|s| start + ChronoDuration::seconds(*s)).collect();
            events.sort();

            let result =
                assign_backward(&events, &refs, &config(step), &Logger::default()).unwrap();
            for (event, matched) in events.iter().zip(&result) {
                if let Some(matched) = matched {
                    prop_assert!(matched <= event);
                    prop_assert_eq!(matched.date(), event.date());
                    prop_assert!(refs.contains(matched));
                }
            }
        }
    }
}
