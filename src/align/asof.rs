use chrono::NaiveDateTime;

/// as-of 결합 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsofDirection {
    /// 왼쪽 키 이하인 마지막 오른쪽 행
    Backward,
    /// 가장 가까운 오른쪽 행 (거리가 같으면 이전 행)
    Nearest,
}

/// 왼쪽 키마다 결합할 오른쪽 행의 index 를 찾습니다.
/// 두 키 배열 모두 오름차순이어야 합니다. 오른쪽이 비어 있으면 모두 None.
pub fn merge_asof(
    left: &[NaiveDateTime],
    right: &[NaiveDateTime],
    direction: AsofDirection,
) -> Vec<Option<usize>> {
    left.iter()
        .map(|key| {
            let count = right.partition_point(|r| r <= key);
            let backward = count.checked_sub(1);
            match direction {
                AsofDirection::Backward => backward,
                AsofDirection::Nearest => {
                    let forward = (count < right.len()).then_some(count);
                    match (backward, forward) {
                        (Some(b), Some(f)) => {
                            if *key - right[b] <= right[f] - *key {
                                Some(b)
                            } else {
                                Some(f)
                            }
                        }
                        (b, f) => b.or(f),
                    }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveDate};

    fn at(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 24)
            .unwrap()
            .and_hms_opt(14, 40, 0)
            .unwrap()
            + ChronoDuration::seconds(secs)
    }

    #[test]
    fn test_backward_picks_last_at_or_before() {
        let right = vec![at(10), at(20), at(20), at(30)];
        let left = vec![at(5), at(10), at(25), at(40)];
        assert_eq!(
            merge_asof(&left, &right, AsofDirection::Backward),
            vec![None, Some(0), Some(2), Some(3)]
        );
    }

    #[test]
    fn test_nearest_prefers_earlier_on_tie() {
        let right = vec![at(10), at(20), at(30)];
        let left = vec![at(0), at(15), at(16), at(29), at(100)];
        assert_eq!(
            merge_asof(&left, &right, AsofDirection::Nearest),
            vec![Some(0), Some(0), Some(1), Some(2), Some(2)]
        );
    }

    #[test]
    fn test_empty_right_side() {
        let left = vec![at(0)];
        assert_eq!(merge_asof(&left, &[], AsofDirection::Nearest), vec![None]);
        assert_eq!(merge_asof(&left, &[], AsofDirection::Backward), vec![None]);
    }
}
