use crate::data::models::DensityBin;

/// 경과 시간 (시간 단위) 의 분포를 고정 폭 구간으로 집계합니다.
///
/// `discard_before` 가 주어지면 그 값 이하의 데이터는 버립니다.
/// 구간 경계는 `min + k * bin_size` 이고 마지막 구간만 오른쪽 경계를 포함합니다.
pub fn density(values: &[f64], bin_size: f64, discard_before: Option<f64>) -> Vec<DensityBin> {
    let kept: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .filter(|v| discard_before.is_none_or(|limit| *v > limit))
        .collect();

    if kept.is_empty() || bin_size <= 0.0 {
        return Vec::new();
    }

    let min = kept.iter().copied().fold(f64::INFINITY, f64::min);
    let max = kept.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let bin_count = (((max - min) / bin_size).ceil() as usize).max(1);
    let mut counts = vec![0usize; bin_count];

    for v in &kept {
        let idx = (((v - min) / bin_size).floor() as usize).min(bin_count - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| DensityBin {
            bin_center: min + (i as f64 + 0.5) * bin_size,
            count,
        })
        .collect()
}
