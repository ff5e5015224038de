/// Rank Correlation Index (RCI) series
///
/// For each trailing window of `period` closes, computes the Spearman
/// rank correlation between the closes in chronological order and the
/// reference ranking `period, period-1, ..., 1` (most recent ranked
/// first), scaled by 100. Indices below `period - 1` are NaN.
///
/// Sign convention: the reference ranking favors recency, so a strictly
/// rising window yields -100 and a strictly falling window +100.
pub fn rci_series(closes: &[f64], period: usize) -> Vec<f64> {
    if closes.is_empty() || period == 0 {
        return Vec::new();
    }

    let mut series = vec![f64::NAN; closes.len()];
    if closes.len() < period {
        return series;
    }

    let reference: Vec<f64> = (1..=period).rev().map(|r| r as f64).collect();
    let reference_ranks = rank(&reference);

    for i in (period - 1)..closes.len() {
        let window = &closes[i + 1 - period..=i];
        let window_ranks = rank(window);
        series[i] = pearson(&window_ranks, &reference_ranks) * 100.0;
    }

    series
}

/// Assign 1-based ranks, averaging over ties
fn rank(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        // Tied values share the average of the ranks they span
        let avg_rank = (start + end) as f64 / 2.0 + 1.0;
        for &index in &order[start..=end] {
            ranks[index] = avg_rank;
        }
        start = end + 1;
    }

    ranks
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        covariance += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }

    covariance / (var_a.sqrt() * var_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Golden test pinning the sign convention: rising closes rank
    // opposite to the recency-favoring reference, so RCI = -100.
    #[test]
    fn test_strictly_rising_closes_give_minus_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let rci = rci_series(&closes, 9);

        assert!((rci[19] - -100.0).abs() < 1e-9);
    }

    #[test]
    fn test_strictly_falling_closes_give_plus_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let rci = rci_series(&closes, 9);

        assert!((rci[19] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_warm_up_is_nan() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let rci = rci_series(&closes, 9);

        for value in &rci[..8] {
            assert!(value.is_nan());
        }
        assert!(!rci[8].is_nan());
    }

    #[test]
    fn test_rci_bounded() {
        let closes = vec![
            100.0, 103.0, 101.0, 104.0, 102.0, 105.0, 103.0, 106.0, 104.0, 107.0,
        ];
        let rci = rci_series(&closes, 5);

        for value in rci.iter().filter(|v| !v.is_nan()) {
            assert!(*value >= -100.0 - 1e-9 && *value <= 100.0 + 1e-9);
        }
    }

    #[test]
    fn test_rank_averages_ties() {
        let ranks = rank(&[10.0, 20.0, 20.0, 30.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
    }

    #[test]
    fn test_rci_empty_input() {
        assert!(rci_series(&[], 9).is_empty());
    }
}
