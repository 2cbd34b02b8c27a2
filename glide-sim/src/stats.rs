//! Descriptive statistics over small samples.
use crate::numbers::{floor_f64_to_usize, usize_to_f64};

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Quantile `q` in `[0, 1]` with linear interpolation between order
/// statistics. `None` for an empty sample.
#[must_use]
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    Some(quantile_sorted(&sorted, q))
}

/// Several quantiles of one sample, sorting only once.
#[must_use]
pub fn quantiles(values: &[f64], qs: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    Some(qs.iter().map(|&q| quantile_sorted(&sorted, q)).collect())
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len() - 1;
    let position = q.clamp(0.0, 1.0) * usize_to_f64(last);
    let lower = floor_f64_to_usize(position).min(last);
    let upper = (lower + 1).min(last);
    let weight = position - usize_to_f64(lower);
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / usize_to_f64(values.len()))
}

/// Population standard deviation.
#[must_use]
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / usize_to_f64(values.len());
    Some(variance.sqrt())
}

#[must_use]
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().min_by(f64::total_cmp)
}

#[must_use]
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().max_by(f64::total_cmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert!(close(quantile(&values, 0.0).unwrap(), 1.0));
        assert!(close(quantile(&values, 1.0).unwrap(), 4.0));
        assert!(close(quantile(&values, 0.5).unwrap(), 2.5));
        assert!(close(quantile(&values, 0.9).unwrap(), 3.7));
        assert!(quantile(&[], 0.5).is_none());
    }

    #[test]
    fn single_value_quantiles_collapse() {
        let qs = quantiles(&[2.0], &[0.1, 0.5, 1.0]).unwrap();
        assert!(qs.iter().all(|&q| close(q, 2.0)));
    }

    #[test]
    fn summary_statistics() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(mean(&values).unwrap(), 5.0));
        assert!(close(std_dev(&values).unwrap(), 2.0));
        assert!(close(median(&values).unwrap(), 4.5));
        assert!(close(min(&values).unwrap(), 2.0));
        assert!(close(max(&values).unwrap(), 9.0));
        assert!(mean(&[]).is_none());
    }
}
