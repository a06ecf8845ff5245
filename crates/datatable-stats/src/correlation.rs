//! Pearson correlation between aligned numeric arrays

use crate::error::{StatsError, StatsResult};

/// Pearson product-moment correlation of `x` and `y`
///
/// Pairs where either side is non-finite are skipped. Fewer than two pairs,
/// or a constant side, yields NaN.
pub fn pearson(x: &[f64], y: &[f64]) -> StatsResult<f64> {
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }

    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();

    if pairs.len() < 2 {
        return Ok(f64::NAN);
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Ok(f64::NAN);
    }

    Ok((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Correlation of `columns[index]` against every entry of `columns`
///
/// `None` entries are non-numeric columns and yield NaN. The self entry is
/// exactly 1.0 when the column has at least two finite values.
pub fn correlation_row(columns: &[Option<&[f64]>], index: usize) -> Vec<f64> {
    let own = match columns.get(index).copied().flatten() {
        Some(values) => values,
        None => return vec![f64::NAN; columns.len()],
    };
    let finite = own.iter().filter(|v| v.is_finite()).count();

    columns
        .iter()
        .enumerate()
        .map(|(i, other)| match other {
            _ if finite < 2 => f64::NAN,
            _ if i == index => 1.0,
            Some(other) => pearson(own, other).unwrap_or(f64::NAN),
            None => f64::NAN,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_correlations() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let up = [2.0, 4.0, 6.0, 8.0];
        let down = [8.0, 6.0, 4.0, 2.0];

        assert!((pearson(&x, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(pearson(&[1.0], &[2.0]).unwrap().is_nan());
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).unwrap().is_nan());
        assert!(pearson(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_correlation_row() {
        let a = [1.0, 2.0, 3.0];
        let b = [3.0, 2.0, 1.0];
        let columns = vec![Some(&a[..]), None, Some(&b[..])];

        let row = correlation_row(&columns, 0);
        assert_eq!(row[0], 1.0);
        assert!(row[1].is_nan());
        assert!((row[2] + 1.0).abs() < 1e-12);

        let row = correlation_row(&columns, 1);
        assert!(row.iter().all(|c| c.is_nan()));
    }

    #[test]
    fn test_self_correlation_needs_two_values() {
        let a = [1.0];
        let row = correlation_row(&[Some(&a[..])], 0);
        assert!(row[0].is_nan());
    }

    #[test]
    fn test_self_correlation_ignores_missing_values() {
        let one_finite = [1.0, f64::NAN];
        let row = correlation_row(&[Some(&one_finite[..])], 0);
        assert!(row[0].is_nan());

        let two_finite = [1.0, f64::NAN, 3.0];
        let row = correlation_row(&[Some(&two_finite[..])], 0);
        assert_eq!(row[0], 1.0);
    }
}
