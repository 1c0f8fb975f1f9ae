use statrs::distribution::{ContinuousCDF, StudentsT};

/// Fewest observations a regression is attempted on.
pub const MIN_OBSERVATIONS: usize = 3;

/// Ordinary least squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub n: usize,
    pub intercept: f64,
    pub slope: f64,
    /// `None` for a perfect fit.
    pub slope_std_err: Option<f64>,
    pub t_stat: Option<f64>,
    /// Two-sided p-value of the slope, Student-t with `n - 2` degrees of freedom.
    pub p_value: Option<f64>,
    /// `None` when `y` has no variance.
    pub r_squared: Option<f64>,
}

/// Fit `y ~ const + x`. `None` when there are too few points or `x` is constant.
///
/// ```rust
/// use holdings_spider::analysis::regression::ols;
///
/// let fit = ols(&[1.0, 2.0, 3.0, 4.0], &[3.0, 5.0, 7.0, 9.0]).unwrap();
/// assert!((fit.slope - 2.0).abs() < 1e-12);
/// assert!((fit.intercept - 1.0).abs() < 1e-12);
/// ```
pub fn ols(x: &[f64], y: &[f64]) -> Option<Regression> {
    let n = x.len().min(y.len());
    if n < MIN_OBSERVATIONS {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let sxx: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    let sst: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (yi - intercept - slope * xi).powi(2))
        .sum();

    let slope_std_err = Some((sse / (n - 2) as f64 / sxx).sqrt()).filter(|se| *se > 0.0);
    let t_stat = slope_std_err.map(|se| slope / se);

    Some(Regression {
        n,
        intercept,
        slope,
        slope_std_err,
        t_stat,
        p_value: t_stat.and_then(|t| two_sided_p_value(t, (n - 2) as f64)),
        r_squared: (sst > 0.0).then(|| 1.0 - sse / sst),
    })
}

/// `P(|T| >= |t|)` for a Student-t with `freedom` degrees of freedom.
///
/// ```rust
/// use holdings_spider::analysis::regression::two_sided_p_value;
///
/// // 97.5th percentile of t(3)
/// let p = two_sided_p_value(3.182446305284263, 3.0).unwrap();
/// assert!((p - 0.05).abs() < 1e-6);
/// ```
pub fn two_sided_p_value(t: f64, freedom: f64) -> Option<f64> {
    let dist = StudentsT::new(0.0, 1.0, freedom).ok()?;
    Some(2.0 * (1.0 - dist.cdf(t.abs())))
}

/// Quarter-on-quarter holding change as `log10(1 + pct_change / 100)`, rounded to 2 decimals.
///
/// A change needs both the current and previous value; the first entry is always `None`.
///
/// ```rust
/// use holdings_spider::analysis::regression::log_changes;
///
/// let changes = log_changes(&[Some(1.0), Some(10.0), None, Some(5.0), Some(50.0)]);
/// assert_eq!(changes, vec![None, Some(1.0), None, None, Some(1.0)]);
/// ```
pub fn log_changes(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut changes = Vec::with_capacity(values.len());
    changes.push(None);
    for pair in values.windows(2) {
        let change = match (pair[0], pair[1]) {
            (Some(prev), Some(curr)) if prev != 0.0 && curr / prev > 0.0 => {
                Some(round2((curr / prev).log10()))
            }
            _ => None,
        };
        changes.push(change);
    }
    changes.truncate(values.len());
    changes
}

/// Replace every `None` with the mean of the present values; `None` if nothing is present.
pub fn fill_mean(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    Some(values.iter().map(|value| value.unwrap_or(mean)).collect())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
