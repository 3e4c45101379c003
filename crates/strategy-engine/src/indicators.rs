/// Rolling simple moving average with a minimum of one observation: before
/// `window` points have accumulated, the mean of however many trailing points
/// exist is used. Output has the same length as the input.
pub fn rolling_mean(data: &[f64], window: usize) -> Vec<f64> {
    let mut result = Vec::with_capacity(data.len());
    let mut sum = 0.0;
    for i in 0..data.len() {
        sum += data[i];
        if i >= window {
            sum -= data[i - window];
        }
        let count = (i + 1).min(window);
        result.push(sum / count as f64);
    }
    result
}

/// Recursive exponential moving average over `span` periods:
/// `ema[t] = (1 - alpha) * ema[t-1] + alpha * x[t]` with
/// `alpha = 2 / (span + 1)`, seeded at the first finite observation.
///
/// Output positions before `min_periods` finite observations have been seen
/// are NaN, as are positions before the seed. Leading NaNs in the input are
/// skipped; the recursion starts at the first finite value.
pub fn ewm_mean(data: &[f64], span: usize, min_periods: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    let mut ema: Option<f64> = None;
    let mut observed = 0usize;

    for &x in data {
        if x.is_nan() {
            result.push(f64::NAN);
            continue;
        }
        let value = match ema {
            None => x,
            Some(prev) => (1.0 - alpha) * prev + alpha * x,
        };
        ema = Some(value);
        observed += 1;
        result.push(if observed >= min_periods { value } else { f64::NAN });
    }
    result
}
