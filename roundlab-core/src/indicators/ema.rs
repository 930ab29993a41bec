//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1]
//! Seed: EMA[period-1] = SMA of the first `period` values.

/// Final EMA value over `values`, consumed in one pass.
///
/// `None` if there are fewer than `period` values or any value is NaN.
pub fn last_ema<I>(values: I, period: usize) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    if period == 0 {
        return None;
    }
    let mut values = values.into_iter();
    let mut seed = 0.0;
    for _ in 0..period {
        let v = values.next()?;
        if v.is_nan() {
            return None;
        }
        seed += v;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut ema = seed / period as f64;
    for v in values {
        if v.is_nan() {
            return None;
        }
        ema = alpha * v + (1.0 - alpha) * ema;
    }
    Some(ema)
}
