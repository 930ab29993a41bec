//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! Uses population stddev (divide by N) over the trailing `period` values.

/// The three bands at the end of a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Bands {
    /// Distance from middle to either edge.
    pub fn half_width(&self) -> f64 {
        self.upper - self.middle
    }
}

/// Bands over the last `period` entries of `values`.
///
/// Two passes over the trailing window: mean, then variance.
/// `None` if the window is short or contains NaN.
pub fn bands<I>(values: I, period: usize, multiplier: f64) -> Option<Bands>
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: ExactSizeIterator + Clone,
{
    let values = values.into_iter();
    if period == 0 || values.len() < period {
        return None;
    }
    let skip = values.len() - period;
    let window = values.skip(skip);
    if window.clone().any(f64::is_nan) {
        return None;
    }
    let mean = window.clone().sum::<f64>() / period as f64;
    let variance = window
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;
    let stddev = variance.sqrt();
    Some(Bands {
        upper: mean + multiplier * stddev,
        middle: mean,
        lower: mean - multiplier * stddev,
    })
}
