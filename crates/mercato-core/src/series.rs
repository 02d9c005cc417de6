//! Append-only price history with a capped-window trend estimator.

/// Ordered, append-only sequence of past market prices.
///
/// The series grows by one price per step. Its only derived statistic is
/// [`slope`], a finite-difference trend over a bounded lookback window --
/// not a regression.
///
/// [`slope`]: PriceSeries::slope
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    values: Vec<f64>,
}

impl PriceSeries {
    /// Create a series seeded with the initial market price.
    pub fn new(initial: f64) -> Self {
        Self {
            values: vec![initial],
        }
    }

    /// Append a price observation.
    pub fn push(&mut self, price: f64) {
        self.values.push(price);
    }

    /// Number of recorded prices.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series holds no prices.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The most recent price, if any.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Finite-difference price trend over at most `window` steps.
    ///
    /// When the series is longer than the window the slope is
    /// `(last - value_at(len - window)) / (window * dt)`; otherwise it falls
    /// back to `(last - first) / (len * dt)`. An empty series has slope 0.
    pub fn slope(&self, window: u32, dt: f64) -> f64 {
        let Some(&last) = self.values.last() else {
            return 0.0;
        };
        let len = self.values.len();
        let window_len = usize::try_from(window).unwrap_or(usize::MAX);

        if len > window_len {
            let base = self
                .values
                .get(len.saturating_sub(window_len))
                .copied()
                .unwrap_or(last);
            (last - base) / (f64::from(window) * dt)
        } else {
            let first = self.values.first().copied().unwrap_or(last);
            let steps = u32::try_from(len).unwrap_or(u32::MAX);
            (last - first) / (f64::from(steps) * dt)
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn single_price_has_zero_slope() {
        let series = PriceSeries::new(10.0);
        assert_relative_eq!(series.slope(20, 0.1), 0.0);
    }

    #[test]
    fn short_series_uses_full_span() {
        // [10.0, 10.1, ..., 10.9]: 10 elements, window 20 not yet reached.
        let mut series = PriceSeries::new(10.0);
        for i in 1..10_u32 {
            series.push(f64::from(i).mul_add(0.1, 10.0));
        }
        assert_eq!(series.len(), 10);
        // (10.9 - 10.0) / (10 * 0.1)
        assert_relative_eq!(series.slope(20, 0.1), 0.9, max_relative = 1e-12);
    }

    #[test]
    fn long_series_caps_at_window() {
        // [10.0, 10.1, ..., 12.4]: 25 elements in constant 0.1 increments.
        let mut series = PriceSeries::new(10.0);
        for i in 1..25_u32 {
            series.push(f64::from(i).mul_add(0.1, 10.0));
        }
        assert_eq!(series.len(), 25);
        // Base is the element at index 25 - 20 = 5 (value 10.5), so the
        // slope is (12.4 - 10.5) / (20 * 0.1) = 0.95.
        assert_relative_eq!(series.slope(20, 0.1), 0.95, max_relative = 1e-12);
    }

    #[test]
    fn linear_ramp_slope_is_window_independent_of_length() {
        // Once the window branch engages, the base index spans 19
        // increments of 0.1 over a 20 * 0.1 denominator, regardless of
        // how long the series has grown.
        let mut series = PriceSeries::new(0.0);
        for i in 1..100_u32 {
            series.push(f64::from(i) * 0.1);
        }
        assert_relative_eq!(series.slope(20, 0.1), 0.95, max_relative = 1e-12);
    }

    #[test]
    fn boundary_length_equal_to_window_uses_full_span() {
        let mut series = PriceSeries::new(0.0);
        for i in 1..20_u32 {
            series.push(f64::from(i));
        }
        assert_eq!(series.len(), 20);
        // len == window takes the fallback branch: (19 - 0) / (20 * 1.0).
        assert_relative_eq!(series.slope(20, 1.0), 0.95, max_relative = 1e-12);
    }
}
