//! Rolling-window indicators over a close series.
//!
//! Every function returns one output per input value; positions where the
//! rolling window is not yet full (or the value is undefined) are `None`.

/// Simple moving average over a fixed window.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    let mut sum: f64 = values[..window].iter().sum();
    out[window - 1] = Some(sum / window as f64);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out[i] = Some(sum / window as f64);
    }
    out
}

/// Relative Strength Index.
///
/// Period-over-period deltas are split into gains (positive deltas) and
/// losses (negated negative deltas); each side is averaged over `period`
/// deltas, then `rsi = 100 - 100 / (1 + gain / loss)`. The first defined
/// value sits at index `period`. A window with neither gains nor losses
/// has no defined RSI.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let delta = pair[1] - pair[0];
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    for i in period..closes.len() {
        // Deltas feeding the window ending at close index i.
        let from = i - period;
        let gain: f64 = gains[from..i].iter().sum::<f64>() / period as f64;
        let loss: f64 = losses[from..i].iter().sum::<f64>() / period as f64;

        out[i] = if loss == 0.0 {
            if gain == 0.0 {
                None
            } else {
                Some(100.0)
            }
        } else {
            let rs = gain / loss;
            Some(100.0 - 100.0 / (1.0 + rs))
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sma_basic() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = sma(&values, 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[3], Some(3.0));
        assert_eq!(out[4], Some(4.0));
    }

    #[test]
    fn test_sma_short_series() {
        assert_eq!(sma(&[1.0, 2.0], 3), vec![None, None]);
    }

    #[test]
    fn test_rsi_warmup_is_undefined() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);
        for v in &out[..14] {
            assert_eq!(*v, None);
        }
        assert!(out[14].is_some());
    }

    #[test]
    fn test_rsi_monotonic_increase_hits_100() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);
        let last = out.last().unwrap().unwrap();
        assert_eq!(last, 100.0);
    }

    #[test]
    fn test_rsi_monotonic_decrease_hits_0() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&closes, 14);
        let last = out.last().unwrap().unwrap();
        assert_eq!(last, 0.0);
    }

    #[test]
    fn test_rsi_flat_series_is_undefined() {
        let closes = vec![100.0; 30];
        let out = rsi(&closes, 14);
        assert!(out.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_rsi_mixed_series_stays_bounded() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 10.0)
            .collect();
        let out = rsi(&closes, 14);
        for v in out.iter().flatten() {
            assert!(*v >= 0.0 && *v <= 100.0, "rsi out of range: {}", v);
        }
    }
}
