//! Edge-case clamps shared by every agent.

/// Missing RSI defaults to neutral 50; out-of-range values clamp to [0,100].
pub fn clamp_rsi(rsi: Option<f64>) -> f64 {
    rsi.unwrap_or(50.0).clamp(0.0, 100.0)
}

/// Missing sentiment defaults to 0; out-of-range values clamp to [-1,1].
pub fn clamp_sentiment(sentiment: Option<f64>) -> f64 {
    sentiment.unwrap_or(0.0).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rsi_is_neutral() {
        assert_eq!(clamp_rsi(None), 50.0);
    }

    #[test]
    fn out_of_range_rsi_clamps() {
        assert_eq!(clamp_rsi(Some(150.0)), 100.0);
        assert_eq!(clamp_rsi(Some(-10.0)), 0.0);
    }

    #[test]
    fn missing_sentiment_is_zero() {
        assert_eq!(clamp_sentiment(None), 0.0);
    }

    #[test]
    fn out_of_range_sentiment_clamps() {
        assert_eq!(clamp_sentiment(Some(3.0)), 1.0);
        assert_eq!(clamp_sentiment(Some(-3.0)), -1.0);
    }
}
